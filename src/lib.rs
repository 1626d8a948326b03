// src/lib.rs

pub mod cli;
pub mod config;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod retry;
pub mod vars;

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::cli::{CliArgs, CommandKind};
use crate::config::{Options, RunnerConfig, load_and_validate};
use crate::exec::{Runner, StdStream};
use crate::vars::VarFile;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - optional scoped variable file
/// - the runner, with live pass-through of the tool's output
/// - Ctrl-C handling (cancels the current call gracefully)
pub async fn run(args: CliArgs) -> Result<()> {
    let cfg = load_and_validate(&args.config)
        .with_context(|| format!("loading config {}", args.config.display()))?;

    let workspace = resolve_workspace(&args, &cfg);

    // Lives until the end of this function; the file is removed on drop,
    // whichever way we leave.
    let (mut options, _var_file) = command_options(&cfg, &args.command)?;
    options.stdout = Some(Arc::new(StdStream::Stdout));
    options.stderr = Some(Arc::new(StdStream::Stderr));

    let runner = Runner::new(&options)?;

    if args.dry_run {
        print_dry_run(&runner, &args.command, workspace.as_deref());
        return Ok(());
    }

    // Ctrl-C → graceful shutdown of whatever is running.
    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            info!("Ctrl+C received; cancelling");
            cancel.cancel();
        });
    }

    match args.command {
        CommandKind::Init => {
            runner.init(&cancel).await?;
        }
        CommandKind::Apply => {
            prepare(&runner, &cancel, workspace.as_deref()).await?;
            runner.apply(&cancel).await?;
        }
        CommandKind::Destroy => {
            prepare(&runner, &cancel, workspace.as_deref()).await?;
            runner.destroy(&cancel).await?;
        }
        CommandKind::Workspace { name } => {
            runner.workspace_select_or_new(&cancel, &name).await?;
        }
        CommandKind::StateList => {
            let addresses = runner.state_list(&cancel).await?;
            info!(resources = addresses.len(), "state list complete");
        }
        CommandKind::StateRm { address } => {
            runner.state_rm(&cancel, &address).await?;
        }
        CommandKind::Run { args } => {
            runner.run(&cancel, args).await?;
        }
    }

    Ok(())
}

/// `--workspace` wins over `[runner].workspace`.
pub fn resolve_workspace(args: &CliArgs, cfg: &RunnerConfig) -> Option<String> {
    args.workspace.clone().or_else(|| cfg.workspace.clone())
}

/// Runner options for `command`.
///
/// With `materialize_vars` set and a command that takes variables, the
/// variables move into a scoped `.tfvars` file: its path is appended to
/// `var_files` and no `-var` flags remain. The file is deleted when the
/// returned guard is dropped.
pub fn command_options(
    cfg: &RunnerConfig,
    command: &CommandKind,
) -> Result<(Options, Option<VarFile>)> {
    let mut options = cfg.options.clone();

    if !cfg.materialize_vars || !command.uses_variables() || options.variables.is_empty() {
        return Ok((options, None));
    }

    let file = VarFile::materialize(&options.working_dir, &options.variables)
        .with_context(|| format!("writing variables into {}", options.working_dir.display()))?;
    options.var_files.push(file.path().to_path_buf());
    options.variables.clear();
    Ok((options, Some(file)))
}

/// init, then select-or-create the workspace if one is configured.
async fn prepare(
    runner: &Runner,
    cancel: &CancellationToken,
    workspace: Option<&str>,
) -> Result<()> {
    runner.init(cancel).await?;
    if let Some(ws) = workspace {
        runner.workspace_select_or_new(cancel, ws).await?;
    }
    Ok(())
}

/// Print the argument vectors that `command` would execute, in order.
fn print_dry_run(runner: &Runner, command: &CommandKind, workspace: Option<&str>) {
    let opts = runner.options();
    println!("tfrunner dry-run");
    println!("  working_dir = {}", opts.working_dir.display());
    println!("  max_retries = {}", opts.max_retries);
    println!("  time_between_retries = {:?}", opts.time_between_retries);
    println!(
        "  graceful_shutdown_timeout = {:?}",
        opts.graceful_shutdown_timeout
    );
    println!("  retry patterns ({}):", opts.retry_patterns.len());
    let mut patterns: Vec<_> = opts.retry_patterns.iter().collect();
    patterns.sort();
    for (pattern, description) in patterns {
        println!("    - {pattern} ({description})");
    }
    println!();

    let binary = opts.binary.display();
    let steps = planned_commands(runner, command, workspace);

    println!("commands ({}):", steps.len());
    for step in steps {
        println!("  {} {}", binary, step.join(" "));
    }

    debug!("dry-run complete (no execution)");
}

/// Argument vectors `command` runs, in order.
///
/// The workspace step is shown as `workspace select|new NAME`: `new` only
/// runs when `select` fails.
pub fn planned_commands(
    runner: &Runner,
    command: &CommandKind,
    workspace: Option<&str>,
) -> Vec<Vec<String>> {
    let workspace_step = |name: &str| {
        vec![
            "workspace".to_string(),
            "select|new".to_string(),
            name.to_string(),
        ]
    };

    match command {
        CommandKind::Init => vec![runner.init_args()],
        CommandKind::Apply | CommandKind::Destroy => {
            let mut steps = vec![runner.init_args()];
            if let Some(ws) = workspace {
                steps.push(workspace_step(ws));
            }
            steps.push(if *command == CommandKind::Apply {
                runner.apply_args()
            } else {
                runner.destroy_args()
            });
            steps
        }
        CommandKind::Workspace { name } => vec![workspace_step(name)],
        CommandKind::StateList => vec![vec!["state".to_string(), "list".to_string()]],
        CommandKind::StateRm { address } => vec![vec![
            "state".to_string(),
            "rm".to_string(),
            address.clone(),
        ]],
        CommandKind::Run { args } => vec![args.clone()],
    }
}
