// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::config::default_config_path;

/// Command-line arguments for `tfrunner`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "tfrunner",
    version,
    about = "Drive terraform with retries on transient failures and graceful cancellation.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    #[arg(long, value_name = "PATH", default_value_os_t = default_config_path(), global = true)]
    pub config: PathBuf,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `TFRUNNER_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL", global = true)]
    pub log_level: Option<LogLevel>,

    /// Workspace to select (or create) before apply/destroy.
    ///
    /// Overrides `[runner].workspace` from the config file.
    #[arg(long, value_name = "NAME", global = true)]
    pub workspace: Option<String>,

    /// Print the commands that would run, but don't execute anything.
    #[arg(long, global = true)]
    pub dry_run: bool,

    #[command(subcommand)]
    pub command: CommandKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum CommandKind {
    /// `init -input=false`.
    Init,
    /// init, select-or-create the workspace, then `apply -auto-approve`.
    Apply,
    /// init, select-or-create the workspace, then `destroy -auto-approve`.
    Destroy,
    /// Select a workspace, creating it if needed.
    Workspace { name: String },
    /// List resource addresses in state.
    StateList,
    /// Remove a resource address from state.
    StateRm { address: String },
    /// Run an arbitrary subcommand under the retry policy.
    Run {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true, required = true)]
        args: Vec<String>,
    },
}

impl CommandKind {
    /// Whether the subcommand passes variables to the tool.
    pub fn uses_variables(&self) -> bool {
        matches!(self, CommandKind::Apply | CommandKind::Destroy)
    }
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
