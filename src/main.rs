// src/main.rs

use tfrunner::exec::RunError;
use tfrunner::{cli, logging, run};

#[tokio::main]
async fn main() {
    if let Err(err) = run_main().await {
        eprintln!("tfrunner error: {err:?}");
        std::process::exit(exit_code_for(&err));
    }
}

async fn run_main() -> anyhow::Result<()> {
    let args = cli::parse();
    logging::init_logging(args.log_level)?;
    run(args).await
}

/// Pass the tool's own exit code through when it has a meaningful one.
fn exit_code_for(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<RunError>() {
        Some(run_err) if run_err.exit_code() > 0 => run_err.exit_code(),
        _ => 1,
    }
}
