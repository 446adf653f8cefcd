// src/main.rs

use gitvisor::restart::RestartPlan;
use gitvisor::{cli, logging, run};

#[tokio::main]
async fn main() {
    if let Err(err) = run_main().await {
        eprintln!("gitvisor error: {err:?}");
        std::process::exit(1);
    }
}

async fn run_main() -> anyhow::Result<()> {
    // Capture our own identity before anything changes directory.
    let plan = RestartPlan::capture()?;

    let args = cli::parse();
    logging::init_logging(args.log_level)?;

    if plan.restart_count() > 0 {
        tracing::info!(restart = plan.restart_count(), "supervisor restarted");
    }

    if let Some(request) = run(args).await? {
        // Only returns if the new image could not be started.
        let err = plan.exec(&request.execution_dir, &request.root);
        return Err(err.into());
    }

    Ok(())
}
