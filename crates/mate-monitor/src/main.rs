use std::process::ExitCode;

use clap::Parser;
use mate_monitor::{init_logging, monitor, Args, MonitorResult};
use tokio::sync::watch;

async fn run_main(args: Args) -> MonitorResult<()> {
    let config = args.resolve()?;
    init_logging(&config.log_level)?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    ctrlc::set_handler(move || {
        let _ = shutdown_tx.send(true);
    })?;

    monitor(&config, shutdown_rx).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    match run_main(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("mate-monitor: {}", err);
            ExitCode::FAILURE
        }
    }
}
