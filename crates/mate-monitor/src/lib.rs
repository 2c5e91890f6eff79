//! Outback Mate monitor.
//!
//! Reads the Mate status stream from a TCP serial bridge, a capture file or
//! stdin, decodes it with [`mate_protocol::Mate`] and reports the result
//! through logs, metrics and optional JSON lines on stdout.

pub mod cli;
pub mod config;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod source;

pub use cli::Args;
pub use config::{MonitorConfig, OutputConfig, SourceConfig};
pub use error::{MonitorError, MonitorResult};
pub use handlers::{JsonLinesHandler, MetricsHandler, RecordLine};
pub use logging::init_logging;
pub use source::{run, run_source, RunSummary};

use mate_protocol::{LoggingHandler, Mate};
use tokio::sync::watch;
use tracing::{info, warn};

/// Build a decoder with the handlers selected by `config`.
pub fn build_mate(config: &MonitorConfig) -> Mate {
    let mut mate = Mate::new(config.system_voltage)
        .with_handler(LoggingHandler)
        .with_handler(MetricsHandler);
    if config.output.json_lines {
        mate.add_handler(JsonLinesHandler::new(std::io::stdout()));
    }
    mate
}

#[cfg(feature = "prometheus")]
fn install_metrics(config: &MonitorConfig) -> MonitorResult<()> {
    if let Some(listen) = config.metrics_listen {
        mate_metrics::install_prometheus(listen)
            .map_err(|e| MonitorError::Metrics(e.to_string()))?;
        info!(%listen, "serving metrics");
    }
    Ok(())
}

#[cfg(not(feature = "prometheus"))]
fn install_metrics(config: &MonitorConfig) -> MonitorResult<()> {
    if let Some(listen) = config.metrics_listen {
        warn!(%listen, "metrics_listen ignored: built without the prometheus feature");
    }
    Ok(())
}

/// Run the monitor until its source ends or `shutdown` turns true.
pub async fn monitor(
    config: &MonitorConfig,
    shutdown: watch::Receiver<bool>,
) -> MonitorResult<RunSummary> {
    install_metrics(config)?;

    let mut mate = build_mate(config);
    info!(system_voltage = %mate.system_voltage(), "monitor starting");

    let summary = run_source(&config.source, &mut mate, shutdown).await?;

    let devices: Vec<String> = mate
        .store()
        .addresses()
        .iter()
        .map(|address| format!("{}({})", address, address.family()))
        .collect();
    info!(
        chunks = summary.chunks,
        stored = summary.stored,
        dropped = summary.dropped,
        devices = %devices.join(","),
        "monitor finished"
    );
    if summary.chunks > 0 && summary.stored == 0 {
        warn!("no frame decoded; check the source and wiring");
    }
    Ok(summary)
}
