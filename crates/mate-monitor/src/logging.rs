//! Tracing subscriber setup.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::error::{MonitorError, MonitorResult};

/// Install the global subscriber. `RUST_LOG` takes precedence over `level`.
///
/// Logs go to stderr so stdout stays free for JSON lines.
pub fn init_logging(level: &str) -> MonitorResult<()> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(level).map_err(|e| MonitorError::Logging(e.to_string()))?,
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .map_err(|e| MonitorError::Logging(e.to_string()))
}
