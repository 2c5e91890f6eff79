//! Error types for the monitor.

use std::path::PathBuf;

use mate_protocol::MateError;
use thiserror::Error;

/// Errors that end a monitor run.
#[derive(Debug, Error)]
pub enum MonitorError {
    /// Transport I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A configured file could not be opened.
    #[error("cannot open {path}: {source}")]
    Open {
        /// Path that failed.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// Invalid YAML configuration.
    #[error("invalid config: {0}")]
    Config(#[from] serde_yaml::Error),

    /// Protocol-level construction failure (e.g. unsupported system voltage).
    #[error(transparent)]
    Protocol(#[from] MateError),

    /// The Ctrl-C handler could not be installed.
    #[error("failed to install Ctrl-C handler: {0}")]
    Signal(#[from] ctrlc::Error),

    /// Logging could not be initialised.
    #[error("failed to initialise logging: {0}")]
    Logging(String),

    /// The metrics exporter could not be installed.
    #[error("failed to install metrics exporter: {0}")]
    Metrics(String),
}

/// Result type alias for monitor operations.
pub type MonitorResult<T> = Result<T, MonitorError>;
