//! Monitor configuration.
//!
//! Loaded from YAML; every key is optional:
//!
//! ```yaml
//! system_voltage: 48
//! source:
//!   type: tcp
//!   address: 127.0.0.1:4001
//! output:
//!   json_lines: true
//! log_level: info
//! metrics_listen: 0.0.0.0:9000
//! ```

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use mate_protocol::SystemVoltage;
use serde::{Deserialize, Serialize};

use crate::error::{MonitorError, MonitorResult};

/// Where status bytes come from.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SourceConfig {
    /// A TCP serial bridge (e.g. ser2net) connected to the Mate port.
    Tcp {
        /// `host:port` to connect to.
        address: String,
    },
    /// A capture file replayed once.
    File {
        /// Path to the capture.
        path: PathBuf,
    },
    /// Standard input.
    ///
    /// Tokio reads stdin on a blocking thread that Ctrl-C cannot interrupt, so
    /// the process exits only once the next byte (or EOF) arrives.
    #[default]
    Stdin,
}

impl std::fmt::Display for SourceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceConfig::Tcp { address } => write!(f, "tcp://{}", address),
            SourceConfig::File { path } => write!(f, "file {}", path.display()),
            SourceConfig::Stdin => write!(f, "stdin"),
        }
    }
}

/// Output options.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    /// Write each decoded record to stdout as one JSON line.
    #[serde(default)]
    pub json_lines: bool,
}

/// Full monitor configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MonitorConfig {
    /// Nominal battery bank voltage (12, 24 or 48).
    #[serde(default = "default_system_voltage")]
    pub system_voltage: SystemVoltage,
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub output: OutputConfig,
    /// Default log filter when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Prometheus listen address; needs the `prometheus` feature.
    #[serde(default)]
    pub metrics_listen: Option<SocketAddr>,
}

fn default_system_voltage() -> SystemVoltage {
    SystemVoltage::V48
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for MonitorConfig {
    fn default() -> Self {
        MonitorConfig {
            system_voltage: default_system_voltage(),
            source: SourceConfig::default(),
            output: OutputConfig::default(),
            log_level: default_log_level(),
            metrics_listen: None,
        }
    }
}

impl MonitorConfig {
    /// Parse a YAML document.
    pub fn from_yaml_str(yaml: &str) -> MonitorResult<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Load a YAML file.
    pub fn load(path: impl AsRef<Path>) -> MonitorResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| MonitorError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = MonitorConfig::from_yaml_str("{}").unwrap();
        assert_eq!(config, MonitorConfig::default());
        assert_eq!(config.system_voltage, SystemVoltage::V48);
        assert_eq!(config.source, SourceConfig::Stdin);
        assert!(!config.output.json_lines);
    }

    #[test]
    fn test_full_config() {
        let yaml = r#"
system_voltage: 24
source:
  type: tcp
  address: 192.168.1.20:4001
output:
  json_lines: true
log_level: debug
metrics_listen: 0.0.0.0:9000
"#;
        let config = MonitorConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.system_voltage, SystemVoltage::V24);
        assert_eq!(
            config.source,
            SourceConfig::Tcp {
                address: "192.168.1.20:4001".to_string()
            }
        );
        assert!(config.output.json_lines);
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.metrics_listen, Some("0.0.0.0:9000".parse().unwrap()));
    }

    #[test]
    fn test_file_source() {
        let config = MonitorConfig::from_yaml_str("source:\n  type: file\n  path: /tmp/mate.cap\n").unwrap();
        assert_eq!(
            config.source,
            SourceConfig::File {
                path: PathBuf::from("/tmp/mate.cap")
            }
        );
        assert_eq!(config.source.to_string(), "file /tmp/mate.cap");
    }

    #[test]
    fn test_unsupported_system_voltage() {
        let err = MonitorConfig::from_yaml_str("system_voltage: 36").unwrap_err();
        assert!(err.to_string().contains("system voltage of 36"));
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(MonitorConfig::from_yaml_str("baud: 19200").is_err());
    }

    #[test]
    fn test_missing_file() {
        let err = MonitorConfig::load("/nonexistent/mate.yaml").unwrap_err();
        assert!(matches!(err, MonitorError::Open { .. }));
    }
}
