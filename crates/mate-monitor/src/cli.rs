//! Command line arguments.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use mate_protocol::SystemVoltage;

use crate::config::{MonitorConfig, SourceConfig};
use crate::error::MonitorResult;

/// Decode Outback Mate FX/MX status lines.
#[derive(Debug, Parser)]
#[command(name = "mate-monitor", version, about)]
pub struct Args {
    /// YAML configuration file. Flags override its values.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Read from a TCP serial bridge at HOST:PORT.
    #[arg(long, conflicts_with_all = ["file", "stdin"])]
    pub tcp: Option<String>,

    /// Replay a capture file.
    #[arg(long, conflicts_with = "stdin")]
    pub file: Option<PathBuf>,

    /// Read from standard input.
    #[arg(long)]
    pub stdin: bool,

    /// Nominal system voltage (12, 24 or 48).
    #[arg(long)]
    pub system_voltage: Option<u16>,

    /// Print each decoded record as a JSON line on stdout.
    #[arg(long)]
    pub json: bool,

    /// Log filter used when RUST_LOG is unset (e.g. "info", "mate_protocol=debug").
    #[arg(long)]
    pub log_level: Option<String>,

    /// Serve Prometheus metrics on this address.
    #[arg(long)]
    pub metrics_listen: Option<SocketAddr>,
}

impl Args {
    /// Load the config file, if any, and apply flag overrides.
    pub fn resolve(&self) -> MonitorResult<MonitorConfig> {
        let mut config = match &self.config {
            Some(path) => MonitorConfig::load(path)?,
            None => MonitorConfig::default(),
        };

        if let Some(address) = &self.tcp {
            config.source = SourceConfig::Tcp {
                address: address.clone(),
            };
        } else if let Some(path) = &self.file {
            config.source = SourceConfig::File { path: path.clone() };
        } else if self.stdin {
            config.source = SourceConfig::Stdin;
        }

        if let Some(volts) = self.system_voltage {
            config.system_voltage = SystemVoltage::try_from(volts)?;
        }
        if self.json {
            config.output.json_lines = true;
        }
        if let Some(level) = &self.log_level {
            config.log_level = level.clone();
        }
        if self.metrics_listen.is_some() {
            config.metrics_listen = self.metrics_listen;
        }

        Ok(config)
    }
}
