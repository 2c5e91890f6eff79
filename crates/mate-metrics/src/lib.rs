//! Metrics infrastructure for the Outback Mate telemetry decoder.
//!
//! This crate declares every metric the decoder and monitor emit as a structured
//! [`Metric`] constant, so names, units and label keys live in one place. It
//! re-exports the `metrics` crate; installing a recorder is left to the binary.
//!
//! # Example
//!
//! ```rust,ignore
//! use mate_metrics::{MetricLabels, metric_defs, describe_metrics};
//!
//! describe_metrics();
//!
//! let labels = MetricLabels::new("0", "fx");
//! metrics::counter!(metric_defs::RECORDS_STORED.name, &labels.to_labels()).increment(1);
//! ```

pub use metrics;

use metrics::{describe_counter, describe_gauge, describe_histogram, Unit};

/// The kind of metric (counter, gauge, or histogram).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    /// A monotonically increasing counter.
    Counter,
    /// A gauge that can go up and down.
    Gauge,
    /// A histogram for recording distributions.
    Histogram,
}

impl MetricKind {
    /// Returns the kind as a lowercase string.
    pub const fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Counter => "counter",
            MetricKind::Gauge => "gauge",
            MetricKind::Histogram => "histogram",
        }
    }
}

impl std::fmt::Display for MetricKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A metric declaration with its metadata.
///
/// ```rust
/// use mate_metrics::{Metric, MetricKind};
/// use metrics::Unit;
///
/// const FRAMES: Metric = Metric::counter("mate.frames.received")
///     .with_description("Frames read from the transport")
///     .with_unit(Unit::Count);
///
/// assert_eq!(FRAMES.name, "mate.frames.received");
/// assert_eq!(FRAMES.kind, MetricKind::Counter);
/// ```
#[derive(Debug, Clone)]
pub struct Metric {
    /// The metric name (e.g., "mate.frames.received").
    pub name: &'static str,
    /// The kind of metric.
    pub kind: MetricKind,
    /// Human-readable description.
    pub description: &'static str,
    /// The unit of measurement, if any.
    pub unit: Option<Unit>,
    /// Expected label keys.
    pub labels: &'static [&'static str],
}

impl Metric {
    /// Creates a new counter metric with the given name.
    pub const fn counter(name: &'static str) -> Self {
        Self {
            name,
            kind: MetricKind::Counter,
            description: "",
            unit: None,
            labels: &[],
        }
    }

    /// Creates a new gauge metric with the given name.
    pub const fn gauge(name: &'static str) -> Self {
        Self {
            name,
            kind: MetricKind::Gauge,
            description: "",
            unit: None,
            labels: &[],
        }
    }

    /// Creates a new histogram metric with the given name.
    pub const fn histogram(name: &'static str) -> Self {
        Self {
            name,
            kind: MetricKind::Histogram,
            description: "",
            unit: None,
            labels: &[],
        }
    }

    /// Sets the description for the metric.
    pub const fn with_description(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    /// Sets the unit for the metric.
    pub const fn with_unit(mut self, unit: Unit) -> Self {
        self.unit = Some(unit);
        self
    }

    /// Sets the expected label keys for the metric.
    pub const fn with_labels(mut self, labels: &'static [&'static str]) -> Self {
        self.labels = labels;
        self
    }

    /// Registers this metric's description with the installed recorder.
    pub fn describe(&self) {
        match (self.kind, self.unit) {
            (MetricKind::Counter, Some(unit)) => {
                describe_counter!(self.name, unit, self.description);
            }
            (MetricKind::Counter, None) => {
                describe_counter!(self.name, self.description);
            }
            (MetricKind::Gauge, Some(unit)) => {
                describe_gauge!(self.name, unit, self.description);
            }
            (MetricKind::Gauge, None) => {
                describe_gauge!(self.name, self.description);
            }
            (MetricKind::Histogram, Some(unit)) => {
                describe_histogram!(self.name, unit, self.description);
            }
            (MetricKind::Histogram, None) => {
                describe_histogram!(self.name, self.description);
            }
        }
    }
}

/// All metric definitions used by the decoder and the monitor.
pub mod metric_defs {
    use super::{Metric, Unit};

    /// Labels present on all per-device metrics.
    pub const DEVICE_LABELS: &[&str] = &["address", "family"];

    // ========================================================================
    // Pipeline
    // ========================================================================

    /// Chunks handed to the pipeline.
    pub const FRAMES_RECEIVED: Metric = Metric::counter("mate.frames.received")
        .with_description("Raw frames handed to the decoding pipeline")
        .with_unit(Unit::Count);

    /// Frames discarded before reaching the store.
    ///
    /// Labels: reason (decode, too_short, framing, checksum, invalid_address,
    /// unknown_address, invalid_field, overflow)
    pub const FRAMES_DROPPED: Metric = Metric::counter("mate.frames.dropped")
        .with_description("Frames discarded by the decoding pipeline")
        .with_unit(Unit::Count)
        .with_labels(&["reason"]);

    /// Frames whose field count did not match the family schema.
    pub const SCHEMA_MISMATCHES: Metric = Metric::counter("mate.frames.schema_mismatch")
        .with_description("Frames stored with a field count different from the schema")
        .with_unit(Unit::Count)
        .with_labels(&["address", "family"]);

    // ========================================================================
    // Devices
    // ========================================================================

    /// Records written to the store.
    pub const RECORDS_STORED: Metric = Metric::counter("mate.records.stored")
        .with_description("Decoded records written to the store")
        .with_unit(Unit::Count)
        .with_labels(DEVICE_LABELS);

    /// Records carrying active warning flags.
    pub const DEVICE_WARNINGS: Metric = Metric::counter("mate.device.warnings")
        .with_description("Records with active warning flags")
        .with_unit(Unit::Count)
        .with_labels(DEVICE_LABELS);

    /// Records carrying active error flags.
    pub const DEVICE_ERRORS: Metric = Metric::counter("mate.device.errors")
        .with_description("Records with active error flags")
        .with_unit(Unit::Count)
        .with_labels(DEVICE_LABELS);

    /// Last reported battery voltage in volts.
    pub const BATTERY_VOLTAGE: Metric = Metric::gauge("mate.battery.voltage")
        .with_description("Battery voltage reported by the device")
        .with_labels(DEVICE_LABELS);

    /// Chunk size as read from the transport, in bytes.
    pub const FRAME_SIZE: Metric = Metric::histogram("mate.frames.size_bytes")
        .with_description("Size of raw frames read from the transport")
        .with_unit(Unit::Bytes);

    /// All metrics, for bulk registration.
    pub const ALL: &[&Metric] = &[
        &FRAMES_RECEIVED,
        &FRAMES_DROPPED,
        &SCHEMA_MISMATCHES,
        &RECORDS_STORED,
        &DEVICE_WARNINGS,
        &DEVICE_ERRORS,
        &BATTERY_VOLTAGE,
        &FRAME_SIZE,
    ];
}

/// Labels identifying one device on the Mate bus.
///
/// ```rust
/// use mate_metrics::MetricLabels;
///
/// let labels = MetricLabels::new("A", "mx").to_labels();
/// assert_eq!(labels.len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct MetricLabels {
    /// Device address as a single character.
    pub address: String,
    /// Device family (fx, mx).
    pub family: String,
}

impl MetricLabels {
    /// Creates labels for the given address and family.
    pub fn new(address: impl Into<String>, family: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            family: family.into(),
        }
    }

    /// Converts the labels to the `metrics` crate label format.
    pub fn to_labels(&self) -> Vec<(&'static str, String)> {
        vec![
            ("address", self.address.clone()),
            ("family", self.family.clone()),
        ]
    }
}

/// Describes all metrics. Call once after installing a recorder.
pub fn describe_metrics() {
    for metric in metric_defs::ALL {
        metric.describe();
    }
}

/// Installs a Prometheus exporter serving scrapes on `listen`.
///
/// Must be called from within a tokio runtime.
#[cfg(feature = "prometheus")]
pub fn install_prometheus(
    listen: std::net::SocketAddr,
) -> Result<(), metrics_exporter_prometheus::BuildError> {
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(listen)
        .install()?;
    describe_metrics();
    Ok(())
}
