//! Event handlers provided by the monitor.

use std::io::Write;

use chrono::{DateTime, Utc};
use mate_metrics::{metric_defs, metrics, MetricLabels};
use mate_protocol::{Address, DeviceFamily, EventHandler, InterpretedRecord};
use serde::Serialize;
use tracing::warn;

/// One JSON line per stored record.
///
/// The record's own `address` field carries the device address.
#[derive(Debug, Serialize)]
pub struct RecordLine<'a> {
    pub family: DeviceFamily,
    pub received_at: DateTime<Utc>,
    #[serde(flatten)]
    pub fields: &'a InterpretedRecord,
}

impl<'a> From<&'a InterpretedRecord> for RecordLine<'a> {
    fn from(record: &'a InterpretedRecord) -> Self {
        RecordLine {
            family: record.family(),
            received_at: record.received_at(),
            fields: record,
        }
    }
}

/// Writes every updated record as a JSON line.
pub struct JsonLinesHandler<W> {
    writer: W,
}

impl<W: Write + Send> JsonLinesHandler<W> {
    pub fn new(writer: W) -> Self {
        JsonLinesHandler { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write_record(&mut self, record: &InterpretedRecord) -> std::io::Result<()> {
        serde_json::to_writer(&mut self.writer, &RecordLine::from(record))?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()
    }
}

impl<W: Write + Send> EventHandler for JsonLinesHandler<W> {
    fn on_data(&mut self, address: Address, record: &InterpretedRecord) {
        if let Err(err) = self.write_record(record) {
            warn!(%address, "failed to write record: {}", err);
        }
    }

    // Warnings and errors are visible in the record itself.
    fn on_warning(&mut self, _address: Address, _record: &InterpretedRecord) {}

    fn on_error(&mut self, _address: Address, _record: &InterpretedRecord) {}
}

/// Exports per-device counters and the battery voltage gauge.
#[derive(Debug, Default, Clone, Copy)]
pub struct MetricsHandler;

fn labels(record: &InterpretedRecord) -> Vec<(&'static str, String)> {
    MetricLabels::new(record.address().to_string(), record.family().as_str()).to_labels()
}

impl EventHandler for MetricsHandler {
    fn on_data(&mut self, _address: Address, record: &InterpretedRecord) {
        if let Some(volts) = record.battery_voltage() {
            metrics::gauge!(metric_defs::BATTERY_VOLTAGE.name, &labels(record)).set(volts.as_f64());
        }
    }

    fn on_warning(&mut self, _address: Address, record: &InterpretedRecord) {
        metrics::counter!(metric_defs::DEVICE_WARNINGS.name, &labels(record)).increment(1);
    }

    fn on_error(&mut self, _address: Address, record: &InterpretedRecord) {
        metrics::counter!(metric_defs::DEVICE_ERRORS.name, &labels(record)).increment(1);
    }
}
