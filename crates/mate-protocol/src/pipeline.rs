//! The frame-to-record pipeline.
//!
//! [`Mate::process`] runs one raw chunk through framing, checksum, address
//! classification, schema mapping and interpretation, stores the result and
//! dispatches events. Every failure drops the chunk, is logged and counted,
//! and is returned to the caller; none of them stop the pipeline.

use mate_metrics::{metric_defs, metrics, MetricLabels};
use tracing::{debug, trace, warn};

use crate::checksum::{AcceptAll, ChecksumValidator};
use crate::device::{Address, DeviceFamily, SystemVoltage};
use crate::dispatch::{Dispatcher, EventHandler};
use crate::error::{MateError, MateResult};
use crate::frame::frame;
use crate::interpret::{interpret, Event, EventKind, InterpretedRecord};
use crate::schema::{map_fields, RawRecord};
use crate::store::RecordStore;

/// Decoder for one Mate serial link.
pub struct Mate {
    system_voltage: SystemVoltage,
    checksum: Box<dyn ChecksumValidator>,
    store: RecordStore,
    dispatcher: Dispatcher,
}

impl Mate {
    /// Create a decoder for an installation with the given nominal voltage.
    ///
    /// Uses the accept-all checksum strategy and no handlers.
    pub fn new(system_voltage: SystemVoltage) -> Self {
        Mate {
            system_voltage,
            checksum: Box::new(AcceptAll),
            store: RecordStore::new(),
            dispatcher: Dispatcher::new(),
        }
    }

    /// Like [`Mate::new`], validating a voltage given in volts.
    pub fn with_volts(volts: u16) -> MateResult<Self> {
        Ok(Self::new(SystemVoltage::try_from(volts)?))
    }

    /// Replace the checksum strategy.
    pub fn with_checksum(mut self, checksum: impl ChecksumValidator + 'static) -> Self {
        self.checksum = Box::new(checksum);
        self
    }

    /// Register an event handler.
    pub fn with_handler(mut self, handler: impl EventHandler + 'static) -> Self {
        self.dispatcher.add_handler(handler);
        self
    }

    /// Register an event handler on an existing decoder.
    pub fn add_handler(&mut self, handler: impl EventHandler + 'static) {
        self.dispatcher.add_handler(handler);
    }

    /// Nominal battery bank voltage.
    pub fn system_voltage(&self) -> SystemVoltage {
        self.system_voltage
    }

    /// Shared handle to the record store.
    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    /// Latest raw record for `address`.
    pub fn get_raw(&self, address: Address) -> Option<RawRecord> {
        self.store.get_raw(address)
    }

    /// Latest interpreted record for `address`.
    pub fn get_interpreted(&self, address: Address) -> Option<InterpretedRecord> {
        self.store.get_interpreted(address)
    }

    /// Process one raw chunk. Returns the address of the stored record.
    pub fn process(&mut self, raw: &[u8]) -> MateResult<Address> {
        metrics::counter!(metric_defs::FRAMES_RECEIVED.name).increment(1);
        metrics::histogram!(metric_defs::FRAME_SIZE.name).record(raw.len() as f64);

        self.decode(raw).map_err(|err| {
            warn!(reason = err.reason(), "dropping frame: {}", err);
            metrics::counter!(metric_defs::FRAMES_DROPPED.name, "reason" => err.reason())
                .increment(1);
            err
        })
    }

    fn decode(&mut self, raw: &[u8]) -> MateResult<Address> {
        let frame = frame(raw)?;
        trace!(frame = %frame, "framed");

        if !self.checksum.verify(frame.as_str()) {
            return Err(MateError::Checksum {
                frame: frame.into_string(),
            });
        }

        let address = Address::parse(frame.address_field())?;
        let family = address.family();
        if family == DeviceFamily::Unknown {
            return Err(MateError::UnknownAddress(address.as_char()));
        }

        let raw_record = map_fields(&frame, family)?;
        let labels = MetricLabels::new(address.to_string(), family.as_str()).to_labels();
        if let Some(mismatch) = raw_record.schema_mismatch() {
            warn!(%address, "{}", mismatch);
            metrics::counter!(metric_defs::SCHEMA_MISMATCHES.name, &labels).increment(1);
        }

        let interpretation = interpret(&raw_record)?;
        let record = interpretation.record;
        let mut events = interpretation.events;
        events.push(Event {
            address,
            kind: EventKind::DataUpdated,
        });

        self.store.store(address, raw_record, record.clone());
        metrics::counter!(metric_defs::RECORDS_STORED.name, &labels).increment(1);
        debug!(%address, %family, "stored record");

        self.dispatcher.dispatch(&events, &record);
        Ok(address)
    }
}

impl std::fmt::Debug for Mate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mate")
            .field("system_voltage", &self.system_voltage)
            .field("store", &self.store)
            .field("dispatcher", &self.dispatcher)
            .finish_non_exhaustive()
    }
}
