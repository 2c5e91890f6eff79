//! End-to-end tests for the decoding pipeline.
//!
//! These feed raw status lines through `Mate::process` and check the store
//! contents and the events delivered to handlers.

use std::sync::{Arc, Mutex};

use mate_protocol::{
    Address, DeviceFamily, EventHandler, EventKind, FrameCodec, InterpretedRecord, Mate,
    MateError, SystemVoltage,
};

const FX_LINE: &[u8] = b"\n0,05,00,02,118,118,00,03,000,02,539,129,160,62\r";
const MX_LINE: &[u8] = b"\nA,00,10,05,072,123,00,00,000,02,540,000,000,48\r";

// ============================================================================
// Test Helpers
// ============================================================================

/// Records every hook invocation.
#[derive(Clone, Default)]
struct EventLog(Arc<Mutex<Vec<(EventKind, Address)>>>);

impl EventLog {
    fn events(&self) -> Vec<(EventKind, Address)> {
        self.0.lock().unwrap().clone()
    }

    fn count(&self, kind: EventKind) -> usize {
        self.events().iter().filter(|(k, _)| *k == kind).count()
    }
}

impl EventHandler for EventLog {
    fn on_data(&mut self, address: Address, _record: &InterpretedRecord) {
        self.0.lock().unwrap().push((EventKind::DataUpdated, address));
    }

    fn on_warning(&mut self, address: Address, _record: &InterpretedRecord) {
        self.0.lock().unwrap().push((EventKind::Warning, address));
    }

    fn on_error(&mut self, address: Address, _record: &InterpretedRecord) {
        self.0.lock().unwrap().push((EventKind::Error, address));
    }
}

fn mate_with_log() -> (Mate, EventLog) {
    let log = EventLog::default();
    let mate = Mate::new(SystemVoltage::V48).with_handler(log.clone());
    (mate, log)
}

/// Build an FX line with the given error and warning words.
fn fx_line(address: char, error_mode: &str, warning_mode: &str) -> Vec<u8> {
    format!(
        "\n{},00,00,00,120,120,00,02,{},02,512,000,{},00\r",
        address, error_mode, warning_mode
    )
    .into_bytes()
}

// ============================================================================
// Decoding
// ============================================================================

#[test]
fn test_process_fx_line() {
    let (mut mate, log) = mate_with_log();

    let address = mate.process(FX_LINE).expect("FX line should decode");
    assert_eq!(address, Address::new(b'0'));

    let raw = mate.get_raw(address).expect("raw record stored");
    assert_eq!(raw.family(), DeviceFamily::Fx);
    assert_eq!(raw.get("fx_op_mode"), Some("03"));

    let record = mate.get_interpreted(address).expect("interpreted record stored");
    assert_eq!(record.get("fx_op_mode").unwrap().to_string(), "Charge");
    assert_eq!(record.get("fx_batt_volt").unwrap().to_string(), "53.9");

    let misc = record.get("fx_misc").and_then(|v| v.as_flags()).unwrap();
    assert_eq!(misc.get("230V Unit"), Some(true));
    assert_eq!(misc.get("Aux Output On"), Some(true));

    let warnings = record.get("fx_warning_mode").and_then(|v| v.as_flags()).unwrap();
    assert_eq!(warnings.get("Temp Sensor Failed"), Some(true));
    assert_eq!(warnings.get("Fan Failure"), Some(true));
    assert_eq!(warnings.get("Comm Error"), Some(false));

    assert_eq!(
        log.events(),
        vec![(EventKind::Warning, address), (EventKind::DataUpdated, address)]
    );
}

#[test]
fn test_process_mx_line() {
    let (mut mate, log) = mate_with_log();

    let address = mate.process(MX_LINE).unwrap();
    let record = mate.get_interpreted(address).unwrap();

    assert_eq!(record.family(), DeviceFamily::Mx);
    assert_eq!(record.get("daily_kwh").unwrap().to_string(), "12.3");
    assert_eq!(record.get("mx_batt_volt").unwrap().to_string(), "54.0");
    assert_eq!(record.get("mx_aux_mode").unwrap().to_string(), "Disabled");
    assert_eq!(record.get("mx_error_mode").unwrap().to_string(), "N/A");
    assert_eq!(record.get("mx_charger_mode").unwrap().to_string(), "Bulk");
    assert_eq!(log.events(), vec![(EventKind::DataUpdated, address)]);
}

#[test]
fn test_latest_record_wins() {
    let (mut mate, _log) = mate_with_log();

    mate.process(MX_LINE).unwrap();
    mate.process(b"\nA,00,20,09,080,150,00,00,000,03,552,000,000,11\r")
        .unwrap();

    let address = Address::new(b'A');
    assert_eq!(mate.store().len(), 1);
    assert_eq!(mate.get_raw(address).unwrap().get("daily_kwh"), Some("150"));
    let record = mate.get_interpreted(address).unwrap();
    assert_eq!(record.get("daily_kwh").unwrap().to_string(), "15.0");
    assert_eq!(record.get("mx_charger_mode").unwrap().to_string(), "Absorb");
}

#[test]
fn test_devices_stored_independently() {
    let (mut mate, _log) = mate_with_log();

    mate.process(FX_LINE).unwrap();
    mate.process(MX_LINE).unwrap();
    mate.process(&fx_line('1', "000", "000")).unwrap();

    assert_eq!(
        mate.store().addresses(),
        vec![Address::new(b'0'), Address::new(b'1'), Address::new(b'A')]
    );
}

// ============================================================================
// Notifications
// ============================================================================

#[test]
fn test_error_notification_once_per_frame() {
    let (mut mate, log) = mate_with_log();

    mate.process(&fx_line('2', "000", "000")).unwrap();
    assert_eq!(log.count(EventKind::Error), 0);
    assert_eq!(log.count(EventKind::Warning), 0);

    mate.process(&fx_line('2', "255", "000")).unwrap();
    assert_eq!(log.count(EventKind::Error), 1);

    mate.process(&fx_line('2', "004", "000")).unwrap();
    assert_eq!(log.count(EventKind::Error), 2);
    assert_eq!(log.count(EventKind::DataUpdated), 3);
}

#[test]
fn test_warning_notification() {
    let (mut mate, log) = mate_with_log();

    mate.process(&fx_line('3', "000", "064")).unwrap();
    assert_eq!(log.count(EventKind::Warning), 1);
    assert_eq!(log.count(EventKind::Error), 0);

    let record = mate.get_interpreted(Address::new(b'3')).unwrap();
    let warnings = record.get("fx_warning_mode").and_then(|v| v.as_flags()).unwrap();
    assert_eq!(warnings.active().collect::<Vec<_>>(), vec!["Comm Error"]);
}

#[test]
fn test_events_follow_storage() {
    // Handlers observe the record that triggered the event in the store.
    #[derive(Clone)]
    struct StoreProbe {
        store: mate_protocol::RecordStore,
        seen: Arc<Mutex<Vec<String>>>,
    }

    impl EventHandler for StoreProbe {
        fn on_error(&mut self, address: Address, _record: &InterpretedRecord) {
            let stored = self.store.get_raw(address).unwrap();
            self.seen
                .lock()
                .unwrap()
                .push(stored.get("fx_error_mode").unwrap().to_string());
        }
    }

    let mut mate = Mate::new(SystemVoltage::V24);
    let probe = StoreProbe {
        store: mate.store().clone(),
        seen: Arc::default(),
    };
    mate.add_handler(probe.clone());

    mate.process(&fx_line('4', "016", "000")).unwrap();
    assert_eq!(*probe.seen.lock().unwrap(), vec!["016".to_string()]);
}

// ============================================================================
// Rejected Frames
// ============================================================================

#[test]
fn test_rejected_frames_are_not_stored() {
    let (mut mate, log) = mate_with_log();

    assert!(matches!(mate.process(b"\n\r"), Err(MateError::TooShort { .. })));
    assert!(matches!(
        mate.process(b"A,00,10\r"),
        Err(MateError::Framing { .. })
    ));
    assert!(matches!(
        mate.process(b"\nA,\xff,10\r"),
        Err(MateError::Decode { .. })
    ));
    assert_eq!(
        mate.process(b"\nZ,00,10,05,072,123,00,00,000,02,540,000,000,48\r"),
        Err(MateError::UnknownAddress('Z'))
    );
    assert_eq!(
        mate.process(b"\nAB,00,10\r"),
        Err(MateError::InvalidAddress("AB".to_string()))
    );

    assert!(mate.store().is_empty());
    assert!(log.events().is_empty());
}

#[test]
fn test_negative_flag_word_drops_frame() {
    let (mut mate, log) = mate_with_log();

    assert_eq!(
        mate.process(&fx_line('5', "-1", "000")),
        Err(MateError::InvalidField {
            field: "fx_error_mode",
            value: "-1".to_string()
        })
    );
    assert!(mate.store().is_empty());
    assert!(log.events().is_empty());
}

#[test]
fn test_pipeline_continues_after_error() {
    let (mut mate, _log) = mate_with_log();

    assert!(mate.process(b"garbage").is_err());
    assert!(mate.process(MX_LINE).is_ok());
    assert!(mate.process(b"\n0,00,00,00,120,120,00,zz,000,02,512,000,000,00\r").is_err());
    assert!(mate.process(FX_LINE).is_ok());

    assert_eq!(mate.store().len(), 2);
}

#[test]
fn test_custom_checksum_strategy() {
    let log = EventLog::default();
    let mut mate = Mate::new(SystemVoltage::V12)
        .with_checksum(|frame: &str| !frame.ends_with(",99"))
        .with_handler(log.clone());

    let err = mate
        .process(b"\nA,00,10,05,072,123,00,00,000,02,540,000,000,99\r")
        .unwrap_err();
    assert!(matches!(err, MateError::Checksum { .. }));
    assert!(mate.store().is_empty());

    mate.process(MX_LINE).unwrap();
    assert_eq!(log.count(EventKind::DataUpdated), 1);
}

#[test]
fn test_short_frame_is_stored() {
    let (mut mate, log) = mate_with_log();

    let address = mate.process(b"\nB,00,10,05,072,123\r").unwrap();
    let raw = mate.get_raw(address).unwrap();
    assert_eq!(raw.len(), 6);
    assert!(matches!(
        raw.schema_mismatch(),
        Some(MateError::SchemaMismatch { expected: 14, actual: 6, .. })
    ));

    let record = mate.get_interpreted(address).unwrap();
    assert_eq!(record.get("daily_kwh").unwrap().to_string(), "12.3");
    assert!(record.get("mx_batt_volt").is_none());
    assert_eq!(log.count(EventKind::DataUpdated), 1);
}

// ============================================================================
// Construction and Streaming
// ============================================================================

#[test]
fn test_system_voltage_validation() {
    assert_eq!(Mate::with_volts(24).unwrap().system_voltage(), SystemVoltage::V24);
    assert_eq!(
        Mate::with_volts(36).unwrap_err(),
        MateError::UnsupportedSystemVoltage(36)
    );
}

#[test]
fn test_codec_feeds_pipeline() {
    let (mut mate, log) = mate_with_log();
    let mut codec = FrameCodec::new();

    // Stream starts mid-line, then carries two full lines split across reads.
    let mut stream = b"0,000,00\r".to_vec();
    stream.extend_from_slice(FX_LINE);
    stream.extend_from_slice(MX_LINE);

    let mut stored = Vec::new();
    let mut rejected = 0;
    for chunk in stream.chunks(7) {
        codec.push(chunk);
        while let Some(line) = codec.decode().unwrap() {
            match mate.process(&line) {
                Ok(address) => stored.push(address),
                Err(_) => rejected += 1,
            }
        }
    }

    assert_eq!(rejected, 1);
    assert_eq!(stored, vec![Address::new(b'0'), Address::new(b'A')]);
    assert_eq!(log.count(EventKind::DataUpdated), 2);
}
