//! Field interpretation.
//!
//! Some raw fields carry encoded values: operating modes are small integers,
//! error and warning words are bitmasks, and voltages and energy are integers
//! in tenths. Each family has a table mapping those fields to a [`Decoder`];
//! every other field is passed through as a raw string.
//!
//! Decoding is pure. Instead of calling back into a handler, an FX record with
//! a nonzero error or warning word yields an [`Event`] in the returned
//! [`Interpretation`], which the dispatcher delivers after the record is stored.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::device::{Address, DeviceFamily};
use crate::error::{MateError, MateResult};
use crate::schema::RawRecord;

/// Integer mode to label.
pub type ModeTable = &'static [(i64, &'static str)];

/// Bit position to flag name.
pub type FlagTable = &'static [(u8, &'static str)];

/// Marker for fields the protocol does not define yet.
pub const NOT_AVAILABLE: &str = "N/A";

/// FX inverter operating modes (`fx_op_mode`).
pub const FX_OP_MODES: ModeTable = &[
    (0, "Inv Off"),
    (1, "Search"),
    (2, "Inv On"),
    (3, "Charge"),
    (4, "Silent"),
    (5, "Float"),
    (6, "EQ"),
    (7, "Charger Off"),
    (8, "Support"),
    (9, "Sell Enabled"),
    (10, "Pass Through"),
    (90, "FX Error"),
    (91, "AGS Error"),
];

/// FX AC input state (`fx_ac_mode`).
pub const FX_AC_MODES: ModeTable = &[(0, "No AC"), (1, "AC Drop"), (2, "AC Use")];

/// MX auxiliary output modes (`mx_aux_mode`).
pub const MX_AUX_MODES: ModeTable = &[
    (0, "Disabled"),
    (1, "Diversion"),
    (2, "Remote"),
    (3, "Manual"),
    (4, "Vent Fan"),
    (5, "PV Trigger"),
];

/// MX charge stages (`mx_charger_mode`).
pub const MX_CHARGER_MODES: ModeTable = &[
    (0, "Silent"),
    (1, "Float"),
    (2, "Bulk"),
    (3, "Absorb"),
    (4, "EQ"),
];

/// FX error bits (`fx_error_mode`); any set bit raises an error event.
pub const FX_ERROR_FLAGS: FlagTable = &[
    (0, "Low VAC Input"),
    (1, "Stacking Error"),
    (2, "Over Temp"),
    (3, "Low Battery"),
    (4, "Phase Loss"),
    (5, "High Battery"),
    (6, "Shorted Output"),
    (7, "Backfeed"),
];

/// Only bits 0 and 7 are defined.
pub const FX_MISC_FLAGS: FlagTable = &[(0, "230V Unit"), (7, "Aux Output On")];

/// FX warning bits (`fx_warning_mode`); any set bit raises a warning event.
pub const FX_WARNING_FLAGS: FlagTable = &[
    (0, "AC Input Freq High"),
    (1, "AC Input Freq Low"),
    (2, "Input VAC High"),
    (3, "Input VAC Low"),
    (4, "Buy Amps > Input Size"),
    (5, "Temp Sensor Failed"),
    (6, "Comm Error"),
    (7, "Fan Failure"),
];

/// How a field is decoded.
#[derive(Debug, Clone, Copy)]
pub enum Decoder {
    /// Integer looked up in a mode table.
    Mode(ModeTable),
    /// Bitmask; a nonzero value raises the event, if any.
    Flags(FlagTable, Option<EventKind>),
    /// Integer in tenths.
    Scaled,
    /// Always [`NOT_AVAILABLE`].
    NotAvailable,
}

/// Decodable FX fields. Fields not listed stay raw.
pub const FX_DECODERS: &[(&str, Decoder)] = &[
    ("fx_op_mode", Decoder::Mode(FX_OP_MODES)),
    ("fx_error_mode", Decoder::Flags(FX_ERROR_FLAGS, Some(EventKind::Error))),
    ("fx_ac_mode", Decoder::Mode(FX_AC_MODES)),
    ("fx_misc", Decoder::Flags(FX_MISC_FLAGS, None)),
    ("fx_warning_mode", Decoder::Flags(FX_WARNING_FLAGS, Some(EventKind::Warning))),
    ("fx_batt_volt", Decoder::Scaled),
];

/// Decodable MX fields. Fields not listed stay raw.
pub const MX_DECODERS: &[(&str, Decoder)] = &[
    ("daily_kwh", Decoder::Scaled),
    ("mx_aux_mode", Decoder::Mode(MX_AUX_MODES)),
    ("mx_error_mode", Decoder::NotAvailable),
    ("mx_charger_mode", Decoder::Mode(MX_CHARGER_MODES)),
    ("mx_batt_volt", Decoder::Scaled),
];

impl DeviceFamily {
    /// Decoders applied to this family's records.
    pub fn decoders(&self) -> &'static [(&'static str, Decoder)] {
        match self {
            DeviceFamily::Fx => FX_DECODERS,
            DeviceFamily::Mx => MX_DECODERS,
            DeviceFamily::Unknown => &[],
        }
    }
}

/// A fixed-point number with one decimal place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Tenths(i64);

impl Tenths {
    /// Wrap a raw integer count of tenths.
    pub const fn new(tenths: i64) -> Self {
        Tenths(tenths)
    }

    /// The raw count of tenths.
    pub const fn raw(&self) -> i64 {
        self.0
    }

    /// Value as a float, e.g. `539` tenths is `53.9`.
    pub fn as_f64(&self) -> f64 {
        self.0 as f64 / 10.0
    }
}

impl fmt::Display for Tenths {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{}{}.{}", sign, abs / 10, abs % 10)
    }
}

/// One named bit of a flag-set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Flag {
    /// Name from the flag table.
    pub name: &'static str,
    /// Bit position, 0 is the least significant.
    pub bit: u8,
    /// Whether the bit is set.
    pub set: bool,
}

/// A decoded bitmask as named booleans, in table order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlagSet {
    flags: Vec<Flag>,
}

impl FlagSet {
    /// Test each bit of `table` in `value`.
    pub fn decode(table: FlagTable, value: u32) -> Self {
        let flags = table
            .iter()
            .map(|&(bit, name)| Flag {
                name,
                bit,
                set: (value >> bit) & 1 == 1,
            })
            .collect();
        FlagSet { flags }
    }

    /// OR the set flags back into an integer.
    pub fn encode(&self) -> u32 {
        self.flags
            .iter()
            .filter(|flag| flag.set)
            .fold(0, |acc, flag| acc | (1 << flag.bit))
    }

    /// State of a named flag, `None` if the table has no such flag.
    pub fn get(&self, name: &str) -> Option<bool> {
        self.flags
            .iter()
            .find(|flag| flag.name == name)
            .map(|flag| flag.set)
    }

    /// Names of the flags that are set.
    pub fn active(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.flags.iter().filter(|flag| flag.set).map(|flag| flag.name)
    }

    /// True if at least one flag is set.
    pub fn any(&self) -> bool {
        self.flags.iter().any(|flag| flag.set)
    }

    /// All flags of the table, set or not.
    pub fn iter(&self) -> impl Iterator<Item = &Flag> {
        self.flags.iter()
    }
}

impl Serialize for FlagSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.flags.len()))?;
        for flag in &self.flags {
            map.serialize_entry(flag.name, &flag.set)?;
        }
        map.end()
    }
}

/// A field after interpretation.
#[derive(Debug, Clone, PartialEq)]
pub enum InterpretedValue {
    /// Passed through unchanged.
    Raw(String),
    /// Mode label, or `Unknown Mode '<n>'`.
    Label(String),
    /// Bitmask flags.
    Flags(FlagSet),
    /// Fixed-point value.
    Scaled(Tenths),
    /// Field not defined by the protocol.
    NotAvailable,
}

impl InterpretedValue {
    /// The mode label, if this is a label.
    pub fn as_label(&self) -> Option<&str> {
        match self {
            InterpretedValue::Label(label) => Some(label),
            _ => None,
        }
    }

    /// The flag-set, if this is a bitmask field.
    pub fn as_flags(&self) -> Option<&FlagSet> {
        match self {
            InterpretedValue::Flags(flags) => Some(flags),
            _ => None,
        }
    }

    /// The fixed-point value, if this is a scaled field.
    pub fn as_scaled(&self) -> Option<Tenths> {
        match self {
            InterpretedValue::Scaled(value) => Some(*value),
            _ => None,
        }
    }

    /// The untouched text, if the field has no decoder.
    pub fn as_raw(&self) -> Option<&str> {
        match self {
            InterpretedValue::Raw(raw) => Some(raw),
            _ => None,
        }
    }
}

impl fmt::Display for InterpretedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InterpretedValue::Raw(text) | InterpretedValue::Label(text) => f.write_str(text),
            InterpretedValue::Scaled(value) => write!(f, "{}", value),
            InterpretedValue::NotAvailable => f.write_str(NOT_AVAILABLE),
            InterpretedValue::Flags(flags) => {
                let active: Vec<_> = flags.active().collect();
                if active.is_empty() {
                    f.write_str("none")
                } else {
                    f.write_str(&active.join(", "))
                }
            }
        }
    }
}

impl Serialize for InterpretedValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            InterpretedValue::Raw(text) | InterpretedValue::Label(text) => {
                serializer.serialize_str(text)
            }
            InterpretedValue::Flags(flags) => flags.serialize(serializer),
            InterpretedValue::Scaled(value) => serializer.serialize_f64(value.as_f64()),
            InterpretedValue::NotAvailable => serializer.serialize_str(NOT_AVAILABLE),
        }
    }
}

/// What a dispatched event reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// A record was stored for the address.
    DataUpdated,
    /// The record has active warning flags.
    Warning,
    /// The record has active error flags.
    Error,
}

/// A notification for one address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Event {
    /// Device that produced the record.
    pub address: Address,
    /// What happened.
    pub kind: EventKind,
}

/// A record with its decodable fields interpreted.
#[derive(Debug, Clone, PartialEq)]
pub struct InterpretedRecord {
    address: Address,
    family: DeviceFamily,
    received_at: DateTime<Utc>,
    fields: Vec<(&'static str, InterpretedValue)>,
}

impl InterpretedRecord {
    /// Address of the reporting device.
    pub fn address(&self) -> Address {
        self.address
    }

    /// Family the address classifies to.
    pub fn family(&self) -> DeviceFamily {
        self.family
    }

    /// When the frame was received.
    pub fn received_at(&self) -> DateTime<Utc> {
        self.received_at
    }

    /// Value of a field, if present.
    pub fn get(&self, name: &str) -> Option<&InterpretedValue> {
        self.fields
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value)
    }

    /// Fields in schema order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &InterpretedValue)> {
        self.fields.iter().map(|(key, value)| (*key, value))
    }

    /// Battery voltage for either family.
    pub fn battery_voltage(&self) -> Option<Tenths> {
        let field = match self.family {
            DeviceFamily::Fx => "fx_batt_volt",
            DeviceFamily::Mx => "mx_batt_volt",
            DeviceFamily::Unknown => return None,
        };
        self.get(field).and_then(InterpretedValue::as_scaled)
    }
}

impl Serialize for InterpretedRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (key, value) in &self.fields {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// Result of interpreting one record.
#[derive(Debug, Clone, PartialEq)]
pub struct Interpretation {
    /// The interpreted record.
    pub record: InterpretedRecord,
    /// Warning and error events, in field order.
    pub events: Vec<Event>,
}

fn parse_int(field: &'static str, raw: &str) -> MateResult<i64> {
    raw.trim()
        .parse()
        .map_err(|_| MateError::invalid_field(field, raw))
}

/// Label for `value`, or `Unknown Mode '<value>'`.
pub fn mode_label(table: ModeTable, value: i64) -> String {
    table
        .iter()
        .find(|(mode, _)| *mode == value)
        .map(|(_, label)| (*label).to_string())
        .unwrap_or_else(|| format!("Unknown Mode '{}'", value))
}

/// Decode one raw field. Returns the value and the event it raises, if any.
pub fn decode_field(
    field: &'static str,
    raw: &str,
    decoder: Decoder,
) -> MateResult<(InterpretedValue, Option<EventKind>)> {
    match decoder {
        Decoder::Mode(table) => {
            let value = parse_int(field, raw)?;
            Ok((InterpretedValue::Label(mode_label(table, value)), None))
        }
        Decoder::Flags(table, event) => {
            let value = u32::try_from(parse_int(field, raw)?)
                .map_err(|_| MateError::invalid_field(field, raw))?;
            let event = event.filter(|_| value != 0);
            Ok((InterpretedValue::Flags(FlagSet::decode(table, value)), event))
        }
        Decoder::Scaled => {
            let value = parse_int(field, raw)?;
            Ok((InterpretedValue::Scaled(Tenths::new(value)), None))
        }
        Decoder::NotAvailable => Ok((InterpretedValue::NotAvailable, None)),
    }
}

/// Interpret every decodable field of a raw record.
///
/// Fields missing from a short record are skipped.
pub fn interpret(raw: &RawRecord) -> MateResult<Interpretation> {
    let decoders = raw.family().decoders();
    let mut events = Vec::new();
    let mut fields = Vec::with_capacity(raw.len());

    for (key, value) in raw.iter() {
        let decoder = decoders
            .iter()
            .find(|(name, _)| *name == key)
            .map(|(_, decoder)| *decoder);

        let interpreted = match decoder {
            Some(decoder) => {
                let (interpreted, event) = decode_field(key, value, decoder)?;
                if let Some(kind) = event {
                    events.push(Event {
                        address: raw.address(),
                        kind,
                    });
                }
                interpreted
            }
            None => InterpretedValue::Raw(value.to_string()),
        };
        fields.push((key, interpreted));
    }

    Ok(Interpretation {
        record: InterpretedRecord {
            address: raw.address(),
            family: raw.family(),
            received_at: raw.received_at(),
            fields,
        },
        events,
    })
}
