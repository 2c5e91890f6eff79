//! Field schemas for FX and MX status lines.

use chrono::{DateTime, Utc};
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::device::{Address, DeviceFamily};
use crate::error::{MateError, MateResult};
use crate::frame::Frame;

/// FX inverter status line, in wire order.
pub const FX_SCHEMA: [&str; 14] = [
    "address",
    "inverter_current",
    "charger_current",
    "buy_current",
    "ac_in_volt",
    "ac_out_volt",
    "sell_current",
    "fx_op_mode",
    "fx_error_mode",
    "fx_ac_mode",
    "fx_batt_volt",
    "fx_misc",
    "fx_warning_mode",
    "chksum",
];

/// MX charge controller status line, in wire order.
pub const MX_SCHEMA: [&str; 14] = [
    "address",
    "unused_1",
    "charger_current",
    "pv_current",
    "pv_in_volt",
    "daily_kwh",
    "unused_2",
    "mx_aux_mode",
    "mx_error_mode",
    "mx_charger_mode",
    "mx_batt_volt",
    "unused_3",
    "unused_4",
    "chksum",
];

impl DeviceFamily {
    /// Ordered field names for this family, `None` for unknown devices.
    pub fn schema(&self) -> Option<&'static [&'static str]> {
        match self {
            DeviceFamily::Fx => Some(&FX_SCHEMA),
            DeviceFamily::Mx => Some(&MX_SCHEMA),
            DeviceFamily::Unknown => None,
        }
    }
}

/// Field name to raw string value, in schema order.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    address: Address,
    family: DeviceFamily,
    received_at: DateTime<Utc>,
    fields: Vec<(&'static str, String)>,
    value_count: usize,
}

impl RawRecord {
    /// Device address.
    pub fn address(&self) -> Address {
        self.address
    }

    /// Device family.
    pub fn family(&self) -> DeviceFamily {
        self.family
    }

    /// When the frame was mapped.
    pub fn received_at(&self) -> DateTime<Utc> {
        self.received_at
    }

    /// Raw value of a field, if present.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Fields in schema order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.fields.iter().map(|(key, value)| (*key, value.as_str()))
    }

    /// Number of populated fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// True if no field was populated.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Reports a field count that differs from the schema.
    ///
    /// Short frames populate only their leading fields; extra values are
    /// dropped. Both are stored regardless.
    pub fn schema_mismatch(&self) -> Option<MateError> {
        let expected = self.family.schema().map_or(0, <[_]>::len);
        (self.value_count != expected).then_some(MateError::SchemaMismatch {
            family: self.family,
            expected,
            actual: self.value_count,
        })
    }
}

impl Serialize for RawRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (key, value) in &self.fields {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// Zip a frame against its family's schema.
///
/// The address is parsed from the first field; unknown families are rejected.
pub fn map_fields(frame: &Frame, family: DeviceFamily) -> MateResult<RawRecord> {
    let address = Address::parse(frame.address_field())?;
    let schema = family
        .schema()
        .ok_or(MateError::UnknownAddress(address.as_char()))?;

    let values: Vec<&str> = frame.fields().collect();
    let fields = schema
        .iter()
        .zip(&values)
        .map(|(key, value)| (*key, (*value).to_string()))
        .collect();

    Ok(RawRecord {
        address,
        family,
        received_at: Utc::now(),
        fields,
        value_count: values.len(),
    })
}
