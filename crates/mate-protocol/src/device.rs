//! Device addressing and classification.
//!
//! Every status line starts with a single-character address. Its code point
//! selects the device family: `'0'..=':'` (48-58) are FX inverters and
//! `'A'..='K'` (65-75) are MX charge controllers.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{MateError, MateResult};

/// Inclusive code point range for FX inverter addresses.
pub const FX_ADDRESS_RANGE: (u8, u8) = (48, 58);

/// Inclusive code point range for MX charge controller addresses.
pub const MX_ADDRESS_RANGE: (u8, u8) = (65, 75);

/// Device family, derived from the address code point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceFamily {
    /// FX-series inverter/charger.
    Fx,
    /// MX-series charge controller.
    Mx,
    /// Address outside both known ranges.
    Unknown,
}

impl DeviceFamily {
    /// Lowercase name, used for metric labels.
    pub const fn as_str(&self) -> &'static str {
        match self {
            DeviceFamily::Fx => "fx",
            DeviceFamily::Mx => "mx",
            DeviceFamily::Unknown => "unknown",
        }
    }
}

impl fmt::Display for DeviceFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceFamily::Fx => write!(f, "FX"),
            DeviceFamily::Mx => write!(f, "MX"),
            DeviceFamily::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Classify an address code point.
pub fn classify(address: u8) -> DeviceFamily {
    if (FX_ADDRESS_RANGE.0..=FX_ADDRESS_RANGE.1).contains(&address) {
        DeviceFamily::Fx
    } else if (MX_ADDRESS_RANGE.0..=MX_ADDRESS_RANGE.1).contains(&address) {
        DeviceFamily::Mx
    } else {
        DeviceFamily::Unknown
    }
}

/// A single-byte device address, also the store key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address(u8);

impl Address {
    /// Wrap a raw address byte.
    pub const fn new(value: u8) -> Self {
        Address(value)
    }

    /// Parse the address field of a frame.
    ///
    /// The field must be exactly one character with a code point below 256.
    pub fn parse(field: &str) -> MateResult<Address> {
        let mut chars = field.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => u8::try_from(u32::from(c))
                .map(Address)
                .map_err(|_| MateError::UnknownAddress(c)),
            _ => Err(MateError::InvalidAddress(field.to_string())),
        }
    }

    /// The raw code point.
    pub const fn value(&self) -> u8 {
        self.0
    }

    /// The address as a character.
    pub fn as_char(&self) -> char {
        char::from(self.0)
    }

    /// The family this address belongs to.
    pub fn family(&self) -> DeviceFamily {
        classify(self.0)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

impl Serialize for Address {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Nominal battery bank voltage of the installation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub enum SystemVoltage {
    /// 12 V bank.
    V12,
    /// 24 V bank.
    V24,
    /// 48 V bank.
    V48,
}

impl SystemVoltage {
    /// Nominal voltage in volts.
    pub const fn volts(&self) -> u16 {
        match self {
            SystemVoltage::V12 => 12,
            SystemVoltage::V24 => 24,
            SystemVoltage::V48 => 48,
        }
    }
}

impl TryFrom<u16> for SystemVoltage {
    type Error = MateError;

    fn try_from(volts: u16) -> MateResult<Self> {
        match volts {
            12 => Ok(SystemVoltage::V12),
            24 => Ok(SystemVoltage::V24),
            48 => Ok(SystemVoltage::V48),
            other => Err(MateError::UnsupportedSystemVoltage(other)),
        }
    }
}

impl From<SystemVoltage> for u16 {
    fn from(voltage: SystemVoltage) -> Self {
        voltage.volts()
    }
}

impl fmt::Display for SystemVoltage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}V", self.volts())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_every_byte() {
        for value in 0..=255u8 {
            let expected = match value {
                48..=58 => DeviceFamily::Fx,
                65..=75 => DeviceFamily::Mx,
                _ => DeviceFamily::Unknown,
            };
            assert_eq!(classify(value), expected, "address byte {}", value);
        }
    }

    #[test]
    fn test_classify_range_edges() {
        assert_eq!(classify(b'0'), DeviceFamily::Fx);
        assert_eq!(classify(b':'), DeviceFamily::Fx);
        assert_eq!(classify(b';'), DeviceFamily::Unknown);
        assert_eq!(classify(b'@'), DeviceFamily::Unknown);
        assert_eq!(classify(b'A'), DeviceFamily::Mx);
        assert_eq!(classify(b'K'), DeviceFamily::Mx);
        assert_eq!(classify(b'L'), DeviceFamily::Unknown);
    }

    #[test]
    fn test_parse_address() {
        let address = Address::parse("B").unwrap();
        assert_eq!(address.value(), 66);
        assert_eq!(address.family(), DeviceFamily::Mx);
        assert_eq!(address.to_string(), "B");
    }

    #[test]
    fn test_parse_address_rejects_bad_shapes() {
        assert_eq!(
            Address::parse(""),
            Err(MateError::InvalidAddress(String::new()))
        );
        assert_eq!(
            Address::parse("10"),
            Err(MateError::InvalidAddress("10".to_string()))
        );
        assert_eq!(Address::parse("€"), Err(MateError::UnknownAddress('€')));
    }

    #[test]
    fn test_system_voltage() {
        assert_eq!(SystemVoltage::try_from(24), Ok(SystemVoltage::V24));
        assert_eq!(
            SystemVoltage::try_from(36),
            Err(MateError::UnsupportedSystemVoltage(36))
        );
        assert_eq!(SystemVoltage::V48.to_string(), "48V");
        assert_eq!(u16::from(SystemVoltage::V12), 12);
    }
}
