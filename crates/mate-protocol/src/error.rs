//! Error types for the Mate protocol.

use thiserror::Error;

use crate::device::DeviceFamily;

/// Reasons a frame is rejected by the decoding pipeline.
///
/// None of these are fatal to a reader loop: the frame is dropped, reported,
/// and the next frame is processed normally.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MateError {
    /// The bytes are not valid UTF-8.
    #[error("cannot decode frame bytes as UTF-8: {hex}")]
    Decode {
        /// The offending bytes, hex encoded.
        hex: String,
    },

    /// Decoded text too short to hold both markers and a payload.
    #[error("frame too short: {len} characters in {text:?}")]
    TooShort {
        /// Length in characters.
        len: usize,
        /// The decoded text.
        text: String,
    },

    /// Missing or wrong start (`\n`) or end (`\r`) marker.
    #[error("start/end marker error on {text:?}")]
    Framing {
        /// The decoded text.
        text: String,
    },

    /// The checksum strategy rejected the frame.
    #[error("cannot verify checksum of {frame:?}")]
    Checksum {
        /// Frame interior text.
        frame: String,
    },

    /// The address field is not a single character.
    #[error("invalid address field {0:?}")]
    InvalidAddress(String),

    /// The address lies outside both the FX and MX ranges.
    #[error("unknown address {0:?}")]
    UnknownAddress(char),

    /// A decodable field does not hold an integer.
    #[error("invalid value {value:?} for field {field}")]
    InvalidField {
        /// Schema name of the field.
        field: &'static str,
        /// Raw value as received.
        value: String,
    },

    /// Field count differs from the family schema.
    ///
    /// This is reported but does not stop the record from being stored.
    #[error("{family} frame has {actual} fields, schema expects {expected}")]
    SchemaMismatch {
        /// Device family of the frame.
        family: DeviceFamily,
        /// Schema length.
        expected: usize,
        /// Number of comma separated values received.
        actual: usize,
    },

    /// Transport buffer grew past the maximum line length without a terminator.
    #[error("line buffer overflow: max {max} bytes, got {actual}")]
    BufferOverflow {
        /// Maximum line length.
        max: usize,
        /// Bytes buffered when the overflow was detected.
        actual: usize,
    },

    /// The requested nominal system voltage is not supported.
    #[error("system voltage of {0} not in [12, 24, 48]")]
    UnsupportedSystemVoltage(u16),
}

impl MateError {
    /// Short label used for the `reason` metric label.
    pub fn reason(&self) -> &'static str {
        match self {
            MateError::Decode { .. } => "decode",
            MateError::TooShort { .. } => "too_short",
            MateError::Framing { .. } => "framing",
            MateError::Checksum { .. } => "checksum",
            MateError::InvalidAddress(_) => "invalid_address",
            MateError::UnknownAddress(_) => "unknown_address",
            MateError::InvalidField { .. } => "invalid_field",
            MateError::SchemaMismatch { .. } => "schema_mismatch",
            MateError::BufferOverflow { .. } => "overflow",
            MateError::UnsupportedSystemVoltage(_) => "system_voltage",
        }
    }

    /// Create an invalid field error.
    pub fn invalid_field(field: &'static str, value: impl Into<String>) -> Self {
        MateError::InvalidField {
            field,
            value: value.into(),
        }
    }
}

/// Result type alias for Mate protocol operations.
pub type MateResult<T> = Result<T, MateError>;
