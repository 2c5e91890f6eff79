//! Frame validation.
//!
//! The Mate emits one status line per device:
//!
//! ```text
//! \n <address> , <field> , ... , <chksum> \r
//! ```
//!
//! A raw chunk is accepted when it is valid UTF-8, longer than two characters,
//! starts with `\n` and ends with `\r`. The two markers are stripped and the
//! interior becomes a [`Frame`].

use std::fmt;

use crate::error::{MateError, MateResult};

/// Start-of-frame marker.
pub const FRAME_START: char = '\n';

/// End-of-frame marker, also the transport line terminator.
pub const FRAME_END: char = '\r';

/// Field separator inside a frame.
pub const FIELD_SEPARATOR: char = ',';

/// The validated interior text of one status line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame(String);

impl Frame {
    /// The interior text, without markers.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Comma separated values in order.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.split(FIELD_SEPARATOR)
    }

    /// The first field, which carries the device address.
    pub fn address_field(&self) -> &str {
        self.0.split(FIELD_SEPARATOR).next().unwrap_or_default()
    }

    /// Consume the frame, returning its text.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Validate one raw chunk and strip its markers.
pub fn frame(raw: &[u8]) -> MateResult<Frame> {
    let text = std::str::from_utf8(raw).map_err(|_| MateError::Decode {
        hex: hex::encode(raw),
    })?;

    let len = text.chars().count();
    if len <= 2 {
        return Err(MateError::TooShort {
            len,
            text: text.to_string(),
        });
    }

    let mut chars = text.chars();
    let (start, end) = (chars.next(), chars.next_back());
    if start != Some(FRAME_START) || end != Some(FRAME_END) {
        return Err(MateError::Framing {
            text: text.to_string(),
        });
    }

    // Both markers are single-byte ASCII.
    Ok(Frame(text[1..text.len() - 1].to_string()))
}
