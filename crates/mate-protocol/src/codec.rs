//! Stream splitting for the Mate serial link.
//!
//! The Mate sends status lines terminated with carriage return (`\r`); the line
//! feed that opens each frame follows the previous terminator. This codec cuts
//! the byte stream after every `\r`, keeping the terminator, which is what the
//! framer expects.

use bytes::BytesMut;

use crate::error::{MateError, MateResult};

/// Maximum line length before the buffer is discarded.
///
/// Status lines are under 50 bytes.
pub const MAX_LINE_LENGTH: usize = 256;

/// Line terminator byte.
pub const LINE_TERMINATOR: u8 = b'\r';

/// Accumulates received bytes and yields `\r` terminated chunks.
#[derive(Debug, Default)]
pub struct FrameCodec {
    buffer: BytesMut,
}

impl FrameCodec {
    /// Create a new codec.
    pub fn new() -> Self {
        FrameCodec {
            buffer: BytesMut::with_capacity(MAX_LINE_LENGTH * 2),
        }
    }

    /// Add received data to the buffer.
    pub fn push(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Try to take the next complete chunk, terminator included.
    ///
    /// Returns `Ok(None)` when more data is needed. When the buffer holds more
    /// than [`MAX_LINE_LENGTH`] bytes without a terminator it is cleared and a
    /// [`MateError::BufferOverflow`] is returned.
    pub fn decode(&mut self) -> MateResult<Option<Vec<u8>>> {
        match self.buffer.iter().position(|&b| b == LINE_TERMINATOR) {
            Some(end) => Ok(Some(self.buffer.split_to(end + 1).to_vec())),
            None if self.buffer.len() > MAX_LINE_LENGTH => {
                let actual = self.buffer.len();
                self.buffer.clear();
                Err(MateError::BufferOverflow {
                    max: MAX_LINE_LENGTH,
                    actual,
                })
            }
            None => Ok(None),
        }
    }

    /// Take whatever is left in the buffer, e.g. at end of stream.
    pub fn flush(&mut self) -> Option<Vec<u8>> {
        if self.buffer.is_empty() {
            None
        } else {
            Some(self.buffer.split().to_vec())
        }
    }

    /// Get the number of buffered bytes.
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// Clear the buffer.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}
