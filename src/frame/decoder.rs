//! Frame decoder
//!
//! Push-style accumulator plus a deadline-bounded driver over a ByteStream.

use std::time::{Duration, Instant};

use crate::error::{KfdError, Result};
use crate::transport::ByteStream;
use super::{codec, FrameConstants};

/// Accumulates raw line bytes until a complete frame is seen
#[derive(Debug, Clone)]
pub struct FrameDecoder {
    constants: FrameConstants,

    /// Escaped bytes received since the last HEADER
    buffer: Vec<u8>,

    /// A HEADER has been seen and no FOOTER yet
    in_frame: bool,
}

impl FrameDecoder {
    /// Create an idle decoder
    pub fn new(constants: FrameConstants) -> Self {
        Self {
            constants,
            buffer: Vec::new(),
            in_frame: false,
        }
    }

    /// Feed one byte from the line
    ///
    /// Returns:
    /// - `Ok(Some(payload))`: a FOOTER completed a frame
    /// - `Ok(None)`: need more bytes
    /// - `Err(Framing)`: frame completed but its body was malformed
    pub fn push(&mut self, byte: u8) -> Result<Option<Vec<u8>>> {
        // Checked first so a shared start/end byte closes an open frame
        if self.in_frame && byte == self.constants.footer {
            // With a shared delimiter, two in a row are a stale end followed
            // by a fresh start, never an empty frame
            if self.buffer.is_empty() && self.constants.shared_delimiter() {
                tracing::trace!("Repeated delimiter, staying in frame");
                return Ok(None);
            }
            self.in_frame = false;
            let raw = std::mem::take(&mut self.buffer);
            tracing::trace!("Frame complete: {} raw bytes", raw.len());
            return codec::unescape(&self.constants, &raw).map(Some);
        }

        if byte == self.constants.header {
            if !self.buffer.is_empty() {
                tracing::warn!(
                    "Header inside frame, discarding {} partial bytes",
                    self.buffer.len()
                );
            }
            self.buffer.clear();
            self.in_frame = true;
            return Ok(None);
        }

        if self.in_frame {
            self.buffer.push(byte);
        } else {
            tracing::trace!("Dropping byte 0x{:02x} outside a frame", byte);
        }

        Ok(None)
    }

    /// Discard any partial frame
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.in_frame = false;
    }

    /// True if no frame is in progress
    pub fn is_idle(&self) -> bool {
        !self.in_frame
    }

    /// Number of raw bytes accumulated for the current frame
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }
}

/// Read bytes from `stream` until one frame is complete or `timeout` elapses
///
/// The partial buffer lives only for this call, so nothing carries over
/// into the next one.
pub fn decode_next<S: ByteStream + ?Sized>(
    stream: &mut S,
    constants: &FrameConstants,
    timeout: Duration,
) -> Result<Vec<u8>> {
    let deadline = Instant::now() + timeout;
    let mut decoder = FrameDecoder::new(*constants);

    loop {
        let now = Instant::now();
        if now >= deadline {
            tracing::debug!(
                "No frame within {:?} ({} partial bytes discarded)",
                timeout,
                decoder.buffered()
            );
            return Err(KfdError::Timeout {
                timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            });
        }

        if let Some(byte) = stream.read_byte(deadline - now)? {
            if let Some(frame) = decoder.push(byte)? {
                return Ok(frame);
            }
        }
    }
}
