//! Transport Session
//!
//! Owns the byte stream exclusively for one device.

use std::time::Duration;

use crate::error::{KfdError, Result};
use crate::frame::{self, FrameConstants};
use super::ByteStream;

/// Framed, half-duplex session over a byte stream
///
/// Not synchronised; callers sharing a session across threads must wrap
/// the owner in a mutex.
pub struct TransportSession<S: ByteStream> {
    /// The exclusively owned link
    stream: S,

    /// Framing bytes for the connected family
    constants: FrameConstants,
}

impl<S: ByteStream> TransportSession<S> {
    /// Wrap a stream; does not open it
    pub fn new(stream: S, constants: FrameConstants) -> Self {
        Self { stream, constants }
    }

    /// Open the stream (no-op if already open)
    pub fn open(&mut self) -> Result<()> {
        if self.stream.is_open() {
            return Ok(());
        }
        tracing::debug!("Opening transport session");
        self.stream.open()
    }

    /// Close the stream (no-op if already closed)
    pub fn close(&mut self) -> Result<()> {
        if !self.stream.is_open() {
            return Ok(());
        }
        tracing::debug!("Closing transport session");
        self.stream.close()
    }

    pub fn is_open(&self) -> bool {
        self.stream.is_open()
    }

    /// Frame `payload` and write it, opening the stream first if needed
    ///
    /// Unread input is discarded first: whatever is still buffered belongs
    /// to an earlier exchange that already timed out, and must not be taken
    /// as the reply to this one.
    pub fn send(&mut self, payload: &[u8]) -> Result<()> {
        self.open()?;
        self.stream.clear_input()?;
        let wire = frame::encode(&self.constants, payload);
        tracing::trace!("TX payload {:02x?} -> wire {:02x?}", payload, wire);
        self.stream.write(&wire)
    }

    /// Read exactly one frame, waiting at most `timeout`
    pub fn receive(&mut self, timeout: Duration) -> Result<Vec<u8>> {
        if !self.stream.is_open() {
            return Err(KfdError::TransportClosed);
        }
        let payload = frame::decode_next(&mut self.stream, &self.constants, timeout)?;
        tracing::trace!("RX payload {:02x?}", payload);
        Ok(payload)
    }

    /// Framing bytes in use
    pub fn constants(&self) -> &FrameConstants {
        &self.constants
    }

    /// Borrow the underlying stream
    pub fn stream(&self) -> &S {
        &self.stream
    }

    /// Mutably borrow the underlying stream
    pub fn stream_mut(&mut self) -> &mut S {
        &mut self.stream
    }

    /// Give back the stream
    pub fn into_inner(self) -> S {
        self.stream
    }
}
