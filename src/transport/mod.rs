//! Transport Module
//!
//! Byte-stream plumbing between the command protocol and the adapter.
//!
//! ## Architecture
//! - [`ByteStream`]: the capability every physical link implements
//! - [`TransportSession`]: owns one stream, frames outgoing payloads and
//!   reads exactly one reply frame per call
//! - [`SerialStream`]: real serial port
//! - [`ScriptedStream`]: in-memory stand-in that replays canned replies

use std::time::Duration;

use crate::error::Result;

mod scripted;
mod serial;
mod session;

pub use scripted::ScriptedStream;
pub use serial::SerialStream;
pub use session::TransportSession;

/// Minimal byte-level link to an adapter
///
/// Implementations are not required to make `open`/`close` idempotent;
/// [`TransportSession`] does that.
pub trait ByteStream {
    /// Acquire the underlying handle
    fn open(&mut self) -> Result<()>;

    /// Release the underlying handle
    fn close(&mut self) -> Result<()>;

    /// Whether the handle is currently held
    fn is_open(&self) -> bool;

    /// Write all bytes
    fn write(&mut self, bytes: &[u8]) -> Result<()>;

    /// Drop any received bytes not yet read
    fn clear_input(&mut self) -> Result<()>;

    /// Read a single byte, blocking at most `timeout`
    ///
    /// Returns `Ok(None)` if nothing arrived in time. Fails with
    /// `KfdError::TransportClosed` if the stream is closed.
    fn read_byte(&mut self, timeout: Duration) -> Result<Option<u8>>;
}
