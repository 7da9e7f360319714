//! Scripted stream
//!
//! An in-memory adapter stand-in. Each `write` releases the next canned
//! reply into the read side, so command/reply exchanges can be replayed
//! without hardware.

use std::collections::VecDeque;
use std::time::Duration;

use crate::error::{KfdError, Result};
use super::ByteStream;

/// In-memory ByteStream with scripted replies
#[derive(Debug, Default)]
pub struct ScriptedStream {
    open: bool,

    /// Times `open`/`close` actually ran
    opens: usize,
    closes: usize,

    /// Bytes available to `read_byte`
    inbound: VecDeque<u8>,

    /// One entry per expected write; `None` means the device stays silent
    replies: VecDeque<Option<Vec<u8>>>,

    /// Every buffer passed to `write`, in order
    writes: Vec<Vec<u8>>,
}

impl ScriptedStream {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue wire bytes to release after the next unanswered write
    pub fn push_reply(&mut self, wire: impl Into<Vec<u8>>) -> &mut Self {
        self.replies.push_back(Some(wire.into()));
        self
    }

    /// Queue a write that gets no reply
    pub fn push_silence(&mut self) -> &mut Self {
        self.replies.push_back(None);
        self
    }

    /// Make bytes readable immediately, independent of writes
    pub fn push_inbound(&mut self, bytes: &[u8]) -> &mut Self {
        self.inbound.extend(bytes.iter().copied());
        self
    }

    /// Everything written so far
    pub fn writes(&self) -> &[Vec<u8>] {
        &self.writes
    }

    /// Bytes still waiting to be read
    pub fn unread(&self) -> usize {
        self.inbound.len()
    }

    /// Scripted replies not yet released
    pub fn pending_replies(&self) -> usize {
        self.replies.len()
    }

    pub fn open_count(&self) -> usize {
        self.opens
    }

    pub fn close_count(&self) -> usize {
        self.closes
    }
}

impl ByteStream for ScriptedStream {
    fn open(&mut self) -> Result<()> {
        self.open = true;
        self.opens += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.open = false;
        self.closes += 1;
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        if !self.open {
            return Err(KfdError::TransportClosed);
        }
        self.writes.push(bytes.to_vec());
        if let Some(Some(reply)) = self.replies.pop_front() {
            self.inbound.extend(reply);
        }
        Ok(())
    }

    fn clear_input(&mut self) -> Result<()> {
        if !self.open {
            return Err(KfdError::TransportClosed);
        }
        if !self.inbound.is_empty() {
            tracing::debug!("Discarding {} stale inbound bytes", self.inbound.len());
            self.inbound.clear();
        }
        Ok(())
    }

    fn read_byte(&mut self, timeout: Duration) -> Result<Option<u8>> {
        if !self.open {
            return Err(KfdError::TransportClosed);
        }
        match self.inbound.pop_front() {
            Some(byte) => Ok(Some(byte)),
            None => {
                // Behave like an idle line: block for the full timeout
                std::thread::sleep(timeout);
                Ok(None)
            }
        }
    }
}
