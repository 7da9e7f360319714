//! Frame Module
//!
//! Byte-stuffing codec that delimits opaque command/reply payloads on the
//! serial line. Knows nothing about opcodes.
//!
//! ## Wire Format
//! ```text
//! ┌──────────┬──────────────────────────────────┬──────────┐
//! │ HEADER   │  payload (HEADER/FOOTER/ESCAPE   │ FOOTER   │
//! │  (1)     │  replaced by ESCAPE+placeholder) │  (1)     │
//! └──────────┴──────────────────────────────────┴──────────┘
//! ```
//!
//! Decoding is byte-at-a-time with no length prefix. A HEADER always
//! restarts the frame, which is how the reader resynchronises after line
//! noise.

mod codec;
mod decoder;

pub use codec::{encode, unescape};
pub use decoder::{decode_next, FrameDecoder};

/// Delimiter and escape bytes for one device family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameConstants {
    pub header: u8,
    pub header_placeholder: u8,
    pub footer: u8,
    pub footer_placeholder: u8,
    pub escape: u8,
    pub escape_placeholder: u8,
}

impl FrameConstants {
    /// Placeholder to emit after ESCAPE for a reserved byte, or `None` if
    /// `byte` passes through unchanged
    pub fn placeholder_for(&self, byte: u8) -> Option<u8> {
        if byte == self.escape {
            Some(self.escape_placeholder)
        } else if byte == self.header {
            Some(self.header_placeholder)
        } else if byte == self.footer {
            Some(self.footer_placeholder)
        } else {
            None
        }
    }

    /// Reserved byte a placeholder stands for
    pub fn symbol_for(&self, placeholder: u8) -> Option<u8> {
        if placeholder == self.escape_placeholder {
            Some(self.escape)
        } else if placeholder == self.header_placeholder {
            Some(self.header)
        } else if placeholder == self.footer_placeholder {
            Some(self.footer)
        } else {
            None
        }
    }

    /// True when one byte both opens and closes a frame
    pub fn shared_delimiter(&self) -> bool {
        self.header == self.footer
    }
}
