//! Error types for kfdlink
//!
//! Provides a unified error type for all operations. Every failure kind a
//! caller may want to react to has its own variant; nothing is retried
//! internally.

use thiserror::Error;

/// Result type alias using KfdError
pub type Result<T> = std::result::Result<T, KfdError>;

/// Unified error type for kfdlink operations
#[derive(Debug, Error)]
pub enum KfdError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Link Errors
    // -------------------------------------------------------------------------
    /// Malformed frame or unrecognized escape placeholder
    #[error("Framing error: {0}")]
    Framing(String),

    /// No complete frame arrived before the deadline
    #[error("Timed out after {timeout_ms} ms waiting for a reply frame")]
    Timeout { timeout_ms: u64 },

    /// The byte stream was used while closed
    #[error("Transport is closed")]
    TransportClosed,

    // -------------------------------------------------------------------------
    // Protocol Errors
    // -------------------------------------------------------------------------
    /// Reply opcode/sub-opcode did not match the command that was issued
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// The device explicitly rejected a write
    #[error("Write failed: {0}")]
    WriteFailed(String),

    /// The connected device family does not implement the operation
    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    // -------------------------------------------------------------------------
    // Input Errors
    // -------------------------------------------------------------------------
    /// Out-of-range SLN/KID/slot/serial; raised before any bytes are sent
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl KfdError {
    /// True for reply deadline expiry
    pub fn is_timeout(&self) -> bool {
        matches!(self, KfdError::Timeout { .. })
    }

    /// True for unexpected reply opcodes/sub-opcodes
    pub fn is_protocol(&self) -> bool {
        matches!(self, KfdError::Protocol(_))
    }

    /// True for pre-flight input rejections
    pub fn is_validation(&self) -> bool {
        matches!(self, KfdError::Validation(_))
    }
}
