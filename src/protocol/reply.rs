//! Reply definitions
//!
//! Represents replies received from the adapter.

use std::fmt;

use crate::error::{KfdError, Result};

/// Reply opcodes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ReplyOpcode {
    Error = 0x20,
    ReadReply = 0x21,
    WriteReply = 0x22,
    EnterBootloaderReply = 0x23,
    ResetReply = 0x24,
    SelfTestReply = 0x25,
    SendKeySigReply = 0x26,
    SendByteReply = 0x27,
}

impl TryFrom<u8> for ReplyOpcode {
    type Error = KfdError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0x20 => Ok(ReplyOpcode::Error),
            0x21 => Ok(ReplyOpcode::ReadReply),
            0x22 => Ok(ReplyOpcode::WriteReply),
            0x23 => Ok(ReplyOpcode::EnterBootloaderReply),
            0x24 => Ok(ReplyOpcode::ResetReply),
            0x25 => Ok(ReplyOpcode::SelfTestReply),
            0x26 => Ok(ReplyOpcode::SendKeySigReply),
            0x27 => Ok(ReplyOpcode::SendByteReply),
            _ => Err(KfdError::Protocol(format!(
                "Unknown reply opcode: 0x{:02x}",
                value
            ))),
        }
    }
}

/// Error codes carried in the first body byte of an ERROR reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceErrorCode {
    Other,
    InvalidCommandLength,
    InvalidCommandOpcode,
    InvalidReadOpcode,
    ReadFailed,
    InvalidWriteOpcode,
    WriteFailed,
    Unknown(u8),
}

impl From<u8> for DeviceErrorCode {
    fn from(value: u8) -> Self {
        match value {
            0x00 => DeviceErrorCode::Other,
            0x01 => DeviceErrorCode::InvalidCommandLength,
            0x02 => DeviceErrorCode::InvalidCommandOpcode,
            0x03 => DeviceErrorCode::InvalidReadOpcode,
            0x04 => DeviceErrorCode::ReadFailed,
            0x05 => DeviceErrorCode::InvalidWriteOpcode,
            0x06 => DeviceErrorCode::WriteFailed,
            other => DeviceErrorCode::Unknown(other),
        }
    }
}

impl fmt::Display for DeviceErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceErrorCode::Other => write!(f, "ERROR_OTHER"),
            DeviceErrorCode::InvalidCommandLength => write!(f, "ERROR_INVALID_CMD_LENGTH"),
            DeviceErrorCode::InvalidCommandOpcode => write!(f, "ERROR_INVALID_CMD_OPCODE"),
            DeviceErrorCode::InvalidReadOpcode => write!(f, "ERROR_INVALID_READ_OPCODE"),
            DeviceErrorCode::ReadFailed => write!(f, "ERROR_READ_FAILED"),
            DeviceErrorCode::InvalidWriteOpcode => write!(f, "ERROR_INVALID_WRITE_OPCODE"),
            DeviceErrorCode::WriteFailed => write!(f, "ERROR_WRITE_FAILED"),
            DeviceErrorCode::Unknown(code) => write!(f, "unknown error 0x{:02x}", code),
        }
    }
}

/// A parsed reply frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Reply opcode
    pub opcode: ReplyOpcode,

    /// Everything after the opcode
    pub body: Vec<u8>,
}

impl Reply {
    /// Parse a frame payload
    pub fn parse(frame: &[u8]) -> Result<Self> {
        let (&opcode, body) = frame
            .split_first()
            .ok_or_else(|| KfdError::Protocol("Empty reply frame".to_string()))?;

        Ok(Self {
            opcode: ReplyOpcode::try_from(opcode)?,
            body: body.to_vec(),
        })
    }

    /// First body byte, for replies that echo a sub-opcode
    pub fn sub_opcode(&self) -> Option<u8> {
        self.body.first().copied()
    }

    /// Body after the sub-opcode
    pub fn payload(&self) -> &[u8] {
        self.body.get(1..).unwrap_or(&[])
    }

    /// Device error code if this is an ERROR reply
    pub fn error_code(&self) -> Option<DeviceErrorCode> {
        if self.opcode != ReplyOpcode::Error {
            return None;
        }
        Some(self.body.first().map_or(DeviceErrorCode::Other, |&c| c.into()))
    }

    /// Fail with a Protocol error unless the opcode is `expected`
    pub fn expect(&self, expected: ReplyOpcode) -> Result<()> {
        if self.opcode == expected {
            return Ok(());
        }
        Err(KfdError::Protocol(format!(
            "Expected {:?} (0x{:02x}) but got {}",
            expected,
            expected as u8,
            self.describe()
        )))
    }

    /// Short description for error messages
    pub fn describe(&self) -> String {
        match self.error_code() {
            Some(code) => format!("ERROR reply ({})", code),
            None => format!("{:?} (0x{:02x})", self.opcode, self.opcode as u8),
        }
    }
}
