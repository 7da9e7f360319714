//! Command definitions
//!
//! Represents commands sent to the adapter.

use crate::error::{KfdError, Result};
use crate::key::KeyItem;
use super::info::InfoField;
use super::reply::ReplyOpcode;

/// Width of the serial-number argument of WRITE_SN
pub const SERIAL_NUMBER_LEN: usize = 6;

/// Command opcodes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Opcode {
    ReadRequest = 0x11,
    WriteRequest = 0x12,
    EnterBootloader = 0x13,
    Reset = 0x14,
    SelfTest = 0x15,
    SendKeySig = 0x16,
    SendByte = 0x17,
}

impl Opcode {
    /// Reply opcode the adapter answers with, or `None` for one-way commands
    pub fn expected_reply(self) -> Option<ReplyOpcode> {
        match self {
            Opcode::ReadRequest => Some(ReplyOpcode::ReadReply),
            Opcode::WriteRequest => Some(ReplyOpcode::WriteReply),
            Opcode::SelfTest => Some(ReplyOpcode::SelfTestReply),
            Opcode::SendKeySig => Some(ReplyOpcode::SendKeySigReply),
            Opcode::SendByte => Some(ReplyOpcode::SendByteReply),
            Opcode::EnterBootloader | Opcode::Reset => None,
        }
    }
}

/// READ_REQUEST sub-opcodes
pub mod read_op {
    pub const ADAPTER_VER: u8 = 0x01;
    pub const FW_VER: u8 = 0x02;
    pub const UID: u8 = 0x03;
    pub const MODEL: u8 = 0x04;
    pub const HW_REV: u8 = 0x05;
    pub const SN: u8 = 0x06;
    pub const KEY_INFO: u8 = 0x07;
}

/// WRITE_REQUEST sub-opcodes
pub mod write_op {
    pub const MODEL: u8 = 0x01;
    pub const SN: u8 = 0x02;
    pub const KEY: u8 = 0x03;
}

/// A command ready to be framed
#[derive(Debug, Clone)]
pub enum Command {
    /// Read one identification field
    Read(InfoField),

    /// Read the key stored in a slot
    ReadKeyInfo { slot: u8 },

    /// Program model number and hardware revision
    WriteModel {
        model: u8,
        hw_rev_major: u8,
        hw_rev_minor: u8,
    },

    /// Program the serial number (already normalised)
    WriteSerial { serial: [u8; SERIAL_NUMBER_LEN] },

    /// Store a key in a slot (slot 0xFE erases every slot)
    WriteKey { slot: u8, item: Option<KeyItem> },

    EnterBootloader,
    Reset,
    SelfTest,
    SendKeySignature,

    /// Put one raw byte on the keyloading interface
    SendByte(u8),
}

impl Command {
    /// Build a WRITE_SN command from text
    ///
    /// The text is upper-cased and zero-padded. Rejected if it is not ASCII
    /// or longer than six characters.
    pub fn write_serial(serial: &str) -> Result<Self> {
        if !serial.is_ascii() {
            return Err(KfdError::Validation(format!(
                "Serial number {:?} must be ASCII",
                serial
            )));
        }
        if serial.len() > SERIAL_NUMBER_LEN {
            return Err(KfdError::Validation(format!(
                "Serial number {:?} is {} characters; maximum is {}",
                serial,
                serial.len(),
                SERIAL_NUMBER_LEN
            )));
        }

        let mut bytes = [0u8; SERIAL_NUMBER_LEN];
        for (slot, ch) in bytes.iter_mut().zip(serial.bytes()) {
            *slot = ch.to_ascii_uppercase();
        }
        Ok(Command::WriteSerial { serial: bytes })
    }

    /// Get the opcode
    pub fn opcode(&self) -> Opcode {
        match self {
            Command::Read(_) | Command::ReadKeyInfo { .. } => Opcode::ReadRequest,
            Command::WriteModel { .. } | Command::WriteSerial { .. } | Command::WriteKey { .. } => {
                Opcode::WriteRequest
            }
            Command::EnterBootloader => Opcode::EnterBootloader,
            Command::Reset => Opcode::Reset,
            Command::SelfTest => Opcode::SelfTest,
            Command::SendKeySignature => Opcode::SendKeySig,
            Command::SendByte(_) => Opcode::SendByte,
        }
    }

    /// Encode to the frame payload
    pub fn encode(&self) -> Vec<u8> {
        let mut out = vec![self.opcode() as u8];

        match self {
            Command::Read(field) => out.push(field.sub_opcode()),
            Command::ReadKeyInfo { slot } => out.extend_from_slice(&[read_op::KEY_INFO, *slot]),
            Command::WriteModel {
                model,
                hw_rev_major,
                hw_rev_minor,
            } => out.extend_from_slice(&[write_op::MODEL, *model, *hw_rev_major, *hw_rev_minor]),
            Command::WriteSerial { serial } => {
                out.push(write_op::SN);
                out.extend_from_slice(serial);
            }
            Command::WriteKey { slot, item } => {
                out.extend_from_slice(&[write_op::KEY, *slot]);
                if let Some(item) = item {
                    // Reserved flags byte replaces the record's own flag byte
                    let record = item.to_bytes();
                    out.push(0x00);
                    out.extend_from_slice(&record[1..]);
                }
            }
            Command::SendKeySignature => out.push(0x00),
            Command::SendByte(byte) => out.extend_from_slice(&[0x00, *byte]),
            Command::EnterBootloader | Command::Reset | Command::SelfTest => {}
        }

        out
    }
}
