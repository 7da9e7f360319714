//! Identification fields
//!
//! Typed values read with READ_REQUEST and their reply decoding.

use std::fmt;

use serde::{Serialize, Serializer};

use crate::error::{KfdError, Result};
use super::command::read_op;

/// Identification fields, in the order a device session reads them
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InfoField {
    AdapterVersion,
    FirmwareVersion,
    Uid,
    Model,
    HardwareRevision,
    SerialNumber,
}

impl InfoField {
    /// All fields in read order
    pub const ALL: [InfoField; 6] = [
        InfoField::AdapterVersion,
        InfoField::FirmwareVersion,
        InfoField::Uid,
        InfoField::Model,
        InfoField::HardwareRevision,
        InfoField::SerialNumber,
    ];

    /// READ_REQUEST sub-opcode for this field
    pub fn sub_opcode(self) -> u8 {
        match self {
            InfoField::AdapterVersion => read_op::ADAPTER_VER,
            InfoField::FirmwareVersion => read_op::FW_VER,
            InfoField::Uid => read_op::UID,
            InfoField::Model => read_op::MODEL,
            InfoField::HardwareRevision => read_op::HW_REV,
            InfoField::SerialNumber => read_op::SN,
        }
    }

    /// Field for a READ_REPLY sub-opcode, if it is an identification field
    pub fn from_sub_opcode(sub: u8) -> Option<Self> {
        InfoField::ALL.into_iter().find(|f| f.sub_opcode() == sub)
    }
}

/// Ensure a reply payload carries at least `needed` bytes
fn require(field: InfoField, payload: &[u8], needed: usize) -> Result<()> {
    if payload.len() < needed {
        return Err(KfdError::Protocol(format!(
            "{:?} reply too short: expected {} bytes, got {}",
            field,
            needed,
            payload.len()
        )));
    }
    Ok(())
}

/// Three-part version (adapter protocol, firmware)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Version {
    pub major: u8,
    pub minor: u8,
    pub patch: u8,
}

impl Version {
    pub(crate) fn from_payload(field: InfoField, payload: &[u8]) -> Result<Self> {
        require(field, payload, 3)?;
        Ok(Self {
            major: payload[0],
            minor: payload[1],
            patch: payload[2],
        })
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Two-part hardware revision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HardwareRevision {
    pub major: u8,
    pub minor: u8,
}

impl HardwareRevision {
    pub(crate) fn from_payload(payload: &[u8]) -> Result<Self> {
        require(InfoField::HardwareRevision, payload, 2)?;
        Ok(Self {
            major: payload[0],
            minor: payload[1],
        })
    }
}

impl fmt::Display for HardwareRevision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Adapter unique ID
///
/// Rendered as the decimal value of every byte, concatenated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Uid(Vec<u8>);

impl Uid {
    pub(crate) fn from_payload(payload: &[u8]) -> Self {
        Self(payload.to_vec())
    }

    pub fn bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{}", byte)?;
        }
        Ok(())
    }
}

/// Adapter serial number
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SerialNumber {
    /// Length byte was zero
    NotSet,

    /// Raw serial bytes
    Set(Vec<u8>),
}

impl SerialNumber {
    /// Text shown for an unprogrammed serial number
    pub const NOT_SET: &'static str = "NOT SET";

    /// Decode `len (1) + bytes (len)`
    pub(crate) fn from_payload(payload: &[u8]) -> Result<Self> {
        require(InfoField::SerialNumber, payload, 1)?;
        let len = usize::from(payload[0]);
        if len == 0 {
            return Ok(SerialNumber::NotSet);
        }
        require(InfoField::SerialNumber, payload, 1 + len)?;
        Ok(SerialNumber::Set(payload[1..=len].to_vec()))
    }

    pub fn is_set(&self) -> bool {
        matches!(self, SerialNumber::Set(_))
    }

    /// Raw bytes (empty when not set)
    pub fn bytes(&self) -> &[u8] {
        match self {
            SerialNumber::NotSet => &[],
            SerialNumber::Set(bytes) => bytes,
        }
    }

    /// One two-digit hex rendering per byte
    pub fn parts(&self) -> Vec<String> {
        self.bytes()
            .iter()
            .map(|b| hex::encode_upper([*b]))
            .collect()
    }
}

impl fmt::Display for SerialNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SerialNumber::NotSet => f.write_str(Self::NOT_SET),
            SerialNumber::Set(bytes) => f.write_str(&hex::encode_upper(bytes)),
        }
    }
}

// Identification values serialize as their display text
macro_rules! serialize_as_display {
    ($($ty:ty),+) => {
        $(
            impl Serialize for $ty {
                fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
                    serializer.collect_str(self)
                }
            }
        )+
    };
}

serialize_as_display!(Version, HardwareRevision, Uid, SerialNumber);
