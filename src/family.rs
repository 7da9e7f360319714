//! Device families
//!
//! Every KFD-family adapter speaks the same opcodes but differs in framing
//! bytes and in which operations it implements. All of those differences
//! live in one [`ProtocolTable`] per family, selected once when a session
//! starts.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::KfdError;
use crate::frame::FrameConstants;

/// Supported adapter families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DeviceFamily {
    /// Arduino-based KFD-AVR
    KfdAvr,

    /// MSP430-based KFDtool
    KfdTool,
}

/// Per-family protocol constants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProtocolTable {
    /// Delimiter and escape bytes on the wire
    pub frame: FrameConstants,

    /// Number of key slots, or `None` if the family has no key storage
    pub max_installed_keys: Option<u8>,

    /// Whether ENTER_BOOTLOADER is implemented
    pub supports_bootloader: bool,

    /// Keep the port open after identification instead of releasing it
    pub holds_session: bool,

    /// Default for `Config::suppress_reset_on_connect`
    pub suppress_reset_on_connect: bool,
}

const KFD_AVR_TABLE: ProtocolTable = ProtocolTable {
    frame: FrameConstants {
        header: 0x61,
        header_placeholder: 0x62,
        footer: 0x63,
        footer_placeholder: 0x64,
        escape: 0x70,
        escape_placeholder: 0x71,
    },
    max_installed_keys: Some(15),
    supports_bootloader: false,
    holds_session: false,
    suppress_reset_on_connect: true,
};

// KFDtool uses one byte as both start and end of message.
const KFD_TOOL_TABLE: ProtocolTable = ProtocolTable {
    frame: FrameConstants {
        header: 0x61,
        header_placeholder: 0x62,
        footer: 0x61,
        footer_placeholder: 0x62,
        escape: 0x63,
        escape_placeholder: 0x64,
    },
    max_installed_keys: None,
    supports_bootloader: true,
    holds_session: true,
    suppress_reset_on_connect: false,
};

impl DeviceFamily {
    /// Protocol constants for this family
    pub fn table(self) -> &'static ProtocolTable {
        match self {
            DeviceFamily::KfdAvr => &KFD_AVR_TABLE,
            DeviceFamily::KfdTool => &KFD_TOOL_TABLE,
        }
    }

    /// Shorthand for `table().frame`
    pub fn frame(self) -> FrameConstants {
        self.table().frame
    }
}

impl Default for DeviceFamily {
    fn default() -> Self {
        DeviceFamily::KfdAvr
    }
}

impl fmt::Display for DeviceFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceFamily::KfdAvr => write!(f, "KFD-AVR"),
            DeviceFamily::KfdTool => write!(f, "KFDtool"),
        }
    }
}

impl FromStr for DeviceFamily {
    type Err = KfdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "avr" | "kfd-avr" | "kfdavr" => Ok(DeviceFamily::KfdAvr),
            "tool" | "kfdtool" | "kfd-tool" => Ok(DeviceFamily::KfdTool),
            other => Err(KfdError::Config(format!("Unknown device family: {}", other))),
        }
    }
}
