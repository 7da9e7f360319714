//! Protocol Module
//!
//! Half-duplex command/reply protocol spoken by KFD-family adapters. Every
//! payload travels inside one frame (see [`crate::frame`]).
//!
//! ### Command Format
//! ```text
//! ┌──────────┬──────────────┬─────────────────────────────┐
//! │Opcode (1)│ Sub-op (0/1) │      Arguments              │
//! └──────────┴──────────────┴─────────────────────────────┘
//! ```
//!
//! ### Commands
//! - 0x11: READ_REQUEST      - sub-op selects the field
//! - 0x12: WRITE_REQUEST     - sub-op + fixed-width arguments
//! - 0x13: ENTER_BOOTLOADER  - no reply
//! - 0x14: RESET             - no reply
//! - 0x15: SELF_TEST
//! - 0x16: SEND_KEY_SIG
//! - 0x17: SEND_BYTE
//!
//! ### Reply Format
//! ```text
//! ┌──────────┬─────────────────────────────────────────────┐
//! │Opcode (1)│ Body (sub-op / result / error code + data)  │
//! └──────────┴─────────────────────────────────────────────┘
//! ```
//!
//! ### Reply Opcodes
//! - 0x20: ERROR (body[0] = device error code)
//! - 0x21..0x27: one reply per command, command opcode + 0x10

mod client;
mod command;
mod info;
mod reply;

pub use client::{CommandProtocol, ExchangeState, ZEROIZE_ALL_SLOT};
pub use command::{read_op, write_op, Command, Opcode, SERIAL_NUMBER_LEN};
pub use info::{HardwareRevision, InfoField, SerialNumber, Uid, Version};
pub use reply::{DeviceErrorCode, Reply, ReplyOpcode};
pub use self_test::SelfTestResult;
