//! Command Protocol
//!
//! Issues commands over a TransportSession and interprets the replies.
//!
//! ## Exchange Model
//! Strictly half-duplex: one command, then block until its reply frame or
//! the deadline. No pipelining, no retries.
//!
//! ```text
//! Idle ──send──▶ Sent ──frame──▶ ReplyReceived
//!                  │
//!                  └──deadline──▶ TimedOut
//! ```
//!
//! `Sent` only lasts while the call is blocked in `receive`. Every public
//! operation returns with the protocol in `Idle`, `ReplyReceived` or
//! `TimedOut`, so callers never observe it.

use std::time::Duration;

use crate::error::{KfdError, Result};
use crate::family::DeviceFamily;
use crate::key::{InstalledKey, KeyItem};
use crate::transport::{ByteStream, TransportSession};
use super::command::{read_op, Command};
use super::info::{HardwareRevision, InfoField, SerialNumber, Uid, Version};
use super::reply::{Reply, ReplyOpcode};
use super::self_test::SelfTestResult;

/// WRITE_KEY slot value meaning "erase every installed key"
pub const ZEROIZE_ALL_SLOT: u8 = 0xFE;

/// Where the most recent exchange ended up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeState {
    /// Nothing outstanding
    Idle,

    /// Command written, reply not yet read
    ///
    /// Transient: held only inside a blocking exchange.
    Sent,

    /// Last command got its reply frame
    ReplyReceived,

    /// Last command got no reply before the deadline
    TimedOut,
}

/// Command/reply engine bound to one transport session
pub struct CommandProtocol<S: ByteStream> {
    /// Framed link to the adapter
    session: TransportSession<S>,

    /// Family of the connected adapter
    family: DeviceFamily,

    /// Per-reply deadline
    timeout: Duration,

    /// State of the current/last exchange
    state: ExchangeState,
}

impl<S: ByteStream> CommandProtocol<S> {
    /// Create a protocol engine over `session`
    pub fn new(session: TransportSession<S>, family: DeviceFamily, timeout: Duration) -> Self {
        Self {
            session,
            family,
            timeout,
            state: ExchangeState::Idle,
        }
    }

    pub fn state(&self) -> ExchangeState {
        self.state
    }

    pub fn family(&self) -> DeviceFamily {
        self.family
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn session(&self) -> &TransportSession<S> {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut TransportSession<S> {
        &mut self.session
    }

    // =========================================================================
    // Exchange primitives
    // =========================================================================

    /// Write a command without waiting for anything
    fn send(&mut self, command: &Command) -> Result<()> {
        tracing::debug!("Sending {:?}", command.opcode());
        self.session.send(&command.encode())?;
        // One-way commands leave nothing outstanding
        self.state = match command.opcode().expected_reply() {
            Some(_) => ExchangeState::Sent,
            None => ExchangeState::Idle,
        };
        Ok(())
    }

    /// Write a command and block for its reply frame
    fn exchange(&mut self, command: &Command) -> Result<Reply> {
        self.send(command)?;

        let frame = match self.session.receive(self.timeout) {
            Ok(frame) => frame,
            Err(e) => {
                self.state = if e.is_timeout() {
                    ExchangeState::TimedOut
                } else {
                    ExchangeState::Idle
                };
                return Err(e);
            }
        };
        self.state = ExchangeState::ReplyReceived;

        let reply = Reply::parse(&frame)?;
        if let Some(code) = reply.error_code() {
            tracing::warn!("Device answered {:?} with {}", command.opcode(), code);
        } else {
            tracing::debug!("Reply {:?} ({} body bytes)", reply.opcode, reply.body.len());
        }
        Ok(reply)
    }

    /// Succeed only on WRITE_REPLY; anything else is a failed write
    fn expect_write_reply(reply: &Reply, what: &str) -> Result<()> {
        if reply.opcode == ReplyOpcode::WriteReply {
            return Ok(());
        }
        Err(KfdError::WriteFailed(format!(
            "{}: device answered {}",
            what,
            reply.describe()
        )))
    }

    /// Slot count for key operations, or Unsupported
    fn key_slots(&self, operation: &str) -> Result<u8> {
        self.family.table().max_installed_keys.ok_or_else(|| {
            KfdError::Unsupported(format!("{} is not available on {}", operation, self.family))
        })
    }

    // =========================================================================
    // Identification
    // =========================================================================

    /// READ_REQUEST one field and return the payload after the sub-opcode
    fn read_field(&mut self, field: InfoField) -> Result<Vec<u8>> {
        let reply = self.exchange(&Command::Read(field))?;
        reply.expect(ReplyOpcode::ReadReply)?;

        let sub = reply
            .sub_opcode()
            .ok_or_else(|| KfdError::Protocol("READ_REPLY without sub-opcode".to_string()))?;
        match InfoField::from_sub_opcode(sub) {
            Some(got) if got == field => Ok(reply.payload().to_vec()),
            Some(got) => Err(KfdError::Protocol(format!(
                "Asked for {:?} but device returned {:?}",
                field, got
            ))),
            None => Err(KfdError::Protocol(format!(
                "Unknown data type received: sub-opcode 0x{:02x}",
                sub
            ))),
        }
    }

    pub fn read_adapter_version(&mut self) -> Result<Version> {
        let payload = self.read_field(InfoField::AdapterVersion)?;
        Version::from_payload(InfoField::AdapterVersion, &payload)
    }

    pub fn read_firmware_version(&mut self) -> Result<Version> {
        let payload = self.read_field(InfoField::FirmwareVersion)?;
        Version::from_payload(InfoField::FirmwareVersion, &payload)
    }

    pub fn read_uid(&mut self) -> Result<Uid> {
        let payload = self.read_field(InfoField::Uid)?;
        Ok(Uid::from_payload(&payload))
    }

    pub fn read_model(&mut self) -> Result<u8> {
        let payload = self.read_field(InfoField::Model)?;
        payload.first().copied().ok_or_else(|| {
            KfdError::Protocol("Model reply carries no model byte".to_string())
        })
    }

    pub fn read_hardware_revision(&mut self) -> Result<HardwareRevision> {
        let payload = self.read_field(InfoField::HardwareRevision)?;
        HardwareRevision::from_payload(&payload)
    }

    pub fn read_serial_number(&mut self) -> Result<SerialNumber> {
        let payload = self.read_field(InfoField::SerialNumber)?;
        SerialNumber::from_payload(&payload)
    }

    // =========================================================================
    // Diagnostics
    // =========================================================================

    /// Run the adapter's line self-test
    pub fn self_test(&mut self) -> Result<SelfTestResult> {
        let reply = self.exchange(&Command::SelfTest)?;
        reply.expect(ReplyOpcode::SelfTestReply)?;

        let index = reply.body.first().copied().ok_or_else(|| {
            KfdError::Protocol("SELF_TEST reply carries no result byte".to_string())
        })?;
        SelfTestResult::try_from(index)
    }

    /// Emit a key signature on the keyloading interface
    pub fn send_key_signature(&mut self) -> Result<()> {
        let reply = self.exchange(&Command::SendKeySignature)?;
        reply.expect(ReplyOpcode::SendKeySigReply)
    }

    /// Emit one raw byte on the keyloading interface
    pub fn send_byte(&mut self, byte: u8) -> Result<()> {
        let reply = self.exchange(&Command::SendByte(byte))?;
        reply.expect(ReplyOpcode::SendByteReply)
    }

    // =========================================================================
    // Provisioning
    // =========================================================================

    /// Program model number and hardware revision
    pub fn write_model(&mut self, model: u8, hw_rev_major: u8, hw_rev_minor: u8) -> Result<()> {
        let reply = self.exchange(&Command::WriteModel {
            model,
            hw_rev_major,
            hw_rev_minor,
        })?;
        Self::expect_write_reply(&reply, "write model")
    }

    /// Program the serial number (validated before anything is sent)
    pub fn write_serial_number(&mut self, serial: &str) -> Result<()> {
        let command = Command::write_serial(serial)?;
        let reply = self.exchange(&command)?;
        Self::expect_write_reply(&reply, "write serial number")
    }

    // =========================================================================
    // Key storage
    // =========================================================================

    /// Store `item` in `slot`
    pub fn install_key(&mut self, slot: u8, item: &KeyItem) -> Result<()> {
        let slots = self.key_slots("Key install")?;
        if slot >= slots {
            return Err(KfdError::Validation(format!(
                "Slot {} out of range; device supports slots 0..{}",
                slot, slots
            )));
        }

        let reply = self.exchange(&Command::WriteKey {
            slot,
            item: Some(item.clone()),
        })?;
        Self::expect_write_reply(&reply, "install key")
    }

    /// Erase every installed key
    pub fn zeroize_keys(&mut self) -> Result<()> {
        self.key_slots("Zeroize")?;
        let reply = self.exchange(&Command::WriteKey {
            slot: ZEROIZE_ALL_SLOT,
            item: None,
        })?;
        Self::expect_write_reply(&reply, "zeroize")
    }

    /// Query every slot and return the occupied ones in slot order
    ///
    /// An ERROR reply means the slot is empty.
    pub fn list_installed_keys(&mut self) -> Result<Vec<InstalledKey>> {
        let slots = self.key_slots("Key enumeration")?;
        let mut keys = Vec::new();

        for slot in 0..slots {
            let reply = self.exchange(&Command::ReadKeyInfo { slot })?;

            match reply.opcode {
                ReplyOpcode::Error => {
                    tracing::debug!("Slot {} empty", slot);
                }
                ReplyOpcode::ReadReply if reply.sub_opcode() == Some(read_op::KEY_INFO) => {
                    // slot (1) + flags (1) + ckr (2) + kid (2)
                    let payload = reply.payload();
                    if payload.len() < 6 {
                        return Err(KfdError::Protocol(format!(
                            "Key info reply for slot {} too short: expected 6 bytes, got {}",
                            slot,
                            payload.len()
                        )));
                    }
                    keys.push(InstalledKey {
                        slot,
                        ckr: u16::from_be_bytes([payload[2], payload[3]]),
                        kid: u16::from_be_bytes([payload[4], payload[5]]),
                    });
                }
                ReplyOpcode::ReadReply => {
                    return Err(KfdError::Protocol(format!(
                        "KFD replied with unknown read data: sub-opcode {:?}",
                        reply.sub_opcode()
                    )));
                }
                _ => {
                    return Err(KfdError::Protocol(format!(
                        "KFD replied to key info read with {}",
                        reply.describe()
                    )));
                }
            }
        }

        Ok(keys)
    }

    // =========================================================================
    // One-way commands
    // =========================================================================

    /// Switch the adapter into its firmware-update bootloader
    pub fn enter_bootloader(&mut self) -> Result<()> {
        if !self.family.table().supports_bootloader {
            return Err(KfdError::Unsupported(format!(
                "Bootloader mode does not exist on {}",
                self.family
            )));
        }
        self.send(&Command::EnterBootloader)
    }

    /// Reboot the adapter
    pub fn reset(&mut self) -> Result<()> {
        self.send(&Command::Reset)
    }
}
