//! Device Module
//!
//! The top-level handle for one attached keyloader.
//!
//! ## Responsibilities
//! - Open the transport and identify the adapter on construction
//! - Hold or release the port afterwards, depending on family
//! - Expose every operation callers need, delegating to CommandProtocol

use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;

use crate::config::Config;
use crate::error::Result;
use crate::family::DeviceFamily;
use crate::key::{InstalledKey, KeyItem};
use crate::protocol::{
    CommandProtocol, ExchangeState, HardwareRevision, SelfTestResult, SerialNumber, Uid, Version,
};
use crate::transport::{ByteStream, SerialStream, TransportSession};

/// A device handle shared between threads
///
/// The core never locks; this is the caller-side serialisation.
pub type SharedDevice<S> = Arc<Mutex<Device<S>>>;

/// Identification read once when the device is opened
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceInfo {
    /// Adapter protocol version
    pub adapter_version: Version,

    /// Firmware version
    pub firmware_version: Version,

    /// Unique ID
    pub uid: Uid,

    /// Model number
    pub model: u8,

    /// Hardware revision
    pub hardware_revision: HardwareRevision,

    /// Serial number
    pub serial_number: SerialNumber,
}

impl DeviceInfo {
    /// Issue the six identification reads in their fixed order
    fn read<S: ByteStream>(protocol: &mut CommandProtocol<S>) -> Result<Self> {
        Ok(Self {
            adapter_version: protocol.read_adapter_version()?,
            firmware_version: protocol.read_firmware_version()?,
            uid: protocol.read_uid()?,
            model: protocol.read_model()?,
            hardware_revision: protocol.read_hardware_revision()?,
            serial_number: protocol.read_serial_number()?,
        })
    }
}

/// One attached keyloader
///
/// ## Concurrency
/// Every operation takes `&mut self`: one command is in flight at a time
/// and replies are consumed in send order. Use [`Device::into_shared`] to
/// share a device between threads.
pub struct Device<S: ByteStream> {
    /// Protocol engine (owns the transport session)
    protocol: CommandProtocol<S>,

    /// Identification captured at open
    info: DeviceInfo,
}

impl Device<SerialStream> {
    /// Open the serial port named in `config` and identify the adapter
    pub fn connect(config: &Config) -> Result<Self> {
        config.validate()?;
        tracing::info!("Connecting to {} on {}", config.family, config.port);
        Self::open(SerialStream::from_config(config), config)
    }
}

impl<S: ByteStream> Device<S> {
    /// Identify the adapter behind `stream`
    ///
    /// On startup:
    /// 1. Open the transport session
    /// 2. Read adapter version, firmware version, UID, model, hardware
    ///    revision and serial number, in that order
    /// 3. Release the session unless the family holds it
    pub fn open(stream: S, config: &Config) -> Result<Self> {
        config.validate()?;

        let family = config.family;
        let table = family.table();

        let session = TransportSession::new(stream, table.frame);
        let mut protocol = CommandProtocol::new(session, family, config.read_timeout());

        protocol.session_mut().open()?;
        let info = DeviceInfo::read(&mut protocol)?;

        if !table.holds_session {
            protocol.session_mut().close()?;
        }

        tracing::info!(
            "{} identified: adapter {}, firmware {}, model {}, hw rev {}, serial {}, uid {}",
            family,
            info.adapter_version,
            info.firmware_version,
            info.model,
            info.hardware_revision,
            info.serial_number,
            info.uid
        );

        Ok(Self { protocol, info })
    }

    /// Wrap in `Arc<Mutex<_>>` for use from several threads
    pub fn into_shared(self) -> SharedDevice<S> {
        Arc::new(Mutex::new(self))
    }

    // =========================================================================
    // Metadata
    // =========================================================================

    /// Identification captured at open
    pub fn device_info(&self) -> &DeviceInfo {
        &self.info
    }

    pub fn family(&self) -> DeviceFamily {
        self.protocol.family()
    }

    /// State of the most recent command/reply exchange
    pub fn exchange_state(&self) -> ExchangeState {
        self.protocol.state()
    }

    /// The transport session (for inspecting the underlying stream)
    pub fn transport(&self) -> &TransportSession<S> {
        self.protocol.session()
    }

    // =========================================================================
    // Operations
    // =========================================================================

    pub fn self_test(&mut self) -> Result<SelfTestResult> {
        self.protocol.self_test()
    }

    pub fn install_key(&mut self, slot: u8, item: &KeyItem) -> Result<()> {
        tracing::debug!("Installing {:?} into slot {}", item, slot);
        self.protocol.install_key(slot, item)
    }

    pub fn zeroize_all(&mut self) -> Result<()> {
        tracing::debug!("Zeroizing all installed keys");
        self.protocol.zeroize_keys()
    }

    /// Query the adapter for its occupied key slots (re-queries every call)
    pub fn list_installed_keys(&mut self) -> Result<Vec<InstalledKey>> {
        self.protocol.list_installed_keys()
    }

    pub fn enter_bootloader(&mut self) -> Result<()> {
        self.protocol.enter_bootloader()
    }

    pub fn reset(&mut self) -> Result<()> {
        self.protocol.reset()
    }

    pub fn write_model(&mut self, model: u8, hw_rev_major: u8, hw_rev_minor: u8) -> Result<()> {
        self.protocol.write_model(model, hw_rev_major, hw_rev_minor)
    }

    pub fn write_serial_number(&mut self, serial: &str) -> Result<()> {
        self.protocol.write_serial_number(serial)
    }

    pub fn send_key_signature(&mut self) -> Result<()> {
        self.protocol.send_key_signature()
    }

    pub fn send_byte(&mut self, byte: u8) -> Result<()> {
        self.protocol.send_byte(byte)
    }

    /// Release the port; later commands reopen it
    pub fn close(&mut self) -> Result<()> {
        self.protocol.session_mut().close()
    }
}
