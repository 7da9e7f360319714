//! Configuration for kfdlink
//!
//! Centralized configuration with sensible defaults.

use std::time::Duration;

use crate::error::{KfdError, Result};
use crate::family::DeviceFamily;

/// Default serial baud rate for every KFD family
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Default reply deadline (milliseconds)
pub const DEFAULT_READ_TIMEOUT_MS: u64 = 2000;

/// Main configuration for a keyloader connection
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Device Configuration
    // -------------------------------------------------------------------------
    /// Serial device path (e.g. `/dev/ttyUSB0`, `COM3`)
    pub port: String,

    /// Adapter family; selects framing bytes and supported operations
    pub family: DeviceFamily,

    // -------------------------------------------------------------------------
    // Serial Line Configuration
    // -------------------------------------------------------------------------
    /// Line speed in baud
    pub baud_rate: u32,

    /// Hold the handshake lines so opening the port does not reset the board
    pub suppress_reset_on_connect: bool,

    /// Deadline for one reply frame (milliseconds)
    pub read_timeout_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self::with_family(DeviceFamily::default())
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Create a builder seeded with the defaults of `family`
    pub fn for_family(family: DeviceFamily) -> ConfigBuilder {
        ConfigBuilder {
            config: Self::with_family(family),
        }
    }

    fn with_family(family: DeviceFamily) -> Self {
        Self {
            port: default_port().to_string(),
            family,
            baud_rate: DEFAULT_BAUD_RATE,
            suppress_reset_on_connect: family.table().suppress_reset_on_connect,
            read_timeout_ms: DEFAULT_READ_TIMEOUT_MS,
        }
    }

    /// Reply deadline as a Duration
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    /// Reject settings no serial line can honour
    pub fn validate(&self) -> Result<()> {
        if self.baud_rate == 0 {
            return Err(KfdError::Config("baud rate must be non-zero".to_string()));
        }
        if self.read_timeout_ms == 0 {
            return Err(KfdError::Config("read timeout must be non-zero".to_string()));
        }
        Ok(())
    }
}

fn default_port() -> &'static str {
    if cfg!(windows) {
        "COM3"
    } else {
        "/dev/ttyUSB0"
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the serial device path
    pub fn port(mut self, port: impl Into<String>) -> Self {
        self.config.port = port.into();
        self
    }

    /// Set the device family (keeps any explicitly set line options)
    pub fn family(mut self, family: DeviceFamily) -> Self {
        self.config.family = family;
        self
    }

    /// Set the baud rate
    pub fn baud_rate(mut self, baud: u32) -> Self {
        self.config.baud_rate = baud;
        self
    }

    /// Hold or release the handshake lines on open
    pub fn suppress_reset_on_connect(mut self, suppress: bool) -> Self {
        self.config.suppress_reset_on_connect = suppress;
        self
    }

    /// Set the read timeout (in milliseconds)
    pub fn read_timeout_ms(mut self, ms: u64) -> Self {
        self.config.read_timeout_ms = ms;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
