//! Serial port stream
//!
//! ByteStream over a local serial device, 8N1 without flow control.

use std::io::{self, Read, Write};
use std::time::Duration;

use serialport::{ClearBuffer, DataBits, FlowControl, Parity, SerialPort, StopBits};

use crate::config::Config;
use crate::error::{KfdError, Result};
use super::ByteStream;

/// Serial link to a physical adapter
pub struct SerialStream {
    /// Device path
    path: String,

    /// Line speed
    baud_rate: u32,

    /// Hold DTR/RTS steady so the board's auto-reset circuit does not fire
    suppress_reset_on_connect: bool,

    /// Open handle, if any
    port: Option<Box<dyn SerialPort>>,
}

impl SerialStream {
    /// Describe a port; nothing is opened until `open`
    pub fn new(path: impl Into<String>, baud_rate: u32, suppress_reset_on_connect: bool) -> Self {
        Self {
            path: path.into(),
            baud_rate,
            suppress_reset_on_connect,
            port: None,
        }
    }

    /// Build from the line settings in a Config
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.port.clone(),
            config.baud_rate,
            config.suppress_reset_on_connect,
        )
    }

    /// Device path this stream talks to
    pub fn path(&self) -> &str {
        &self.path
    }

    fn port_mut(&mut self) -> Result<&mut Box<dyn SerialPort>> {
        self.port.as_mut().ok_or(KfdError::TransportClosed)
    }
}

impl ByteStream for SerialStream {
    fn open(&mut self) -> Result<()> {
        if self.port.is_some() {
            return Ok(());
        }

        tracing::debug!("Opening serial port {} at {} baud", self.path, self.baud_rate);

        let mut builder = serialport::new(&self.path, self.baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(Duration::from_millis(100));

        // DTR is requested as part of the open itself so no falling edge
        // follows it. Linux still raises DTR while the device node opens
        // (HUPCL), so a board that resets on that rising edge can reboot
        // once per open regardless.
        if self.suppress_reset_on_connect {
            builder = builder.dtr_on_open(true);
        }

        let mut port = builder.open().map_err(io::Error::from)?;

        if self.suppress_reset_on_connect {
            port.write_request_to_send(false).map_err(io::Error::from)?;
        }

        // Drop anything the adapter sent before we were listening
        port.clear(ClearBuffer::All).map_err(io::Error::from)?;

        self.port = Some(port);
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if self.port.take().is_some() {
            tracing::debug!("Closed serial port {}", self.path);
        }
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.port.is_some()
    }

    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        let port = self.port_mut()?;
        port.write_all(bytes)?;
        port.flush()?;
        Ok(())
    }

    fn clear_input(&mut self) -> Result<()> {
        let port = self.port_mut()?;
        port.clear(ClearBuffer::Input).map_err(io::Error::from)?;
        Ok(())
    }

    fn read_byte(&mut self, timeout: Duration) -> Result<Option<u8>> {
        let port = self.port_mut()?;
        if timeout.is_zero() {
            return Ok(None);
        }
        port.set_timeout(timeout).map_err(io::Error::from)?;

        let mut buf = [0u8; 1];
        match port.read(&mut buf) {
            Ok(0) => Ok(None),
            Ok(_) => Ok(Some(buf[0])),
            Err(ref e)
                if e.kind() == io::ErrorKind::TimedOut || e.kind() == io::ErrorKind::WouldBlock =>
            {
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }
}
