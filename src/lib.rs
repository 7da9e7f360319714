//! # kfdlink
//!
//! Host-side driver for KFD-family hardware keyloaders with:
//! - Byte-stuffed framing with header resynchronisation
//! - Half-duplex command/reply protocol with strict reply matching
//! - Canonical key record encoding (SLN, KID, flags, key material)
//! - Per-family constants (KFD-AVR, KFDtool) selected once per session
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Device                                │
//! │        (identification, key install/zeroize/list)            │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                  CommandProtocol                             │
//! │        (opcodes, reply validation)  ◀──── key records        │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                  TransportSession                            │
//! │          (open/close, send, receive one frame)               │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌──────────────┐
//!   │ Frame codec │          │  ByteStream  │
//!   │ (stuffing)  │          │ (serial/mock)│
//!   └─────────────┘          └──────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;
pub mod family;

pub mod frame;
pub mod transport;
pub mod key;
pub mod protocol;
pub mod device;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{KfdError, Result};
pub use config::Config;
pub use family::DeviceFamily;
pub use device::{Device, DeviceInfo, SharedDevice};
pub use key::{InstalledKey, KeyItem};
pub use protocol::SelfTestResult;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of kfdlink
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
