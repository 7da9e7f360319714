//! Key Module
//!
//! Key items and their canonical byte layout.
//!
//! ## Record Format
//! ```text
//! ┌──────────┬──────────┬──────────┬─────────────────────────────┐
//! │Flags (1) │ SLN (2)  │ KID (2)  │     Key material (N)        │
//! └──────────┴──────────┴──────────┴─────────────────────────────┘
//! ```
//! - Flags: bit 7 = KEK, bit 5 = erase, other bits zero
//! - SLN/KID: big-endian

mod item;
mod record;

pub use item::{InstalledKey, Kid, KeyItem, KeyItemBuilder, Sln, MAX_ID, MIN_ID};
pub use record::{decode, encode, FLAG_ERASE, FLAG_KEK, RECORD_HEADER_SIZE};
