//! Key record codec
//!
//! Encoding and decoding of the canonical key record layout.

use bytes::{Buf, BufMut, BytesMut};

use crate::error::{KfdError, Result};
use super::{Kid, KeyItem, Sln};

/// Flags (1) + SLN (2) + KID (2)
pub const RECORD_HEADER_SIZE: usize = 5;

/// Flag bit 7: key-encryption key
pub const FLAG_KEK: u8 = 0x80;

/// Flag bit 5: erase
pub const FLAG_ERASE: u8 = 0x20;

/// Encode a key item
///
/// Format: flags (1) + sln (2, BE) + kid (2, BE) + key material
pub fn encode(item: &KeyItem) -> Vec<u8> {
    let mut flags = 0u8;
    if item.is_kek() {
        flags |= FLAG_KEK;
    }
    if item.is_erase() {
        flags |= FLAG_ERASE;
    }

    let mut buf = BytesMut::with_capacity(RECORD_HEADER_SIZE + item.key().len());
    buf.put_u8(flags);
    buf.put_u16(item.sln().value());
    buf.put_u16(item.kid().value());
    buf.put_slice(item.key());
    buf.to_vec()
}

/// Decode a key item
///
/// Reserved flag bits are ignored. SLN and KID go through the same
/// validation as any other construction.
pub fn decode(bytes: &[u8]) -> Result<KeyItem> {
    if bytes.len() < RECORD_HEADER_SIZE {
        return Err(KfdError::Validation(format!(
            "Key record too short: expected at least {} bytes, got {}",
            RECORD_HEADER_SIZE,
            bytes.len()
        )));
    }

    let mut buf = bytes;
    let flags = buf.get_u8();
    let sln = Sln::new(u32::from(buf.get_u16()))?;
    let kid = Kid::new(u32::from(buf.get_u16()))?;

    Ok(KeyItem::new(sln, kid, buf.to_vec())
        .with_kek(flags & FLAG_KEK != 0)
        .with_erase(flags & FLAG_ERASE != 0))
}
