//! Tests for the key record codec
//!
//! These tests verify:
//! - Record layout (flags, big-endian SLN/KID, key material)
//! - Flag bit placement
//! - Decode validation

use kfdlink::key::{self, Kid, KeyItem, Sln, FLAG_ERASE, FLAG_KEK, RECORD_HEADER_SIZE};

fn item(sln: u32, kid: u32, key: &[u8]) -> KeyItem {
    KeyItem::new(Sln::new(sln).unwrap(), Kid::new(kid).unwrap(), key.to_vec())
}

// =============================================================================
// Encoding Tests
// =============================================================================

#[test]
fn test_encode_kek_record() {
    let record = key::encode(&item(0x1234, 0x5678, &[0x01, 0x02]).with_kek(true));
    assert_eq!(record, vec![0x80, 0x12, 0x34, 0x56, 0x78, 0x01, 0x02]);
}

#[test]
fn test_encode_flags() {
    let base = item(1, 1, &[]);

    assert_eq!(key::encode(&base)[0], 0x00);
    assert_eq!(key::encode(&base.clone().with_erase(true))[0], FLAG_ERASE);
    assert_eq!(
        key::encode(&base.with_kek(true).with_erase(true))[0],
        FLAG_KEK | FLAG_ERASE
    );
}

#[test]
fn test_encode_length() {
    let record = item(7, 8, &[0u8; 32]).to_bytes();
    assert_eq!(record.len(), RECORD_HEADER_SIZE + 32);
}

// =============================================================================
// Decoding Tests
// =============================================================================

#[test]
fn test_decode_kek_record() {
    let decoded = key::decode(&[0x80, 0x12, 0x34, 0x56, 0x78, 0x01, 0x02]).unwrap();

    assert_eq!(decoded.sln().value(), 0x1234);
    assert_eq!(decoded.kid().value(), 0x5678);
    assert!(decoded.is_kek());
    assert!(!decoded.is_erase());
    assert_eq!(decoded.key(), &[0x01, 0x02]);
}

#[test]
fn test_decode_header_only() {
    let decoded = KeyItem::from_bytes(&[0x20, 0x00, 0x01, 0x00, 0x02]).unwrap();
    assert!(decoded.is_erase());
    assert!(decoded.key().is_empty());
}

#[test]
fn test_decode_ignores_reserved_flag_bits() {
    let decoded = key::decode(&[0x5F, 0x00, 0x01, 0x00, 0x02]).unwrap();
    assert!(!decoded.is_kek());
    assert!(!decoded.is_erase());
}

#[test]
fn test_decode_too_short() {
    let err = key::decode(&[0x80, 0x12, 0x34, 0x56]).unwrap_err();
    assert!(err.is_validation());
    assert!(err.to_string().contains("too short"));
}

#[test]
fn test_decode_rejects_reserved_ids() {
    assert!(key::decode(&[0x00, 0x00, 0x00, 0x00, 0x01]).unwrap_err().is_validation());
    assert!(key::decode(&[0x00, 0x00, 0x01, 0xFF, 0xFF]).unwrap_err().is_validation());
}

#[test]
fn test_record_survives_bytes_roundtrip() {
    let original = item(0xFFFE, 1, &[9, 8, 7, 6]).with_kek(true).with_erase(true);
    let restored = KeyItem::from_bytes(&original.to_bytes()).unwrap();
    assert_eq!(restored, original);
}
