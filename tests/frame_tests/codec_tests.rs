//! Tests for frame encoding and unescaping
//!
//! These tests verify:
//! - Byte stuffing of header/footer/escape values
//! - Single-pass unescaping and its error cases
//! - Both families' constant sets, including KFDtool's shared delimiter

use kfdlink::frame::{encode, unescape, FrameDecoder};
use kfdlink::{DeviceFamily, KfdError};

/// Run a whole wire buffer through a fresh decoder
fn decode_all(family: DeviceFamily, wire: &[u8]) -> Vec<u8> {
    let mut decoder = FrameDecoder::new(family.frame());
    for &byte in wire {
        if let Some(frame) = decoder.push(byte).unwrap() {
            return frame;
        }
    }
    panic!("no complete frame in {:02x?}", wire);
}

// =============================================================================
// Encoding Tests
// =============================================================================

#[test]
fn test_encode_escapes_header() {
    let constants = DeviceFamily::KfdAvr.frame();
    let wire = encode(&constants, &[0x01, 0x61, 0x02]);
    assert_eq!(wire, vec![0x61, 0x01, 0x70, 0x62, 0x02, 0x63]);
}

#[test]
fn test_encode_escapes_footer_and_escape() {
    let constants = DeviceFamily::KfdAvr.frame();
    let wire = encode(&constants, &[0x63, 0x70]);
    assert_eq!(wire, vec![0x61, 0x70, 0x64, 0x70, 0x71, 0x63]);
}

#[test]
fn test_encode_empty_payload() {
    let constants = DeviceFamily::KfdAvr.frame();
    assert_eq!(encode(&constants, &[]), vec![0x61, 0x63]);
}

#[test]
fn test_encode_plain_bytes_pass_through() {
    let constants = DeviceFamily::KfdAvr.frame();
    let wire = encode(&constants, &[0x11, 0x01]);
    assert_eq!(wire, vec![0x61, 0x11, 0x01, 0x63]);
}

#[test]
fn test_encode_kfdtool_shared_delimiter() {
    let constants = DeviceFamily::KfdTool.frame();
    let wire = encode(&constants, &[0x61, 0x63, 0x15]);
    assert_eq!(wire, vec![0x61, 0x63, 0x62, 0x63, 0x64, 0x15, 0x61]);
}

#[test]
fn test_encoded_body_has_no_bare_delimiters() {
    let constants = DeviceFamily::KfdAvr.frame();
    let payload: Vec<u8> = (0..=255).collect();
    let wire = encode(&constants, &payload);

    let body = &wire[1..wire.len() - 1];
    assert!(!body.contains(&constants.header));
    assert!(!body.contains(&constants.footer));
}

// =============================================================================
// Unescape Tests
// =============================================================================

#[test]
fn test_unescape_restores_reserved_bytes() {
    let constants = DeviceFamily::KfdAvr.frame();
    let raw = [0x70, 0x62, 0x70, 0x64, 0x70, 0x71, 0x05];
    assert_eq!(unescape(&constants, &raw).unwrap(), vec![0x61, 0x63, 0x70, 0x05]);
}

#[test]
fn test_unescape_consecutive_escapes() {
    // Index drift after an in-place delete would mangle back-to-back escapes
    let constants = DeviceFamily::KfdAvr.frame();
    let raw = [0x70, 0x71, 0x70, 0x71, 0x70, 0x71];
    assert_eq!(unescape(&constants, &raw).unwrap(), vec![0x70, 0x70, 0x70]);
}

#[test]
fn test_unescape_invalid_placeholder() {
    let constants = DeviceFamily::KfdAvr.frame();
    let result = unescape(&constants, &[0x01, 0x70, 0x99]);

    match result {
        Err(KfdError::Framing(msg)) => assert!(msg.contains("0x99")),
        other => panic!("Expected framing error, got {:?}", other),
    }
}

#[test]
fn test_unescape_dangling_escape() {
    let constants = DeviceFamily::KfdAvr.frame();
    let result = unescape(&constants, &[0x01, 0x70]);
    assert!(matches!(result, Err(KfdError::Framing(_))));
}

#[test]
fn test_unescape_leaves_input_untouched() {
    let constants = DeviceFamily::KfdAvr.frame();
    let raw = vec![0x70, 0x62, 0x03];
    let before = raw.clone();
    let _ = unescape(&constants, &raw).unwrap();
    assert_eq!(raw, before);
}

// =============================================================================
// Round-Trip Tests
// =============================================================================

#[test]
fn test_roundtrip_every_byte_value_avr() {
    let family = DeviceFamily::KfdAvr;
    let payload: Vec<u8> = (0..=255).collect();
    let wire = encode(&family.frame(), &payload);
    assert_eq!(decode_all(family, &wire), payload);
}

#[test]
fn test_roundtrip_every_byte_value_kfdtool() {
    let family = DeviceFamily::KfdTool;
    let payload: Vec<u8> = (0..=255).rev().collect();
    let wire = encode(&family.frame(), &payload);
    assert_eq!(decode_all(family, &wire), payload);
}

#[test]
fn test_roundtrip_only_reserved_bytes() {
    for family in [DeviceFamily::KfdAvr, DeviceFamily::KfdTool] {
        let c = family.frame();
        let payload = vec![c.header, c.footer, c.escape, c.escape, c.header];
        let wire = encode(&c, &payload);
        assert_eq!(decode_all(family, &wire), payload, "family {}", family);
    }
}
