//! Tests for the Device facade
//!
//! These tests verify:
//! - Identification sequence on open
//! - Session release (KFD-AVR) vs. hold (KFDtool) after open
//! - Operations delegate through to the wire
//! - Shared access from several threads

use std::thread;

use kfdlink::frame::{encode, unescape};
use kfdlink::key::{Kid, Sln};
use kfdlink::protocol::{ExchangeState, SerialNumber};
use kfdlink::transport::ScriptedStream;
use kfdlink::{Config, Device, DeviceFamily, InstalledKey, KeyItem, KfdError, SelfTestResult};

/// Replies to the six identification reads
fn identification() -> Vec<Vec<u8>> {
    vec![
        vec![0x21, 0x01, 1, 0, 2],
        vec![0x21, 0x02, 1, 4, 0],
        vec![0x21, 0x03, 0x12, 0x34],
        vec![0x21, 0x04, 0x01],
        vec![0x21, 0x05, 2, 0],
        vec![0x21, 0x06, 3, b'A', b'B', b'C'],
    ]
}

/// Stream answering identification and then each of `extra` in turn
fn stream_for(family: DeviceFamily, extra: &[Vec<u8>]) -> ScriptedStream {
    let constants = family.frame();
    let mut stream = ScriptedStream::new();
    for reply in identification().iter().chain(extra) {
        stream.push_reply(encode(&constants, reply));
    }
    stream
}

fn config(family: DeviceFamily) -> Config {
    Config::for_family(family).read_timeout_ms(30).build()
}

fn open(family: DeviceFamily, extra: &[Vec<u8>]) -> Device<ScriptedStream> {
    Device::open(stream_for(family, extra), &config(family)).unwrap()
}

/// Payloads written after identification, unframed
fn commands_after_open(device: &Device<ScriptedStream>) -> Vec<Vec<u8>> {
    let constants = device.family().frame();
    device.transport().stream().writes()[6..]
        .iter()
        .map(|wire| unescape(&constants, &wire[1..wire.len() - 1]).unwrap())
        .collect()
}

// =============================================================================
// Open Tests
// =============================================================================

#[test]
fn test_open_reads_identification() {
    let device = open(DeviceFamily::KfdAvr, &[]);
    let info = device.device_info();

    assert_eq!(info.adapter_version.to_string(), "1.0.2");
    assert_eq!(info.firmware_version.to_string(), "1.4.0");
    assert_eq!(info.uid.to_string(), "1852");
    assert_eq!(info.model, 1);
    assert_eq!(info.hardware_revision.to_string(), "2.0");
    assert_eq!(info.serial_number, SerialNumber::Set(b"ABC".to_vec()));
    assert_eq!(info.serial_number.to_string(), "414243");
}

#[test]
fn test_open_read_order() {
    let device = open(DeviceFamily::KfdAvr, &[]);
    let constants = DeviceFamily::KfdAvr.frame();

    let expected: Vec<Vec<u8>> = (1..=6).map(|sub| encode(&constants, &[0x11, sub])).collect();
    assert_eq!(device.transport().stream().writes(), expected.as_slice());
}

#[test]
fn test_avr_releases_session_after_open() {
    let device = open(DeviceFamily::KfdAvr, &[]);
    let stream = device.transport().stream();

    assert!(!device.transport().is_open());
    assert_eq!(stream.open_count(), 1);
    assert_eq!(stream.close_count(), 1);
}

#[test]
fn test_kfdtool_holds_session_after_open() {
    let device = open(DeviceFamily::KfdTool, &[]);

    assert!(device.transport().is_open());
    assert_eq!(device.transport().stream().close_count(), 0);
}

#[test]
fn test_operation_after_release_reopens() {
    let mut device = open(DeviceFamily::KfdAvr, &[vec![0x25, 0x00]]);

    assert_eq!(device.self_test().unwrap(), SelfTestResult::Pass);
    assert!(device.transport().is_open());
    assert_eq!(device.transport().stream().open_count(), 2);
}

#[test]
fn test_open_fails_on_wrong_reply() {
    let constants = DeviceFamily::KfdAvr.frame();
    let mut stream = ScriptedStream::new();
    stream.push_reply(encode(&constants, &[0x22]));

    let err = Device::open(stream, &config(DeviceFamily::KfdAvr))
        .err()
        .expect("open should fail");
    assert!(err.is_protocol());
}

#[test]
fn test_open_times_out_on_silent_device() {
    let err = Device::open(ScriptedStream::new(), &config(DeviceFamily::KfdAvr))
        .err()
        .expect("open should fail");
    assert!(err.is_timeout());
}

#[test]
fn test_open_rejects_invalid_config() {
    let config = Config::for_family(DeviceFamily::KfdAvr).read_timeout_ms(0).build();
    let err = Device::open(ScriptedStream::new(), &config)
        .err()
        .expect("open should fail");
    assert!(matches!(err, KfdError::Config(_)));
}

// =============================================================================
// Operation Tests
// =============================================================================

#[test]
fn test_install_and_list_keys() {
    let mut listing = vec![vec![0x20, 0x04]; 15];
    listing[0] = vec![0x21, 0x07, 0x00, 0x80, 0x12, 0x34, 0x56, 0x78];

    let mut extra = vec![vec![0x22]];
    extra.extend(listing);
    let mut device = open(DeviceFamily::KfdAvr, &extra);

    let item = KeyItem::new(Sln::new(0x1234).unwrap(), Kid::new(0x5678).unwrap(), vec![0xAA; 32])
        .with_kek(true);
    device.install_key(0, &item).unwrap();

    let keys = device.list_installed_keys().unwrap();
    assert_eq!(
        keys,
        vec![InstalledKey {
            slot: 0,
            ckr: 0x1234,
            kid: 0x5678,
        }]
    );
    assert_eq!(device.exchange_state(), ExchangeState::ReplyReceived);
}

#[test]
fn test_zeroize_all() {
    let mut device = open(DeviceFamily::KfdAvr, &[vec![0x22]]);
    device.zeroize_all().unwrap();
    assert_eq!(commands_after_open(&device), vec![vec![0x12, 0x03, 0xFE]]);
}

#[test]
fn test_provisioning_writes() {
    let mut device = open(DeviceFamily::KfdTool, &[vec![0x22], vec![0x22]]);

    device.write_model(2, 1, 3).unwrap();
    device.write_serial_number("kfd01").unwrap();

    assert_eq!(
        commands_after_open(&device),
        vec![
            vec![0x12, 0x01, 2, 1, 3],
            vec![0x12, 0x02, b'K', b'F', b'D', b'0', b'1', 0x00],
        ]
    );
}

#[test]
fn test_key_signature_and_send_byte() {
    let mut device = open(DeviceFamily::KfdAvr, &[vec![0x26], vec![0x27]]);

    device.send_key_signature().unwrap();
    device.send_byte(0x70).unwrap();

    assert_eq!(
        commands_after_open(&device),
        vec![vec![0x16, 0x00], vec![0x17, 0x00, 0x70]]
    );
}

#[test]
fn test_family_specific_operations() {
    let mut avr = open(DeviceFamily::KfdAvr, &[]);
    assert!(matches!(avr.enter_bootloader(), Err(KfdError::Unsupported(_))));

    let mut tool = open(DeviceFamily::KfdTool, &[]);
    assert!(matches!(tool.list_installed_keys(), Err(KfdError::Unsupported(_))));
    tool.enter_bootloader().unwrap();
    assert_eq!(commands_after_open(&tool), vec![vec![0x13]]);
}

#[test]
fn test_reset_and_close() {
    let mut device = open(DeviceFamily::KfdTool, &[]);

    device.reset().unwrap();
    device.close().unwrap();

    assert!(!device.transport().is_open());
    assert_eq!(commands_after_open(&device), vec![vec![0x14]]);
}

// =============================================================================
// Serialization Tests
// =============================================================================

#[test]
fn test_device_info_json() {
    let device = open(DeviceFamily::KfdAvr, &[]);
    let json = serde_json::to_value(device.device_info()).unwrap();

    assert_eq!(json["adapter_version"], "1.0.2");
    assert_eq!(json["uid"], "1852");
    assert_eq!(json["model"], 1);
    assert_eq!(json["serial_number"], "414243");
}

// =============================================================================
// Shared Access Tests
// =============================================================================

#[test]
fn test_shared_device_across_threads() {
    let device = open(
        DeviceFamily::KfdAvr,
        &[vec![0x25, 0x00], vec![0x25, 0x00], vec![0x25, 0x00]],
    )
    .into_shared();

    let handles: Vec<_> = (0..3)
        .map(|_| {
            let device = device.clone();
            thread::spawn(move || device.lock().self_test().unwrap())
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), SelfTestResult::Pass);
    }
    assert_eq!(device.lock().transport().stream().writes().len(), 9);
}
