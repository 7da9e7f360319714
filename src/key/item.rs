//! Key item definitions
//!
//! Identifiers are validated when constructed, so a `KeyItem` can never
//! hold an out-of-range SLN or KID.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::{KfdError, Result};

/// Lowest assignable SLN/KID
pub const MIN_ID: u16 = 0x0001;

/// Highest assignable SLN/KID (0xFFFF is reserved)
pub const MAX_ID: u16 = 0xFFFE;

/// Check an SLN/KID candidate and narrow it to 16 bits
fn validate_id(name: &str, value: i64) -> Result<u16> {
    if value < 0 || value > i64::from(u16::MAX) {
        return Err(KfdError::Validation(format!(
            "{} {} does not fit in 16 bits",
            name, value
        )));
    }
    let value = value as u16;
    if !(MIN_ID..=MAX_ID).contains(&value) {
        return Err(KfdError::Validation(format!(
            "{} 0x{:04x} is reserved; valid range is 0x{:04x}..=0x{:04x}",
            name, value, MIN_ID, MAX_ID
        )));
    }
    Ok(value)
}

/// Parse decimal or `0x`-prefixed hexadecimal text
fn parse_id(name: &str, text: &str) -> Result<u16> {
    let text = text.trim();
    let parsed = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex_digits) => i64::from_str_radix(hex_digits, 16),
        None => text.parse::<i64>(),
    };
    let value = parsed.map_err(|_| {
        KfdError::Validation(format!("{} must be an integer, got {:?}", name, text))
    })?;
    validate_id(name, value)
}

/// Security logical number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Sln(u16);

impl Sln {
    /// Validate and wrap an SLN (1..=0xFFFE)
    pub fn new(value: u32) -> Result<Self> {
        validate_id("SLN", i64::from(value)).map(Self)
    }

    pub fn value(self) -> u16 {
        self.0
    }
}

impl TryFrom<i64> for Sln {
    type Error = KfdError;

    fn try_from(value: i64) -> Result<Self> {
        validate_id("SLN", value).map(Self)
    }
}

impl FromStr for Sln {
    type Err = KfdError;

    fn from_str(s: &str) -> Result<Self> {
        parse_id("SLN", s).map(Self)
    }
}

impl fmt::Display for Sln {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:04X}", self.0)
    }
}

/// Key identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Kid(u16);

impl Kid {
    /// Validate and wrap a KID (1..=0xFFFE)
    pub fn new(value: u32) -> Result<Self> {
        validate_id("KID", i64::from(value)).map(Self)
    }

    pub fn value(self) -> u16 {
        self.0
    }
}

impl TryFrom<i64> for Kid {
    type Error = KfdError;

    fn try_from(value: i64) -> Result<Self> {
        validate_id("KID", value).map(Self)
    }
}

impl FromStr for Kid {
    type Err = KfdError;

    fn from_str(s: &str) -> Result<Self> {
        parse_id("KID", s).map(Self)
    }
}

impl fmt::Display for Kid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:04X}", self.0)
    }
}

/// A key to load into an adapter
///
/// Immutable once built.
#[derive(Clone, PartialEq, Eq)]
pub struct KeyItem {
    sln: Sln,
    kid: Kid,

    /// Key-encryption key
    kek: bool,

    /// Erase rather than load
    erase: bool,

    /// Raw key material; length depends on the algorithm
    key: Vec<u8>,
}

impl KeyItem {
    /// Create a traffic key with both flags cleared
    pub fn new(sln: Sln, kid: Kid, key: impl Into<Vec<u8>>) -> Self {
        Self {
            sln,
            kid,
            kek: false,
            erase: false,
            key: key.into(),
        }
    }

    /// Start a builder from raw identifier values
    pub fn builder() -> KeyItemBuilder {
        KeyItemBuilder::default()
    }

    /// Copy of this item with the KEK flag set as given
    pub fn with_kek(mut self, kek: bool) -> Self {
        self.kek = kek;
        self
    }

    /// Copy of this item with the erase flag set as given
    pub fn with_erase(mut self, erase: bool) -> Self {
        self.erase = erase;
        self
    }

    pub fn sln(&self) -> Sln {
        self.sln
    }

    pub fn kid(&self) -> Kid {
        self.kid
    }

    pub fn is_kek(&self) -> bool {
        self.kek
    }

    pub fn is_erase(&self) -> bool {
        self.erase
    }

    pub fn key(&self) -> &[u8] {
        &self.key
    }

    /// Canonical record bytes
    pub fn to_bytes(&self) -> Vec<u8> {
        super::encode(self)
    }

    /// Parse canonical record bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        super::decode(bytes)
    }
}

// Key material stays out of logs
impl fmt::Debug for KeyItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyItem")
            .field("sln", &self.sln)
            .field("kid", &self.kid)
            .field("kek", &self.kek)
            .field("erase", &self.erase)
            .field("key_len", &self.key.len())
            .finish()
    }
}

/// Builder for KeyItem
#[derive(Debug, Default)]
pub struct KeyItemBuilder {
    sln: Option<u32>,
    kid: Option<u32>,
    kek: bool,
    erase: bool,
    key: Vec<u8>,
}

impl KeyItemBuilder {
    /// Set the SLN (validated in `build`)
    pub fn sln(mut self, sln: u32) -> Self {
        self.sln = Some(sln);
        self
    }

    /// Set the KID (validated in `build`)
    pub fn kid(mut self, kid: u32) -> Self {
        self.kid = Some(kid);
        self
    }

    /// Mark as key-encryption key
    pub fn kek(mut self, kek: bool) -> Self {
        self.kek = kek;
        self
    }

    /// Mark as an erase request
    pub fn erase(mut self, erase: bool) -> Self {
        self.erase = erase;
        self
    }

    /// Set the key material
    pub fn key(mut self, key: impl Into<Vec<u8>>) -> Self {
        self.key = key.into();
        self
    }

    pub fn build(self) -> Result<KeyItem> {
        let sln = self
            .sln
            .ok_or_else(|| KfdError::Validation("SLN not set".to_string()))?;
        let kid = self
            .kid
            .ok_or_else(|| KfdError::Validation("KID not set".to_string()))?;

        Ok(KeyItem {
            sln: Sln::new(sln)?,
            kid: Kid::new(kid)?,
            kek: self.kek,
            erase: self.erase,
            key: self.key,
        })
    }
}

/// A key the adapter reports as installed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct InstalledKey {
    /// Storage slot on the adapter
    pub slot: u8,

    /// Common key reference as reported by the device
    pub ckr: u16,

    /// Key identifier as reported by the device
    pub kid: u16,
}
