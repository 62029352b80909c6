//! Canonical textual account addresses.
//!
//! An address is the base32 (no padding) encoding of the 32-byte ed25519
//! public key followed by the last four bytes of its SHA-512/256 digest.

use data_encoding::BASE32_NOPAD;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha512_256};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Length of an ed25519 public key.
pub const PUBLIC_KEY_LENGTH: usize = 32;

/// Length of the encoded address text.
pub const ADDRESS_LENGTH: usize = 58;

const CHECKSUM_LENGTH: usize = 4;

/// Errors parsing address text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    #[error("expected {ADDRESS_LENGTH} characters, got {0}")]
    InvalidLength(usize),

    #[error("not valid base32: {0}")]
    InvalidEncoding(String),

    #[error("checksum mismatch")]
    ChecksumMismatch,
}

/// A ledger account address.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address([u8; PUBLIC_KEY_LENGTH]);

impl Address {
    /// The all-zero address.
    pub const ZERO: Address = Address([0u8; PUBLIC_KEY_LENGTH]);

    /// Wrap a raw public key.
    pub fn from_public_key(public_key: [u8; PUBLIC_KEY_LENGTH]) -> Self {
        Self(public_key)
    }

    /// Build from a slice, failing unless it is exactly 32 bytes.
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        let key: [u8; PUBLIC_KEY_LENGTH] = bytes.try_into().ok()?;
        Some(Self(key))
    }

    /// Raw public key bytes.
    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_LENGTH] {
        &self.0
    }

    /// Canonical textual form.
    pub fn encode(&self) -> String {
        let mut buf = Vec::with_capacity(PUBLIC_KEY_LENGTH + CHECKSUM_LENGTH);
        buf.extend_from_slice(&self.0);
        buf.extend_from_slice(&checksum(&self.0));
        BASE32_NOPAD.encode(&buf)
    }
}

fn checksum(public_key: &[u8; PUBLIC_KEY_LENGTH]) -> [u8; CHECKSUM_LENGTH] {
    let digest = Sha512_256::digest(public_key);
    let mut out = [0u8; CHECKSUM_LENGTH];
    out.copy_from_slice(&digest[digest.len() - CHECKSUM_LENGTH..]);
    out
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != ADDRESS_LENGTH {
            return Err(AddressError::InvalidLength(s.len()));
        }

        let decoded = BASE32_NOPAD
            .decode(s.as_bytes())
            .map_err(|e| AddressError::InvalidEncoding(e.to_string()))?;

        let (key, sum) = decoded.split_at(PUBLIC_KEY_LENGTH);
        let key: [u8; PUBLIC_KEY_LENGTH] = key
            .try_into()
            .map_err(|_| AddressError::InvalidLength(s.len()))?;

        if checksum(&key) != sum {
            return Err(AddressError::ChecksumMismatch);
        }

        Ok(Self(key))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.encode())
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}
