//! Wire types shared across the client.
//!
//! Addresses, transaction hashes, and receipts as they appear on the ledger
//! RPC interface. All JSON representations use camelCase field names.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of bytes in a ledger address.
const ADDRESS_LEN: usize = 20;

/// Errors produced when parsing an address string.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressParseError {
    /// Address does not start with `0x`.
    #[error("address must start with 0x: {0}")]
    MissingPrefix(String),

    /// Address is not exactly 20 bytes of hex.
    #[error("address must be {expected} hex characters, got {actual}")]
    BadLength { expected: usize, actual: usize },

    /// Address contains non-hex characters.
    #[error("address contains invalid hex: {0}")]
    InvalidHex(String),
}

/// A ledger address: `0x` followed by 40 lowercase hex characters.
///
/// Used both for accounts (derived from the wallet's verifying key) and for
/// the contract the client binds to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    /// Parses and validates an address string.
    ///
    /// Uppercase hex digits are accepted and normalized to lowercase.
    ///
    /// # Errors
    ///
    /// Returns `AddressParseError` if the string is missing the `0x` prefix,
    /// has the wrong length, or contains non-hex characters.
    pub fn parse(raw: &str) -> Result<Self, AddressParseError> {
        let hex_part = raw
            .strip_prefix("0x")
            .ok_or_else(|| AddressParseError::MissingPrefix(raw.to_string()))?;

        if hex_part.len() != ADDRESS_LEN * 2 {
            return Err(AddressParseError::BadLength {
                expected: ADDRESS_LEN * 2,
                actual: hex_part.len(),
            });
        }

        if !hex_part.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(AddressParseError::InvalidHex(raw.to_string()));
        }

        Ok(Self(format!("0x{}", hex_part.to_ascii_lowercase())))
    }

    /// Builds an address from raw bytes.
    #[must_use]
    pub(crate) fn from_bytes(bytes: &[u8; ADDRESS_LEN]) -> Self {
        Self(format!("0x{}", hex::encode(bytes)))
    }

    /// Returns the address as a `0x`-prefixed string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A pending-transaction reference returned by a write submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TxHash(pub String);

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Terminal status of a submitted transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TxStatus {
    Confirmed,
    Reverted,
}

/// The ledger's acknowledgment that a submitted write has been finalized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    /// Whether the write was applied or rolled back.
    pub status: TxStatus,

    /// Block in which the transaction was finalized.
    pub block_number: u64,

    /// When the ledger finalized the transaction.
    pub confirmed_at: DateTime<Utc>,
}
