//! Address and watch-list entry types.
//!
//! Solana addresses travel as base58 text everywhere outside the wire
//! protocol. `Address` guarantees the text decodes to a 32-byte public key.

use crate::error::{CoreError, Result};
use crate::filter::PUMP_FUN_PROGRAM_ID;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Maximum label length (in characters) accepted at registry write time.
pub const MAX_LABEL_LEN: usize = 10;

/// Length of a decoded Solana public key.
const PUBKEY_LEN: usize = 32;

/// Base58-encoded Solana address.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

impl Address {
    /// Parse and validate a base58 address.
    pub fn parse(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let decoded = bs58::decode(trimmed)
            .into_vec()
            .map_err(|e| CoreError::InvalidAddress(format!("{trimmed}: {e}")))?;
        if decoded.len() != PUBKEY_LEN {
            return Err(CoreError::InvalidAddress(format!(
                "{trimmed}: expected {PUBKEY_LEN} bytes, got {}",
                decoded.len()
            )));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// The pump.fun bonding-curve program.
    pub fn pump_fun() -> Self {
        Self(PUMP_FUN_PROGRAM_ID.to_string())
    }

    /// Encode raw public key bytes as received from the stream.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(bs58::encode(bytes).into_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Shortened form for log lines and alerts (`AbCd…WxYz`).
    pub fn short(&self) -> String {
        if self.0.len() <= 8 {
            return self.0.clone();
        }
        format!("{}…{}", &self.0[..4], &self.0[self.0.len() - 4..])
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Address {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Address {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.0
    }
}

impl AsRef<str> for Address {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A watched wallet and its human label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchedAddress {
    pub address: Address,
    pub label: String,
}

impl WatchedAddress {
    /// Create a watch-list entry, enforcing the label bound.
    pub fn new(address: Address, label: impl Into<String>) -> Result<Self> {
        let label = label.into();
        Self::validate_label(&label)?;
        Ok(Self { address, label })
    }

    /// Labels are bounded by character count, not bytes.
    pub fn validate_label(label: &str) -> Result<()> {
        let len = label.chars().count();
        if len > MAX_LABEL_LEN {
            return Err(CoreError::InvalidLabel(format!(
                "label is {len} characters, maximum is {MAX_LABEL_LEN}"
            )));
        }
        Ok(())
    }
}
