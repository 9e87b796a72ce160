//! Subscription filter types.

use crate::address::Address;
use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// pump.fun bonding-curve program.
pub const PUMP_FUN_PROGRAM_ID: &str = "6EF8rrecthR5Dkzon8Nwu78hRvfCKubJ14M5uBEwF6P";

/// Finality requested for delivered events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Commitment {
    Processed,
    #[default]
    Confirmed,
    Finalized,
}

impl fmt::Display for Commitment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Processed => write!(f, "processed"),
            Self::Confirmed => write!(f, "confirmed"),
            Self::Finalized => write!(f, "finalized"),
        }
    }
}

impl FromStr for Commitment {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "processed" => Ok(Self::Processed),
            "confirmed" => Ok(Self::Confirmed),
            "finalized" => Ok(Self::Finalized),
            other => Err(CoreError::InvalidCommitment(other.to_string())),
        }
    }
}

/// Server-side predicate for the transactions this client wants pushed.
///
/// Derived from the registry snapshot on every change and never persisted.
/// The address list is resent in full; it is not diffed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionFilter {
    /// Tag the server echoes back in `filters` for matching transactions.
    pub tag: String,
    /// Watched wallets, insertion order, duplicates removed.
    pub included_addresses: Vec<Address>,
    /// Program that must appear in every matched transaction.
    pub required_program: Address,
    pub exclude_failed: bool,
    pub commitment: Commitment,
}

impl SubscriptionFilter {
    /// Build a filter from a registry snapshot.
    pub fn new(
        tag: impl Into<String>,
        required_program: Address,
        commitment: Commitment,
        addresses: impl IntoIterator<Item = Address>,
    ) -> Self {
        let mut seen = HashSet::new();
        let included_addresses = addresses
            .into_iter()
            .filter(|a| seen.insert(a.clone()))
            .collect();
        Self {
            tag: tag.into(),
            included_addresses,
            required_program,
            exclude_failed: true,
            commitment,
        }
    }

    /// Whether the filter places no restriction on accounts.
    ///
    /// An empty include list means "any account" on the server side, so an
    /// empty watch-list subscribes to every transaction of the program.
    pub fn is_unrestricted(&self) -> bool {
        self.included_addresses.is_empty()
    }

    pub fn len(&self) -> usize {
        self.included_addresses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.included_addresses.is_empty()
    }

    pub fn contains(&self, address: &Address) -> bool {
        self.included_addresses.contains(address)
    }
}
