//! Classifier configuration.

use pumpwatch_core::Address;
use serde::{Deserialize, Serialize};

/// Configuration for transaction classification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Program whose trades are classified.
    #[serde(default = "default_program_id")]
    pub program_id: Address,
    /// Subscription tag an event must carry.
    #[serde(default = "default_filter_tag")]
    pub filter_tag: String,
    /// Token-balance account index never treated as the traded token
    /// (the bonding curve's token account in pump.fun trades).
    #[serde(default = "default_reserved_account_index")]
    pub reserved_account_index: u32,
    /// Lamport balances are read this many account keys before the traded
    /// token's account index.
    #[serde(default = "default_sol_index_offset")]
    pub sol_index_offset: u32,
    /// Upper bound for one guarded classification, dispatch included.
    #[serde(default = "default_classification_timeout_ms")]
    pub classification_timeout_ms: u64,
    /// Mirror buys through the executor.
    #[serde(default)]
    pub mirror_buys: bool,
}

fn default_program_id() -> Address {
    Address::pump_fun()
}

fn default_filter_tag() -> String {
    "pumpFun".to_string()
}

fn default_reserved_account_index() -> u32 {
    1
}

fn default_sol_index_offset() -> u32 {
    1
}

fn default_classification_timeout_ms() -> u64 {
    30_000
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            program_id: default_program_id(),
            filter_tag: default_filter_tag(),
            reserved_account_index: default_reserved_account_index(),
            sol_index_offset: default_sol_index_offset(),
            classification_timeout_ms: default_classification_timeout_ms(),
            mirror_buys: false,
        }
    }
}

impl ClassifierConfig {
    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.filter_tag.trim().is_empty() {
            return Err("filter_tag must not be empty".to_string());
        }
        if self.classification_timeout_ms == 0 {
            return Err("classification_timeout_ms must be positive".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ClassifierConfig::default();
        assert_eq!(config.program_id, Address::pump_fun());
        assert_eq!(config.filter_tag, "pumpFun");
        assert_eq!(config.reserved_account_index, 1);
        assert_eq!(config.sol_index_offset, 1);
        assert_eq!(config.classification_timeout_ms, 30_000);
        assert!(!config.mirror_buys);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let config = ClassifierConfig {
            classification_timeout_ms: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
