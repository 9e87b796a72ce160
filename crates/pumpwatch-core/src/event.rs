//! Transaction events pushed by the stream.
//!
//! `TransactionEvent` is the wire-independent form of a geyser transaction
//! update. The stream crate converts protocol messages into it; the
//! classifier only ever sees this type.

use crate::address::Address;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Token balance entry from transaction metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenBalance {
    /// Index into the transaction's full account key list.
    pub account_index: u32,
    /// Mint address (base58).
    pub mint: String,
    /// Owner wallet of the token account (base58, may be empty).
    pub owner: String,
    /// UI amount (decimals applied). `None` when the node omitted it.
    pub ui_amount: Option<Decimal>,
}

/// Instruction compiled against the transaction's account key list.
///
/// Outer and inner instructions are flattened into one list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompiledInstruction {
    pub program_id_index: u32,
    pub data: Vec<u8>,
}

/// Execution metadata of a transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionMeta {
    pub log_messages: Vec<String>,
    /// Lamport balances before execution, indexed like the account keys.
    pub pre_balances: Vec<u64>,
    /// Lamport balances after execution.
    pub post_balances: Vec<u64>,
    pub pre_token_balances: Option<Vec<TokenBalance>>,
    pub post_token_balances: Option<Vec<TokenBalance>>,
}

impl TransactionMeta {
    /// Whether all four balance lists are present.
    pub fn has_balances(&self) -> bool {
        self.pre_token_balances.is_some()
            && self.post_token_balances.is_some()
            && !self.pre_balances.is_empty()
            && !self.post_balances.is_empty()
    }

    /// Whether any log line contains the given marker.
    pub fn logs_contain(&self, marker: &str) -> bool {
        self.log_messages.iter().any(|line| line.contains(marker))
    }
}

/// A transaction pushed by the event server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionEvent {
    /// Transaction signature (base58).
    pub signature: String,
    pub slot: u64,
    /// Filter tags the server matched this transaction against.
    pub filters: Vec<String>,
    /// Static keys followed by loaded writable and readonly addresses.
    pub account_keys: Vec<Address>,
    pub instructions: Vec<CompiledInstruction>,
    /// `None` when the server sent the transaction without metadata.
    pub meta: Option<TransactionMeta>,
    /// Local receive time.
    pub received_at: DateTime<Utc>,
}

impl TransactionEvent {
    /// Whether the server matched this event against `tag`.
    pub fn matched(&self, tag: &str) -> bool {
        self.filters.iter().any(|f| f == tag)
    }

    /// The fee payer / signer: the first account key.
    pub fn initiator(&self) -> Option<&Address> {
        self.account_keys.first()
    }

    /// Program id of an instruction, resolved through the account keys.
    pub fn program_of(&self, ix: &CompiledInstruction) -> Option<&Address> {
        self.account_keys.get(ix.program_id_index as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event_with_filters(filters: &[&str]) -> TransactionEvent {
        TransactionEvent {
            signature: "sig".to_string(),
            slot: 1,
            filters: filters.iter().map(|s| s.to_string()).collect(),
            account_keys: vec![Address::from_bytes(&[1u8; 32]), Address::from_bytes(&[2u8; 32])],
            instructions: vec![CompiledInstruction {
                program_id_index: 1,
                data: vec![1, 2, 3],
            }],
            meta: None,
            received_at: Utc::now(),
        }
    }

    #[test]
    fn test_matched_filters() {
        let event = event_with_filters(&["pumpFun"]);
        assert!(event.matched("pumpFun"));
        assert!(!event.matched("other"));
    }

    #[test]
    fn test_initiator_and_program() {
        let event = event_with_filters(&[]);
        assert_eq!(event.initiator(), Some(&Address::from_bytes(&[1u8; 32])));
        let program = event.program_of(&event.instructions[0]).unwrap();
        assert_eq!(program, &Address::from_bytes(&[2u8; 32]));
    }

    #[test]
    fn test_meta_has_balances() {
        let mut meta = TransactionMeta {
            pre_balances: vec![1],
            post_balances: vec![1],
            pre_token_balances: Some(vec![]),
            post_token_balances: None,
            ..Default::default()
        };
        assert!(!meta.has_balances());
        meta.post_token_balances = Some(vec![]);
        assert!(meta.has_balances());
    }

    #[test]
    fn test_logs_contain() {
        let meta = TransactionMeta {
            log_messages: vec![
                "Program 6EF8 invoke [1]".to_string(),
                "Program log: Instruction: Buy".to_string(),
            ],
            ..Default::default()
        };
        assert!(meta.logs_contain("Instruction: Buy"));
        assert!(!meta.logs_contain("Instruction: Sell"));
    }
}
