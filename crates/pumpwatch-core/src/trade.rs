//! Classified trade types.

use crate::address::Address;
use crate::amount::{SolDelta, TokenDelta};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction of a classified trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeKind {
    Buy,
    Sell,
}

impl TradeKind {
    /// Label for metrics and log fields.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Buy => "buy",
            Self::Sell => "sell",
        }
    }

    pub fn is_buy(&self) -> bool {
        matches!(self, Self::Buy)
    }
}

impl fmt::Display for TradeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buy => write!(f, "BUY"),
            Self::Sell => write!(f, "SELL"),
        }
    }
}

/// A buy or sell by a watched wallet.
///
/// Produced once per transaction, consumed by the notifier and (for buys)
/// the executor, then dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedTrade {
    pub kind: TradeKind,
    pub actor_address: Address,
    /// Registry label; `None` alerts anonymously.
    pub actor_label: Option<String>,
    pub token_mint: String,
    pub sol_delta: SolDelta,
    pub token_delta: TokenDelta,
    pub signature: String,
    pub slot: u64,
    pub observed_at: DateTime<Utc>,
}

impl ClassifiedTrade {
    /// Label or a placeholder for anonymous wallets.
    pub fn actor_display(&self) -> &str {
        self.actor_label.as_deref().unwrap_or("unknown")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_trade_kind_strings() {
        assert_eq!(TradeKind::Buy.to_string(), "BUY");
        assert_eq!(TradeKind::Sell.as_str(), "sell");
        assert!(TradeKind::Buy.is_buy());
        assert!(!TradeKind::Sell.is_buy());
    }

    #[test]
    fn test_actor_display() {
        let mut trade = ClassifiedTrade {
            kind: TradeKind::Sell,
            actor_address: Address::from_bytes(&[9u8; 32]),
            actor_label: None,
            token_mint: "mint".to_string(),
            sol_delta: SolDelta(dec!(0.5)),
            token_delta: TokenDelta(dec!(-100)),
            signature: "sig".to_string(),
            slot: 42,
            observed_at: Utc::now(),
        };
        assert_eq!(trade.actor_display(), "unknown");
        trade.actor_label = Some("Alice".to_string());
        assert_eq!(trade.actor_display(), "Alice");
    }
}
