//! Dry-run mirror executor.

use crate::config::ExecutorConfig;
use pumpwatch_classifier::{BoxFuture, ExecuteError, Executor};
use pumpwatch_core::ClassifiedTrade;
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::info;

/// Logs the buy it would mirror and returns a synthetic reference.
///
/// No transaction is built or signed.
pub struct DryRunExecutor {
    buy_amount_sol: Decimal,
    slippage_pct: u32,
    executed: AtomicU64,
}

impl DryRunExecutor {
    pub fn new(config: &ExecutorConfig) -> Self {
        Self {
            buy_amount_sol: config.buy_amount_sol,
            slippage_pct: config.slippage_pct,
            executed: AtomicU64::new(0),
        }
    }

    /// Number of buys mirrored so far.
    pub fn executed(&self) -> u64 {
        self.executed.load(Ordering::Relaxed)
    }
}

impl Executor for DryRunExecutor {
    fn execute<'a>(
        &'a self,
        trade: &'a ClassifiedTrade,
    ) -> BoxFuture<'a, Result<String, ExecuteError>> {
        Box::pin(async move {
            if !trade.kind.is_buy() {
                return Err(ExecuteError::Rejected(format!(
                    "only buys are mirrored, got {}",
                    trade.kind
                )));
            }
            let seq = self.executed.fetch_add(1, Ordering::Relaxed) + 1;
            info!(
                mint = %trade.token_mint,
                amount_sol = %self.buy_amount_sol,
                slippage_pct = self.slippage_pct,
                source = %trade.signature,
                "Dry-run mirror buy"
            );
            Ok(format!("dry-run-{seq}"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use pumpwatch_core::{Address, SolDelta, TokenDelta, TradeKind};

    fn trade(kind: TradeKind) -> ClassifiedTrade {
        ClassifiedTrade {
            kind,
            actor_address: Address::from_bytes(&[3u8; 32]),
            actor_label: None,
            token_mint: "MintPump".to_string(),
            sol_delta: SolDelta::ZERO,
            token_delta: TokenDelta::ZERO,
            signature: "sig".to_string(),
            slot: 1,
            observed_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_buy_returns_reference() {
        let executor = DryRunExecutor::new(&ExecutorConfig::default());
        assert_eq!(executor.execute(&trade(TradeKind::Buy)).await.unwrap(), "dry-run-1");
        assert_eq!(executor.execute(&trade(TradeKind::Buy)).await.unwrap(), "dry-run-2");
        assert_eq!(executor.executed(), 2);
    }

    #[test]
    fn test_sell_is_rejected() {
        let executor = DryRunExecutor::new(&ExecutorConfig::default());
        let err = tokio_test::block_on(executor.execute(&trade(TradeKind::Sell))).unwrap_err();
        assert!(matches!(err, ExecuteError::Rejected(_)));
        assert_eq!(executor.executed(), 0);
    }
}
