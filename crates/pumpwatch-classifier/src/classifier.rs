//! Transaction classifier.
//!
//! Turns pushed transactions into buy/sell alerts for watched wallets.
//!
//! `handle` runs synchronously on the stream task: it applies the relevance
//! filter and tries to take the single in-flight slot. Everything after that
//! (label lookup, balance extraction, notification and execution) runs on a
//! spawned task that holds the slot until dispatch finishes. Events arriving
//! while the slot is taken are dropped, never queued.

use crate::balance::{resolve_traded_token, sol_account_index, sol_delta, token_delta};
use crate::config::ClassifierConfig;
use crate::decoder::{detect_kind, Detection};
use crate::dispatch::{AlertFormatter, DispatchReport, Executor, Notifier};
use crate::error::{ClassifierError, ClassifierResult};
use pumpwatch_core::{ClassifiedTrade, TradeKind, TransactionEvent};
use pumpwatch_registry::AddressRegistry;
use pumpwatch_telemetry::Metrics;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Why an event produced no alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// No metadata, or a balance list is missing.
    IncompleteMetadata,
    /// Not matched against the configured subscription tag.
    TagMismatch,
    /// Neither a buy nor a sell.
    NotATrade,
    /// Both a buy and a sell.
    Ambiguous,
    /// No pre-trade token balance outside the reserved index, or none with
    /// a lamport account in front of it.
    NoTradedToken,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::IncompleteMetadata => "incomplete_metadata",
            Self::TagMismatch => "tag_mismatch",
            Self::NotATrade => "not_a_trade",
            Self::Ambiguous => "ambiguous",
            Self::NoTradedToken => "no_traded_token",
        }
    }
}

/// Result of offering one event to [`TransactionClassifier::handle`].
#[derive(Debug)]
pub enum Admission {
    /// Failed the relevance filter.
    Rejected(SkipReason),
    /// Another classification holds the slot.
    Dropped,
    /// Classification runs on the returned task.
    Accepted(JoinHandle<Outcome>),
}

impl Admission {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted(_))
    }
}

/// Final state of one guarded classification.
#[derive(Debug)]
pub enum Outcome {
    Dispatched(DispatchReport),
    Skipped(SkipReason),
    Failed(ClassifierError),
    TimedOut,
}

impl Outcome {
    /// Label for metrics. Skips carry their reason.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dispatched(_) => "dispatched",
            Self::Skipped(reason) => reason.as_str(),
            Self::Failed(_) => "failed",
            Self::TimedOut => "timed_out",
        }
    }
}

struct Inner {
    config: ClassifierConfig,
    registry: Arc<dyn AddressRegistry>,
    formatter: Arc<dyn AlertFormatter>,
    notifier: Arc<dyn Notifier>,
    executor: Option<Arc<dyn Executor>>,
    /// Single in-flight slot.
    slot: Arc<Semaphore>,
}

/// Buy/sell classifier with single-flight dispatch.
#[derive(Clone)]
pub struct TransactionClassifier {
    inner: Arc<Inner>,
}

impl TransactionClassifier {
    /// Create a classifier. With an `executor`, classified buys are
    /// mirrored after the alert is delivered.
    pub fn new(
        config: ClassifierConfig,
        registry: Arc<dyn AddressRegistry>,
        formatter: Arc<dyn AlertFormatter>,
        notifier: Arc<dyn Notifier>,
        executor: Option<Arc<dyn Executor>>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                registry,
                formatter,
                notifier,
                executor,
                slot: Arc::new(Semaphore::new(1)),
            }),
        }
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.inner.config
    }

    /// Whether no classification is in flight.
    pub fn is_idle(&self) -> bool {
        self.inner.slot.available_permits() == 1
    }

    /// Offer one event. Never blocks.
    ///
    /// Must be called from within a tokio runtime.
    pub fn handle(&self, event: TransactionEvent) -> Admission {
        let kind = match self.relevance(&event) {
            Ok(kind) => kind,
            Err(reason) => {
                debug!(signature = %event.signature, reason = reason.as_str(), "Event not relevant");
                Metrics::classification(reason.as_str());
                return Admission::Rejected(reason);
            }
        };

        let permit = match Arc::clone(&self.inner.slot).try_acquire_owned() {
            Ok(permit) => permit,
            Err(_) => {
                debug!(signature = %event.signature, "Classification in flight, event dropped");
                Metrics::classification("dropped_busy");
                return Admission::Dropped;
            }
        };

        let inner = Arc::clone(&self.inner);
        Admission::Accepted(tokio::spawn(inner.run_guarded(event, kind, permit)))
    }

    /// Relevance filter: metadata, subscription tag and trade kind.
    pub fn relevance(&self, event: &TransactionEvent) -> Result<TradeKind, SkipReason> {
        let meta = event
            .meta
            .as_ref()
            .filter(|m| m.has_balances())
            .ok_or(SkipReason::IncompleteMetadata)?;

        if !event.matched(&self.inner.config.filter_tag) {
            return Err(SkipReason::TagMismatch);
        }

        match detect_kind(event, meta, &self.inner.config.program_id) {
            Detection::Trade(kind) => Ok(kind),
            Detection::Neither => Err(SkipReason::NotATrade),
            Detection::Ambiguous => Err(SkipReason::Ambiguous),
        }
    }

    /// Build the trade for an event that passed [`Self::relevance`].
    ///
    /// Returns `Ok(None)` when no traded token can be resolved.
    pub async fn classify(
        &self,
        event: &TransactionEvent,
        kind: TradeKind,
    ) -> ClassifierResult<Option<ClassifiedTrade>> {
        self.inner.classify(event, kind).await
    }
}

impl Inner {
    async fn run_guarded(
        self: Arc<Self>,
        event: TransactionEvent,
        kind: TradeKind,
        _permit: OwnedSemaphorePermit,
    ) -> Outcome {
        let timeout = Duration::from_millis(self.config.classification_timeout_ms);
        let outcome = match tokio::time::timeout(timeout, self.process(&event, kind)).await {
            Ok(outcome) => outcome,
            Err(_) => {
                warn!(
                    signature = %event.signature,
                    timeout_ms = self.config.classification_timeout_ms,
                    "Classification timed out, releasing slot"
                );
                Outcome::TimedOut
            }
        };
        Metrics::classification(outcome.as_str());
        outcome
    }

    async fn process(&self, event: &TransactionEvent, kind: TradeKind) -> Outcome {
        let trade = match self.classify(event, kind).await {
            Ok(Some(trade)) => trade,
            Ok(None) => {
                debug!(signature = %event.signature, "No traded token found");
                return Outcome::Skipped(SkipReason::NoTradedToken);
            }
            Err(e) => {
                error!(signature = %event.signature, error = %e, "Classification failed");
                return Outcome::Failed(e);
            }
        };

        info!(
            kind = trade.kind.as_str(),
            actor = %trade.actor_address,
            label = trade.actor_display(),
            mint = %trade.token_mint,
            sol = %trade.sol_delta,
            tokens = %trade.token_delta,
            signature = %trade.signature,
            "Trade classified"
        );

        Outcome::Dispatched(self.dispatch(trade).await)
    }

    async fn classify(
        &self,
        event: &TransactionEvent,
        kind: TradeKind,
    ) -> ClassifierResult<Option<ClassifiedTrade>> {
        let actor = event
            .initiator()
            .ok_or(ClassifierError::MissingAccountKeys)?
            .clone();
        let actor_label = self.registry.label_of(&actor).await?;

        let Some(meta) = event.meta.as_ref() else {
            return Ok(None);
        };
        let pre_tokens = meta.pre_token_balances.as_deref().unwrap_or_default();
        let post_tokens = meta.post_token_balances.as_deref().unwrap_or_default();

        let Some(token) = resolve_traded_token(pre_tokens, self.config.reserved_account_index)
        else {
            return Ok(None);
        };

        let Some(sol_index) = sol_account_index(token.account_index, self.config.sol_index_offset)
        else {
            return Ok(None);
        };

        let token_delta = token_delta(pre_tokens, post_tokens, actor.as_str(), token.mint);
        let sol_delta = sol_delta(&meta.pre_balances, &meta.post_balances, sol_index)?;

        Ok(Some(ClassifiedTrade {
            kind,
            actor_address: actor,
            actor_label,
            token_mint: token.mint.to_string(),
            sol_delta,
            token_delta,
            signature: event.signature.clone(),
            slot: event.slot,
            observed_at: event.received_at,
        }))
    }

    /// Notify, then mirror buys. Failures are logged and reported, never
    /// retried.
    async fn dispatch(&self, trade: ClassifiedTrade) -> DispatchReport {
        let message = self.formatter.format(&trade);

        let started = Instant::now();
        let notified = self.notifier.deliver(message).await;
        Metrics::dispatch_latency("notify", started.elapsed().as_secs_f64() * 1000.0);
        if let Err(e) = &notified {
            warn!(signature = %trade.signature, error = %e, "Alert delivery failed");
            Metrics::dispatch_failed("notifier");
        }

        let executed = match &self.executor {
            Some(executor) if trade.kind.is_buy() => {
                let started = Instant::now();
                let result = executor.execute(&trade).await;
                Metrics::dispatch_latency("execute", started.elapsed().as_secs_f64() * 1000.0);
                match &result {
                    Ok(reference) => {
                        info!(signature = %trade.signature, reference = %reference, "Buy mirrored")
                    }
                    Err(e) => {
                        warn!(signature = %trade.signature, error = %e, "Buy mirror failed");
                        Metrics::dispatch_failed("executor");
                    }
                }
                Some(result)
            }
            _ => None,
        };

        DispatchReport {
            trade,
            notified,
            executed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::BoxFuture;
    use crate::error::NotifyError;
    use chrono::Utc;
    use pumpwatch_core::{Address, TokenBalance, TransactionMeta};
    use pumpwatch_registry::InMemoryRegistry;
    use rust_decimal_macros::dec;

    struct PlainFormatter;

    impl AlertFormatter for PlainFormatter {
        fn format(&self, trade: &ClassifiedTrade) -> String {
            format!("{} {}", trade.kind, trade.signature)
        }
    }

    struct NullNotifier;

    impl Notifier for NullNotifier {
        fn deliver(&self, _message: String) -> BoxFuture<'_, Result<(), NotifyError>> {
            Box::pin(async { Ok(()) })
        }
    }

    fn alice() -> Address {
        Address::from_bytes(&[1u8; 32])
    }

    fn classifier(registry: InMemoryRegistry) -> TransactionClassifier {
        TransactionClassifier::new(
            ClassifierConfig::default(),
            Arc::new(registry),
            Arc::new(PlainFormatter),
            Arc::new(NullNotifier),
            None,
        )
    }

    fn sell_event() -> TransactionEvent {
        let alice = alice();
        TransactionEvent {
            signature: "sell-sig".to_string(),
            slot: 42,
            filters: vec!["pumpFun".to_string()],
            account_keys: vec![
                alice.clone(),
                Address::from_bytes(&[2u8; 32]),
                Address::from_bytes(&[3u8; 32]),
                Address::pump_fun(),
            ],
            instructions: vec![],
            meta: Some(TransactionMeta {
                log_messages: vec!["Program log: Instruction: Sell".to_string()],
                pre_balances: vec![3_000_000_000, 1_000_000_000, 2_039_280, 1],
                post_balances: vec![2_999_995_000, 1_250_000_000, 2_039_280, 1],
                pre_token_balances: Some(vec![
                    TokenBalance {
                        account_index: 1,
                        mint: "MINT".to_string(),
                        owner: "curve".to_string(),
                        ui_amount: Some(dec!(100)),
                    },
                    TokenBalance {
                        account_index: 2,
                        mint: "MINT".to_string(),
                        owner: alice.to_string(),
                        ui_amount: Some(dec!(40.5)),
                    },
                ]),
                post_token_balances: Some(vec![TokenBalance {
                    account_index: 2,
                    mint: "MINT".to_string(),
                    owner: alice.to_string(),
                    ui_amount: Some(dec!(0)),
                }]),
            }),
            received_at: Utc::now(),
        }
    }

    #[test]
    fn test_skip_reason_labels() {
        assert_eq!(SkipReason::TagMismatch.as_str(), "tag_mismatch");
        assert_eq!(Outcome::TimedOut.as_str(), "timed_out");
        assert_eq!(
            Outcome::Skipped(SkipReason::NoTradedToken).as_str(),
            "no_traded_token"
        );
    }

    #[test]
    fn test_relevance_rejects_missing_token_balances() {
        let c = classifier(InMemoryRegistry::new());
        let mut event = sell_event();
        if let Some(meta) = event.meta.as_mut() {
            meta.post_token_balances = None;
        }
        assert_eq!(c.relevance(&event), Err(SkipReason::IncompleteMetadata));

        event.meta = None;
        assert_eq!(c.relevance(&event), Err(SkipReason::IncompleteMetadata));
    }

    #[test]
    fn test_relevance_rejects_other_tag() {
        let c = classifier(InMemoryRegistry::new());
        let mut event = sell_event();
        event.filters = vec!["raydium".to_string()];
        assert_eq!(c.relevance(&event), Err(SkipReason::TagMismatch));
    }

    #[test]
    fn test_relevance_accepts_sell() {
        let c = classifier(InMemoryRegistry::new());
        assert_eq!(c.relevance(&sell_event()), Ok(TradeKind::Sell));
    }

    #[tokio::test]
    async fn test_classify_sell() {
        let registry = InMemoryRegistry::new();
        registry.add(alice().as_str(), "alice").unwrap();
        let c = classifier(registry);

        let trade = c
            .classify(&sell_event(), TradeKind::Sell)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(trade.kind, TradeKind::Sell);
        assert_eq!(trade.actor_address, alice());
        assert_eq!(trade.actor_label.as_deref(), Some("alice"));
        assert_eq!(trade.token_mint, "MINT");
        assert_eq!(trade.token_delta.inner(), dec!(-40));
        assert_eq!(trade.sol_delta.inner(), dec!(0.25));
        assert_eq!(trade.slot, 42);
    }

    #[tokio::test]
    async fn test_classify_unknown_actor_is_anonymous() {
        let c = classifier(InMemoryRegistry::new());
        let trade = c
            .classify(&sell_event(), TradeKind::Sell)
            .await
            .unwrap()
            .unwrap();
        assert!(trade.actor_label.is_none());
    }

    #[tokio::test]
    async fn test_classify_without_traded_token() {
        let c = classifier(InMemoryRegistry::new());
        let mut event = sell_event();
        if let Some(meta) = event.meta.as_mut() {
            meta.pre_token_balances = Some(vec![]);
        }
        assert!(c.classify(&event, TradeKind::Sell).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_classify_index_out_of_range_is_error() {
        let c = classifier(InMemoryRegistry::new());
        let mut event = sell_event();
        if let Some(meta) = event.meta.as_mut() {
            meta.pre_balances.truncate(1);
        }
        let err = c.classify(&event, TradeKind::Sell).await.unwrap_err();
        assert!(matches!(err, ClassifierError::BalanceIndexOutOfRange { index: 1, .. }));
    }

    #[tokio::test]
    async fn test_classify_reads_lamports_before_token_account() {
        let c = classifier(InMemoryRegistry::new());
        let mut event = sell_event();
        if let Some(meta) = event.meta.as_mut() {
            // Lamports of the token account itself barely move.
            meta.pre_balances = vec![3_000_000_000, 1_000_000_000, 2_039_280, 1];
            meta.post_balances = vec![2_999_995_000, 1_250_000_000, 2_039_000, 1];
        }
        let trade = c.classify(&event, TradeKind::Sell).await.unwrap().unwrap();
        assert_eq!(trade.sol_delta.inner(), dec!(0.25));
    }

    #[tokio::test]
    async fn test_classify_same_index_when_offset_is_zero() {
        let c = TransactionClassifier::new(
            ClassifierConfig {
                sol_index_offset: 0,
                ..Default::default()
            },
            Arc::new(InMemoryRegistry::new()),
            Arc::new(PlainFormatter),
            Arc::new(NullNotifier),
            None,
        );
        let mut event = sell_event();
        if let Some(meta) = event.meta.as_mut() {
            meta.pre_balances = vec![3_000_000_000, 0, 1_000_000_000, 1];
            meta.post_balances = vec![2_999_995_000, 0, 1_250_000_000, 1];
        }
        let trade = c.classify(&event, TradeKind::Sell).await.unwrap().unwrap();
        assert_eq!(trade.sol_delta.inner(), dec!(0.25));
    }

    #[tokio::test]
    async fn test_classify_token_account_at_index_zero_is_skipped() {
        let c = classifier(InMemoryRegistry::new());
        let mut event = sell_event();
        if let Some(meta) = event.meta.as_mut() {
            meta.pre_token_balances = Some(vec![TokenBalance {
                account_index: 0,
                mint: "MINT".to_string(),
                owner: alice().to_string(),
                ui_amount: Some(dec!(1)),
            }]);
        }
        assert!(c.classify(&event, TradeKind::Sell).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_classify_without_account_keys_is_error() {
        let c = classifier(InMemoryRegistry::new());
        let mut event = sell_event();
        event.account_keys.clear();
        let err = c.classify(&event, TradeKind::Sell).await.unwrap_err();
        assert!(matches!(err, ClassifierError::MissingAccountKeys));
    }
}
