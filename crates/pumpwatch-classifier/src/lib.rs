//! Buy/sell classification for watched pump.fun wallets.
//!
//! Receives `TransactionEvent`s from the stream, decides whether each one is
//! a buy or a sell by a watched wallet, and dispatches at most one alert (and
//! optionally one mirrored buy) at a time.

pub mod balance;
pub mod classifier;
pub mod config;
pub mod decoder;
pub mod dispatch;
pub mod error;

pub use balance::{resolve_traded_token, sol_delta, token_delta, TradedToken};
pub use classifier::{Admission, Outcome, SkipReason, TransactionClassifier};
pub use config::ClassifierConfig;
pub use decoder::{
    detect_kind, Detection, BUY_DISCRIMINATOR, BUY_LOG_MARKER, SELL_DISCRIMINATOR,
    SELL_LOG_MARKER,
};
pub use dispatch::{AlertFormatter, BoxFuture, DispatchReport, Executor, Notifier};
pub use error::{ClassifierError, ClassifierResult, ExecuteError, NotifyError};
