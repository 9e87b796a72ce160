//! Core domain types for the pumpwatch wallet tracker.
//!
//! This crate provides the contracts shared by every other crate:
//! - `Address`, `WatchedAddress`: validated Solana addresses and watch-list entries
//! - `SolDelta`, `TokenDelta`: precision-safe balance changes
//! - `TransactionEvent`: a pushed transaction, decoupled from the wire format
//! - `ClassifiedTrade`, `TradeKind`: the classifier's output
//! - `SubscriptionFilter`, `Commitment`: what the stream asks the server for

pub mod address;
pub mod amount;
pub mod error;
pub mod event;
pub mod filter;
pub mod trade;

pub use address::{Address, WatchedAddress, MAX_LABEL_LEN};
pub use amount::{SolDelta, TokenDelta, LAMPORTS_PER_SOL, SOL_DISPLAY_DECIMALS};
pub use error::{CoreError, Result};
pub use event::{CompiledInstruction, TokenBalance, TransactionEvent, TransactionMeta};
pub use filter::{Commitment, SubscriptionFilter, PUMP_FUN_PROGRAM_ID};
pub use trade::{ClassifiedTrade, TradeKind};
