//! Classifier error types.

use pumpwatch_core::CoreError;
use pumpwatch_registry::RegistryError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("Transaction has no account keys")]
    MissingAccountKeys,

    #[error("Balance index {index} out of range ({len} entries)")]
    BalanceIndexOutOfRange { index: usize, len: usize },

    #[error("Label lookup failed: {0}")]
    Registry(#[from] RegistryError),

    #[error("Amount conversion failed: {0}")]
    Amount(#[from] CoreError),
}

pub type ClassifierResult<T> = Result<T, ClassifierError>;

/// Notifier delivery failure.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("Notifier not configured: {0}")]
    NotConfigured(String),
}

/// Executor failure.
#[derive(Debug, Error)]
pub enum ExecuteError {
    #[error("Execution rejected: {0}")]
    Rejected(String),

    #[error("Execution failed: {0}")]
    Failed(String),
}
