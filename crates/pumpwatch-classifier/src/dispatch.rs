//! Dispatch seams: alert formatting, notification and trade execution.
//!
//! The classifier owns these traits; the notify crate and the bot provide
//! the implementations.

use crate::error::{ExecuteError, NotifyError};
use pumpwatch_core::ClassifiedTrade;
use std::future::Future;
use std::pin::Pin;

/// Boxed future for dyn-compatible async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Renders a trade into alert text.
pub trait AlertFormatter: Send + Sync {
    fn format(&self, trade: &ClassifiedTrade) -> String;
}

/// Delivers rendered alerts.
pub trait Notifier: Send + Sync {
    fn deliver(&self, message: String) -> BoxFuture<'_, Result<(), NotifyError>>;
}

/// Mirrors a classified buy. Returns an execution reference on success.
pub trait Executor: Send + Sync {
    fn execute<'a>(&'a self, trade: &'a ClassifiedTrade) -> BoxFuture<'a, Result<String, ExecuteError>>;
}

/// What happened to one classified trade downstream.
#[derive(Debug)]
pub struct DispatchReport {
    pub trade: ClassifiedTrade,
    pub notified: Result<(), NotifyError>,
    /// `None` when no execution was attempted.
    pub executed: Option<Result<String, ExecuteError>>,
}

impl DispatchReport {
    /// Whether every attempted dispatch succeeded.
    pub fn is_clean(&self) -> bool {
        self.notified.is_ok() && self.executed.as_ref().map_or(true, Result::is_ok)
    }
}
