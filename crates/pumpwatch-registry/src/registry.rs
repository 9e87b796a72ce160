//! Registry trait consumed by the stream and the classifier.
//!
//! Provides a trait-based abstraction so the connection manager and the
//! classifier never depend on how the watch-list is stored.

use crate::error::RegistryResult;
use pumpwatch_core::Address;
use std::pin::Pin;
use tokio::sync::watch;

/// Boxed future for dyn-compatible async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn std::future::Future<Output = T> + Send + 'a>>;

/// Change notification receiver.
///
/// The value is a version counter bumped on every mutation. Consumers only
/// care that it changed; several bumps between two reads coalesce into one
/// `changed()` wake-up.
pub type ChangeReceiver = watch::Receiver<u64>;

/// Read side of the watch-list.
pub trait AddressRegistry: Send + Sync {
    /// Watched addresses in insertion order.
    fn snapshot(&self) -> BoxFuture<'_, RegistryResult<Vec<Address>>>;

    /// Label of a watched address, `None` when unlabelled or not watched.
    fn label_of<'a>(&'a self, address: &'a Address) -> BoxFuture<'a, RegistryResult<Option<String>>>;

    /// Subscribe to change notifications.
    fn subscribe(&self) -> ChangeReceiver;
}
