//! Inbound event sink.

use pumpwatch_core::TransactionEvent;

/// Receives every transaction event, in delivery order, on the session task.
///
/// Implementations must not block: anything slow belongs in a spawned task.
pub trait EventHandler: Send + Sync {
    fn on_event(&self, event: TransactionEvent);
}

impl<F> EventHandler for F
where
    F: Fn(TransactionEvent) + Send + Sync,
{
    fn on_event(&self, event: TransactionEvent) {
        self(event)
    }
}
