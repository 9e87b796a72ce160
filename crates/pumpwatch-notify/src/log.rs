//! Log-only notifier.

use pumpwatch_classifier::{BoxFuture, Notifier, NotifyError};
use tracing::info;

/// Writes alerts to the log. Used when no delivery channel is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn deliver(&self, message: String) -> BoxFuture<'_, Result<(), NotifyError>> {
        Box::pin(async move {
            info!(alert = %message, "Trade alert");
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_notifier_never_fails() {
        tokio_test::assert_ok!(tokio_test::block_on(
            LogNotifier.deliver("🔔 test".to_string())
        ));
    }
}
