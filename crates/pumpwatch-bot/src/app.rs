//! Main application orchestration.
//!
//! Wires the watch-list, the geyser stream, the classifier and the alert
//! channel together:
//! - `FileRegistry` feeds the subscription filter and actor labels
//! - `ConnectionManager` pushes matching transactions to the classifier
//! - `TransactionClassifier` alerts through Telegram (or the log) and
//!   optionally mirrors buys

use crate::config::AppConfig;
use crate::error::AppResult;
use crate::mirror::DryRunExecutor;
use crate::server::run_metrics_server;
use pumpwatch_classifier::{Executor, Notifier, TransactionClassifier};
use pumpwatch_core::TransactionEvent;
use pumpwatch_notify::{AlertTemplate, LogNotifier, TelegramNotifier};
use pumpwatch_registry::{AddressRegistry, FileRegistry};
use pumpwatch_stream::{ConnectionManager, EventHandler, GeyserConnector, YellowstoneConnector};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

/// Main application.
pub struct Application {
    config: AppConfig,
    registry: Arc<FileRegistry>,
}

impl Application {
    /// Validate the config and load the watch-list.
    pub async fn new(config: AppConfig) -> AppResult<Self> {
        config.validate()?;
        let registry = Arc::new(FileRegistry::open(&config.registry.path).await?);
        Ok(Self { config, registry })
    }

    pub fn registry(&self) -> Arc<FileRegistry> {
        Arc::clone(&self.registry)
    }

    /// Run against the configured geyser endpoint until Ctrl-C.
    pub async fn run(self) -> AppResult<()> {
        pumpwatch_stream::init_crypto();
        let connector = Arc::new(YellowstoneConnector::new(self.config.endpoint_config()));
        self.run_until(connector, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "Failed to listen for Ctrl-C");
                std::future::pending::<()>().await;
            }
            info!("Shutdown signal received");
        })
        .await
    }

    /// Run with an explicit connector until `shutdown` resolves or the
    /// stream gives up reconnecting.
    pub async fn run_until<F>(self, connector: Arc<dyn GeyserConnector>, shutdown: F) -> AppResult<()>
    where
        F: Future<Output = ()>,
    {
        let classifier = self.build_classifier()?;
        let handler: Arc<dyn EventHandler> = Arc::new(move |event: TransactionEvent| {
            classifier.handle(event);
        });

        let manager = ConnectionManager::new(
            self.config.connection_config()?,
            connector,
            Arc::clone(&self.registry) as Arc<dyn AddressRegistry>,
            handler,
        );

        info!(
            watched = self.registry.entries().len(),
            endpoint = %self.config.stream.endpoint,
            commitment = %self.config.stream.commitment,
            "Starting stream"
        );
        manager.start().await?;

        let mut background = Vec::new();
        background.extend(self.spawn_reload());
        background.extend(self.spawn_metrics());

        let wait = manager.wait();
        tokio::pin!(wait);

        let result = tokio::select! {
            result = &mut wait => {
                if let Err(e) = &result {
                    error!(error = %e, "Stream stopped");
                }
                result
            }
            () = shutdown => {
                manager.shutdown();
                wait.await
            }
        };

        for task in background {
            task.abort();
        }
        info!("Shut down");
        Ok(result?)
    }

    fn build_classifier(&self) -> AppResult<TransactionClassifier> {
        let config = self.config.classifier_config()?;

        let notifier: Arc<dyn Notifier> = if self.config.notify.telegram_enabled() {
            info!("Alerts go to Telegram");
            Arc::new(TelegramNotifier::new(&self.config.notify)?)
        } else {
            warn!("Telegram not configured, alerts go to the log");
            Arc::new(LogNotifier)
        };

        let executor: Option<Arc<dyn Executor>> = if config.mirror_buys {
            info!(
                amount_sol = %self.config.executor.buy_amount_sol,
                slippage_pct = self.config.executor.slippage_pct,
                "Mirroring buys (dry run)"
            );
            Some(Arc::new(DryRunExecutor::new(&self.config.executor)))
        } else {
            None
        };

        Ok(TransactionClassifier::new(
            config,
            Arc::clone(&self.registry) as Arc<dyn AddressRegistry>,
            Arc::new(AlertTemplate::new(self.config.notify.explorer_base_url.clone())),
            notifier,
            executor,
        ))
    }

    /// Re-read the watch-list file so CLI edits reach the running stream.
    fn spawn_reload(&self) -> Option<JoinHandle<()>> {
        let interval_ms = self.config.registry.reload_interval_ms;
        if interval_ms == 0 {
            return None;
        }
        let registry = Arc::clone(&self.registry);
        Some(tokio::spawn(async move {
            let period = Duration::from_millis(interval_ms);
            let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if let Err(e) = registry.reload().await {
                    warn!(error = %e, "Watch-list reload failed");
                }
            }
        }))
    }

    fn spawn_metrics(&self) -> Option<JoinHandle<()>> {
        let port = self.config.telemetry.metrics_port;
        if port == 0 {
            return None;
        }
        Some(tokio::spawn(async move {
            if let Err(e) = run_metrics_server(port).await {
                error!(port, error = %e, "Metrics server failed");
            }
        }))
    }
}
