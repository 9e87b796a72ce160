//! Geyser connection manager.
//!
//! Handles connection lifecycle, subscription filter (re)issue on registry
//! changes, heartbeats and automatic reconnection with exponential backoff.
//!
//! One session task owns the live connection. Inbound updates, registry
//! changes and heartbeat ticks are handled by that task's `select!` loop, so
//! a resubscribe can never interleave with another resubscribe or with a
//! reconnect, and two connections are never active at once.
//!
//! A session only resets the reconnect counter once the server has sent
//! something back. A server that accepts the stream and rejects it on the
//! first read keeps growing the backoff and counts toward
//! `max_reconnect_attempts`.

use crate::error::{StreamError, StreamResult};
use crate::handler::EventHandler;
use crate::heartbeat::Heartbeat;
use crate::message::{decode_update, ping_request, subscribe_request, Inbound};
use crate::transport::{GeyserConnector, GeyserDuplex, RequestSink};
use chrono::{DateTime, Utc};
use futures_util::{SinkExt, StreamExt};
use parking_lot::{Mutex, RwLock};
use pumpwatch_core::{Address, Commitment, SubscriptionFilter};
use pumpwatch_registry::{AddressRegistry, ChangeReceiver};
use pumpwatch_telemetry::Metrics;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Connection configuration.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Tag the server echoes back on matching transactions.
    pub filter_tag: String,
    /// Program every matched transaction must touch.
    pub program_id: Address,
    pub commitment: Commitment,
    /// Keepalive interval.
    pub heartbeat_interval_ms: u64,
    /// Maximum consecutive failed reconnect attempts (0 = infinite).
    pub max_reconnect_attempts: u32,
    /// Base delay for exponential backoff.
    pub reconnect_base_delay_ms: u64,
    /// Maximum delay for exponential backoff.
    pub reconnect_max_delay_ms: u64,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            filter_tag: "pumpFun".to_string(),
            program_id: Address::pump_fun(),
            commitment: Commitment::Confirmed,
            heartbeat_interval_ms: 5000,
            max_reconnect_attempts: 0, // Infinite
            reconnect_base_delay_ms: 1000,
            reconnect_max_delay_ms: 60000,
        }
    }
}

/// Connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Active,
    Reconnecting,
}

impl ConnectionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Active => "active",
            Self::Reconnecting => "reconnecting",
        }
    }
}

/// Observable status of the manager.
#[derive(Debug, Clone, Default)]
pub struct StreamStatus {
    pub state: ConnectionState,
    /// A filter resend is in flight.
    pub updating: bool,
    pub last_heartbeat_at: Option<DateTime<Utc>>,
    /// Consecutive reconnect attempt. Resets once a session receives its
    /// first update.
    pub reconnect_attempt: u32,
    pub sessions_opened: u64,
}

/// Sets `updating` for its lifetime.
struct UpdatingGuard<'a> {
    status: &'a RwLock<StreamStatus>,
}

impl<'a> UpdatingGuard<'a> {
    fn enter(status: &'a RwLock<StreamStatus>) -> Self {
        status.write().updating = true;
        Self { status }
    }
}

impl Drop for UpdatingGuard<'_> {
    fn drop(&mut self) {
        self.status.write().updating = false;
    }
}

/// Registry change notifications. Pends forever once the registry is gone.
struct RegistryChanges {
    rx: ChangeReceiver,
    closed: bool,
}

impl RegistryChanges {
    fn new(rx: ChangeReceiver) -> Self {
        Self { rx, closed: false }
    }

    /// Resolves once per batch of mutations; marks them seen.
    async fn changed(&mut self) {
        if !self.closed {
            if self.rx.changed().await.is_ok() {
                return;
            }
            warn!("Registry change channel closed, filter will no longer be refreshed");
            self.closed = true;
        }
        std::future::pending::<()>().await;
    }

    /// Mark the current version seen. Call right before taking a snapshot.
    fn mark_seen(&mut self) {
        self.rx.borrow_and_update();
    }
}

enum SessionEnd {
    Shutdown,
    /// `proven` is set when the server answered at least once.
    Failed { error: StreamError, proven: bool },
}

/// State shared between the manager handle and the session task.
struct Shared {
    config: ConnectionConfig,
    connector: Arc<dyn GeyserConnector>,
    registry: Arc<dyn AddressRegistry>,
    handler: Arc<dyn EventHandler>,
    status: RwLock<StreamStatus>,
    /// Last filter successfully written to the server.
    last_filter: Mutex<Option<SubscriptionFilter>>,
    shutdown_token: CancellationToken,
}

/// Geyser connection manager.
pub struct ConnectionManager {
    shared: Arc<Shared>,
    changes: Mutex<Option<RegistryChanges>>,
    started: AtomicBool,
    session: Mutex<Option<JoinHandle<StreamResult<()>>>>,
}

impl ConnectionManager {
    /// Create a manager. Subscribes to registry changes immediately, so no
    /// mutation between construction and `start()` is missed.
    pub fn new(
        config: ConnectionConfig,
        connector: Arc<dyn GeyserConnector>,
        registry: Arc<dyn AddressRegistry>,
        handler: Arc<dyn EventHandler>,
    ) -> Self {
        let changes = RegistryChanges::new(registry.subscribe());
        Self {
            shared: Arc::new(Shared {
                config,
                connector,
                registry,
                handler,
                status: RwLock::new(StreamStatus::default()),
                last_filter: Mutex::new(None),
                shutdown_token: CancellationToken::new(),
            }),
            changes: Mutex::new(Some(changes)),
            started: AtomicBool::new(false),
            session: Mutex::new(None),
        }
    }

    /// Open the connection, send the initial filter and spawn the session
    /// task.
    ///
    /// Returns once the filter is written. A second call while a connection
    /// attempt is in progress, or after a successful start, is a no-op. A
    /// failure to open the first connection is returned and `start()` may be
    /// called again.
    pub async fn start(&self) -> StreamResult<()> {
        if self.started.swap(true, Ordering::SeqCst) {
            debug!("Connection manager already started");
            return Ok(());
        }
        let Some(mut changes) = self.changes.lock().take() else {
            return Ok(());
        };

        self.shared.set_state(ConnectionState::Connecting);
        match self.shared.open_session(&mut changes, "initial").await {
            Ok(duplex) => {
                let shared = Arc::clone(&self.shared);
                let handle = tokio::spawn(async move { shared.run(duplex, changes).await });
                *self.session.lock() = Some(handle);
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "Initial geyser connection failed");
                self.shared.set_state(ConnectionState::Disconnected);
                *self.changes.lock() = Some(changes);
                self.started.store(false, Ordering::SeqCst);
                Err(e)
            }
        }
    }

    /// Wait for the session task to finish.
    ///
    /// Resolves `Ok` after `shutdown()`, or with
    /// [`StreamError::RetriesExhausted`] when reconnects are given up.
    pub async fn wait(&self) -> StreamResult<()> {
        let handle = self.session.lock().take();
        match handle {
            Some(handle) => handle.await?,
            None => Ok(()),
        }
    }

    /// Signal graceful shutdown.
    ///
    /// Stops the session loop and any backoff wait.
    pub fn shutdown(&self) {
        info!("ConnectionManager shutdown requested");
        self.shared.shutdown_token.cancel();
    }

    pub fn is_shutdown(&self) -> bool {
        self.shared.shutdown_token.is_cancelled()
    }

    pub fn state(&self) -> ConnectionState {
        self.shared.status.read().state
    }

    pub fn status(&self) -> StreamStatus {
        self.shared.status.read().clone()
    }

    /// Last filter written to the server.
    pub fn current_filter(&self) -> Option<SubscriptionFilter> {
        self.shared.last_filter.lock().clone()
    }
}

impl Shared {
    fn set_state(&self, state: ConnectionState) {
        self.status.write().state = state;
        Metrics::stream_state_set(state.as_str());
        if state == ConnectionState::Active {
            Metrics::stream_connected();
        } else {
            Metrics::stream_disconnected();
        }
    }

    /// Reconnect loop. Owns the connection from here on.
    async fn run(
        self: Arc<Self>,
        first: GeyserDuplex,
        mut changes: RegistryChanges,
    ) -> StreamResult<()> {
        let mut live = Some(first);
        let mut attempt = 0u32;

        loop {
            if let Some(duplex) = live.take() {
                match self.drive(duplex, &mut changes).await {
                    SessionEnd::Shutdown => {
                        info!("Shutdown requested, session closed");
                        self.set_state(ConnectionState::Disconnected);
                        return Ok(());
                    }
                    SessionEnd::Failed { error, proven } => {
                        warn!(error = %error, proven, "Geyser session ended");
                        Metrics::stream_reconnect(error.reason());
                        // A session rejected before any reply counts as a
                        // failed attempt.
                        if proven {
                            attempt = 0;
                        }
                    }
                }
            }

            self.set_state(ConnectionState::Disconnected);
            if self.shutdown_token.is_cancelled() {
                return Ok(());
            }

            attempt += 1;
            let max = self.config.max_reconnect_attempts;
            if max > 0 && attempt > max {
                error!(attempts = max, "Max reconnection attempts reached");
                return Err(StreamError::RetriesExhausted { attempts: max });
            }

            {
                let mut status = self.status.write();
                status.reconnect_attempt = attempt;
            }
            self.set_state(ConnectionState::Reconnecting);

            let delay = self.backoff_delay(attempt);
            warn!(attempt, delay_ms = delay.as_millis() as u64, "Reconnecting");

            // A registry change cuts the wait short; the new session picks
            // up the latest snapshot.
            tokio::select! {
                () = tokio::time::sleep(delay) => {}
                () = changes.changed() => {
                    info!("Registry changed while disconnected, reconnecting now");
                }
                () = self.shutdown_token.cancelled() => {
                    info!("Shutdown requested during backoff, exiting");
                    self.set_state(ConnectionState::Disconnected);
                    return Ok(());
                }
            }

            self.set_state(ConnectionState::Connecting);
            match self.open_session(&mut changes, "reconnect").await {
                Ok(duplex) => live = Some(duplex),
                Err(e) => {
                    warn!(attempt, error = %e, "Reconnect attempt failed");
                    Metrics::stream_reconnect(e.reason());
                }
            }
        }
    }

    /// Connect and write the current filter.
    async fn open_session(
        &self,
        changes: &mut RegistryChanges,
        kind: &'static str,
    ) -> StreamResult<GeyserDuplex> {
        let mut duplex = self.connector.connect().await?;

        changes.mark_seen();
        let filter = match self.build_filter().await {
            Ok(filter) => filter,
            Err(e) => match self.last_filter.lock().clone() {
                Some(previous) => {
                    warn!(error = %e, "Registry snapshot failed, reusing previous filter");
                    previous
                }
                None => return Err(e),
            },
        };

        duplex.sink.send(subscribe_request(&filter)).await?;
        info!(
            addresses = filter.len(),
            tag = %filter.tag,
            commitment = %filter.commitment,
            "Subscription sent, stream active"
        );
        self.commit_filter(filter, kind);

        self.status.write().sessions_opened += 1;
        self.set_state(ConnectionState::Active);
        Ok(duplex)
    }

    /// Session loop: updates, registry changes and heartbeats.
    async fn drive(&self, duplex: GeyserDuplex, changes: &mut RegistryChanges) -> SessionEnd {
        let GeyserDuplex {
            mut sink,
            mut stream,
        } = duplex;
        let mut heartbeat = Heartbeat::new(self.config.heartbeat_interval_ms);
        let mut proven = false;

        loop {
            tokio::select! {
                () = self.shutdown_token.cancelled() => {
                    return SessionEnd::Shutdown;
                }

                update = stream.next() => match update {
                    Some(Ok(update)) => {
                        if !proven {
                            proven = true;
                            self.status.write().reconnect_attempt = 0;
                            debug!("First update received, session healthy");
                        }
                        if let Err(error) = self.on_update(update, &mut sink, &mut heartbeat).await {
                            return SessionEnd::Failed { error, proven };
                        }
                    }
                    Some(Err(status)) => {
                        return SessionEnd::Failed { error: status.into(), proven };
                    }
                    None => return SessionEnd::Failed { error: StreamError::StreamEnded, proven },
                },

                () = changes.changed() => {
                    if let Err(error) = self.resubscribe(&mut sink).await {
                        return SessionEnd::Failed { error, proven };
                    }
                }

                () = heartbeat.tick() => {
                    if let Err(error) = sink.send(ping_request()).await {
                        error!(error = %error, "Heartbeat write failed");
                        return SessionEnd::Failed { error, proven };
                    }
                    let at = heartbeat.record_ping();
                    self.status.write().last_heartbeat_at = Some(at);
                    Metrics::heartbeat("ping_sent");
                    debug!("Sent heartbeat ping");
                }
            }
        }
    }

    async fn on_update(
        &self,
        update: yellowstone_grpc_proto::prelude::SubscribeUpdate,
        sink: &mut RequestSink,
        heartbeat: &mut Heartbeat,
    ) -> StreamResult<()> {
        match decode_update(update, Utc::now()) {
            Inbound::Transaction(event) => {
                Metrics::event_received();
                self.handler.on_event(*event);
            }
            Inbound::Ping => {
                sink.send(ping_request()).await?;
                Metrics::heartbeat("server_ping");
                debug!("Answered server ping");
            }
            Inbound::Pong(id) => {
                heartbeat.record_pong();
                Metrics::heartbeat("pong_received");
                debug!(id, "Received pong");
            }
            Inbound::Ignored => {}
            Inbound::Malformed(reason) => {
                debug!(reason, "Dropping malformed update");
            }
        }
        Ok(())
    }

    /// Resend the full filter built from the latest snapshot.
    ///
    /// A snapshot failure keeps the previous filter; only a write failure
    /// ends the session.
    async fn resubscribe(&self, sink: &mut RequestSink) -> StreamResult<()> {
        let _updating = UpdatingGuard::enter(&self.status);

        let filter = match self.build_filter().await {
            Ok(filter) => filter,
            Err(e) => {
                warn!(error = %e, "Registry snapshot failed, previous filter stays active");
                return Ok(());
            }
        };

        sink.send(subscribe_request(&filter)).await?;
        info!(addresses = filter.len(), "Subscription filter resent");
        self.commit_filter(filter, "resend");
        Ok(())
    }

    async fn build_filter(&self) -> StreamResult<SubscriptionFilter> {
        let addresses = self.registry.snapshot().await?;
        Ok(SubscriptionFilter::new(
            self.config.filter_tag.clone(),
            self.config.program_id.clone(),
            self.config.commitment,
            addresses,
        ))
    }

    fn commit_filter(&self, filter: SubscriptionFilter, kind: &str) {
        Metrics::subscription_sent(kind, filter.len());
        *self.last_filter.lock() = Some(filter);
    }

    fn backoff_delay(&self, attempt: u32) -> Duration {
        backoff_delay(
            self.config.reconnect_base_delay_ms,
            self.config.reconnect_max_delay_ms,
            attempt,
        ) + Duration::from_millis(rand_jitter())
    }
}

/// Exponential backoff without jitter: `base * 2^(attempt-1)`, capped.
fn backoff_delay(base_ms: u64, max_ms: u64, attempt: u32) -> Duration {
    let exponent = attempt.saturating_sub(1).min(10);
    let delay = base_ms.saturating_mul(1u64 << exponent);
    Duration::from_millis(delay.min(max_ms))
}

/// Jitter in 0-1000ms.
fn rand_jitter() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or(0);
    (nanos % 1001) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ConnectionConfig::default();
        assert_eq!(config.max_reconnect_attempts, 0); // Infinite
        assert_eq!(config.heartbeat_interval_ms, 5000);
        assert_eq!(config.filter_tag, "pumpFun");
        assert_eq!(config.program_id, Address::pump_fun());
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        assert_eq!(backoff_delay(1000, 60000, 1), Duration::from_millis(1000));
        assert_eq!(backoff_delay(1000, 60000, 2), Duration::from_millis(2000));
        assert_eq!(backoff_delay(1000, 60000, 4), Duration::from_millis(8000));
        assert_eq!(backoff_delay(1000, 60000, 7), Duration::from_millis(60000));
        assert_eq!(backoff_delay(1000, 60000, 500), Duration::from_millis(60000));
    }

    #[test]
    fn test_jitter_bounded() {
        for _ in 0..100 {
            assert!(rand_jitter() <= 1000);
        }
    }

    #[test]
    fn test_updating_guard_clears_on_drop() {
        let status = RwLock::new(StreamStatus::default());
        {
            let _guard = UpdatingGuard::enter(&status);
            assert!(status.read().updating);
        }
        assert!(!status.read().updating);
    }

    #[test]
    fn test_state_labels() {
        assert_eq!(ConnectionState::default(), ConnectionState::Disconnected);
        assert_eq!(ConnectionState::Active.as_str(), "active");
        assert_eq!(ConnectionState::Reconnecting.as_str(), "reconnecting");
    }
}
