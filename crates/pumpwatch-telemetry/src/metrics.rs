//! Prometheus metrics for pumpwatch.
//!
//! Covers:
//! - Stream connection state, reconnects and heartbeats
//! - Subscription filter sends
//! - Classification outcomes and dispatch failures
//!
//! # Panics
//!
//! Metric registration uses `unwrap()`. A registration failure means a
//! duplicate metric name, which is a programming error caught on first use
//! at startup. Recording never panics.

use crate::error::TelemetryResult;
use once_cell::sync::Lazy;
use prometheus::{
    register_counter, register_counter_vec, register_gauge, register_gauge_vec,
    register_histogram_vec, register_int_gauge, Counter, CounterVec, Encoder, Gauge, GaugeVec,
    HistogramVec, IntGauge, TextEncoder,
};

/// Stream connection state (1 = active, 0 = not active).
pub static STREAM_CONNECTED: Lazy<Gauge> = Lazy::new(|| {
    register_gauge!(
        "pumpwatch_stream_connected",
        "Geyser stream connection state (1=active)"
    )
    .unwrap()
});

/// Connection state machine current state.
/// Labels: state (disconnected/connecting/active/reconnecting)
pub static STREAM_STATE: Lazy<GaugeVec> = Lazy::new(|| {
    register_gauge_vec!(
        "pumpwatch_stream_state",
        "Connection state machine current state (1=current, 0=other)",
        &["state"]
    )
    .unwrap()
});

/// Reconnects by reason.
pub static STREAM_RECONNECT_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "pumpwatch_stream_reconnect_total",
        "Total geyser stream reconnection attempts",
        &["reason"]
    )
    .unwrap()
});

/// Subscription filters written to the stream.
/// Labels: kind (initial/resend)
pub static SUBSCRIPTION_SENT_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "pumpwatch_subscription_sent_total",
        "Total subscription filters sent",
        &["kind"]
    )
    .unwrap()
});

/// Addresses in the most recently sent filter.
pub static WATCHED_ADDRESSES: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!(
        "pumpwatch_watched_addresses",
        "Addresses included in the active subscription filter"
    )
    .unwrap()
});

/// Keepalive frames.
/// Labels: kind (ping_sent/pong_received/server_ping)
pub static HEARTBEAT_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "pumpwatch_heartbeat_total",
        "Keepalive frames sent and received",
        &["kind"]
    )
    .unwrap()
});

/// Transaction events received from the stream.
pub static EVENTS_RECEIVED_TOTAL: Lazy<Counter> = Lazy::new(|| {
    register_counter!(
        "pumpwatch_events_received_total",
        "Transaction events received from the stream"
    )
    .unwrap()
});

/// Classification outcomes.
/// Labels: outcome (dispatched/failed/timed_out/dropped_busy, or the skip
/// reason: incomplete_metadata/tag_mismatch/not_a_trade/ambiguous/no_traded_token)
pub static CLASSIFICATION_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "pumpwatch_classification_total",
        "Classification outcomes per event",
        &["outcome"]
    )
    .unwrap()
});

/// Duration of one dispatch call.
/// Labels: kind (notify/execute)
pub static DISPATCH_LATENCY_MS: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "pumpwatch_dispatch_latency_ms",
        "Duration of one notifier or executor call in milliseconds",
        &["kind"],
        vec![5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 500.0, 1000.0, 2500.0, 5000.0, 10000.0]
    )
    .unwrap()
});

/// Dispatch failures.
/// Labels: target (notifier/executor)
pub static DISPATCH_FAILURE_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "pumpwatch_dispatch_failure_total",
        "Notifier and executor failures",
        &["target"]
    )
    .unwrap()
});

const STATES: [&str; 4] = ["disconnected", "connecting", "active", "reconnecting"];

/// Metrics facade for easy access.
pub struct Metrics;

impl Metrics {
    pub fn stream_connected() {
        STREAM_CONNECTED.set(1.0);
    }

    pub fn stream_disconnected() {
        STREAM_CONNECTED.set(0.0);
    }

    /// Set the current state to 1 and every other state to 0.
    pub fn stream_state_set(state: &str) {
        for s in STATES {
            STREAM_STATE.with_label_values(&[s]).set(0.0);
        }
        STREAM_STATE.with_label_values(&[state]).set(1.0);
    }

    pub fn stream_reconnect(reason: &str) {
        STREAM_RECONNECT_TOTAL.with_label_values(&[reason]).inc();
    }

    /// Record a subscription filter write and the number of addresses in it.
    pub fn subscription_sent(kind: &str, addresses: usize) {
        SUBSCRIPTION_SENT_TOTAL.with_label_values(&[kind]).inc();
        WATCHED_ADDRESSES.set(addresses as i64);
    }

    pub fn heartbeat(kind: &str) {
        HEARTBEAT_TOTAL.with_label_values(&[kind]).inc();
    }

    pub fn event_received() {
        EVENTS_RECEIVED_TOTAL.inc();
    }

    pub fn classification(outcome: &str) {
        CLASSIFICATION_TOTAL.with_label_values(&[outcome]).inc();
    }

    pub fn dispatch_latency(kind: &str, latency_ms: f64) {
        DISPATCH_LATENCY_MS
            .with_label_values(&[kind])
            .observe(latency_ms);
    }

    pub fn dispatch_failed(target: &str) {
        DISPATCH_FAILURE_TOTAL.with_label_values(&[target]).inc();
    }

    /// Render every registered collector in the Prometheus text format.
    pub fn render() -> TelemetryResult<String> {
        let mut buf = Vec::new();
        TextEncoder::new().encode(&prometheus::gather(), &mut buf)?;
        Ok(String::from_utf8(buf)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_is_exclusive() {
        Metrics::stream_state_set("connecting");
        Metrics::stream_state_set("active");
        assert_eq!(STREAM_STATE.with_label_values(&["active"]).get(), 1.0);
        assert_eq!(STREAM_STATE.with_label_values(&["connecting"]).get(), 0.0);
    }

    #[test]
    fn test_subscription_sent_tracks_addresses() {
        Metrics::subscription_sent("resend", 3);
        assert_eq!(WATCHED_ADDRESSES.get(), 3);
        assert!(SUBSCRIPTION_SENT_TOTAL.with_label_values(&["resend"]).get() >= 1.0);
    }

    #[test]
    fn test_render_contains_metric_names() {
        Metrics::classification("buy");
        Metrics::dispatch_failed("notifier");
        let text = Metrics::render().unwrap();
        assert!(text.contains("pumpwatch_classification_total"));
        assert!(text.contains("pumpwatch_dispatch_failure_total"));
    }
}
