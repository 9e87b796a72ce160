//! Session heartbeat.
//!
//! One `Heartbeat` lives inside each session and is dropped with it, so a
//! dead connection never keeps a timer running.

use chrono::{DateTime, Utc};
use std::time::Duration;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tracing::debug;

/// Keepalive timer and ping/pong bookkeeping for one session.
pub struct Heartbeat {
    interval: Interval,
    last_ping: Option<DateTime<Utc>>,
    last_pong: Option<DateTime<Utc>>,
    pings_sent: u64,
}

impl Heartbeat {
    /// First tick fires one full period after creation.
    pub fn new(interval_ms: u64) -> Self {
        let period = Duration::from_millis(interval_ms.max(1));
        let mut interval = interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self {
            interval,
            last_ping: None,
            last_pong: None,
            pings_sent: 0,
        }
    }

    /// Wait for the next keepalive slot.
    pub async fn tick(&mut self) {
        self.interval.tick().await;
    }

    /// Record that a keepalive frame was written.
    pub fn record_ping(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        self.last_ping = Some(now);
        self.pings_sent += 1;
        now
    }

    /// Record a pong from the server.
    pub fn record_pong(&mut self) {
        let now = Utc::now();
        self.last_pong = Some(now);
        if let Some(ping_time) = self.last_ping {
            let rtt_ms = (now - ping_time).num_milliseconds();
            debug!(rtt_ms, "Received pong");
        }
    }

    pub fn stats(&self) -> HeartbeatStats {
        HeartbeatStats {
            last_ping: self.last_ping,
            last_pong: self.last_pong,
            pings_sent: self.pings_sent,
        }
    }
}

/// Heartbeat statistics.
#[derive(Debug, Clone, Default)]
pub struct HeartbeatStats {
    pub last_ping: Option<DateTime<Utc>>,
    pub last_pong: Option<DateTime<Utc>>,
    pub pings_sent: u64,
}
