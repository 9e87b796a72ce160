//! Geyser gRPC subscription stream for pumpwatch.
//!
//! Provides one resilient subscription with:
//! - Full filter resend on every watch-list change (coalesced)
//! - Heartbeat pings on a fixed interval, server pings answered
//! - Automatic reconnection with exponential backoff and jitter
//! - Transport behind a trait so tests can use in-memory channels

pub mod connection;
pub mod error;
pub mod handler;
pub mod heartbeat;
pub mod message;
pub mod transport;

pub use connection::{ConnectionConfig, ConnectionManager, ConnectionState, StreamStatus};
pub use error::{StreamError, StreamResult};
pub use handler::EventHandler;
pub use heartbeat::{Heartbeat, HeartbeatStats};
pub use message::{
    decode_update, is_ping_request, ping_request, subscribe_request, Inbound, HEARTBEAT_PING_ID,
};
pub use transport::{
    EndpointConfig, GeyserConnector, GeyserDuplex, RequestSink, UpdateStream,
    YellowstoneConnector,
};

use std::sync::Once;

static INIT_CRYPTO: Once = Once::new();

/// Install the rustls crypto provider.
/// Must be called before the first TLS connection is opened.
pub fn init_crypto() {
    INIT_CRYPTO.call_once(|| {
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}
