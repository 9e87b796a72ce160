//! Duplex transport to the geyser server.
//!
//! The connection manager only sees a boxed request sink and update stream,
//! so tests can drive it with in-memory channels.

use crate::error::{StreamError, StreamResult};
use futures_util::{Sink, SinkExt, Stream};
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use tonic::transport::channel::ClientTlsConfig;
use tracing::info;
use yellowstone_grpc_client::GeyserGrpcClient;
use yellowstone_grpc_proto::prelude::{SubscribeRequest, SubscribeUpdate};

/// Boxed future for dyn-compatible async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Outbound half: subscribe requests and keepalive frames.
pub type RequestSink = Pin<Box<dyn Sink<SubscribeRequest, Error = StreamError> + Send>>;

/// Inbound half: server updates.
pub type UpdateStream =
    Pin<Box<dyn Stream<Item = Result<SubscribeUpdate, tonic::Status>> + Send>>;

/// One open subscription stream.
pub struct GeyserDuplex {
    pub sink: RequestSink,
    pub stream: UpdateStream,
}

/// Opens duplex subscription streams.
pub trait GeyserConnector: Send + Sync {
    /// Open a fresh connection. Every call yields an independent stream.
    fn connect(&self) -> BoxFuture<'_, StreamResult<GeyserDuplex>>;
}

/// Endpoint settings for [`YellowstoneConnector`].
#[derive(Debug, Clone)]
pub struct EndpointConfig {
    pub endpoint: String,
    pub x_token: Option<String>,
    pub connect_timeout_ms: u64,
    pub request_timeout_ms: u64,
    pub max_decoding_message_size: usize,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            x_token: None,
            connect_timeout_ms: 10_000,
            request_timeout_ms: 10_000,
            max_decoding_message_size: 1024 * 1024 * 1024,
        }
    }
}

/// Yellowstone gRPC connector over TLS with native roots.
pub struct YellowstoneConnector {
    config: EndpointConfig,
}

impl YellowstoneConnector {
    pub fn new(config: EndpointConfig) -> Self {
        Self { config }
    }

    async fn open(&self) -> StreamResult<GeyserDuplex> {
        info!(endpoint = %self.config.endpoint, "Connecting to geyser");

        let mut builder = GeyserGrpcClient::build_from_shared(self.config.endpoint.clone())?
            .connect_timeout(Duration::from_millis(self.config.connect_timeout_ms))
            .timeout(Duration::from_millis(self.config.request_timeout_ms))
            .tls_config(ClientTlsConfig::new().with_native_roots())?
            .max_decoding_message_size(self.config.max_decoding_message_size)
            .tcp_nodelay(true);

        if let Some(token) = &self.config.x_token {
            builder = builder.x_token(Some(token.clone()))?;
        }

        let mut client = builder
            .connect()
            .await
            .map_err(|e| StreamError::Transport(e.to_string()))?;
        let (sink, stream) = client
            .subscribe()
            .await
            .map_err(|e| StreamError::Transport(e.to_string()))?;

        Ok(GeyserDuplex {
            sink: Box::pin(sink.sink_map_err(|e| StreamError::Send(e.to_string()))),
            stream: Box::pin(stream),
        })
    }
}

impl GeyserConnector for YellowstoneConnector {
    fn connect(&self) -> BoxFuture<'_, StreamResult<GeyserDuplex>> {
        Box::pin(self.open())
    }
}
