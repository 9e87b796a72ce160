//! Stream error types.

use pumpwatch_registry::RegistryError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StreamError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Stream status: {0}")]
    Status(#[from] tonic::Status),

    #[error("Stream ended by server")]
    StreamEnded,

    #[error("Send failed: {0}")]
    Send(String),

    #[error("Registry snapshot failed: {0}")]
    Registry(#[from] RegistryError),

    #[error("Gave up after {attempts} consecutive reconnect attempts")]
    RetriesExhausted { attempts: u32 },

    #[error("Client builder error: {0}")]
    Builder(#[from] yellowstone_grpc_client::GeyserGrpcBuilderError),

    #[error("Session task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl StreamError {
    /// Short reason label for metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Transport(_) => "transport",
            Self::Status(_) => "status",
            Self::StreamEnded => "ended",
            Self::Send(_) => "send",
            Self::Registry(_) => "registry",
            Self::RetriesExhausted { .. } => "exhausted",
            Self::Builder(_) => "builder",
            Self::Join(_) => "join",
        }
    }
}

pub type StreamResult<T> = Result<T, StreamError>;
