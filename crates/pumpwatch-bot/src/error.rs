//! Application error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Configuration load error: {0}")]
    ConfigLoad(#[from] config::ConfigError),

    #[error("Stream error: {0}")]
    Stream(#[from] Box<pumpwatch_stream::StreamError>),

    #[error("Registry error: {0}")]
    Registry(#[from] pumpwatch_registry::RegistryError),

    #[error("Notifier error: {0}")]
    Notify(#[from] pumpwatch_classifier::NotifyError),

    #[error("Telemetry error: {0}")]
    Telemetry(#[from] pumpwatch_telemetry::TelemetryError),

    #[error("Invalid value: {0}")]
    Core(#[from] pumpwatch_core::CoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<pumpwatch_stream::StreamError> for AppError {
    fn from(e: pumpwatch_stream::StreamError) -> Self {
        Self::Stream(Box::new(e))
    }
}

pub type AppResult<T> = Result<T, AppError>;
