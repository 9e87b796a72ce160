//! Prometheus metrics and structured logging for pumpwatch.
//!
//! Provides:
//! - Prometheus collectors for the stream and the classifier
//! - Structured logging with tracing (JSON in production)

pub mod error;
pub mod logging;
pub mod metrics;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::{init_logging, DEFAULT_LOG_FILTER};
pub use metrics::Metrics;
