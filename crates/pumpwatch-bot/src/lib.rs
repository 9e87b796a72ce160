//! pump.fun smart-wallet tracker.
//!
//! Main application that orchestrates all components:
//! - Watch-list file with change notifications
//! - Geyser subscription stream
//! - Buy/sell classification
//! - Telegram alerts and dry-run buy mirroring
//! - Prometheus scrape endpoint

pub mod app;
pub mod commands;
pub mod config;
pub mod error;
pub mod mirror;
pub mod server;

pub use app::Application;
pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use mirror::DryRunExecutor;
