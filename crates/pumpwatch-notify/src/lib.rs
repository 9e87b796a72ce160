//! Alert rendering and delivery.
//!
//! - `AlertTemplate`: renders a `ClassifiedTrade` into the alert text
//! - `TelegramNotifier`: delivers alerts through the Telegram Bot API
//! - `LogNotifier`: writes alerts to the log when no channel is configured

pub mod config;
pub mod log;
pub mod telegram;
pub mod template;

pub use config::NotifyConfig;
pub use log::LogNotifier;
pub use pumpwatch_classifier::NotifyError;
pub use telegram::TelegramNotifier;
pub use template::AlertTemplate;
