//! Notification configuration.

use serde::{Deserialize, Serialize};

/// Alert delivery settings. Telegram is used when both the bot token and
/// the chat id are set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    #[serde(default)]
    pub telegram_bot_token: Option<String>,
    #[serde(default)]
    pub telegram_chat_id: Option<String>,
    /// Forum topic to post into.
    #[serde(default)]
    pub telegram_thread_id: Option<i64>,
    #[serde(default = "default_telegram_api_base")]
    pub telegram_api_base: String,
    /// Prefix for transaction links; the signature is appended.
    #[serde(default = "default_explorer_base_url")]
    pub explorer_base_url: String,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_telegram_api_base() -> String {
    "https://api.telegram.org".to_string()
}

fn default_explorer_base_url() -> String {
    "https://solscan.io/tx/".to_string()
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            telegram_bot_token: None,
            telegram_chat_id: None,
            telegram_thread_id: None,
            telegram_api_base: default_telegram_api_base(),
            explorer_base_url: default_explorer_base_url(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl NotifyConfig {
    /// Whether Telegram delivery is configured.
    pub fn telegram_enabled(&self) -> bool {
        let set = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
        set(&self.telegram_bot_token) && set(&self.telegram_chat_id)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.telegram_bot_token.is_some() != self.telegram_chat_id.is_some() {
            return Err("telegram_bot_token and telegram_chat_id must be set together".to_string());
        }
        if self.request_timeout_ms == 0 {
            return Err("request_timeout_ms must be positive".to_string());
        }
        Ok(())
    }
}
