//! Telegram Bot API notifier.

use crate::config::NotifyConfig;
use pumpwatch_classifier::{BoxFuture, Notifier, NotifyError};
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    message_thread_id: Option<i64>,
    disable_web_page_preview: bool,
}

/// Sends alerts with `sendMessage`.
pub struct TelegramNotifier {
    client: Client,
    /// `<api_base>/bot<token>/sendMessage`
    send_url: String,
    chat_id: String,
    thread_id: Option<i64>,
}

impl TelegramNotifier {
    /// Build from config. Fails when the bot token or chat id is missing.
    pub fn new(config: &NotifyConfig) -> Result<Self, NotifyError> {
        let token = config
            .telegram_bot_token
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| NotifyError::NotConfigured("telegram_bot_token".to_string()))?;
        let chat_id = config
            .telegram_chat_id
            .as_deref()
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| NotifyError::NotConfigured("telegram_chat_id".to_string()))?;

        let client = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(|e| NotifyError::Http(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            send_url: format!(
                "{}/bot{}/sendMessage",
                config.telegram_api_base.trim_end_matches('/'),
                token
            ),
            chat_id: chat_id.to_string(),
            thread_id: config.telegram_thread_id,
        })
    }

    async fn send(&self, text: String) -> Result<(), NotifyError> {
        let request = SendMessageRequest {
            chat_id: &self.chat_id,
            text: &text,
            message_thread_id: self.thread_id,
            disable_web_page_preview: true,
        };

        let response = self
            .client
            .post(&self.send_url)
            .json(&request)
            .send()
            .await
            .map_err(|e| NotifyError::Http(format!("HTTP request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        debug!(chat_id = %self.chat_id, "Alert delivered to Telegram");
        Ok(())
    }
}

impl Notifier for TelegramNotifier {
    fn deliver(&self, message: String) -> BoxFuture<'_, Result<(), NotifyError>> {
        Box::pin(self.send(message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_requires_credentials() {
        let err = TelegramNotifier::new(&NotifyConfig::default()).err().unwrap();
        assert!(matches!(err, NotifyError::NotConfigured(field) if field == "telegram_bot_token"));

        let config = NotifyConfig {
            telegram_bot_token: Some("123:abc".to_string()),
            telegram_chat_id: Some("  ".to_string()),
            ..Default::default()
        };
        let err = TelegramNotifier::new(&config).err().unwrap();
        assert!(matches!(err, NotifyError::NotConfigured(field) if field == "telegram_chat_id"));
    }

    #[test]
    fn test_send_url() {
        let config = NotifyConfig {
            telegram_bot_token: Some("123:abc".to_string()),
            telegram_chat_id: Some("-100200".to_string()),
            telegram_api_base: "https://api.telegram.org/".to_string(),
            ..Default::default()
        };
        let notifier = TelegramNotifier::new(&config).unwrap();
        assert_eq!(
            notifier.send_url,
            "https://api.telegram.org/bot123:abc/sendMessage"
        );
    }

    #[test]
    fn test_request_omits_missing_thread() {
        let request = SendMessageRequest {
            chat_id: "-100200",
            text: "hi",
            message_thread_id: None,
            disable_web_page_preview: true,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["chat_id"], "-100200");
        assert!(json.get("message_thread_id").is_none());
    }
}
