//! Alert message template.

use chrono::{DateTime, Local, TimeZone};
use pumpwatch_classifier::AlertFormatter;
use pumpwatch_core::{ClassifiedTrade, TradeKind, SOL_DISPLAY_DECIMALS};

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Renders classified trades into multi-line alert text.
#[derive(Debug, Clone)]
pub struct AlertTemplate {
    explorer_base_url: String,
}

impl AlertTemplate {
    pub fn new(explorer_base_url: impl Into<String>) -> Self {
        Self {
            explorer_base_url: explorer_base_url.into(),
        }
    }

    /// Render with an explicit timestamp.
    pub fn render<Tz: TimeZone>(&self, trade: &ClassifiedTrade, at: &DateTime<Tz>) -> String
    where
        Tz::Offset: std::fmt::Display,
    {
        let (marker, action) = match trade.kind {
            TradeKind::Buy => ("🟢", "BUY 🟢"),
            TradeKind::Sell => ("🔴", "SELL 🔴"),
        };
        let sol = format!(
            "{:.prec$}",
            trade.sol_delta.inner(),
            prec = SOL_DISPLAY_DECIMALS as usize
        );

        format!(
            "🔔 {marker} ━━ Smart wallet alert ━━\n\
             👤 Trader: {label} ({address})\n\
             💫 Action: {action}\n\
             💰 Amount: {sol} SOL\n\
             💎 Token mint: {mint}\n\
             💎 Token amount: {tokens}\n\
             🎯 Transaction\n\
             ├─ Signature: {signature}\n\
             ├─ Slot: {slot}\n\
             └─ Time: {time}\n\
             🌐 Explorer: {explorer}{signature}",
            label = trade.actor_display(),
            address = trade.actor_address,
            mint = trade.token_mint,
            tokens = trade.token_delta,
            signature = trade.signature,
            slot = trade.slot,
            time = at.format(TIME_FORMAT),
            explorer = self.explorer_base_url,
        )
    }
}

impl AlertFormatter for AlertTemplate {
    fn format(&self, trade: &ClassifiedTrade) -> String {
        self.render(trade, &Local::now())
    }
}
