//! Outbound alerting for detected findings.
//!
//! Delivery is best-effort: every channel reports a success flag and nothing
//! here returns an error to the caller.

pub mod discord;
pub mod telegram;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::config::AlertConfig;
use crate::detection::types::Details;

pub use discord::DiscordChannel;
pub use telegram::TelegramChannel;

/// A notification channel that accepts a preformatted message.
#[async_trait]
pub trait AlertChannel: Send + Sync {
    fn name(&self) -> &'static str;

    /// Deliver `message`. Returns false if the channel is unconfigured or delivery failed.
    async fn send(&self, message: &str) -> bool;
}

/// Per-channel delivery results for one alert.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DispatchOutcome {
    pub deliveries: Vec<ChannelDelivery>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChannelDelivery {
    pub channel: &'static str,
    pub delivered: bool,
}

impl DispatchOutcome {
    pub fn any_delivered(&self) -> bool {
        self.deliveries.iter().any(|d| d.delivered)
    }
}

/// Fans an alert out to every registered channel concurrently.
#[derive(Default)]
pub struct AlertDispatcher {
    channels: Vec<Box<dyn AlertChannel>>,
}

impl AlertDispatcher {
    pub fn new(channels: Vec<Box<dyn AlertChannel>>) -> Self {
        Self { channels }
    }

    /// Telegram and Discord channels built from config.
    pub fn from_config(config: &AlertConfig, client: reqwest::Client) -> Self {
        let telegram = TelegramChannel::new(
            client.clone(),
            config.telegram_bot_token.clone(),
            config.telegram_chat_id.clone(),
        );
        let discord = DiscordChannel::new(client, config.discord_webhook_url.clone());
        Self::new(vec![Box::new(telegram), Box::new(discord)])
    }

    pub async fn dispatch(&self, finding_type: &str, details: &Details) -> DispatchOutcome {
        let message = format_alert_message(finding_type, details);

        let results = futures::future::join_all(self.channels.iter().map(|channel| {
            let message = message.as_str();
            async move {
                ChannelDelivery {
                    channel: channel.name(),
                    delivered: channel.send(message).await,
                }
            }
        }))
        .await;

        let outcome = DispatchOutcome { deliveries: results };
        if outcome.any_delivered() {
            tracing::info!(finding_type, "Alert dispatched successfully to one or more channels");
        } else {
            tracing::warn!(finding_type, "Failed to dispatch alert to any channel");
        }
        outcome
    }
}

/// Plain-text alert body shared by all channels.
pub fn format_alert_message(finding_type: &str, details: &Details) -> String {
    let mut message = format!("🚨 Suspicious Activity Detected! 🚨\nType: {}\n", finding_type);

    if let Some(hash) = details.get("hash") {
        message.push_str(&format!("Transaction Hash: {}\n", display_value(hash)));
    }
    if let Some(address) = details.get("address") {
        message.push_str(&format!("Address: {}\n", display_value(address)));
    }
    if let (Some(from), Some(to), Some(value)) = (
        details.get("from"),
        details.get("to"),
        details.get("value_eth").and_then(Value::as_f64),
    ) {
        message.push_str(&format!(
            "From: {}\nTo: {}\nValue: {:.2} ETH\n",
            display_value(from),
            display_value(to),
            value
        ));
    }
    if let Some(reason) = details.get("reason") {
        message.push_str(&format!("Reason: {}\n", display_value(reason)));
    }
    if let Some(chain) = details.get("chain") {
        message.push_str(&format!("Chain: {}\n", display_value(chain).to_uppercase()));
    }

    message.push_str(&format!("\nDetails: {}", Value::Object(details.clone())));
    message
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// First `max` characters of a message, for log lines.
pub(crate) fn preview(message: &str, max: usize) -> String {
    message.chars().take(max).collect()
}
