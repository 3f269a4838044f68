use async_trait::async_trait;
use serde_json::json;

use super::{preview, AlertChannel};

/// Posts alerts to a Discord webhook.
pub struct DiscordChannel {
    client: reqwest::Client,
    webhook_url: Option<String>,
}

impl DiscordChannel {
    pub fn new(client: reqwest::Client, webhook_url: Option<String>) -> Self {
        Self { client, webhook_url }
    }
}

#[async_trait]
impl AlertChannel for DiscordChannel {
    fn name(&self) -> &'static str {
        "discord"
    }

    async fn send(&self, message: &str) -> bool {
        let Some(url) = self.webhook_url.as_deref() else {
            tracing::info!("Discord webhook URL not configured, skipping Discord alert");
            return false;
        };

        let response = self
            .client
            .post(url)
            .json(&json!({ "content": message }))
            .send()
            .await
            .and_then(|r| r.error_for_status());

        match response {
            Ok(_) => {
                tracing::info!(preview = %preview(message, 50), "Discord alert sent");
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "Error sending Discord alert");
                false
            }
        }
    }
}
