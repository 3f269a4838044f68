use async_trait::async_trait;
use serde_json::json;

use super::{preview, AlertChannel};

const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// Sends alerts through the Telegram Bot API `sendMessage` method.
pub struct TelegramChannel {
    client: reqwest::Client,
    api_base: String,
    bot_token: Option<String>,
    chat_id: Option<String>,
}

impl TelegramChannel {
    pub fn new(client: reqwest::Client, bot_token: Option<String>, chat_id: Option<String>) -> Self {
        Self {
            client,
            api_base: TELEGRAM_API_BASE.to_string(),
            bot_token,
            chat_id,
        }
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    async fn post(&self, token: &str, chat_id: &str, message: &str) -> Result<(), reqwest::Error> {
        let url = format!("{}/bot{}/sendMessage", self.api_base.trim_end_matches('/'), token);
        self.client
            .post(url)
            .json(&json!({
                "chat_id": chat_id,
                "text": escape_markdown(message),
                "parse_mode": "Markdown",
            }))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

/// Escape the characters legacy Markdown treats as entity markers. Finding tags
/// and JSON keys carry underscores, and an unpaired one fails the whole message.
fn escape_markdown(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '_' | '*' | '`' | '[') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[async_trait]
impl AlertChannel for TelegramChannel {
    fn name(&self) -> &'static str {
        "telegram"
    }

    async fn send(&self, message: &str) -> bool {
        let (Some(token), Some(chat_id)) = (self.bot_token.as_deref(), self.chat_id.as_deref()) else {
            tracing::info!("Telegram bot token or chat ID not configured, skipping Telegram alert");
            return false;
        };

        match self.post(token, chat_id, message).await {
            Ok(()) => {
                tracing::info!(preview = %preview(message, 50), "Telegram alert sent");
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "Error sending Telegram alert");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::format_alert_message;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_send_succeeds() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/botTOKEN/sendMessage"))
            .and(body_partial_json(json!({"chat_id": "42", "parse_mode": "Markdown"})))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let channel = TelegramChannel::new(
            reqwest::Client::new(),
            Some("TOKEN".to_string()),
            Some("42".to_string()),
        )
        .with_api_base(server.uri());
        assert!(channel.send("hello").await);
    }

    #[test]
    fn test_escape_markdown() {
        assert_eq!(escape_markdown("a_b*c`d[e]"), "a\\_b\\*c\\`d\\[e]");
        assert_eq!(escape_markdown("plain text"), "plain text");
    }

    #[tokio::test]
    async fn test_scam_alert_text_is_escaped() {
        let details = match json!({"hash": "0x1", "interacting_address": "0xbad"}) {
            serde_json::Value::Object(map) => map,
            _ => unreachable!(),
        };
        let message = format_alert_message("interacts_with_known_scam_address", &details);
        assert!(message.contains("Type: interacts_with_known_scam_address"));

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/botTOKEN/sendMessage"))
            .and(body_partial_json(json!({"text": escape_markdown(&message)})))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let channel = TelegramChannel::new(
            reqwest::Client::new(),
            Some("TOKEN".to_string()),
            Some("42".to_string()),
        )
        .with_api_base(server.uri());
        assert!(channel.send(&message).await);

        let escaped = escape_markdown(&message);
        assert!(escaped.contains("Type: interacts\\_with\\_known\\_scam\\_address"));
        assert!(escaped.contains("interacting\\_address"));
        assert!(!escaped.replace("\\_", "").contains('_'));
    }

    #[tokio::test]
    async fn test_http_error_is_reported_as_false() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let channel = TelegramChannel::new(
            reqwest::Client::new(),
            Some("TOKEN".to_string()),
            Some("42".to_string()),
        )
        .with_api_base(server.uri());
        assert!(!channel.send("hello").await);
    }

    #[tokio::test]
    async fn test_missing_chat_id_skips() {
        let channel = TelegramChannel::new(reqwest::Client::new(), Some("TOKEN".to_string()), None);
        assert!(!channel.send("hello").await);
    }
}
