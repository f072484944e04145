//! Chat webhook notifier

use async_trait::async_trait;
use fleetcheck_core::{Error, Notifier, Result};
use serde::Serialize;
use tracing::{debug, info};

/// Display name used when none is configured
pub const DEFAULT_USERNAME: &str = "Device Monitor";

/// Icon used when none is configured
pub const DEFAULT_ICON_EMOJI: &str = ":robot_face:";

/// Body posted to the webhook
#[derive(Debug, Serialize)]
struct WebhookPayload<'a> {
    channel: &'a str,
    text: &'a str,
    username: &'a str,
    icon_emoji: &'a str,
}

/// Posts reports to a Slack-compatible incoming webhook
#[derive(Debug, Clone)]
pub struct SlackNotifier {
    http: reqwest::Client,
    webhook_url: String,
    channel: String,
    username: String,
    icon_emoji: String,
}

impl SlackNotifier {
    pub fn new(
        http: reqwest::Client,
        webhook_url: impl Into<String>,
        channel: impl Into<String>,
    ) -> Self {
        Self {
            http,
            webhook_url: webhook_url.into(),
            channel: channel.into(),
            username: DEFAULT_USERNAME.to_string(),
            icon_emoji: DEFAULT_ICON_EMOJI.to_string(),
        }
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = username.into();
        self
    }

    pub fn with_icon_emoji(mut self, icon_emoji: impl Into<String>) -> Self {
        self.icon_emoji = icon_emoji.into();
        self
    }
}

#[async_trait]
impl Notifier for SlackNotifier {
    async fn notify(&self, message: &str) -> Result<()> {
        let payload = WebhookPayload {
            channel: &self.channel,
            text: message,
            username: &self.username,
            icon_emoji: &self.icon_emoji,
        };
        debug!(channel = %self.channel, bytes = message.len(), "Posting report");

        let response = self
            .http
            .post(&self.webhook_url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| Error::delivery(None, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::delivery(
                Some(status.as_u16()),
                format!("webhook responded with status {}", status.as_u16()),
            ));
        }

        info!(channel = %self.channel, "Message sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_shape() {
        let payload = WebhookPayload {
            channel: "C123",
            text: "hello",
            username: DEFAULT_USERNAME,
            icon_emoji: DEFAULT_ICON_EMOJI,
        };
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "channel": "C123",
                "text": "hello",
                "username": "Device Monitor",
                "icon_emoji": ":robot_face:"
            })
        );
    }
}
