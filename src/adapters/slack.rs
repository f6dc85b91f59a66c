//! Slack Web API notifications (`chat.postMessage`)

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, info};

use super::notifier::Notifier;
use crate::error::{Result, SentinelError};

pub const SLACK_API_BASE: &str = "https://slack.com/api";

/// Slack bot client posting to a single channel
#[derive(Clone)]
pub struct SlackNotifier {
    client: Client,
    api_base: String,
    token: String,
    channel: String,
}

#[derive(Serialize)]
struct PostMessage<'a> {
    channel: &'a str,
    text: &'a str,
}

#[derive(Deserialize)]
struct SlackResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

impl SlackNotifier {
    /// Create a notifier from `SLACK_TOKEN`, if set
    pub fn from_env(channel: &str, timeout: Duration) -> Option<Self> {
        std::env::var("SLACK_TOKEN").ok().map(|token| {
            info!("Slack notifications enabled for {}", channel);
            Self::new(token, channel.to_string(), timeout)
        })
    }

    pub fn new(token: String, channel: String, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            api_base: SLACK_API_BASE.to_string(),
            token,
            channel,
        }
    }

    /// Point at a different API host (tests, proxies)
    pub fn with_api_base(mut self, api_base: &str) -> Self {
        self.api_base = api_base.trim_end_matches('/').to_string();
        self
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }
}

#[async_trait]
impl Notifier for SlackNotifier {
    fn name(&self) -> &'static str {
        "slack"
    }

    async fn send_message(&self, text: &str) -> Result<()> {
        let url = format!("{}/chat.postMessage", self.api_base);
        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(&PostMessage {
                channel: &self.channel,
                text,
            })
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            error!("Slack notification failed: {} - {}", status, body);
            return Err(SentinelError::Notification(format!("HTTP {}: {}", status, body)));
        }

        // Slack reports API errors with HTTP 200 and ok=false
        let body: SlackResponse = resp.json().await?;
        if !body.ok {
            let reason = body.error.unwrap_or_else(|| "unknown error".to_string());
            error!("Slack rejected message: {}", reason);
            return Err(SentinelError::Notification(format!("slack: {}", reason)));
        }

        debug!("Slack notification sent to {}", self.channel);
        Ok(())
    }
}
