//! Incoming-webhook notifications (Slack incoming webhooks, Feishu/Lark bots)

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use tracing::{debug, error, info};

use super::notifier::Notifier;
use crate::error::{Result, SentinelError};

/// Payload shape the webhook expects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WebhookFormat {
    /// `{"text": ...}`
    #[default]
    Slack,
    /// `{"msg_type": "text", "content": {"text": ...}}`
    Feishu,
}

impl WebhookFormat {
    pub fn payload(&self, text: &str) -> serde_json::Value {
        match self {
            WebhookFormat::Slack => json!({ "text": text }),
            WebhookFormat::Feishu => json!({
                "msg_type": "text",
                "content": { "text": text },
            }),
        }
    }
}

/// Webhook notification client
#[derive(Clone)]
pub struct WebhookNotifier {
    client: Client,
    webhook_url: String,
    format: WebhookFormat,
}

impl WebhookNotifier {
    /// Create a notifier from `SENTINEL_WEBHOOK_URL`, if set
    pub fn from_env(format: WebhookFormat, timeout: Duration) -> Option<Self> {
        std::env::var("SENTINEL_WEBHOOK_URL").ok().map(|url| {
            info!("Webhook notifications enabled ({:?})", format);
            Self::new(url, format, timeout)
        })
    }

    pub fn new(webhook_url: String, format: WebhookFormat, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            webhook_url,
            format,
        }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    fn name(&self) -> &'static str {
        "webhook"
    }

    async fn send_message(&self, text: &str) -> Result<()> {
        let resp = self
            .client
            .post(&self.webhook_url)
            .json(&self.format.payload(text))
            .send()
            .await?;

        if resp.status().is_success() {
            debug!("Webhook notification sent successfully");
            Ok(())
        } else {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            error!("Webhook notification failed: {} - {}", status, body);
            Err(SentinelError::Notification(format!("HTTP {}: {}", status, body)))
        }
    }
}
