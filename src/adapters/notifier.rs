//! Outbound chat notifications.

use async_trait::async_trait;
use tracing::info;

use crate::error::Result;

/// A chat channel that accepts free-text messages
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    async fn send_message(&self, text: &str) -> Result<()>;
}

/// Writes messages to the log instead of a chat channel (dry runs)
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    fn name(&self) -> &'static str {
        "log"
    }

    async fn send_message(&self, text: &str) -> Result<()> {
        info!("[notify] {}", text);
        Ok(())
    }
}
