use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::adapters::{WebhookFormat, BINANCE_WS_URL};
use crate::indicators::IndicatorKind;
use crate::strategy::DetectorConfig;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub stream: StreamConfig,
    #[serde(default)]
    pub detector: DetectorConfig,
    #[serde(default)]
    pub notifier: NotifierConfig,
    #[serde(default)]
    pub dispatch: DispatchConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StreamConfig {
    /// Raw WebSocket endpoint for market data
    #[serde(default = "default_ws_url")]
    pub ws_url: String,
    /// Trading pair (e.g., "BTCUSDT")
    #[serde(default = "default_symbol")]
    pub symbol: String,
    /// Kline interval (e.g., "1m", "4h")
    #[serde(default = "default_interval")]
    pub interval: String,
    /// Base reconnect delay in milliseconds
    #[serde(default = "default_reconnect_delay")]
    pub reconnect_delay_ms: u64,
}

fn default_ws_url() -> String {
    BINANCE_WS_URL.to_string()
}

fn default_symbol() -> String {
    "BTCUSDT".to_string()
}

fn default_interval() -> String {
    "1m".to_string()
}

fn default_reconnect_delay() -> u64 {
    1000
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            ws_url: default_ws_url(),
            symbol: default_symbol(),
            interval: default_interval(),
            reconnect_delay_ms: default_reconnect_delay(),
        }
    }
}

impl StreamConfig {
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum NotifierKind {
    /// Log messages only (dry run)
    #[default]
    Log,
    /// Slack `chat.postMessage`, token from `SLACK_TOKEN`
    Slack,
    /// Incoming webhook, URL from `SENTINEL_WEBHOOK_URL`
    Webhook,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotifierConfig {
    #[serde(default)]
    pub kind: NotifierKind,
    /// Slack channel (e.g., "#btc-4hr")
    #[serde(default = "default_channel")]
    pub channel: String,
    #[serde(default)]
    pub webhook_format: WebhookFormat,
    /// Send a message when the stream first connects
    #[serde(default = "default_true")]
    pub announce_startup: bool,
    /// Per-message send timeout in milliseconds
    #[serde(default = "default_send_timeout")]
    pub timeout_ms: u64,
}

fn default_channel() -> String {
    "#rsi-alerts".to_string()
}

fn default_true() -> bool {
    true
}

fn default_send_timeout() -> u64 {
    5000
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            kind: NotifierKind::Log,
            channel: default_channel(),
            webhook_format: WebhookFormat::default(),
            announce_startup: true,
            timeout_ms: default_send_timeout(),
        }
    }
}

impl NotifierConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DispatchConfig {
    /// Bounded notification queue size; signals beyond it are dropped
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    /// How long shutdown waits for queued messages
    #[serde(default = "default_drain_timeout")]
    pub drain_timeout_ms: u64,
}

fn default_queue_capacity() -> usize {
    64
}

fn default_drain_timeout() -> u64 {
    10_000
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            queue_capacity: default_queue_capacity(),
            drain_timeout_ms: default_drain_timeout(),
        }
    }
}

impl DispatchConfig {
    pub fn drain_timeout(&self) -> Duration {
        Duration::from_millis(self.drain_timeout_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Enable JSON formatted logs
    #[serde(default)]
    pub json: bool,
    /// Directory for daily rolling log files; console only when unset
    #[serde(default)]
    pub dir: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
            dir: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from files and environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration from a specific directory
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();

        let builder = Config::builder()
            // Start with default config
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // Environment-specific overrides (e.g., config/production.toml)
            .add_source(
                File::from(config_dir.join(
                    std::env::var("SENTINEL_ENV").unwrap_or_else(|_| "development".to_string()),
                ))
                .required(false),
            )
            // Environment variables (SENTINEL_STREAM__SYMBOL, etc.)
            .add_source(
                Environment::with_prefix("SENTINEL")
                    .separator("__")
                    .try_parsing(true),
            );

        builder.build()?.try_deserialize()
    }

    /// Load a single config file, then apply environment overrides
    pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(
                Environment::with_prefix("SENTINEL")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    /// Detector settings with the stream symbol as fallback label
    pub fn detector_config(&self) -> DetectorConfig {
        let mut detector = self.detector.clone();
        if detector.symbol.is_none() {
            detector.symbol = Some(self.stream.symbol.to_uppercase());
        }
        detector
    }

    /// One-line description used in startup logs and notifications
    pub fn summary(&self) -> String {
        let indicator = &self.detector.indicator;
        let label = match indicator.kind {
            IndicatorKind::Rsi => format!("RSI({})", indicator.period),
            IndicatorKind::StochRsi => format!(
                "StochRSI({},{},{})",
                indicator.period, indicator.fastk_period, indicator.fastd_period
            ),
        };
        format!(
            "{} {} | {} | oversold < {} | overbought > {} | policy {:?}",
            self.stream.symbol.to_uppercase(),
            self.stream.interval,
            label,
            self.detector.thresholds.oversold,
            self.detector.thresholds.overbought,
            self.detector.policy
        )
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.stream.symbol.trim().is_empty() {
            errors.push("stream.symbol must not be empty".to_string());
        }
        if self.stream.interval.trim().is_empty() {
            errors.push("stream.interval must not be empty".to_string());
        }
        if url::Url::parse(&self.stream.ws_url).is_err() {
            errors.push(format!("stream.ws_url is not a valid URL: {}", self.stream.ws_url));
        }

        if let Err(e) = self.detector.indicator.validate() {
            errors.push(e.to_string());
        }
        if let Err(e) = self.detector.thresholds.validate() {
            errors.push(e.to_string());
        }

        if self.dispatch.queue_capacity == 0 {
            errors.push("dispatch.queue_capacity must be at least 1".to_string());
        }
        if self.notifier.timeout_ms == 0 {
            errors.push("notifier.timeout_ms must be positive".to_string());
        }
        if self.notifier.kind == NotifierKind::Slack && self.notifier.channel.trim().is_empty() {
            errors.push("notifier.channel is required for slack".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
