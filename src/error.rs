use thiserror::Error;

/// Main error type for the signal sentinel
#[derive(Error, Debug)]
pub enum SentinelError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // Network errors
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    // Serialization errors
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    // Market data errors
    #[error("Invalid market data: {0}")]
    InvalidMarketData(String),

    // Detector errors
    #[error("Signal detector has been stopped")]
    DetectorStopped,

    // Notification errors
    #[error("Notification failed: {0}")]
    Notification(String),

    #[error("Notification timed out after {0}ms")]
    NotificationTimeout(u64),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Generic errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

/// Result type alias for SentinelError
pub type Result<T> = std::result::Result<T, SentinelError>;
