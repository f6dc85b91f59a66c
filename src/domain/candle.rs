use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SentinelError};

/// One interval of market data, as far as the detector cares about it.
///
/// Only the close and the closed flag drive the oscillator; the rest is
/// context carried into notifications and logs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceCandle {
    pub close: f64,
    /// Whether the interval has finished and `close` is final
    pub is_closed: bool,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub interval: Option<String>,
    #[serde(default)]
    pub close_time: Option<DateTime<Utc>>,
}

impl PriceCandle {
    /// Create a candle, rejecting closes that would corrupt the oscillator.
    pub fn new(close: f64, is_closed: bool) -> Result<Self> {
        validate_close(close)?;
        Ok(Self {
            close,
            is_closed,
            symbol: None,
            interval: None,
            close_time: None,
        })
    }

    /// Shorthand for a finished candle
    pub fn closed(close: f64) -> Result<Self> {
        Self::new(close, true)
    }

    /// Shorthand for an intra-interval update
    pub fn open(close: f64) -> Result<Self> {
        Self::new(close, false)
    }

    pub fn with_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.symbol = Some(symbol.into());
        self
    }

    pub fn with_interval(mut self, interval: impl Into<String>) -> Self {
        self.interval = Some(interval.into());
        self
    }

    pub fn with_close_time(mut self, close_time: DateTime<Utc>) -> Self {
        self.close_time = Some(close_time);
        self
    }

    /// Parse a close price delivered as a numeric string (Binance `k.c`).
    pub fn parse_close(raw: &str) -> Result<f64> {
        let close = raw.trim().parse::<f64>().map_err(|e| {
            SentinelError::InvalidMarketData(format!("close price '{}' is not a number: {}", raw, e))
        })?;
        validate_close(close)?;
        Ok(close)
    }
}

pub(crate) fn validate_close(close: f64) -> Result<()> {
    if !close.is_finite() {
        return Err(SentinelError::InvalidMarketData(format!(
            "close price {} is not finite",
            close
        )));
    }
    if close <= 0.0 {
        return Err(SentinelError::InvalidMarketData(format!(
            "close price {} must be positive",
            close
        )));
    }
    Ok(())
}
