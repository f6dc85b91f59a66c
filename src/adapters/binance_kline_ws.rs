//! Binance WebSocket adapter for kline (candlestick) streams.
//!
//! Publishes every parsed candle, open or closed, on a broadcast channel.
//! Reconnects with capped backoff; subscribers keep their state across
//! reconnects since the channel outlives each connection.

use chrono::{DateTime, Utc};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::interval;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::domain::candle::validate_close;
use crate::domain::PriceCandle;
use crate::error::{Result, SentinelError};

/// Binance raw stream endpoint
pub const BINANCE_WS_URL: &str = "wss://stream.binance.com:9443/ws";

/// How often to send ping frames
const PING_INTERVAL_SECS: u64 = 30;

/// Maximum reconnection delay
const MAX_RECONNECT_DELAY_SECS: u64 = 60;

const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Update broadcast channel capacity
const CHANNEL_CAPACITY: usize = 1000;

/// What the stream task publishes
#[derive(Debug, Clone)]
pub enum StreamEvent {
    /// A connection (or reconnection) was established
    Connected { attempt: u32 },
    Candle(PriceCandle),
    /// The current connection ended; a reconnect follows
    Disconnected,
}

#[derive(Debug, Deserialize)]
struct CombinedStream<T> {
    #[allow(dead_code)]
    stream: String,
    data: T,
}

#[derive(Debug, Deserialize)]
struct KlineEvent {
    #[serde(rename = "s", default)]
    symbol: Option<String>,
    #[serde(rename = "k")]
    kline: KlineData,
}

/// Only `x` and `c` are required; the rest is context when present.
#[derive(Debug, Deserialize)]
struct KlineData {
    #[serde(rename = "x")]
    is_closed: bool,
    #[serde(rename = "c")]
    close: serde_json::Value,
    #[serde(rename = "i", default)]
    interval: Option<String>,
    #[serde(rename = "T", default)]
    close_time: Option<i64>,
    #[serde(rename = "s", default)]
    symbol: Option<String>,
}

/// Parse a raw or combined-stream kline message into a candle.
pub fn parse_kline_message(text: &str) -> Result<PriceCandle> {
    let event = match serde_json::from_str::<CombinedStream<KlineEvent>>(text) {
        Ok(wrapper) => wrapper.data,
        Err(_) => serde_json::from_str::<KlineEvent>(text).map_err(|e| {
            SentinelError::InvalidMarketData(format!("not a kline message: {}", e))
        })?,
    };

    let close = match &event.kline.close {
        serde_json::Value::String(raw) => PriceCandle::parse_close(raw)?,
        serde_json::Value::Number(n) => {
            let close = n.as_f64().ok_or_else(|| {
                SentinelError::InvalidMarketData(format!("close price {} out of range", n))
            })?;
            validate_close(close)?;
            close
        }
        other => {
            return Err(SentinelError::InvalidMarketData(format!(
                "close price {} is not numeric",
                other
            )))
        }
    };

    let mut candle = PriceCandle::new(close, event.kline.is_closed)?;
    if let Some(symbol) = event.symbol.or(event.kline.symbol) {
        candle = candle.with_symbol(symbol);
    }
    if let Some(interval) = event.kline.interval {
        candle = candle.with_interval(interval);
    }
    if let Some(close_time) = event.kline.close_time.and_then(DateTime::<Utc>::from_timestamp_millis) {
        candle = candle.with_close_time(close_time);
    }
    Ok(candle)
}

/// Binance WebSocket client for one kline stream.
pub struct BinanceKlineWebSocket {
    base_url: String,
    symbol: String,
    interval: String,
    update_tx: broadcast::Sender<StreamEvent>,
    reconnect_delay: Duration,
}

impl BinanceKlineWebSocket {
    /// Create a new client.
    ///
    /// # Arguments
    /// * `base_url` - Raw stream endpoint, e.g. [`BINANCE_WS_URL`]
    /// * `symbol` - Trading pair like "BTCUSDT"
    /// * `interval` - Binance interval like "1m" or "4h"
    pub fn new(base_url: &str, symbol: &str, interval: &str) -> Self {
        let (update_tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            symbol: symbol.to_string(),
            interval: interval.to_string(),
            update_tx,
            reconnect_delay: Duration::from_secs(1),
        }
    }

    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StreamEvent> {
        self.update_tx.subscribe()
    }

    pub fn stream_url(&self) -> String {
        format!(
            "{}/{}@kline_{}",
            self.base_url,
            self.symbol.to_lowercase(),
            self.interval
        )
    }

    /// Run forever, reconnecting on errors. Abort the task to stop it.
    pub async fn run(&self) -> Result<()> {
        let mut attempt: u32 = 0;
        let max_delay = Duration::from_secs(MAX_RECONNECT_DELAY_SECS);

        info!(
            "Starting Binance kline WS for {} {}",
            self.symbol, self.interval
        );

        loop {
            match self.connect_and_stream(attempt).await {
                Ok(()) => {
                    info!("Binance kline WS connection closed normally");
                    attempt = 0;
                }
                Err(e) => {
                    attempt = attempt.saturating_add(1);
                    error!("Binance kline WS error (attempt {}): {}", attempt, e);
                }
            }
            let _ = self.update_tx.send(StreamEvent::Disconnected);

            let delay = backoff_delay(self.reconnect_delay, attempt, max_delay);
            info!(
                "Reconnecting to Binance kline WS in {:?} (attempt {})",
                delay,
                attempt + 1
            );
            tokio::time::sleep(delay).await;
        }
    }

    async fn connect_and_stream(&self, attempt: u32) -> Result<()> {
        let url = Url::parse(&self.stream_url())
            .map_err(|e| SentinelError::Internal(format!("Invalid WebSocket URL: {}", e)))?;

        info!("Connecting to Binance kline WS: {}", url);
        let (ws_stream, _) =
            tokio::time::timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS), connect_async(url.as_str()))
                .await
                .map_err(|_| SentinelError::Internal("WebSocket connection timeout".to_string()))?
                .map_err(SentinelError::WebSocket)?;
        info!("Connected to Binance kline WS");
        let _ = self.update_tx.send(StreamEvent::Connected { attempt });

        let (mut write, mut read) = ws_stream.split();
        let mut ping_interval = interval(Duration::from_secs(PING_INTERVAL_SECS));

        loop {
            tokio::select! {
                msg = read.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            self.handle_message(&text);
                        }
                        Some(Ok(Message::Ping(data))) => {
                            if let Err(e) = write.send(Message::Pong(data)).await {
                                error!("Failed to send pong: {}", e);
                            }
                        }
                        Some(Ok(Message::Close(_))) => {
                            info!("Received close frame from Binance");
                            break;
                        }
                        Some(Err(e)) => {
                            return Err(SentinelError::WebSocket(e));
                        }
                        None => {
                            info!("Binance kline WS stream ended");
                            break;
                        }
                        _ => {}
                    }
                }
                _ = ping_interval.tick() => {
                    if let Err(e) = write.send(Message::Ping(vec![])).await {
                        error!("Failed to send ping: {}", e);
                        break;
                    }
                    debug!("Sent ping to Binance (kline WS)");
                }
            }
        }

        Ok(())
    }

    fn handle_message(&self, text: &str) {
        match parse_kline_message(text) {
            Ok(candle) => {
                // No receivers is fine: nobody listening yet
                let _ = self.update_tx.send(StreamEvent::Candle(candle));
            }
            Err(e) => {
                let preview: String = text.chars().take(120).collect();
                warn!("Dropping kline message ({}): {}", e, preview);
            }
        }
    }
}

/// Linear backoff (at least one `base`) capped at `max`, plus up to 25% jitter.
fn backoff_delay(base: Duration, attempt: u32, max: Duration) -> Duration {
    let delay = (base * attempt.clamp(1, 10)).min(max);

    let jitter_range = delay.as_millis() as u64 / 4;
    let seed = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos() as u64;
    delay + Duration::from_millis(seed % jitter_range.max(1))
}
