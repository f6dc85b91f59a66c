//! Runtime wiring: kline stream -> detector -> notification queue.

use std::future::Future;
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, error, info, warn};

use super::dispatcher::{spawn_dispatcher, DispatchHandle, DispatchStats, Notification};
use crate::adapters::{BinanceKlineWebSocket, Notifier, StreamEvent};
use crate::config::AppConfig;
use crate::domain::{PriceCandle, Signal};
use crate::error::{Result, SentinelError};
use crate::strategy::SignalDetector;

/// Feed one candle through the detector and queue any resulting signal.
///
/// Rejected candles are logged and skipped; they never reach the window.
pub fn handle_candle(
    detector: &mut SignalDetector,
    dispatch: &DispatchHandle,
    candle: &PriceCandle,
) -> Result<Option<Signal>> {
    match detector.on_candle(candle) {
        Ok(Some(signal)) => {
            dispatch.enqueue(Notification::Signal(signal.clone()));
            Ok(Some(signal))
        }
        Ok(None) => Ok(None),
        Err(SentinelError::InvalidMarketData(reason)) => {
            warn!("Rejected candle: {}", reason);
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// Startup notice, sent once when the stream first connects
pub fn startup_message(config: &AppConfig) -> String {
    format!("🚀 RSI sentinel started\n{}", config.summary())
}

/// Summary of a finished run
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub closed_candles: u64,
    pub signals: u64,
    pub reconnects: u64,
    pub dispatch: Option<DispatchStats>,
    pub dropped_notifications: u64,
}

/// Consume stream events until shutdown or until the stream is gone.
///
/// The detector lives here, outside the connection loop, so its history
/// survives reconnects.
pub async fn consume_events<F>(
    detector: &mut SignalDetector,
    mut events: broadcast::Receiver<StreamEvent>,
    dispatch: &DispatchHandle,
    startup_notice: Option<String>,
    shutdown: F,
) -> Result<RunReport>
where
    F: Future<Output = ()>,
{
    let mut report = RunReport::default();
    let mut startup_notice = startup_notice;
    let mut connected_once = false;
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("Shutdown requested, stopping event consumption");
                break;
            }
            event = events.recv() => match event {
                Ok(StreamEvent::Candle(candle)) => {
                    if handle_candle(detector, dispatch, &candle)?.is_some() {
                        report.signals += 1;
                    }
                    report.closed_candles = detector.window().total_closed();
                }
                Ok(StreamEvent::Connected { attempt }) => {
                    if connected_once {
                        report.reconnects += 1;
                        info!(
                            "Stream reconnected (attempt {}), keeping {} closes of history",
                            attempt,
                            detector.window().len()
                        );
                    }
                    connected_once = true;
                    if let Some(text) = startup_notice.take() {
                        dispatch.enqueue(Notification::Text(text));
                    }
                }
                Ok(StreamEvent::Disconnected) => {
                    warn!("Stream disconnected; detector state retained");
                }
                Err(RecvError::Lagged(n)) => {
                    warn!("Detector lagged behind the stream, skipped {} events", n);
                }
                Err(RecvError::Closed) => {
                    info!("Stream channel closed");
                    break;
                }
            }
        }
    }

    Ok(report)
}

/// The long-running alert service
pub struct Sentinel {
    config: AppConfig,
    notifier: Arc<dyn Notifier>,
}

impl Sentinel {
    pub fn new(config: AppConfig, notifier: Arc<dyn Notifier>) -> Self {
        Self { config, notifier }
    }

    /// Run until `shutdown` resolves.
    pub async fn run<F>(self, shutdown: F) -> Result<RunReport>
    where
        F: Future<Output = ()>,
    {
        let mut detector = SignalDetector::new(self.config.detector_config())?;
        info!("Sentinel starting: {}", self.config.summary());

        let ws = Arc::new(
            BinanceKlineWebSocket::new(
                &self.config.stream.ws_url,
                &self.config.stream.symbol,
                &self.config.stream.interval,
            )
            .with_reconnect_delay(self.config.stream.reconnect_delay()),
        );
        let events = ws.subscribe();
        let ws_task = {
            let ws = Arc::clone(&ws);
            tokio::spawn(async move {
                if let Err(e) = ws.run().await {
                    error!("Kline stream task ended: {}", e);
                }
            })
        };

        let (dispatch, dispatch_task) = spawn_dispatcher(
            Arc::clone(&self.notifier),
            self.config.dispatch.queue_capacity,
            self.config.notifier.timeout(),
        );

        let notice = self
            .config
            .notifier
            .announce_startup
            .then(|| startup_message(&self.config));

        let result = consume_events(&mut detector, events, &dispatch, notice, shutdown).await;

        detector.stop();
        ws_task.abort();

        let dropped = dispatch.dropped();
        drop(dispatch);
        let stats = match tokio::time::timeout(self.config.dispatch.drain_timeout(), dispatch_task).await
        {
            Ok(Ok(stats)) => Some(stats),
            Ok(Err(e)) => {
                error!("Dispatcher task failed: {}", e);
                None
            }
            Err(_) => {
                warn!("Timed out draining notification queue");
                None
            }
        };

        let mut report = result?;
        report.dispatch = stats;
        report.dropped_notifications = dropped;
        debug!("Run report: {:?}", report);
        Ok(report)
    }
}
