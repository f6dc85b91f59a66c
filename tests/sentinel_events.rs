use async_trait::async_trait;
use rsi_sentinel::adapters::{Notifier, StreamEvent};
use rsi_sentinel::domain::{PriceCandle, Thresholds};
use rsi_sentinel::error::Result;
use rsi_sentinel::indicators::IndicatorConfig;
use rsi_sentinel::services::{consume_events, spawn_dispatcher};
use rsi_sentinel::strategy::{DetectorConfig, SignalDetector};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::broadcast;

#[derive(Default)]
struct RecordingNotifier {
    messages: Mutex<Vec<String>>,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn send_message(&self, text: &str) -> Result<()> {
        self.messages.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

fn detector() -> SignalDetector {
    SignalDetector::new(DetectorConfig {
        indicator: IndicatorConfig::rsi(3),
        thresholds: Thresholds::new(20.0, 80.0).unwrap(),
        symbol: Some("BTCUSDT".to_string()),
        ..DetectorConfig::default()
    })
    .unwrap()
}

fn candle(close: f64) -> StreamEvent {
    StreamEvent::Candle(PriceCandle::closed(close).unwrap())
}

/// History survives a reconnect, and the startup notice goes out only once.
#[tokio::test]
async fn reconnect_keeps_history_and_announces_once() {
    let (tx, rx) = broadcast::channel(64);
    let notifier = Arc::new(RecordingNotifier::default());
    let (dispatch, task) = spawn_dispatcher(notifier.clone(), 16, Duration::from_secs(1));

    let events = vec![
        StreamEvent::Connected { attempt: 1 },
        candle(10.0),
        candle(10.0),
        StreamEvent::Candle(PriceCandle::open(500.0).unwrap()),
        StreamEvent::Disconnected,
        StreamEvent::Connected { attempt: 2 },
        candle(10.0),
        candle(10.0),
        candle(50.0),
        candle(90.0),
        StreamEvent::Disconnected,
        StreamEvent::Connected { attempt: 3 },
        candle(91.0),
        candle(92.0),
        candle(50.0),
    ];
    for event in events {
        tx.send(event).unwrap();
    }
    drop(tx);

    let mut det = detector();
    let report = consume_events(
        &mut det,
        rx,
        &dispatch,
        Some("started".to_string()),
        std::future::pending::<()>(),
    )
    .await
    .unwrap();

    assert_eq!(report.closed_candles, 9);
    assert_eq!(report.reconnects, 2);
    assert_eq!(report.signals, 2);

    drop(dispatch);
    let stats = task.await.unwrap();
    assert_eq!(stats.sent, 3);

    let messages = notifier.messages.lock().unwrap().clone();
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[0], "started");
    assert!(messages[1].contains("BTCUSDT"));
    assert!(messages[1].to_lowercase().contains("overbought"));
    assert!(messages[2].contains("33.19"));
}

/// A malformed candle in the middle of the stream is skipped, not fatal.
#[tokio::test]
async fn rejected_candles_do_not_stop_consumption() {
    let (tx, rx) = broadcast::channel(16);
    let notifier = Arc::new(RecordingNotifier::default());
    let (dispatch, task) = spawn_dispatcher(notifier, 4, Duration::from_secs(1));

    let bad = PriceCandle {
        close: f64::NAN,
        ..PriceCandle::closed(1.0).unwrap()
    };
    tx.send(candle(10.0)).unwrap();
    tx.send(StreamEvent::Candle(bad)).unwrap();
    tx.send(candle(11.0)).unwrap();
    drop(tx);

    let mut det = detector();
    let report = consume_events(&mut det, rx, &dispatch, None, std::future::pending::<()>())
        .await
        .unwrap();
    assert_eq!(report.closed_candles, 2);
    assert_eq!(det.window().to_vec(), vec![10.0, 11.0]);

    drop(dispatch);
    assert_eq!(task.await.unwrap().sent, 0);
}

#[tokio::test]
async fn shutdown_future_ends_consumption() {
    let (tx, rx) = broadcast::channel::<StreamEvent>(4);
    let (dispatch, _task) = spawn_dispatcher(
        Arc::new(RecordingNotifier::default()),
        4,
        Duration::from_secs(1),
    );

    let mut det = detector();
    let report = consume_events(&mut det, rx, &dispatch, None, async {})
        .await
        .unwrap();
    assert_eq!(report.closed_candles, 0);
    drop(tx);
}
