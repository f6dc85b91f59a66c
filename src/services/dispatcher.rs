//! Bounded notification queue drained by its own task.
//!
//! The candle consumer only ever calls [`DispatchHandle::enqueue`], which
//! never waits: a slow or unreachable chat channel cannot stall ingestion.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use crate::adapters::Notifier;
use crate::domain::Signal;
use crate::error::SentinelError;

/// Something to post to the chat channel
#[derive(Debug, Clone)]
pub enum Notification {
    Signal(Signal),
    Text(String),
}

impl Notification {
    pub fn text(&self) -> String {
        match self {
            Notification::Signal(signal) => signal.message(),
            Notification::Text(text) => text.clone(),
        }
    }
}

/// Outcome counters returned when the dispatcher finishes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    pub sent: u64,
    pub failed: u64,
    pub timed_out: u64,
}

/// Producer side of the queue
#[derive(Clone)]
pub struct DispatchHandle {
    tx: mpsc::Sender<Notification>,
    dropped: Arc<AtomicU64>,
}

impl DispatchHandle {
    /// Queue a notification without waiting. Returns false if it was dropped.
    pub fn enqueue(&self, notification: Notification) -> bool {
        match self.tx.try_send(notification) {
            Ok(()) => true,
            Err(TrySendError::Full(n)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                warn!("Notification queue full, dropping: {}", n.text());
                false
            }
            Err(TrySendError::Closed(n)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                warn!("Notification queue closed, dropping: {}", n.text());
                false
            }
        }
    }

    /// Notifications dropped because the queue was full or closed
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// Spawn the dispatch task. It runs until every handle has been dropped and
/// the queue is drained.
pub fn spawn_dispatcher(
    notifier: Arc<dyn Notifier>,
    capacity: usize,
    send_timeout: Duration,
) -> (DispatchHandle, JoinHandle<DispatchStats>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    let handle = DispatchHandle {
        tx,
        dropped: Arc::new(AtomicU64::new(0)),
    };
    let task = tokio::spawn(dispatch_loop(notifier, rx, send_timeout));
    (handle, task)
}

async fn dispatch_loop(
    notifier: Arc<dyn Notifier>,
    mut rx: mpsc::Receiver<Notification>,
    send_timeout: Duration,
) -> DispatchStats {
    let mut stats = DispatchStats::default();

    while let Some(notification) = rx.recv().await {
        let text = notification.text();
        match tokio::time::timeout(send_timeout, notifier.send_message(&text)).await {
            Ok(Ok(())) => {
                stats.sent += 1;
                debug!("Notification sent via {}", notifier.name());
            }
            Ok(Err(e)) => {
                stats.failed += 1;
                error!("Notification via {} failed: {}", notifier.name(), e);
            }
            Err(_) => {
                stats.timed_out += 1;
                let err = SentinelError::NotificationTimeout(send_timeout.as_millis() as u64);
                error!("Notification via {} failed: {}", notifier.name(), err);
            }
        }
    }

    debug!(
        "Dispatcher finished: sent={} failed={} timed_out={}",
        stats.sent, stats.failed, stats.timed_out
    );
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::notifier::MockNotifier;
    use crate::error::SentinelError;
    use mockall::predicate::function;

    #[tokio::test]
    async fn sends_in_order_and_counts() {
        let mut mock = MockNotifier::new();
        mock.expect_name().return_const("mock");
        let mut seq = mockall::Sequence::new();
        mock.expect_send_message()
            .with(function(|t: &str| t == "first"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        mock.expect_send_message()
            .with(function(|t: &str| t == "second"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err(SentinelError::Notification("boom".into())));

        let (handle, task) = spawn_dispatcher(Arc::new(mock), 8, Duration::from_secs(1));
        assert!(handle.enqueue(Notification::Text("first".into())));
        assert!(handle.enqueue(Notification::Text("second".into())));
        drop(handle);

        let stats = task.await.unwrap();
        assert_eq!(
            stats,
            DispatchStats {
                sent: 1,
                failed: 1,
                timed_out: 0
            }
        );
    }

    #[tokio::test]
    async fn full_queue_drops_instead_of_waiting() {
        // Build the queue by hand so nothing drains it during the test
        let (tx, _rx) = mpsc::channel(1);
        let handle = DispatchHandle {
            tx,
            dropped: Arc::new(AtomicU64::new(0)),
        };
        assert!(handle.enqueue(Notification::Text("a".into())));
        assert!(!handle.enqueue(Notification::Text("b".into())));
        assert_eq!(handle.dropped(), 1);
    }

    #[tokio::test]
    async fn closed_queue_is_reported() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let handle = DispatchHandle {
            tx,
            dropped: Arc::new(AtomicU64::new(0)),
        };
        assert!(!handle.enqueue(Notification::Text("late".into())));
        assert_eq!(handle.dropped(), 1);
    }

    struct SlowNotifier;

    #[async_trait::async_trait]
    impl Notifier for SlowNotifier {
        fn name(&self) -> &'static str {
            "slow"
        }

        async fn send_message(&self, _text: &str) -> crate::error::Result<()> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(())
        }
    }

    #[tokio::test]
    async fn slow_sends_time_out() {
        let (handle, task) =
            spawn_dispatcher(Arc::new(SlowNotifier), 4, Duration::from_millis(100));
        handle.enqueue(Notification::Text("x".into()));
        drop(handle);
        let stats = task.await.unwrap();
        assert_eq!(stats.timed_out, 1);
        assert_eq!(stats.sent, 0);
    }
}
