use crate::ports::outbound::EventPublisher;
use crate::scan_orchestration::domain::WebhookEvent;
use async_trait::async_trait;
use std::sync::{Arc, OnceLock};
use tokio::sync::{mpsc, oneshot};
use tracing::warn;

enum Queued {
    Event(WebhookEvent, serde_json::Value),
    Flush(oneshot::Sender<()>),
}

/// EventQueue - hands events to a publisher from a background task
///
/// `publish` only enqueues, so a slow or unreachable subscriber never holds up
/// the caller. Events reach the inner publisher one at a time, in the order
/// they were published. The worker starts on the first publish and stops
/// once the queue is dropped and drained.
pub struct EventQueue {
    inner: Arc<dyn EventPublisher>,
    sender: OnceLock<mpsc::UnboundedSender<Queued>>,
}

impl EventQueue {
    pub fn new(inner: Arc<dyn EventPublisher>) -> Self {
        Self {
            inner,
            sender: OnceLock::new(),
        }
    }

    /// Waits until every event published before this call has been delivered
    pub async fn flush(&self) {
        let (done, delivered) = oneshot::channel();
        if self.sender().send(Queued::Flush(done)).is_ok() {
            let _ = delivered.await;
        }
    }

    fn sender(&self) -> &mpsc::UnboundedSender<Queued> {
        self.sender.get_or_init(|| {
            let (tx, mut rx) = mpsc::unbounded_channel();
            let inner = Arc::clone(&self.inner);
            tokio::spawn(async move {
                while let Some(queued) = rx.recv().await {
                    match queued {
                        Queued::Event(event, data) => inner.publish(event, data).await,
                        Queued::Flush(done) => {
                            let _ = done.send(());
                        }
                    }
                }
            });
            tx
        })
    }
}

#[async_trait]
impl EventPublisher for EventQueue {
    async fn publish(&self, event: WebhookEvent, data: serde_json::Value) {
        if self.sender().send(Queued::Event(event, data)).is_err() {
            warn!(event = %event, "event queue closed, dropping event");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;
    use std::time::{Duration, Instant};

    #[derive(Default)]
    struct SlowPublisher {
        seen: Mutex<Vec<(WebhookEvent, serde_json::Value)>>,
    }

    #[async_trait]
    impl EventPublisher for SlowPublisher {
        async fn publish(&self, event: WebhookEvent, data: serde_json::Value) {
            tokio::time::sleep(Duration::from_millis(200)).await;
            self.seen.lock().unwrap().push((event, data));
        }
    }

    #[tokio::test]
    async fn test_publish_returns_before_delivery() {
        let inner = Arc::new(SlowPublisher::default());
        let queue = EventQueue::new(inner.clone());

        let started = Instant::now();
        queue.publish(WebhookEvent::ScanStarted, json!({ "n": 1 })).await;
        queue.publish(WebhookEvent::ScanCompleted, json!({ "n": 2 })).await;
        assert!(started.elapsed() < Duration::from_millis(150));
        assert!(inner.seen.lock().unwrap().is_empty());

        queue.flush().await;
        let seen = inner.seen.lock().unwrap().clone();
        assert_eq!(
            seen,
            vec![
                (WebhookEvent::ScanStarted, json!({ "n": 1 })),
                (WebhookEvent::ScanCompleted, json!({ "n": 2 })),
            ]
        );
    }

    #[tokio::test]
    async fn test_flush_on_idle_queue_returns() {
        let queue = EventQueue::new(Arc::new(SlowPublisher::default()));
        queue.flush().await;
    }
}
