use crate::scan_orchestration::domain::WebhookEvent;
use async_trait::async_trait;

/// EventPublisher port for announcing lifecycle events
///
/// Publishing never fails from the caller's point of view: delivery problems
/// are isolated and logged by the implementation.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, event: WebhookEvent, data: serde_json::Value);
}
