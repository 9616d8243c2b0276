use crate::ports::outbound::{Clock, EventPublisher, Repository, WebhookRequest, WebhookTransport};
use crate::scan_orchestration::domain::{Webhook, WebhookEvent, WebhookPayload};
use crate::shared::error::ScanError;
use crate::shared::id::generate_id;
use crate::shared::Result;
use async_trait::async_trait;
use dashmap::DashMap;
use futures::future::join_all;
use hmac::{Hmac, Mac};
use serde_json::json;
use sha2::Sha256;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use url::Url;

type HmacSha256 = Hmac<Sha256>;

pub const EVENT_HEADER: &str = "X-Webhook-Event";
pub const TIMESTAMP_HEADER: &str = "X-Webhook-Timestamp";
pub const SIGNATURE_HEADER: &str = "X-Webhook-Signature";

/// Lowercase hex HMAC-SHA256 of `body`, keyed by `secret`
pub fn sign_payload(secret: &str, body: &str) -> Result<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| anyhow::anyhow!("Invalid webhook secret: {}", e))?;
    mac.update(body.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Checks a received `X-Webhook-Signature` against the body, in constant time
pub fn verify_signature(secret: &str, body: &str, signature: &str) -> bool {
    let Ok(expected) = hex::decode(signature.trim()) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(body.as_bytes());
    mac.verify_slice(&expected).is_ok()
}

/// How failed deliveries are retried
///
/// Network errors and 5xx responses are retried, waiting `backoff * attempt`
/// between attempts. Other non-2xx responses fail immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_millis(200),
        }
    }
}

/// Outcome of delivering one event to one subscriber
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReport {
    pub webhook_id: String,
    pub delivered: bool,
    pub attempts: u32,
    /// Last HTTP status received, if any request completed
    pub status: Option<u16>,
    pub error: Option<String>,
}

/// WebhookDispatcher - owns every registered `Webhook` and fans events out to them
///
/// Deliveries for one event run in parallel and settle independently: a failing
/// subscriber never affects delivery to, or the outcome of, any other. Deliveries
/// to the same webhook are serialized so its counters are updated one at a time.
pub struct WebhookDispatcher {
    webhooks: DashMap<String, Webhook>,
    delivery_locks: DashMap<String, Arc<Mutex<()>>>,
    transport: Arc<dyn WebhookTransport>,
    repository: Arc<dyn Repository<Webhook>>,
    clock: Arc<dyn Clock>,
    retry: RetryPolicy,
}

impl WebhookDispatcher {
    pub fn new(
        transport: Arc<dyn WebhookTransport>,
        repository: Arc<dyn Repository<Webhook>>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            webhooks: DashMap::new(),
            delivery_locks: DashMap::new(),
            transport,
            repository,
            clock,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = RetryPolicy {
            max_attempts: retry.max_attempts.max(1),
            backoff: retry.backoff,
        };
        self
    }

    /// Loads persisted webhooks into the registry
    pub async fn init(&self) -> Result<usize> {
        let stored = self.repository.load_all().await?;
        let count = stored.len();
        for webhook in stored {
            self.webhooks.insert(webhook.id.clone(), webhook);
        }
        info!(count, "webhooks loaded");
        Ok(count)
    }

    /// Registers a subscriber for `events`
    ///
    /// # Errors
    /// `ScanError::Validation` when the URL is not http(s), no event is given or
    /// the secret is empty.
    pub async fn register(
        &self,
        url: &str,
        events: Vec<WebhookEvent>,
        secret: Option<String>,
    ) -> Result<Webhook> {
        Self::validate_registration(url, &events, secret.as_deref())?;

        let mut unique = Vec::with_capacity(events.len());
        for event in events {
            if !unique.contains(&event) {
                unique.push(event);
            }
        }
        let webhook = Webhook {
            id: generate_id("webhook"),
            url: url.trim().to_string(),
            events: unique,
            secret,
            enabled: true,
            created_at: self.clock.now(),
            last_triggered: None,
            trigger_count: 0,
        };

        self.repository.save(&webhook).await?;
        self.webhooks.insert(webhook.id.clone(), webhook.clone());
        info!(webhook_id = %webhook.id, url = %webhook.url, "webhook registered");
        Ok(webhook)
    }

    fn validate_registration(
        url: &str,
        events: &[WebhookEvent],
        secret: Option<&str>,
    ) -> Result<()> {
        let parsed = Url::parse(url.trim()).map_err(|e| {
            ScanError::validation(
                format!("Invalid webhook URL '{}': {}", url, e),
                "Webhook URLs must start with http:// or https://",
            )
        })?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(ScanError::validation(
                format!("Unsupported webhook scheme '{}'", parsed.scheme()),
                "Webhook URLs must start with http:// or https://",
            )
            .into());
        }

        if events.is_empty() {
            return Err(ScanError::validation(
                "A webhook must subscribe to at least one event",
                "Pick from scan_started, scan_completed, scan_failed, vulnerability_detected, critical_vulnerability, scan_scheduled",
            )
            .into());
        }

        if secret.is_some_and(|s| s.is_empty()) {
            return Err(ScanError::validation(
                "Webhook secret cannot be empty",
                "Omit the secret to send unsigned requests",
            )
            .into());
        }

        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<Webhook> {
        self.webhooks.get(id).map(|entry| entry.clone())
    }

    /// All webhooks, oldest first
    pub fn list(&self) -> Vec<Webhook> {
        let mut webhooks: Vec<Webhook> = self.webhooks.iter().map(|entry| entry.clone()).collect();
        webhooks.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        webhooks
    }

    pub async fn delete(&self, id: &str) -> Result<bool> {
        let removed = self.webhooks.remove(id).is_some();
        self.delivery_locks.remove(id);
        if removed {
            self.repository.delete(id).await?;
            info!(webhook_id = id, "webhook deleted");
        }
        Ok(removed)
    }

    pub async fn set_enabled(&self, id: &str, enabled: bool) -> Result<Webhook> {
        let updated = {
            let mut entry = self
                .webhooks
                .get_mut(id)
                .ok_or_else(|| ScanError::not_found("Webhook", id))?;
            entry.enabled = enabled;
            entry.clone()
        };
        self.repository.save(&updated).await?;
        info!(webhook_id = id, enabled, "webhook updated");
        Ok(updated)
    }

    /// Delivers `event` to every enabled subscriber and waits for all of them
    ///
    /// Returns one report per subscriber. Failures are logged and reported,
    /// never returned as errors.
    pub async fn trigger(
        &self,
        event: WebhookEvent,
        data: serde_json::Value,
    ) -> Vec<DeliveryReport> {
        let subscribers: Vec<Webhook> = self
            .webhooks
            .iter()
            .filter(|entry| entry.subscribes_to(event))
            .map(|entry| entry.clone())
            .collect();

        if subscribers.is_empty() {
            debug!(event = %event, "no subscribers");
            return Vec::new();
        }

        let payload = WebhookPayload::new(event, data, self.clock.now());
        let body = match serde_json::to_string(&payload) {
            Ok(body) => body,
            Err(e) => {
                warn!(event = %event, error = %e, "failed to serialize webhook payload");
                return Vec::new();
            }
        };

        debug!(event = %event, subscribers = subscribers.len(), "dispatching event");
        join_all(
            subscribers
                .iter()
                .map(|webhook| self.deliver(webhook, &payload, &body)),
        )
        .await
    }

    /// Sends a test `scan_started` event to one webhook, whatever it subscribes to
    pub async fn test_webhook(&self, id: &str) -> Result<DeliveryReport> {
        let webhook = self
            .get(id)
            .ok_or_else(|| ScanError::not_found("Webhook", id))?;

        let payload = WebhookPayload::new(
            WebhookEvent::ScanStarted,
            json!({
                "test": true,
                "message": "This is a test webhook from scanguard",
            }),
            self.clock.now(),
        );
        let body = serde_json::to_string(&payload)?;
        Ok(self.deliver(&webhook, &payload, &body).await)
    }

    async fn deliver(
        &self,
        webhook: &Webhook,
        payload: &WebhookPayload,
        body: &str,
    ) -> DeliveryReport {
        let lock = self
            .delivery_locks
            .entry(webhook.id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _guard = lock.lock().await;

        let mut report = DeliveryReport {
            webhook_id: webhook.id.clone(),
            delivered: false,
            attempts: 0,
            status: None,
            error: None,
        };

        let request = match Self::build_request(webhook, payload, body) {
            Ok(request) => request,
            Err(e) => {
                report.error = Some(e.to_string());
                warn!(webhook_id = %webhook.id, error = %e, "failed to build webhook request");
                return report;
            }
        };

        for attempt in 1..=self.retry.max_attempts {
            report.attempts = attempt;
            let retryable = match self.transport.post(&request).await {
                Ok(response) if response.is_success() => {
                    report.status = Some(response.status);
                    report.delivered = true;
                    report.error = None;
                    break;
                }
                Ok(response) => {
                    report.status = Some(response.status);
                    report.error = Some(format!("HTTP {}", response.status));
                    response.is_retryable()
                }
                Err(e) => {
                    report.error = Some(e.to_string());
                    true
                }
            };

            if !retryable {
                break;
            }
            if attempt < self.retry.max_attempts {
                debug!(webhook_id = %webhook.id, attempt, "retrying webhook delivery");
                tokio::time::sleep(self.retry.backoff * attempt).await;
            }
        }

        if report.delivered {
            self.record_delivery(&webhook.id).await;
            info!(webhook_id = %webhook.id, event = %payload.event, "webhook delivered");
        } else {
            let error = ScanError::Delivery {
                webhook_id: webhook.id.clone(),
                details: report.error.clone().unwrap_or_default(),
            };
            warn!(attempts = report.attempts, error = %error, "webhook delivery failed");
        }

        report
    }

    fn build_request(
        webhook: &Webhook,
        payload: &WebhookPayload,
        body: &str,
    ) -> Result<WebhookRequest> {
        let mut headers = vec![
            ("Content-Type".to_string(), "application/json".to_string()),
            (EVENT_HEADER.to_string(), payload.event.as_str().to_string()),
            (TIMESTAMP_HEADER.to_string(), payload.timestamp.clone()),
        ];
        if let Some(secret) = &webhook.secret {
            headers.push((SIGNATURE_HEADER.to_string(), sign_payload(secret, body)?));
        }

        Ok(WebhookRequest {
            url: webhook.url.clone(),
            headers,
            body: body.to_string(),
        })
    }

    async fn record_delivery(&self, id: &str) {
        let now = self.clock.now();
        let updated = {
            let Some(mut entry) = self.webhooks.get_mut(id) else {
                return;
            };
            entry.last_triggered = Some(now);
            entry.trigger_count += 1;
            entry.clone()
        };

        if let Err(e) = self.repository.save(&updated).await {
            warn!(webhook_id = id, error = %e, "failed to persist webhook");
        }
    }
}

#[async_trait]
impl EventPublisher for WebhookDispatcher {
    async fn publish(&self, event: WebhookEvent, data: serde_json::Value) {
        self.trigger(event, data).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::outbound::memory::InMemoryRepository;
    use crate::ports::outbound::TransportResponse;
    use chrono::{DateTime, TimeZone, Utc};
    use std::collections::HashMap;
    use std::sync::Mutex as StdMutex;

    struct FixedClock(DateTime<Utc>);

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.0
        }
    }

    /// Responds per URL; unknown URLs behave as unreachable
    #[derive(Default)]
    struct ScriptedTransport {
        statuses: HashMap<String, Vec<u16>>,
        requests: StdMutex<Vec<WebhookRequest>>,
    }

    impl ScriptedTransport {
        fn respond(mut self, url: &str, statuses: &[u16]) -> Self {
            self.statuses.insert(url.to_string(), statuses.to_vec());
            self
        }

        fn requests_to(&self, url: &str) -> Vec<WebhookRequest> {
            self.requests
                .lock()
                .unwrap()
                .iter()
                .filter(|r| r.url == url)
                .cloned()
                .collect()
        }
    }

    #[async_trait]
    impl WebhookTransport for ScriptedTransport {
        async fn post(&self, request: &WebhookRequest) -> Result<TransportResponse> {
            let attempt = {
                let mut requests = self.requests.lock().unwrap();
                requests.push(request.clone());
                requests.iter().filter(|r| r.url == request.url).count()
            };
            let Some(statuses) = self.statuses.get(&request.url) else {
                anyhow::bail!("connection refused");
            };
            // the last scripted status repeats
            let status = statuses
                .get(attempt - 1)
                .or_else(|| statuses.last())
                .copied()
                .unwrap_or(200);
            Ok(TransportResponse { status })
        }
    }

    struct Fixture {
        dispatcher: WebhookDispatcher,
        transport: Arc<ScriptedTransport>,
        repository: Arc<InMemoryRepository<Webhook>>,
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap()
    }

    fn fixture(transport: ScriptedTransport) -> Fixture {
        let transport = Arc::new(transport);
        let repository = Arc::new(InMemoryRepository::new());
        let dispatcher = WebhookDispatcher::new(
            transport.clone(),
            repository.clone(),
            Arc::new(FixedClock(now())),
        )
        .with_retry(RetryPolicy {
            max_attempts: 3,
            backoff: Duration::from_millis(1),
        });
        Fixture {
            dispatcher,
            transport,
            repository,
        }
    }

    const OK_URL: &str = "https://ok.example.com/hook";
    const DOWN_URL: &str = "https://down.example.com/hook";
    const OTHER_URL: &str = "https://other.example.com/hook";

    #[test]
    fn test_sign_and_verify() {
        let body = r#"{"event":"scan_completed"}"#;
        let signature = sign_payload("s3cret", body).unwrap();
        assert_eq!(signature.len(), 64);
        assert!(signature.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert!(verify_signature("s3cret", body, &signature));
        assert!(!verify_signature("other", body, &signature));
        assert!(!verify_signature("s3cret", "tampered", &signature));
        assert!(!verify_signature("s3cret", body, "not-hex"));
    }

    #[test]
    fn test_sign_known_vector() {
        // RFC 4231 test case 2
        let signature = sign_payload("Jefe", "what do ya want for nothing?").unwrap();
        assert_eq!(
            signature,
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[tokio::test]
    async fn test_register_validates_input() {
        let f = fixture(ScriptedTransport::default());
        assert!(f
            .dispatcher
            .register("ftp://example.com", vec![WebhookEvent::ScanCompleted], None)
            .await
            .is_err());
        assert!(f.dispatcher.register(OK_URL, vec![], None).await.is_err());
        assert!(f
            .dispatcher
            .register(OK_URL, vec![WebhookEvent::ScanCompleted], Some(String::new()))
            .await
            .is_err());

        let webhook = f
            .dispatcher
            .register(OK_URL, vec![WebhookEvent::ScanCompleted], None)
            .await
            .unwrap();
        assert!(webhook.id.starts_with("webhook-"));
        assert!(webhook.enabled);
        assert_eq!(webhook.trigger_count, 0);
        assert_eq!(f.repository.len(), 1);
    }

    #[tokio::test]
    async fn test_settle_all_fan_out() {
        let f = fixture(ScriptedTransport::default().respond(OK_URL, &[200]));
        let reachable = f
            .dispatcher
            .register(OK_URL, vec![WebhookEvent::ScanCompleted], None)
            .await
            .unwrap();
        let unreachable = f
            .dispatcher
            .register(
                DOWN_URL,
                vec![WebhookEvent::ScanCompleted, WebhookEvent::ScanFailed],
                None,
            )
            .await
            .unwrap();
        let other = f
            .dispatcher
            .register(OTHER_URL, vec![WebhookEvent::ScanFailed], None)
            .await
            .unwrap();

        let reports = f
            .dispatcher
            .trigger(WebhookEvent::ScanCompleted, json!({ "scanId": "scan-1" }))
            .await;

        assert_eq!(reports.len(), 2);
        let ok = reports.iter().find(|r| r.webhook_id == reachable.id).unwrap();
        assert!(ok.delivered);
        let down = reports.iter().find(|r| r.webhook_id == unreachable.id).unwrap();
        assert!(!down.delivered);
        assert_eq!(down.attempts, 3);
        assert!(down.error.as_deref().unwrap().contains("connection refused"));

        assert_eq!(f.dispatcher.get(&reachable.id).unwrap().trigger_count, 1);
        assert_eq!(
            f.dispatcher.get(&reachable.id).unwrap().last_triggered,
            Some(now())
        );
        assert_eq!(f.dispatcher.get(&unreachable.id).unwrap().trigger_count, 0);
        assert!(f.transport.requests_to(OTHER_URL).is_empty());
        assert_eq!(f.dispatcher.get(&other.id).unwrap().trigger_count, 0);

        let stored = f.repository.load(&reachable.id).await.unwrap().unwrap();
        assert_eq!(stored.trigger_count, 1);
    }

    #[tokio::test]
    async fn test_request_headers_and_signature() {
        let f = fixture(ScriptedTransport::default().respond(OK_URL, &[204]));
        f.dispatcher
            .register(
                OK_URL,
                vec![WebhookEvent::CriticalVulnerability],
                Some("topsecret".to_string()),
            )
            .await
            .unwrap();

        f.dispatcher
            .trigger(
                WebhookEvent::CriticalVulnerability,
                json!({ "scanId": "scan-7", "count": 2 }),
            )
            .await;

        let requests = f.transport.requests_to(OK_URL);
        assert_eq!(requests.len(), 1);
        let request = &requests[0];
        assert_eq!(request.header("x-webhook-event"), Some("critical_vulnerability"));
        assert_eq!(
            request.header(TIMESTAMP_HEADER),
            Some("2024-01-01T10:00:00.000Z")
        );
        assert_eq!(request.header("Content-Type"), Some("application/json"));
        let signature = request.header(SIGNATURE_HEADER).unwrap();
        assert!(verify_signature("topsecret", &request.body, signature));

        let body: serde_json::Value = serde_json::from_str(&request.body).unwrap();
        assert_eq!(body["event"], "critical_vulnerability");
        assert_eq!(body["scanId"], "scan-7");
        assert_eq!(body["data"]["count"], 2);
    }

    #[tokio::test]
    async fn test_unsigned_without_secret() {
        let f = fixture(ScriptedTransport::default().respond(OK_URL, &[200]));
        f.dispatcher
            .register(OK_URL, vec![WebhookEvent::ScanStarted], None)
            .await
            .unwrap();
        f.dispatcher
            .trigger(WebhookEvent::ScanStarted, json!({}))
            .await;

        let requests = f.transport.requests_to(OK_URL);
        assert!(requests[0].header(SIGNATURE_HEADER).is_none());
    }

    #[tokio::test]
    async fn test_server_error_is_retried() {
        let f = fixture(ScriptedTransport::default().respond(OK_URL, &[503, 502, 200]));
        let webhook = f
            .dispatcher
            .register(OK_URL, vec![WebhookEvent::ScanCompleted], None)
            .await
            .unwrap();

        let reports = f
            .dispatcher
            .trigger(WebhookEvent::ScanCompleted, json!({}))
            .await;
        assert!(reports[0].delivered);
        assert_eq!(reports[0].attempts, 3);
        assert_eq!(reports[0].status, Some(200));
        assert_eq!(f.dispatcher.get(&webhook.id).unwrap().trigger_count, 1);
    }

    #[tokio::test]
    async fn test_client_error_is_not_retried() {
        let f = fixture(ScriptedTransport::default().respond(OK_URL, &[404, 200]));
        let webhook = f
            .dispatcher
            .register(OK_URL, vec![WebhookEvent::ScanCompleted], None)
            .await
            .unwrap();

        let reports = f
            .dispatcher
            .trigger(WebhookEvent::ScanCompleted, json!({}))
            .await;
        assert!(!reports[0].delivered);
        assert_eq!(reports[0].attempts, 1);
        assert_eq!(reports[0].status, Some(404));
        assert_eq!(f.dispatcher.get(&webhook.id).unwrap().trigger_count, 0);
    }

    #[tokio::test]
    async fn test_disabled_webhook_is_skipped() {
        let f = fixture(ScriptedTransport::default().respond(OK_URL, &[200]));
        let webhook = f
            .dispatcher
            .register(OK_URL, vec![WebhookEvent::ScanCompleted], None)
            .await
            .unwrap();
        f.dispatcher.set_enabled(&webhook.id, false).await.unwrap();

        let reports = f
            .dispatcher
            .trigger(WebhookEvent::ScanCompleted, json!({}))
            .await;
        assert!(reports.is_empty());
        assert!(f.transport.requests_to(OK_URL).is_empty());
    }

    #[tokio::test]
    async fn test_webhook_test_delivery() {
        let f = fixture(ScriptedTransport::default().respond(OK_URL, &[200]));
        let webhook = f
            .dispatcher
            .register(OK_URL, vec![WebhookEvent::ScanFailed], None)
            .await
            .unwrap();

        let report = f.dispatcher.test_webhook(&webhook.id).await.unwrap();
        assert!(report.delivered);
        let request = &f.transport.requests_to(OK_URL)[0];
        assert_eq!(request.header(EVENT_HEADER), Some("scan_started"));
        assert!(request.body.contains("\"test\":true"));

        let missing = f.dispatcher.test_webhook("webhook-missing").await;
        assert!(matches!(
            missing.unwrap_err().downcast_ref::<ScanError>(),
            Some(ScanError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_concurrent_deliveries_count_every_success() {
        let f = fixture(ScriptedTransport::default().respond(OK_URL, &[200]));
        let webhook = f
            .dispatcher
            .register(OK_URL, vec![WebhookEvent::ScanCompleted], None)
            .await
            .unwrap();

        let triggers = (0..5).map(|i| {
            f.dispatcher
                .trigger(WebhookEvent::ScanCompleted, json!({ "scanId": i.to_string() }))
        });
        join_all(triggers).await;

        assert_eq!(f.dispatcher.get(&webhook.id).unwrap().trigger_count, 5);
    }

    #[tokio::test]
    async fn test_delete_and_init() {
        let f = fixture(ScriptedTransport::default());
        let kept = f
            .dispatcher
            .register(OK_URL, vec![WebhookEvent::ScanCompleted], None)
            .await
            .unwrap();
        let removed = f
            .dispatcher
            .register(OTHER_URL, vec![WebhookEvent::ScanCompleted], None)
            .await
            .unwrap();
        assert!(f.dispatcher.delete(&removed.id).await.unwrap());
        assert_eq!(f.dispatcher.list().len(), 1);

        let restarted = WebhookDispatcher::new(
            f.transport.clone(),
            f.repository.clone(),
            Arc::new(FixedClock(now())),
        );
        assert_eq!(restarted.init().await.unwrap(), 1);
        assert_eq!(restarted.get(&kept.id), Some(kept));
    }

    #[tokio::test]
    async fn test_publish_delivers_through_trigger() {
        let f = fixture(ScriptedTransport::default().respond(OK_URL, &[200]));
        let webhook = f
            .dispatcher
            .register(OK_URL, vec![WebhookEvent::ScanScheduled], None)
            .await
            .unwrap();

        let publisher: &dyn EventPublisher = &f.dispatcher;
        publisher
            .publish(WebhookEvent::ScanScheduled, json!({ "scheduledScanId": "s-1" }))
            .await;
        assert_eq!(f.dispatcher.get(&webhook.id).unwrap().trigger_count, 1);
    }
}
