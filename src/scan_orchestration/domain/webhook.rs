use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle events subscribers can listen to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WebhookEvent {
    ScanStarted,
    ScanCompleted,
    ScanFailed,
    VulnerabilityDetected,
    CriticalVulnerability,
    ScanScheduled,
}

impl WebhookEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            WebhookEvent::ScanStarted => "scan_started",
            WebhookEvent::ScanCompleted => "scan_completed",
            WebhookEvent::ScanFailed => "scan_failed",
            WebhookEvent::VulnerabilityDetected => "vulnerability_detected",
            WebhookEvent::CriticalVulnerability => "critical_vulnerability",
            WebhookEvent::ScanScheduled => "scan_scheduled",
        }
    }
}

impl fmt::Display for WebhookEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for WebhookEvent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scan_started" => Ok(WebhookEvent::ScanStarted),
            "scan_completed" => Ok(WebhookEvent::ScanCompleted),
            "scan_failed" => Ok(WebhookEvent::ScanFailed),
            "vulnerability_detected" => Ok(WebhookEvent::VulnerabilityDetected),
            "critical_vulnerability" => Ok(WebhookEvent::CriticalVulnerability),
            "scan_scheduled" => Ok(WebhookEvent::ScanScheduled),
            _ => Err(format!("Unknown webhook event: {}", s)),
        }
    }
}

/// A registered subscriber endpoint, owned exclusively by the dispatcher
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Webhook {
    pub id: String,
    pub url: String,
    pub events: Vec<WebhookEvent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
    pub last_triggered: Option<DateTime<Utc>>,
    pub trigger_count: u64,
}

impl Webhook {
    pub fn subscribes_to(&self, event: WebhookEvent) -> bool {
        self.enabled && self.events.contains(&event)
    }
}

/// JSON envelope POSTed to subscribers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookPayload {
    pub event: WebhookEvent,
    /// ISO-8601 timestamp, also sent as `X-Webhook-Timestamp`
    pub timestamp: String,
    pub data: serde_json::Value,
    /// Serialized as `null` for events that are not tied to a scan
    pub scan_id: Option<String>,
}

impl WebhookPayload {
    /// Builds the envelope; `scanId` is taken from `data.scanId` or `data.result.id`
    pub fn new(event: WebhookEvent, data: serde_json::Value, now: DateTime<Utc>) -> Self {
        let scan_id = data
            .get("scanId")
            .or_else(|| data.get("result").and_then(|r| r.get("id")))
            .and_then(|v| v.as_str())
            .map(str::to_string);

        Self {
            event,
            timestamp: now.to_rfc3339_opts(SecondsFormat::Millis, true),
            data,
            scan_id,
        }
    }
}
