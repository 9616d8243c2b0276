use crate::shared::Result;
use async_trait::async_trait;

/// One outbound webhook POST
#[derive(Debug, Clone, PartialEq)]
pub struct WebhookRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
    /// Serialized JSON envelope, sent verbatim (the signature covers these bytes)
    pub body: String,
}

impl WebhookRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// HTTP status of a completed POST
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
}

impl TransportResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Server-side failures are worth retrying, client errors are not
    pub fn is_retryable(&self) -> bool {
        self.status >= 500
    }
}

/// WebhookTransport port for delivering webhook requests over HTTP
///
/// # Errors
/// Returns an error for network-level failures (DNS, connect, timeout).
/// Any HTTP status, including 4xx and 5xx, is a successful transport call.
#[async_trait]
pub trait WebhookTransport: Send + Sync {
    async fn post(&self, request: &WebhookRequest) -> Result<TransportResponse>;
}
