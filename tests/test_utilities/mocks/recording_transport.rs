#![allow(dead_code)]

use async_trait::async_trait;
use scanguard::prelude::*;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

/// WebhookTransport that records every request instead of sending it
///
/// Responses are scripted per URL; once a script runs out, 200 is returned.
#[derive(Default)]
pub struct RecordingTransport {
    requests: Mutex<Vec<WebhookRequest>>,
    scripts: Mutex<HashMap<String, VecDeque<u16>>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_statuses(self, url: &str, statuses: &[u16]) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(url.to_string(), statuses.iter().copied().collect());
        self
    }

    pub fn requests(&self) -> Vec<WebhookRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requests_to(&self, url: &str) -> Vec<WebhookRequest> {
        self.requests()
            .into_iter()
            .filter(|request| request.url == url)
            .collect()
    }

    /// Values of `X-Webhook-Event` sent to `url`, in order
    pub fn events_to(&self, url: &str) -> Vec<String> {
        self.requests_to(url)
            .iter()
            .filter_map(|request| request.header(EVENT_HEADER).map(str::to_string))
            .collect()
    }
}

#[async_trait]
impl WebhookTransport for RecordingTransport {
    async fn post(&self, request: &WebhookRequest) -> Result<TransportResponse> {
        self.requests.lock().unwrap().push(request.clone());
        let status = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(&request.url)
            .and_then(VecDeque::pop_front)
            .unwrap_or(200);
        Ok(TransportResponse { status })
    }
}
