use crate::ports::outbound::{TransportResponse, WebhookRequest, WebhookTransport};
use crate::shared::Result;
use async_trait::async_trait;
use std::time::Duration;

/// ReqwestWebhookTransport adapter posting webhook requests with reqwest
///
/// Retries are not done here: the dispatcher owns the retry policy and only
/// needs the status code or the network error back.
pub struct ReqwestWebhookTransport {
    client: reqwest::Client,
}

impl ReqwestWebhookTransport {
    pub const DEFAULT_TIMEOUT_SECONDS: u64 = 10;

    /// Creates a transport with the default request timeout
    pub fn new() -> Result<Self> {
        Self::with_timeout(Duration::from_secs(Self::DEFAULT_TIMEOUT_SECONDS))
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let version = env!("CARGO_PKG_VERSION");
        let user_agent = format!("scanguard/{}", version);
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl WebhookTransport for ReqwestWebhookTransport {
    async fn post(&self, request: &WebhookRequest) -> Result<TransportResponse> {
        let mut builder = self.client.post(&request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder.body(request.body.clone()).send().await?;
        Ok(TransportResponse {
            status: response.status().as_u16(),
        })
    }
}
