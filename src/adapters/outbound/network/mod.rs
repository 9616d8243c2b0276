/// Network adapters for outbound HTTP calls
mod reqwest_transport;

pub use reqwest_transport::ReqwestWebhookTransport;
