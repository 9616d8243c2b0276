/// Long-running application services that own mutable registries
pub mod event_queue;
pub mod scan_scheduler;
pub mod webhook_dispatcher;

pub use event_queue::EventQueue;
pub use scan_scheduler::{ScanScheduler, DEFAULT_MAX_CONCURRENT_SCANS};
pub use webhook_dispatcher::{
    sign_payload, verify_signature, DeliveryReport, RetryPolicy, WebhookDispatcher,
    EVENT_HEADER, SIGNATURE_HEADER, TIMESTAMP_HEADER,
};
