use super::{ScanResult, ScheduledScan, Webhook};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// An aggregate persisted through the repository port, keyed by its generated id
pub trait Entity: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Human-readable kind, used in error messages and storage paths
    const KIND: &'static str;

    fn id(&self) -> &str;
}

impl Entity for ScanResult {
    const KIND: &'static str = "scan";

    fn id(&self) -> &str {
        &self.id
    }
}

impl Entity for ScheduledScan {
    const KIND: &'static str = "scheduled-scan";

    fn id(&self) -> &str {
        &self.id
    }
}

impl Entity for Webhook {
    const KIND: &'static str = "webhook";

    fn id(&self) -> &str {
        &self.id
    }
}
