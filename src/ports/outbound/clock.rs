use chrono::{DateTime, Utc};

/// Clock port so time-dependent services can be driven by tests
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}
