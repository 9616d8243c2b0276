pub mod analysis;
pub mod entity;
pub mod exploit;
pub mod scan;
pub mod schedule;
pub mod target;
pub mod vulnerability;
pub mod webhook;

pub use analysis::{Anomaly, AnomalyAnalysis, AnomalyType, Priority, Suggestion, SuggestionType};
pub use entity::Entity;
pub use exploit::{ExploitResult, ExploitStatistics, ExploitStatus, ExploitType, PenetrationTest};
pub use scan::{
    ScanConfig, ScanDepth, ScanOutcome, ScanResult, ScanSeverity, ScanStatus, ScanSummary,
    ScanType,
};
pub use schedule::{Frequency, ScheduleConfig, ScheduledScan};
pub use target::ScanTarget;
pub use vulnerability::{count_severity, Severity, Vulnerability, VulnerabilityType};
pub use webhook::{Webhook, WebhookEvent, WebhookPayload};
