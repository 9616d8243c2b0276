use crate::ports::outbound::Clock;
use crate::scan_orchestration::domain::{
    AnomalyAnalysis, PenetrationTest, ScanDepth, ScanTarget, Vulnerability,
};
use crate::shared::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Detection stage of the scan pipeline
#[async_trait]
pub trait DetectionStage: Send + Sync {
    async fn detect(
        &self,
        target: &ScanTarget,
        depth: ScanDepth,
        content: Option<&str>,
    ) -> Result<Vec<Vulnerability>>;
}

/// Analysis stage; only invoked with a non-empty finding list
///
/// `now` is the engine clock reading used to stamp the analysis.
#[async_trait]
pub trait AnalysisStage: Send + Sync {
    async fn analyze(
        &self,
        vulnerabilities: &[Vulnerability],
        target: &ScanTarget,
        now: DateTime<Utc>,
    ) -> Result<AnomalyAnalysis>;
}

/// Exploit validation stage; only invoked with a non-empty finding list
///
/// Attempt and test timestamps are read from `clock`.
#[async_trait]
pub trait ValidationStage: Send + Sync {
    async fn validate(
        &self,
        vulnerabilities: &[Vulnerability],
        target: &ScanTarget,
        clock: &dyn Clock,
    ) -> Result<PenetrationTest>;
}
