use crate::scan_orchestration::domain::{ExploitStatus, ScanTarget, Vulnerability};
use crate::shared::Result;
use async_trait::async_trait;

/// ExploitHarness port deciding the outcome of one exploit attempt
///
/// Production harnesses may drive a real test environment; test harnesses
/// return fixtures. The validator only relies on the returned status.
#[async_trait]
pub trait ExploitHarness: Send + Sync {
    async fn attempt(
        &self,
        vulnerability: &Vulnerability,
        payload: &str,
        target: &ScanTarget,
    ) -> Result<ExploitStatus>;
}
