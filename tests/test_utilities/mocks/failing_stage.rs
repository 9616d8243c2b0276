use async_trait::async_trait;
use scanguard::prelude::*;

/// Detection stage that always errors, as a crashed scanner would
pub struct FailingStage {
    pub message: &'static str,
}

#[async_trait]
impl DetectionStage for FailingStage {
    async fn detect(
        &self,
        _target: &ScanTarget,
        _depth: ScanDepth,
        _content: Option<&str>,
    ) -> Result<Vec<Vulnerability>> {
        anyhow::bail!(self.message)
    }
}
