//! Bindings of the domain stages to the pipeline's stage ports

use crate::ports::outbound::{AnalysisStage, Clock, DetectionStage, ExploitHarness, ValidationStage};
use crate::scan_orchestration::domain::{
    AnomalyAnalysis, ExploitResult, PenetrationTest, ScanDepth, ScanTarget, Vulnerability,
};
use crate::scan_orchestration::services::{
    AnalysisContext, AnomalyAnalyzer, ExploitValidator, VulnerabilityDetector,
};
use crate::shared::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt, TryStreamExt};
use tokio::task;
use tracing::debug;

/// Exploit attempts running at the same time within one scan
const MAX_CONCURRENT_ATTEMPTS: usize = 4;

/// Rule matching runs on the blocking pool so the scan deadline can fire mid-detection
#[async_trait]
impl DetectionStage for VulnerabilityDetector {
    async fn detect(
        &self,
        target: &ScanTarget,
        depth: ScanDepth,
        content: Option<&str>,
    ) -> Result<Vec<Vulnerability>> {
        let detector = self.clone();
        let target = target.clone();
        let content = content.map(str::to_owned);
        let findings = task::spawn_blocking(move || {
            VulnerabilityDetector::detect(&detector, &target, depth, content.as_deref())
        })
        .await?;
        Ok(findings)
    }
}

#[async_trait]
impl AnalysisStage for AnomalyAnalyzer {
    async fn analyze(
        &self,
        vulnerabilities: &[Vulnerability],
        target: &ScanTarget,
        now: DateTime<Utc>,
    ) -> Result<AnomalyAnalysis> {
        let analyzer = self.clone();
        let vulnerabilities = vulnerabilities.to_vec();
        let target = target.clone();
        let analysis = task::spawn_blocking(move || {
            let context = AnalysisContext {
                target: target.as_str(),
                scan_type: target.scan_type(),
            };
            AnomalyAnalyzer::analyze(&analyzer, &vulnerabilities, context, now)
        })
        .await?;
        Ok(analysis)
    }
}

/// Validation stage that asks an `ExploitHarness` for the outcome of each attempt
///
/// Attempts run concurrently but results keep the order of the findings.
/// A harness error fails the whole stage.
pub struct HarnessValidationStage<H> {
    validator: ExploitValidator,
    harness: H,
}

impl<H: ExploitHarness> HarnessValidationStage<H> {
    pub fn new(harness: H) -> Self {
        Self {
            validator: ExploitValidator::new(),
            harness,
        }
    }

    async fn attempt_one(
        &self,
        vuln: &Vulnerability,
        target: &ScanTarget,
        clock: &dyn Clock,
    ) -> Result<ExploitResult> {
        let payload = ExploitValidator::payload_for(vuln.vuln_type());
        let status = self.harness.attempt(vuln, payload, target).await?;
        debug!(vulnerability = vuln.id(), ?status, "exploit attempt finished");
        Ok(self.validator.record_attempt(vuln, status, clock.now()))
    }
}

#[async_trait]
impl<H: ExploitHarness> ValidationStage for HarnessValidationStage<H> {
    async fn validate(
        &self,
        vulnerabilities: &[Vulnerability],
        target: &ScanTarget,
        clock: &dyn Clock,
    ) -> Result<PenetrationTest> {
        let attempts: Vec<_> = vulnerabilities
            .iter()
            .map(|vuln| self.attempt_one(vuln, target, clock))
            .collect();
        let exploits: Vec<ExploitResult> = stream::iter(attempts)
            .buffered(MAX_CONCURRENT_ATTEMPTS)
            .try_collect()
            .await?;

        Ok(self.validator.assemble(vulnerabilities, exploits, clock.now()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan_orchestration::domain::{ExploitStatus, ScanType, Severity, VulnerabilityType};
    use chrono::TimeZone;
    use std::time::Duration;

    struct FixedClock(DateTime<Utc>);

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.0
        }
    }

    /// Later findings finish first; odd risk scores are blocked
    struct StaggeredHarness;

    #[async_trait]
    impl ExploitHarness for StaggeredHarness {
        async fn attempt(
            &self,
            vulnerability: &Vulnerability,
            _payload: &str,
            _target: &ScanTarget,
        ) -> Result<ExploitStatus> {
            let delay = 60_u64.saturating_sub(u64::from(vulnerability.risk_score()) * 5);
            tokio::time::sleep(Duration::from_millis(delay)).await;
            if vulnerability.risk_score() % 2 == 0 {
                Ok(ExploitStatus::Success)
            } else {
                Ok(ExploitStatus::Blocked)
            }
        }
    }

    struct BrokenHarness;

    #[async_trait]
    impl ExploitHarness for BrokenHarness {
        async fn attempt(
            &self,
            _vulnerability: &Vulnerability,
            _payload: &str,
            _target: &ScanTarget,
        ) -> Result<ExploitStatus> {
            anyhow::bail!("sandbox unreachable")
        }
    }

    fn findings(n: u8) -> Vec<Vulnerability> {
        (0..n)
            .map(|i| {
                Vulnerability::new(
                    VulnerabilityType::Xss,
                    Severity::High,
                    format!("finding {}", i),
                    "d",
                    "r",
                    i,
                )
            })
            .collect()
    }

    fn target() -> ScanTarget {
        ScanTarget::parse("https://example.com/", ScanType::Url).unwrap()
    }

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, 12, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_attempts_beyond_concurrency_limit_keep_finding_order() {
        let vulns = findings(MAX_CONCURRENT_ATTEMPTS as u8 + 3);
        let stage = HarnessValidationStage::new(StaggeredHarness);

        let test = stage
            .validate(&vulns, &target(), &FixedClock(noon()))
            .await
            .unwrap();

        let attempted: Vec<&str> = test
            .exploits
            .iter()
            .map(|e| e.vulnerability_id.as_str())
            .collect();
        let expected: Vec<&str> = vulns.iter().map(|v| v.id()).collect();
        assert_eq!(attempted, expected);
        assert_eq!(test.validated_vulnerabilities.len(), 4);
    }

    #[tokio::test]
    async fn test_validation_timestamps_come_from_clock() {
        let stage = HarnessValidationStage::new(StaggeredHarness);

        let test = stage
            .validate(&findings(2), &target(), &FixedClock(noon()))
            .await
            .unwrap();

        assert_eq!(test.tested_at, noon());
        assert!(test.exploits.iter().all(|e| e.executed_at == noon()));
    }

    #[tokio::test]
    async fn test_harness_error_fails_validation() {
        let stage = HarnessValidationStage::new(BrokenHarness);

        let err = stage
            .validate(&findings(3), &target(), &FixedClock(noon()))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("sandbox unreachable"));
    }

    #[tokio::test]
    async fn test_analysis_is_stamped_with_given_time() {
        let analyzer = AnomalyAnalyzer::new();
        let analysis = AnalysisStage::analyze(&analyzer, &findings(2), &target(), noon())
            .await
            .unwrap();
        assert_eq!(analysis.analyzed_at, noon());
    }

    #[tokio::test]
    async fn test_detection_stage_scans_content() {
        let content = "let a = 1;\nel.innerHTML = name;\n";
        let found = DetectionStage::detect(
            &VulnerabilityDetector::new(),
            &ScanTarget::parse("app.js", ScanType::File).unwrap(),
            ScanDepth::Comprehensive,
            Some(&content),
        )
        .await
        .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].location(), Some("line 2"));
    }
}
