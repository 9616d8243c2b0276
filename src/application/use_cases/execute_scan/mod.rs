use crate::application::services::EventQueue;
use crate::application::stages::HarnessValidationStage;
use crate::ports::inbound::{ScanExecutor, ScanRequest};
use crate::ports::outbound::{
    AnalysisStage, Clock, DetectionStage, EventPublisher, ExploitHarness, ProgressReporter,
    Repository, ValidationStage,
};
use crate::scan_orchestration::domain::target::validate_request;
use crate::scan_orchestration::domain::{
    count_severity, ScanConfig, ScanOutcome, ScanResult, ScanStatus, ScanTarget, Severity,
    Vulnerability, WebhookEvent,
};
use crate::scan_orchestration::policies::RiskPolicy;
use crate::scan_orchestration::services::{AnomalyAnalyzer, VulnerabilityDetector};
use crate::shared::error::ScanError;
use crate::shared::id::generate_id;
use crate::shared::Result;
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// ScanEngine - orchestrates detection, analysis and exploit validation for one scan
///
/// Every accepted request ends in a terminal `ScanResult`. Any stage error or an
/// overrun of `config.timeout` discards all stage output and yields a failed result
/// with no findings, a zero score and a clean verdict.
///
/// Stages run on a spawned task, so the deadline holds even while a stage is busy.
///
/// Optional collaborators: an event publisher for lifecycle events, a progress
/// reporter for interactive use, and a repository that receives terminal results.
pub struct ScanEngine {
    detector: Arc<dyn DetectionStage>,
    analyzer: Arc<dyn AnalysisStage>,
    validator: Arc<dyn ValidationStage>,
    clock: Arc<dyn Clock>,
    events: Option<EventQueue>,
    progress: Option<Arc<dyn ProgressReporter>>,
    results: Option<Arc<dyn Repository<ScanResult>>>,
}

impl ScanEngine {
    /// Creates a new ScanEngine with injected stages
    pub fn new(
        detector: Arc<dyn DetectionStage>,
        analyzer: Arc<dyn AnalysisStage>,
        validator: Arc<dyn ValidationStage>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            detector,
            analyzer,
            validator,
            clock,
            events: None,
            progress: None,
            results: None,
        }
    }

    /// Engine running the built-in detector and analyzer, validating through `harness`
    pub fn with_harness<H: ExploitHarness + 'static>(harness: H, clock: Arc<dyn Clock>) -> Self {
        Self::new(
            Arc::new(VulnerabilityDetector::new()),
            Arc::new(AnomalyAnalyzer::new()),
            Arc::new(HarnessValidationStage::new(harness)),
            clock,
        )
    }

    /// Lifecycle events are queued and delivered in the background
    pub fn with_events(mut self, events: Arc<dyn EventPublisher>) -> Self {
        self.events = Some(EventQueue::new(events));
        self
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressReporter>) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn with_results(mut self, results: Arc<dyn Repository<ScanResult>>) -> Self {
        self.results = Some(results);
        self
    }

    /// Waits for every lifecycle event published so far to be delivered
    pub async fn flush_events(&self) {
        if let Some(events) = &self.events {
            events.flush().await;
        }
    }

    /// Runs a scan to a terminal state
    ///
    /// # Errors
    /// Only `ScanError::Validation`, raised before any stage runs.
    pub async fn execute(&self, request: ScanRequest) -> Result<ScanResult> {
        let target = ScanTarget::parse(&request.target, request.scan_type)?;
        validate_request(&request.config, request.content.as_deref())?;

        let scan = ScanResult::started(
            generate_id("scan"),
            target.as_str().to_string(),
            target.scan_type(),
            request.config.clone(),
            self.clock.now(),
        );
        info!(
            scan_id = %scan.id,
            target = %scan.target,
            scan_type = %scan.scan_type,
            "scan started"
        );
        self.publish(
            WebhookEvent::ScanStarted,
            json!({
                "scanId": scan.id,
                "target": scan.target,
                "type": scan.scan_type,
            }),
        )
        .await;

        let deadline = Duration::from_secs(request.config.timeout);
        let pipeline = Pipeline {
            detector: Arc::clone(&self.detector),
            analyzer: Arc::clone(&self.analyzer),
            validator: Arc::clone(&self.validator),
            clock: Arc::clone(&self.clock),
            progress: self.progress.clone(),
        };
        let mut handle = tokio::spawn(pipeline.run(target, request.config, request.content));

        let outcome = match tokio::time::timeout(deadline, &mut handle).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(e)) => Err(ScanError::stage("pipeline", e).into()),
            Err(_) => {
                handle.abort();
                Err(ScanError::Timeout {
                    seconds: scan.config.timeout,
                }
                .into())
            }
        };

        let result = match outcome {
            Ok(outcome) => scan.complete(outcome, self.clock.now()),
            Err(e) => {
                warn!(scan_id = %scan.id, error = %e, "scan failed");
                self.report_error(&format!("❌ Scan failed: {}", e));
                let failed = scan.fail(self.clock.now());
                self.persist(&failed).await;
                self.publish(
                    WebhookEvent::ScanFailed,
                    json!({ "scanId": failed.id, "error": e.to_string() }),
                )
                .await;
                return Ok(failed);
            }
        };

        info!(
            scan_id = %result.id,
            findings = result.vulnerabilities.len(),
            risk_score = result.risk_score,
            severity = %result.severity,
            "scan completed"
        );
        self.persist(&result).await;
        self.report_completion(&format!(
            "✅ Scan completed: {} finding(s), risk {}/100 ({})",
            result.vulnerabilities.len(),
            result.risk_score,
            result.severity
        ));
        self.publish_findings(&result).await;
        self.publish(
            WebhookEvent::ScanCompleted,
            json!({ "scanId": result.id, "result": result }),
        )
        .await;

        Ok(result)
    }

    async fn publish_findings(&self, result: &ScanResult) {
        if result.status != ScanStatus::Completed || result.vulnerabilities.is_empty() {
            return;
        }

        self.publish(
            WebhookEvent::VulnerabilityDetected,
            json!({
                "scanId": result.id,
                "target": result.target,
                "count": result.vulnerabilities.len(),
                "vulnerabilities": result.vulnerabilities,
            }),
        )
        .await;

        if count_severity(&result.vulnerabilities, Severity::Critical) > 0 {
            let critical: Vec<&Vulnerability> = result
                .vulnerabilities
                .iter()
                .filter(|v| v.severity() == Severity::Critical)
                .collect();
            self.publish(
                WebhookEvent::CriticalVulnerability,
                json!({
                    "scanId": result.id,
                    "target": result.target,
                    "count": critical.len(),
                    "vulnerabilities": critical,
                }),
            )
            .await;
        }
    }

    async fn publish(&self, event: WebhookEvent, data: serde_json::Value) {
        if let Some(events) = &self.events {
            events.publish(event, data).await;
        }
    }

    /// Storage problems never change the scan outcome; they are logged only
    async fn persist(&self, result: &ScanResult) {
        if let Some(results) = &self.results {
            if let Err(e) = results.save(result).await {
                warn!(scan_id = %result.id, error = %e, "failed to persist scan result");
            }
        }
    }

    fn report_completion(&self, message: &str) {
        if let Some(progress) = &self.progress {
            progress.report_completion(message);
        }
    }

    fn report_error(&self, message: &str) {
        if let Some(progress) = &self.progress {
            progress.report_error(message);
        }
    }
}

/// Stage collaborators moved into the spawned pipeline task
struct Pipeline {
    detector: Arc<dyn DetectionStage>,
    analyzer: Arc<dyn AnalysisStage>,
    validator: Arc<dyn ValidationStage>,
    clock: Arc<dyn Clock>,
    progress: Option<Arc<dyn ProgressReporter>>,
}

impl Pipeline {
    /// Stages 1-3 plus scoring; any error aborts the whole pipeline
    async fn run(
        self,
        target: ScanTarget,
        config: ScanConfig,
        content: Option<String>,
    ) -> Result<ScanOutcome> {
        let total_stages = 1
            + usize::from(config.enable_ai_analysis)
            + usize::from(config.enable_penetration_testing);

        let vulnerabilities = if config.include_vulnerabilities {
            self.report_stage(1, total_stages, "Detecting vulnerabilities");
            self.detector
                .detect(&target, config.scan_depth, content.as_deref())
                .await
                .map_err(|e| ScanError::stage("detection", e))?
        } else {
            Vec::new()
        };
        debug!(count = vulnerabilities.len(), "detection finished");

        if vulnerabilities.is_empty() {
            self.report("✅ No vulnerabilities detected");
            return Ok(ScanOutcome {
                vulnerabilities,
                anomaly_analysis: None,
                penetration_test: None,
                risk_score: 0,
                severity: RiskPolicy::classify_findings(0, &[]),
            });
        }

        self.report(&format!("⚠️  Detected {} finding(s)", vulnerabilities.len()));

        let anomaly_analysis = if config.enable_ai_analysis {
            self.report_stage(2, total_stages, "Analyzing findings");
            Some(
                self.analyzer
                    .analyze(&vulnerabilities, &target, self.clock.now())
                    .await
                    .map_err(|e| ScanError::stage("analysis", e))?,
            )
        } else {
            None
        };

        let penetration_test = if config.enable_penetration_testing {
            self.report_stage(total_stages, total_stages, "Validating exploitability");
            Some(
                self.validator
                    .validate(&vulnerabilities, &target, self.clock.as_ref())
                    .await
                    .map_err(|e| ScanError::stage("validation", e))?,
            )
        } else {
            None
        };

        let risk_score = match &penetration_test {
            Some(test) => test.risk_score.min(100),
            None => RiskPolicy::weighted_risk_score(&vulnerabilities),
        };
        let severity = RiskPolicy::classify_findings(risk_score, &vulnerabilities);

        Ok(ScanOutcome {
            vulnerabilities,
            anomaly_analysis,
            penetration_test,
            risk_score,
            severity,
        })
    }

    fn report(&self, message: &str) {
        if let Some(progress) = &self.progress {
            progress.report(message);
        }
    }

    fn report_stage(&self, current: usize, total: usize, name: &str) {
        if let Some(progress) = &self.progress {
            progress.report_progress(current, total, Some(name));
        }
    }

}

#[async_trait]
impl ScanExecutor for ScanEngine {
    async fn execute_scan(&self, request: ScanRequest) -> Result<ScanResult> {
        self.execute(request).await
    }
}
