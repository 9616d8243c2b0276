use super::analysis::AnomalyAnalysis;
use super::exploit::PenetrationTest;
use super::vulnerability::{count_severity, Severity, Vulnerability};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Kind of target being scanned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanType {
    Url,
    Api,
    File,
}

impl ScanType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScanType::Url => "url",
            ScanType::Api => "api",
            ScanType::File => "file",
        }
    }
}

impl fmt::Display for ScanType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScanType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "url" => Ok(ScanType::Url),
            "api" => Ok(ScanType::Api),
            "file" => Ok(ScanType::File),
            _ => Err(format!(
                "Invalid scan type: {}. Please specify 'url', 'api' or 'file'",
                s
            )),
        }
    }
}

/// How many detection rules run; each depth includes the shallower ones
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanDepth {
    Basic,
    Standard,
    Comprehensive,
}

impl FromStr for ScanDepth {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "basic" => Ok(ScanDepth::Basic),
            "standard" => Ok(ScanDepth::Standard),
            "comprehensive" => Ok(ScanDepth::Comprehensive),
            _ => Err(format!(
                "Invalid scan depth: {}. Please specify 'basic', 'standard' or 'comprehensive'",
                s
            )),
        }
    }
}

/// Per-scan configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScanConfig {
    pub scan_depth: ScanDepth,
    pub include_vulnerabilities: bool,
    pub include_malware: bool,
    pub include_phishing: bool,
    pub include_performance: bool,
    #[serde(rename = "enableAIAnalysis")]
    pub enable_ai_analysis: bool,
    pub enable_penetration_testing: bool,
    /// Hard deadline for the whole pipeline, in seconds
    pub timeout: u64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            scan_depth: ScanDepth::Standard,
            include_vulnerabilities: true,
            include_malware: true,
            include_phishing: true,
            include_performance: false,
            enable_ai_analysis: true,
            enable_penetration_testing: true,
            timeout: 300,
        }
    }
}

/// Lifecycle of a scan: `Queued -> Scanning -> Completed | Failed`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanStatus {
    Queued,
    Scanning,
    Completed,
    Failed,
}

impl ScanStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ScanStatus::Completed | ScanStatus::Failed)
    }
}

/// Overall verdict of a scan
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanSeverity {
    Clean,
    Low,
    Medium,
    High,
    Critical,
}

impl ScanSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScanSeverity::Clean => "clean",
            ScanSeverity::Low => "low",
            ScanSeverity::Medium => "medium",
            ScanSeverity::High => "high",
            ScanSeverity::Critical => "critical",
        }
    }
}

impl fmt::Display for ScanSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScanSeverity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "clean" => Ok(ScanSeverity::Clean),
            "low" => Ok(ScanSeverity::Low),
            "medium" => Ok(ScanSeverity::Medium),
            "high" => Ok(ScanSeverity::High),
            "critical" => Ok(ScanSeverity::Critical),
            _ => Err(format!(
                "Invalid severity: {}. Please specify one of clean, low, medium, high, critical",
                s
            )),
        }
    }
}

/// Aggregate root of one scan run
///
/// Only the scan engine mutates a `ScanResult`; once `status` is terminal the
/// value is final. A failed result has exactly the same shape as a completed one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResult {
    pub id: String,
    pub target: String,
    #[serde(rename = "type")]
    pub scan_type: ScanType,
    pub status: ScanStatus,
    pub vulnerabilities: Vec<Vulnerability>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anomaly_analysis: Option<AnomalyAnalysis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub penetration_test: Option<PenetrationTest>,
    pub risk_score: u8,
    pub severity: ScanSeverity,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    /// Whole seconds between start and completion
    pub duration: u64,
    pub config: ScanConfig,
}

impl ScanResult {
    /// A freshly started scan in the `Scanning` state
    pub fn started(
        id: String,
        target: String,
        scan_type: ScanType,
        config: ScanConfig,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            target,
            scan_type,
            status: ScanStatus::Scanning,
            vulnerabilities: Vec::new(),
            anomaly_analysis: None,
            penetration_test: None,
            risk_score: 0,
            severity: ScanSeverity::Clean,
            started_at,
            completed_at: None,
            duration: 0,
            config,
        }
    }

    /// Moves the scan to a terminal state and stamps completion time and duration
    fn finish(&mut self, status: ScanStatus, completed_at: DateTime<Utc>) {
        self.status = status;
        self.completed_at = Some(completed_at);
        self.duration = (completed_at - self.started_at).num_seconds().max(0) as u64;
    }

    pub fn complete(
        mut self,
        outcome: ScanOutcome,
        completed_at: DateTime<Utc>,
    ) -> Self {
        self.vulnerabilities = outcome.vulnerabilities;
        self.anomaly_analysis = outcome.anomaly_analysis;
        self.penetration_test = outcome.penetration_test;
        self.risk_score = outcome.risk_score.min(100);
        self.severity = if self.vulnerabilities.is_empty() {
            ScanSeverity::Clean
        } else {
            outcome.severity
        };
        self.finish(ScanStatus::Completed, completed_at);
        self
    }

    /// Terminal failure: any partial stage output is discarded
    pub fn fail(mut self, completed_at: DateTime<Utc>) -> Self {
        self.vulnerabilities.clear();
        self.anomaly_analysis = None;
        self.penetration_test = None;
        self.risk_score = 0;
        self.severity = ScanSeverity::Clean;
        self.finish(ScanStatus::Failed, completed_at);
        self
    }

    pub fn summary(&self) -> ScanSummary {
        ScanSummary::from_result(self)
    }
}

/// Everything the pipeline produced for a successful scan
#[derive(Debug, Clone)]
pub struct ScanOutcome {
    pub vulnerabilities: Vec<Vulnerability>,
    pub anomaly_analysis: Option<AnomalyAnalysis>,
    pub penetration_test: Option<PenetrationTest>,
    pub risk_score: u8,
    pub severity: ScanSeverity,
}

/// Condensed statistics for dashboards and CLI output
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanSummary {
    pub total_vulnerabilities: usize,
    pub severity_distribution: BTreeMap<String, usize>,
    pub risk_score: u8,
    pub severity: ScanSeverity,
    pub duration: u64,
    pub ai_confidence: u8,
    pub validated_exploits: usize,
    pub false_positives: usize,
    pub mitigated: usize,
}

impl ScanSummary {
    pub fn from_result(result: &ScanResult) -> Self {
        let severity_distribution = [
            Severity::Critical,
            Severity::High,
            Severity::Medium,
            Severity::Low,
        ]
        .iter()
        .map(|s| {
            (
                s.as_str().to_string(),
                count_severity(&result.vulnerabilities, *s),
            )
        })
        .collect();

        let pentest = result.penetration_test.as_ref();
        Self {
            total_vulnerabilities: result.vulnerabilities.len(),
            severity_distribution,
            risk_score: result.risk_score,
            severity: result.severity,
            duration: result.duration,
            ai_confidence: result
                .anomaly_analysis
                .as_ref()
                .map(|a| a.confidence)
                .unwrap_or(0),
            validated_exploits: pentest.map(|p| p.validated_vulnerabilities.len()).unwrap_or(0),
            false_positives: pentest.map(|p| p.false_positives.len()).unwrap_or(0),
            mitigated: pentest.map(|p| p.mitigated.len()).unwrap_or(0),
        }
    }
}
