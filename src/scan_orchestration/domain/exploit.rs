use super::vulnerability::{Severity, Vulnerability, VulnerabilityType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Exploit category used to confirm a finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExploitType {
    SqlInjectionExploit,
    XssExploit,
    CsrfExploit,
    FileInclusionExploit,
    AuthBypassExploit,
    SsrfExploit,
    CommandInjectionExploit,
    XxeExploit,
}

impl ExploitType {
    /// Fixed mapping from finding type to exploit category.
    /// Types without a dedicated exploit fall back to command injection.
    pub fn for_vulnerability(vuln_type: VulnerabilityType) -> Self {
        match vuln_type {
            VulnerabilityType::SqlInjection => ExploitType::SqlInjectionExploit,
            VulnerabilityType::Xss => ExploitType::XssExploit,
            VulnerabilityType::Csrf => ExploitType::CsrfExploit,
            VulnerabilityType::FileInclusion => ExploitType::FileInclusionExploit,
            VulnerabilityType::AuthBypass => ExploitType::AuthBypassExploit,
            VulnerabilityType::Ssrf => ExploitType::SsrfExploit,
            VulnerabilityType::Xxe => ExploitType::XxeExploit,
            _ => ExploitType::CommandInjectionExploit,
        }
    }
}

/// Outcome of one exploit attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExploitStatus {
    Success,
    Failed,
    Blocked,
    Timeout,
}

/// Result of attempting to confirm one finding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExploitResult {
    pub id: String,
    /// Back-reference to the finding under test
    pub vulnerability_id: String,
    pub exploit_type: ExploitType,
    pub status: ExploitStatus,
    /// Copied from the source finding
    pub severity: Severity,
    pub description: String,
    pub payload: String,
    pub response: String,
    /// Always `status == Success`
    pub validated: bool,
    pub risk_score: u8,
    pub executed_at: DateTime<Utc>,
}

/// Output bundle of the exploit validator
///
/// Unconfirmed findings are split by cause: `false_positives` holds findings whose
/// exploit failed outright, `mitigated` holds findings whose exploit was blocked.
/// Timed-out attempts land in neither list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PenetrationTest {
    pub exploits: Vec<ExploitResult>,
    pub validated_vulnerabilities: Vec<Vulnerability>,
    pub false_positives: Vec<Vulnerability>,
    pub mitigated: Vec<Vulnerability>,
    pub risk_score: u8,
    pub tested_at: DateTime<Utc>,
}

/// Counts of exploit attempts by outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExploitStatistics {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    pub blocked: usize,
    pub timeout: usize,
    pub validated: usize,
}

impl ExploitStatistics {
    pub fn from_exploits(exploits: &[ExploitResult]) -> Self {
        let count = |status: ExploitStatus| exploits.iter().filter(|e| e.status == status).count();
        Self {
            total: exploits.len(),
            successful: count(ExploitStatus::Success),
            failed: count(ExploitStatus::Failed),
            blocked: count(ExploitStatus::Blocked),
            timeout: count(ExploitStatus::Timeout),
            validated: exploits.iter().filter(|e| e.validated).count(),
        }
    }
}
