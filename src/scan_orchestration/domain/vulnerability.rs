use crate::shared::id::generate_id;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity of a single finding, anomaly or exploit attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Category of a detected vulnerability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VulnerabilityType {
    SqlInjection,
    Xss,
    AuthBypass,
    Csrf,
    Ssrf,
    Xxe,
    FileInclusion,
    CommandInjection,
    SecurityMisconfiguration,
    SensitiveDataExposure,
}

impl VulnerabilityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            VulnerabilityType::SqlInjection => "SQL_INJECTION",
            VulnerabilityType::Xss => "XSS",
            VulnerabilityType::AuthBypass => "AUTH_BYPASS",
            VulnerabilityType::Csrf => "CSRF",
            VulnerabilityType::Ssrf => "SSRF",
            VulnerabilityType::Xxe => "XXE",
            VulnerabilityType::FileInclusion => "FILE_INCLUSION",
            VulnerabilityType::CommandInjection => "COMMAND_INJECTION",
            VulnerabilityType::SecurityMisconfiguration => "SECURITY_MISCONFIGURATION",
            VulnerabilityType::SensitiveDataExposure => "SENSITIVE_DATA_EXPOSURE",
        }
    }

    /// Fixed CWE identifier for this category
    pub fn cwe_id(&self) -> &'static str {
        match self {
            VulnerabilityType::SqlInjection => "CWE-89",
            VulnerabilityType::Xss => "CWE-79",
            VulnerabilityType::AuthBypass => "CWE-287",
            VulnerabilityType::Csrf => "CWE-352",
            VulnerabilityType::Ssrf => "CWE-918",
            VulnerabilityType::Xxe => "CWE-611",
            VulnerabilityType::FileInclusion => "CWE-98",
            VulnerabilityType::CommandInjection => "CWE-78",
            VulnerabilityType::SecurityMisconfiguration => "CWE-16",
            VulnerabilityType::SensitiveDataExposure => "CWE-200",
        }
    }

    /// Fixed OWASP Top-10 (2021) category for this category
    pub fn owasp_category(&self) -> &'static str {
        match self {
            VulnerabilityType::SqlInjection
            | VulnerabilityType::Xss
            | VulnerabilityType::FileInclusion
            | VulnerabilityType::CommandInjection => "A03:2021 - Injection",
            VulnerabilityType::AuthBypass => {
                "A07:2021 - Identification and Authentication Failures"
            }
            VulnerabilityType::Csrf => "A01:2021 - Broken Access Control",
            VulnerabilityType::Ssrf => "A10:2021 - Server-Side Request Forgery",
            VulnerabilityType::Xxe | VulnerabilityType::SecurityMisconfiguration => {
                "A05:2021 - Security Misconfiguration"
            }
            VulnerabilityType::SensitiveDataExposure => "A02:2021 - Cryptographic Failures",
        }
    }
}

impl fmt::Display for VulnerabilityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single finding emitted by the detector
///
/// Fields are private; a vulnerability is never modified once it has been
/// handed to the analyzer or validator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vulnerability {
    id: String,
    #[serde(rename = "type")]
    vuln_type: VulnerabilityType,
    severity: Severity,
    title: String,
    description: String,
    cwe_id: Option<String>,
    owasp_category: Option<String>,
    location: Option<String>,
    evidence: Option<String>,
    recommendation: String,
    risk_score: u8,
    detected_at: DateTime<Utc>,
}

impl Vulnerability {
    /// Creates a finding; CWE and OWASP mappings are looked up from the type
    /// and the risk score is clamped to 100.
    pub fn new(
        vuln_type: VulnerabilityType,
        severity: Severity,
        title: impl Into<String>,
        description: impl Into<String>,
        recommendation: impl Into<String>,
        risk_score: u8,
    ) -> Self {
        Self {
            id: generate_id("vuln"),
            vuln_type,
            severity,
            title: title.into(),
            description: description.into(),
            cwe_id: Some(vuln_type.cwe_id().to_string()),
            owasp_category: Some(vuln_type.owasp_category().to_string()),
            location: None,
            evidence: None,
            recommendation: recommendation.into(),
            risk_score: risk_score.min(100),
            detected_at: Utc::now(),
        }
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_evidence(mut self, evidence: impl Into<String>) -> Self {
        self.evidence = Some(evidence.into());
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn vuln_type(&self) -> VulnerabilityType {
        self.vuln_type
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn cwe_id(&self) -> Option<&str> {
        self.cwe_id.as_deref()
    }

    pub fn owasp_category(&self) -> Option<&str> {
        self.owasp_category.as_deref()
    }

    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    pub fn evidence(&self) -> Option<&str> {
        self.evidence.as_deref()
    }

    pub fn recommendation(&self) -> &str {
        &self.recommendation
    }

    pub fn risk_score(&self) -> u8 {
        self.risk_score
    }

    pub fn detected_at(&self) -> DateTime<Utc> {
        self.detected_at
    }
}

/// Counts findings of a given severity
pub fn count_severity(vulnerabilities: &[Vulnerability], severity: Severity) -> usize {
    vulnerabilities
        .iter()
        .filter(|v| v.severity() == severity)
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vulnerability {
        Vulnerability::new(
            VulnerabilityType::SqlInjection,
            Severity::Critical,
            "SQL query built by string concatenation",
            "User input reaches a SQL statement",
            "Use parameterized queries",
            92,
        )
    }

    #[test]
    fn test_new_maps_cwe_and_owasp() {
        let vuln = sample();
        assert_eq!(vuln.cwe_id(), Some("CWE-89"));
        assert_eq!(vuln.owasp_category(), Some("A03:2021 - Injection"));
        assert!(vuln.id().starts_with("vuln-"));
    }

    #[test]
    fn test_risk_score_clamped() {
        let vuln = Vulnerability::new(
            VulnerabilityType::Xss,
            Severity::High,
            "t",
            "d",
            "r",
            250,
        );
        assert_eq!(vuln.risk_score(), 100);
    }

    #[test]
    fn test_serialized_field_names() {
        let json = serde_json::to_value(sample().with_location("line 3")).unwrap();
        assert_eq!(json["type"], "SQL_INJECTION");
        assert_eq!(json["severity"], "critical");
        assert_eq!(json["riskScore"], 92);
        assert_eq!(json["cweId"], "CWE-89");
        assert_eq!(json["location"], "line 3");
        assert!(json.get("detectedAt").is_some());
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Critical > Severity::High);
        assert!(Severity::High > Severity::Medium);
        assert!(Severity::Medium > Severity::Low);
    }

    #[test]
    fn test_count_severity() {
        let vulns = vec![sample(), sample()];
        assert_eq!(count_severity(&vulns, Severity::Critical), 2);
        assert_eq!(count_severity(&vulns, Severity::Low), 0);
    }
}
