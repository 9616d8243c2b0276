use crate::scan_orchestration::domain::{
    count_severity, Anomaly, AnomalyAnalysis, AnomalyType, Priority, ScanType, Severity,
    Suggestion, SuggestionType, Vulnerability, VulnerabilityType,
};
use crate::shared::id::generate_id;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashSet;

/// Version tag reported with every analysis
pub const MODEL_VERSION: &str = "v2.1.0";

/// Number of most recent scans compared against the historical mean
const RECENT_WINDOW: usize = 5;

/// Recent mean must exceed the historical mean by this factor to be unusual
const SPIKE_FACTOR: f64 = 1.5;

/// Maximum number of suggestions in a remediation plan
const PLAN_SIZE: usize = 5;

/// Context the analyzer needs about the scanned target
#[derive(Debug, Clone, Copy)]
pub struct AnalysisContext<'a> {
    pub target: &'a str,
    pub scan_type: ScanType,
}

/// Finding count of one past scan, used for trend detection
#[derive(Debug, Clone)]
pub struct ScanHistoryEntry {
    pub vulnerability_count: usize,
    pub timestamp: DateTime<Utc>,
}

/// Prioritized remediation report derived from an analysis
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemediationPlan {
    pub summary: String,
    pub risk_assessment: String,
    pub prioritized_actions: Vec<Suggestion>,
    pub estimated_fix_time: String,
}

/// AnomalyAnalyzer - rule-based synthesis of anomalies and remediation suggestions
///
/// The analyzer never mutates the findings it receives. Anomaly rules:
/// - three or more critical findings: suspicious pattern (confidence 85)
/// - any SQL injection: hidden vulnerability (confidence 75)
/// - five or more distinct finding types: zero-day indicator (confidence 60)
///
/// Every finding gets exactly one suggestion from a per-type template.
#[derive(Debug, Default, Clone)]
pub struct AnomalyAnalyzer;

impl AnomalyAnalyzer {
    pub fn new() -> Self {
        Self
    }

    pub fn analyze(
        &self,
        vulnerabilities: &[Vulnerability],
        context: AnalysisContext<'_>,
        now: DateTime<Utc>,
    ) -> AnomalyAnalysis {
        let anomalies = self.detect_pattern_anomalies(vulnerabilities);

        let mut suggestions: Vec<Suggestion> = vulnerabilities
            .iter()
            .map(|v| self.suggestion_for(v, context.scan_type))
            .collect();

        if context.scan_type == ScanType::Api && !vulnerabilities.is_empty() {
            suggestions.push(Suggestion {
                id: generate_id("suggestion"),
                suggestion_type: SuggestionType::ArchitectureImprovement,
                priority: Priority::High,
                title: "Implement API Gateway Security".to_string(),
                description: "Consider implementing an API gateway with rate limiting, authentication, and request validation.".to_string(),
                code_example: None,
                references: vec![
                    "https://owasp.org/www-project-api-security/".to_string(),
                    "https://cheatsheetseries.owasp.org/cheatsheets/REST_Security_Cheat_Sheet.html".to_string(),
                ],
            });
        }

        let confidence = Self::confidence(vulnerabilities, &anomalies);

        AnomalyAnalysis {
            anomalies,
            suggestions,
            confidence,
            model_version: MODEL_VERSION.to_string(),
            analyzed_at: now,
        }
    }

    fn detect_pattern_anomalies(&self, vulnerabilities: &[Vulnerability]) -> Vec<Anomaly> {
        let mut anomalies = Vec::new();
        if vulnerabilities.is_empty() {
            return anomalies;
        }

        if count_severity(vulnerabilities, Severity::Critical) >= 3 {
            anomalies.push(Anomaly {
                id: generate_id("anomaly"),
                anomaly_type: AnomalyType::SuspiciousPattern,
                severity: Severity::Critical,
                description: "Multiple critical vulnerabilities detected, indicating potential systemic security issues.".to_string(),
                confidence: 85,
                recommendation: "Conduct comprehensive security audit. Review security architecture and development practices.".to_string(),
            });
        }

        if vulnerabilities
            .iter()
            .any(|v| v.vuln_type() == VulnerabilityType::SqlInjection)
        {
            anomalies.push(Anomaly {
                id: generate_id("anomaly"),
                anomaly_type: AnomalyType::HiddenVulnerability,
                severity: Severity::High,
                description: "SQL injection vulnerabilities often indicate deeper authentication and authorization issues.".to_string(),
                confidence: 75,
                recommendation: "Review all database access patterns. Implement comprehensive input validation.".to_string(),
            });
        }

        let distinct_types: HashSet<VulnerabilityType> =
            vulnerabilities.iter().map(|v| v.vuln_type()).collect();
        if distinct_types.len() >= 5 {
            anomalies.push(Anomaly {
                id: generate_id("anomaly"),
                anomaly_type: AnomalyType::ZeroDayIndicator,
                severity: Severity::Medium,
                description: "Multiple vulnerability types detected, suggesting potential unknown security flaws.".to_string(),
                confidence: 60,
                recommendation: "Engage security researchers for deeper analysis. Consider bug bounty program.".to_string(),
            });
        }

        anomalies
    }

    fn suggestion_for(&self, vuln: &Vulnerability, scan_type: ScanType) -> Suggestion {
        let is_file = scan_type == ScanType::File;
        let (suggestion_type, priority, title, code_example, references): (
            SuggestionType,
            Priority,
            String,
            Option<&str>,
            &[&str],
        ) = match vuln.vuln_type() {
            VulnerabilityType::SqlInjection => (
                SuggestionType::CodeFix,
                Priority::High,
                "Fix SQL Injection Vulnerability".to_string(),
                is_file.then_some(
                    "// BAD: String query = \"SELECT * FROM users WHERE id = \" + userId;\n\
                     // GOOD: String query = \"SELECT * FROM users WHERE id = ?\";\n\
                     PreparedStatement stmt = connection.prepareStatement(query);\n\
                     stmt.setInt(1, userId);",
                ),
                &["https://owasp.org/www-community/attacks/SQL_Injection"],
            ),
            VulnerabilityType::Xss => (
                SuggestionType::CodeFix,
                Priority::High,
                "Fix XSS Vulnerability".to_string(),
                is_file.then_some(
                    "// BAD: document.getElementById('output').innerHTML = userInput;\n\
                     // GOOD: document.getElementById('output').textContent = userInput;\n\
                     // OR: document.getElementById('output').innerHTML = DOMPurify.sanitize(userInput);",
                ),
                &["https://owasp.org/www-community/attacks/xss/"],
            ),
            // priority capped at high
            VulnerabilityType::AuthBypass => (
                SuggestionType::ArchitectureImprovement,
                Priority::High,
                "Implement Proper Authentication".to_string(),
                None,
                &[
                    "https://owasp.org/www-project-authentication-cheat-sheet/",
                    "https://cheatsheetseries.owasp.org/cheatsheets/Authentication_Cheat_Sheet.html",
                ],
            ),
            VulnerabilityType::SensitiveDataExposure => (
                SuggestionType::ConfigurationChange,
                Priority::High,
                "Secure Sensitive Data".to_string(),
                None,
                &["https://owasp.org/www-project-top-ten/2017/A3_2017-Sensitive_Data_Exposure"],
            ),
            VulnerabilityType::SecurityMisconfiguration => (
                SuggestionType::ConfigurationChange,
                Priority::Medium,
                "Fix Security Misconfiguration".to_string(),
                None,
                &["https://owasp.org/www-project-top-ten/2017/A6_2017-Security_Misconfiguration"],
            ),
            other => (
                SuggestionType::CodeFix,
                Priority::Medium,
                format!("Fix {} Vulnerability", other),
                None,
                &[],
            ),
        };

        Suggestion {
            id: format!("suggestion-{}", vuln.id()),
            suggestion_type,
            priority,
            title,
            description: vuln.recommendation().to_string(),
            code_example: code_example.map(str::to_string),
            references: references.iter().map(|r| r.to_string()).collect(),
        }
    }

    /// Confidence = 50 + min(30, 5 per finding) + min(20, 5 per anomaly) + min(10, 2 per critical)
    fn confidence(vulnerabilities: &[Vulnerability], anomalies: &[Anomaly]) -> u8 {
        let critical = count_severity(vulnerabilities, Severity::Critical);
        let score = 50
            + (5 * vulnerabilities.len()).min(30)
            + (5 * anomalies.len()).min(20)
            + (2 * critical).min(10);
        score.min(100) as u8
    }

    /// Trend detection over past scans, oldest first
    ///
    /// Compares the mean finding count of the last five scans with the mean over
    /// the whole history. Needs at least two scans; returns no anomalies otherwise.
    pub fn detect_anomalies(&self, history: &[ScanHistoryEntry]) -> Vec<Anomaly> {
        if history.len() < 2 {
            return Vec::new();
        }

        let mean = |entries: &[ScanHistoryEntry]| -> f64 {
            entries
                .iter()
                .map(|e| e.vulnerability_count as f64)
                .sum::<f64>()
                / entries.len() as f64
        };

        let overall = mean(history);
        let recent = mean(&history[history.len().saturating_sub(RECENT_WINDOW)..]);

        if recent > overall * SPIKE_FACTOR {
            vec![Anomaly {
                id: generate_id("anomaly"),
                anomaly_type: AnomalyType::UnusualBehavior,
                severity: Severity::Medium,
                description: format!(
                    "Unusual spike in vulnerabilities detected. Recent average: {:.1}, Overall average: {:.1}",
                    recent, overall
                ),
                confidence: 70,
                recommendation: "Review recent changes in codebase or infrastructure. Check for new attack vectors.".to_string(),
            }]
        } else {
            Vec::new()
        }
    }

    /// Builds a prioritized remediation plan from findings and their analysis
    pub fn remediation_plan(
        &self,
        vulnerabilities: &[Vulnerability],
        analysis: &AnomalyAnalysis,
    ) -> RemediationPlan {
        let mut prioritized_actions = analysis.suggestions.clone();
        // stable sort keeps template order within one priority
        prioritized_actions.sort_by(|a, b| b.priority.cmp(&a.priority));
        prioritized_actions.truncate(PLAN_SIZE);

        if vulnerabilities.is_empty() {
            return RemediationPlan {
                summary: "No vulnerabilities detected. The target appears secure.".to_string(),
                risk_assessment: "Low risk. Continue regular security monitoring.".to_string(),
                prioritized_actions,
                estimated_fix_time: "N/A".to_string(),
            };
        }

        let total = vulnerabilities.len();
        let critical = count_severity(vulnerabilities, Severity::Critical);
        let high = count_severity(vulnerabilities, Severity::High);
        let average = vulnerabilities
            .iter()
            .map(|v| f64::from(v.risk_score()))
            .sum::<f64>()
            / total as f64;

        let (risk_assessment, estimated_fix_time) = if average >= 80.0 {
            (
                "CRITICAL RISK: Immediate action required. System is highly vulnerable to attacks.",
                "1-3 days (critical fixes)",
            )
        } else if average >= 60.0 {
            (
                "HIGH RISK: Significant security issues detected. Address vulnerabilities promptly.",
                "1-2 weeks",
            )
        } else if average >= 40.0 {
            (
                "MEDIUM RISK: Security improvements needed. Plan remediation within next sprint.",
                "2-4 weeks",
            )
        } else {
            (
                "LOW RISK: Minor security issues. Address during regular maintenance.",
                "1-2 months",
            )
        };

        RemediationPlan {
            summary: format!(
                "Detected {} {}: {} critical, {} high, {} medium/low.",
                total,
                if total == 1 { "vulnerability" } else { "vulnerabilities" },
                critical,
                high,
                total - critical - high
            ),
            risk_assessment: risk_assessment.to_string(),
            prioritized_actions,
            estimated_fix_time: estimated_fix_time.to_string(),
        }
    }
}
