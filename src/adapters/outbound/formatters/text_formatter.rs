use crate::application::dto::ScanReport;
use crate::ports::outbound::ReportFormatter;
use crate::scan_orchestration::domain::{
    AnomalyAnalysis, ExploitStatistics, Priority, ScanStatus, Vulnerability,
};
use crate::scan_orchestration::services::RemediationPlan;
use crate::shared::Result;

/// Width of section underlines
const RULE_WIDTH: usize = 60;

/// Longest evidence excerpt shown per finding
const MAX_EVIDENCE_CHARS: usize = 80;

/// TextReportFormatter adapter for a human-readable plain-text report
///
/// Sections are rendered only when the scan produced data for them, so a scan
/// without exploit validation has no exploit section.
pub struct TextReportFormatter;

impl TextReportFormatter {
    pub fn new() -> Self {
        Self
    }

    fn section(output: &mut String, title: &str) {
        output.push('\n');
        output.push_str(title);
        output.push('\n');
        output.push_str(&"-".repeat(RULE_WIDTH));
        output.push('\n');
    }

    fn truncate(text: &str, max_chars: usize) -> String {
        if text.chars().count() <= max_chars {
            text.to_string()
        } else {
            let truncated: String = text.chars().take(max_chars).collect();
            format!("{}...", truncated)
        }
    }

    fn priority_label(priority: Priority) -> &'static str {
        match priority {
            Priority::High => "HIGH",
            Priority::Medium => "MEDIUM",
            Priority::Low => "LOW",
        }
    }
}

impl Default for TextReportFormatter {
    fn default() -> Self {
        Self::new()
    }
}

/// Helper methods for rendering sections
impl TextReportFormatter {
    fn render_header(&self, output: &mut String, report: &ScanReport) {
        let result = &report.result;
        output.push_str("Security Scan Report\n");
        output.push_str(&"=".repeat(RULE_WIDTH));
        output.push('\n');
        output.push_str(&format!("Scan ID:    {}\n", result.id));
        output.push_str(&format!("Target:     {} ({})\n", result.target, result.scan_type));
        let status = match result.status {
            ScanStatus::Completed => "completed",
            ScanStatus::Failed => "failed",
            ScanStatus::Scanning => "scanning",
            ScanStatus::Queued => "queued",
        };
        output.push_str(&format!("Status:     {}\n", status));
        output.push_str(&format!(
            "Started:    {}\n",
            result.started_at.format("%Y-%m-%d %H:%M:%S UTC")
        ));
        output.push_str(&format!("Duration:   {}s\n", result.duration));
    }

    fn render_summary(&self, output: &mut String, report: &ScanReport) {
        let summary = &report.summary;
        Self::section(output, "Summary");
        output.push_str(&format!(
            "Risk score: {}/100 ({})\n",
            summary.risk_score, summary.severity
        ));
        output.push_str(&format!("Findings:   {}", summary.total_vulnerabilities));
        if summary.total_vulnerabilities > 0 {
            let distribution: Vec<String> = ["critical", "high", "medium", "low"]
                .iter()
                .map(|s| {
                    format!(
                        "{} {}",
                        summary.severity_distribution.get(*s).copied().unwrap_or(0),
                        s
                    )
                })
                .collect();
            output.push_str(&format!(" ({})", distribution.join(", ")));
        }
        output.push('\n');
    }

    fn render_findings(&self, output: &mut String, vulnerabilities: &[Vulnerability]) {
        if vulnerabilities.is_empty() {
            return;
        }
        Self::section(output, "Findings");

        let mut ordered: Vec<&Vulnerability> = vulnerabilities.iter().collect();
        ordered.sort_by(|a, b| {
            b.severity()
                .cmp(&a.severity())
                .then_with(|| b.risk_score().cmp(&a.risk_score()))
        });

        for (index, vuln) in ordered.iter().enumerate() {
            output.push_str(&format!(
                "{}. [{}] {} (score {})\n",
                index + 1,
                vuln.severity().as_str().to_uppercase(),
                vuln.title(),
                vuln.risk_score()
            ));
            let mut refs = Vec::new();
            if let Some(cwe) = vuln.cwe_id() {
                refs.push(cwe.to_string());
            }
            if let Some(owasp) = vuln.owasp_category() {
                refs.push(owasp.to_string());
            }
            if !refs.is_empty() {
                output.push_str(&format!("   {}\n", refs.join(" | ")));
            }
            if let Some(location) = vuln.location() {
                output.push_str(&format!("   Location: {}\n", location));
            }
            if let Some(evidence) = vuln.evidence() {
                output.push_str(&format!(
                    "   Evidence: {}\n",
                    Self::truncate(evidence, MAX_EVIDENCE_CHARS)
                ));
            }
            output.push_str(&format!("   Fix: {}\n", vuln.recommendation()));
        }
    }

    fn render_analysis(&self, output: &mut String, analysis: &AnomalyAnalysis) {
        Self::section(output, "Analysis");
        output.push_str(&format!(
            "Confidence: {}% (model {})\n",
            analysis.confidence, analysis.model_version
        ));
        for anomaly in &analysis.anomalies {
            output.push_str(&format!(
                "* {} [{}, confidence {}%]\n  {}\n",
                anomaly.description, anomaly.severity, anomaly.confidence, anomaly.recommendation
            ));
        }
    }

    fn render_exploits(
        &self,
        output: &mut String,
        stats: &ExploitStatistics,
        report: &ScanReport,
    ) {
        Self::section(output, "Exploit Validation");
        output.push_str(&format!(
            "Attempts: {}  successful: {}  blocked: {}  failed: {}  timeout: {}\n",
            stats.total, stats.successful, stats.blocked, stats.failed, stats.timeout
        ));
        output.push_str(&format!(
            "Validated: {}  mitigated: {}  false positives: {}\n",
            report.summary.validated_exploits,
            report.summary.mitigated,
            report.summary.false_positives
        ));
    }

    fn render_plan(&self, output: &mut String, plan: &RemediationPlan) {
        Self::section(output, "Remediation Plan");
        output.push_str(&format!("{}\n", plan.summary));
        output.push_str(&format!("{}\n", plan.risk_assessment));
        output.push_str(&format!("Estimated fix time: {}\n", plan.estimated_fix_time));
        for (index, action) in plan.prioritized_actions.iter().enumerate() {
            output.push_str(&format!(
                "{}. [{}] {}\n",
                index + 1,
                Self::priority_label(action.priority),
                action.title
            ));
        }
    }

    fn render_trend(&self, output: &mut String, report: &ScanReport) {
        if report.trend_anomalies.is_empty() {
            return;
        }
        Self::section(output, "Trend");
        for anomaly in &report.trend_anomalies {
            output.push_str(&format!("* {}\n", anomaly.description));
        }
    }
}

impl ReportFormatter for TextReportFormatter {
    fn format(&self, report: &ScanReport) -> Result<String> {
        let mut output = String::new();

        self.render_header(&mut output, report);
        self.render_summary(&mut output, report);
        self.render_findings(&mut output, &report.result.vulnerabilities);
        if let Some(analysis) = &report.result.anomaly_analysis {
            self.render_analysis(&mut output, analysis);
        }
        if let Some(stats) = &report.exploit_statistics {
            self.render_exploits(&mut output, stats, report);
        }
        if let Some(plan) = &report.remediation_plan {
            self.render_plan(&mut output, plan);
        }
        self.render_trend(&mut output, report);

        Ok(output)
    }
}
