use crate::scan_orchestration::domain::{
    Anomaly, ExploitStatistics, ScanResult, ScanStatus, ScanSummary,
};
use crate::scan_orchestration::services::{AnomalyAnalyzer, RemediationPlan, ScanHistoryEntry};
use serde::Serialize;

/// Everything a presenter renders for one finished scan
///
/// Derived views (summary, remediation plan, exploit statistics, trend anomalies)
/// are computed once here so every output format shows the same numbers.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanReport {
    pub result: ScanResult,
    pub summary: ScanSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remediation_plan: Option<RemediationPlan>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exploit_statistics: Option<ExploitStatistics>,
    /// Finding-count spikes relative to earlier scans of the same target
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub trend_anomalies: Vec<Anomaly>,
}

impl ScanReport {
    /// Builds the report; `history` holds earlier completed scans of the same target
    pub fn new(result: ScanResult, history: &[ScanResult]) -> Self {
        let analyzer = AnomalyAnalyzer::new();
        let summary = result.summary();

        let remediation_plan = result
            .anomaly_analysis
            .as_ref()
            .map(|analysis| analyzer.remediation_plan(&result.vulnerabilities, analysis));
        let exploit_statistics = result
            .penetration_test
            .as_ref()
            .map(|test| ExploitStatistics::from_exploits(&test.exploits));

        let trend_anomalies = if result.status == ScanStatus::Completed {
            let mut entries: Vec<ScanHistoryEntry> = history
                .iter()
                .filter(|past| past.status == ScanStatus::Completed && past.id != result.id)
                .map(|past| ScanHistoryEntry {
                    vulnerability_count: past.vulnerabilities.len(),
                    timestamp: past.started_at,
                })
                .collect();
            entries.push(ScanHistoryEntry {
                vulnerability_count: result.vulnerabilities.len(),
                timestamp: result.started_at,
            });
            entries.sort_by_key(|entry| entry.timestamp);
            analyzer.detect_anomalies(&entries)
        } else {
            Vec::new()
        };

        Self {
            result,
            summary,
            remediation_plan,
            exploit_statistics,
            trend_anomalies,
        }
    }
}
