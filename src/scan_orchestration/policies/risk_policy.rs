use crate::scan_orchestration::domain::{count_severity, ScanSeverity, Severity, Vulnerability};

/// RiskPolicy encodes how individual findings roll up into a scan verdict
///
/// Two rules live here:
/// 1. The fallback aggregate score used when exploit validation did not run,
///    a severity-weighted average of the findings' own scores
/// 2. The severity threshold table applied to the final score and finding counts
pub struct RiskPolicy;

impl RiskPolicy {
    /// Weight of each finding severity in the fallback average
    fn weight(severity: Severity) -> u32 {
        match severity {
            Severity::Critical => 4,
            Severity::High => 3,
            Severity::Medium => 2,
            Severity::Low => 1,
        }
    }

    /// Severity-weighted average of finding scores, rounded and clamped to [0, 100]
    ///
    /// Returns 0 for an empty slice.
    pub fn weighted_risk_score(vulnerabilities: &[Vulnerability]) -> u8 {
        let (weighted_sum, total_weight) =
            vulnerabilities
                .iter()
                .fold((0u32, 0u32), |(sum, weights), v| {
                    let w = Self::weight(v.severity());
                    (sum + w * u32::from(v.risk_score()), weights + w)
                });

        if total_weight == 0 {
            return 0;
        }

        let average = (weighted_sum as f64 / total_weight as f64).round();
        clamp_score(average)
    }

    /// Overall scan severity from the threshold table
    ///
    /// | verdict  | condition                                          |
    /// |----------|----------------------------------------------------|
    /// | clean    | no findings                                        |
    /// | critical | score >= 80 or critical >= 2                       |
    /// | high     | score >= 60 or high >= 2 or critical >= 1          |
    /// | medium   | score >= 40 or high >= 1                           |
    /// | low      | score >= 20                                        |
    /// | clean    | otherwise                                          |
    pub fn classify(
        risk_score: u8,
        critical_count: usize,
        high_count: usize,
        has_vulnerabilities: bool,
    ) -> ScanSeverity {
        if !has_vulnerabilities {
            return ScanSeverity::Clean;
        }
        if risk_score >= 80 || critical_count >= 2 {
            ScanSeverity::Critical
        } else if risk_score >= 60 || high_count >= 2 || critical_count >= 1 {
            ScanSeverity::High
        } else if risk_score >= 40 || high_count >= 1 {
            ScanSeverity::Medium
        } else if risk_score >= 20 {
            ScanSeverity::Low
        } else {
            ScanSeverity::Clean
        }
    }

    /// Convenience wrapper that counts severities from the findings themselves
    pub fn classify_findings(risk_score: u8, vulnerabilities: &[Vulnerability]) -> ScanSeverity {
        Self::classify(
            risk_score,
            count_severity(vulnerabilities, Severity::Critical),
            count_severity(vulnerabilities, Severity::High),
            !vulnerabilities.is_empty(),
        )
    }
}

/// Clamps an already rounded score into [0, 100]
pub fn clamp_score(score: f64) -> u8 {
    if score.is_nan() || score <= 0.0 {
        0
    } else if score >= 100.0 {
        100
    } else {
        score as u8
    }
}
