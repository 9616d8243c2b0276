use crate::scan_orchestration::domain::{
    ExploitResult, ExploitStatus, ExploitType, PenetrationTest, Vulnerability, VulnerabilityType,
};
use crate::scan_orchestration::policies::clamp_score;
use crate::shared::id::generate_id;
use chrono::{DateTime, Utc};

/// Score reduction applied to the exploit of an unconfirmed finding
const UNCONFIRMED_EXPLOIT_DISCOUNT: u8 = 20;

/// Aggregate score reduction per exploited but unconfirmed finding
const UNCONFIRMED_PENALTY: f64 = 5.0;

/// ExploitValidator - turns exploit outcomes into a penetration-test verdict
///
/// The validator owns the fixed tables (exploit category and payload per finding
/// type) and the aggregation rules. Deciding the outcome of an attempt is left to
/// a pluggable harness, so this type never performs I/O itself.
#[derive(Debug, Default, Clone)]
pub struct ExploitValidator;

impl ExploitValidator {
    pub fn new() -> Self {
        Self
    }

    /// Representative payload for a finding type
    pub fn payload_for(vuln_type: VulnerabilityType) -> &'static str {
        match vuln_type {
            VulnerabilityType::SqlInjection => "' OR '1'='1' --",
            VulnerabilityType::Xss => "<script>alert('XSS')</script>",
            VulnerabilityType::Csrf => "<img src='http://attacker.com/csrf'>",
            VulnerabilityType::FileInclusion => "../../../etc/passwd",
            VulnerabilityType::AuthBypass => "admin=true",
            VulnerabilityType::Ssrf => "http://localhost:8080/admin",
            VulnerabilityType::Xxe => {
                "<?xml version='1.0'?><!DOCTYPE foo [<!ENTITY xxe SYSTEM 'file:///etc/passwd'>]><foo>&xxe;</foo>"
            }
            _ => "test_payload",
        }
    }

    /// Records the outcome of one attempt against `vuln`
    ///
    /// `validated` is true exactly when the attempt succeeded. Unconfirmed attempts
    /// keep the finding's score minus a fixed discount.
    pub fn record_attempt(
        &self,
        vuln: &Vulnerability,
        status: ExploitStatus,
        executed_at: DateTime<Utc>,
    ) -> ExploitResult {
        let validated = status == ExploitStatus::Success;
        let risk_score = if validated {
            vuln.risk_score()
        } else {
            vuln.risk_score().saturating_sub(UNCONFIRMED_EXPLOIT_DISCOUNT)
        };

        ExploitResult {
            id: generate_id("exploit"),
            vulnerability_id: vuln.id().to_string(),
            exploit_type: ExploitType::for_vulnerability(vuln.vuln_type()),
            status,
            severity: vuln.severity(),
            description: format!("Exploit test for {}", vuln.title()),
            payload: Self::payload_for(vuln.vuln_type()).to_string(),
            response: if validated {
                "Exploit successful - vulnerability confirmed".to_string()
            } else {
                "Exploit failed or blocked".to_string()
            },
            validated,
            risk_score,
            executed_at,
        }
    }

    /// Classifies findings by the outcome of their exploit and scores the whole test
    ///
    /// Findings whose exploit succeeded are validated, blocked ones are mitigated and
    /// failed ones are false positives. A timed-out attempt proves nothing either way,
    /// so its finding is in none of the three lists.
    pub fn assemble(
        &self,
        vulnerabilities: &[Vulnerability],
        exploits: Vec<ExploitResult>,
        tested_at: DateTime<Utc>,
    ) -> PenetrationTest {
        let mut validated_vulnerabilities = Vec::new();
        let mut false_positives = Vec::new();
        let mut mitigated = Vec::new();

        for exploit in &exploits {
            let Some(vuln) = vulnerabilities
                .iter()
                .find(|v| v.id() == exploit.vulnerability_id)
            else {
                continue;
            };
            match exploit.status {
                ExploitStatus::Success => validated_vulnerabilities.push(vuln.clone()),
                ExploitStatus::Blocked => mitigated.push(vuln.clone()),
                ExploitStatus::Failed => false_positives.push(vuln.clone()),
                ExploitStatus::Timeout => {}
            }
        }

        let risk_score = Self::aggregate_risk(&exploits, &validated_vulnerabilities);

        PenetrationTest {
            exploits,
            validated_vulnerabilities,
            false_positives,
            mitigated,
            risk_score,
            tested_at,
        }
    }

    /// Aggregate penetration-test score
    ///
    /// Mean score of validated findings, averaged with the mean score of successful
    /// exploits when there are any, then reduced by 5 per exploit that did not
    /// validate. Zero exploits score 0.
    pub fn aggregate_risk(exploits: &[ExploitResult], validated: &[Vulnerability]) -> u8 {
        if exploits.is_empty() {
            return 0;
        }

        let mean = |scores: &[u8]| -> f64 {
            if scores.is_empty() {
                0.0
            } else {
                scores.iter().map(|s| f64::from(*s)).sum::<f64>() / scores.len() as f64
            }
        };

        let validated_scores: Vec<u8> = validated.iter().map(|v| v.risk_score()).collect();
        let mut score = mean(&validated_scores);

        let successful_scores: Vec<u8> = exploits
            .iter()
            .filter(|e| e.status == ExploitStatus::Success)
            .map(|e| e.risk_score)
            .collect();
        if !successful_scores.is_empty() {
            score = (score + mean(&successful_scores)) / 2.0;
        }

        let unconfirmed = exploits.len().saturating_sub(validated.len());
        score = (score - UNCONFIRMED_PENALTY * unconfirmed as f64).max(0.0);

        clamp_score(score.round())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan_orchestration::domain::Severity;

    fn vuln(vuln_type: VulnerabilityType, score: u8) -> Vulnerability {
        Vulnerability::new(vuln_type, Severity::High, "Finding", "d", "r", score)
    }

    #[test]
    fn test_payload_table() {
        assert_eq!(
            ExploitValidator::payload_for(VulnerabilityType::SqlInjection),
            "' OR '1'='1' --"
        );
        assert_eq!(
            ExploitValidator::payload_for(VulnerabilityType::SensitiveDataExposure),
            "test_payload"
        );
    }

    #[test]
    fn test_record_successful_attempt() {
        let v = vuln(VulnerabilityType::Xss, 75);
        let exploit = ExploitValidator::new().record_attempt(&v, ExploitStatus::Success, Utc::now());
        assert!(exploit.validated);
        assert_eq!(exploit.risk_score, 75);
        assert_eq!(exploit.vulnerability_id, v.id());
        assert_eq!(exploit.exploit_type, ExploitType::XssExploit);
        assert_eq!(exploit.severity, Severity::High);
        assert_eq!(exploit.description, "Exploit test for Finding");
    }

    #[test]
    fn test_record_unconfirmed_attempt_discounts_score() {
        let validator = ExploitValidator::new();
        let v = vuln(VulnerabilityType::Xss, 75);
        for status in [ExploitStatus::Failed, ExploitStatus::Blocked, ExploitStatus::Timeout] {
            let exploit = validator.record_attempt(&v, status, Utc::now());
            assert!(!exploit.validated);
            assert_eq!(exploit.risk_score, 55);
        }

        let low = vuln(VulnerabilityType::Xss, 10);
        assert_eq!(
            validator
                .record_attempt(&low, ExploitStatus::Failed, Utc::now())
                .risk_score,
            0
        );
    }

    #[test]
    fn test_assemble_splits_unconfirmed_findings() {
        let validator = ExploitValidator::new();
        let vulns = vec![
            vuln(VulnerabilityType::SqlInjection, 90),
            vuln(VulnerabilityType::Xss, 75),
            vuln(VulnerabilityType::Csrf, 50),
            vuln(VulnerabilityType::Ssrf, 80),
        ];
        let statuses = [
            ExploitStatus::Success,
            ExploitStatus::Blocked,
            ExploitStatus::Failed,
            ExploitStatus::Timeout,
        ];
        let exploits = vulns
            .iter()
            .zip(statuses)
            .map(|(v, s)| validator.record_attempt(v, s, Utc::now()))
            .collect();

        let test = validator.assemble(&vulns, exploits, Utc::now());
        assert_eq!(test.exploits.len(), 4);
        assert_eq!(test.validated_vulnerabilities.len(), 1);
        assert_eq!(test.validated_vulnerabilities[0].id(), vulns[0].id());
        assert_eq!(test.mitigated[0].id(), vulns[1].id());
        assert_eq!(test.false_positives[0].id(), vulns[2].id());
        assert_eq!(test.false_positives.len(), 1);
        // (90 + 90) / 2 - 3 * 5
        assert_eq!(test.risk_score, 75);
    }

    #[test]
    fn test_aggregate_zero_exploits() {
        assert_eq!(ExploitValidator::aggregate_risk(&[], &[]), 0);
    }

    #[test]
    fn test_aggregate_nothing_validated() {
        let validator = ExploitValidator::new();
        let v = vuln(VulnerabilityType::Xss, 90);
        let exploits = vec![validator.record_attempt(&v, ExploitStatus::Failed, Utc::now())];
        assert_eq!(ExploitValidator::aggregate_risk(&exploits, &[]), 0);
    }

    #[test]
    fn test_aggregate_all_validated() {
        let validator = ExploitValidator::new();
        let vulns = vec![
            vuln(VulnerabilityType::Xss, 80),
            vuln(VulnerabilityType::SqlInjection, 91),
        ];
        let exploits: Vec<ExploitResult> = vulns
            .iter()
            .map(|v| validator.record_attempt(v, ExploitStatus::Success, Utc::now()))
            .collect();
        // mean 85.5 averaged with itself, rounded
        assert_eq!(ExploitValidator::aggregate_risk(&exploits, &vulns), 86);
    }
}
