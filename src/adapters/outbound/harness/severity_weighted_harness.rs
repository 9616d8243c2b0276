use crate::ports::outbound::ExploitHarness;
use crate::scan_orchestration::domain::{ExploitStatus, ScanTarget, Severity, Vulnerability};
use crate::shared::Result;
use async_trait::async_trait;
use sha2::{Digest, Sha256};

/// Width of the roll window classified as blocked, right after the success window
const BLOCKED_WINDOW: f64 = 0.2;

/// Width of the roll window classified as timeout, right after the blocked window
const TIMEOUT_WINDOW: f64 = 0.1;

/// SeverityWeightedHarness adapter estimating exploit outcomes from severity
///
/// Severe findings are more likely to be exploitable. The roll that picks the
/// outcome is derived from a SHA-256 digest of the target, the finding type and
/// its location, so the same finding on the same target always gets the same
/// outcome.
#[derive(Debug, Default, Clone)]
pub struct SeverityWeightedHarness;

impl SeverityWeightedHarness {
    pub fn new() -> Self {
        Self
    }

    pub fn success_probability(severity: Severity) -> f64 {
        match severity {
            Severity::Critical => 0.7,
            Severity::High => 0.5,
            Severity::Medium => 0.3,
            Severity::Low => 0.1,
        }
    }

    /// Maps a roll in `[0, 1)` onto the success, blocked and timeout windows
    pub fn outcome(severity: Severity, roll: f64) -> ExploitStatus {
        let success = Self::success_probability(severity);
        if roll < success {
            ExploitStatus::Success
        } else if roll < success + BLOCKED_WINDOW {
            ExploitStatus::Blocked
        } else if roll < success + BLOCKED_WINDOW + TIMEOUT_WINDOW {
            ExploitStatus::Timeout
        } else {
            ExploitStatus::Failed
        }
    }

    fn roll(vulnerability: &Vulnerability, target: &ScanTarget) -> f64 {
        let mut hasher = Sha256::new();
        hasher.update(target.as_str().as_bytes());
        hasher.update(b"|");
        hasher.update(vulnerability.vuln_type().as_str().as_bytes());
        hasher.update(b"|");
        hasher.update(vulnerability.location().unwrap_or_default().as_bytes());
        let digest = hasher.finalize();

        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&digest[..8]);
        // 53 significant bits fit an f64 mantissa exactly
        (u64::from_be_bytes(bytes) >> 11) as f64 / (1u64 << 53) as f64
    }
}

#[async_trait]
impl ExploitHarness for SeverityWeightedHarness {
    async fn attempt(
        &self,
        vulnerability: &Vulnerability,
        _payload: &str,
        target: &ScanTarget,
    ) -> Result<ExploitStatus> {
        let roll = Self::roll(vulnerability, target);
        Ok(Self::outcome(vulnerability.severity(), roll))
    }
}
