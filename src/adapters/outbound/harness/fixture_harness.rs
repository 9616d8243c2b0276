use crate::ports::outbound::ExploitHarness;
use crate::scan_orchestration::domain::{
    ExploitStatus, ScanTarget, Vulnerability, VulnerabilityType,
};
use crate::shared::Result;
use async_trait::async_trait;
use std::collections::HashMap;

/// FixtureHarness adapter returning a fixed outcome per finding type
#[derive(Debug, Clone)]
pub struct FixtureHarness {
    outcomes: HashMap<VulnerabilityType, ExploitStatus>,
    default: ExploitStatus,
}

impl FixtureHarness {
    /// Every type not configured with `with_outcome` gets `default`
    pub fn new(default: ExploitStatus) -> Self {
        Self {
            outcomes: HashMap::new(),
            default,
        }
    }

    pub fn with_outcome(mut self, vuln_type: VulnerabilityType, status: ExploitStatus) -> Self {
        self.outcomes.insert(vuln_type, status);
        self
    }
}

#[async_trait]
impl ExploitHarness for FixtureHarness {
    async fn attempt(
        &self,
        vulnerability: &Vulnerability,
        _payload: &str,
        _target: &ScanTarget,
    ) -> Result<ExploitStatus> {
        Ok(self
            .outcomes
            .get(&vulnerability.vuln_type())
            .copied()
            .unwrap_or(self.default))
    }
}
