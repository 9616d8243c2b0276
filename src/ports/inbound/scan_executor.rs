use crate::scan_orchestration::domain::{ScanConfig, ScanResult, ScanType};
use crate::shared::Result;
use async_trait::async_trait;

/// Request parameters for one scan
#[derive(Debug, Clone)]
pub struct ScanRequest {
    /// URL, API endpoint or file name, validated against `scan_type`
    pub target: String,
    pub scan_type: ScanType,
    pub config: ScanConfig,
    /// Source or document to inspect; required for meaningful `file` scans
    pub content: Option<String>,
}

impl ScanRequest {
    pub fn new(target: impl Into<String>, scan_type: ScanType, config: ScanConfig) -> Self {
        Self {
            target: target.into(),
            scan_type,
            config,
            content: None,
        }
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }
}

/// ScanExecutor - Inbound port for running a scan to completion
///
/// This is the capability the scheduler and the CLI drive. Implementations
/// always produce a terminal `ScanResult` once the request is accepted.
///
/// # Errors
/// Returns an error only when the request is rejected before any stage runs
/// (a `ScanError::Validation`). Stage failures and deadline overruns are
/// reported as a `ScanResult` with status `failed`.
#[async_trait]
pub trait ScanExecutor: Send + Sync {
    async fn execute_scan(&self, request: ScanRequest) -> Result<ScanResult>;
}
