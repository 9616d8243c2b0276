use crate::application::dto::ScanReport;
use crate::ports::outbound::ReportFormatter;
use crate::shared::Result;

/// JsonReportFormatter adapter rendering the report as pretty-printed JSON
///
/// Field names are camelCase, matching the webhook payloads and the persisted
/// scan results.
pub struct JsonReportFormatter;

impl JsonReportFormatter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for JsonReportFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportFormatter for JsonReportFormatter {
    fn format(&self, report: &ScanReport) -> Result<String> {
        Ok(serde_json::to_string_pretty(report)?)
    }
}
