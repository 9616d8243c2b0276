use crate::application::dto::ScanReport;
use crate::shared::Result;

/// ReportFormatter port for rendering scan reports
///
/// This port abstracts the formatting logic for different report formats
/// (JSON, plain text).
pub trait ReportFormatter {
    /// Renders a finished scan
    ///
    /// # Errors
    /// Returns an error if serialization fails
    fn format(&self, report: &ScanReport) -> Result<String>;
}
