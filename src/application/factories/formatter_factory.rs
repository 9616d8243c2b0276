use crate::adapters::outbound::formatters::{JsonReportFormatter, TextReportFormatter};
use crate::application::dto::OutputFormat;
use crate::ports::outbound::ReportFormatter;

/// Factory for creating scan report formatters
///
/// Selecting the infrastructure adapter for a requested format is an
/// application concern, so the CLI never names a concrete formatter.
pub struct FormatterFactory;

impl FormatterFactory {
    /// Creates a formatter instance for the specified output format
    ///
    /// # Examples
    /// ```
    /// use scanguard::application::dto::OutputFormat;
    /// use scanguard::application::factories::FormatterFactory;
    ///
    /// let formatter = FormatterFactory::create(OutputFormat::Text);
    /// ```
    pub fn create(format: OutputFormat) -> Box<dyn ReportFormatter> {
        match format {
            OutputFormat::Json => Box::new(JsonReportFormatter::new()),
            OutputFormat::Text => Box::new(TextReportFormatter::new()),
        }
    }

    /// Returns the progress message for the specified output format
    ///
    /// # Examples
    /// ```
    /// use scanguard::application::dto::OutputFormat;
    /// use scanguard::application::factories::FormatterFactory;
    ///
    /// let message = FormatterFactory::progress_message(OutputFormat::Json);
    /// assert_eq!(message, "📝 Rendering JSON report...");
    /// ```
    pub fn progress_message(format: OutputFormat) -> &'static str {
        match format {
            OutputFormat::Json => "📝 Rendering JSON report...",
            OutputFormat::Text => "📝 Rendering text report...",
        }
    }
}
