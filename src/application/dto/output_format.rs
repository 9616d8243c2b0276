/// Output format enumeration for scan reports
///
/// This enum represents the supported output formats for rendered scan reports.
/// It belongs in the application layer as it represents an application-level
/// concern that both the CLI (inbound adapter) and formatters (outbound adapters)
/// need to understand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Machine-readable JSON report (default)
    Json,
    /// Human-readable plain-text report
    Text,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "text" | "txt" => Ok(OutputFormat::Text),
            _ => Err(format!("Invalid format: {}. Please specify 'json' or 'text'", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Text => write!(f, "text"),
        }
    }
}
