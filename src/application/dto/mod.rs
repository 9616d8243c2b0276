/// Data Transfer Objects for application layer
///
/// DTOs are used to transfer data between the application layer
/// and adapters, keeping the domain layer isolated.
mod output_format;
mod scan_report;

pub use output_format::OutputFormat;
pub use scan_report::ScanReport;
