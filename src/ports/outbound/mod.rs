/// Outbound ports (Driven ports) - Infrastructure interfaces
///
/// These ports define the interfaces that the application core uses
/// to interact with external systems (storage, network, console, time).
pub mod clock;
pub mod event_publisher;
pub mod exploit_harness;
pub mod output_presenter;
pub mod progress_reporter;
pub mod report_formatter;
pub mod repository;
pub mod scan_stages;
pub mod webhook_transport;

pub use clock::Clock;
pub use event_publisher::EventPublisher;
pub use exploit_harness::ExploitHarness;
pub use output_presenter::OutputPresenter;
pub use progress_reporter::ProgressReporter;
pub use report_formatter::ReportFormatter;
pub use repository::Repository;
pub use scan_stages::{AnalysisStage, DetectionStage, ValidationStage};
pub use webhook_transport::{TransportResponse, WebhookRequest, WebhookTransport};
