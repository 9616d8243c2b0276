//! scanguard - security-scan orchestration
//!
//! This library runs security scans against URLs, API endpoints and file content:
//! rule-based vulnerability detection, cross-finding anomaly analysis, exploit
//! validation and risk scoring. Scans can be scheduled to recur, and lifecycle
//! events are delivered to signed webhooks. The code follows hexagonal
//! architecture and Domain-Driven Design principles.
//!
//! # Architecture
//!
//! The library is organized into the following layers:
//!
//! - **Domain Layer** (`scan_orchestration`): Pure business logic, policies and domain models
//! - **Application Layer** (`application`): The scan engine, scheduler and webhook dispatcher
//! - **Ports** (`ports`): Interface definitions for infrastructure
//! - **Adapters** (`adapters`): Concrete implementations of ports
//! - **Shared** (`shared`): Common utilities and error types
//!
//! # Example
//!
//! ```no_run
//! use scanguard::prelude::*;
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<()> {
//! let engine = ScanEngine::with_harness(SeverityWeightedHarness::new(), Arc::new(SystemClock::new()))
//!     .with_progress(Arc::new(StderrProgressReporter::new()));
//!
//! let request = ScanRequest::new("https://example.com/login", ScanType::Url, ScanConfig::default());
//! let result = engine.execute(request).await?;
//!
//! let report = ScanReport::new(result, &[]);
//! println!("{}", TextReportFormatter::new().format(&report)?);
//! # Ok(())
//! # }
//! ```

pub mod adapters;
pub mod application;
pub mod config;
pub mod logging;
pub mod ports;
pub mod scan_orchestration;
pub mod shared;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::adapters::outbound::clock::SystemClock;
    pub use crate::adapters::outbound::console::StderrProgressReporter;
    pub use crate::adapters::outbound::filesystem::{
        FileSystemReader, FileSystemWriter, JsonFileRepository, StdoutPresenter,
    };
    pub use crate::adapters::outbound::formatters::{JsonReportFormatter, TextReportFormatter};
    pub use crate::adapters::outbound::harness::{FixtureHarness, SeverityWeightedHarness};
    pub use crate::adapters::outbound::memory::InMemoryRepository;
    pub use crate::adapters::outbound::network::ReqwestWebhookTransport;
    pub use crate::application::dto::{OutputFormat, ScanReport};
    pub use crate::application::services::{
        sign_payload, verify_signature, DeliveryReport, EventQueue, RetryPolicy, ScanScheduler,
        WebhookDispatcher, EVENT_HEADER, SIGNATURE_HEADER, TIMESTAMP_HEADER,
    };
    pub use crate::application::stages::HarnessValidationStage;
    pub use crate::application::use_cases::ScanEngine;
    pub use crate::ports::inbound::{ScanExecutor, ScanRequest};
    pub use crate::ports::outbound::{
        AnalysisStage, Clock, DetectionStage, EventPublisher, ExploitHarness, OutputPresenter,
        ProgressReporter, ReportFormatter, Repository, TransportResponse, ValidationStage,
        WebhookRequest, WebhookTransport,
    };
    pub use crate::scan_orchestration::domain::{
        Anomaly, AnomalyAnalysis, Entity, ExploitResult, ExploitStatus, Frequency,
        PenetrationTest, ScanConfig, ScanDepth, ScanResult, ScanSeverity, ScanStatus, ScanTarget,
        ScanType, ScheduleConfig, ScheduledScan, Severity, Vulnerability, VulnerabilityType,
        Webhook, WebhookEvent, WebhookPayload,
    };
    pub use crate::scan_orchestration::services::{
        AnomalyAnalyzer, ExploitValidator, VulnerabilityDetector,
    };
    pub use crate::shared::error::{ExitCode, ScanError};
    pub use crate::shared::Result;
}
