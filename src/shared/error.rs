use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Exit codes for the CLI application.
///
/// These codes allow CI systems to distinguish between a risky target
/// and a failure of the tool itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Success - scan completed below the configured threshold
    Success = 0,
    /// Scan severity reached the configured `--fail-on` threshold
    RiskThresholdExceeded = 1,
    /// Invalid command-line arguments (clap parsing errors)
    InvalidArguments = 2,
    /// Application error (validation, storage, configuration, etc.)
    ApplicationError = 3,
}

impl ExitCode {
    /// Convert to i32 for use with std::process::exit
    pub fn as_i32(self) -> i32 {
        self as i32
    }
}

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitCode::Success => write!(f, "Success (0)"),
            ExitCode::RiskThresholdExceeded => write!(f, "Risk Threshold Exceeded (1)"),
            ExitCode::InvalidArguments => write!(f, "Invalid Arguments (2)"),
            ExitCode::ApplicationError => write!(f, "Application Error (3)"),
        }
    }
}

/// Application-specific errors for scan orchestration.
///
/// The variants follow the failure taxonomy of the pipeline: validation errors are
/// raised before any stage runs, stage failures and timeouts are converted into a
/// failed `ScanResult` by the engine, delivery and scheduling errors are isolated
/// and logged by their owning service.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Validation error: {message}\n\n💡 Hint: {hint}")]
    Validation { message: String, hint: String },

    #[error("Scan stage '{stage}' failed: {details}")]
    StageFailure { stage: String, details: String },

    #[error("Scan exceeded its {seconds}s deadline")]
    Timeout { seconds: u64 },

    #[error("Webhook delivery to {webhook_id} failed: {details}")]
    Delivery { webhook_id: String, details: String },

    #[error("Scheduled scan {schedule_id} failed: {details}")]
    Scheduling { schedule_id: String, details: String },

    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    #[error("Storage error at {path}\nDetails: {details}\n\n💡 Hint: Please verify that the storage directory exists and you have write permissions")]
    Storage { path: PathBuf, details: String },

    #[error("Invalid configuration: {message}\n\n💡 Hint: Check scanguard.config.yml against the documented keys")]
    Config { message: String },
}

impl ScanError {
    /// Shorthand for a validation error with a hint
    pub fn validation(message: impl Into<String>, hint: impl Into<String>) -> Self {
        ScanError::Validation {
            message: message.into(),
            hint: hint.into(),
        }
    }

    /// Shorthand for a stage failure
    pub fn stage(stage: &str, details: impl fmt::Display) -> Self {
        ScanError::StageFailure {
            stage: stage.to_string(),
            details: details.to_string(),
        }
    }

    pub fn not_found(entity: &str, id: &str) -> Self {
        ScanError::NotFound {
            entity: entity.to_string(),
            id: id.to_string(),
        }
    }
}
