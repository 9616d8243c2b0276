pub mod anomaly_analyzer;
pub mod exploit_validator;
pub mod vulnerability_detector;

pub use anomaly_analyzer::{
    AnalysisContext, AnomalyAnalyzer, RemediationPlan, ScanHistoryEntry, MODEL_VERSION,
};
pub use exploit_validator::ExploitValidator;
pub use vulnerability_detector::VulnerabilityDetector;
