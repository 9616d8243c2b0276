use super::vulnerability::Severity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of cross-cutting signal inferred from a set of findings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnomalyType {
    SuspiciousPattern,
    HiddenVulnerability,
    ZeroDayIndicator,
    UnusualBehavior,
    AnomalousAccess,
    DataLeakageRisk,
}

/// A cross-cutting signal derived from findings; never mutates them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Anomaly {
    pub id: String,
    #[serde(rename = "type")]
    pub anomaly_type: AnomalyType,
    pub severity: Severity,
    pub description: String,
    /// Confidence in [0, 100]
    pub confidence: u8,
    pub recommendation: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SuggestionType {
    CodeFix,
    ConfigurationChange,
    ArchitectureImprovement,
    SecurityPolicy,
    MonitoringEnhancement,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

/// A remediation suggestion; ids of per-finding suggestions are `suggestion-{vulnerability id}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    pub id: String,
    #[serde(rename = "type")]
    pub suggestion_type: SuggestionType,
    pub priority: Priority,
    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_example: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<String>,
}

/// Output bundle of the anomaly analyzer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnomalyAnalysis {
    pub anomalies: Vec<Anomaly>,
    pub suggestions: Vec<Suggestion>,
    /// Overall confidence in [0, 100]
    pub confidence: u8,
    pub model_version: String,
    pub analyzed_at: DateTime<Utc>,
}
