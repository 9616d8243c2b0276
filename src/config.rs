//! Configuration file support for scanguard.
//!
//! Provides YAML-based configuration through `scanguard.config.yml` files,
//! including data structures, file loading, and validation.

use anyhow::Context;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;
use url::Url;

use crate::application::services::DEFAULT_MAX_CONCURRENT_SCANS;
use crate::scan_orchestration::domain::{
    Frequency, ScanConfig, ScanDepth, ScanSeverity, ScanTarget, ScanType, ScheduleConfig,
    WebhookEvent,
};
use crate::shared::error::ScanError;
use crate::shared::Result;

pub const CONFIG_FILENAME: &str = "scanguard.config.yml";

/// Top-level configuration file schema.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    pub scan: Option<ScanSection>,
    pub scheduler: Option<SchedulerSection>,
    pub webhooks: Option<WebhooksSection>,
    /// Root directory for JSON-file persistence; in-memory storage when absent.
    pub storage_dir: Option<PathBuf>,
    pub fail_on: Option<ScanSeverity>,
    /// Recurring scans created when the daemon starts, unless already stored.
    #[serde(default)]
    pub schedules: Vec<ScheduleEntry>,
    /// Captures unknown fields for warnings.
    #[serde(flatten)]
    pub unknown_fields: HashMap<String, serde_yaml_ng::Value>,
}

/// Defaults for every `ScanConfig` field; unset fields keep the built-in default.
#[derive(Debug, Deserialize, Default)]
pub struct ScanSection {
    pub scan_depth: Option<ScanDepth>,
    pub include_vulnerabilities: Option<bool>,
    pub include_malware: Option<bool>,
    pub include_phishing: Option<bool>,
    pub include_performance: Option<bool>,
    pub enable_ai_analysis: Option<bool>,
    pub enable_penetration_testing: Option<bool>,
    pub timeout: Option<u64>,
    #[serde(flatten)]
    pub unknown_fields: HashMap<String, serde_yaml_ng::Value>,
}

impl ScanSection {
    pub fn apply(&self, base: ScanConfig) -> ScanConfig {
        ScanConfig {
            scan_depth: self.scan_depth.unwrap_or(base.scan_depth),
            include_vulnerabilities: self
                .include_vulnerabilities
                .unwrap_or(base.include_vulnerabilities),
            include_malware: self.include_malware.unwrap_or(base.include_malware),
            include_phishing: self.include_phishing.unwrap_or(base.include_phishing),
            include_performance: self.include_performance.unwrap_or(base.include_performance),
            enable_ai_analysis: self.enable_ai_analysis.unwrap_or(base.enable_ai_analysis),
            enable_penetration_testing: self
                .enable_penetration_testing
                .unwrap_or(base.enable_penetration_testing),
            timeout: self.timeout.unwrap_or(base.timeout),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct SchedulerSection {
    pub tick_interval_secs: Option<u64>,
    pub max_concurrent_scans: Option<usize>,
    #[serde(flatten)]
    pub unknown_fields: HashMap<String, serde_yaml_ng::Value>,
}

#[derive(Debug, Deserialize, Default)]
pub struct WebhooksSection {
    pub max_attempts: Option<u32>,
    pub retry_backoff_ms: Option<u64>,
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub endpoints: Vec<WebhookEndpoint>,
    #[serde(flatten)]
    pub unknown_fields: HashMap<String, serde_yaml_ng::Value>,
}

/// A webhook registered when the daemon starts.
#[derive(Debug, Deserialize, Clone)]
pub struct WebhookEndpoint {
    pub url: String,
    pub events: Vec<WebhookEvent>,
    pub secret: Option<String>,
}

/// A recurring scan declared in the config file.
#[derive(Debug, Deserialize, Clone)]
pub struct ScheduleEntry {
    pub target: String,
    #[serde(rename = "type", default = "default_scan_type")]
    pub scan_type: ScanType,
    pub frequency: Frequency,
    pub time: Option<String>,
    pub cron: Option<String>,
    #[serde(default)]
    pub days_of_week: Vec<u8>,
    pub day_of_month: Option<u8>,
    pub timezone: Option<String>,
}

fn default_scan_type() -> ScanType {
    ScanType::Url
}

impl ScheduleEntry {
    pub fn schedule_config(&self) -> ScheduleConfig {
        ScheduleConfig {
            frequency: self.frequency,
            cron: self.cron.clone(),
            time: self.time.clone(),
            days_of_week: self.days_of_week.clone(),
            day_of_month: self.day_of_month,
            timezone: self.timezone.clone(),
        }
    }
}

/// Settings after defaults are applied.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub scan: ScanConfig,
    pub tick_interval: Duration,
    pub max_concurrent_scans: usize,
    pub webhook_max_attempts: u32,
    pub webhook_retry_backoff: Duration,
    pub webhook_timeout: Duration,
    pub storage_dir: Option<PathBuf>,
    pub fail_on: Option<ScanSeverity>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            scan: ScanConfig::default(),
            tick_interval: Duration::from_secs(60),
            max_concurrent_scans: DEFAULT_MAX_CONCURRENT_SCANS,
            webhook_max_attempts: 3,
            webhook_retry_backoff: Duration::from_millis(200),
            webhook_timeout: Duration::from_secs(10),
            storage_dir: None,
            fail_on: None,
        }
    }
}

impl ConfigFile {
    /// Resolves the effective settings; absent sections keep their defaults.
    pub fn settings(&self) -> Settings {
        let defaults = Settings::default();
        let scheduler = self.scheduler.as_ref();
        let webhooks = self.webhooks.as_ref();

        Settings {
            scan: self
                .scan
                .as_ref()
                .map_or(defaults.scan.clone(), |scan| scan.apply(defaults.scan.clone())),
            tick_interval: scheduler
                .and_then(|s| s.tick_interval_secs)
                .map_or(defaults.tick_interval, Duration::from_secs),
            max_concurrent_scans: scheduler
                .and_then(|s| s.max_concurrent_scans)
                .unwrap_or(defaults.max_concurrent_scans),
            webhook_max_attempts: webhooks
                .and_then(|w| w.max_attempts)
                .unwrap_or(defaults.webhook_max_attempts),
            webhook_retry_backoff: webhooks
                .and_then(|w| w.retry_backoff_ms)
                .map_or(defaults.webhook_retry_backoff, Duration::from_millis),
            webhook_timeout: webhooks
                .and_then(|w| w.timeout_secs)
                .map_or(defaults.webhook_timeout, Duration::from_secs),
            storage_dir: self.storage_dir.clone(),
            fail_on: self.fail_on,
        }
    }

    pub fn endpoints(&self) -> &[WebhookEndpoint] {
        self.webhooks
            .as_ref()
            .map(|webhooks| webhooks.endpoints.as_slice())
            .unwrap_or_default()
    }
}

/// Load config from an explicit path. Returns an error if the file is not found.
pub fn load_config_from_path(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path).with_context(|| {
        format!(
            "Failed to read config file: {}\n\n💡 Hint: Check that the file exists and is readable.",
            path.display()
        )
    })?;

    let config: ConfigFile = serde_yaml_ng::from_str(&content).with_context(|| {
        format!(
            "Failed to parse config file: {}\n\n💡 Hint: Ensure the file contains valid YAML syntax.",
            path.display()
        )
    })?;

    validate_config(&config)?;
    warn_unknown_fields(&config);

    Ok(config)
}

/// Auto-discover config in a directory. Returns `None` silently if not found.
pub fn discover_config(dir: &Path) -> Result<Option<ConfigFile>> {
    let config_path = dir.join(CONFIG_FILENAME);

    if !config_path.exists() {
        return Ok(None);
    }

    let config = load_config_from_path(&config_path)?;
    Ok(Some(config))
}

fn invalid(message: String) -> anyhow::Error {
    ScanError::Config { message }.into()
}

/// Validate the loaded configuration.
fn validate_config(config: &ConfigFile) -> Result<()> {
    if let Some(timeout) = config.scan.as_ref().and_then(|scan| scan.timeout) {
        if !(1..=3600).contains(&timeout) {
            return Err(invalid(format!(
                "scan.timeout must be between 1 and 3600 seconds, got {}",
                timeout
            )));
        }
    }

    if let Some(scheduler) = &config.scheduler {
        if scheduler.tick_interval_secs == Some(0) {
            return Err(invalid(
                "scheduler.tick_interval_secs must be greater than 0".to_string(),
            ));
        }
        if scheduler.max_concurrent_scans == Some(0) {
            return Err(invalid(
                "scheduler.max_concurrent_scans must be greater than 0".to_string(),
            ));
        }
    }

    if let Some(webhooks) = &config.webhooks {
        if webhooks.max_attempts == Some(0) {
            return Err(invalid(
                "webhooks.max_attempts must be at least 1".to_string(),
            ));
        }
        if webhooks.timeout_secs == Some(0) {
            return Err(invalid(
                "webhooks.timeout_secs must be greater than 0".to_string(),
            ));
        }
        for (i, endpoint) in webhooks.endpoints.iter().enumerate() {
            validate_endpoint(i, endpoint)?;
        }
    }

    for (i, entry) in config.schedules.iter().enumerate() {
        ScanTarget::parse(&entry.target, entry.scan_type)
            .and_then(|_| entry.schedule_config().validate())
            .map_err(|e| invalid(format!("schedules[{}]: {}", i, e)))?;
    }
    Ok(())
}

fn validate_endpoint(index: usize, endpoint: &WebhookEndpoint) -> Result<()> {
    if endpoint.url.trim().is_empty() {
        return Err(invalid(format!(
            "webhooks.endpoints[{}].url must not be empty",
            index
        )));
    }
    let is_http = Url::parse(&endpoint.url)
        .map(|url| matches!(url.scheme(), "http" | "https"))
        .unwrap_or(false);
    if !is_http {
        return Err(invalid(format!(
            "webhooks.endpoints[{}].url must be an http(s) URL, got '{}'",
            index, endpoint.url
        )));
    }
    if endpoint.events.is_empty() {
        return Err(invalid(format!(
            "webhooks.endpoints[{}].events must list at least one event",
            index
        )));
    }
    if endpoint
        .secret
        .as_deref()
        .is_some_and(|secret| secret.trim().is_empty())
    {
        return Err(invalid(format!(
            "webhooks.endpoints[{}].secret must not be empty when set",
            index
        )));
    }
    Ok(())
}

/// Warn about unknown fields in the config file.
fn warn_unknown_fields(config: &ConfigFile) {
    let sections = [
        ("", Some(&config.unknown_fields)),
        ("scan.", config.scan.as_ref().map(|s| &s.unknown_fields)),
        ("scheduler.", config.scheduler.as_ref().map(|s| &s.unknown_fields)),
        ("webhooks.", config.webhooks.as_ref().map(|w| &w.unknown_fields)),
    ];

    for (prefix, fields) in sections {
        for key in fields.into_iter().flat_map(|fields| fields.keys()) {
            warn!(field = %format!("{}{}", prefix, key), "unknown config field will be ignored");
        }
    }
}
