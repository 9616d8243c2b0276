use super::scan::{ScanConfig, ScanType};
use crate::scan_orchestration::policies::CronSchedule;
use crate::shared::error::ScanError;
use crate::shared::Result;
use chrono::{DateTime, FixedOffset, NaiveTime, Offset, Utc};
use serde::{Deserialize, Serialize};

/// Recurrence rule of a scheduled scan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Custom,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleConfig {
    pub frequency: Frequency,
    /// Five-field cron expression, required for `custom`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cron: Option<String>,
    /// Time of day as `HH:MM`; midnight when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    /// Days for `weekly`, 0 = Sunday .. 6 = Saturday
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub days_of_week: Vec<u8>,
    /// Day for `monthly` (1-31), clamped to the month's length
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day_of_month: Option<u8>,
    /// `UTC`, `Z` or a fixed offset such as `+09:00`; UTC when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
}

impl ScheduleConfig {
    pub fn new(frequency: Frequency) -> Self {
        Self {
            frequency,
            cron: None,
            time: None,
            days_of_week: Vec::new(),
            day_of_month: None,
            timezone: None,
        }
    }

    pub fn daily_at(time: &str) -> Self {
        Self {
            time: Some(time.to_string()),
            ..Self::new(Frequency::Daily)
        }
    }

    /// Parsed time of day, midnight when none is configured
    pub fn time_of_day(&self) -> Result<NaiveTime> {
        match &self.time {
            None => Ok(NaiveTime::MIN),
            Some(raw) => parse_time_of_day(raw),
        }
    }

    pub fn offset(&self) -> Result<FixedOffset> {
        match &self.timezone {
            None => Ok(utc_offset()),
            Some(raw) => parse_offset(raw),
        }
    }

    /// Checks every field the next-run computation depends on
    pub fn validate(&self) -> Result<()> {
        self.time_of_day()?;
        self.offset()?;

        if let Some(day) = self.days_of_week.iter().find(|d| **d > 6) {
            return Err(ScanError::validation(
                format!("Invalid day of week: {}", day),
                "Days of week range from 0 (Sunday) to 6 (Saturday)",
            )
            .into());
        }

        if let Some(day) = self.day_of_month {
            if !(1..=31).contains(&day) {
                return Err(ScanError::validation(
                    format!("Invalid day of month: {}", day),
                    "Day of month ranges from 1 to 31",
                )
                .into());
            }
        }

        if self.frequency == Frequency::Custom {
            let expression = self.cron.as_deref().ok_or_else(|| {
                ScanError::validation(
                    "Custom schedules require a cron expression",
                    "Set schedule.cron, e.g. \"30 2 * * 1-5\"",
                )
            })?;
            CronSchedule::parse(expression)?;
        }

        Ok(())
    }
}

fn utc_offset() -> FixedOffset {
    Utc.fix()
}

fn parse_time_of_day(raw: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(raw.trim(), "%H:%M").map_err(|_| {
        ScanError::validation(
            format!("Invalid time of day: '{}'", raw),
            "Use the HH:MM 24-hour format, e.g. \"09:00\"",
        )
        .into()
    })
}

fn parse_offset(raw: &str) -> Result<FixedOffset> {
    let trimmed = raw.trim();
    if trimmed.eq_ignore_ascii_case("utc") || trimmed == "Z" {
        return Ok(utc_offset());
    }

    let invalid = || -> anyhow::Error {
        ScanError::validation(
            format!("Unsupported timezone: '{}'", raw),
            "Use UTC or a fixed offset such as +09:00",
        )
        .into()
    };

    let (sign, rest) = match trimmed.chars().next() {
        Some('+') => (1, &trimmed[1..]),
        Some('-') => (-1, &trimmed[1..]),
        _ => return Err(invalid()),
    };
    let (hours, minutes) = rest.split_once(':').ok_or_else(invalid)?;
    let hours: i32 = hours.parse().map_err(|_| invalid())?;
    let minutes: i32 = minutes.parse().map_err(|_| invalid())?;
    if hours > 14 || minutes > 59 {
        return Err(invalid());
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).ok_or_else(invalid)
}

/// A recurring scan definition, owned exclusively by the scheduler
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledScan {
    pub id: String,
    pub target: String,
    #[serde(rename = "type")]
    pub scan_type: ScanType,
    pub config: ScanConfig,
    pub schedule: ScheduleConfig,
    pub enabled: bool,
    pub last_run: Option<DateTime<Utc>>,
    pub next_run: DateTime<Utc>,
    pub run_count: u64,
    pub created_at: DateTime<Utc>,
}

impl ScheduledScan {
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.enabled && self.next_run <= now
    }
}
