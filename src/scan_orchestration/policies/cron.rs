use crate::shared::error::ScanError;
use crate::shared::Result;
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use std::fmt;

/// How far ahead `next_after` searches before giving up (covers leap-day expressions)
const SEARCH_HORIZON_DAYS: i64 = 366 * 5;

const FIELD_HINT: &str =
    "Use five fields: minute hour day-of-month month day-of-week, e.g. \"30 2 * * 1-5\"";

/// Allowed values of one cron field, one bit per value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FieldSet(u64);

impl FieldSet {
    fn contains(&self, value: u32) -> bool {
        value < 64 && self.0 & (1u64 << value) != 0
    }

    fn insert(&mut self, value: u32) {
        self.0 |= 1u64 << value;
    }
}

struct FieldSpec {
    name: &'static str,
    min: u32,
    max: u32,
}

const MINUTE: FieldSpec = FieldSpec { name: "minute", min: 0, max: 59 };
const HOUR: FieldSpec = FieldSpec { name: "hour", min: 0, max: 23 };
const DAY_OF_MONTH: FieldSpec = FieldSpec { name: "day-of-month", min: 1, max: 31 };
const MONTH: FieldSpec = FieldSpec { name: "month", min: 1, max: 12 };
// 0 and 7 are both Sunday
const DAY_OF_WEEK: FieldSpec = FieldSpec { name: "day-of-week", min: 0, max: 7 };

/// A parsed five-field cron expression
///
/// Supported syntax per field: `*`, single values, ranges `a-b`, lists `a,b,c`
/// and steps `*/n`, `a-b/n`, `a/n`. When both day-of-month and day-of-week are
/// restricted (neither starts with `*`), a day matches if either matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CronSchedule {
    expression: String,
    minutes: FieldSet,
    hours: FieldSet,
    days_of_month: FieldSet,
    months: FieldSet,
    days_of_week: FieldSet,
    day_of_month_restricted: bool,
    day_of_week_restricted: bool,
}

impl CronSchedule {
    pub fn parse(expression: &str) -> Result<Self> {
        let fields: Vec<&str> = expression.split_whitespace().collect();
        if fields.len() != 5 {
            return Err(ScanError::validation(
                format!(
                    "Cron expression '{}' has {} fields, expected 5",
                    expression,
                    fields.len()
                ),
                FIELD_HINT,
            )
            .into());
        }

        let mut days_of_week = parse_field(fields[4], &DAY_OF_WEEK)?;
        if days_of_week.contains(7) {
            days_of_week.insert(0);
        }

        Ok(Self {
            expression: fields.join(" "),
            minutes: parse_field(fields[0], &MINUTE)?,
            hours: parse_field(fields[1], &HOUR)?,
            days_of_month: parse_field(fields[2], &DAY_OF_MONTH)?,
            months: parse_field(fields[3], &MONTH)?,
            days_of_week,
            day_of_month_restricted: !fields[2].starts_with('*'),
            day_of_week_restricted: !fields[4].starts_with('*'),
        })
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    fn day_matches(&self, date: NaiveDate) -> bool {
        let dom = self.days_of_month.contains(date.day());
        let dow = self
            .days_of_week
            .contains(date.weekday().num_days_from_sunday());

        match (self.day_of_month_restricted, self.day_of_week_restricted) {
            (true, true) => dom || dow,
            (true, false) => dom,
            (false, true) => dow,
            (false, false) => true,
        }
    }

    pub fn matches(&self, at: NaiveDateTime) -> bool {
        self.months.contains(at.month())
            && self.day_matches(at.date())
            && self.hours.contains(at.hour())
            && self.minutes.contains(at.minute())
    }

    /// First matching minute strictly after `after`, in the same wall-clock frame
    ///
    /// Returns `None` when nothing matches within five years, e.g. `0 0 30 2 *`.
    pub fn next_after(&self, after: NaiveDateTime) -> Option<NaiveDateTime> {
        let limit = after + Duration::days(SEARCH_HORIZON_DAYS);
        let mut candidate = after
            .date()
            .and_hms_opt(after.hour(), after.minute(), 0)?
            + Duration::minutes(1);

        while candidate <= limit {
            let date = candidate.date();
            if !self.months.contains(date.month()) {
                candidate = first_of_next_month(date)?.and_time(NaiveTime::MIN);
                continue;
            }
            if !self.day_matches(date) {
                candidate = date.succ_opt()?.and_time(NaiveTime::MIN);
                continue;
            }
            if !self.hours.contains(candidate.hour()) {
                candidate = date.and_hms_opt(candidate.hour(), 0, 0)? + Duration::hours(1);
                continue;
            }
            if !self.minutes.contains(candidate.minute()) {
                candidate += Duration::minutes(1);
                continue;
            }
            return Some(candidate);
        }

        None
    }
}

impl fmt::Display for CronSchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.expression)
    }
}

fn first_of_next_month(date: NaiveDate) -> Option<NaiveDate> {
    if date.month() == 12 {
        NaiveDate::from_ymd_opt(date.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(date.year(), date.month() + 1, 1)
    }
}

fn invalid_field(spec: &FieldSpec, raw: &str) -> anyhow::Error {
    ScanError::validation(
        format!(
            "Invalid cron {} field '{}' (allowed {}-{})",
            spec.name, raw, spec.min, spec.max
        ),
        FIELD_HINT,
    )
    .into()
}

fn parse_value(raw: &str, spec: &FieldSpec, field: &str) -> Result<u32> {
    let value: u32 = raw.parse().map_err(|_| invalid_field(spec, field))?;
    if value < spec.min || value > spec.max {
        return Err(invalid_field(spec, field));
    }
    Ok(value)
}

fn parse_field(field: &str, spec: &FieldSpec) -> Result<FieldSet> {
    let mut set = FieldSet(0);

    for part in field.split(',') {
        let (range, step) = match part.split_once('/') {
            Some((range, step)) => {
                let step: u32 = step.parse().map_err(|_| invalid_field(spec, field))?;
                if step == 0 {
                    return Err(invalid_field(spec, field));
                }
                (range, Some(step))
            }
            None => (part, None),
        };

        let (start, end) = if range == "*" {
            (spec.min, spec.max)
        } else if let Some((low, high)) = range.split_once('-') {
            (
                parse_value(low, spec, field)?,
                parse_value(high, spec, field)?,
            )
        } else {
            let value = parse_value(range, spec, field)?;
            // `a/n` runs from a to the end of the field
            (value, if step.is_some() { spec.max } else { value })
        };

        if start > end {
            return Err(invalid_field(spec, field));
        }

        let step = step.unwrap_or(1);
        let mut value = start;
        while value <= end {
            set.insert(value);
            value += step;
        }
    }

    Ok(set)
}
