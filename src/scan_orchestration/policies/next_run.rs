use super::cron::CronSchedule;
use crate::scan_orchestration::domain::{Frequency, ScheduleConfig};
use crate::shared::error::ScanError;
use crate::shared::Result;
use chrono::{
    DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Utc,
};

/// NextRunPolicy computes when a scheduled scan fires next
///
/// All wall-clock arithmetic happens in the schedule's own offset; the result is
/// converted back to UTC. The computation is pure: identical `(schedule, now)`
/// always gives the same instant, and that instant is always strictly after `now`.
pub struct NextRunPolicy;

impl NextRunPolicy {
    pub fn calculate_next_run(
        schedule: &ScheduleConfig,
        now: DateTime<Utc>,
    ) -> Result<DateTime<Utc>> {
        let offset = schedule.offset()?;
        let time = schedule.time_of_day()?;
        let local_now = now.with_timezone(&offset).naive_local();

        let next_local = match schedule.frequency {
            Frequency::Daily => Self::next_daily(local_now, time),
            Frequency::Weekly => Self::next_weekly(local_now, time, &schedule.days_of_week),
            Frequency::Monthly => {
                Self::next_monthly(local_now, time, schedule.day_of_month.unwrap_or(1))?
            }
            Frequency::Custom => Self::next_custom(local_now, schedule.cron.as_deref())?,
        };

        to_utc(next_local, offset)
    }

    fn next_daily(local_now: NaiveDateTime, time: NaiveTime) -> NaiveDateTime {
        let today = local_now.date().and_time(time);
        if today > local_now {
            today
        } else {
            today + Duration::days(1)
        }
    }

    /// Nearest listed weekday strictly after today; today itself is never chosen,
    /// so a schedule listing only today's weekday fires a week later
    fn next_weekly(local_now: NaiveDateTime, time: NaiveTime, days: &[u8]) -> NaiveDateTime {
        let today = local_now.weekday().num_days_from_sunday() as i64;
        let offset = days
            .iter()
            .map(|day| (i64::from(*day) - today).rem_euclid(7))
            .filter(|offset| *offset > 0)
            .min()
            .unwrap_or(7);

        (local_now.date() + Duration::days(offset)).and_time(time)
    }

    /// The configured day of this month, or of next month once it has passed.
    /// The day is clamped to the month's length, so 31 means the last day.
    fn next_monthly(
        local_now: NaiveDateTime,
        time: NaiveTime,
        day_of_month: u8,
    ) -> Result<NaiveDateTime> {
        let this_month = clamped_date(local_now.year(), local_now.month(), day_of_month)?
            .and_time(time);
        if this_month > local_now {
            return Ok(this_month);
        }

        let (year, month) = if local_now.month() == 12 {
            (local_now.year() + 1, 1)
        } else {
            (local_now.year(), local_now.month() + 1)
        };
        Ok(clamped_date(year, month, day_of_month)?.and_time(time))
    }

    fn next_custom(local_now: NaiveDateTime, expression: Option<&str>) -> Result<NaiveDateTime> {
        let expression = expression.ok_or_else(|| {
            ScanError::validation(
                "Custom schedules require a cron expression",
                "Set schedule.cron, e.g. \"30 2 * * 1-5\"",
            )
        })?;
        let cron = CronSchedule::parse(expression)?;
        cron.next_after(local_now).ok_or_else(|| {
            ScanError::validation(
                format!("Cron expression '{}' never fires", cron),
                "Check that the day-of-month exists in the selected months",
            )
            .into()
        })
    }
}

fn days_in_month(year: i32, month: u32) -> Option<u32> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some((next - first).num_days() as u32)
}

fn clamped_date(year: i32, month: u32, day: u8) -> Result<NaiveDate> {
    days_in_month(year, month)
        .and_then(|last| NaiveDate::from_ymd_opt(year, month, u32::from(day).clamp(1, last)))
        .ok_or_else(|| anyhow::anyhow!("Date out of range: {}-{:02}-{:02}", year, month, day))
}

fn to_utc(local: NaiveDateTime, offset: FixedOffset) -> Result<DateTime<Utc>> {
    local
        .and_local_timezone(offset)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| anyhow::anyhow!("Cannot map {} into offset {}", local, offset))
}
