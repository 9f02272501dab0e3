//! Filter arguments shared by `list` and `report`.
//!
//! Entries are selected by exact task name and by a half-open range on their
//! start time. The range can be given explicitly (`--since`, `--until`) or as
//! the current local day or week (`--today`, `--week`).

use std::sync::LazyLock;

use anyhow::{Context, Result};
use chrono::{
    DateTime, Datelike, Duration, Local, LocalResult, NaiveDate, NaiveTime, TimeZone, Utc,
};
use clap::Args;
use odt_core::EntryFilter;
use regex::Regex;

/// Pre-compiled regex for relative time parsing.
static RELATIVE_TIME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+)\s+(minute|hour|day|week)s?\s+ago$").expect("valid relative time regex")
});

/// Conservative bounds for relative time parsing (~1000 years in minutes).
const MAX_RELATIVE_MINUTES: i64 = 1000 * 365 * 24 * 60;

#[derive(Debug, Clone, Default, Args)]
pub struct FilterArgs {
    /// Only entries of this task (exact match).
    #[arg(long, value_name = "NAME")]
    pub task: Option<String>,

    /// Only entries started at or after TIME.
    ///
    /// TIME is RFC 3339 (2025-01-15T10:30:00Z), a local date (2025-01-15),
    /// or relative ("2 hours ago").
    #[arg(long, value_name = "TIME")]
    pub since: Option<String>,

    /// Only entries started before TIME.
    #[arg(long, value_name = "TIME")]
    pub until: Option<String>,

    /// Only entries started today (local time).
    #[arg(long, conflicts_with_all = ["since", "until", "week"])]
    pub today: bool,

    /// Only entries started this week, Monday to Sunday (local time).
    #[arg(long, conflicts_with_all = ["since", "until"])]
    pub week: bool,
}

impl FilterArgs {
    /// Builds the entry filter relative to the current time.
    pub fn to_filter(&self) -> Result<EntryFilter> {
        self.to_filter_at(Utc::now())
    }

    pub fn to_filter_at(&self, now: DateTime<Utc>) -> Result<EntryFilter> {
        let today = now.with_timezone(&Local).date_naive();
        let (since, until) = if self.today {
            let (start, end) = day_boundaries(today);
            (Some(start), Some(end))
        } else if self.week {
            let (start, end) = week_boundaries(today);
            (Some(start), Some(end))
        } else {
            let since = self
                .since
                .as_deref()
                .map(|s| parse_datetime_at(s, now))
                .transpose()
                .context("invalid --since")?;
            let until = self
                .until
                .as_deref()
                .map(|s| parse_datetime_at(s, now))
                .transpose()
                .context("invalid --until")?;
            (since, until)
        };

        let mut filter = EntryFilter::all().with_range(since, until);
        if let Some(task) = &self.task {
            filter = filter.with_task(task.trim());
        }
        Ok(filter)
    }
}

/// Parse a datetime string as ISO 8601, a local date, or relative time.
///
/// Supports:
/// - ISO 8601: "2026-01-15T10:30:00Z"
/// - Local date: "2026-01-15" (midnight local time)
/// - Relative: "2 hours ago", "30 minutes ago", "1 day ago", "1 week ago"
pub fn parse_datetime_at(s: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(local_midnight_to_utc(date));
    }

    let Some(caps) = RELATIVE_TIME_RE.captures(s) else {
        anyhow::bail!(
            "Invalid datetime: {s}. Use ISO 8601 (e.g., 2026-01-15T10:30:00Z), a date (e.g., 2026-01-15) or relative (e.g., '2 hours ago')"
        );
    };

    let n: i64 = caps[1]
        .parse()
        .context("failed to parse number in relative time")?;

    let (max_for_unit, minutes_per_unit) = match &caps[2] {
        "minute" => (MAX_RELATIVE_MINUTES, 1),
        "hour" => (MAX_RELATIVE_MINUTES / 60, 60),
        "day" => (MAX_RELATIVE_MINUTES / (60 * 24), 60 * 24),
        "week" => (MAX_RELATIVE_MINUTES / (60 * 24 * 7), 60 * 24 * 7),
        unit => anyhow::bail!("Unknown time unit: {unit}"),
    };

    if n > max_for_unit {
        anyhow::bail!("Relative time value too large: {n} {}", &caps[2]);
    }

    Ok(now - Duration::minutes(n * minutes_per_unit))
}

/// Converts a local date at midnight to UTC.
/// Handles DST ambiguity by picking the earlier time.
fn local_midnight_to_utc(local_date: NaiveDate) -> DateTime<Utc> {
    let midnight = local_date.and_time(NaiveTime::MIN);
    match Local.from_local_datetime(&midnight) {
        LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => dt.with_timezone(&Utc),
        // DST spring-forward gap at midnight: the gap is at most an hour
        LocalResult::None => {
            let shifted = midnight + Duration::hours(1);
            Local
                .from_local_datetime(&shifted)
                .earliest()
                .map_or_else(|| shifted.and_utc(), |dt| dt.with_timezone(&Utc))
        }
    }
}

/// Calculates day boundaries (today 00:00 to tomorrow 00:00 local time).
fn day_boundaries(today: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let tomorrow = today + Duration::days(1);
    (local_midnight_to_utc(today), local_midnight_to_utc(tomorrow))
}

/// Calculates week boundaries (Mon 00:00 to next Mon 00:00 local time) as half-open interval.
fn week_boundaries(today: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let days_since_monday = today.weekday().num_days_from_monday();
    let monday = today - Duration::days(i64::from(days_since_monday));
    let next_monday = monday + Duration::days(7);
    (local_midnight_to_utc(monday), local_midnight_to_utc(next_monday))
}
