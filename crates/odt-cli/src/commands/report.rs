//! Report command for aggregating tracked time per task.
//!
//! This module implements `odtimetracker report` with the shared filter
//! arguments and two output formats (human-readable, JSON). A running entry
//! counts towards the totals with the time elapsed so far.

use std::fmt::Write as _;
use std::io::Write;

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use clap::Parser;
use odt_core::{EntryFilter, SessionStore};
use serde::Serialize;

use super::filter::FilterArgs;
use super::util::{
    describe_session_error, format_duration, format_local_time, parse_action, progress_bar,
    write_help,
};
use crate::BIN_NAME;
use crate::registry::{Action, Command};

/// Report tracked time per task.
///
/// Durations of finished entries are summed per task. A running entry counts
/// with the time elapsed so far.
#[derive(Debug, Parser)]
#[command(name = "report", bin_name = "odtimetracker report", no_binary_name = true)]
struct ReportArgs {
    #[command(flatten)]
    filter: FilterArgs,

    /// Output as JSON.
    #[arg(long)]
    json: bool,
}

pub struct Report;

impl Command for Report {
    fn name(&self) -> &'static str {
        "report"
    }

    fn usage_desc(&self) -> &'static str {
        "[--task NAME] [--since TIME] [--until TIME] [--today|--week] [--json]"
    }

    fn desc(&self) -> &'static str {
        "Report tracked time per task"
    }

    fn parse(&self, args: &[String], out: &mut dyn Write) -> Result<Option<Box<dyn Action>>> {
        parse_action::<ReportArgs>(args, out)
    }

    fn help(&self, out: &mut dyn Write) -> Result<()> {
        write_help::<ReportArgs>(out)
    }
}

impl Action for ReportArgs {
    fn run(self: Box<Self>, store: &mut dyn SessionStore, out: &mut dyn Write) -> Result<()> {
        let filter = self.filter.to_filter()?;
        let report = store
            .report(&filter, Utc::now())
            .map_err(describe_session_error)?;
        tracing::debug!(entries = report.entry_count, ?filter, "generated report");

        if self.json {
            writeln!(out, "{}", format_report_json(&report, &filter)?)?;
        } else {
            write!(out, "{}", format_report(&report, &filter))?;
        }
        Ok(())
    }
}

/// Formats the period description for the report header.
fn format_period_description(filter: &EntryFilter) -> String {
    match (filter.since, filter.until) {
        (None, None) => "all time".to_string(),
        (Some(since), None) => format!("since {}", format_local_time(since)),
        (None, Some(until)) => format!("until {}", format_local_time(until)),
        (Some(since), Some(until)) => format!(
            "{} - {}",
            format_local_time(since),
            format_local_time(until)
        ),
    }
}

/// Formats the human-readable report output.
pub fn format_report(report: &odt_core::Report, filter: &EntryFilter) -> String {
    let mut output = String::new();

    writeln!(output, "TIME REPORT: {}", format_period_description(filter)).unwrap();

    if report.is_empty() {
        writeln!(output).unwrap();
        writeln!(output, "No entries recorded in this period.").unwrap();
        writeln!(output).unwrap();
        writeln!(output, "Hint: Run '{BIN_NAME} list' to see all entries.").unwrap();
        return output;
    }

    let tasks = report.tasks_by_duration();
    let max = tasks
        .first()
        .map_or_else(Duration::zero, |(_, total)| total.duration);
    let name_width = tasks
        .iter()
        .map(|(task, _)| task.as_str().chars().count())
        .max()
        .unwrap_or_default()
        .clamp(4, 40);

    writeln!(output).unwrap();
    writeln!(output, "BY TASK").unwrap();
    writeln!(output, "───────").unwrap();
    for (task, total) in tasks {
        let running = if report.open_task.as_ref() == Some(task) {
            "  (running)"
        } else {
            ""
        };
        let entries_word = if total.entries == 1 { "entry" } else { "entries" };
        writeln!(
            output,
            "{:<name_width$}  {:>7}  {}  {} {entries_word}{running}",
            task.as_str(),
            format_duration(total.duration),
            progress_bar(total.duration, max),
            total.entries,
        )
        .unwrap();
    }

    writeln!(output).unwrap();
    writeln!(output, "SUMMARY").unwrap();
    writeln!(output, "───────").unwrap();
    writeln!(output, "Total tracked:  {}", format_duration(report.total)).unwrap();
    writeln!(output, "Entries:        {}", report.entry_count).unwrap();

    output
}

// ========== JSON Output ==========

/// JSON report structure.
#[derive(Debug, Serialize)]
pub struct JsonReport {
    pub generated_at: String,
    pub period: JsonPeriod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_filter: Option<String>,
    pub tasks: Vec<JsonTaskEntry>,
    pub totals: JsonTotals,
}

#[derive(Debug, Serialize)]
pub struct JsonPeriod {
    pub since: Option<String>,
    pub until: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct JsonTaskEntry {
    pub task: String,
    pub duration_ms: i64,
    pub entries: usize,
    pub running: bool,
}

#[derive(Debug, Serialize)]
pub struct JsonTotals {
    pub duration_ms: i64,
    pub entry_count: usize,
}

/// Formats report data as JSON.
pub fn format_report_json(report: &odt_core::Report, filter: &EntryFilter) -> Result<String> {
    let json = JsonReport {
        generated_at: report.generated_at.to_rfc3339(),
        period: JsonPeriod {
            since: filter.since.as_ref().map(DateTime::<Utc>::to_rfc3339),
            until: filter.until.as_ref().map(DateTime::<Utc>::to_rfc3339),
        },
        task_filter: filter.task.clone(),
        tasks: report
            .tasks_by_duration()
            .into_iter()
            .map(|(task, total)| JsonTaskEntry {
                task: task.to_string(),
                duration_ms: total.duration.num_milliseconds(),
                entries: total.entries,
                running: report.open_task.as_ref() == Some(task),
            })
            .collect(),
        totals: JsonTotals {
            duration_ms: report.total.num_milliseconds(),
            entry_count: report.entry_count,
        },
    };

    Ok(serde_json::to_string_pretty(&json)?)
}

#[cfg(test)]
mod tests {
    use odt_core::{EntryId, TaskName, TimeEntry};

    use super::*;

    fn ts(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn entry(id: i64, task: &str, start: &str, minutes: Option<i64>) -> TimeEntry {
        let started_at = ts(start);
        TimeEntry {
            id: EntryId::new(id),
            task: TaskName::new(task).unwrap(),
            description: None,
            started_at,
            stopped_at: minutes.map(|m| started_at + Duration::minutes(m)),
        }
    }

    fn sample_report() -> odt_core::Report {
        let entries = [
            entry(1, "writing-spec", "2025-01-01T09:00:00Z", Some(30)),
            entry(2, "review", "2025-01-01T10:00:00Z", Some(15)),
            entry(3, "writing-spec", "2025-01-01T11:00:00Z", Some(60)),
            entry(4, "email", "2025-01-01T12:00:00Z", None),
        ];
        odt_core::Report::aggregate(&entries, ts("2025-01-01T12:05:00Z"))
    }

    #[test]
    fn human_report_lists_tasks_by_duration() {
        let output = format_report(&sample_report(), &EntryFilter::all());
        insta::assert_snapshot!(output, @r"
        TIME REPORT: all time

        BY TASK
        ───────
        writing-spec   1h 30m  ██████████  2 entries
        review            15m  ██░░░░░░░░  1 entry
        email              5m  █░░░░░░░░░  1 entry  (running)

        SUMMARY
        ───────
        Total tracked:  1h 50m
        Entries:        4
        ");
    }

    #[test]
    fn empty_report_has_hint() {
        let report = odt_core::Report::aggregate(&[], ts("2025-01-01T00:00:00Z"));
        let output = format_report(&report, &EntryFilter::all());
        assert!(output.contains("No entries recorded in this period."));
        assert!(output.contains("odtimetracker list"));
    }

    #[test]
    fn json_report_has_totals() {
        let filter = EntryFilter::all().with_range(Some(ts("2025-01-01T00:00:00Z")), None);
        let output = format_report_json(&sample_report(), &filter).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();

        assert_eq!(parsed["totals"]["duration_ms"], 110 * 60_000);
        assert_eq!(parsed["totals"]["entry_count"], 4);
        assert_eq!(parsed["tasks"][0]["task"], "writing-spec");
        assert_eq!(parsed["tasks"][0]["duration_ms"], 90 * 60_000);
        assert_eq!(parsed["tasks"][2]["running"], true);
        assert_eq!(parsed["period"]["until"], serde_json::Value::Null);
        assert!(parsed.get("task_filter").is_none());
    }

    #[test]
    fn command_reports_thirty_minute_entry() {
        let mut store = odt_core::MemoryStore::new();
        let start = ts("2025-01-01T09:00:00Z");
        store
            .start_entry(&TaskName::new("focus").unwrap(), None, start)
            .unwrap();
        store.stop_entry(start + Duration::minutes(30)).unwrap();

        let mut out = Vec::new();
        Report
            .run(&["--json".to_string()], &mut store, &mut out)
            .unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(parsed["tasks"][0]["duration_ms"], 30 * 60_000);
        assert_eq!(parsed["totals"]["duration_ms"], 30 * 60_000);
    }
}
