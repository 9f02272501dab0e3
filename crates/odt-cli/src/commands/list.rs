//! List command for showing tracked entries.
//!
//! This module implements `odtimetracker list` which prints the entries
//! matching the filter arguments, oldest first, as a table or as JSON.

use std::fmt::Write as _;
use std::io::Write;

use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::Parser;
use odt_core::{SessionStore, TimeEntry};

use super::filter::FilterArgs;
use super::util::{
    describe_session_error, format_duration, format_local_time, parse_action, write_help,
};
use crate::registry::{Action, Command};

/// List tracked entries, oldest first.
#[derive(Debug, Parser)]
#[command(name = "list", bin_name = "odtimetracker list", no_binary_name = true)]
struct ListArgs {
    #[command(flatten)]
    filter: FilterArgs,

    /// Output as JSON.
    #[arg(long)]
    json: bool,
}

pub struct List;

impl Command for List {
    fn name(&self) -> &'static str {
        "list"
    }

    fn usage_desc(&self) -> &'static str {
        "[--task NAME] [--since TIME] [--until TIME] [--today|--week] [--json]"
    }

    fn desc(&self) -> &'static str {
        "List tracked entries"
    }

    fn parse(&self, args: &[String], out: &mut dyn Write) -> Result<Option<Box<dyn Action>>> {
        parse_action::<ListArgs>(args, out)
    }

    fn help(&self, out: &mut dyn Write) -> Result<()> {
        write_help::<ListArgs>(out)
    }
}

impl Action for ListArgs {
    fn run(self: Box<Self>, store: &mut dyn SessionStore, out: &mut dyn Write) -> Result<()> {
        let filter = self.filter.to_filter()?;
        let entries = store.list_entries(&filter).map_err(describe_session_error)?;
        tracing::debug!(count = entries.len(), ?filter, "listed entries");

        if self.json {
            writeln!(out, "{}", serde_json::to_string_pretty(&entries)?)?;
        } else {
            write!(out, "{}", format_entries(&entries, Utc::now()))?;
        }
        Ok(())
    }
}

/// Formats entries as a human-readable table.
pub fn format_entries(entries: &[TimeEntry], now: DateTime<Utc>) -> String {
    let mut output = String::new();

    if entries.is_empty() {
        writeln!(output, "No entries found.").unwrap();
        return output;
    }

    let task_width = entries
        .iter()
        .map(|entry| entry.task.as_str().chars().count())
        .max()
        .unwrap_or_default()
        .clamp(4, 40);

    writeln!(
        output,
        "{:>5}  {:<task_width$}  {:<16}  {:<16}  {:>8}",
        "ID", "Task", "Started", "Stopped", "Duration"
    )
    .unwrap();
    writeln!(
        output,
        "{}  {}  {}  {}  {}",
        "─".repeat(5),
        "─".repeat(task_width),
        "─".repeat(16),
        "─".repeat(16),
        "─".repeat(8)
    )
    .unwrap();

    for entry in entries {
        let stopped = entry
            .stopped_at
            .map_or_else(|| "(running)".to_string(), format_local_time);
        writeln!(
            output,
            "{:>5}  {:<task_width$}  {:<16}  {:<16}  {:>8}",
            entry.id.get(),
            entry.task.as_str(),
            format_local_time(entry.started_at),
            stopped,
            format_duration(entry.duration_at(now))
        )
        .unwrap();
    }

    output
}
