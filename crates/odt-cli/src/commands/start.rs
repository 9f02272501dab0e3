//! Start command: opens a new entry for a task.

use std::io::Write;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use odt_core::{SessionStore, TaskName};

use super::util::{describe_session_error, format_local_clock, parse_action, write_help};
use crate::registry::{Action, Command};

/// Start tracking time on a task.
///
/// Fails if another entry is still running; stop it first.
#[derive(Debug, Parser)]
#[command(name = "start", bin_name = "odtimetracker start", no_binary_name = true)]
struct StartArgs {
    /// Task name. Multiple words are joined with spaces.
    #[arg(required = true, num_args = 1.., value_name = "TASK")]
    task: Vec<String>,

    /// Optional note stored with the entry.
    #[arg(short, long)]
    description: Option<String>,
}

pub struct Start;

impl Command for Start {
    fn name(&self) -> &'static str {
        "start"
    }

    fn usage_desc(&self) -> &'static str {
        "<TASK>... [--description TEXT]"
    }

    fn desc(&self) -> &'static str {
        "Start tracking time on a task"
    }

    fn parse(&self, args: &[String], out: &mut dyn Write) -> Result<Option<Box<dyn Action>>> {
        parse_action::<StartArgs>(args, out)
    }

    fn help(&self, out: &mut dyn Write) -> Result<()> {
        write_help::<StartArgs>(out)
    }
}

impl Action for StartArgs {
    fn run(self: Box<Self>, store: &mut dyn SessionStore, out: &mut dyn Write) -> Result<()> {
        let task = TaskName::new(self.task.join(" ")).context("invalid task name")?;
        let entry = store
            .start_entry(&task, self.description.as_deref(), Utc::now())
            .map_err(describe_session_error)?;

        writeln!(
            out,
            "Started tracking '{}' at {}.",
            entry.task,
            format_local_clock(entry.started_at)
        )?;
        Ok(())
    }
}
