//! Info command: what is being tracked right now, or what was tracked last.

use std::io::Write;

use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::Parser;
use odt_core::{SessionStore, TimeEntry};

use super::util::{
    describe_session_error, format_duration, format_local_clock, format_local_time, parse_action,
    write_help,
};
use crate::BIN_NAME;
use crate::registry::{Action, Command};

/// Print the current tracking state.
///
/// Shows the running entry and how long it has been running, or the last
/// finished entry when nothing is being tracked.
#[derive(Debug, Parser)]
#[command(name = "info", bin_name = "odtimetracker info", no_binary_name = true)]
struct InfoArgs {}

pub struct Info;

impl Command for Info {
    fn name(&self) -> &'static str {
        "info"
    }

    fn usage_desc(&self) -> &'static str {
        ""
    }

    fn desc(&self) -> &'static str {
        "Print info about the current tracking state"
    }

    fn parse(&self, args: &[String], out: &mut dyn Write) -> Result<Option<Box<dyn Action>>> {
        parse_action::<InfoArgs>(args, out)
    }

    fn help(&self, out: &mut dyn Write) -> Result<()> {
        write_help::<InfoArgs>(out)
    }
}

impl Action for InfoArgs {
    fn run(self: Box<Self>, store: &mut dyn SessionStore, out: &mut dyn Write) -> Result<()> {
        let current = store.current_entry().map_err(describe_session_error)?;
        let last = match current {
            Some(_) => None,
            None => store.last_entry().map_err(describe_session_error)?,
        };
        write!(out, "{}", format_info(current.as_ref(), last.as_ref(), Utc::now()))?;
        Ok(())
    }
}

fn format_info(current: Option<&TimeEntry>, last: Option<&TimeEntry>, now: DateTime<Utc>) -> String {
    let mut output = String::new();
    if let Some(entry) = current {
        output.push_str(&format!(
            "Currently tracking '{}' since {} ({} so far).\n",
            entry.task,
            format_local_clock(entry.started_at),
            format_duration(entry.duration_at(now))
        ));
        if let Some(description) = &entry.description {
            output.push_str(&format!("Description: {description}\n"));
        }
        return output;
    }

    match last {
        Some(entry) => {
            output.push_str("Not tracking anything.\n");
            output.push_str(&format!(
                "Last entry: '{}' started {} ({}).\n",
                entry.task,
                format_local_time(entry.started_at),
                format_duration(entry.duration_at(now))
            ));
        }
        None => {
            output.push_str("Nothing tracked yet.\n");
            output.push_str(&format!("Run '{BIN_NAME} start <task>' to begin.\n"));
        }
    }
    output
}
