//! Stop command: closes the running entry.

use std::io::Write;

use anyhow::Result;
use chrono::Utc;
use clap::Parser;
use odt_core::SessionStore;

use super::util::{describe_session_error, format_duration, parse_action, write_help};
use crate::registry::{Action, Command};

/// Stop tracking the running entry.
#[derive(Debug, Parser)]
#[command(name = "stop", bin_name = "odtimetracker stop", no_binary_name = true)]
struct StopArgs {}

pub struct Stop;

impl Command for Stop {
    fn name(&self) -> &'static str {
        "stop"
    }

    fn usage_desc(&self) -> &'static str {
        ""
    }

    fn desc(&self) -> &'static str {
        "Stop tracking the running entry"
    }

    fn parse(&self, args: &[String], out: &mut dyn Write) -> Result<Option<Box<dyn Action>>> {
        parse_action::<StopArgs>(args, out)
    }

    fn help(&self, out: &mut dyn Write) -> Result<()> {
        write_help::<StopArgs>(out)
    }
}

impl Action for StopArgs {
    fn run(self: Box<Self>, store: &mut dyn SessionStore, out: &mut dyn Write) -> Result<()> {
        let now = Utc::now();
        let entry = store.stop_entry(now).map_err(describe_session_error)?;
        writeln!(
            out,
            "Stopped tracking '{}' after {}.",
            entry.task,
            format_duration(entry.duration_at(now))
        )?;
        Ok(())
    }
}
