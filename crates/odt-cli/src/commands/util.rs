//! Shared utilities for CLI commands.

use std::io::Write;

use anyhow::{Result, anyhow};
use chrono::{DateTime, Duration, Local, Utc};
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use odt_core::SessionError;

use crate::BIN_NAME;
use crate::registry::Action;

/// Parses a command's arguments with its `clap` definition.
///
/// Returns `Ok(None)` when the arguments asked for help, which has then been
/// written to `out`.
pub fn parse_action<T>(args: &[String], out: &mut dyn Write) -> Result<Option<Box<dyn Action>>>
where
    T: Parser + Action + 'static,
{
    match T::try_parse_from(args) {
        Ok(parsed) => Ok(Some(Box::new(parsed))),
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            write!(out, "{}", err.render())?;
            Ok(None)
        }
        Err(err) => Err(anyhow!("{}", err.render().to_string().trim_end())),
    }
}

/// Writes the long help of a command's `clap` definition.
pub fn write_help<T: CommandFactory>(out: &mut dyn Write) -> Result<()> {
    let help = T::command().render_long_help();
    writeln!(out, "{}", help.to_string().trim_end())?;
    Ok(())
}

/// Turns a session store failure into a message for the user.
pub fn describe_session_error(err: SessionError) -> anyhow::Error {
    match err {
        SessionError::AlreadyTracking { task, since } => anyhow!(
            "Already tracking '{task}' since {}.\nRun '{BIN_NAME} stop' first.",
            format_local_time(since)
        ),
        SessionError::NothingTracking => anyhow!(
            "Nothing is being tracked.\nRun '{BIN_NAME} start <task>' to begin."
        ),
        err @ SessionError::Storage(_) => anyhow::Error::new(err),
    }
}

/// Formats a duration as "Xh Ym" if >= 1 hour, "Ym" otherwise.
/// Negative durations are shown as 0m.
pub fn format_duration(duration: Duration) -> String {
    let total_minutes = duration.num_minutes().max(0);
    let hours = total_minutes / 60;
    let minutes = total_minutes % 60;

    if hours >= 1 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m")
    }
}

/// Formats a timestamp in local time as `YYYY-MM-DD HH:MM`.
pub fn format_local_time(timestamp: DateTime<Utc>) -> String {
    timestamp
        .with_timezone(&Local)
        .format("%Y-%m-%d %H:%M")
        .to_string()
}

/// Formats a timestamp in local time as `HH:MM`.
pub fn format_local_clock(timestamp: DateTime<Utc>) -> String {
    timestamp.with_timezone(&Local).format("%H:%M").to_string()
}

/// Generates a 10-character progress bar.
/// Non-zero values below 5% of max get a single block for visibility.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn progress_bar(value: Duration, max: Duration) -> String {
    let value = value.num_milliseconds();
    let max = max.num_milliseconds();
    if max <= 0 {
        return "░░░░░░░░░░".to_string();
    }

    let ratio = value as f64 / max as f64;
    let filled = if ratio < 0.05 && value > 0 {
        1
    } else {
        (ratio * 10.0).round().clamp(0.0, 10.0) as usize
    };

    let empty = 10 - filled;
    format!("{}{}", "█".repeat(filled), "░".repeat(empty))
}
