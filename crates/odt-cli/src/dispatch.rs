//! Maps process arguments onto exactly one action.
//!
//! The first argument is either a command name or the literal `help`. Usage and
//! help never touch the session store; it is opened only once a real command
//! has been resolved and its arguments parsed, and closed again on every path
//! after that.

use std::io::Write;
use std::process::ExitCode;

use anyhow::Result;
use odt_core::SessionStore;

use crate::registry::{Command, Registry};
use crate::{APP_DESC, APP_NAME, BIN_NAME};

/// How an invocation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure,
}

impl From<Outcome> for ExitCode {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Success => Self::SUCCESS,
            Outcome::Failure => Self::FAILURE,
        }
    }
}

pub struct Dispatcher {
    registry: Registry,
}

impl Dispatcher {
    pub const fn new(registry: Registry) -> Self {
        Self { registry }
    }

    /// Runs a single invocation.
    ///
    /// `args` excludes the program name. `open_store` is called at most once,
    /// and only when a known command with valid arguments is about to run.
    pub fn dispatch<F>(
        &self,
        args: &[String],
        open_store: F,
        out: &mut dyn Write,
        err: &mut dyn Write,
    ) -> Outcome
    where
        F: FnOnce() -> Result<Box<dyn SessionStore>>,
    {
        let Some((name, rest)) = args.split_first() else {
            return self.print_usage(out);
        };

        if name == "help" {
            return self.help(rest, out, err);
        }

        let Some(command) = self.registry.lookup(name) else {
            tracing::debug!(%name, "unknown command");
            let _ = writeln!(
                err,
                "Unknown command '{name}'.\n\nRun '{BIN_NAME} help' for usage."
            );
            return Outcome::Failure;
        };

        let action = match command.parse(rest, out) {
            Ok(Some(action)) => action,
            Ok(None) => return Outcome::Success,
            Err(e) => {
                let _ = writeln!(err, "{e:#}");
                return Outcome::Failure;
            }
        };

        let mut store = match open_store() {
            Ok(store) => store,
            Err(e) => {
                let _ = writeln!(
                    err,
                    "Error occurred during initializing database connection:\n\n{e:#}\n"
                );
                return Outcome::Failure;
            }
        };

        tracing::debug!(command = command.name(), args = ?rest, "running command");
        let result = action.run(store.as_mut(), out);
        let closed = store.close();

        let mut outcome = match result {
            Ok(()) => Outcome::Success,
            Err(e) => {
                let _ = writeln!(err, "{e:#}");
                Outcome::Failure
            }
        };

        if let Err(e) = closed {
            tracing::warn!(error = %e, "failed to close database");
            let _ = writeln!(err, "Failed to close database: {e}");
            outcome = Outcome::Failure;
        }

        outcome
    }

    /// Implements `help [command]`.
    fn help(&self, args: &[String], out: &mut dyn Write, err: &mut dyn Write) -> Outcome {
        match args {
            [] => self.print_usage(out),
            [name] => match self.registry.lookup(name) {
                Some(command) => match command.help(out) {
                    Ok(()) => Outcome::Success,
                    Err(e) => {
                        let _ = writeln!(err, "{e:#}");
                        Outcome::Failure
                    }
                },
                None => {
                    let _ = writeln!(
                        err,
                        "Unknown command name '{name}' given.\nRun '{BIN_NAME} help' for usage."
                    );
                    Outcome::Failure
                }
            },
            _ => {
                let _ = writeln!(
                    err,
                    "Usage:\n\n    {BIN_NAME} help [command]\n\nToo many arguments given!"
                );
                Outcome::Failure
            }
        }
    }

    fn print_usage(&self, out: &mut dyn Write) -> Outcome {
        match out.write_all(self.usage().as_bytes()) {
            Ok(()) => Outcome::Success,
            Err(e) => {
                tracing::warn!(error = %e, "failed to print usage");
                Outcome::Failure
            }
        }
    }

    /// General usage text listing every registered command.
    pub fn usage(&self) -> String {
        let mut usage = format!(
            "{APP_NAME} {}\n{APP_DESC}\n\nUsage:\n\n    {BIN_NAME} command [arguments]\n\nAvailable commands:\n\n",
            env!("CARGO_PKG_VERSION")
        );
        for command in self.registry.all() {
            usage.push_str(&format!(
                "    {}\n        {}\n",
                usage_line(command),
                command.desc()
            ));
        }
        usage.push_str(&format!(
            "\nUse \"{BIN_NAME} help [command]\" for more information about a command.\n"
        ));
        usage
    }
}

/// One-line usage of a command: its name followed by its arguments.
fn usage_line(command: &dyn Command) -> String {
    let usage_desc = command.usage_desc();
    if usage_desc.is_empty() {
        format!("{BIN_NAME} {}", command.name())
    } else {
        format!("{BIN_NAME} {} {usage_desc}", command.name())
    }
}
