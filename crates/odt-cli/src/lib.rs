//! odTimeTracker CLI library.
//!
//! This crate provides the command registry, the dispatcher that maps process
//! arguments onto a single command, and the commands themselves.

pub mod commands;
mod config;
mod dispatch;
mod registry;

pub use config::Config;
pub use dispatch::{Dispatcher, Outcome};
pub use registry::{Action, Command, Registry};

/// Application's name.
pub const APP_NAME: &str = "odTimeTracker";

/// Name of the executable, used in usage hints.
pub const BIN_NAME: &str = "odtimetracker";

/// Application's description.
pub const APP_DESC: &str = "Simple tool for time-tracking.";
