//! Core domain logic for odTimeTracker.
//!
//! This crate contains the fundamental types and logic for:
//! - Time entries: validated task names and open/closed sessions
//! - Filtering: selecting entries by task and start-time range
//! - Reports: aggregating tracked durations per task
//! - The [`SessionStore`] contract and an in-memory implementation

mod entry;
mod filter;
mod memory;
mod report;
mod store;

pub use entry::{EntryId, TaskName, TimeEntry, ValidationError, normalize_description};
pub use filter::EntryFilter;
pub use memory::MemoryStore;
pub use report::{Report, TaskTotal};
pub use store::{SessionError, SessionStore};
