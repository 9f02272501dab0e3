//! CLI command implementations.

pub mod filter;
pub mod info;
pub mod list;
pub mod report;
pub mod start;
pub mod stop;
pub mod util;
