//! CLI module
//!
//! Command-line interface for paging through feeds.
//!
//! # Commands
//!
//! - `fetch` - Page through an HTTP feed, one JSON line per page
//! - `config` - Print the effective loader configuration

mod commands;
mod runner;

pub use commands::{Cli, Commands, FetchArgs, OutputFormat};
pub use runner::{has_more_after, Runner};
