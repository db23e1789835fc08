//! Feed loader module
//!
//! The coordinator that turns "load more" triggers into strictly
//! sequential page fetches.
//!
//! # Overview
//!
//! The loader module provides:
//! - `FeedLoader` - guards, fetch dispatch, reset and status projection
//! - `FeedLoaderBuilder` - wiring for config, connectivity and callbacks
//! - `LoadOutcome` / `SkipReason` - what happened to a trigger
//! - `LoaderStatus` - read-only snapshot for a view layer
//! - `RateGate` - minimum-interval admission check
//!
//! Guards are evaluated in a fixed order, each short-circuiting:
//! enabled, has more, not in flight, online, rate limit.

mod coordinator;
mod rate_gate;
mod types;

pub use coordinator::{ErrorCallback, FeedLoader, FeedLoaderBuilder};
pub use rate_gate::RateGate;
pub use types::{LoadOutcome, LoaderStatus, ResetOptions, SkipReason};

#[cfg(test)]
mod tests;
