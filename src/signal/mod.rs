//! Proximity signal module
//!
//! Detects when a sentinel marker comes within a margin of the visible edge
//! of a scroll root and turns that into a "load more" trigger.
//!
//! # Overview
//!
//! The signal module provides:
//! - `Rect` and `RootMargin` - geometry and CSS-style margin parsing
//! - `ProximityObserver` - threshold-crossing detection for one attachment
//! - `SentinelHandle` - the handle a view layer places on its marker
//! - `SignalSource` - attaches/detaches observers as inputs change
//!
//! The signal never gates concurrency or rate limits; it only reports.

mod geometry;
mod observer;

pub use geometry::{Length, Rect, RootMargin};
pub use observer::{ObserverOptions, ProximityObserver, SentinelHandle, SentinelSlot, SignalSource};
