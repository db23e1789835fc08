//! Connectivity module
//!
//! Tracks online/offline transitions and feeds them to a loader.
//!
//! # Overview
//!
//! The connectivity module provides:
//! - `ConnectivityProvider` - source of the current status and its changes
//! - `ManualConnectivity` - status pushed by the host application
//! - `ProbeConnectivity` - status derived from periodically probing a URL
//! - `ConnectivityMonitor` - task forwarding changes to a `ConnectivitySink`,
//!   stopped when the monitor is dropped

mod monitor;
mod provider;

pub use monitor::{ConnectivityMonitor, ConnectivitySink};
pub use provider::{ConnectivityProvider, ManualConnectivity, ProbeConfig, ProbeConnectivity};

#[cfg(test)]
mod tests;
