// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::match_wildcard_for_single_variants)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # feedpager
//!
//! Incremental data loading for infinitely scrolling views: a proximity
//! signal says "the user is near the end", and a coordinator decides whether
//! that turns into exactly one fetch of the next page.
//!
//! ## Features
//!
//! - **Single-flight fetching**: at most one page request in flight, always
//! - **Cursor and page pagination**: opaque cursors or 1-based page numbers
//! - **Rate limiting**: minimum interval between attempts
//! - **Connectivity awareness**: offline attempts are refused and recorded
//! - **Reset with stale-result fencing**: results fetched before a reset
//!   never leak into the new session
//! - **HTTP fetcher**: JSON pages with cursor/record extraction and caching
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use feedpager::{FeedLoader, HttpFetcherConfig, HttpPageFetcher, LoaderConfig, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let fetcher = HttpPageFetcher::new(
//!         HttpFetcherConfig::new("https://api.example.com/items")
//!             .records_path("data")
//!             .cursor_path("meta.next"),
//!     )?;
//!     // The initial load is issued in the background on build
//!     let loader = FeedLoader::new(fetcher, LoaderConfig::default())?;
//!
//!     loader.load_more().await?;
//!     println!("{}", serde_json::to_string(&loader.status().await)?);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐  trigger  ┌──────────────────────────────┐  fetch  ┌─────────────┐
//! │ SignalSource │ ────────▶ │          FeedLoader          │ ──────▶ │ PageFetcher │
//! │  (sentinel)  │           │ enabled → has_more → single  │         │ (HTTP, fn)  │
//! └──────────────┘           │ flight → online → rate gate  │ ◀────── └─────────────┘
//!                            └──────────────────────────────┘  page
//!                                  ▲                  │
//!                   online/offline │                  ▼ status()
//!                  ┌───────────────┴──────┐    ┌──────────────┐
//!                  │ ConnectivityProvider │    │ LoaderStatus │
//!                  └──────────────────────┘    └──────────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and type aliases
pub mod types;

/// Loader configuration
pub mod config;

/// Pagination tokens and state
pub mod pagination;

/// Proximity signal: geometry, observer, sentinel
pub mod signal;

/// Connectivity providers and monitor
pub mod connectivity;

/// Page fetchers
pub mod fetch;

/// Fetch coordinator
pub mod loader;

/// Loader plus signal source
pub mod session;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, LoadError, Result};
pub use types::*;

// Re-export commonly used types
pub use config::LoaderConfig;
pub use connectivity::{ConnectivityProvider, ManualConnectivity, ProbeConfig, ProbeConnectivity};
pub use fetch::{fetch_fn, HttpFetcherConfig, HttpPageFetcher, PageFetcher};
pub use loader::{FeedLoader, LoadOutcome, LoaderStatus, ResetOptions, SkipReason};
pub use pagination::PageToken;
pub use session::FeedSession;
pub use signal::{Rect, SentinelHandle};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
