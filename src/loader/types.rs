//! Loader types
//!
//! Outcomes, reset options and the status snapshot.

use crate::error::LoadError;
use crate::pagination::PageToken;
use crate::types::FetchResult;
use chrono::{DateTime, Utc};
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

/// Why a trigger did not start a fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Loader is disabled
    Disabled,
    /// Caller reported no more pages
    Exhausted,
    /// Another fetch is still pending
    InFlight,
    /// No connectivity; recorded as a connectivity error by `load_more`
    Offline,
    /// Too soon after the previous attempt
    RateLimited,
    /// Initial load not configured, already issued, or not yet possible
    InitialLoadNotDue,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Disabled => "disabled",
            Self::Exhausted => "no more pages",
            Self::InFlight => "fetch in flight",
            Self::Offline => "offline",
            Self::RateLimited => "rate limited",
            Self::InitialLoadNotDue => "initial load not due",
        };
        f.write_str(s)
    }
}

/// What happened to a trigger
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome<T> {
    /// A page was fetched and the token advanced
    Loaded(FetchResult<T>),
    /// A guard refused the trigger; nothing was fetched
    Skipped(SkipReason),
    /// The fetch settled after a reset and its result was dropped
    Discarded,
}

impl<T> LoadOutcome<T> {
    /// Check if a page was loaded
    pub fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded(_))
    }

    /// Check if the trigger was skipped
    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped(_))
    }

    /// Check if the result was discarded
    pub fn is_discarded(&self) -> bool {
        matches!(self, Self::Discarded)
    }

    /// Skip reason, if skipped
    pub fn skip_reason(&self) -> Option<SkipReason> {
        match self {
            Self::Skipped(reason) => Some(*reason),
            _ => None,
        }
    }

    /// Loaded page, if any
    pub fn into_loaded(self) -> Option<FetchResult<T>> {
        match self {
            Self::Loaded(page) => Some(page),
            _ => None,
        }
    }
}

/// Options for a reset
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResetOptions {
    /// Ask the fetcher to drop cached pages
    pub clear_cache: bool,
}

impl ResetOptions {
    /// Reset and clear the fetcher's cache
    pub fn clear_cache() -> Self {
        Self { clear_cache: true }
    }
}

/// Read-only snapshot of a loader
///
/// Every derived flag is computed from the raw fields, so the snapshot
/// cannot contradict itself.
#[derive(Debug, Clone, PartialEq)]
pub struct LoaderStatus {
    pub enabled: bool,
    pub has_more: bool,
    pub is_fetching: bool,
    pub is_online: bool,
    pub last_error: Option<LoadError>,
    /// Token the next fetch will use
    pub token: PageToken,
    /// Successful pages since construction or the last reset
    pub pages_loaded: u64,
    /// Start of the most recent admitted attempt
    pub last_fetch_at: Option<DateTime<Utc>>,
    /// Reset count
    pub generation: u64,
}

impl LoaderStatus {
    /// Whether a trigger right now could pass every guard but the rate limit
    pub fn can_load_more(&self) -> bool {
        self.enabled && self.has_more && !self.is_fetching && self.is_online
    }

    pub fn is_idle(&self) -> bool {
        !self.is_fetching
    }

    pub fn is_error(&self) -> bool {
        self.last_error.is_some()
    }

    pub fn is_success(&self) -> bool {
        !self.is_fetching && self.last_error.is_none()
    }
}

impl Serialize for LoaderStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("LoaderStatus", 14)?;
        s.serialize_field("enabled", &self.enabled)?;
        s.serialize_field("has_more", &self.has_more)?;
        s.serialize_field("is_fetching", &self.is_fetching)?;
        s.serialize_field("is_online", &self.is_online)?;
        s.serialize_field("last_error", &self.last_error)?;
        s.serialize_field("token", &self.token)?;
        s.serialize_field("pages_loaded", &self.pages_loaded)?;
        s.serialize_field("last_fetch_at", &self.last_fetch_at)?;
        s.serialize_field("generation", &self.generation)?;
        s.serialize_field("can_load_more", &self.can_load_more())?;
        s.serialize_field("is_idle", &self.is_idle())?;
        s.serialize_field("is_error", &self.is_error())?;
        s.serialize_field("is_success", &self.is_success())?;
        s.serialize_field("exhausted", &!self.has_more)?;
        s.end()
    }
}
