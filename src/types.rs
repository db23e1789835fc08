//! Common types used throughout feedpager
//!
//! This module contains shared type definitions, type aliases,
//! and utility types used across multiple modules.

use serde::{Deserialize, Serialize};

// ============================================================================
// Type Aliases
// ============================================================================

/// JSON value type (re-exported from serde_json)
pub type JsonValue = serde_json::Value;

/// JSON object type
pub type JsonObject = serde_json::Map<String, JsonValue>;

// ============================================================================
// Pagination Mode
// ============================================================================

/// How a loader addresses the next page
///
/// Fixed at construction; a loader never switches between modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum PaginationMode {
    /// Opaque cursor handed back by the previous page
    #[default]
    Cursor,
    /// Incrementing page counter
    Page,
}

impl std::fmt::Display for PaginationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cursor => write!(f, "cursor"),
            Self::Page => write!(f, "page"),
        }
    }
}

// ============================================================================
// Fetch Result
// ============================================================================

/// Value returned by a page fetch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchResult<T> {
    /// The page payload, opaque to the loader
    pub data: T,

    /// Cursor for the following page (cursor mode only)
    ///
    /// `None` and `Some(Value::Null)` both leave the current cursor in place.
    #[serde(default, rename = "nextCursor", skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<JsonValue>,
}

impl<T> FetchResult<T> {
    /// Create a result without a next cursor
    pub fn new(data: T) -> Self {
        Self {
            data,
            next_cursor: None,
        }
    }

    /// Create a result that carries a next cursor
    pub fn with_cursor(data: T, next_cursor: impl Into<JsonValue>) -> Self {
        Self {
            data,
            next_cursor: Some(next_cursor.into()),
        }
    }

    /// The cursor that should replace the current one, if any
    pub fn advancing_cursor(&self) -> Option<&JsonValue> {
        self.next_cursor.as_ref().filter(|c| !c.is_null())
    }
}
