//! Pagination types
//!
//! Defines the resume token and the state that advances it.

use crate::types::{FetchResult, JsonValue, PaginationMode};
use serde::{Deserialize, Serialize};

/// Where the next fetch resumes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "value", rename_all = "snake_case")]
pub enum PageToken {
    /// Opaque cursor; `null` means "start"
    Cursor(JsonValue),
    /// Page number, starting at the configured first page
    Page(u32),
}

impl PageToken {
    /// Create a cursor token
    pub fn cursor(value: impl Into<JsonValue>) -> Self {
        Self::Cursor(value.into())
    }

    /// Create a page token
    pub fn page(page: u32) -> Self {
        Self::Page(page)
    }

    /// The pagination mode this token belongs to
    pub fn mode(&self) -> PaginationMode {
        match self {
            Self::Cursor(_) => PaginationMode::Cursor,
            Self::Page(_) => PaginationMode::Page,
        }
    }

    /// Cursor value, if this is a cursor token
    pub fn as_cursor(&self) -> Option<&JsonValue> {
        match self {
            Self::Cursor(value) => Some(value),
            Self::Page(_) => None,
        }
    }

    /// Page number, if this is a page token
    pub fn as_page(&self) -> Option<u32> {
        match self {
            Self::Page(page) => Some(*page),
            Self::Cursor(_) => None,
        }
    }

    /// Render the token as a query parameter value
    ///
    /// Returns `None` for a null cursor, which means "no parameter".
    pub fn to_query_value(&self) -> Option<String> {
        match self {
            Self::Cursor(JsonValue::Null) => None,
            Self::Cursor(JsonValue::String(s)) => Some(s.clone()),
            Self::Cursor(other) => Some(other.to_string()),
            Self::Page(page) => Some(page.to_string()),
        }
    }
}

impl std::fmt::Display for PageToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cursor(JsonValue::Null) => write!(f, "cursor:<start>"),
            Self::Cursor(value) => write!(f, "cursor:{value}"),
            Self::Page(page) => write!(f, "page:{page}"),
        }
    }
}

/// Tracks the resume token across fetches
#[derive(Debug, Clone, PartialEq)]
pub struct PaginationState {
    /// Construction-time token, restored by reset
    initial: PageToken,
    /// Token the next fetch uses
    current: PageToken,
    /// Successful fetches applied since construction or the last reset
    pages_loaded: u64,
}

impl PaginationState {
    /// Create pagination state for the given mode
    ///
    /// Only the value matching `mode` is used; the other is ignored.
    pub fn new(mode: PaginationMode, initial_cursor: JsonValue, initial_page: u32) -> Self {
        let initial = match mode {
            PaginationMode::Cursor => PageToken::Cursor(initial_cursor),
            PaginationMode::Page => PageToken::Page(initial_page),
        };
        Self::from_token(initial)
    }

    /// Create pagination state starting at an explicit token
    pub fn from_token(initial: PageToken) -> Self {
        Self {
            current: initial.clone(),
            initial,
            pages_loaded: 0,
        }
    }

    /// Token the next fetch uses
    pub fn token(&self) -> &PageToken {
        &self.current
    }

    /// Token restored by reset
    pub fn initial_token(&self) -> &PageToken {
        &self.initial
    }

    /// Pagination mode
    pub fn mode(&self) -> PaginationMode {
        self.initial.mode()
    }

    /// Successful fetches applied since construction or the last reset
    pub fn pages_loaded(&self) -> u64 {
        self.pages_loaded
    }

    /// Apply a successful fetch result
    ///
    /// Cursor mode takes the result's next cursor when present and leaves the
    /// cursor untouched otherwise. Page mode always moves forward by one.
    /// Returns true if the token changed.
    pub fn advance<T>(&mut self, result: &FetchResult<T>) -> bool {
        self.pages_loaded += 1;
        match &mut self.current {
            PageToken::Cursor(cursor) => match result.advancing_cursor() {
                Some(next) => {
                    let changed = cursor != next;
                    *cursor = next.clone();
                    changed
                }
                None => false,
            },
            PageToken::Page(page) => {
                *page = page.saturating_add(1);
                true
            }
        }
    }

    /// Restore the construction-time token
    pub fn reset(&mut self) {
        self.current = self.initial.clone();
        self.pages_loaded = 0;
    }
}
