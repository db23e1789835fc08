//! Pagination module
//!
//! Supports: Cursor, Page Number
//!
//! # Overview
//!
//! A loader resumes from exactly one kind of token for its whole lifetime:
//! an opaque cursor handed back by the previous page, or a page counter.
//! The two are represented as variants of [`PageToken`] chosen once at
//! construction, so a page loader can never read a cursor and vice versa.

mod types;

pub use types::{PageToken, PaginationState};
