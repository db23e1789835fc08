//! Page fetch module
//!
//! The loader consumes pages through the [`PageFetcher`] trait and never
//! sees where they come from.
//!
//! # Overview
//!
//! - `PageFetcher` - the abstract fetch operation, with an optional cache
//! - `FnFetcher` - adapts an async closure into a fetcher
//! - `HttpPageFetcher` - fetches JSON pages over HTTP

mod http;

pub use http::{extract_path, HttpFetcherConfig, HttpPageFetcher};

use crate::error::Result;
use crate::pagination::PageToken;
use crate::types::FetchResult;
use async_trait::async_trait;
use std::future::Future;

/// Source of pages
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Page payload type
    type Data: Send + 'static;

    /// Fetch the page addressed by `token`
    async fn fetch(&self, token: &PageToken) -> Result<FetchResult<Self::Data>>;

    /// Drop any cached pages
    ///
    /// Returns false when the fetcher has no cache to clear.
    async fn clear_cache(&self) -> bool {
        false
    }
}

/// Fetcher backed by an async closure
#[derive(Debug, Clone)]
pub struct FnFetcher<F> {
    f: F,
}

/// Wrap an async closure as a [`PageFetcher`]
pub fn fetch_fn<F>(f: F) -> FnFetcher<F> {
    FnFetcher { f }
}

#[async_trait]
impl<F, Fut, T> PageFetcher for FnFetcher<F>
where
    F: Fn(PageToken) -> Fut + Send + Sync,
    Fut: Future<Output = Result<FetchResult<T>>> + Send,
    T: Send + 'static,
{
    type Data = T;

    async fn fetch(&self, token: &PageToken) -> Result<FetchResult<T>> {
        (self.f)(token.clone()).await
    }
}
