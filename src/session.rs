//! Feed session
//!
//! Pairs a [`FeedLoader`] with a [`SignalSource`]: the view layer places the
//! [`SentinelHandle`] on its marker and reports scroll positions, and the
//! session turns proximity crossings into `load_more` calls.

use crate::error::Result;
use crate::fetch::PageFetcher;
use crate::loader::{FeedLoader, LoadOutcome, LoaderStatus};
use crate::signal::{ObserverOptions, Rect, SentinelHandle, SignalSource};
use crate::types::JsonValue;
use tracing::trace;

/// A loader wired to a proximity signal
pub struct FeedSession<F: PageFetcher> {
    loader: FeedLoader<F>,
    sentinel: SentinelHandle,
    signal: SignalSource,
}

impl<F: PageFetcher> std::fmt::Debug for FeedSession<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedSession")
            .field("loader", &self.loader)
            .field("signal", &self.signal)
            .finish_non_exhaustive()
    }
}

impl<F> FeedSession<F>
where
    F: PageFetcher + 'static,
{
    /// Create a session observing against the viewport
    pub fn new(loader: FeedLoader<F>) -> Result<Self> {
        let options = loader.config().observer_options()?;
        let sentinel = SentinelHandle::new();
        let signal = SignalSource::new(&sentinel, options);
        Ok(Self {
            loader,
            sentinel,
            signal,
        })
    }

    /// Observe against a scroll container instead of the viewport
    #[must_use]
    pub fn with_container(mut self, container: Rect) -> Self {
        self.signal.set_container(Some(container));
        self
    }

    /// Change the scroll container (`None` = viewport)
    pub fn set_container(&mut self, container: Option<Rect>) {
        self.signal.set_container(container);
    }

    /// Change the root margin and threshold
    ///
    /// A change re-attaches the signal, so a sentinel already in range
    /// under the new options fires on the next scroll.
    pub fn set_observer_options(&mut self, options: ObserverOptions) {
        self.signal.set_options(options);
    }

    pub fn loader(&self) -> &FeedLoader<F> {
        &self.loader
    }

    /// Handle for the view layer's marker element
    pub fn sentinel(&self) -> SentinelHandle {
        self.sentinel.clone()
    }

    /// Issue the initial load, if due
    ///
    /// Only needed when the loader was built outside a runtime, or to await
    /// the outcome; otherwise the loader has already issued it.
    pub async fn start(&self) -> Result<LoadOutcome<F::Data>> {
        self.loader.initial_load().await
    }

    /// Report the current viewport
    ///
    /// Returns `None` when the sentinel did not cross into range, otherwise
    /// the result of the triggered `load_more`.
    pub async fn on_scroll(&mut self, viewport: Rect) -> Option<Result<LoadOutcome<F::Data>>> {
        let status = self.loader.status().await;
        self.signal.set_enabled(status.enabled);
        self.signal.set_has_more(status.has_more);

        if !self.signal.poll(viewport) {
            return None;
        }
        trace!("Sentinel in range");
        Some(self.loader.load_more().await)
    }

    /// Declare the reset dependencies
    ///
    /// A change resets the loader and re-issues the initial load; the
    /// outcome of that load is returned.
    pub async fn update_deps(&self, deps: Vec<JsonValue>) -> Result<Option<LoadOutcome<F::Data>>> {
        if !self.loader.reset_on_deps(deps).await {
            return Ok(None);
        }
        self.loader.initial_load().await.map(Some)
    }

    pub async fn status(&self) -> LoaderStatus {
        self.loader.status().await
    }
}
