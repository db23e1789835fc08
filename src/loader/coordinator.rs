//! Fetch coordinator
//!
//! All guard checks and flag mutations happen inside one write-lock section;
//! the lock is released while the fetch is pending. Each fetch settles in its
//! own task, so dropping a `load_more` future never strands the in-flight
//! flag. Resets bump a generation counter, and a fetch that settles under an
//! older generation is discarded without touching state.

use super::rate_gate::RateGate;
use super::types::{LoadOutcome, LoaderStatus, ResetOptions, SkipReason};
use crate::config::LoaderConfig;
use crate::connectivity::{ConnectivityMonitor, ConnectivityProvider, ConnectivitySink};
use crate::error::{Error, LoadError, Result};
use crate::fetch::PageFetcher;
use crate::pagination::{PageToken, PaginationState};
use crate::types::JsonValue;
use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, OnceLock};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Callback invoked with every recorded load error
pub type ErrorCallback = Arc<dyn Fn(&LoadError) + Send + Sync>;

/// Mutable session state, only touched under the write lock
#[derive(Debug)]
struct SessionState {
    pagination: PaginationState,
    enabled: bool,
    has_more: bool,
    in_flight: bool,
    is_online: bool,
    last_error: Option<LoadError>,
    last_fetch_at: Option<DateTime<Utc>>,
    gate: RateGate,
    generation: u64,
    initial_load_issued: bool,
    deps: Vec<JsonValue>,
}

impl SessionState {
    /// Evaluate the guards in order; the rate gate is consulted last
    fn admit(&self) -> std::result::Result<(), SkipReason> {
        if !self.enabled {
            Err(SkipReason::Disabled)
        } else if !self.has_more {
            Err(SkipReason::Exhausted)
        } else if self.in_flight {
            Err(SkipReason::InFlight)
        } else if !self.is_online {
            Err(SkipReason::Offline)
        } else if !self.gate.try_admit() {
            Err(SkipReason::RateLimited)
        } else {
            Ok(())
        }
    }

    fn initial_load_due(&self, config: &LoaderConfig) -> bool {
        config.initial_load && !self.initial_load_issued && self.enabled && self.is_online
    }

    fn snapshot(&self) -> LoaderStatus {
        LoaderStatus {
            enabled: self.enabled,
            has_more: self.has_more,
            is_fetching: self.in_flight,
            is_online: self.is_online,
            last_error: self.last_error.clone(),
            token: self.pagination.token().clone(),
            pages_loaded: self.pagination.pages_loaded(),
            last_fetch_at: self.last_fetch_at,
            generation: self.generation,
        }
    }
}

struct Shared<F: PageFetcher> {
    fetcher: F,
    config: LoaderConfig,
    state: RwLock<SessionState>,
    on_error: Option<ErrorCallback>,
    /// Keeps a provider's background work alive for the loader's lifetime
    _provider: Option<Box<dyn ConnectivityProvider>>,
    monitor: OnceLock<ConnectivityMonitor>,
}

impl<F> Shared<F>
where
    F: PageFetcher + 'static,
{
    fn notify_error(&self, err: &LoadError) {
        if let Some(callback) = &self.on_error {
            callback(err);
        }
    }

    fn log_skip(&self, reason: SkipReason) {
        if self.config.debug {
            debug!(%reason, "Load skipped");
        }
    }

    async fn load_more(self: &Arc<Self>) -> Result<LoadOutcome<F::Data>> {
        let admitted = {
            let mut state = self.state.write().await;
            match state.admit() {
                Ok(()) => {
                    state.in_flight = true;
                    state.last_fetch_at = Some(Utc::now());
                    state.last_error = None;
                    Ok((state.pagination.token().clone(), state.generation))
                }
                Err(SkipReason::Offline) => {
                    let err = LoadError::offline();
                    state.last_error = Some(err.clone());
                    Err((SkipReason::Offline, Some(err)))
                }
                Err(reason) => Err((reason, None)),
            }
        };

        let (token, generation) = match admitted {
            Ok(admitted) => admitted,
            Err((reason, err)) => {
                if let Some(err) = err {
                    self.notify_error(&err);
                }
                self.log_skip(reason);
                return Ok(LoadOutcome::Skipped(reason));
            }
        };

        debug!(%token, generation, "Fetching page");
        let shared = Arc::clone(self);
        let settle = tokio::spawn(async move { shared.settle(token, generation).await });

        match settle.await {
            Ok(outcome) => outcome,
            Err(e) => Err(LoadError::fetch(format!("Fetch task failed: {e}")).into()),
        }
    }

    async fn settle(&self, token: PageToken, generation: u64) -> Result<LoadOutcome<F::Data>> {
        let fetched = AssertUnwindSafe(self.fetcher.fetch(&token))
            .catch_unwind()
            .await
            .unwrap_or_else(|_| Err(LoadError::fetch("Fetch operation panicked").into()));

        let mut state = self.state.write().await;
        if state.generation != generation {
            debug!(
                %token,
                generation,
                current = state.generation,
                "Discarding result fetched before reset"
            );
            return Ok(LoadOutcome::Discarded);
        }

        state.in_flight = false;
        match fetched {
            Ok(page) => {
                state.pagination.advance(&page);
                debug!(next = %state.pagination.token(), "Page loaded");
                Ok(LoadOutcome::Loaded(page))
            }
            Err(e) => {
                let err = e.to_load_error();
                state.last_error = Some(err.clone());
                drop(state);

                warn!(%token, error = %err, network = e.is_network(), "Fetch failed");
                self.notify_error(&err);
                Err(Error::Load(err))
            }
        }
    }

    async fn initial_load(self: &Arc<Self>) -> Result<LoadOutcome<F::Data>> {
        {
            let mut state = self.state.write().await;
            if !state.initial_load_due(&self.config) {
                return Ok(LoadOutcome::Skipped(SkipReason::InitialLoadNotDue));
            }
            state.initial_load_issued = true;
        }
        debug!("Issuing initial load");
        self.load_more().await
    }

    fn spawn_initial_load(self: &Arc<Self>) {
        if tokio::runtime::Handle::try_current().is_err() {
            debug!("No runtime; initial load left pending");
            return;
        }
        let shared = Arc::clone(self);
        tokio::spawn(async move {
            if let Err(e) = shared.initial_load().await {
                debug!(error = %e, "Initial load failed");
            }
        });
    }

    async fn apply_online(self: &Arc<Self>, online: bool) {
        let (offline_error, initial_due) = {
            let mut state = self.state.write().await;
            if state.is_online == online {
                return;
            }
            state.is_online = online;

            if online {
                (None, state.initial_load_due(&self.config))
            } else {
                let err = LoadError::offline();
                state.last_error = Some(err.clone());
                (Some(err), false)
            }
        };

        match offline_error {
            Some(err) => {
                info!("Connectivity lost");
                self.notify_error(&err);
            }
            None => info!("Connectivity restored"),
        }

        if initial_due {
            self.spawn_initial_load();
        }
    }

    async fn reset(&self, options: ResetOptions) -> bool {
        let mut state = self.state.write().await;
        state.generation += 1;
        state.pagination.reset();
        state.last_error = None;
        state.in_flight = false;
        state.last_fetch_at = None;
        state.gate.reset();
        state.initial_load_issued = false;

        // Cache is cleared before the lock is released, so no trigger can
        // fetch from a stale cache after the reset
        let cleared = options.clear_cache && self.fetcher.clear_cache().await;
        info!(
            generation = state.generation,
            token = %state.pagination.token(),
            cache_cleared = cleared,
            "Loader reset"
        );
        cleared
    }

    /// Store `deps` and reset if they differ from the current list
    async fn reset_on_deps(&self, deps: Vec<JsonValue>) -> bool {
        {
            let mut state = self.state.write().await;
            if state.deps == deps {
                return false;
            }
            state.deps = deps;
        }
        debug!("Reset dependencies changed");
        self.reset(ResetOptions::default()).await;
        true
    }
}

impl<F> ConnectivitySink for Shared<F>
where
    F: PageFetcher + 'static,
{
    fn set_online(self: Arc<Self>, online: bool) -> BoxFuture<'static, ()> {
        Box::pin(async move { self.apply_online(online).await })
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Builder for [`FeedLoader`]
pub struct FeedLoaderBuilder<F> {
    fetcher: F,
    config: LoaderConfig,
    connectivity: Option<Box<dyn ConnectivityProvider>>,
    on_error: Option<ErrorCallback>,
    has_more: bool,
}

impl<F> FeedLoaderBuilder<F>
where
    F: PageFetcher + 'static,
{
    /// Set the loader configuration
    #[must_use]
    pub fn config(mut self, config: LoaderConfig) -> Self {
        self.config = config;
        self
    }

    /// Follow a connectivity provider for the loader's lifetime
    #[must_use]
    pub fn connectivity(mut self, provider: impl ConnectivityProvider + 'static) -> Self {
        self.connectivity = Some(Box::new(provider));
        self
    }

    /// Call `callback` with every recorded load error
    #[must_use]
    pub fn on_error(mut self, callback: impl Fn(&LoadError) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Arc::new(callback));
        self
    }

    /// Starting value of the caller-owned `has_more` flag (default: true)
    #[must_use]
    pub fn has_more(mut self, has_more: bool) -> Self {
        self.has_more = has_more;
        self
    }

    /// Build the loader
    ///
    /// With a connectivity provider this spawns the monitor task, so it must
    /// be called from within a Tokio runtime. If the initial load is due
    /// (configured, enabled and online) it is issued in the background;
    /// outside a runtime it stays pending until [`FeedLoader::initial_load`].
    pub fn build(self) -> Result<FeedLoader<F>> {
        self.config.validate()?;

        let rx = self.connectivity.as_ref().map(|provider| provider.subscribe());
        let is_online = rx.as_ref().map_or(true, |rx| *rx.borrow());

        let state = SessionState {
            pagination: self.config.pagination_state(),
            enabled: self.config.enabled,
            has_more: self.has_more,
            in_flight: false,
            is_online,
            last_error: None,
            last_fetch_at: None,
            gate: RateGate::new(self.config.rate_limit()),
            generation: 0,
            initial_load_issued: false,
            deps: self.config.reset_deps.clone(),
        };
        let initial_due = state.initial_load_due(&self.config);

        let shared = Arc::new(Shared {
            fetcher: self.fetcher,
            config: self.config,
            state: RwLock::new(state),
            on_error: self.on_error,
            _provider: self.connectivity,
            monitor: OnceLock::new(),
        });

        if let Some(rx) = rx {
            let monitor = ConnectivityMonitor::spawn(rx, Arc::downgrade(&shared));
            let _ = shared.monitor.set(monitor);
        }

        if initial_due {
            shared.spawn_initial_load();
        }

        Ok(FeedLoader { shared })
    }
}

// ============================================================================
// Feed Loader
// ============================================================================

/// Coordinates incremental page loading
///
/// Cheap to clone; clones share one session.
pub struct FeedLoader<F: PageFetcher> {
    shared: Arc<Shared<F>>,
}

impl<F: PageFetcher> Clone for FeedLoader<F> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<F: PageFetcher> std::fmt::Debug for FeedLoader<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedLoader")
            .field("mode", &self.shared.config.mode)
            .field("rate_limit_ms", &self.shared.config.rate_limit_ms)
            .finish()
    }
}

impl<F> FeedLoader<F>
where
    F: PageFetcher + 'static,
{
    /// Start building a loader around a fetcher
    pub fn builder(fetcher: F) -> FeedLoaderBuilder<F> {
        FeedLoaderBuilder {
            fetcher,
            config: LoaderConfig::default(),
            connectivity: None,
            on_error: None,
            has_more: true,
        }
    }

    /// Build a loader with a config and no connectivity provider
    pub fn new(fetcher: F, config: LoaderConfig) -> Result<Self> {
        Self::builder(fetcher).config(config).build()
    }

    /// Loader configuration
    pub fn config(&self) -> &LoaderConfig {
        &self.shared.config
    }

    /// Underlying fetcher
    pub fn fetcher(&self) -> &F {
        &self.shared.fetcher
    }

    /// Fetch the next page if every guard passes
    ///
    /// Guard failures are returned as [`LoadOutcome::Skipped`], never as
    /// errors; only a failing fetch returns `Err`. Offline attempts also
    /// record a connectivity error.
    pub async fn load_more(&self) -> Result<LoadOutcome<F::Data>> {
        self.shared.load_more().await
    }

    /// Retry after a failure
    ///
    /// Skips silently when offline or exhausted; otherwise delegates to
    /// [`load_more`](Self::load_more). The last error is only cleared once a
    /// fetch is admitted, so a refused retry leaves it in place.
    pub async fn retry(&self) -> Result<LoadOutcome<F::Data>> {
        {
            let state = self.shared.state.read().await;
            if !state.is_online {
                return Ok(LoadOutcome::Skipped(SkipReason::Offline));
            }
            if !state.has_more {
                return Ok(LoadOutcome::Skipped(SkipReason::Exhausted));
            }
        }
        self.load_more().await
    }

    /// Issue the initial load if configured and not yet issued
    ///
    /// Issued at most once per generation, and only while enabled and
    /// online. Transitions to enabled or online issue it automatically.
    pub async fn initial_load(&self) -> Result<LoadOutcome<F::Data>> {
        self.shared.initial_load().await
    }

    /// Restore the construction-time token and clear error, in-flight and
    /// rate-limit history
    ///
    /// A fetch pending at reset time is discarded when it settles. Returns
    /// true if the fetcher's cache was cleared.
    pub async fn reset(&self, options: ResetOptions) -> bool {
        self.shared.reset(options).await
    }

    /// Declare the reset dependencies; resets if they changed
    ///
    /// After a reset the re-armed initial load is issued in the background
    /// when due. Returns true if the loader was reset.
    pub async fn update_deps(&self, deps: Vec<JsonValue>) -> bool {
        if !self.shared.reset_on_deps(deps).await {
            return false;
        }
        let initial_due = self
            .shared
            .state
            .read()
            .await
            .initial_load_due(&self.shared.config);
        if initial_due {
            self.shared.spawn_initial_load();
        }
        true
    }

    /// Like [`update_deps`](Self::update_deps), but leaves the initial load
    /// to the caller
    pub(crate) async fn reset_on_deps(&self, deps: Vec<JsonValue>) -> bool {
        self.shared.reset_on_deps(deps).await
    }

    /// Set the caller-owned "more pages exist" flag
    pub async fn set_has_more(&self, has_more: bool) {
        self.shared.state.write().await.has_more = has_more;
    }

    /// Enable or disable loading
    pub async fn set_enabled(&self, enabled: bool) {
        let initial_due = {
            let mut state = self.shared.state.write().await;
            if state.enabled == enabled {
                return;
            }
            state.enabled = enabled;
            state.initial_load_due(&self.shared.config)
        };
        if initial_due {
            self.shared.spawn_initial_load();
        }
    }

    /// Report connectivity directly (what a connectivity monitor does)
    pub async fn set_online(&self, online: bool) {
        self.shared.apply_online(online).await;
    }

    /// Current token
    pub async fn token(&self) -> PageToken {
        self.shared.state.read().await.pagination.token().clone()
    }

    /// Read-only status snapshot
    pub async fn status(&self) -> LoaderStatus {
        self.shared.state.read().await.snapshot()
    }
}
