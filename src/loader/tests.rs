//! Tests for the feed loader

use super::*;
use crate::config::LoaderConfig;
use crate::connectivity::ManualConnectivity;
use crate::error::{Error, LoadError, Result};
use crate::fetch::PageFetcher;
use crate::pagination::PageToken;
use crate::types::{FetchResult, JsonValue, PaginationMode};
use async_trait::async_trait;
use futures::future::join_all;
use serde_json::json;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Semaphore;

// ============================================================================
// Test Fetcher
// ============================================================================

enum Step {
    Page(Option<JsonValue>),
    Fail(Error),
}

/// Fetcher that records tokens, follows a script and can be held open
#[derive(Default)]
struct ScriptedFetcher {
    calls: Mutex<Vec<PageToken>>,
    script: Mutex<VecDeque<Step>>,
    hold: Option<Arc<Semaphore>>,
    cache: bool,
    cache_clears: AtomicUsize,
    clear_delay: Option<Duration>,
}

impl ScriptedFetcher {
    fn new() -> Self {
        Self::default()
    }

    fn held() -> (Self, Arc<Semaphore>) {
        let hold = Arc::new(Semaphore::new(0));
        let fetcher = Self {
            hold: Some(Arc::clone(&hold)),
            ..Self::default()
        };
        (fetcher, hold)
    }

    fn with_cache(mut self) -> Self {
        self.cache = true;
        self
    }

    fn with_slow_clear(mut self, delay: Duration) -> Self {
        self.cache = true;
        self.clear_delay = Some(delay);
        self
    }

    fn then_cursor(self, cursor: impl Into<JsonValue>) -> Self {
        self.script
            .lock()
            .unwrap()
            .push_back(Step::Page(Some(cursor.into())));
        self
    }

    fn then_page(self) -> Self {
        self.script.lock().unwrap().push_back(Step::Page(None));
        self
    }

    fn then_fail(self, err: Error) -> Self {
        self.script.lock().unwrap().push_back(Step::Fail(err));
        self
    }
}

#[async_trait]
impl PageFetcher for ScriptedFetcher {
    type Data = usize;

    async fn fetch(&self, token: &PageToken) -> Result<FetchResult<usize>> {
        let index = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(token.clone());
            calls.len() - 1
        };

        if let Some(hold) = &self.hold {
            hold.acquire().await.unwrap().forget();
        }

        let step = self.script.lock().unwrap().pop_front();
        match step {
            Some(Step::Page(Some(cursor))) => Ok(FetchResult::with_cursor(index, cursor)),
            Some(Step::Page(None)) | None => Ok(FetchResult::new(index)),
            Some(Step::Fail(err)) => Err(err),
        }
    }

    async fn clear_cache(&self) -> bool {
        if self.cache {
            self.cache_clears.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.clear_delay {
                tokio::time::sleep(delay).await;
            }
        }
        self.cache
    }
}

fn calls(loader: &FeedLoader<ScriptedFetcher>) -> Vec<PageToken> {
    loader.fetcher().calls.lock().unwrap().clone()
}

fn page_config() -> LoaderConfig {
    LoaderConfig::new(PaginationMode::Page)
        .rate_limit_ms(0)
        .initial_load(false)
}

fn cursor_config() -> LoaderConfig {
    LoaderConfig::new(PaginationMode::Cursor)
        .rate_limit_ms(0)
        .initial_load(false)
}

async fn wait_until<F>(loader: &FeedLoader<ScriptedFetcher>, condition: F)
where
    F: Fn(&LoaderStatus) -> bool,
{
    for _ in 0..200 {
        if condition(&loader.status().await) {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not reached: {:?}", loader.status().await);
}

fn spawn_load(
    loader: &FeedLoader<ScriptedFetcher>,
) -> tokio::task::JoinHandle<Result<LoadOutcome<usize>>> {
    let loader = loader.clone();
    tokio::spawn(async move { loader.load_more().await })
}

// ============================================================================
// Pagination Tests
// ============================================================================

#[tokio::test]
async fn test_page_mode_three_fetches() {
    let loader = FeedLoader::new(ScriptedFetcher::new(), page_config()).unwrap();

    for _ in 0..3 {
        assert!(loader.load_more().await.unwrap().is_loaded());
    }

    let status = loader.status().await;
    assert_eq!(status.token, PageToken::page(4));
    assert_eq!(status.pages_loaded, 3);
    assert!(status.has_more);
    assert_eq!(
        calls(&loader),
        vec![PageToken::page(1), PageToken::page(2), PageToken::page(3)]
    );
}

#[tokio::test]
async fn test_cursor_mode_uses_next_cursor() {
    let fetcher = ScriptedFetcher::new().then_cursor("abc");
    let loader = FeedLoader::new(fetcher, cursor_config()).unwrap();

    let page = loader.load_more().await.unwrap().into_loaded().unwrap();
    assert_eq!(page.next_cursor, Some(json!("abc")));
    assert_eq!(loader.token().await, PageToken::cursor("abc"));

    loader.load_more().await.unwrap();
    assert_eq!(
        calls(&loader),
        vec![PageToken::Cursor(JsonValue::Null), PageToken::cursor("abc")]
    );
}

#[tokio::test]
async fn test_cursor_mode_missing_cursor_keeps_token() {
    let fetcher = ScriptedFetcher::new().then_cursor("abc").then_page();
    let loader = FeedLoader::new(fetcher, cursor_config()).unwrap();

    loader.load_more().await.unwrap();
    loader.load_more().await.unwrap();
    assert_eq!(loader.token().await, PageToken::cursor("abc"));

    // The caller must flip has_more; until then the same cursor is re-fetched
    loader.load_more().await.unwrap();
    assert_eq!(calls(&loader)[2], PageToken::cursor("abc"));
}

// ============================================================================
// Guard Tests
// ============================================================================

#[tokio::test]
async fn test_exhausted_never_fetches() {
    let loader = FeedLoader::builder(ScriptedFetcher::new())
        .config(page_config())
        .has_more(false)
        .build()
        .unwrap();

    let outcome = loader.load_more().await.unwrap();
    assert_eq!(outcome.skip_reason(), Some(SkipReason::Exhausted));
    assert!(calls(&loader).is_empty());

    loader.set_has_more(true).await;
    assert!(loader.load_more().await.unwrap().is_loaded());
    loader.set_has_more(false).await;
    assert!(loader.load_more().await.unwrap().is_skipped());
    assert_eq!(calls(&loader).len(), 1);
}

#[tokio::test]
async fn test_disabled_never_fetches() {
    let loader = FeedLoader::new(ScriptedFetcher::new(), page_config().enabled(false)).unwrap();

    let outcome = loader.load_more().await.unwrap();
    assert_eq!(outcome.skip_reason(), Some(SkipReason::Disabled));
    assert!(calls(&loader).is_empty());
    assert!(loader.status().await.last_error.is_none());
}

#[tokio::test]
async fn test_single_flight() {
    let (fetcher, hold) = ScriptedFetcher::held();
    let loader = FeedLoader::new(fetcher, page_config()).unwrap();

    let first = spawn_load(&loader);
    wait_until(&loader, |s| s.is_fetching).await;

    let others = join_all((0..9).map(|_| loader.load_more())).await;
    for outcome in others {
        assert_eq!(outcome.unwrap().skip_reason(), Some(SkipReason::InFlight));
    }

    hold.add_permits(1);
    assert!(first.await.unwrap().unwrap().is_loaded());
    assert_eq!(calls(&loader), vec![PageToken::page(1)]);
    assert!(!loader.status().await.is_fetching);
}

#[tokio::test]
async fn test_triggers_within_rate_limit_fetch_once() {
    let config = page_config().rate_limit_ms(10_000);
    let loader = FeedLoader::new(ScriptedFetcher::new(), config).unwrap();

    assert!(loader.load_more().await.unwrap().is_loaded());
    let outcome = loader.load_more().await.unwrap();
    assert_eq!(outcome.skip_reason(), Some(SkipReason::RateLimited));
    assert_eq!(calls(&loader).len(), 1);
}

#[tokio::test]
async fn test_rate_limit_reopens() {
    let config = page_config().rate_limit_ms(30);
    let loader = FeedLoader::new(ScriptedFetcher::new(), config).unwrap();

    assert!(loader.load_more().await.unwrap().is_loaded());
    tokio::time::sleep(Duration::from_millis(60)).await;
    assert!(loader.load_more().await.unwrap().is_loaded());
    assert_eq!(loader.token().await, PageToken::page(3));
}

#[tokio::test]
async fn test_skipped_guards_do_not_consume_rate_limit() {
    let config = page_config().rate_limit_ms(10_000);
    let loader = FeedLoader::builder(ScriptedFetcher::new())
        .config(config)
        .has_more(false)
        .build()
        .unwrap();

    loader.load_more().await.unwrap();
    loader.set_has_more(true).await;
    assert!(loader.load_more().await.unwrap().is_loaded());
}

// ============================================================================
// Connectivity Tests
// ============================================================================

#[tokio::test]
async fn test_offline_trigger_records_error() {
    let errors = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&errors);
    let loader = FeedLoader::builder(ScriptedFetcher::new())
        .config(page_config())
        .connectivity(ManualConnectivity::new(false))
        .on_error(move |err| sink.lock().unwrap().push(err.clone()))
        .build()
        .unwrap();

    let outcome = loader.load_more().await.unwrap();
    assert_eq!(outcome.skip_reason(), Some(SkipReason::Offline));
    assert!(calls(&loader).is_empty());

    let status = loader.status().await;
    assert!(!status.is_online);
    assert_eq!(status.last_error, Some(LoadError::offline()));
    assert_eq!(*errors.lock().unwrap(), vec![LoadError::offline()]);
}

#[tokio::test]
async fn test_going_offline_mid_fetch_does_not_cancel() {
    let (fetcher, hold) = ScriptedFetcher::held();
    let provider = ManualConnectivity::new(true);
    let loader = FeedLoader::builder(fetcher)
        .config(page_config())
        .connectivity(provider.clone())
        .build()
        .unwrap();

    let pending = spawn_load(&loader);
    wait_until(&loader, |s| s.is_fetching).await;

    provider.set_online(false);
    wait_until(&loader, |s| !s.is_online).await;
    let status = loader.status().await;
    assert!(status.is_fetching);
    assert!(status.last_error.as_ref().is_some_and(LoadError::is_connectivity));

    hold.add_permits(1);
    assert!(pending.await.unwrap().unwrap().is_loaded());
    assert_eq!(loader.token().await, PageToken::page(2));

    let outcome = loader.load_more().await.unwrap();
    assert_eq!(outcome.skip_reason(), Some(SkipReason::Offline));
    assert_eq!(calls(&loader).len(), 1);
}

#[tokio::test]
async fn test_reconnect_does_not_auto_retry() {
    let provider = ManualConnectivity::new(true);
    let loader = FeedLoader::builder(ScriptedFetcher::new())
        .config(page_config())
        .connectivity(provider.clone())
        .build()
        .unwrap();

    provider.set_online(false);
    wait_until(&loader, |s| !s.is_online).await;
    provider.set_online(true);
    wait_until(&loader, |s| s.is_online).await;
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert!(calls(&loader).is_empty());
    // The connectivity error stays until the next admitted attempt
    assert!(loader.status().await.is_error());
    assert!(loader.load_more().await.unwrap().is_loaded());
    assert!(!loader.status().await.is_error());
}

// ============================================================================
// Failure Tests
// ============================================================================

#[tokio::test]
async fn test_fetch_failure_keeps_token_and_retries_same_page() {
    let errors = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&errors);
    let fetcher = ScriptedFetcher::new().then_fail(Error::from(LoadError::fetch("boom")));
    let loader = FeedLoader::builder(fetcher)
        .config(page_config())
        .on_error(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .build()
        .unwrap();

    let err = loader.load_more().await.unwrap_err();
    assert_eq!(err.to_load_error(), LoadError::fetch("boom"));
    assert_eq!(errors.load(Ordering::SeqCst), 1);

    let status = loader.status().await;
    assert_eq!(status.last_error, Some(LoadError::fetch("boom")));
    assert!(!status.is_fetching);
    assert!(status.has_more);
    assert_eq!(status.token, PageToken::page(1));

    assert!(loader.load_more().await.unwrap().is_loaded());
    assert_eq!(calls(&loader), vec![PageToken::page(1), PageToken::page(1)]);
    assert!(loader.status().await.last_error.is_none());
}

#[tokio::test]
async fn test_foreign_errors_are_wrapped() {
    let fetcher = ScriptedFetcher::new().then_fail(Error::http_status(500, "down"));
    let loader = FeedLoader::new(fetcher, page_config()).unwrap();

    let err = loader.load_more().await.unwrap_err();
    assert!(matches!(err, Error::Load(LoadError::Fetch { .. })));
    assert_eq!(err.to_string(), "Fetch failed: HTTP 500: down");
}

#[tokio::test]
async fn test_retry() {
    let fetcher = ScriptedFetcher::new().then_fail(Error::from(LoadError::fetch("boom")));
    let loader = FeedLoader::new(fetcher, page_config()).unwrap();

    assert!(loader.load_more().await.is_err());
    assert!(loader.retry().await.unwrap().is_loaded());
    assert_eq!(loader.token().await, PageToken::page(2));

    loader.set_has_more(false).await;
    let outcome = loader.retry().await.unwrap();
    assert_eq!(outcome.skip_reason(), Some(SkipReason::Exhausted));
}

#[tokio::test]
async fn test_refused_retry_keeps_error() {
    let fetcher = ScriptedFetcher::new().then_fail(Error::from(LoadError::fetch("boom")));
    let loader = FeedLoader::new(fetcher, page_config().rate_limit_ms(10_000)).unwrap();
    assert!(loader.load_more().await.is_err());

    let outcome = loader.retry().await.unwrap();
    assert_eq!(outcome.skip_reason(), Some(SkipReason::RateLimited));
    let status = loader.status().await;
    assert_eq!(status.last_error, Some(LoadError::fetch("boom")));
    assert!(status.is_error());
    assert!(!status.is_success());

    loader.set_enabled(false).await;
    let outcome = loader.retry().await.unwrap();
    assert_eq!(outcome.skip_reason(), Some(SkipReason::Disabled));
    assert_eq!(loader.status().await.last_error, Some(LoadError::fetch("boom")));
    assert_eq!(calls(&loader).len(), 1);
}

#[tokio::test]
async fn test_retry_offline_is_silent() {
    let loader = FeedLoader::builder(ScriptedFetcher::new())
        .config(page_config())
        .connectivity(ManualConnectivity::new(false))
        .build()
        .unwrap();

    let outcome = loader.retry().await.unwrap();
    assert_eq!(outcome.skip_reason(), Some(SkipReason::Offline));
    assert!(loader.status().await.last_error.is_none());
    assert!(calls(&loader).is_empty());
}

#[tokio::test]
async fn test_dropped_caller_does_not_strand_fetch() {
    let (fetcher, hold) = ScriptedFetcher::held();
    let loader = FeedLoader::new(fetcher, page_config()).unwrap();

    let timed_out =
        tokio::time::timeout(Duration::from_millis(20), loader.load_more()).await;
    assert!(timed_out.is_err());
    assert!(loader.status().await.is_fetching);

    hold.add_permits(1);
    wait_until(&loader, |s| !s.is_fetching).await;
    assert_eq!(loader.token().await, PageToken::page(2));
}

// ============================================================================
// Reset Tests
// ============================================================================

#[tokio::test]
async fn test_reset_restores_token_and_skips_rate_limit() {
    let config = page_config().rate_limit_ms(10_000);
    let loader = FeedLoader::new(ScriptedFetcher::new(), config).unwrap();

    loader.load_more().await.unwrap();
    assert_eq!(loader.token().await, PageToken::page(2));

    assert!(!loader.reset(ResetOptions::default()).await);
    let status = loader.status().await;
    assert_eq!(status.token, PageToken::page(1));
    assert_eq!(status.pages_loaded, 0);
    assert_eq!(status.generation, 1);
    assert!(status.last_fetch_at.is_none());

    assert!(loader.load_more().await.unwrap().is_loaded());
    assert_eq!(calls(&loader), vec![PageToken::page(1), PageToken::page(1)]);
}

#[tokio::test]
async fn test_result_settling_after_reset_is_discarded() {
    let (fetcher, hold) = ScriptedFetcher::held();
    let fetcher = fetcher.then_cursor("stale").then_cursor("fresh");
    let loader = FeedLoader::new(fetcher, cursor_config().initial_cursor("c0")).unwrap();

    let stale = spawn_load(&loader);
    wait_until(&loader, |s| s.is_fetching).await;

    loader.reset(ResetOptions::default()).await;
    assert!(!loader.status().await.is_fetching);

    // A post-reset fetch may start while the stale one is still pending
    let fresh = spawn_load(&loader);
    wait_until(&loader, |s| s.is_fetching).await;

    hold.add_permits(1);
    assert!(stale.await.unwrap().unwrap().is_discarded());
    let status = loader.status().await;
    assert!(status.is_fetching);
    assert_eq!(status.token, PageToken::cursor("c0"));

    hold.add_permits(1);
    assert!(fresh.await.unwrap().unwrap().is_loaded());
    assert_eq!(loader.token().await, PageToken::cursor("fresh"));
}

#[tokio::test]
async fn test_failure_settling_after_reset_is_discarded() {
    let (fetcher, hold) = ScriptedFetcher::held();
    let fetcher = fetcher.then_fail(Error::from(LoadError::fetch("late")));
    let loader = FeedLoader::new(fetcher, page_config()).unwrap();

    let stale = spawn_load(&loader);
    wait_until(&loader, |s| s.is_fetching).await;
    loader.reset(ResetOptions::default()).await;

    hold.add_permits(1);
    assert!(stale.await.unwrap().unwrap().is_discarded());
    assert!(loader.status().await.last_error.is_none());
}

#[tokio::test]
async fn test_reset_clears_cache_when_asked() {
    let loader = FeedLoader::new(ScriptedFetcher::new().with_cache(), page_config()).unwrap();

    assert!(!loader.reset(ResetOptions::default()).await);
    assert_eq!(loader.fetcher().cache_clears.load(Ordering::SeqCst), 0);

    assert!(loader.reset(ResetOptions::clear_cache()).await);
    assert_eq!(loader.fetcher().cache_clears.load(Ordering::SeqCst), 1);

    let uncached = FeedLoader::new(ScriptedFetcher::new(), page_config()).unwrap();
    assert!(!uncached.reset(ResetOptions::clear_cache()).await);
}

#[tokio::test]
async fn test_update_deps_resets_on_change() {
    let config = page_config().reset_deps(vec![json!("books")]);
    let loader = FeedLoader::new(ScriptedFetcher::new(), config).unwrap();

    loader.load_more().await.unwrap();
    assert!(!loader.update_deps(vec![json!("books")]).await);
    assert_eq!(loader.token().await, PageToken::page(2));

    assert!(loader.update_deps(vec![json!("films")]).await);
    let status = loader.status().await;
    assert_eq!(status.token, PageToken::page(1));
    assert_eq!(status.generation, 1);
}

#[tokio::test]
async fn test_load_queued_during_reset_sees_reset_state() {
    let fetcher = ScriptedFetcher::new().with_slow_clear(Duration::from_millis(100));
    let loader = FeedLoader::new(fetcher, page_config()).unwrap();
    loader.load_more().await.unwrap();
    loader.load_more().await.unwrap();
    assert_eq!(loader.token().await, PageToken::page(3));

    let resetting = {
        let loader = loader.clone();
        tokio::spawn(async move { loader.reset(ResetOptions::clear_cache()).await })
    };
    for _ in 0..200 {
        if loader.fetcher().cache_clears.load(Ordering::SeqCst) == 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
    assert_eq!(loader.fetcher().cache_clears.load(Ordering::SeqCst), 1);

    // Queued behind the reset, which is still clearing the cache
    let queued = spawn_load(&loader);
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(!queued.is_finished());

    assert!(resetting.await.unwrap());
    assert!(queued.await.unwrap().unwrap().is_loaded());

    assert_eq!(calls(&loader)[2], PageToken::page(1));
    let status = loader.status().await;
    assert_eq!(status.generation, 1);
    assert_eq!(status.token, PageToken::page(2));
}

#[tokio::test]
async fn test_update_deps_reissues_initial_load() {
    let config = page_config()
        .initial_load(true)
        .reset_deps(vec![json!("books")]);
    let loader = FeedLoader::new(ScriptedFetcher::new(), config).unwrap();
    wait_until(&loader, |s| s.pages_loaded == 1).await;

    assert!(loader.update_deps(vec![json!("films")]).await);
    wait_until(&loader, |s| s.generation == 1 && s.pages_loaded == 1).await;
    assert_eq!(calls(&loader), vec![PageToken::page(1), PageToken::page(1)]);
}

// ============================================================================
// Initial Load Tests
// ============================================================================

#[tokio::test]
async fn test_initial_load_fires_on_build_once_per_generation() {
    let loader = FeedLoader::new(ScriptedFetcher::new(), page_config().initial_load(true)).unwrap();

    wait_until(&loader, |s| s.pages_loaded == 1).await;
    assert_eq!(calls(&loader), vec![PageToken::page(1)]);
    let outcome = loader.initial_load().await.unwrap();
    assert_eq!(outcome.skip_reason(), Some(SkipReason::InitialLoadNotDue));

    // A plain reset re-arms it without issuing it
    loader.reset(ResetOptions::default()).await;
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(calls(&loader).len(), 1);

    assert!(loader.initial_load().await.unwrap().is_loaded());
    assert_eq!(calls(&loader).len(), 2);
}

#[test]
fn test_build_outside_runtime_leaves_initial_load_pending() {
    let loader = FeedLoader::new(ScriptedFetcher::new(), page_config().initial_load(true)).unwrap();
    assert!(calls(&loader).is_empty());

    let outcome = tokio_test::block_on(loader.initial_load()).unwrap();
    assert!(outcome.is_loaded());
    assert_eq!(calls(&loader), vec![PageToken::page(1)]);
}

#[tokio::test]
async fn test_initial_load_respects_config() {
    let loader = FeedLoader::new(ScriptedFetcher::new(), page_config()).unwrap();
    let outcome = loader.initial_load().await.unwrap();
    assert_eq!(outcome.skip_reason(), Some(SkipReason::InitialLoadNotDue));
    assert!(calls(&loader).is_empty());
}

#[tokio::test]
async fn test_initial_load_does_not_double_fire() {
    let (fetcher, hold) = ScriptedFetcher::held();
    let loader = FeedLoader::new(fetcher, page_config().initial_load(true)).unwrap();
    wait_until(&loader, |s| s.is_fetching).await;

    // A signal trigger while the initial load is pending is single-flighted
    let outcome = loader.load_more().await.unwrap();
    assert_eq!(outcome.skip_reason(), Some(SkipReason::InFlight));
    let outcome = loader.initial_load().await.unwrap();
    assert_eq!(outcome.skip_reason(), Some(SkipReason::InitialLoadNotDue));

    hold.add_permits(1);
    wait_until(&loader, |s| s.pages_loaded == 1).await;
    assert_eq!(calls(&loader).len(), 1);
}

#[tokio::test]
async fn test_initial_load_waits_for_connectivity() {
    let provider = ManualConnectivity::new(false);
    let loader = FeedLoader::builder(ScriptedFetcher::new())
        .config(page_config().initial_load(true))
        .connectivity(provider.clone())
        .build()
        .unwrap();

    let outcome = loader.initial_load().await.unwrap();
    assert_eq!(outcome.skip_reason(), Some(SkipReason::InitialLoadNotDue));

    provider.set_online(true);
    wait_until(&loader, |s| s.pages_loaded == 1).await;
    assert_eq!(calls(&loader), vec![PageToken::page(1)]);
}

#[tokio::test]
async fn test_initial_load_on_enable() {
    let config = page_config().initial_load(true).enabled(false);
    let loader = FeedLoader::new(ScriptedFetcher::new(), config).unwrap();

    loader.set_enabled(true).await;
    wait_until(&loader, |s| s.pages_loaded == 1).await;

    // Toggling again does not re-issue it
    loader.set_enabled(false).await;
    loader.set_enabled(true).await;
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(calls(&loader).len(), 1);
}

// ============================================================================
// Status Tests
// ============================================================================

#[tokio::test]
async fn test_status_projection() {
    let (fetcher, hold) = ScriptedFetcher::held();
    let fetcher = fetcher.then_page().then_fail(Error::from(LoadError::fetch("x")));
    let loader = FeedLoader::new(fetcher, page_config()).unwrap();

    let status = loader.status().await;
    assert!(status.can_load_more());
    assert!(status.is_idle());
    assert!(status.is_success());
    assert!(!status.is_error());

    let pending = spawn_load(&loader);
    wait_until(&loader, |s| s.is_fetching).await;
    let status = loader.status().await;
    assert!(!status.can_load_more());
    assert!(!status.is_idle());
    assert!(!status.is_success());
    assert!(status.last_fetch_at.is_some());

    hold.add_permits(2);
    pending.await.unwrap().unwrap();
    assert!(loader.load_more().await.is_err());

    let status = loader.status().await;
    assert!(status.can_load_more());
    assert!(status.is_idle());
    assert!(status.is_error());
    assert!(!status.is_success());

    let value = serde_json::to_value(&status).unwrap();
    assert_eq!(value["can_load_more"], json!(true));
    assert_eq!(value["is_error"], json!(true));
    assert_eq!(value["exhausted"], json!(false));
    assert_eq!(value["token"], json!({"mode": "page", "value": 2}));
    assert_eq!(value["last_error"]["kind"], json!("fetch"));
}

#[test]
fn test_build_rejects_invalid_config() {
    let config = LoaderConfig::default().root_margin("lots");
    let err = FeedLoader::new(ScriptedFetcher::new(), config).unwrap_err();
    assert!(err.to_string().contains("root_margin"));
}
