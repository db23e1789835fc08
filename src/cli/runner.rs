//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, FetchArgs, OutputFormat};
use crate::config::LoaderConfig;
use crate::connectivity::{ProbeConfig, ProbeConnectivity};
use crate::error::{Error, Result, ResultExt};
use crate::fetch::{HttpFetcherConfig, HttpPageFetcher};
use crate::loader::{FeedLoader, LoadOutcome, SkipReason};
use crate::session::FeedSession;
use crate::signal::Rect;
use crate::types::{FetchResult, JsonValue, PaginationMode};
use serde_json::json;
use tracing::{info, warn};

/// Simulated viewport the sentinel is scrolled into
const VIEWPORT: Rect = Rect {
    x: 0.0,
    y: 0.0,
    width: 800.0,
    height: 600.0,
};

/// Sentinel row height
const SENTINEL_HEIGHT: f64 = 1.0;

/// Distance below the viewport where freshly rendered rows push the sentinel
const OFFSCREEN: f64 = 10_000.0;

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Fetch(args) => self.fetch(args).await,
            Commands::Config => self.show_config(),
        }
    }

    /// Load the loader configuration file, or defaults
    fn load_config(&self) -> Result<LoaderConfig> {
        match &self.cli.config {
            Some(path) => LoaderConfig::from_file(path),
            None => Ok(LoaderConfig::default()),
        }
    }

    /// Print the effective configuration as YAML
    fn show_config(&self) -> Result<()> {
        let config = self.load_config()?;
        print!("{}", config.to_yaml()?);
        Ok(())
    }

    /// Page through a feed
    ///
    /// Each round renders the previous page (pushing the sentinel out of
    /// range) and then scrolls to the end, so every page is requested by a
    /// proximity crossing exactly as a scrolling reader would.
    async fn fetch(&self, args: &FetchArgs) -> Result<()> {
        let mut config = self.load_config()?;
        if let Some(mode) = args.mode {
            config.mode = mode;
        }
        if let Some(ms) = args.rate_limit_ms {
            config.rate_limit_ms = ms;
        }
        if args.pages == 0 {
            return Err(Error::config("--pages must be at least 1"));
        }
        // Every page, the first included, comes from a scroll crossing so
        // its records are printed
        config.initial_load = false;
        config.validate()?;

        let fetcher = HttpPageFetcher::new(Self::fetcher_config(args))?;
        let mut builder = FeedLoader::builder(fetcher)
            .config(config.clone())
            .on_error(|err| warn!(error = %err, "Load error"));
        if let Some(url) = &args.probe_url {
            let probe = ProbeConnectivity::start(ProbeConfig::new(url))
                .await
                .with_context(|| format!("Failed to start connectivity probe for {url}"))?;
            builder = builder.connectivity(probe);
        }
        let mut session = FeedSession::new(builder.build()?)?;

        let sentinel = session.sentinel();
        sentinel.attach(Self::offscreen());
        info!(url = %args.url, mode = %config.mode, "Fetching feed");

        let mut loaded = 0;
        let mut failure = None;

        while failure.is_none() && loaded < args.pages {
            let status = session.status().await;
            if !status.can_load_more() {
                break;
            }

            sentinel.move_to(Self::offscreen());
            session.on_scroll(VIEWPORT).await;
            sentinel.move_to(Self::at_end());

            let Some(result) = session.on_scroll(VIEWPORT).await else {
                continue;
            };
            match result {
                Ok(LoadOutcome::Skipped(SkipReason::RateLimited)) => {
                    if let Some(period) = config.rate_limit() {
                        tokio::time::sleep(period).await;
                    }
                }
                Ok(LoadOutcome::Skipped(reason)) => {
                    info!(%reason, "Stopping");
                    break;
                }
                other => {
                    failure = self.handle_outcome(&session, other, &mut loaded).await.err();
                }
            }
        }

        let status = session.status().await;
        self.output_message(&json!({ "type": "STATUS", "status": status }));

        match failure {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Emit a loaded page and update `has_more`
    async fn handle_outcome(
        &self,
        session: &FeedSession<HttpPageFetcher>,
        outcome: Result<LoadOutcome<Vec<JsonValue>>>,
        loaded: &mut usize,
    ) -> Result<()> {
        let LoadOutcome::Loaded(page) = outcome? else {
            return Ok(());
        };
        *loaded += 1;

        let mode = session.loader().config().mode;
        let has_more = has_more_after(mode, &page);
        self.output_message(&json!({
            "type": "PAGE",
            "page": {
                "index": *loaded,
                "records": page.data.len(),
                "nextCursor": page.next_cursor,
                "data": page.data,
            }
        }));

        if !has_more {
            info!(pages = *loaded, "Feed exhausted");
            session.loader().set_has_more(false).await;
        }
        Ok(())
    }

    fn fetcher_config(args: &FetchArgs) -> HttpFetcherConfig {
        let mut config = HttpFetcherConfig::new(&args.url)
            .cursor_param(&args.cursor_param)
            .page_param(&args.page_param);
        if let Some(path) = &args.records_path {
            config = config.records_path(path);
        }
        if let Some(path) = &args.cursor_path {
            config = config.cursor_path(path);
        }
        for (name, value) in &args.headers {
            config = config.header(name, value);
        }
        config
    }

    fn offscreen() -> Rect {
        Rect::new(0.0, VIEWPORT.bottom() + OFFSCREEN, VIEWPORT.width, SENTINEL_HEIGHT)
    }

    fn at_end() -> Rect {
        Rect::new(
            0.0,
            VIEWPORT.bottom() - SENTINEL_HEIGHT,
            VIEWPORT.width,
            SENTINEL_HEIGHT,
        )
    }

    /// Output a message
    fn output_message(&self, msg: &JsonValue) {
        match self.cli.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string(msg).unwrap_or_default());
            }
            OutputFormat::Pretty => {
                println!("{}", serde_json::to_string_pretty(msg).unwrap_or_default());
            }
        }
    }
}

/// Whether more pages may follow `page`
///
/// An empty page ends any feed; in cursor mode so does a missing cursor.
pub fn has_more_after<T>(mode: PaginationMode, page: &FetchResult<Vec<T>>) -> bool {
    if page.data.is_empty() {
        return false;
    }
    match mode {
        PaginationMode::Cursor => page.advancing_cursor().is_some(),
        PaginationMode::Page => true,
    }
}
