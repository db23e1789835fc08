//! Configuration types for feed loaders
//!
//! Every field is optional in YAML/JSON; missing fields take the defaults
//! documented on each field.

use crate::error::{Error, Result, ResultExt};
use crate::pagination::PaginationState;
use crate::signal::{ObserverOptions, RootMargin};
use crate::types::{JsonValue, PaginationMode};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

// ============================================================================
// Loader Config
// ============================================================================

/// Complete loader configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Master switch; a disabled loader never fetches (default: true)
    pub enabled: bool,

    /// Issue one load as soon as the loader is enabled and online (default: true)
    pub initial_load: bool,

    /// Margin around the scroll root, CSS shorthand (default: "200px")
    pub root_margin: String,

    /// Fraction of the sentinel that must be inside the root (default: 0.1)
    pub threshold: f64,

    /// Minimum interval between fetch attempts in milliseconds, 0 disables (default: 800)
    pub rate_limit_ms: u64,

    /// Pagination mode (default: cursor)
    pub mode: PaginationMode,

    /// First cursor, `null` meaning "start" (default: null)
    pub initial_cursor: JsonValue,

    /// First page number (default: 1)
    pub initial_page: u32,

    /// Values whose change resets the loader (default: empty)
    pub reset_deps: Vec<JsonValue>,

    /// Log skipped attempts (default: false)
    pub debug: bool,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            initial_load: true,
            root_margin: default_root_margin(),
            threshold: 0.1,
            rate_limit_ms: 800,
            mode: PaginationMode::Cursor,
            initial_cursor: JsonValue::Null,
            initial_page: 1,
            reset_deps: Vec::new(),
            debug: false,
        }
    }
}

fn default_root_margin() -> String {
    "200px".to_string()
}

impl LoaderConfig {
    /// Create a default config for the given mode
    pub fn new(mode: PaginationMode) -> Self {
        Self {
            mode,
            ..Default::default()
        }
    }

    /// Parse config from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse config from a JSON string
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load config from a file, choosing the format by extension
    ///
    /// `.json` files are parsed as JSON, everything else as YAML.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::FileNotFound {
                path: path.display().to_string(),
            });
        }

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&contents),
            _ => Self::from_yaml_str(&contents),
        }
    }

    /// Serialize config to YAML
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(Error::invalid_value(
                "threshold",
                format!("{} is outside 0..=1", self.threshold),
            ));
        }

        if self.mode == PaginationMode::Page && self.initial_page == 0 {
            return Err(Error::invalid_value(
                "initial_page",
                "page numbers start at 1",
            ));
        }

        RootMargin::parse(&self.root_margin)?;
        Ok(())
    }

    /// Minimum interval between attempts, `None` when disabled
    pub fn rate_limit(&self) -> Option<Duration> {
        (self.rate_limit_ms > 0).then(|| Duration::from_millis(self.rate_limit_ms))
    }

    /// Observer options derived from the margin and threshold
    pub fn observer_options(&self) -> Result<ObserverOptions> {
        Ok(ObserverOptions {
            root_margin: RootMargin::parse(&self.root_margin)?,
            threshold: self.threshold,
        })
    }

    /// Fresh pagination state for this config
    pub fn pagination_state(&self) -> PaginationState {
        PaginationState::new(self.mode, self.initial_cursor.clone(), self.initial_page)
    }

    // ------------------------------------------------------------------------
    // Builder-style setters
    // ------------------------------------------------------------------------

    /// Set the enabled flag
    #[must_use]
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Set the initial load flag
    #[must_use]
    pub fn initial_load(mut self, initial_load: bool) -> Self {
        self.initial_load = initial_load;
        self
    }

    /// Set the rate limit in milliseconds
    #[must_use]
    pub fn rate_limit_ms(mut self, ms: u64) -> Self {
        self.rate_limit_ms = ms;
        self
    }

    /// Set the first cursor
    #[must_use]
    pub fn initial_cursor(mut self, cursor: impl Into<JsonValue>) -> Self {
        self.initial_cursor = cursor.into();
        self
    }

    /// Set the first page
    #[must_use]
    pub fn initial_page(mut self, page: u32) -> Self {
        self.initial_page = page;
        self
    }

    /// Set the reset dependencies
    #[must_use]
    pub fn reset_deps(mut self, deps: Vec<JsonValue>) -> Self {
        self.reset_deps = deps;
        self
    }

    /// Set the root margin
    #[must_use]
    pub fn root_margin(mut self, margin: impl Into<String>) -> Self {
        self.root_margin = margin.into();
        self
    }

    /// Set the debug flag
    #[must_use]
    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }
}
