//! HTTP page fetcher
//!
//! Fetches JSON pages with a GET request, passing the resume token as a
//! query parameter:
//! - cursor mode: `?cursor=abc` (omitted while the cursor is null)
//! - page mode: `?page=2`

use super::PageFetcher;
use crate::error::{Error, Result};
use crate::pagination::PageToken;
use crate::types::{FetchResult, JsonValue};
use async_trait::async_trait;
use reqwest::Client;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::debug;
use url::Url;

/// Configuration for the HTTP fetcher
#[derive(Debug, Clone)]
pub struct HttpFetcherConfig {
    /// Endpoint returning one page per request
    pub url: String,
    /// Query parameter carrying the cursor
    pub cursor_param: String,
    /// Query parameter carrying the page number
    pub page_param: String,
    /// Dot path to the records array; the whole body when unset
    pub records_path: Option<String>,
    /// Dot path to the next cursor; no cursor is reported when unset
    pub cursor_path: Option<String>,
    /// Request timeout
    pub timeout: Duration,
    /// Cache pages per token
    pub cache: bool,
    /// Headers sent with every request
    pub headers: HashMap<String, String>,
}

impl HttpFetcherConfig {
    /// Create a config for an endpoint with default settings
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            cursor_param: "cursor".to_string(),
            page_param: "page".to_string(),
            records_path: None,
            cursor_path: None,
            timeout: Duration::from_secs(30),
            cache: true,
            headers: HashMap::new(),
        }
    }

    /// Set the cursor query parameter
    #[must_use]
    pub fn cursor_param(mut self, param: impl Into<String>) -> Self {
        self.cursor_param = param.into();
        self
    }

    /// Set the page query parameter
    #[must_use]
    pub fn page_param(mut self, param: impl Into<String>) -> Self {
        self.page_param = param.into();
        self
    }

    /// Set the records path
    #[must_use]
    pub fn records_path(mut self, path: impl Into<String>) -> Self {
        self.records_path = Some(path.into());
        self
    }

    /// Set the next cursor path
    #[must_use]
    pub fn cursor_path(mut self, path: impl Into<String>) -> Self {
        self.cursor_path = Some(path.into());
        self
    }

    /// Set the request timeout
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Enable or disable the page cache
    #[must_use]
    pub fn cache(mut self, cache: bool) -> Self {
        self.cache = cache;
        self
    }

    /// Add a header
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }
}

/// Fetches JSON pages over HTTP
pub struct HttpPageFetcher {
    client: Client,
    url: Url,
    config: HttpFetcherConfig,
    cache: RwLock<HashMap<String, FetchResult<Vec<JsonValue>>>>,
}

impl HttpPageFetcher {
    /// Create a fetcher
    pub fn new(config: HttpFetcherConfig) -> Result<Self> {
        let url = Url::parse(&config.url)?;
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(format!("feedpager/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            url,
            config,
            cache: RwLock::new(HashMap::new()),
        })
    }

    /// Fetcher configuration
    pub fn config(&self) -> &HttpFetcherConfig {
        &self.config
    }

    /// Number of cached pages
    pub async fn cached_pages(&self) -> usize {
        self.cache.read().await.len()
    }

    async fn request(&self, token: &PageToken) -> Result<JsonValue> {
        let mut request = self.client.get(self.url.clone());

        if let Some(value) = token.to_query_value() {
            let param = match token {
                PageToken::Cursor(_) => &self.config.cursor_param,
                PageToken::Page(_) => &self.config.page_param,
            };
            request = request.query(&[(param.as_str(), value.as_str())]);
        }

        for (key, value) in &self.config.headers {
            request = request.header(key.as_str(), value.as_str());
        }

        debug!(url = %self.url, %token, "GET page");
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(Error::http_status(status.as_u16(), body));
        }

        serde_json::from_str(&body).map_err(|e| Error::decode(format!("Failed to parse JSON: {e}")))
    }

    pub(crate) fn parse_page(&self, body: &JsonValue) -> Result<FetchResult<Vec<JsonValue>>> {
        let data = match &self.config.records_path {
            Some(path) => match extract_path(body, path) {
                Some(JsonValue::Array(records)) => records.clone(),
                Some(JsonValue::Null) | None => Vec::new(),
                Some(other) => {
                    return Err(Error::decode(format!(
                        "Expected an array at '{path}', found {other}"
                    )))
                }
            },
            None => match body {
                JsonValue::Array(records) => records.clone(),
                other => vec![other.clone()],
            },
        };

        let next_cursor = self
            .config
            .cursor_path
            .as_deref()
            .and_then(|path| extract_path(body, path))
            .filter(|cursor| !cursor.is_null() && cursor.as_str() != Some(""))
            .cloned();

        Ok(FetchResult { data, next_cursor })
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    type Data = Vec<JsonValue>;

    async fn fetch(&self, token: &PageToken) -> Result<FetchResult<Vec<JsonValue>>> {
        let key = token.to_string();
        if self.config.cache {
            if let Some(page) = self.cache.read().await.get(&key) {
                debug!(%token, "Serving page from cache");
                return Ok(page.clone());
            }
        }

        let body = self.request(token).await?;
        let page = self.parse_page(&body)?;

        if self.config.cache {
            self.cache.write().await.insert(key, page.clone());
        }
        Ok(page)
    }

    async fn clear_cache(&self) -> bool {
        if !self.config.cache {
            return false;
        }
        let mut cache = self.cache.write().await;
        debug!(pages = cache.len(), "Clearing page cache");
        cache.clear();
        true
    }
}

impl std::fmt::Debug for HttpPageFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpPageFetcher")
            .field("url", &self.url.as_str())
            .field("cache", &self.config.cache)
            .finish()
    }
}

/// Walk a dot path (`$.a.b`, `items.0.id`) through objects and arrays
pub fn extract_path<'a>(value: &'a JsonValue, path: &str) -> Option<&'a JsonValue> {
    let path = path.strip_prefix("$.").unwrap_or(path);
    if path.is_empty() || path == "$" {
        return Some(value);
    }

    let mut current = value;
    for part in path.split('.') {
        current = match current {
            JsonValue::Object(map) => map.get(part)?,
            JsonValue::Array(items) => items.get(part.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}
