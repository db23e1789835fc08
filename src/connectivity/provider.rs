//! Connectivity providers

use crate::error::{Error, Result};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};
use url::Url;

/// Source of online/offline status
pub trait ConnectivityProvider: Send + Sync {
    /// Status right now
    fn is_online(&self) -> bool;

    /// Receiver that observes every subsequent change
    fn subscribe(&self) -> watch::Receiver<bool>;
}

// ============================================================================
// Manual Connectivity
// ============================================================================

/// Status set explicitly by the host application
#[derive(Debug, Clone)]
pub struct ManualConnectivity {
    tx: Arc<watch::Sender<bool>>,
}

impl Default for ManualConnectivity {
    fn default() -> Self {
        Self::new(true)
    }
}

impl ManualConnectivity {
    /// Create a provider with the given starting status
    pub fn new(online: bool) -> Self {
        let (tx, _rx) = watch::channel(online);
        Self { tx: Arc::new(tx) }
    }

    /// Report a status; repeated identical reports are not forwarded
    pub fn set_online(&self, online: bool) {
        self.tx.send_if_modified(|current| {
            let changed = *current != online;
            *current = online;
            changed
        });
    }
}

impl ConnectivityProvider for ManualConnectivity {
    fn is_online(&self) -> bool {
        *self.tx.borrow()
    }

    fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

// ============================================================================
// Probe Connectivity
// ============================================================================

/// Configuration for URL probing
#[derive(Debug, Clone)]
pub struct ProbeConfig {
    /// URL to probe
    pub url: String,
    /// Time between probes
    pub interval: Duration,
    /// Per-probe timeout
    pub timeout: Duration,
}

impl ProbeConfig {
    /// Create a probe config with default timing (30s interval, 5s timeout)
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            interval: Duration::from_secs(30),
            timeout: Duration::from_secs(5),
        }
    }

    /// Set probe interval
    #[must_use]
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Set probe timeout
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Status derived from periodically probing a URL
///
/// Any HTTP response, whatever its status, counts as online; only a
/// transport failure counts as offline.
#[derive(Debug)]
pub struct ProbeConnectivity {
    tx: Arc<watch::Sender<bool>>,
    handle: JoinHandle<()>,
}

impl ProbeConnectivity {
    /// Probe once for the starting status, then keep probing in the background
    pub async fn start(config: ProbeConfig) -> Result<Self> {
        let url = Url::parse(&config.url)?;
        if config.interval.is_zero() {
            return Err(Error::invalid_value("interval", "probe interval must be non-zero"));
        }

        let client = Client::builder().timeout(config.timeout).build()?;
        let online = probe(&client, &url).await;
        info!(url = %url, online, "Connectivity probe started");

        let (tx, _rx) = watch::channel(online);
        let tx = Arc::new(tx);
        let task_tx = Arc::clone(&tx);

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(config.interval);
            // First tick completes immediately; the starting probe covered it
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let online = probe(&client, &url).await;
                task_tx.send_if_modified(|current| {
                    let changed = *current != online;
                    *current = online;
                    changed
                });
            }
        });

        Ok(Self { tx, handle })
    }
}

impl ConnectivityProvider for ProbeConnectivity {
    fn is_online(&self) -> bool {
        *self.tx.borrow()
    }

    fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

impl Drop for ProbeConnectivity {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn probe(client: &Client, url: &Url) -> bool {
    match client.head(url.clone()).send().await {
        Ok(_) => true,
        Err(e) => {
            debug!(url = %url, error = %e, "Connectivity probe failed");
            false
        }
    }
}
