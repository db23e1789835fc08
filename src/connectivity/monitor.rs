//! Connectivity monitor task

use futures::future::BoxFuture;
use std::sync::{Arc, Weak};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

/// Receiver of connectivity transitions
pub trait ConnectivitySink: Send + Sync {
    /// Called once per observed change
    fn set_online(self: Arc<Self>, online: bool) -> BoxFuture<'static, ()>;
}

/// Forwards connectivity changes to a sink for as long as it lives
///
/// The task holds only a weak reference to the sink, and is aborted when
/// the monitor is dropped, so the subscription never outlives its owner.
#[derive(Debug)]
pub struct ConnectivityMonitor {
    handle: JoinHandle<()>,
}

impl ConnectivityMonitor {
    /// Start forwarding changes from `rx` to `sink`
    ///
    /// A value already sent but not yet seen through `rx` is forwarded
    /// first. Must be called from within a Tokio runtime.
    pub fn spawn<S>(mut rx: watch::Receiver<bool>, sink: Weak<S>) -> Self
    where
        S: ConnectivitySink + 'static,
    {
        let handle = tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                let online = *rx.borrow_and_update();
                let Some(sink) = sink.upgrade() else {
                    break;
                };
                sink.set_online(online).await;
            }
            debug!("Connectivity monitor stopped");
        });

        Self { handle }
    }

    /// Whether the forwarding task has ended
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for ConnectivityMonitor {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
