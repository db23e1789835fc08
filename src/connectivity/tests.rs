//! Tests for connectivity module

use super::*;
use futures::future::BoxFuture;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

#[derive(Default)]
struct RecordingSink {
    seen: Mutex<Vec<bool>>,
}

impl ConnectivitySink for RecordingSink {
    fn set_online(self: Arc<Self>, online: bool) -> BoxFuture<'static, ()> {
        Box::pin(async move {
            self.seen.lock().await.push(online);
        })
    }
}

async fn settle() {
    tokio::time::sleep(Duration::from_millis(20)).await;
}

// ============================================================================
// Manual Connectivity Tests
// ============================================================================

#[test]
fn test_manual_connectivity_status() {
    let provider = ManualConnectivity::new(false);
    assert!(!provider.is_online());

    provider.set_online(true);
    assert!(provider.is_online());

    assert!(ManualConnectivity::default().is_online());
}

#[tokio::test]
async fn test_manual_connectivity_deduplicates() {
    let provider = ManualConnectivity::new(true);
    let mut rx = provider.subscribe();

    provider.set_online(true);
    assert!(!rx.has_changed().unwrap());

    provider.set_online(false);
    assert!(rx.has_changed().unwrap());
    assert!(!*rx.borrow_and_update());
}

// ============================================================================
// Monitor Tests
// ============================================================================

#[tokio::test]
async fn test_monitor_forwards_transitions() {
    let provider = ManualConnectivity::new(true);
    let sink = Arc::new(RecordingSink::default());
    let _monitor = ConnectivityMonitor::spawn(provider.subscribe(), Arc::downgrade(&sink));

    provider.set_online(false);
    settle().await;
    provider.set_online(true);
    settle().await;

    assert_eq!(*sink.seen.lock().await, vec![false, true]);
}

#[tokio::test]
async fn test_monitor_forwards_unseen_change() {
    let provider = ManualConnectivity::new(true);
    let rx = provider.subscribe();
    provider.set_online(false);

    let sink = Arc::new(RecordingSink::default());
    let _monitor = ConnectivityMonitor::spawn(rx, Arc::downgrade(&sink));
    settle().await;

    assert_eq!(*sink.seen.lock().await, vec![false]);
}

#[tokio::test]
async fn test_monitor_skips_seen_value() {
    let provider = ManualConnectivity::new(true);
    let mut rx = provider.subscribe();
    provider.set_online(false);
    rx.borrow_and_update();

    let sink = Arc::new(RecordingSink::default());
    let _monitor = ConnectivityMonitor::spawn(rx, Arc::downgrade(&sink));
    settle().await;

    assert!(sink.seen.lock().await.is_empty());
}

#[tokio::test]
async fn test_monitor_stops_when_dropped() {
    let provider = ManualConnectivity::new(true);
    let sink = Arc::new(RecordingSink::default());
    let monitor = ConnectivityMonitor::spawn(provider.subscribe(), Arc::downgrade(&sink));

    drop(monitor);
    settle().await;
    provider.set_online(false);
    settle().await;

    assert!(sink.seen.lock().await.is_empty());
}

#[tokio::test]
async fn test_monitor_stops_when_sink_dropped() {
    let provider = ManualConnectivity::new(true);
    let sink = Arc::new(RecordingSink::default());
    let monitor = ConnectivityMonitor::spawn(provider.subscribe(), Arc::downgrade(&sink));

    drop(sink);
    provider.set_online(false);
    settle().await;

    assert!(monitor.is_finished());
}

// ============================================================================
// Probe Config Tests
// ============================================================================

#[test]
fn test_probe_config_defaults() {
    let config = ProbeConfig::new("https://example.com/health")
        .interval(Duration::from_secs(5))
        .timeout(Duration::from_secs(1));
    assert_eq!(config.interval, Duration::from_secs(5));
    assert_eq!(config.timeout, Duration::from_secs(1));

    let config = ProbeConfig::new("https://example.com");
    assert_eq!(config.interval, Duration::from_secs(30));
    assert_eq!(config.timeout, Duration::from_secs(5));
}

#[tokio::test]
async fn test_probe_rejects_bad_url() {
    let err = ProbeConnectivity::start(ProbeConfig::new("not a url"))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("Invalid URL"));
}
