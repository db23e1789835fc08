//! Proximity observer and signal source

use super::geometry::{Rect, RootMargin};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::trace;

/// Options controlling when the sentinel counts as "near"
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObserverOptions {
    /// Margin the root is grown by before testing
    pub root_margin: RootMargin,
    /// Fraction of the sentinel that must be inside the grown root
    pub threshold: f64,
}

impl Default for ObserverOptions {
    fn default() -> Self {
        Self {
            root_margin: RootMargin::default(),
            threshold: 0.1,
        }
    }
}

// ============================================================================
// Proximity Observer
// ============================================================================

/// Watches one sentinel attachment against one scroll root
///
/// Reports a trigger each time the sentinel crosses from "not near" to
/// "near". The first observation after creation reports if the sentinel is
/// already near.
#[derive(Debug, Clone)]
pub struct ProximityObserver {
    options: ObserverOptions,
    /// Scroll container; `None` observes against the viewport
    container: Option<Rect>,
    /// Result of the previous observation
    was_near: Option<bool>,
}

impl ProximityObserver {
    /// Create an observer
    pub fn new(options: ObserverOptions, container: Option<Rect>) -> Self {
        Self {
            options,
            container,
            was_near: None,
        }
    }

    /// Fraction of `sentinel` inside the margin-grown root
    pub fn intersection_ratio(&self, sentinel: &Rect, viewport: &Rect) -> Option<f64> {
        let root = self
            .container
            .unwrap_or(*viewport)
            .expand(&self.options.root_margin);
        let overlap = sentinel.intersection(&root)?;

        if sentinel.area() > 0.0 {
            Some(overlap.area() / sentinel.area())
        } else {
            Some(1.0)
        }
    }

    /// Observe a new sentinel position; returns true on a crossing into "near"
    pub fn observe(&mut self, sentinel: &Rect, viewport: &Rect) -> bool {
        let near = self
            .intersection_ratio(sentinel, viewport)
            .is_some_and(|ratio| ratio >= self.options.threshold);
        let fired = near && self.was_near != Some(true);
        self.was_near = Some(near);
        fired
    }
}

// ============================================================================
// Sentinel Handle
// ============================================================================

/// Current placement of the sentinel marker
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SentinelSlot {
    /// Attachment identity; a new `attach` gets a new id
    pub id: u64,
    /// Position in viewport coordinates
    pub rect: Rect,
}

/// Handle the view layer places on its marker element
#[derive(Debug, Clone)]
pub struct SentinelHandle {
    tx: Arc<watch::Sender<Option<SentinelSlot>>>,
    next_id: Arc<AtomicU64>,
}

impl Default for SentinelHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl SentinelHandle {
    /// Create a detached handle
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self {
            tx: Arc::new(tx),
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Attach to a (new) marker at `rect`
    pub fn attach(&self, rect: Rect) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.tx.send_replace(Some(SentinelSlot { id, rect }));
        id
    }

    /// Move the attached marker; no-op when detached
    pub fn move_to(&self, rect: Rect) {
        self.tx.send_if_modified(|slot| match slot {
            Some(s) if s.rect != rect => {
                s.rect = rect;
                true
            }
            _ => false,
        });
    }

    /// Remove the marker
    pub fn detach(&self) {
        self.tx.send_replace(None);
    }

    /// Current placement
    pub fn current(&self) -> Option<SentinelSlot> {
        *self.tx.borrow()
    }

    /// Receiver for placement changes
    pub fn subscribe(&self) -> watch::Receiver<Option<SentinelSlot>> {
        self.tx.subscribe()
    }
}

// ============================================================================
// Signal Source
// ============================================================================

/// Turns sentinel proximity into load triggers
///
/// Holds an observer only while enabled, not exhausted and attached to a
/// sentinel. Any change to the sentinel identity, options, container or
/// flags drops the observer; the next poll creates a fresh one.
#[derive(Debug)]
pub struct SignalSource {
    sentinel: watch::Receiver<Option<SentinelSlot>>,
    options: ObserverOptions,
    container: Option<Rect>,
    enabled: bool,
    has_more: bool,
    observer: Option<(u64, ProximityObserver)>,
}

impl SignalSource {
    /// Create a signal source for a sentinel
    pub fn new(sentinel: &SentinelHandle, options: ObserverOptions) -> Self {
        Self {
            sentinel: sentinel.subscribe(),
            options,
            container: None,
            enabled: true,
            has_more: true,
            observer: None,
        }
    }

    /// Set the scroll container (`None` = viewport)
    #[must_use]
    pub fn with_container(mut self, container: Option<Rect>) -> Self {
        self.container = container;
        self
    }

    pub fn set_options(&mut self, options: ObserverOptions) {
        if self.options != options {
            self.options = options;
            self.detach();
        }
    }

    pub fn set_container(&mut self, container: Option<Rect>) {
        if self.container != container {
            self.container = container;
            self.detach();
        }
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        if self.enabled != enabled {
            self.enabled = enabled;
            self.detach();
        }
    }

    pub fn set_has_more(&mut self, has_more: bool) {
        if self.has_more != has_more {
            self.has_more = has_more;
            self.detach();
        }
    }

    /// Whether an observer is currently live
    pub fn is_attached(&self) -> bool {
        self.observer.is_some()
    }

    fn detach(&mut self) {
        if self.observer.take().is_some() {
            trace!("Signal source detached");
        }
    }

    /// Attach or detach to match the current inputs
    fn sync(&mut self) -> Option<Rect> {
        let slot = *self.sentinel.borrow_and_update();

        let slot = match slot {
            Some(slot) if self.enabled && self.has_more => slot,
            _ => {
                self.detach();
                return None;
            }
        };

        let stale = self
            .observer
            .as_ref()
            .map_or(true, |(id, _)| *id != slot.id);
        if stale {
            trace!(sentinel = slot.id, "Signal source attached");
            self.observer = Some((
                slot.id,
                ProximityObserver::new(self.options, self.container),
            ));
        }
        Some(slot.rect)
    }

    /// Evaluate the sentinel against `viewport`; true means "load more"
    pub fn poll(&mut self, viewport: Rect) -> bool {
        let Some(rect) = self.sync() else {
            return false;
        };
        match self.observer.as_mut() {
            Some((_, observer)) => observer.observe(&rect, &viewport),
            None => false,
        }
    }
}
