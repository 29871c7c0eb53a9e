//! Roll-completed events and stale-watcher supersession.
//!
//! - `Publisher`: synchronous observer list; subscribers get every event in
//!   registration order.
//! - `EpochRegistry` / `EpochToken`: a shared generation counter. Installing
//!   a new watcher bumps the generation and every older token goes stale.
//! - `SignatureWatcher`: change detection on the roll signature with a short
//!   debounce for change notifications and a slower interval sample as a
//!   fallback. Time is passed in, nothing here sleeps or spawns.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, trace};

use crate::constants::{WATCH_DEBOUNCE_MS, WATCH_POLL_INTERVAL_MS};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

type Handler<E> = Box<dyn FnMut(&E)>;

/// Observer list for one event type
pub struct Publisher<E> {
    next_id: u64,
    subscribers: Vec<(SubscriptionId, Handler<E>)>,
}

impl<E> Default for Publisher<E> {
    fn default() -> Self {
        Self {
            next_id: 0,
            subscribers: Vec::new(),
        }
    }
}

impl<E> std::fmt::Debug for Publisher<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Publisher")
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

impl<E> Publisher<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&mut self, handler: F) -> SubscriptionId
    where
        F: FnMut(&E) + 'static,
    {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscribers.push((id, Box::new(handler)));
        id
    }

    /// Returns false when the id was not subscribed
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sid, _)| *sid != id);
        self.subscribers.len() != before
    }

    pub fn publish(&mut self, event: &E) {
        trace!(subscribers = self.subscribers.len(), "publishing event");
        for (_, handler) in &mut self.subscribers {
            handler(event);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

/// Source of epoch tokens
#[derive(Debug, Clone, Default)]
pub struct EpochRegistry {
    generation: Arc<AtomicU64>,
}

impl EpochRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new generation; every previously issued token goes stale
    pub fn install(&self) -> EpochToken {
        let epoch = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(epoch, "installed new watcher epoch");
        EpochToken {
            epoch,
            generation: Arc::clone(&self.generation),
        }
    }

    pub fn current(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }
}

/// Held by one watcher; only the newest token is current
#[derive(Debug, Clone)]
pub struct EpochToken {
    epoch: u64,
    generation: Arc<AtomicU64>,
}

impl EpochToken {
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn is_current(&self) -> bool {
        self.generation.load(Ordering::SeqCst) == self.epoch
    }
}

/// Fires once per distinct signature
#[derive(Debug, Clone)]
pub struct SignatureWatcher {
    token: EpochToken,
    debounce: Duration,
    poll_interval: Duration,
    last_fired: Option<String>,
    pending: Option<(String, Instant)>,
    last_sample: Option<Instant>,
}

impl SignatureWatcher {
    pub fn new(token: EpochToken) -> Self {
        Self::with_timing(
            token,
            Duration::from_millis(WATCH_DEBOUNCE_MS),
            Duration::from_millis(WATCH_POLL_INTERVAL_MS),
        )
    }

    pub fn with_timing(token: EpochToken, debounce: Duration, poll_interval: Duration) -> Self {
        Self {
            token,
            debounce,
            poll_interval,
            last_fired: None,
            pending: None,
            last_sample: None,
        }
    }

    pub fn token(&self) -> &EpochToken {
        &self.token
    }

    /// Change notification. Restarts the debounce window.
    pub fn observe(&mut self, signature: &str, now: Instant) {
        self.pending = Some((signature.to_string(), now));
    }

    /// Fire the pending signature once its debounce window has passed and
    /// it differs from the last one fired. Stale watchers never fire.
    pub fn poll(&mut self, now: Instant) -> Option<String> {
        if !self.token.is_current() {
            self.pending = None;
            return None;
        }
        let (_, since) = self.pending.as_ref()?;
        if now.saturating_duration_since(*since) < self.debounce {
            return None;
        }
        let (signature, _) = self.pending.take()?;
        self.fire(signature)
    }

    /// Interval fallback: compare the current signature directly, at most
    /// once per poll interval.
    pub fn sample(&mut self, signature: &str, now: Instant) -> Option<String> {
        if !self.token.is_current() {
            return None;
        }
        if let Some(last) = self.last_sample {
            if now.saturating_duration_since(last) < self.poll_interval {
                return None;
            }
        }
        self.last_sample = Some(now);
        self.fire(signature.to_string())
    }

    fn fire(&mut self, signature: String) -> Option<String> {
        if self.last_fired.as_deref() == Some(signature.as_str()) {
            return None;
        }
        debug!(epoch = self.token.epoch(), signature = %signature, "roll signature changed");
        self.last_fired = Some(signature.clone());
        Some(signature)
    }
}
