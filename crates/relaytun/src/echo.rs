//! Echo suppression — remembers envelopes we sent so the relay's reflection
//! of them is recognised and skipped.

use std::time::Duration;

use dashmap::DashMap;
use tokio::time::Instant;

/// Bounded, time-expiring set of recently sent envelope payloads.
pub struct EchoFilter {
    // payload -> sent_at
    sent: DashMap<String, Instant>,
    window: Duration,
    capacity: usize,
}

impl EchoFilter {
    pub fn new(window: Duration, capacity: usize) -> Self {
        Self {
            sent: DashMap::new(),
            window,
            capacity: capacity.max(1),
        }
    }

    /// Remember a payload we just handed to the relay.
    pub fn insert(&self, payload: &str) {
        self.insert_at(payload, Instant::now());
    }

    /// Consume the entry for `payload`. True when it was ours and still fresh.
    pub fn take(&self, payload: &str) -> bool {
        self.take_at(payload, Instant::now())
    }

    /// Drop a remembered payload that never reached the relay.
    pub fn forget(&self, payload: &str) {
        self.sent.remove(payload);
    }

    pub fn len(&self) -> usize {
        self.sent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sent.is_empty()
    }

    pub(crate) fn insert_at(&self, payload: &str, now: Instant) {
        self.prune(now);
        while self.sent.len() >= self.capacity {
            let oldest = self
                .sent
                .iter()
                .min_by_key(|entry| *entry.value())
                .map(|entry| entry.key().clone());
            match oldest {
                Some(key) => {
                    self.sent.remove(&key);
                    tracing::debug!(
                        fingerprint = %relaytun_core::wire::fingerprint(&key),
                        "echo filter full, evicted oldest entry"
                    );
                }
                None => break,
            }
        }
        self.sent.insert(payload.to_string(), now);
    }

    pub(crate) fn take_at(&self, payload: &str, now: Instant) -> bool {
        match self.sent.remove(payload) {
            Some((_, sent_at)) => now.duration_since(sent_at) <= self.window,
            None => false,
        }
    }

    fn prune(&self, now: Instant) {
        self.sent
            .retain(|_, sent_at| now.duration_since(*sent_at) <= self.window);
    }
}

impl std::fmt::Debug for EchoFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EchoFilter")
            .field("pending", &self.sent.len())
            .field("window", &self.window)
            .field("capacity", &self.capacity)
            .finish()
    }
}
