//! Process-wide TTL cache with per-key locking.
//!
//! Concurrent requests for the same key must not both trigger an upstream
//! fetch: `get_or_fetch` holds a per-key async lock for the duration of the
//! fetch, so a second concurrent miss waits for the first fetch's result
//! instead of duplicating it. Expiry decisions go through an injected clock
//! so tests can advance time without sleeping.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tracing::debug;

/// Clock abstraction for TTL decisions.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Wall-clock implementation used in production.
#[derive(Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

type Slot<V> = Arc<Mutex<Option<(V, Instant)>>>;

/// Shared TTL cache keyed by (kind, identity) strings.
pub struct TtlCache<V: Clone> {
    clock: Arc<dyn Clock>,
    slots: Mutex<HashMap<String, Slot<V>>>,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Compose a cache key from kind and identity.
    pub fn key(kind: &str, identity: impl std::fmt::Display) -> String {
        format!("{}:{}", kind, identity)
    }

    async fn slot(&self, key: &str) -> Slot<V> {
        let mut slots = self.slots.lock().await;
        slots.entry(key.to_string()).or_default().clone()
    }

    /// Get a live value, or `None` when missing or expired.
    pub async fn get(&self, key: &str) -> Option<V> {
        let slot = self.slot(key).await;
        let guard = slot.lock().await;
        match guard.as_ref() {
            Some((value, expires_at)) if *expires_at > self.clock.now() => Some(value.clone()),
            _ => None,
        }
    }

    /// Store a value with the given TTL.
    pub async fn insert(&self, key: &str, value: V, ttl: Duration) {
        let slot = self.slot(key).await;
        let mut guard = slot.lock().await;
        *guard = Some((value, self.clock.now() + ttl));
    }

    /// Return the cached value for `key`, or run `fetch` and cache its
    /// result. The per-key lock is held across the fetch so concurrent
    /// misses coalesce into a single upstream call.
    pub async fn get_or_fetch<F, Fut, E>(
        &self,
        key: &str,
        ttl: Duration,
        fetch: F,
    ) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<V, E>>,
    {
        let slot = self.slot(key).await;
        let mut guard = slot.lock().await;

        if let Some((value, expires_at)) = guard.as_ref() {
            if *expires_at > self.clock.now() {
                debug!(key = %key, "Cache hit");
                return Ok(value.clone());
            }
        }

        debug!(key = %key, "Cache miss, fetching");
        let value = fetch().await?;
        *guard = Some((value.clone(), self.clock.now() + ttl));
        Ok(value)
    }
}

#[cfg(test)]
pub mod test_support {
    use std::sync::Mutex as StdMutex;

    use super::*;

    /// Manually advanced clock for TTL tests.
    pub struct ManualClock {
        start: Instant,
        offset: StdMutex<Duration>,
    }

    impl ManualClock {
        pub fn new() -> Self {
            Self {
                start: Instant::now(),
                offset: StdMutex::new(Duration::ZERO),
            }
        }

        pub fn advance(&self, by: Duration) {
            *self.offset.lock().unwrap() += by;
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> Instant {
            self.start + *self.offset.lock().unwrap()
        }
    }
}
