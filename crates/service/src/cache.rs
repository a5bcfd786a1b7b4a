//! In-process TTL cache for derived views (stats, dashboard).
//!
//! Not authoritative: callers invalidate by prefix after writes. Concurrent
//! misses on one key may both compute; the last write wins.

use std::{
    future::Future,
    sync::{
        atomic::{AtomicI64, Ordering},
        Arc, Mutex, PoisonError, Weak,
    },
    time::Duration,
};

use chrono::Utc;
use dashmap::DashMap;
use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Millisecond wall clock; injectable so expiry can be tested without sleeping.
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> i64;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// Clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    pub fn new(start_millis: i64) -> Self {
        Self { now: AtomicI64::new(start_millis) }
    }

    pub fn advance(&self, by: Duration) {
        self.now.fetch_add(duration_millis(by), Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub total: usize,
    pub active: usize,
    pub expired: usize,
}

struct CacheEntry<V> {
    value: V,
    expires_at: i64,
}

struct CacheInner<V> {
    entries: DashMap<String, CacheEntry<V>>,
    clock: Arc<dyn Clock>,
    default_ttl: Duration,
    sweeper: Mutex<Option<JoinHandle<()>>>,
}

impl<V> CacheInner<V> {
    fn sweep(&self) -> usize {
        let now = self.clock.now_millis();
        let before = self.entries.len();
        self.entries.retain(|_, e| e.expires_at > now);
        before.saturating_sub(self.entries.len())
    }
}

impl<V> Drop for CacheInner<V> {
    fn drop(&mut self) {
        let slot = self.sweeper.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = slot.take() {
            handle.abort();
        }
    }
}

/// Cloning shares the underlying map.
pub struct TtlCache<V> {
    inner: Arc<CacheInner<V>>,
}

impl<V> Clone for TtlCache<V> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<V: Clone + Send + Sync + 'static> TtlCache<V> {
    pub fn new(default_ttl: Duration) -> Self {
        Self::with_clock(default_ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(default_ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Arc::new(CacheInner {
                entries: DashMap::new(),
                clock,
                default_ttl,
                sweeper: Mutex::new(None),
            }),
        }
    }

    pub fn default_ttl(&self) -> Duration {
        self.inner.default_ttl
    }

    /// Live value for `key`; expired entries read as absent but stay until swept.
    pub fn get(&self, key: &str) -> Option<V> {
        let now = self.inner.clock.now_millis();
        self.inner
            .entries
            .get(key)
            .filter(|e| e.expires_at > now)
            .map(|e| e.value.clone())
    }

    pub fn set(&self, key: impl Into<String>, value: V, ttl: Option<Duration>) {
        let ttl = ttl.unwrap_or(self.inner.default_ttl);
        let expires_at = self.inner.clock.now_millis().saturating_add(duration_millis(ttl));
        self.inner.entries.insert(key.into(), CacheEntry { value, expires_at });
    }

    pub fn delete(&self, key: &str) -> bool {
        self.inner.entries.remove(key).is_some()
    }

    /// Remove keys starting with `prefix`, or everything when `None`.
    pub fn clear(&self, prefix: Option<&str>) -> usize {
        let before = self.inner.entries.len();
        match prefix {
            Some(p) => self.inner.entries.retain(|k, _| !k.starts_with(p)),
            None => self.inner.entries.clear(),
        }
        let removed = before.saturating_sub(self.inner.entries.len());
        debug!(prefix = prefix.unwrap_or("*"), removed, "cache cleared");
        removed
    }

    /// Evict expired entries now; returns how many were dropped.
    pub fn cleanup(&self) -> usize {
        self.inner.sweep()
    }

    pub fn stats(&self) -> CacheStats {
        let now = self.inner.clock.now_millis();
        let mut stats = CacheStats::default();
        for e in self.inner.entries.iter() {
            stats.total += 1;
            if e.expires_at > now {
                stats.active += 1;
            } else {
                stats.expired += 1;
            }
        }
        stats
    }

    /// Return the live value for `key`, or run `compute` and store its
    /// result. Errors are returned as-is and never cached.
    pub async fn get_or_execute<F, Fut, E>(&self, key: &str, compute: F, ttl: Option<Duration>) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(hit) = self.get(key) {
            debug!(key, "cache hit");
            return Ok(hit);
        }
        debug!(key, "cache miss");
        let value = compute().await?;
        self.set(key, value.clone(), ttl);
        Ok(value)
    }

    /// Spawn the periodic sweeper. Returns false if one is already running.
    /// Must be called inside a tokio runtime.
    pub fn start_cleanup_interval(&self, period: Duration) -> bool {
        let mut slot = self.inner.sweeper.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.as_ref().is_some_and(|h| !h.is_finished()) {
            return false;
        }
        let period = period.max(Duration::from_millis(1));
        let weak: Weak<CacheInner<V>> = Arc::downgrade(&self.inner);
        *slot = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            // first tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(inner) = weak.upgrade() else { break };
                let evicted = inner.sweep();
                if evicted > 0 {
                    debug!(evicted, "cache sweep");
                }
            }
        }));
        info!(period_ms = period.as_millis() as u64, "cache sweeper started");
        true
    }

    /// Stop the sweeper. Returns false if none was running.
    pub fn stop_cleanup_interval(&self) -> bool {
        let mut slot = self.inner.sweeper.lock().unwrap_or_else(PoisonError::into_inner);
        match slot.take() {
            Some(handle) => {
                handle.abort();
                info!("cache sweeper stopped");
                true
            }
            None => false,
        }
    }

    pub fn is_sweeping(&self) -> bool {
        let slot = self.inner.sweeper.lock().unwrap_or_else(PoisonError::into_inner);
        slot.as_ref().is_some_and(|h| !h.is_finished())
    }
}

fn duration_millis(d: Duration) -> i64 {
    i64::try_from(d.as_millis()).unwrap_or(i64::MAX)
}
