//! In-memory response cache with per-entry expiry.
//!
//! Expired entries are dropped lazily on read and in bulk by a periodic sweep
//! task, so memory stays bounded even when nothing reads the cache.

use parking_lot::Mutex;
use std::{any::Any, collections::HashMap, sync::Arc, time::Duration};
use tokio::{
    task::JoinHandle,
    time::{Instant, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;

/// How often [`CacheHandle::spawn_sweeper`] evicts expired entries by default.
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(10 * 60);

/// Shorter sweep periods passed to [`CacheHandle::spawn_sweeper`] are raised to this.
pub const MIN_SWEEP_INTERVAL: Duration = Duration::from_secs(1);

type Payload = Arc<dyn Any + Send + Sync>;

struct CacheEntry {
    data: Payload,
    stored_at: Instant,
    ttl: Duration,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.stored_at) > self.ttl
    }
}

/// Key/value store where every entry carries its own time-to-live.
///
/// Values of any `'static` type can be stored; reading a key back as a
/// different type than it was stored with behaves like a miss.
#[derive(Default)]
pub struct TtlCache {
    entries: HashMap<String, CacheEntry>,
}

impl TtlCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value` under `key`, replacing any previous entry.
    pub fn set<T: Send + Sync + 'static>(
        &mut self,
        key: impl Into<String>,
        value: T,
        ttl: Duration,
    ) {
        self.set_shared(key, Arc::new(value), ttl);
    }

    /// Like [`TtlCache::set`] for a value the caller keeps sharing.
    pub fn set_shared<T: Send + Sync + 'static>(
        &mut self,
        key: impl Into<String>,
        value: Arc<T>,
        ttl: Duration,
    ) {
        debug_assert!(!ttl.is_zero(), "cache ttl must be positive");
        let entry = CacheEntry {
            data: value,
            stored_at: Instant::now(),
            ttl,
        };
        self.entries.insert(key.into(), entry);
    }

    /// Return the live value for `key`; an expired entry is removed and reported as absent.
    pub fn get<T: Send + Sync + 'static>(&mut self, key: &str) -> Option<Arc<T>> {
        let now = Instant::now();
        let expired = self.entries.get(key)?.is_expired(now);
        if expired {
            self.entries.remove(key);
            return None;
        }
        self.entries.get(key).and_then(|entry| Arc::clone(&entry.data).downcast::<T>().ok())
    }

    pub fn has(&mut self, key: &str) -> bool {
        let now = Instant::now();
        match self.entries.get(key) {
            Some(entry) if entry.is_expired(now) => {
                self.entries.remove(key);
                false
            }
            Some(_) => true,
            None => false,
        }
    }

    pub fn delete(&mut self, key: &str) {
        self.entries.remove(key);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Remove every expired entry, returning how many were evicted.
    pub fn sweep(&mut self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now));
        before - self.entries.len()
    }

    /// Number of physically stored entries, expired or not.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Cloneable, shareable handle to one [`TtlCache`].
#[derive(Clone, Default)]
pub struct CacheHandle {
    inner: Arc<Mutex<TtlCache>>,
}

impl std::fmt::Debug for CacheHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheHandle").field("entries", &self.len()).finish()
    }
}

impl CacheHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set<T: Send + Sync + 'static>(&self, key: impl Into<String>, value: T, ttl: Duration) {
        self.inner.lock().set(key, value, ttl);
    }

    pub fn set_shared<T: Send + Sync + 'static>(
        &self,
        key: impl Into<String>,
        value: Arc<T>,
        ttl: Duration,
    ) {
        self.inner.lock().set_shared(key, value, ttl);
    }

    pub fn get<T: Send + Sync + 'static>(&self, key: &str) -> Option<Arc<T>> {
        self.inner.lock().get(key)
    }

    pub fn has(&self, key: &str) -> bool {
        self.inner.lock().has(key)
    }

    pub fn delete(&self, key: &str) {
        self.inner.lock().delete(key);
    }

    pub fn clear(&self) {
        self.inner.lock().clear();
    }

    pub fn sweep(&self) -> usize {
        self.inner.lock().sweep()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Start a background task that sweeps the cache every `every`.
    ///
    /// Must be called from within a tokio runtime. The task stops when the
    /// returned [`Sweeper`] is shut down or dropped. Periods below
    /// [`MIN_SWEEP_INTERVAL`], including zero, are raised to it.
    pub fn spawn_sweeper(&self, every: Duration) -> Sweeper {
        let every = every.max(MIN_SWEEP_INTERVAL);
        let token = CancellationToken::new();
        let cache = self.clone();
        let cancelled = token.clone();

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + every, every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = cancelled.cancelled() => break,
                    _ = ticker.tick() => {
                        let evicted = cache.sweep();
                        if evicted > 0 {
                            tracing::debug!(evicted, remaining = cache.len(), "cache sweep");
                        }
                    }
                }
            }
        });

        Sweeper {
            token,
            task: Some(task),
        }
    }
}

/// Guard for the periodic sweep task started by [`CacheHandle::spawn_sweeper`].
#[derive(Debug)]
pub struct Sweeper {
    token: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl Sweeper {
    /// Stop the sweep task and wait for it to finish.
    pub async fn shutdown(mut self) {
        self.token.cancel();
        if let Some(task) = self.task.take() {
            if let Err(err) = task.await {
                tracing::warn!(error = %err, "cache sweeper task ended abnormally");
            }
        }
    }
}

impl Drop for Sweeper {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
