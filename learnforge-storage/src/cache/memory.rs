//! In-process TTL cache with an owned background sweeper.

use super::traits::{CacheBackend, CacheStats};
use async_trait::async_trait;
use learnforge_core::{CacheError, LearnforgeResult};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock, Weak};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, Instant, MissedTickBehavior};

/// Default interval between sweeps.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
struct CacheEntry {
    value: String,
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}

/// State shared with the sweeper. The sweeper only ever holds a `Weak`.
#[derive(Debug, Default)]
struct Shared {
    entries: RwLock<HashMap<String, CacheEntry>>,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl Shared {
    fn sweep(&self, now: Instant) -> Result<usize, CacheError> {
        let mut entries = self.entries.write().map_err(|_| CacheError::LockPoisoned)?;
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        let removed = before - entries.len();
        self.evictions.fetch_add(removed as u64, Ordering::Relaxed);
        Ok(removed)
    }

    /// Look up a live entry, lazily deleting it if it has expired.
    fn lookup(&self, key: &str, now: Instant) -> Result<Option<String>, CacheError> {
        {
            let entries = self.entries.read().map_err(|_| CacheError::LockPoisoned)?;
            match entries.get(key) {
                None => return Ok(None),
                Some(entry) if !entry.is_expired(now) => return Ok(Some(entry.value.clone())),
                Some(_) => {}
            }
        }

        // Expired under the read lock; re-check under the write lock since a
        // writer may have replaced it in between.
        let mut entries = self.entries.write().map_err(|_| CacheError::LockPoisoned)?;
        match entries.get(key) {
            Some(entry) if entry.is_expired(now) => {
                entries.remove(key);
                self.evictions.fetch_add(1, Ordering::Relaxed);
                Ok(None)
            }
            Some(entry) => Ok(Some(entry.value.clone())),
            None => Ok(None),
        }
    }
}

/// TTL cache held in process memory.
///
/// Expired entries are dropped lazily on access and eagerly by a sweeper
/// task owned by the cache. The sweeper stops on [`CacheBackend::close`] or
/// when the cache is dropped.
pub struct InMemoryCache {
    shared: Arc<Shared>,
    shutdown_tx: watch::Sender<bool>,
    sweeper: Mutex<Option<JoinHandle<()>>>,
    closed: AtomicBool,
}

impl InMemoryCache {
    /// Create a cache and start its sweeper on the current tokio runtime.
    ///
    /// Outside a runtime the cache still works, relying on lazy expiry only.
    pub fn new(sweep_interval: Duration) -> Self {
        let shared = Arc::new(Shared::default());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let sweeper = match tokio::runtime::Handle::try_current() {
            Ok(handle) => Some(handle.spawn(sweep_task(
                Arc::downgrade(&shared),
                sweep_interval,
                shutdown_rx,
            ))),
            Err(_) => {
                tracing::warn!("No tokio runtime; cache sweeper not started");
                None
            }
        };

        Self {
            shared,
            shutdown_tx,
            sweeper: Mutex::new(sweeper),
            closed: AtomicBool::new(false),
        }
    }

    /// Remove every expired entry now. Returns the number removed.
    pub fn sweep_expired(&self) -> LearnforgeResult<usize> {
        Ok(self.shared.sweep(Instant::now())?)
    }

    /// Whether the background sweeper is still running.
    pub fn sweeper_running(&self) -> bool {
        self.sweeper
            .lock()
            .map(|guard| guard.as_ref().is_some_and(|handle| !handle.is_finished()))
            .unwrap_or(false)
    }

    fn ensure_open(&self) -> Result<(), CacheError> {
        if self.closed.load(Ordering::Acquire) {
            Err(CacheError::Closed)
        } else {
            Ok(())
        }
    }

    /// A TTL too large to represent as an instant never expires.
    fn expiry(ttl: Option<Duration>) -> Option<Instant> {
        ttl.filter(|ttl| !ttl.is_zero())
            .and_then(|ttl| Instant::now().checked_add(ttl))
    }
}

impl Default for InMemoryCache {
    fn default() -> Self {
        Self::new(DEFAULT_SWEEP_INTERVAL)
    }
}

impl std::fmt::Debug for InMemoryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryCache")
            .field("closed", &self.closed.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl CacheBackend for InMemoryCache {
    async fn get(&self, key: &str) -> LearnforgeResult<String> {
        self.ensure_open()?;
        match self.shared.lookup(key, Instant::now())? {
            Some(value) => {
                self.shared.hits.fetch_add(1, Ordering::Relaxed);
                Ok(value)
            }
            None => {
                self.shared.misses.fetch_add(1, Ordering::Relaxed);
                Err(CacheError::NotFound {
                    key: key.to_string(),
                }
                .into())
            }
        }
    }

    async fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> LearnforgeResult<()> {
        self.ensure_open()?;
        let entry = CacheEntry {
            value,
            expires_at: Self::expiry(ttl),
        };
        let mut entries = self
            .shared
            .entries
            .write()
            .map_err(|_| CacheError::LockPoisoned)?;
        entries.insert(key.to_string(), entry);
        Ok(())
    }

    async fn delete(&self, key: &str) -> LearnforgeResult<()> {
        self.ensure_open()?;
        let mut entries = self
            .shared
            .entries
            .write()
            .map_err(|_| CacheError::LockPoisoned)?;
        entries.remove(key);
        Ok(())
    }

    async fn exists(&self, key: &str) -> LearnforgeResult<bool> {
        self.ensure_open()?;
        Ok(self.shared.lookup(key, Instant::now())?.is_some())
    }

    async fn stats(&self) -> LearnforgeResult<CacheStats> {
        let entry_count = self
            .shared
            .entries
            .read()
            .map_err(|_| CacheError::LockPoisoned)?
            .len() as u64;
        Ok(CacheStats {
            hits: self.shared.hits.load(Ordering::Relaxed),
            misses: self.shared.misses.load(Ordering::Relaxed),
            entry_count,
            evictions: self.shared.evictions.load(Ordering::Relaxed),
        })
    }

    async fn close(&self) -> LearnforgeResult<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        let _ = self.shutdown_tx.send(true);

        let handle = self
            .sweeper
            .lock()
            .map_err(|_| CacheError::LockPoisoned)?
            .take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                tracing::warn!(error = %e, "Cache sweeper ended abnormally");
            }
        }
        Ok(())
    }
}

// ============================================================================
// SWEEPER
// ============================================================================

/// Periodically remove expired entries until shutdown or until the cache
/// itself is gone.
async fn sweep_task(
    shared: Weak<Shared>,
    sweep_interval: Duration,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let mut ticker = interval(sweep_interval.max(Duration::from_millis(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    // First tick completes immediately.
    ticker.tick().await;

    tracing::debug!(
        sweep_interval_ms = sweep_interval.as_millis() as u64,
        "Cache sweeper started"
    );

    loop {
        tokio::select! {
            changed = shutdown_rx.changed() => {
                // Err means the sender (the cache) was dropped.
                if changed.is_err() || *shutdown_rx.borrow() {
                    break;
                }
            }

            _ = ticker.tick() => {
                let Some(shared) = shared.upgrade() else {
                    break;
                };
                match shared.sweep(Instant::now()) {
                    Ok(0) => tracing::trace!("Cache sweep removed nothing"),
                    Ok(removed) => tracing::debug!(removed, "Cache sweep removed expired entries"),
                    Err(e) => tracing::warn!(error = %e, "Cache sweep failed"),
                }
            }
        }
    }

    tracing::debug!("Cache sweeper stopped");
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use learnforge_core::{ErrorKind, LearnforgeError};

    fn is_cache_not_found(err: &LearnforgeError) -> bool {
        matches!(err, LearnforgeError::Cache(CacheError::NotFound { .. }))
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_expires_after_ttl() {
        let cache = InMemoryCache::new(DEFAULT_SWEEP_INTERVAL);
        cache
            .set("k", "v".to_string(), Some(Duration::from_millis(100)))
            .await
            .unwrap();
        assert_eq!(cache.get("k").await.unwrap(), "v");

        tokio::time::advance(Duration::from_millis(150)).await;

        let err = cache.get("k").await.unwrap_err();
        assert!(is_cache_not_found(&err));
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(!cache.exists("k").await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_unrepresentable_ttl_never_expires() {
        let cache = InMemoryCache::new(DEFAULT_SWEEP_INTERVAL);
        cache
            .set("k", "v".to_string(), Some(Duration::MAX))
            .await
            .unwrap();

        tokio::time::advance(Duration::from_secs(365 * 24 * 3600)).await;

        assert_eq!(cache.get("k").await.unwrap(), "v");
        assert_eq!(cache.sweep_expired().unwrap(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_or_absent_ttl_never_expires() {
        let cache = InMemoryCache::new(DEFAULT_SWEEP_INTERVAL);
        cache.set("none", "a".to_string(), None).await.unwrap();
        cache.set("zero", "b".to_string(), Some(Duration::ZERO)).await.unwrap();

        tokio::time::advance(Duration::from_secs(365 * 24 * 3600)).await;

        assert_eq!(cache.get("none").await.unwrap(), "a");
        assert_eq!(cache.get("zero").await.unwrap(), "b");
    }

    #[tokio::test(start_paused = true)]
    async fn test_lazy_expiry_removes_entry() {
        let cache = InMemoryCache::new(DEFAULT_SWEEP_INTERVAL);
        cache
            .set("k", "v".to_string(), Some(Duration::from_millis(10)))
            .await
            .unwrap();
        tokio::time::advance(Duration::from_millis(20)).await;

        assert!(!cache.exists("k").await.unwrap());
        let stats = cache.stats().await.unwrap();
        assert_eq!(stats.entry_count, 0);
        assert_eq!(stats.evictions, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_overwrite_resets_expiry() {
        let cache = InMemoryCache::new(DEFAULT_SWEEP_INTERVAL);
        cache
            .set("k", "old".to_string(), Some(Duration::from_millis(50)))
            .await
            .unwrap();
        cache.set("k", "new".to_string(), None).await.unwrap();
        tokio::time::advance(Duration::from_millis(100)).await;
        assert_eq!(cache.get("k").await.unwrap(), "new");
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_expired_counts_removed() {
        let cache = InMemoryCache::new(DEFAULT_SWEEP_INTERVAL);
        for i in 0..5 {
            cache
                .set(&format!("short-{}", i), "v".to_string(), Some(Duration::from_secs(1)))
                .await
                .unwrap();
        }
        cache.set("forever", "v".to_string(), None).await.unwrap();

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(cache.sweep_expired().unwrap(), 5);
        assert_eq!(cache.sweep_expired().unwrap(), 0);
        assert_eq!(cache.stats().await.unwrap().entry_count, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_background_sweeper_reclaims_unread_entries() {
        let cache = InMemoryCache::new(Duration::from_secs(60));
        cache
            .set("write-only", "v".to_string(), Some(Duration::from_secs(5)))
            .await
            .unwrap();

        // Past expiry and one full sweep interval, without touching the key.
        tokio::time::sleep(Duration::from_secs(61)).await;
        tokio::task::yield_now().await;

        let stats = cache.stats().await.unwrap();
        assert_eq!(stats.entry_count, 0);
        assert_eq!(stats.evictions, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_stops_sweeper_and_rejects_operations() {
        let cache = InMemoryCache::new(Duration::from_secs(1));
        assert!(cache.sweeper_running());

        cache.close().await.unwrap();
        assert!(!cache.sweeper_running());
        // Idempotent.
        cache.close().await.unwrap();

        let err = cache.get("k").await.unwrap_err();
        assert!(matches!(err, LearnforgeError::Cache(CacheError::Closed)));
        assert!(cache.set("k", "v".to_string(), None).await.is_err());
    }

    #[tokio::test]
    async fn test_sweeper_stops_when_cache_dropped() {
        let cache = InMemoryCache::new(Duration::from_millis(5));
        let handle = cache
            .sweeper
            .lock()
            .unwrap()
            .take()
            .expect("sweeper spawned");
        drop(cache);

        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("sweeper exits after drop")
            .expect("sweeper did not panic");
    }

    #[tokio::test]
    async fn test_hits_and_misses_are_counted() {
        let cache = InMemoryCache::new(DEFAULT_SWEEP_INTERVAL);
        cache.set("k", "v".to_string(), None).await.unwrap();
        let _ = cache.get("k").await;
        let _ = cache.get("k").await;
        let _ = cache.get("missing").await;

        let stats = cache.stats().await.unwrap();
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 1);
        cache.delete("k").await.unwrap();
        assert!(!cache.exists("k").await.unwrap());
    }

    #[test]
    fn test_new_outside_runtime_uses_lazy_expiry_only() {
        let cache = InMemoryCache::new(DEFAULT_SWEEP_INTERVAL);
        assert!(!cache.sweeper_running());
        assert_eq!(cache.sweep_expired().unwrap(), 0);
    }
}
