use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::reaper::{self, ReaperHandle};
use crate::value::Value;

/// Requested lifetime for an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ttl {
    /// The entry never expires.
    Never,
    /// The entry expires this long after insertion.
    After(Duration),
}

impl Ttl {
    pub const fn secs(secs: u64) -> Self {
        Ttl::After(Duration::from_secs(secs))
    }
}

/// Remaining lifetime reported by [`Store::get_ttl`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemainingTtl {
    Never,
    /// Whole seconds left, rounded down. Never zero: a remaining value that
    /// rounds down to zero is reported as absent instead.
    Seconds(u64),
}

#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Interval between background reaper runs.
    pub cleanup_interval: Duration,
    /// Maximum entries the reaper drops per run, bounding time under the
    /// write lock.
    pub max_cleanup_batch: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            cleanup_interval: Duration::from_secs(60),
            max_cleanup_batch: 1000,
        }
    }
}

#[derive(Debug, Clone)]
struct Entry {
    value: Value,
    /// `None` means the entry never expires.
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        matches!(self.expires_at, Some(at) if at <= now)
    }
}

/// Heap entry ordered by expiry time ascending. An entry is stale when the
/// stored expiry of its key no longer matches `at`; stale entries are
/// discarded on pop, never eagerly.
#[derive(Debug, PartialEq, Eq)]
struct Expiration {
    at: Instant,
    key: String,
}

impl Ord for Expiration {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.at.cmp(&other.at).then_with(|| self.key.cmp(&other.key))
    }
}

impl PartialOrd for Expiration {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// Everything the lock guards: map, heap and prefix index move together.
pub(crate) struct StoreInner {
    entries: HashMap<String, Entry>,
    expiry_heap: BinaryHeap<Reverse<Expiration>>,
    prefix_index: HashMap<String, HashSet<String>>,
}

/// Prefixes of length 1..=4 characters (not bytes; keys may be non-ASCII).
fn index_prefixes(key: &str) -> impl Iterator<Item = &str> {
    key.char_indices()
        .map(|(i, c)| i + c.len_utf8())
        .take(4)
        .map(move |end| &key[..end])
}

impl StoreInner {
    fn new() -> Self {
        Self {
            entries: HashMap::new(),
            expiry_heap: BinaryHeap::new(),
            prefix_index: HashMap::new(),
        }
    }

    fn index_insert(&mut self, key: &str) {
        for prefix in index_prefixes(key) {
            self.prefix_index
                .entry(prefix.to_string())
                .or_default()
                .insert(key.to_string());
        }
    }

    fn index_remove(&mut self, key: &str) {
        for prefix in index_prefixes(key) {
            if let Some(bucket) = self.prefix_index.get_mut(prefix) {
                bucket.remove(key);
                if bucket.is_empty() {
                    self.prefix_index.remove(prefix);
                }
            }
        }
    }

    fn remove_entry(&mut self, key: &str) -> bool {
        if self.entries.remove(key).is_some() {
            self.index_remove(key);
            true
        } else {
            false
        }
    }

    /// Pops expired heap entries up to `max_batch` and drops the matching
    /// map entries. The `stored expiry == popped expiry` staleness guard
    /// lives here and only here.
    pub(crate) fn sweep_expired(&mut self, now: Instant, max_batch: usize) -> usize {
        let mut dropped = 0;
        while dropped < max_batch {
            match self.expiry_heap.peek() {
                Some(Reverse(top)) if top.at <= now => {}
                _ => break,
            }
            let Some(Reverse(Expiration { at, key })) = self.expiry_heap.pop() else {
                break;
            };
            let current = matches!(self.entries.get(&key), Some(e) if e.expires_at == Some(at));
            if current {
                self.entries.remove(&key);
                self.index_remove(&key);
                dropped += 1;
            }
        }
        dropped
    }
}

/// Concurrent expiring key-value store.
///
/// Reads go through the read half of the lock; every mutation of the map,
/// heap or prefix index happens under the write half. Expired entries are
/// removed lazily on `get`/`exists` and in batches by the background reaper.
pub struct Store {
    inner: Arc<RwLock<StoreInner>>,
    reaper: Mutex<Option<ReaperHandle>>,
}

impl Store {
    /// Creates the store and spawns its background reaper. Must be called
    /// from within a tokio runtime.
    pub fn new(config: StoreConfig) -> Self {
        let inner = Arc::new(RwLock::new(StoreInner::new()));
        let handle = reaper::spawn(
            Arc::clone(&inner),
            config.cleanup_interval,
            config.max_cleanup_batch,
        );
        Self {
            inner,
            reaper: Mutex::new(Some(handle)),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(StoreConfig::default())
    }

    /// Inserts or overwrites an entry. An overwrite replaces both value and
    /// expiry; the key leaves the prefix index before the new value lands so
    /// the index never reflects a half-updated key.
    pub async fn put(&self, key: impl Into<String>, value: impl Into<Value>, ttl: Ttl) {
        let key = key.into();
        let value = value.into();
        let mut inner = self.inner.write().await;
        if inner.entries.contains_key(&key) {
            inner.index_remove(&key);
        }
        let expires_at = match ttl {
            Ttl::Never => None,
            Ttl::After(after) => {
                let at = Instant::now() + after;
                inner.expiry_heap.push(Reverse(Expiration {
                    at,
                    key: key.clone(),
                }));
                Some(at)
            }
        };
        inner.entries.insert(
            key.clone(),
            Entry { value, expires_at },
        );
        inner.index_insert(&key);
    }

    /// Returns the live value for `key`, or `None`. A value found expired is
    /// removed before returning; a stale value is never returned.
    pub async fn get(&self, key: &str) -> Option<Value> {
        {
            let inner = self.inner.read().await;
            match inner.entries.get(key) {
                None => return None,
                Some(entry) if !entry.is_expired(Instant::now()) => {
                    return Some(entry.value.clone());
                }
                // Found but expired: removal needs the write lock.
                Some(_) => {}
            }
        }
        // Re-check under the write lock: a concurrent put or delete may have
        // replaced the entry between the two lock phases.
        let mut inner = self.inner.write().await;
        let now = Instant::now();
        let expired = matches!(inner.entries.get(key), Some(e) if e.is_expired(now));
        if expired {
            inner.remove_entry(key);
            return None;
        }
        inner.entries.get(key).map(|e| e.value.clone())
    }

    /// Removes the entry for `key`. No-op if absent.
    pub async fn delete(&self, key: &str) -> bool {
        let mut inner = self.inner.write().await;
        inner.remove_entry(key)
    }

    /// Liveness check with the same expired-entry cleanup as [`Store::get`],
    /// without copying the value out.
    pub async fn exists(&self, key: &str) -> bool {
        {
            let inner = self.inner.read().await;
            match inner.entries.get(key) {
                None => return false,
                Some(entry) if !entry.is_expired(Instant::now()) => return true,
                Some(_) => {}
            }
        }
        let mut inner = self.inner.write().await;
        let now = Instant::now();
        let expired = matches!(inner.entries.get(key), Some(e) if e.is_expired(now));
        if expired {
            inner.remove_entry(key);
            return false;
        }
        inner.entries.contains_key(key)
    }

    /// Snapshot of all live keys. Pure read: skipped expired entries are left
    /// for the lazy paths and the reaper.
    pub async fn keys(&self) -> Vec<String> {
        let inner = self.inner.read().await;
        let now = Instant::now();
        inner
            .entries
            .iter()
            .filter(|(_, e)| !e.is_expired(now))
            .map(|(k, _)| k.clone())
            .collect()
    }

    /// Snapshot of all live values. Pure read.
    pub async fn values(&self) -> Vec<Value> {
        let inner = self.inner.read().await;
        let now = Instant::now();
        inner
            .entries
            .values()
            .filter(|e| !e.is_expired(now))
            .map(|e| e.value.clone())
            .collect()
    }

    pub async fn count_all(&self) -> usize {
        let inner = self.inner.read().await;
        let now = Instant::now();
        inner.entries.values().filter(|e| !e.is_expired(now)).count()
    }

    /// Count of live keys starting with `prefix`. Served from the prefix
    /// index when a bucket exists (prefixes of 1..=4 chars); falls back to a
    /// full scan when the bucket was pruned or the prefix is out of range.
    pub async fn count_with_prefix(&self, prefix: &str) -> usize {
        let inner = self.inner.read().await;
        let now = Instant::now();
        match inner.prefix_index.get(prefix) {
            Some(bucket) => bucket
                .iter()
                .filter(|k| matches!(inner.entries.get(*k), Some(e) if !e.is_expired(now)))
                .count(),
            None => inner
                .entries
                .iter()
                .filter(|(k, e)| k.starts_with(prefix) && !e.is_expired(now))
                .count(),
        }
    }

    /// Live keys starting with `prefix`; same index-or-scan policy as
    /// [`Store::count_with_prefix`].
    pub async fn keys_with_prefix(&self, prefix: &str) -> Vec<String> {
        let inner = self.inner.read().await;
        let now = Instant::now();
        match inner.prefix_index.get(prefix) {
            Some(bucket) => bucket
                .iter()
                .filter(|k| matches!(inner.entries.get(*k), Some(e) if !e.is_expired(now)))
                .cloned()
                .collect(),
            None => inner
                .entries
                .iter()
                .filter(|(k, e)| k.starts_with(prefix) && !e.is_expired(now))
                .map(|(k, _)| k.clone())
                .collect(),
        }
    }

    /// True iff the key is live and its value is `Value::Bool(true)`.
    pub async fn value_is_true(&self, key: &str) -> bool {
        let inner = self.inner.read().await;
        let now = Instant::now();
        matches!(inner.entries.get(key), Some(e) if !e.is_expired(now) && e.value.is_true())
    }

    /// Remaining lifetime of `key`. `None` for absent or already-expired
    /// entries, including entries whose remaining time rounds down to zero.
    pub async fn get_ttl(&self, key: &str) -> Option<RemainingTtl> {
        let inner = self.inner.read().await;
        let entry = inner.entries.get(key)?;
        match entry.expires_at {
            None => Some(RemainingTtl::Never),
            Some(at) => {
                let now = Instant::now();
                if at <= now {
                    return None;
                }
                match (at - now).as_secs() {
                    0 => None,
                    secs => Some(RemainingTtl::Seconds(secs)),
                }
            }
        }
    }

    /// Pushes the expiry of a live finite-TTL key forward by `additional`.
    /// Returns false for absent keys and for already-expired keys (removing
    /// the latter). Never-expiring keys succeed without touching the heap.
    pub async fn extend_ttl(&self, key: &str, additional: Duration) -> bool {
        let mut inner = self.inner.write().await;
        let now = Instant::now();
        let current = match inner.entries.get(key) {
            None => return false,
            Some(entry) => entry.expires_at,
        };
        match current {
            Some(at) if at <= now => {
                inner.remove_entry(key);
                false
            }
            None => true,
            Some(at) => {
                let new_at = at + additional;
                inner.expiry_heap.push(Reverse(Expiration {
                    at: new_at,
                    key: key.to_string(),
                }));
                if let Some(entry) = inner.entries.get_mut(key) {
                    entry.expires_at = Some(new_at);
                }
                true
            }
        }
    }

    /// Drops all entries, heap entries and the whole prefix index atomically.
    pub async fn clear(&self) {
        let mut inner = self.inner.write().await;
        inner.entries.clear();
        inner.expiry_heap.clear();
        inner.prefix_index.clear();
    }

    /// Cancels the reaper and waits for it to finish. Idempotent.
    pub async fn close(&self) {
        let handle = self.reaper.lock().take();
        if let Some(handle) = handle {
            handle.shutdown().await;
        }
    }
}

impl Drop for Store {
    fn drop(&mut self) {
        // Signal the reaper even when close() was never awaited.
        if let Some(handle) = self.reaper.lock().take() {
            handle.cancel();
        }
    }
}
