//! Content cache store
//!
//! [`CacheStore`] is the seam between the cache and whatever keeps the
//! bytes. [`MemoryCacheStore`] is the bundled implementation: an LRU index
//! with byte and entry-count ceilings.

use async_trait::async_trait;
use bridge_traits::time::{Clock, SystemClock};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use lru::LruCache;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::debug;

use super::config::{CacheConfig, CachePriority};
use super::stats::CacheMetrics;
use crate::error::{ContentError, Result};

/// A cached payload and its bookkeeping.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub content_id: String,
    /// Shared view of the stored bytes
    pub handle: Bytes,
    pub mime_type: String,
    pub size_bytes: u64,
    pub last_accessed_at: DateTime<Utc>,
    pub priority: CachePriority,
}

/// An entry dropped to bring the store back under its ceilings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evicted {
    pub content_id: String,
    pub size_bytes: u64,
}

/// Keyed storage for fetched content.
///
/// A miss is `Ok(None)`, never an error. Every `get` counts towards the
/// metrics; `peek` does not.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Store `bytes` at normal priority. Returns the entries evicted to make
    /// room.
    async fn put(&self, content_id: &str, bytes: Bytes, mime_type: &str) -> Result<Vec<Evicted>> {
        self.put_with_priority(content_id, bytes, mime_type, CachePriority::Normal)
            .await
    }

    /// Store `bytes`, replacing any existing entry for `content_id`.
    ///
    /// Replacing keeps the higher of the old and new priority.
    async fn put_with_priority(
        &self,
        content_id: &str,
        bytes: Bytes,
        mime_type: &str,
        priority: CachePriority,
    ) -> Result<Vec<Evicted>>;

    /// Raise an entry's priority to at least `priority` in place, leaving
    /// its bytes and recency alone. Returns `false` if there is no entry.
    async fn promote(&self, content_id: &str, priority: CachePriority) -> Result<bool>;

    /// Look up an entry, refreshing its recency on a hit.
    async fn get(&self, content_id: &str) -> Result<Option<CacheEntry>>;

    /// Look up an entry without touching recency or metrics.
    async fn peek(&self, content_id: &str) -> Result<Option<CacheEntry>>;

    async fn contains(&self, content_id: &str) -> Result<bool> {
        Ok(self.peek(content_id).await?.is_some())
    }

    /// Remove an entry, returning it if it was present.
    async fn remove(&self, content_id: &str) -> Result<Option<CacheEntry>>;

    /// Snapshot of hit/miss counters and occupancy.
    async fn metrics(&self) -> Result<CacheMetrics>;

    async fn len(&self) -> Result<usize>;

    async fn total_bytes(&self) -> Result<u64>;

    /// Remove every entry. Counters are kept.
    async fn clear(&self) -> Result<usize>;
}

struct Inner {
    entries: LruCache<String, CacheEntry>,
    total_bytes: u64,
    hit_count: u64,
    miss_count: u64,
    eviction_count: u64,
}

impl Inner {
    /// Least recently used entry of the given priority, never `protect`.
    fn lru_victim(&self, priority: CachePriority, protect: &str) -> Option<String> {
        self.entries
            .iter()
            .rev()
            .find(|(key, entry)| entry.priority == priority && key.as_str() != protect)
            .map(|(key, _)| key.clone())
    }
}

/// In-memory [`CacheStore`].
pub struct MemoryCacheStore {
    inner: Mutex<Inner>,
    max_bytes: u64,
    max_entries: usize,
    clock: Arc<dyn Clock>,
}

impl MemoryCacheStore {
    pub fn new(config: &CacheConfig) -> Result<Self> {
        config.validate().map_err(ContentError::InvalidConfig)?;

        Ok(Self {
            inner: Mutex::new(Inner {
                entries: LruCache::unbounded(),
                total_bytes: 0,
                hit_count: 0,
                miss_count: 0,
                eviction_count: 0,
            }),
            max_bytes: config.max_cache_size_bytes,
            max_entries: config.max_entries,
            clock: Arc::new(SystemClock),
        })
    }

    /// Use `clock` for access timestamps.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    fn evict_over_limits(&self, inner: &mut Inner, protect: &str) -> Vec<Evicted> {
        let mut evicted = Vec::new();

        while inner.total_bytes > self.max_bytes || inner.entries.len() > self.max_entries {
            let victim = inner
                .lru_victim(CachePriority::Normal, protect)
                .or_else(|| inner.lru_victim(CachePriority::High, protect));

            let Some(key) = victim else {
                break;
            };

            if let Some(entry) = inner.entries.pop(&key) {
                inner.total_bytes = inner.total_bytes.saturating_sub(entry.size_bytes);
                inner.eviction_count += 1;
                debug!(content_id = %key, size_bytes = entry.size_bytes, "Evicted cache entry");
                evicted.push(Evicted {
                    content_id: key,
                    size_bytes: entry.size_bytes,
                });
            }
        }

        evicted
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn put_with_priority(
        &self,
        content_id: &str,
        bytes: Bytes,
        mime_type: &str,
        priority: CachePriority,
    ) -> Result<Vec<Evicted>> {
        let size_bytes = bytes.len() as u64;
        if size_bytes > self.max_bytes {
            return Err(ContentError::EntryTooLarge {
                content_id: content_id.to_string(),
                size_bytes,
                limit_bytes: self.max_bytes,
            });
        }

        let mut inner = self.inner.lock();
        let mut entry = CacheEntry {
            content_id: content_id.to_string(),
            handle: bytes,
            mime_type: mime_type.to_string(),
            size_bytes,
            last_accessed_at: self.clock.now(),
            priority,
        };

        if let Some(previous) = inner.entries.pop(content_id) {
            inner.total_bytes = inner.total_bytes.saturating_sub(previous.size_bytes);
            entry.priority = entry.priority.max(previous.priority);
        }

        inner.entries.put(content_id.to_string(), entry);
        inner.total_bytes += size_bytes;

        Ok(self.evict_over_limits(&mut inner, content_id))
    }

    async fn get(&self, content_id: &str) -> Result<Option<CacheEntry>> {
        let now = self.clock.now();
        let mut inner = self.inner.lock();

        let found = inner.entries.get_mut(content_id).map(|entry| {
            entry.last_accessed_at = now;
            entry.clone()
        });

        match found {
            Some(entry) => {
                inner.hit_count += 1;
                Ok(Some(entry))
            }
            None => {
                inner.miss_count += 1;
                Ok(None)
            }
        }
    }

    async fn promote(&self, content_id: &str, priority: CachePriority) -> Result<bool> {
        let mut inner = self.inner.lock();
        Ok(match inner.entries.peek_mut(content_id) {
            Some(entry) => {
                entry.priority = entry.priority.max(priority);
                true
            }
            None => false,
        })
    }

    async fn peek(&self, content_id: &str) -> Result<Option<CacheEntry>> {
        Ok(self.inner.lock().entries.peek(content_id).cloned())
    }

    async fn remove(&self, content_id: &str) -> Result<Option<CacheEntry>> {
        let mut inner = self.inner.lock();
        let removed = inner.entries.pop(content_id);
        if let Some(entry) = &removed {
            inner.total_bytes = inner.total_bytes.saturating_sub(entry.size_bytes);
        }
        Ok(removed)
    }

    async fn metrics(&self) -> Result<CacheMetrics> {
        let inner = self.inner.lock();
        Ok(CacheMetrics {
            hit_count: inner.hit_count,
            miss_count: inner.miss_count,
            total_requests: inner.hit_count + inner.miss_count,
            entry_count: inner.entries.len(),
            total_bytes: inner.total_bytes,
            eviction_count: inner.eviction_count,
        })
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.inner.lock().entries.len())
    }

    async fn total_bytes(&self) -> Result<u64> {
        Ok(self.inner.lock().total_bytes)
    }

    async fn clear(&self) -> Result<usize> {
        let mut inner = self.inner.lock();
        let cleared = inner.entries.len();
        inner.entries.clear();
        inner.total_bytes = 0;
        Ok(cleared)
    }
}
