//! # Cache Orchestrator
//!
//! Decides what to fetch ahead of need and fills the [`CacheStore`].
//!
//! Batches are best effort: a failed item is logged, reported in the
//! [`WarmReport`] and skipped, never surfaced as an error. Calls overlap
//! safely; items already in the store only get a presence check.

use bridge_traits::content::{ContentService, FetchedContent, SongRef};
use core_runtime::config::CoreConfig;
use core_runtime::events::{CacheEvent, CoreEvent, EventBus};
use futures::future::join_all;
use parking_lot::RwLock;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};
use tracing::{debug, info, instrument, warn};

use super::config::{CacheConfig, CachePriority};
use super::stats::{CacheMetrics, WarmReport};
use super::store::{CacheStore, MemoryCacheStore};
use crate::error::{ContentError, Result};
use crate::session::ContentCacheSession;

enum Outcome {
    Fetched,
    AlreadyCached,
    Skipped,
    Failed,
}

/// Populates the content cache from the content service.
pub struct CacheOrchestrator {
    store: Arc<dyn CacheStore>,
    content_service: Arc<dyn ContentService>,
    config: CacheConfig,
    upcoming: RwLock<Vec<SongRef>>,
    /// Shared by overlapping batches
    fetch_semaphore: Arc<Semaphore>,
    event_bus: Option<EventBus>,
}

impl CacheOrchestrator {
    pub fn new(
        store: Arc<dyn CacheStore>,
        content_service: Arc<dyn ContentService>,
        config: CacheConfig,
    ) -> Result<Self> {
        config.validate().map_err(ContentError::InvalidConfig)?;
        let fetch_semaphore = Arc::new(Semaphore::new(config.max_concurrent_fetches));

        Ok(Self {
            store,
            content_service,
            config,
            upcoming: RwLock::new(Vec::new()),
            fetch_semaphore,
            event_bus: None,
        })
    }

    /// Build an orchestrator over a fresh [`MemoryCacheStore`] from the
    /// shared runtime configuration.
    pub fn from_core_config(config: &CoreConfig) -> Result<Self> {
        let cache_config = CacheConfig::from(config);
        let store = MemoryCacheStore::new(&cache_config)?.with_clock(config.clock.clone());
        let mut orchestrator = Self::new(
            Arc::new(store),
            config.content_service.clone(),
            cache_config,
        )?;
        orchestrator.event_bus = config.event_bus.clone();
        Ok(orchestrator)
    }

    pub fn with_event_bus(mut self, event_bus: EventBus) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    pub fn store(&self) -> Arc<dyn CacheStore> {
        Arc::clone(&self.store)
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Replace the set of items expected to be needed soon.
    pub fn set_upcoming(&self, songs: Vec<SongRef>) {
        *self.upcoming.write() = songs;
    }

    pub fn upcoming(&self) -> Vec<SongRef> {
        self.upcoming.read().clone()
    }

    /// Fetch the upcoming items at `priority`.
    #[instrument(skip(self))]
    pub async fn warm(&self, priority: CachePriority) -> WarmReport {
        let songs = self.upcoming();
        self.populate(&songs, priority).await
    }

    /// Make a setlist's songs the upcoming set and warm them.
    ///
    /// # Errors
    /// Only if the setlist itself cannot be listed; item failures are
    /// reported in the [`WarmReport`].
    #[instrument(skip(self))]
    pub async fn warm_setlist(&self, setlist_id: &str, priority: CachePriority) -> Result<WarmReport> {
        let songs = self.content_service.list_songs(setlist_id).await?;
        self.set_upcoming(songs);
        Ok(self.warm(priority).await)
    }

    /// Run [`warm`](Self::warm) on the tokio runtime without waiting for it.
    pub fn spawn_warm(self: &Arc<Self>, priority: CachePriority) -> JoinHandle<WarmReport> {
        let this = Arc::clone(self);
        tokio::spawn(async move { this.warm(priority).await })
    }

    /// Open a resolution session over this cache for a view showing
    /// `songs`.
    ///
    /// `songs` become the upcoming set. With `background_warm` enabled they
    /// are also warmed at high priority on the tokio runtime; the session
    /// picks the new entries up on its next [`refresh`](ContentCacheSession::refresh).
    pub fn open_session(self: &Arc<Self>, songs: Vec<SongRef>) -> ContentCacheSession {
        let session = ContentCacheSession::new(self.store());
        self.set_upcoming(songs);

        if self.config.background_warm {
            debug!(session = session.id(), "Warming upcoming songs for new session");
            // Detached; the outcome is logged and published as `WarmCompleted`.
            drop(self.spawn_warm(CachePriority::High));
        }

        session
    }

    /// Best-effort population of `items` at normal priority.
    #[instrument(skip(self, items), fields(count = items.len()))]
    pub async fn cache_all(&self, items: &[SongRef]) -> WarmReport {
        self.populate(items, CachePriority::Normal).await
    }

    pub async fn cache_metrics(&self) -> Result<CacheMetrics> {
        self.store.metrics().await
    }

    /// Drop the cached payload of a deleted content item.
    #[instrument(skip(self))]
    pub async fn evict(&self, content_id: &str) -> Result<bool> {
        let removed = self.store.remove(content_id).await?;

        if let Some(entry) = &removed {
            self.emit(CacheEvent::EntryEvicted {
                content_id: entry.content_id.clone(),
                size_bytes: entry.size_bytes,
            });
        }

        Ok(removed.is_some())
    }

    async fn populate(&self, items: &[SongRef], priority: CachePriority) -> WarmReport {
        let mut seen = HashSet::new();
        let unique: Vec<&SongRef> = items.iter().filter(|s| seen.insert(s.id.as_str())).collect();

        let mut report = WarmReport {
            requested: unique.len(),
            ..Default::default()
        };

        let outcomes = join_all(
            unique
                .into_iter()
                .map(|song| self.populate_one(song, priority)),
        )
        .await;

        for outcome in outcomes {
            match outcome {
                Outcome::Fetched => report.fetched += 1,
                Outcome::AlreadyCached => report.already_cached += 1,
                Outcome::Skipped => report.skipped += 1,
                Outcome::Failed => report.failed += 1,
            }
        }

        info!(
            requested = report.requested,
            fetched = report.fetched,
            already_cached = report.already_cached,
            skipped = report.skipped,
            failed = report.failed,
            "Cache warm finished"
        );
        self.emit(CacheEvent::WarmCompleted {
            requested: report.requested,
            fetched: report.fetched,
            already_cached: report.already_cached,
            skipped: report.skipped,
            failed: report.failed,
        });

        report
    }

    async fn populate_one(&self, song: &SongRef, priority: CachePriority) -> Outcome {
        if !song.has_remote_file() {
            debug!(content_id = %song.id, "No remote file, skipping");
            return Outcome::Skipped;
        }

        match self.store.peek(&song.id).await {
            Ok(Some(entry)) => {
                if priority > entry.priority {
                    if let Err(e) = self.store.promote(&song.id, priority).await {
                        warn!(content_id = %song.id, error = %e, "Failed to promote cache entry");
                    }
                }
                return Outcome::AlreadyCached;
            }
            Ok(None) => {}
            Err(e) => {
                warn!(content_id = %song.id, error = %e, "Cache lookup failed, fetching anyway");
            }
        }

        match self.fetch_and_store(&song.id, priority).await {
            Ok(()) => Outcome::Fetched,
            Err(e) => {
                warn!(content_id = %song.id, error = %e, "Failed to cache content");
                self.emit(CacheEvent::FetchFailed {
                    content_id: song.id.clone(),
                    message: e.to_string(),
                });
                Outcome::Failed
            }
        }
    }

    async fn fetch_and_store(&self, content_id: &str, priority: CachePriority) -> Result<()> {
        let fetched = {
            let _permit = self
                .fetch_semaphore
                .acquire()
                .await
                .map_err(|_| ContentError::Store("Fetch semaphore closed".to_string()))?;
            self.fetch_with_retry(content_id).await?
        };
        let size_bytes = fetched.bytes.len() as u64;

        let evicted = self
            .store
            .put_with_priority(content_id, fetched.bytes, &fetched.mime_type, priority)
            .await?;

        debug!(content_id, size_bytes, "Stored content");
        self.emit(CacheEvent::EntryStored {
            content_id: content_id.to_string(),
            size_bytes,
        });
        for entry in evicted {
            self.emit(CacheEvent::EntryEvicted {
                content_id: entry.content_id,
                size_bytes: entry.size_bytes,
            });
        }

        Ok(())
    }

    async fn fetch_with_retry(&self, content_id: &str) -> Result<FetchedContent> {
        let attempts = self.config.max_fetch_attempts;
        let mut attempt = 1;

        loop {
            let error = match timeout(
                self.config.fetch_timeout,
                self.content_service.fetch_content_bytes(content_id),
            )
            .await
            {
                Ok(Ok(fetched)) => return Ok(fetched),
                Ok(Err(e)) => ContentError::Fetch(e),
                Err(_) => ContentError::Timeout {
                    content_id: content_id.to_string(),
                },
            };

            if attempt >= attempts || !error.is_transient() {
                return Err(error);
            }

            debug!(content_id, attempt, error = %error, "Fetch attempt failed, retrying");
            sleep(self.config.retry_delay(attempt)).await;
            attempt += 1;
        }
    }

    fn emit(&self, event: CacheEvent) {
        if let Some(bus) = &self.event_bus {
            let _ = bus.emit(CoreEvent::Cache(event));
        }
    }
}
