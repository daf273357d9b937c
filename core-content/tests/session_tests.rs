//! Content resolution sessions: fallbacks, memoisation and handle lifetimes.

use std::sync::Arc;

use async_trait::async_trait;
use bridge_traits::content::{ContentKind, ContentService, FetchedContent, SongRef};
use bridge_traits::BridgeError;
use bytes::Bytes;
use core_content::cache::{
    CacheConfig, CacheEntry, CacheMetrics, CacheOrchestrator, CachePriority, CacheStore, Evicted,
    MemoryCacheStore,
};
use core_content::render::{select, RenderDecision};
use core_content::{ContentCacheSession, ContentError};
use mockall::mock;
use tokio::sync::Notify;

mock! {
    pub Content {}

    #[async_trait]
    impl ContentService for Content {
        async fn fetch_content_bytes(&self, content_id: &str) -> Result<FetchedContent, BridgeError>;
        async fn list_songs(&self, setlist_id: &str) -> Result<Vec<SongRef>, BridgeError>;
    }
}

fn memory_store() -> Arc<MemoryCacheStore> {
    Arc::new(MemoryCacheStore::new(&CacheConfig::default()).unwrap())
}

fn song(id: &str) -> SongRef {
    SongRef::new(id, id).with_remote_url(format!("http://x/{id}.pdf"))
}

async fn cache(store: &MemoryCacheStore, id: &str) {
    store
        .put(id, Bytes::from(format!("bytes of {id}")), "application/pdf")
        .await
        .unwrap();
}

#[tokio::test]
async fn empty_store_resolves_to_remote_url() {
    let session = ContentCacheSession::new(memory_store());
    let songs = vec![SongRef::new("a", "A").with_remote_url("http://x/a.pdf")];

    let resolved = session.resolve_content(&songs).await.unwrap();

    assert_eq!(resolved.url("a"), Some("http://x/a.pdf"));
    assert_eq!(resolved.mime_type("a"), None);
}

#[tokio::test]
async fn song_with_nothing_resolves_to_none() {
    let session = ContentCacheSession::new(memory_store());
    let resolved = session
        .resolve_content(&[SongRef::new("bare", "Bare")])
        .await
        .unwrap();
    assert_eq!(resolved.url("bare"), None);
}

#[tokio::test]
async fn cached_content_resolves_to_local_handle() {
    let store = memory_store();
    cache(&store, "a").await;
    let session = ContentCacheSession::new(store);

    let resolved = session.resolve_content(&[song("a")]).await.unwrap();
    let url = resolved.url("a").unwrap();

    assert!(url.starts_with("cache://"));
    assert_eq!(resolved.mime_type("a"), Some("application/pdf"));
    assert_eq!(
        session.handles().open(url).unwrap(),
        Bytes::from("bytes of a")
    );
}

#[tokio::test]
async fn changed_list_reuses_and_releases_handles() {
    let store = memory_store();
    for id in ["a", "b", "c"] {
        cache(&store, id).await;
    }
    let session = ContentCacheSession::new(store);

    let first = session.resolve_content(&[song("a"), song("b")]).await.unwrap();
    let second = session.resolve_content(&[song("b"), song("c")]).await.unwrap();

    assert_eq!(first.url("b"), second.url("b"));
    assert!(session.handles().open(first.url("a").unwrap()).is_none());
    assert_eq!(session.handles().acquired_count(), 3);
    assert_eq!(session.handles().released_count(), 1);
    assert_eq!(session.handles().live_count(), 2);

    session.close();
    assert_eq!(session.handles().released_count(), 3);
    assert_eq!(session.handles().live_count(), 0);
}

/// Store whose lookups of `"slow"` wait until the test opens the gate.
struct GatedStore {
    inner: Arc<MemoryCacheStore>,
    entered: Notify,
    gate: Notify,
}

#[async_trait]
impl CacheStore for GatedStore {
    async fn put_with_priority(
        &self,
        content_id: &str,
        bytes: Bytes,
        mime_type: &str,
        priority: CachePriority,
    ) -> core_content::Result<Vec<Evicted>> {
        self.inner
            .put_with_priority(content_id, bytes, mime_type, priority)
            .await
    }

    async fn get(&self, content_id: &str) -> core_content::Result<Option<CacheEntry>> {
        if content_id == "slow" {
            self.entered.notify_one();
            self.gate.notified().await;
        }
        self.inner.get(content_id).await
    }

    async fn promote(
        &self,
        content_id: &str,
        priority: CachePriority,
    ) -> core_content::Result<bool> {
        self.inner.promote(content_id, priority).await
    }

    async fn peek(&self, content_id: &str) -> core_content::Result<Option<CacheEntry>> {
        self.inner.peek(content_id).await
    }

    async fn remove(&self, content_id: &str) -> core_content::Result<Option<CacheEntry>> {
        self.inner.remove(content_id).await
    }

    async fn metrics(&self) -> core_content::Result<CacheMetrics> {
        self.inner.metrics().await
    }

    async fn len(&self) -> core_content::Result<usize> {
        self.inner.len().await
    }

    async fn total_bytes(&self) -> core_content::Result<u64> {
        self.inner.total_bytes().await
    }

    async fn clear(&self) -> core_content::Result<usize> {
        self.inner.clear().await
    }
}

async fn gated_store() -> Arc<GatedStore> {
    let inner = memory_store();
    cache(&inner, "slow").await;
    cache(&inner, "fast").await;
    Arc::new(GatedStore {
        inner,
        entered: Notify::new(),
        gate: Notify::new(),
    })
}

#[tokio::test]
async fn superseded_pass_is_discarded_and_releases_its_handles() {
    let store = gated_store().await;
    let session = Arc::new(ContentCacheSession::new(store.clone()));

    let stale = tokio::spawn({
        let session = Arc::clone(&session);
        async move { session.resolve_content(&[song("slow")]).await }
    });
    store.entered.notified().await;

    // A newer list arrives while the first pass is still waiting.
    let latest = session.resolve_content(&[song("fast")]).await.unwrap();
    assert!(latest.url("fast").unwrap().starts_with("cache://"));

    store.gate.notify_one();
    let stale = stale.await.unwrap().unwrap();

    assert_eq!(stale, latest);
    assert_eq!(session.snapshot(), latest);
    assert_eq!(session.handles().acquired_count(), 2);
    assert_eq!(session.handles().released_count(), 1);
    assert_eq!(session.handles().live_count(), 1);

    session.close();
    assert_eq!(
        session.handles().acquired_count(),
        session.handles().released_count()
    );
}

#[tokio::test]
async fn switching_back_to_installed_list_beats_pending_pass() {
    let store = gated_store().await;
    let session = Arc::new(ContentCacheSession::new(store.clone()));

    let first = session.resolve_content(&[song("fast")]).await.unwrap();
    let fast_url = first.url("fast").unwrap().to_string();

    let pending = tokio::spawn({
        let session = Arc::clone(&session);
        async move { session.resolve_content(&[song("slow")]).await }
    });
    store.entered.notified().await;

    // The caller goes back to the list that is still installed.
    let reverted = session.resolve_content(&[song("fast")]).await.unwrap();
    assert_eq!(reverted.url("fast"), Some(fast_url.as_str()));

    store.gate.notify_one();
    pending.await.unwrap().unwrap();

    let snapshot = session.snapshot();
    assert_eq!(snapshot.url("fast"), Some(fast_url.as_str()));
    assert_eq!(snapshot.url("slow"), None);
    assert!(!snapshot.is_loading);
    assert!(session.handles().open(&fast_url).is_some());
    assert_eq!(session.handles().acquired_count(), 2);
    assert_eq!(session.handles().live_count(), 1);

    // Settled again, so the same list is memoised.
    let again = session.resolve_content(&[song("fast")]).await.unwrap();
    assert_eq!(again, snapshot);
    assert_eq!(session.handles().acquired_count(), 2);
}

#[tokio::test]
async fn closing_mid_pass_discards_result() {
    let store = gated_store().await;
    let session = Arc::new(ContentCacheSession::new(store.clone()));

    let pending = tokio::spawn({
        let session = Arc::clone(&session);
        async move { session.resolve_content(&[song("slow")]).await }
    });
    store.entered.notified().await;

    session.close();
    store.gate.notify_one();

    let result = pending.await.unwrap();
    assert!(matches!(result, Err(ContentError::SessionClosed)));
    assert_eq!(session.handles().live_count(), 0);
    assert_eq!(session.handles().acquired_count(), 1);
    assert_eq!(session.handles().released_count(), 1);
}

/// Store that fails every operation.
struct BrokenStore;

#[async_trait]
impl CacheStore for BrokenStore {
    async fn put_with_priority(
        &self,
        _content_id: &str,
        _bytes: Bytes,
        _mime_type: &str,
        _priority: CachePriority,
    ) -> core_content::Result<Vec<Evicted>> {
        Err(ContentError::Store("disk full".into()))
    }

    async fn get(&self, _content_id: &str) -> core_content::Result<Option<CacheEntry>> {
        Err(ContentError::Store("corrupt index".into()))
    }

    async fn promote(
        &self,
        _content_id: &str,
        _priority: CachePriority,
    ) -> core_content::Result<bool> {
        Err(ContentError::Store("corrupt index".into()))
    }

    async fn peek(&self, _content_id: &str) -> core_content::Result<Option<CacheEntry>> {
        Err(ContentError::Store("corrupt index".into()))
    }

    async fn remove(&self, _content_id: &str) -> core_content::Result<Option<CacheEntry>> {
        Err(ContentError::Store("corrupt index".into()))
    }

    async fn metrics(&self) -> core_content::Result<CacheMetrics> {
        Ok(CacheMetrics::default())
    }

    async fn len(&self) -> core_content::Result<usize> {
        Ok(0)
    }

    async fn total_bytes(&self) -> core_content::Result<u64> {
        Ok(0)
    }

    async fn clear(&self) -> core_content::Result<usize> {
        Ok(0)
    }
}

#[tokio::test]
async fn store_errors_fall_back_like_misses() {
    let session = ContentCacheSession::new(Arc::new(BrokenStore));
    let songs = vec![
        song("a"),
        SongRef::new("b", "B")
            .with_kind(ContentKind::Lyrics)
            .with_embedded_text("Chorus"),
    ];

    let resolved = session.resolve_content(&songs).await.unwrap();
    assert_eq!(resolved.url("a"), Some("http://x/a.pdf"));
    assert_eq!(resolved.url("b"), Some("embedded:b"));
}

#[tokio::test]
async fn warming_then_refreshing_switches_to_local_copy() {
    let mut service = MockContent::new();
    service
        .expect_fetch_content_bytes()
        .times(1)
        .returning(|_| Ok(FetchedContent::new(&b"%PDF-1.7"[..], "application/pdf")));

    let config = CacheConfig::default();
    let store = memory_store();
    let orchestrator =
        CacheOrchestrator::new(store.clone(), Arc::new(service), config).unwrap();
    let session = ContentCacheSession::new(store);

    let setlist = vec![SongRef::new("a", "A").with_remote_url("http://x/a")];
    let before = session.resolve_content(&setlist).await.unwrap();
    assert_eq!(before.url("a"), Some("http://x/a"));

    orchestrator.cache_all(&setlist).await;

    // Same list, so a plain resolve is memoised.
    let memoised = session.resolve_content(&setlist).await.unwrap();
    assert_eq!(memoised, before);

    let after = session.refresh(&setlist).await.unwrap();
    let url = after.url("a").unwrap();
    assert!(url.starts_with("cache://"));

    // No extension on the handle URL; the mime type decides.
    let decision = select(&setlist[0], Some(url), after.mime_type("a"), None);
    assert_eq!(
        decision,
        RenderDecision::Document {
            url: url.to_string()
        }
    );
}
