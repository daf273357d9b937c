//! # Local Handles
//!
//! A handle is an opaque local URL standing in for cached bytes while a
//! session displays them. The registry is the single owner of every live
//! handle. Each carries its content id and a unique generation, so two
//! handles for the same content never release or open each other.

use bytes::Bytes;
use parking_lot::Mutex;
use std::collections::HashMap;

const SCHEME: &str = "cache://";

/// A minted handle. Cloning does not extend its lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalHandle {
    pub content_id: String,
    pub generation: u64,
    pub url: String,
    pub mime_type: String,
}

struct Slot {
    content_id: String,
    bytes: Bytes,
}

#[derive(Default)]
struct Inner {
    /// Live handles by generation
    slots: HashMap<u64, Slot>,
    next_generation: u64,
    acquired: u64,
    released: u64,
}

/// Ownership table for the handles of one session.
pub struct HandleRegistry {
    session_id: String,
    inner: Mutex<Inner>,
}

impl HandleRegistry {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            inner: Mutex::new(Inner::default()),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Mint a new handle for `bytes`.
    pub fn acquire(&self, content_id: &str, bytes: Bytes, mime_type: &str) -> LocalHandle {
        let mut inner = self.inner.lock();
        inner.next_generation += 1;
        let generation = inner.next_generation;

        inner.slots.insert(
            generation,
            Slot {
                content_id: content_id.to_string(),
                bytes,
            },
        );
        inner.acquired += 1;

        LocalHandle {
            content_id: content_id.to_string(),
            generation,
            url: format!("{}{}/{}#{}", SCHEME, self.session_id, content_id, generation),
            mime_type: mime_type.to_string(),
        }
    }

    /// Release `handle`. Returns `false` if it was already released;
    /// never panics.
    pub fn release(&self, handle: &LocalHandle) -> bool {
        let mut inner = self.inner.lock();
        if !Self::matches(&inner, handle.generation, &handle.content_id) {
            return false;
        }
        inner.slots.remove(&handle.generation);
        inner.released += 1;
        true
    }

    /// Release every live handle, returning how many were released.
    pub fn release_all(&self) -> usize {
        let mut inner = self.inner.lock();
        let count = inner.slots.len();
        inner.slots.clear();
        inner.released += count as u64;
        count
    }

    pub fn is_live(&self, handle: &LocalHandle) -> bool {
        Self::matches(&self.inner.lock(), handle.generation, &handle.content_id)
    }

    fn matches(inner: &Inner, generation: u64, content_id: &str) -> bool {
        inner
            .slots
            .get(&generation)
            .is_some_and(|slot| slot.content_id == content_id)
    }

    /// Bytes behind a handle URL, if the handle is still live.
    pub fn open(&self, url: &str) -> Option<Bytes> {
        let rest = url.strip_prefix(SCHEME)?;
        let rest = rest.strip_prefix(self.session_id.as_str())?.strip_prefix('/')?;
        let (content_id, generation) = rest.rsplit_once('#')?;
        let generation: u64 = generation.parse().ok()?;

        let inner = self.inner.lock();
        inner
            .slots
            .get(&generation)
            .filter(|slot| slot.content_id == content_id)
            .map(|slot| slot.bytes.clone())
    }

    pub fn live_count(&self) -> usize {
        self.inner.lock().slots.len()
    }

    /// Total handles minted so far.
    pub fn acquired_count(&self) -> u64 {
        self.inner.lock().acquired
    }

    /// Total handles released so far.
    pub fn released_count(&self) -> u64 {
        self.inner.lock().released
    }
}
