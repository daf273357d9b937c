//! # Core Content
//!
//! Offline access to performance content.
//!
//! - [`cache`]: the content cache and the orchestrator that warms it
//! - [`session`]: per-view resolution of songs to displayable URLs
//! - [`handles`]: scoped local handles with guaranteed release
//! - [`render`]: choosing a renderer for a resolved item

pub mod cache;
pub mod error;
pub mod handles;
pub mod render;
pub mod session;

pub use cache::{
    CacheConfig, CacheEntry, CacheMetrics, CacheOrchestrator, CachePriority, CacheStore,
    MemoryCacheStore, WarmReport,
};
pub use error::{ContentError, Result};
pub use handles::{HandleRegistry, LocalHandle};
pub use render::{select, RenderDecision};
pub use session::{ContentCacheSession, ResolvedContent};
