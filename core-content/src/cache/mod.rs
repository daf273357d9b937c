//! # Offline Content Cache
//!
//! Keeps performance content available without the network.
//!
//! - [`store`]: keyed byte storage with LRU eviction under byte and entry
//!   ceilings
//! - [`orchestrator`]: fetches upcoming items ahead of need
//! - [`stats`]: hit/miss metrics and warm reports

pub mod config;
pub mod orchestrator;
pub mod stats;
pub mod store;

pub use config::{CacheConfig, CachePriority};
pub use orchestrator::CacheOrchestrator;
pub use stats::{CacheMetrics, WarmReport};
pub use store::{CacheEntry, CacheStore, Evicted, MemoryCacheStore};
