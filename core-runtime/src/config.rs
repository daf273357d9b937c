//! # Core Configuration Module
//!
//! Builder-style configuration for the offline content core.
//!
//! ## Overview
//!
//! `CoreConfig` gathers the host-provided collaborators and the tunables shared
//! by the cache, the navigator and the setlist store. The builder validates
//! everything up front so misconfiguration fails at startup rather than in the
//! middle of a gig.
//!
//! ## Required Dependencies
//!
//! - `ContentService` - fetches content payloads and setlist songs
//!
//! ## Optional Dependencies
//!
//! - `Clock` - time source for cache recency (default: `SystemClock`)
//! - `ExitSignal` - receives the navigator's exit request (default: no-op)
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::CoreConfig;
//! use std::sync::Arc;
//!
//! let config = CoreConfig::builder()
//!     .database_path("/data/gigbook.db")
//!     .cache_size_mb(256)
//!     .content_service(Arc::new(MyContentService::new()))
//!     .build()
//!     .expect("Failed to build config");
//! ```

use crate::error::{Error, Result};
use crate::events::{EventBus, EventStream};
use bridge_traits::{Clock, ContentService, ExitSignal, NoopExitSignal, SystemClock};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Navigation must stay under this budget to feel instant on stage.
pub const DEFAULT_LATENCY_BUDGET: Duration = Duration::from_millis(100);

/// Core configuration for the offline content core.
///
/// Use [`CoreConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct CoreConfig {
    /// Path to the SQLite database holding setlists
    pub database_path: PathBuf,

    /// Maximum cache size in megabytes
    pub cache_size_mb: u64,

    /// Maximum number of cached items
    pub cache_max_entries: usize,

    /// Concurrent fetches during warm/populate
    pub max_concurrent_fetches: usize,

    /// Timeout for a single content fetch
    pub fetch_timeout: Duration,

    /// Attempts per fetch (1 = no retry)
    pub max_fetch_attempts: usize,

    /// Budget for a single navigator transition
    pub latency_budget: Duration,

    /// Event bus buffer size
    pub event_buffer_size: usize,

    /// Content service (required)
    pub content_service: Arc<dyn ContentService>,

    /// Time source for cache bookkeeping
    pub clock: Arc<dyn Clock>,

    /// Receiver for the navigator's exit request
    pub exit_signal: Arc<dyn ExitSignal>,

    pub features: FeatureFlags,

    /// Bus shared by every component built from this config; `None` when
    /// events are disabled
    pub event_bus: Option<EventBus>,
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("database_path", &self.database_path)
            .field("cache_size_mb", &self.cache_size_mb)
            .field("cache_max_entries", &self.cache_max_entries)
            .field("max_concurrent_fetches", &self.max_concurrent_fetches)
            .field("fetch_timeout", &self.fetch_timeout)
            .field("max_fetch_attempts", &self.max_fetch_attempts)
            .field("latency_budget", &self.latency_budget)
            .field("event_buffer_size", &self.event_buffer_size)
            .field("content_service", &"ContentService { ... }")
            .field("clock", &"Clock { ... }")
            .field("exit_signal", &"ExitSignal { ... }")
            .field("features", &self.features)
            .field("event_bus", &self.event_bus)
            .finish()
    }
}

/// Feature flags control optional behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureFlags {
    /// Warm the upcoming setlist in the background when a session starts
    pub enable_background_warm: bool,

    /// Publish events on the event bus
    pub enable_events: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            enable_background_warm: true,
            enable_events: true,
        }
    }
}

impl CoreConfig {
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Subscribe to the shared event bus.
    ///
    /// Returns `None` when events are disabled.
    pub fn subscribe(&self) -> Option<EventStream> {
        self.event_bus
            .as_ref()
            .map(|bus| EventStream::new(bus.subscribe()))
    }

    /// Cache ceiling in bytes.
    pub fn cache_size_bytes(&self) -> u64 {
        self.cache_size_mb * 1024 * 1024
    }

    /// Validates the configuration and returns an error if invalid.
    pub fn validate(&self) -> Result<()> {
        if self.database_path.as_os_str().is_empty() {
            return Err(Error::Config("Database path cannot be empty".to_string()));
        }

        if self.cache_size_mb == 0 {
            return Err(Error::Config(
                "Cache size must be greater than 0 MB".to_string(),
            ));
        }

        if self.cache_size_mb > 100_000 {
            return Err(Error::Config(
                "Cache size exceeds maximum of 100GB (100,000 MB)".to_string(),
            ));
        }

        if self.cache_max_entries == 0 {
            return Err(Error::Config(
                "Cache entry limit must be at least 1".to_string(),
            ));
        }

        if self.max_concurrent_fetches == 0 {
            return Err(Error::Config(
                "max_concurrent_fetches must be at least 1".to_string(),
            ));
        }

        if self.max_fetch_attempts == 0 {
            return Err(Error::Config(
                "max_fetch_attempts must be at least 1".to_string(),
            ));
        }

        if self.latency_budget.is_zero() {
            return Err(Error::Config(
                "Latency budget must be greater than zero".to_string(),
            ));
        }

        if self.features.enable_events && self.event_buffer_size == 0 {
            return Err(Error::Config(
                "Events enabled but event buffer size is 0".to_string(),
            ));
        }

        Ok(())
    }
}

/// Builder for [`CoreConfig`].
#[derive(Default)]
pub struct CoreConfigBuilder {
    database_path: Option<PathBuf>,
    cache_size_mb: Option<u64>,
    cache_max_entries: Option<usize>,
    max_concurrent_fetches: Option<usize>,
    fetch_timeout: Option<Duration>,
    max_fetch_attempts: Option<usize>,
    latency_budget: Option<Duration>,
    event_buffer_size: Option<usize>,
    content_service: Option<Arc<dyn ContentService>>,
    clock: Option<Arc<dyn Clock>>,
    exit_signal: Option<Arc<dyn ExitSignal>>,
    features: FeatureFlags,
}

impl CoreConfigBuilder {
    pub fn database_path(mut self, path: impl AsRef<Path>) -> Self {
        self.database_path = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn cache_size_mb(mut self, size_mb: u64) -> Self {
        self.cache_size_mb = Some(size_mb);
        self
    }

    pub fn cache_max_entries(mut self, entries: usize) -> Self {
        self.cache_max_entries = Some(entries);
        self
    }

    pub fn max_concurrent_fetches(mut self, count: usize) -> Self {
        self.max_concurrent_fetches = Some(count);
        self
    }

    pub fn fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = Some(timeout);
        self
    }

    pub fn max_fetch_attempts(mut self, attempts: usize) -> Self {
        self.max_fetch_attempts = Some(attempts);
        self
    }

    pub fn latency_budget(mut self, budget: Duration) -> Self {
        self.latency_budget = Some(budget);
        self
    }

    pub fn event_buffer_size(mut self, size: usize) -> Self {
        self.event_buffer_size = Some(size);
        self
    }

    pub fn content_service(mut self, service: Arc<dyn ContentService>) -> Self {
        self.content_service = Some(service);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn exit_signal(mut self, signal: Arc<dyn ExitSignal>) -> Self {
        self.exit_signal = Some(signal);
        self
    }

    pub fn enable_background_warm(mut self, enabled: bool) -> Self {
        self.features.enable_background_warm = enabled;
        self
    }

    pub fn enable_events(mut self, enabled: bool) -> Self {
        self.features.enable_events = enabled;
        self
    }

    /// Builds and validates the configuration.
    ///
    /// # Errors
    ///
    /// - [`Error::CapabilityMissing`] if no `ContentService` was provided
    /// - [`Error::Config`] if any tunable is out of range
    pub fn build(self) -> Result<CoreConfig> {
        let content_service = self.content_service.ok_or_else(|| Error::CapabilityMissing {
            capability: "ContentService".to_string(),
            message: "A ContentService implementation is required to fetch sheet music and \
                      setlist songs. Inject the host's content client before building the \
                      core configuration."
                .to_string(),
        })?;

        let event_buffer_size = self
            .event_buffer_size
            .unwrap_or(crate::events::DEFAULT_EVENT_BUFFER_SIZE);

        let mut config = CoreConfig {
            database_path: self
                .database_path
                .unwrap_or_else(|| PathBuf::from("gigbook.db")),
            cache_size_mb: self.cache_size_mb.unwrap_or(512),
            cache_max_entries: self.cache_max_entries.unwrap_or(1_000),
            max_concurrent_fetches: self.max_concurrent_fetches.unwrap_or(4),
            fetch_timeout: self.fetch_timeout.unwrap_or(Duration::from_secs(30)),
            max_fetch_attempts: self.max_fetch_attempts.unwrap_or(1),
            latency_budget: self.latency_budget.unwrap_or(DEFAULT_LATENCY_BUDGET),
            event_buffer_size,
            content_service,
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            exit_signal: self.exit_signal.unwrap_or_else(|| Arc::new(NoopExitSignal)),
            features: self.features,
            event_bus: None,
        };

        config.validate()?;
        if config.features.enable_events {
            config.event_bus = Some(EventBus::new(event_buffer_size));
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{CoreEvent, PerformanceEvent};
    use async_trait::async_trait;
    use bridge_traits::content::{FetchedContent, SongRef};
    use bridge_traits::error::{BridgeError, Result as BridgeResult};

    struct NullContentService;

    #[async_trait]
    impl ContentService for NullContentService {
        async fn fetch_content_bytes(&self, content_id: &str) -> BridgeResult<FetchedContent> {
            Err(BridgeError::NotFound(content_id.to_string()))
        }

        async fn list_songs(&self, _setlist_id: &str) -> BridgeResult<Vec<SongRef>> {
            Ok(Vec::new())
        }
    }

    fn builder() -> CoreConfigBuilder {
        CoreConfig::builder().content_service(Arc::new(NullContentService))
    }

    #[test]
    fn test_defaults() {
        let config = builder().build().unwrap();
        assert_eq!(config.database_path, PathBuf::from("gigbook.db"));
        assert_eq!(config.cache_size_mb, 512);
        assert_eq!(config.cache_size_bytes(), 512 * 1024 * 1024);
        assert_eq!(config.max_fetch_attempts, 1);
        assert_eq!(config.latency_budget, DEFAULT_LATENCY_BUDGET);
        assert!(config.features.enable_background_warm);
        assert!(config.features.enable_events);
    }

    #[test]
    fn test_missing_content_service() {
        let result = CoreConfig::builder().database_path("/tmp/gigs.db").build();
        match result {
            Err(Error::CapabilityMissing { capability, .. }) => {
                assert_eq!(capability, "ContentService")
            }
            other => panic!("expected CapabilityMissing, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_builder_overrides() {
        let config = builder()
            .database_path("/tmp/gigs.db")
            .cache_size_mb(64)
            .cache_max_entries(50)
            .max_concurrent_fetches(2)
            .fetch_timeout(Duration::from_secs(5))
            .max_fetch_attempts(3)
            .latency_budget(Duration::from_millis(50))
            .enable_background_warm(false)
            .build()
            .unwrap();

        assert_eq!(config.database_path, PathBuf::from("/tmp/gigs.db"));
        assert_eq!(config.cache_max_entries, 50);
        assert_eq!(config.max_concurrent_fetches, 2);
        assert_eq!(config.fetch_timeout, Duration::from_secs(5));
        assert_eq!(config.max_fetch_attempts, 3);
        assert_eq!(config.latency_budget, Duration::from_millis(50));
        assert!(!config.features.enable_background_warm);
    }

    #[test]
    fn test_event_bus_follows_feature_flag() {
        let config = builder().event_buffer_size(8).build().unwrap();
        let mut stream = config
            .subscribe()
            .unwrap()
            .filter(|event| matches!(event, CoreEvent::Performance(_)));

        // Clones publish into the same bus.
        let component_config = config.clone();
        let bus = component_config.event_bus.as_ref().unwrap();
        bus.emit(CoreEvent::Performance(PerformanceEvent::ExitRequested))
            .unwrap();
        assert!(matches!(
            stream.try_recv(),
            Some(Ok(CoreEvent::Performance(PerformanceEvent::ExitRequested)))
        ));

        let quiet = builder().enable_events(false).build().unwrap();
        assert!(quiet.event_bus.is_none());
        assert!(quiet.subscribe().is_none());
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        assert!(builder().cache_size_mb(0).build().is_err());
        assert!(builder().cache_size_mb(200_000).build().is_err());
        assert!(builder().cache_max_entries(0).build().is_err());
        assert!(builder().max_concurrent_fetches(0).build().is_err());
        assert!(builder().max_fetch_attempts(0).build().is_err());
        assert!(builder().latency_budget(Duration::ZERO).build().is_err());
        assert!(builder().event_buffer_size(0).build().is_err());
        assert!(builder()
            .event_buffer_size(0)
            .enable_events(false)
            .build()
            .is_ok());
    }
}
