//! Cache configuration and priorities

use core_runtime::config::CoreConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the content cache and its warmer.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Byte ceiling across all entries (default: 512MB)
    pub max_cache_size_bytes: u64,

    /// Entry-count ceiling (default: 1000)
    pub max_entries: usize,

    /// Fetches allowed in flight during a warm (default: 4)
    pub max_concurrent_fetches: usize,

    /// Deadline for a single fetch attempt (default: 30s)
    pub fetch_timeout: Duration,

    /// Attempts per item; 1 means failures are not retried (default: 1)
    pub max_fetch_attempts: usize,

    /// Warm the upcoming items when a session opens (default: false)
    pub background_warm: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_cache_size_bytes: 512 * 1024 * 1024,
            max_entries: 1000,
            max_concurrent_fetches: 4,
            fetch_timeout: Duration::from_secs(30),
            max_fetch_attempts: 1,
            background_warm: false,
        }
    }
}

impl CacheConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_size(mut self, bytes: u64) -> Self {
        self.max_cache_size_bytes = bytes;
        self
    }

    pub fn with_max_entries(mut self, entries: usize) -> Self {
        self.max_entries = entries;
        self
    }

    pub fn with_max_concurrent_fetches(mut self, count: usize) -> Self {
        self.max_concurrent_fetches = count;
        self
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    pub fn with_max_fetch_attempts(mut self, attempts: usize) -> Self {
        self.max_fetch_attempts = attempts;
        self
    }

    pub fn with_background_warm(mut self, enabled: bool) -> Self {
        self.background_warm = enabled;
        self
    }

    /// Backoff before retry number `attempt` (1-based): 100ms, 200ms, 400ms...
    pub fn retry_delay(&self, attempt: usize) -> Duration {
        let exp = attempt.saturating_sub(1).min(16) as u32;
        Duration::from_millis(100 * 2u64.pow(exp))
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_cache_size_bytes == 0 {
            return Err("max_cache_size_bytes must be greater than 0".to_string());
        }

        if self.max_entries == 0 {
            return Err("max_entries must be at least 1".to_string());
        }

        if self.max_concurrent_fetches == 0 {
            return Err("max_concurrent_fetches must be at least 1".to_string());
        }

        if self.max_fetch_attempts == 0 {
            return Err("max_fetch_attempts must be at least 1".to_string());
        }

        if self.fetch_timeout.is_zero() {
            return Err("fetch_timeout must be greater than 0".to_string());
        }

        Ok(())
    }
}

impl From<&CoreConfig> for CacheConfig {
    fn from(config: &CoreConfig) -> Self {
        Self {
            max_cache_size_bytes: config.cache_size_bytes(),
            max_entries: config.cache_max_entries,
            max_concurrent_fetches: config.max_concurrent_fetches,
            fetch_timeout: config.fetch_timeout,
            max_fetch_attempts: config.max_fetch_attempts,
            background_warm: config.features.enable_background_warm,
        }
    }
}

/// How hard the cache holds on to an entry.
///
/// `High` entries are evicted only once no `Normal` entry is left.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum CachePriority {
    #[default]
    Normal,
    High,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CacheConfig::default();
        assert_eq!(config.max_cache_size_bytes, 512 * 1024 * 1024);
        assert_eq!(config.max_fetch_attempts, 1);
        assert!(!config.background_warm);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        assert!(CacheConfig::new().with_max_size(0).validate().is_err());
        assert!(CacheConfig::new().with_max_entries(0).validate().is_err());
        assert!(CacheConfig::new()
            .with_max_concurrent_fetches(0)
            .validate()
            .is_err());
        assert!(CacheConfig::new()
            .with_max_fetch_attempts(0)
            .validate()
            .is_err());
        assert!(CacheConfig::new()
            .with_fetch_timeout(Duration::ZERO)
            .validate()
            .is_err());
    }

    #[test]
    fn test_retry_delay_doubles() {
        let config = CacheConfig::default();
        assert_eq!(config.retry_delay(1), Duration::from_millis(100));
        assert_eq!(config.retry_delay(2), Duration::from_millis(200));
        assert_eq!(config.retry_delay(4), Duration::from_millis(800));
    }

    #[test]
    fn test_priority_order() {
        assert!(CachePriority::High > CachePriority::Normal);
        assert_eq!(CachePriority::default(), CachePriority::Normal);
    }
}
