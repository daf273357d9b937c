//! Cache metrics and warm reports

use serde::{Deserialize, Serialize};

/// Point-in-time snapshot of cache effectiveness.
///
/// Recomputed on every query; holding on to one does not observe later
/// traffic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheMetrics {
    pub hit_count: u64,
    pub miss_count: u64,
    pub total_requests: u64,

    /// Entries currently stored
    pub entry_count: usize,

    /// Bytes currently stored
    pub total_bytes: u64,

    /// Entries removed to respect the ceilings
    pub eviction_count: u64,
}

impl CacheMetrics {
    /// Fraction of lookups served from the cache, `0.0` before any lookup.
    pub fn hit_rate(&self) -> f64 {
        if self.total_requests == 0 {
            return 0.0;
        }
        self.hit_count as f64 / self.total_requests as f64
    }
}

/// Outcome of a warm or populate batch.
///
/// `fetched + already_cached + skipped + failed == requested`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarmReport {
    pub requested: usize,
    /// Downloaded and stored by this batch
    pub fetched: usize,
    /// Present before the batch started
    pub already_cached: usize,
    /// Nothing to fetch (no remote file)
    pub skipped: usize,
    /// Fetch or store failed; logged and swallowed
    pub failed: usize,
}

impl WarmReport {
    /// Items now available from the cache.
    pub fn available(&self) -> usize {
        self.fetched + self.already_cached
    }

    pub fn is_complete(&self) -> bool {
        self.failed == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_rate() {
        let empty = CacheMetrics::default();
        assert_eq!(empty.hit_rate(), 0.0);

        let metrics = CacheMetrics {
            hit_count: 3,
            miss_count: 1,
            total_requests: 4,
            ..Default::default()
        };
        assert!((metrics.hit_rate() - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn test_warm_report_totals() {
        let report = WarmReport {
            requested: 5,
            fetched: 2,
            already_cached: 1,
            skipped: 1,
            failed: 1,
        };
        assert_eq!(report.available(), 3);
        assert!(!report.is_complete());
    }
}
