//! Hot-path cache statistics.

use std::time::Instant;

/// Hot-path cache statistics for monitoring and debugging.
#[derive(Debug, Clone)]
pub struct HotPathStats {
    pub hits: u64,
    pub misses: u64,
    pub stored: u64,
    pub rejected: u64,
    pub removed: u64,
    pub allocated_bytes: usize,
    pub budget_bytes: usize,
    pub entry_count: usize,
    pub created_at: Instant,
}

impl HotPathStats {
    /// Create a new statistics tracker for a cache with the given budget.
    pub fn new(budget_bytes: usize) -> Self {
        Self {
            hits: 0,
            misses: 0,
            stored: 0,
            rejected: 0,
            removed: 0,
            allocated_bytes: 0,
            budget_bytes,
            entry_count: 0,
            created_at: Instant::now(),
        }
    }

    /// Hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    /// Fraction of the budget in use (0.0 to 1.0).
    pub fn utilization(&self) -> f64 {
        if self.budget_bytes == 0 {
            0.0
        } else {
            self.allocated_bytes as f64 / self.budget_bytes as f64
        }
    }

    /// Get the uptime duration since statistics started.
    pub fn uptime(&self) -> std::time::Duration {
        self.created_at.elapsed()
    }

    pub(crate) fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub(crate) fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub(crate) fn record_store(&mut self) {
        self.stored += 1;
    }

    pub(crate) fn record_rejection(&mut self) {
        self.rejected += 1;
    }

    pub(crate) fn record_removal(&mut self) {
        self.removed += 1;
    }

    pub(crate) fn update_size(&mut self, allocated_bytes: usize, entry_count: usize) {
        self.allocated_bytes = allocated_bytes;
        self.entry_count = entry_count;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_stats_are_empty() {
        let stats = HotPathStats::new(1000);
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 0);
        assert_eq!(stats.budget_bytes, 1000);
        assert_eq!(stats.hit_rate(), 0.0);
        assert_eq!(stats.utilization(), 0.0);
    }

    #[test]
    fn test_hit_rate() {
        let mut stats = HotPathStats::new(1000);
        stats.record_hit();
        stats.record_hit();
        stats.record_hit();
        stats.record_miss();
        assert!((stats.hit_rate() - 0.75).abs() < 0.001);
    }

    #[test]
    fn test_utilization() {
        let mut stats = HotPathStats::new(1000);
        stats.update_size(250, 3);
        assert!((stats.utilization() - 0.25).abs() < 0.001);
        assert_eq!(stats.entry_count, 3);
    }

    #[test]
    fn test_zero_budget_utilization() {
        let stats = HotPathStats::new(0);
        assert_eq!(stats.utilization(), 0.0);
    }
}
