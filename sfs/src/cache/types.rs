//! Configuration and budget derivation for the hot-path cache.

use crate::system::detect_free_memory;

/// Memory ceiling past which a single process becomes unstable under
/// memory pressure (~1.7 GB).
///
/// Serves both as the default `maximum` and as the threshold above which
/// the cache is granted the larger share of free memory.
pub const PROCESS_MEMORY_CEILING: usize = 1_700_000_000;

/// Default key prefix.
///
/// Every key is namespaced so caller-supplied names can never collide with
/// reserved entries of the backing store.
pub const DEFAULT_KEY_PREFIX: &str = "_HotPath";

/// Percentage of free memory used for the cache on constrained hosts.
pub const CONSTRAINED_PERCENTAGE: usize = 2;

/// Percentage of free memory used for the cache on hosts at the ceiling.
pub const ABUNDANT_PERCENTAGE: usize = 10;

/// Hot-path cache configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HotPathConfig {
    /// Hard safety ceiling for the memory the budget is derived from.
    pub maximum: usize,
    /// Free memory to base the budget on; `None` queries the host.
    pub available: Option<usize>,
    /// Namespace prepended to every key.
    pub prefix: String,
    /// Whether the byte length of the prefixed key counts against the budget.
    pub count_key_bytes: bool,
}

impl Default for HotPathConfig {
    fn default() -> Self {
        Self {
            maximum: PROCESS_MEMORY_CEILING,
            available: None,
            prefix: DEFAULT_KEY_PREFIX.to_string(),
            count_key_bytes: false,
        }
    }
}

impl HotPathConfig {
    /// Set the hard memory ceiling in bytes.
    pub fn with_maximum(mut self, maximum: usize) -> Self {
        self.maximum = maximum;
        self
    }

    /// Base the budget on this many free bytes instead of querying the host.
    pub fn with_available(mut self, available: usize) -> Self {
        self.available = Some(available);
        self
    }

    /// Set the key prefix. An empty prefix keeps the default.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        if !prefix.is_empty() {
            self.prefix = prefix;
        }
        self
    }

    /// Count key bytes against the budget.
    pub fn with_key_accounting(mut self, enabled: bool) -> Self {
        self.count_key_bytes = enabled;
        self
    }

    /// Resolve the byte budget for this configuration.
    ///
    /// An `available` of zero is treated as unset, like an absent value.
    pub fn budget_bytes(&self) -> usize {
        let available = match self.available {
            Some(bytes) if bytes > 0 => bytes,
            _ => detect_free_memory(),
        };
        compute_budget(self.maximum, available)
    }
}

/// Derive the cache budget from free memory.
///
/// Free memory is clamped to `maximum`; the budget is 2% of the clamped
/// value, or 10% once it reaches [`PROCESS_MEMORY_CEILING`].
///
/// ```
/// use sfs::cache::{compute_budget, PROCESS_MEMORY_CEILING};
///
/// assert_eq!(compute_budget(PROCESS_MEMORY_CEILING, 100), 2);
/// assert_eq!(compute_budget(PROCESS_MEMORY_CEILING, 4_000_000_000), 170_000_000);
/// ```
pub fn compute_budget(maximum: usize, available: usize) -> usize {
    let free = available.min(maximum);
    let percentage = if free >= PROCESS_MEMORY_CEILING {
        ABUNDANT_PERCENTAGE
    } else {
        CONSTRAINED_PERCENTAGE
    };

    // u128 keeps the multiplication exact for any usize input
    (free as u128 * percentage as u128 / 100) as usize
}
