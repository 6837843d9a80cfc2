//! Hot-path cache for frequently served file contents.
//!
//! A flat key to buffer map with a hard byte budget derived from the host's
//! free memory. Insertions beyond the budget are refused rather than
//! evicting older entries.

mod hotpath;
mod stats;
mod types;

pub use hotpath::HotPathCache;
pub use stats::HotPathStats;
pub use types::{
    compute_budget, HotPathConfig, ABUNDANT_PERCENTAGE, CONSTRAINED_PERCENTAGE,
    DEFAULT_KEY_PREFIX, PROCESS_MEMORY_CEILING,
};
