//! Host introspection used to size the hot-path cache.
//!
//! The cache budget is derived from how much memory the host has free when
//! the cache is created. Detection is best-effort with a conservative
//! fallback on platforms where it is not supported.

mod memory;

pub use memory::{detect_free_memory, parse_available_memory};
