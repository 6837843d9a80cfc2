//! sfs - in-process acceleration for file serving
//!
//! Two pieces do the work:
//!
//! - [`cache::HotPathCache`]: a memory-budgeted map of frequently served file
//!   contents, sized from the host's free memory and refreshed from the most
//!   requested files.
//! - [`fs::Sfs`]: a filesystem facade that collapses concurrent identical
//!   lookups (`exists`, `stat`, `read`) into a single underlying call whose
//!   result every caller shares.
//!
//! [`factory::FileFactory`] ties them together: it owns the live
//! [`file::FileRecord`]s and the cache, loads files through the coalesced
//! filesystem and serves contents by fingerprint.
//!
//! # Example
//!
//! ```no_run
//! use sfs::factory::{FactoryConfig, FileFactory};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let factory = FileFactory::new(FactoryConfig::default());
//!
//! let record = factory.load("public/index.html").await?;
//! factory.refresh().await?;
//!
//! let body = factory.serve(&record.fingerprint());
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod coalesce;
pub mod config;
pub mod factory;
pub mod file;
pub mod fs;
pub mod logging;
pub mod system;

/// Version of the sfs library and CLI.
///
/// Synchronized across the workspace from `Cargo.toml`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
        assert_eq!(VERSION.split('.').count(), 3);
    }
}
