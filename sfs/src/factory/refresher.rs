//! Hot-path cache refresh.
//!
//! A refresh snapshots the live records, orders them by how often they
//! have been served (least first), clears the cache and reinserts each
//! record's compiled contents under its fingerprint. Once the budget
//! refuses an entry the remaining records are skipped; entries already
//! inserted stay.
//!
//! [`RefreshDaemon`] repeats this on a fixed interval until cancelled.

use crate::cache::HotPathCache;
use crate::factory::{FactoryError, FileFactory};
use crate::file::FileRecord;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Default interval between refreshes (30 seconds).
pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 30;

/// Outcome of one refresh pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshReport {
    /// Live records examined
    pub considered: usize,
    /// Records whose contents were inserted
    pub cached: usize,
    /// Records refused by the budget or destroyed mid-refresh
    pub skipped: usize,
    /// Content bytes inserted
    pub bytes: usize,
    /// Wall time spent
    pub duration: Duration,
}

/// Rebuild `cache` from `records`.
pub(crate) fn rebuild(cache: &HotPathCache, mut records: Vec<Arc<FileRecord>>) -> RefreshReport {
    let started = Instant::now();
    // Counts are read once since forward() keeps running during the sort.
    // Stable: ties keep their incoming order
    records.sort_by_cached_key(|record| record.requested());

    cache.clear();

    let mut report = RefreshReport {
        considered: records.len(),
        ..Default::default()
    };

    let mut exhausted = false;
    for record in &records {
        if exhausted {
            report.skipped += 1;
            continue;
        }

        let Ok((fingerprint, buffer)) = record.snapshot() else {
            report.skipped += 1;
            continue;
        };

        let size = buffer.len();
        if cache.set(fingerprint.as_str(), buffer) {
            report.cached += 1;
            report.bytes += size;
        } else {
            debug!(
                record = %record.id(),
                size,
                remaining = cache.remaining_bytes(),
                "Hot-path budget exhausted during refresh"
            );
            exhausted = true;
            report.skipped += 1;
        }
    }

    report.duration = started.elapsed();
    debug!(
        considered = report.considered,
        cached = report.cached,
        skipped = report.skipped,
        bytes = report.bytes,
        duration_us = report.duration.as_micros() as u64,
        "Hot-path cache refreshed"
    );
    report
}

/// Background daemon that refreshes a factory's hot-path cache.
///
/// # Example
///
/// ```ignore
/// use sfs::factory::RefreshDaemon;
///
/// let daemon = RefreshDaemon::new(factory.clone())
///     .with_interval(Duration::from_secs(10));
///
/// tokio::spawn(daemon.run(shutdown_token));
/// ```
pub struct RefreshDaemon {
    factory: FileFactory,
    interval: Duration,
}

impl RefreshDaemon {
    /// Creates a daemon with the default interval.
    pub fn new(factory: FileFactory) -> Self {
        Self {
            factory,
            interval: Duration::from_secs(DEFAULT_REFRESH_INTERVAL_SECS),
        }
    }

    /// Sets a custom refresh interval.
    ///
    /// A zero interval keeps the default period.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        if interval.is_zero() {
            warn!(
                default_secs = DEFAULT_REFRESH_INTERVAL_SECS,
                "Zero refresh interval, using default"
            );
        } else {
            self.interval = interval;
        }
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Runs until `shutdown` is cancelled or the factory is destroyed.
    pub async fn run(self, shutdown: CancellationToken) {
        info!(
            interval_ms = self.interval.as_millis() as u64,
            "Hot-path refresh daemon starting"
        );

        let mut interval = tokio::time::interval(self.interval);
        // Skip the first immediate tick
        interval.tick().await;

        loop {
            tokio::select! {
                biased;

                _ = shutdown.cancelled() => {
                    info!("Hot-path refresh daemon shutting down");
                    break;
                }

                _ = interval.tick() => {
                    match self.factory.refresh().await {
                        Ok(_) => {}
                        Err(FactoryError::Destroyed) => {
                            info!("Factory destroyed, stopping hot-path refresh daemon");
                            break;
                        }
                        Err(e) => warn!(error = %e, "Hot-path refresh failed"),
                    }
                }
            }
        }
    }
}
