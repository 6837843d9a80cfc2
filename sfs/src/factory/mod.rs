//! File factory.
//!
//! The [`FileFactory`] exclusively owns the set of live [`FileRecord`]s and
//! the single [`HotPathCache`] they are served from. Records keep a weak
//! handle back to the factory: concatenation registers its result here and
//! destruction removes the record from the live set.
//!
//! # Serving
//!
//! ```text
//! serve(fingerprint) ──► live record? ──no──► None
//!                            │
//!                           yes
//!                            ▼
//!                     hot-path hit? ──yes──► cached buffer
//!                            │
//!                            no
//!                            ▼
//!                     record.forward()
//! ```
//!
//! Every serve counts towards the record's `requested` counter, which is
//! what [`refresh`](FileFactory::refresh) ranks records by.

mod refresher;

pub use refresher::{RefreshDaemon, RefreshReport, DEFAULT_REFRESH_INTERVAL_SECS};

use crate::cache::{HotPathCache, HotPathConfig};
use crate::file::{FileRecord, Fingerprint, RecordId, RecordOwner};
use crate::fs::{FileSystem, FsError, Sfs};
use bytes::Bytes;
use dashmap::DashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Capacity of the factory event channel.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Factory construction settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FactoryConfig {
    /// Hot-path cache sizing.
    pub hotpath: HotPathConfig,
    /// Interval used by [`FileFactory::spawn_refresher`].
    pub refresh_interval: Duration,
}

impl FactoryConfig {
    pub fn new(hotpath: HotPathConfig) -> Self {
        Self {
            hotpath,
            ..Default::default()
        }
    }

    /// Sets the period of [`FileFactory::spawn_refresher`]. Zero keeps the
    /// default.
    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        if !interval.is_zero() {
            self.refresh_interval = interval;
        }
        self
    }
}

impl Default for FactoryConfig {
    fn default() -> Self {
        Self {
            hotpath: HotPathConfig::default(),
            refresh_interval: Duration::from_secs(DEFAULT_REFRESH_INTERVAL_SECS),
        }
    }
}

/// Record lifecycle notifications.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FactoryEvent {
    /// A record was registered.
    Added {
        id: RecordId,
        fingerprint: Fingerprint,
    },
    /// A record was destroyed and dropped from the live set.
    Removed { id: RecordId },
}

/// Errors from factory operations.
#[derive(Debug, Clone, Error)]
pub enum FactoryError {
    #[error("File factory has been destroyed")]
    Destroyed,

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: FsError,
    },
}

struct FactoryShared {
    me: Weak<FactoryShared>,
    records: DashMap<RecordId, Arc<FileRecord>>,
    cache: HotPathCache,
    sfs: Sfs,
    events: broadcast::Sender<FactoryEvent>,
    next_id: AtomicU64,
    refresh_lock: Mutex<()>,
    destroyed: AtomicBool,
    refresh_interval: Duration,
}

impl FactoryShared {
    fn register(&self, path: Option<PathBuf>, parts: Vec<Bytes>) -> Option<Arc<FileRecord>> {
        if self.destroyed.load(Ordering::Acquire) {
            return None;
        }

        let id = RecordId::new(self.next_id.fetch_add(1, Ordering::Relaxed));
        let owner: Weak<dyn RecordOwner> = self.me.clone();
        let record = Arc::new(FileRecord::new(id, path, parts, owner));
        let fingerprint = record.fingerprint();

        self.records.insert(id, Arc::clone(&record));
        debug!(
            record = %id,
            fingerprint = fingerprint.short(),
            live = self.records.len(),
            "File record registered"
        );
        let _ = self.events.send(FactoryEvent::Added { id, fingerprint });

        Some(record)
    }
}

impl RecordOwner for FactoryShared {
    fn adopt(&self, path: Option<PathBuf>, parts: Vec<Bytes>) -> Option<Arc<FileRecord>> {
        self.register(path, parts)
    }

    fn release(&self, id: RecordId) {
        if self.records.remove(&id).is_some() {
            debug!(record = %id, live = self.records.len(), "File record released");
            let _ = self.events.send(FactoryEvent::Removed { id });
        }
    }
}

/// Owner of the live file records and their hot-path cache.
///
/// Cloning is cheap; clones share the same records and cache.
#[derive(Clone)]
pub struct FileFactory {
    shared: Arc<FactoryShared>,
}

impl FileFactory {
    /// Create a factory reading from the local disk.
    pub fn new(config: FactoryConfig) -> Self {
        Self::with_sfs(config, Sfs::new())
    }

    /// Create a factory reading through `filesystem`.
    pub fn with_filesystem(config: FactoryConfig, filesystem: Arc<dyn FileSystem>) -> Self {
        Self::with_sfs(config, Sfs::with_filesystem(filesystem))
    }

    fn with_sfs(config: FactoryConfig, sfs: Sfs) -> Self {
        let cache = HotPathCache::new(config.hotpath);
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        let shared = Arc::new_cyclic(|me| FactoryShared {
            me: me.clone(),
            records: DashMap::new(),
            cache,
            sfs,
            events,
            next_id: AtomicU64::new(1),
            refresh_lock: Mutex::new(()),
            destroyed: AtomicBool::new(false),
            refresh_interval: config.refresh_interval,
        });

        Self { shared }
    }

    /// Register a record with the given content parts.
    pub fn create(
        &self,
        path: Option<PathBuf>,
        parts: Vec<Bytes>,
    ) -> Result<Arc<FileRecord>, FactoryError> {
        self.shared
            .register(path, parts)
            .ok_or(FactoryError::Destroyed)
    }

    /// Read `path` through the coalesced filesystem and register it.
    pub async fn load(&self, path: impl AsRef<Path>) -> Result<Arc<FileRecord>, FactoryError> {
        let path = path.as_ref();
        self.ensure_live()?;

        let data = self
            .shared
            .sfs
            .read(path)
            .await
            .map_err(|source| FactoryError::Read {
                path: path.to_path_buf(),
                source,
            })?;

        self.create(Some(path.to_path_buf()), vec![data])
    }

    pub fn get(&self, id: RecordId) -> Option<Arc<FileRecord>> {
        self.shared.records.get(&id).map(|entry| Arc::clone(entry.value()))
    }

    /// Live record whose contents have `fingerprint`.
    pub fn find(&self, fingerprint: &Fingerprint) -> Option<Arc<FileRecord>> {
        self.shared
            .records
            .iter()
            .find(|entry| entry.value().fingerprint() == *fingerprint)
            .map(|entry| Arc::clone(entry.value()))
    }

    /// Snapshot of the live records in registration order.
    pub fn records(&self) -> Vec<Arc<FileRecord>> {
        let mut records: Vec<_> = self
            .shared
            .records
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        records.sort_by_key(|record| record.id());
        records
    }

    pub fn len(&self) -> usize {
        self.shared.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shared.records.is_empty()
    }

    /// Serve the contents identified by `fingerprint`.
    ///
    /// Prefers the hot-path copy and falls back to compiling the record.
    /// Returns `None` when no live record has that fingerprint.
    pub fn serve(&self, fingerprint: &Fingerprint) -> Option<Bytes> {
        let record = self.find(fingerprint)?;

        if let Some(buffer) = self.shared.cache.get(fingerprint.as_str()) {
            record.mark_requested();
            return Some(buffer);
        }

        record.forward().ok()
    }

    pub fn cache(&self) -> &HotPathCache {
        &self.shared.cache
    }

    /// The coalesced filesystem records are loaded through.
    pub fn sfs(&self) -> &Sfs {
        &self.shared.sfs
    }

    /// Receive record lifecycle events.
    pub fn subscribe(&self) -> broadcast::Receiver<FactoryEvent> {
        self.shared.events.subscribe()
    }

    /// Rebuild the hot-path cache from the most requested records.
    ///
    /// Concurrent calls run one after another.
    pub async fn refresh(&self) -> Result<RefreshReport, FactoryError> {
        let _guard = self.shared.refresh_lock.lock().await;
        self.ensure_live()?;
        Ok(refresher::rebuild(&self.shared.cache, self.records()))
    }

    /// Spawn a [`RefreshDaemon`] using the configured interval.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn_refresher(&self, shutdown: CancellationToken) -> JoinHandle<()> {
        let daemon = RefreshDaemon::new(self.clone()).with_interval(self.shared.refresh_interval);
        tokio::spawn(daemon.run(shutdown))
    }

    /// Destroy every record, then the cache.
    ///
    /// Returns the number of records destroyed. Later calls are no-ops.
    pub fn destroy(&self) -> usize {
        if self.shared.destroyed.swap(true, Ordering::AcqRel) {
            return 0;
        }

        // Collected first: destroying a record re-enters the record map
        let records = self.records();
        let count = records.iter().filter(|record| record.destroy()).count();
        self.shared.cache.destroy();

        info!(records = count, "File factory destroyed");
        count
    }

    pub fn is_destroyed(&self) -> bool {
        self.shared.destroyed.load(Ordering::Acquire)
    }

    fn ensure_live(&self) -> Result<(), FactoryError> {
        if self.is_destroyed() {
            Err(FactoryError::Destroyed)
        } else {
            Ok(())
        }
    }
}
