//! Coalesced filesystem facade.
//!
//! [`Sfs`] wraps a [`FileSystem`] and routes lookups through one
//! [`PendingOperationRegistry`] per operation kind. Concurrent `exists`,
//! `stat` and `read` calls for the same path collapse into a single call on
//! the underlying filesystem. `open` and `close` pass straight through since
//! every caller needs its own descriptor.

use crate::coalesce::{
    OperationId, OperationKind, Outcome, PendingOperationRegistry, Registration, RegistryStats,
};
use crate::fs::capability::{FileStat, FileSystem, LocalFileSystem};
use crate::fs::FsError;
use bytes::Bytes;
use std::fs::{File, OpenOptions};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Filesystem facade that deduplicates concurrent identical operations.
pub struct Sfs {
    fs: Arc<dyn FileSystem>,
    exists: Arc<PendingOperationRegistry<bool>>,
    stat: Arc<PendingOperationRegistry<FileStat>>,
    read: Arc<PendingOperationRegistry<Bytes>>,
}

impl Sfs {
    /// Create a facade over the local disk.
    pub fn new() -> Self {
        Self::with_filesystem(Arc::new(LocalFileSystem::new()))
    }

    /// Create a facade over any filesystem implementation.
    pub fn with_filesystem(fs: Arc<dyn FileSystem>) -> Self {
        Self {
            fs,
            exists: Arc::new(PendingOperationRegistry::new()),
            stat: Arc::new(PendingOperationRegistry::new()),
            read: Arc::new(PendingOperationRegistry::new()),
        }
    }

    /// Check whether `path` exists, invoking `callback` with the outcome.
    ///
    /// Must be called from within a tokio runtime; outside one the callback
    /// receives [`FsError::Spawn`] immediately.
    pub fn exists_with<F>(&self, path: impl AsRef<Path>, callback: F) -> Registration
    where
        F: FnOnce(Outcome<bool>) + Send + 'static,
    {
        let path = path.as_ref().to_path_buf();
        let id = OperationId::new(OperationKind::Exists, &path);
        let fs = Arc::clone(&self.fs);

        self.exists.dispatch(id, Box::new(callback), move || async move {
            Ok(fs.exists(&path).await)
        })
    }

    /// Check whether `path` exists.
    pub async fn exists(&self, path: impl AsRef<Path>) -> Outcome<bool> {
        let path = path.as_ref().to_path_buf();
        let id = OperationId::new(OperationKind::Exists, &path);
        let fs = Arc::clone(&self.fs);

        self.exists
            .run(id, move || async move { Ok(fs.exists(&path).await) })
            .await
    }

    /// Blocking existence check.
    ///
    /// Not coalesced: a blocking caller holds its thread for the whole
    /// lookup, so there is nothing to share.
    pub fn exists_sync(&self, path: impl AsRef<Path>) -> bool {
        self.fs.exists_sync(path.as_ref())
    }

    /// Look up metadata for `path`.
    pub async fn stat(&self, path: impl AsRef<Path>) -> Outcome<FileStat> {
        let path = path.as_ref().to_path_buf();
        let id = OperationId::new(OperationKind::Stat, &path);
        let fs = Arc::clone(&self.fs);

        self.stat
            .run(id, move || async move { fs.stat(&path).await.map_err(FsError::from) })
            .await
    }

    /// Read the whole file at `path`.
    pub async fn read(&self, path: impl AsRef<Path>) -> Outcome<Bytes> {
        let path = path.as_ref().to_path_buf();
        let id = OperationId::new(OperationKind::Read, &path);
        let fs = Arc::clone(&self.fs);

        self.read
            .run(id, move || async move { fs.read(&path).await.map_err(FsError::from) })
            .await
    }

    /// Open `path` with the given options.
    pub fn open(&self, path: impl AsRef<Path>, options: &OpenOptions) -> Result<File, FsError> {
        Ok(self.fs.open(path.as_ref(), options)?)
    }

    /// Close a file returned by [`open`](Self::open).
    pub fn close(&self, file: File) -> Result<(), FsError> {
        Ok(self.fs.close(file)?)
    }

    /// Operations currently in flight, across all kinds.
    pub fn in_flight_count(&self) -> usize {
        self.exists.in_flight_count() + self.stat.in_flight_count() + self.read.in_flight_count()
    }

    /// Coalescing statistics for one kind of operation.
    pub fn stats(&self, kind: OperationKind) -> RegistryStats {
        match kind {
            OperationKind::Exists => self.exists.stats(),
            OperationKind::Stat => self.stat.stats(),
            OperationKind::Read => self.read.stats(),
        }
    }

    /// Logs coalescing statistics for every operation kind.
    pub fn log_stats(&self) {
        for kind in [OperationKind::Exists, OperationKind::Stat, OperationKind::Read] {
            let stats = self.stats(kind);
            info!(
                operation = %kind,
                total_requests = stats.total_requests,
                coalesced = stats.coalesced_requests,
                coalescing_ratio = format!("{:.1}%", stats.coalescing_ratio() * 100.0),
                "Filesystem coalescing statistics"
            );
        }
    }
}

impl Default for Sfs {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::FsFuture;
    use std::future::Future;
    use std::io;
    use std::pin::Pin;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tempfile::TempDir;

    /// Filesystem that counts calls and answers after a short delay.
    #[derive(Default)]
    struct SlowFileSystem {
        exists_calls: AtomicUsize,
        stat_calls: AtomicUsize,
        read_calls: AtomicUsize,
    }

    const DELAY: Duration = Duration::from_millis(20);

    impl FileSystem for SlowFileSystem {
        fn exists<'a>(&'a self, path: &'a Path) -> Pin<Box<dyn Future<Output = bool> + Send + 'a>> {
            Box::pin(async move {
                self.exists_calls.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(DELAY).await;
                path.ends_with("present")
            })
        }

        fn exists_sync(&self, path: &Path) -> bool {
            self.exists_calls.fetch_add(1, Ordering::SeqCst);
            path.ends_with("present")
        }

        fn stat<'a>(&'a self, _path: &'a Path) -> FsFuture<'a, FileStat> {
            Box::pin(async move {
                self.stat_calls.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(DELAY).await;
                Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied"))
            })
        }

        fn read<'a>(&'a self, path: &'a Path) -> FsFuture<'a, Bytes> {
            Box::pin(async move {
                self.read_calls.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(DELAY).await;
                Ok(Bytes::from(path.display().to_string()))
            })
        }

        fn open(&self, _path: &Path, _options: &OpenOptions) -> io::Result<File> {
            Err(io::Error::new(io::ErrorKind::Unsupported, "no descriptors"))
        }

        fn close(&self, _file: File) -> io::Result<()> {
            Ok(())
        }
    }

    fn slow() -> (Arc<SlowFileSystem>, Sfs) {
        let fs = Arc::new(SlowFileSystem::default());
        let sfs = Sfs::with_filesystem(Arc::clone(&fs) as Arc<dyn FileSystem>);
        (fs, sfs)
    }

    #[tokio::test]
    async fn test_concurrent_exists_share_one_check() {
        let (fs, sfs) = slow();

        let checks = (0..25).map(|_| sfs.exists("/srv/present"));
        let results = futures::future::join_all(checks).await;

        assert_eq!(fs.exists_calls.load(Ordering::SeqCst), 1);
        assert!(results.iter().all(|r| matches!(r, Ok(true))));
        assert_eq!(sfs.in_flight_count(), 0);

        let stats = sfs.stats(OperationKind::Exists);
        assert_eq!(stats.total_requests, 25);
        assert_eq!(stats.coalesced_requests, 24);
    }

    #[tokio::test]
    async fn test_different_paths_are_isolated() {
        let (fs, sfs) = slow();

        let (a, b) = tokio::join!(sfs.exists("/srv/present"), sfs.exists("/srv/absent"));

        assert_eq!(fs.exists_calls.load(Ordering::SeqCst), 2);
        assert!(matches!(a, Ok(true)));
        assert!(matches!(b, Ok(false)));
    }

    #[tokio::test]
    async fn test_sequential_calls_are_not_coalesced() {
        let (fs, sfs) = slow();

        sfs.exists("/srv/present").await.unwrap();
        sfs.exists("/srv/present").await.unwrap();

        assert_eq!(fs.exists_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_exists_with_callbacks() {
        let (fs, sfs) = slow();
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();

        let mut registrations = Vec::new();
        for i in 0..3 {
            let tx = tx.clone();
            registrations.push(sfs.exists_with("/srv/present", move |outcome| {
                let _ = tx.send((i, outcome));
            }));
        }
        drop(tx);

        assert_eq!(
            registrations,
            vec![
                Registration::Initiated,
                Registration::Coalesced,
                Registration::Coalesced
            ]
        );

        let mut received = Vec::new();
        while let Some((i, outcome)) = rx.recv().await {
            assert!(matches!(outcome, Ok(true)));
            received.push(i);
        }
        assert_eq!(received, vec![0, 1, 2]);
        assert_eq!(fs.exists_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_exists_with_outside_runtime_reports_error() {
        let (_fs, sfs) = slow();
        let result = Arc::new(parking_lot::Mutex::new(None));

        let r = Arc::clone(&result);
        sfs.exists_with("/srv/present", move |outcome| *r.lock() = Some(outcome));

        assert!(matches!(*result.lock(), Some(Err(FsError::Spawn(_)))));
        assert_eq!(sfs.in_flight_count(), 0);
    }

    #[tokio::test]
    async fn test_stat_error_reaches_every_waiter() {
        let (fs, sfs) = slow();

        let results = futures::future::join_all((0..4).map(|_| sfs.stat("/srv/locked"))).await;

        assert_eq!(fs.stat_calls.load(Ordering::SeqCst), 1);
        let errors: Vec<_> = results.into_iter().map(|r| r.unwrap_err()).collect();
        for err in &errors {
            assert_eq!(err.kind(), Some(io::ErrorKind::PermissionDenied));
        }
        // Every waiter sees the very same failure
        match (&errors[0], &errors[3]) {
            (FsError::Io(a), FsError::Io(b)) => assert!(Arc::ptr_eq(a, b)),
            _ => panic!("Expected I/O errors"),
        }
    }

    #[tokio::test]
    async fn test_concurrent_reads_share_buffer() {
        let (fs, sfs) = slow();

        let (a, b) = tokio::join!(sfs.read("/srv/file"), sfs.read("/srv/file"));

        assert_eq!(fs.read_calls.load(Ordering::SeqCst), 1);
        assert_eq!(a.unwrap(), b.unwrap());
    }

    #[tokio::test]
    async fn test_kinds_do_not_share_queues() {
        let (fs, sfs) = slow();

        let (exists, read) = tokio::join!(sfs.exists("/srv/present"), sfs.read("/srv/present"));

        assert!(exists.is_ok());
        assert!(read.is_ok());
        assert_eq!(fs.exists_calls.load(Ordering::SeqCst), 1);
        assert_eq!(fs.read_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_exists_sync_passes_through() {
        let (fs, sfs) = slow();
        assert!(sfs.exists_sync("/srv/present"));
        assert!(!sfs.exists_sync("/srv/absent"));
        assert_eq!(fs.exists_calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_open_error_surfaces() {
        let (_fs, sfs) = slow();
        let err = sfs.open("/srv/file", &OpenOptions::new()).unwrap_err();
        assert_eq!(err.kind(), Some(io::ErrorKind::Unsupported));
    }

    #[tokio::test]
    async fn test_local_disk() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("index.html");
        std::fs::write(&path, b"<html></html>").unwrap();

        let sfs = Sfs::new();
        assert!(sfs.exists(&path).await.unwrap());
        assert!(!sfs.exists(dir.path().join("gone")).await.unwrap());
        assert!(sfs.exists_sync(&path));
        assert_eq!(sfs.stat(&path).await.unwrap().len, 13);
        assert_eq!(sfs.read(&path).await.unwrap(), Bytes::from_static(b"<html></html>"));

        let err = sfs.read(dir.path().join("gone")).await.unwrap_err();
        assert!(err.is_not_found());

        let mut options = OpenOptions::new();
        options.read(true);
        let file = sfs.open(&path, &options).unwrap();
        sfs.close(file).unwrap();
    }
}
