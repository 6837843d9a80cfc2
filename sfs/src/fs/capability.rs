//! The filesystem operations the core depends on.
//!
//! This is the complete list; anything else a host application needs from
//! the filesystem it calls directly.

use bytes::Bytes;
use std::fs::{File, Metadata, OpenOptions};
use std::future::Future;
use std::io;
use std::path::Path;
use std::pin::Pin;
use std::time::SystemTime;

/// Boxed future returned by asynchronous filesystem operations.
pub type FsFuture<'a, T> = Pin<Box<dyn Future<Output = io::Result<T>> + Send + 'a>>;

/// Metadata snapshot for a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileStat {
    /// Size in bytes
    pub len: u64,
    pub is_file: bool,
    pub is_dir: bool,
    /// Last modification time, where the platform reports one
    pub modified: Option<SystemTime>,
}

impl From<&Metadata> for FileStat {
    fn from(metadata: &Metadata) -> Self {
        Self {
            len: metadata.len(),
            is_file: metadata.is_file(),
            is_dir: metadata.is_dir(),
            modified: metadata.modified().ok(),
        }
    }
}

/// Filesystem capability consumed by the coalescing layer.
pub trait FileSystem: Send + Sync {
    /// Check whether `path` exists. Any lookup failure counts as absent.
    fn exists<'a>(&'a self, path: &'a Path) -> Pin<Box<dyn Future<Output = bool> + Send + 'a>>;

    /// Blocking variant of [`exists`](Self::exists).
    fn exists_sync(&self, path: &Path) -> bool;

    /// Look up metadata for `path`.
    fn stat<'a>(&'a self, path: &'a Path) -> FsFuture<'a, FileStat>;

    /// Read the whole file at `path`.
    fn read<'a>(&'a self, path: &'a Path) -> FsFuture<'a, Bytes>;

    /// Open `path` with the given options.
    fn open(&self, path: &Path, options: &OpenOptions) -> io::Result<File>;

    /// Close a file previously returned by [`open`](Self::open).
    fn close(&self, file: File) -> io::Result<()>;
}

/// [`FileSystem`] backed by the local disk through `tokio::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFileSystem;

impl LocalFileSystem {
    pub fn new() -> Self {
        Self
    }
}

impl FileSystem for LocalFileSystem {
    fn exists<'a>(&'a self, path: &'a Path) -> Pin<Box<dyn Future<Output = bool> + Send + 'a>> {
        Box::pin(async move { tokio::fs::metadata(path).await.is_ok() })
    }

    fn exists_sync(&self, path: &Path) -> bool {
        std::fs::metadata(path).is_ok()
    }

    fn stat<'a>(&'a self, path: &'a Path) -> FsFuture<'a, FileStat> {
        Box::pin(async move {
            let metadata = tokio::fs::metadata(path).await?;
            Ok(FileStat::from(&metadata))
        })
    }

    fn read<'a>(&'a self, path: &'a Path) -> FsFuture<'a, Bytes> {
        Box::pin(async move { tokio::fs::read(path).await.map(Bytes::from) })
    }

    fn open(&self, path: &Path, options: &OpenOptions) -> io::Result<File> {
        options.open(path)
    }

    fn close(&self, file: File) -> io::Result<()> {
        // Release happens on drop; flush metadata first so errors surface here
        let result = file.sync_all();
        drop(file);
        match result {
            // Read-only handles cannot be synced on some platforms
            Err(e) if e.kind() == io::ErrorKind::PermissionDenied => Ok(()),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_exists() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("present.txt");
        std::fs::write(&path, b"here").unwrap();

        let fs = LocalFileSystem::new();
        assert!(fs.exists(&path).await);
        assert!(!fs.exists(&dir.path().join("gone.txt")).await);
        assert!(fs.exists_sync(&path));
        assert!(!fs.exists_sync(&dir.path().join("gone.txt")));
    }

    #[tokio::test]
    async fn test_stat() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("file.bin");
        std::fs::write(&path, vec![0u8; 42]).unwrap();

        let fs = LocalFileSystem::new();
        let stat = fs.stat(&path).await.unwrap();
        assert_eq!(stat.len, 42);
        assert!(stat.is_file);
        assert!(!stat.is_dir);

        let dir_stat = fs.stat(dir.path()).await.unwrap();
        assert!(dir_stat.is_dir);
    }

    #[tokio::test]
    async fn test_stat_missing_is_not_found() {
        let dir = TempDir::new().unwrap();
        let err = LocalFileSystem::new()
            .stat(&dir.path().join("missing"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_read() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("file.txt");
        std::fs::write(&path, b"contents").unwrap();

        let data = LocalFileSystem::new().read(&path).await.unwrap();
        assert_eq!(data, Bytes::from_static(b"contents"));
    }

    #[test]
    fn test_open_and_close() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("new.txt");

        let fs = LocalFileSystem::new();
        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        let file = fs.open(&path, &options).unwrap();
        fs.close(file).unwrap();

        assert!(path.exists());
    }

    #[test]
    fn test_open_missing_fails() {
        let dir = TempDir::new().unwrap();
        let mut options = OpenOptions::new();
        options.read(true);
        let err = LocalFileSystem::new()
            .open(&dir.path().join("missing"), &options)
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
