//! Filesystem operation errors.

use std::io;
use std::sync::Arc;
use thiserror::Error;

/// Errors delivered to callers of coalesced filesystem operations.
///
/// Cloneable so a single failure can be handed to every coalesced waiter.
#[derive(Debug, Clone, Error)]
pub enum FsError {
    /// The underlying filesystem call failed
    #[error("I/O error: {0}")]
    Io(Arc<io::Error>),

    /// The task performing the operation went away without reporting a result
    #[error("Operation abandoned before completion")]
    Abandoned,

    /// The operation could not be started
    #[error("Failed to start operation: {0}")]
    Spawn(String),
}

impl FsError {
    /// The I/O error kind, if this is an I/O failure.
    pub fn kind(&self) -> Option<io::ErrorKind> {
        match self {
            FsError::Io(e) => Some(e.kind()),
            _ => None,
        }
    }

    /// Whether this error reports a missing file.
    pub fn is_not_found(&self) -> bool {
        self.kind() == Some(io::ErrorKind::NotFound)
    }
}

impl From<io::Error> for FsError {
    fn from(e: io::Error) -> Self {
        FsError::Io(Arc::new(e))
    }
}
