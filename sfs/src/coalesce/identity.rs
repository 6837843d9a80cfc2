//! Operation identities.
//!
//! Two calls are coalesced when they share an identity: the same kind of
//! operation against the same path. Each kind has a fixed tag derived from
//! its name, so identities are reproducible across calls and processes.

use crate::file::Fingerprint;
use std::fmt;
use std::path::{Path, PathBuf};

/// Logical filesystem operations that can be coalesced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    /// Existence check
    Exists,
    /// Metadata lookup
    Stat,
    /// Whole-file read
    Read,
}

impl OperationKind {
    /// Stable name of the operation.
    pub fn name(&self) -> &'static str {
        match self {
            OperationKind::Exists => "exists",
            OperationKind::Stat => "stat",
            OperationKind::Read => "read",
        }
    }

    /// Digest of the operation name, used as the identity tag.
    pub fn tag(&self) -> String {
        Fingerprint::of(self.name()).short().to_string()
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Identity of one logical operation: kind tag plus target path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OperationId {
    tag: String,
    path: PathBuf,
}

impl OperationId {
    /// Build the identity for `kind` against `path`.
    pub fn new(kind: OperationKind, path: impl AsRef<Path>) -> Self {
        Self {
            tag: kind.tag(),
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Target path of the operation.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.tag, self.path.display())
    }
}
