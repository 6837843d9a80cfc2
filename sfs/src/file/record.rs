//! File records.
//!
//! A [`FileRecord`] is one logical file tracked by a factory: an ordered
//! list of content parts, the fingerprint of their concatenation, and a
//! counter of how often the file has been served. Records never own their
//! factory; they hold a weak handle used to register concatenation results
//! and to announce their own destruction.

use crate::file::Fingerprint;
use bytes::{Bytes, BytesMut};
use parking_lot::RwLock;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{debug, trace};

/// Capacity of each record's event channel.
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Identifier of a record within its factory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId(u64);

impl RecordId {
    pub(crate) fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw numeric value.
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Content mutation applied to a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    /// Part appended
    Push,
    /// Part prepended
    Unshift,
    /// First part removed
    Shift,
    /// Last part removed
    Pop,
}

/// Event published to a record's subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentEvent {
    /// Contents were mutated; carries the recomputed fingerprint.
    Mutated {
        mutation: Mutation,
        fingerprint: Fingerprint,
    },
    /// The record was explicitly marked modified.
    Modified { fingerprint: Fingerprint },
    /// The record was destroyed.
    Destroyed,
}

/// Errors from record operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RecordError {
    #[error("File record {0} has been destroyed")]
    Destroyed(RecordId),

    #[error("File record {0} is no longer attached to a factory")]
    Detached(RecordId),
}

/// Owner side of the record back-reference.
pub(crate) trait RecordOwner: Send + Sync {
    /// Register a new record holding `parts`.
    fn adopt(&self, path: Option<PathBuf>, parts: Vec<Bytes>) -> Option<Arc<FileRecord>>;

    /// Forget the record with `id`.
    fn release(&self, id: RecordId);
}

struct Content {
    parts: Vec<Bytes>,
    fingerprint: Fingerprint,
}

impl Content {
    fn new(parts: Vec<Bytes>) -> Self {
        let fingerprint = Fingerprint::of_parts(&parts);
        Self { parts, fingerprint }
    }

    fn refresh(&mut self) -> Fingerprint {
        self.fingerprint = Fingerprint::of_parts(&self.parts);
        self.fingerprint.clone()
    }
}

/// One logical file and its content parts.
pub struct FileRecord {
    id: RecordId,
    path: Option<PathBuf>,
    content: RwLock<Content>,
    requested: AtomicU64,
    destroyed: AtomicBool,
    events: broadcast::Sender<ContentEvent>,
    owner: Weak<dyn RecordOwner>,
}

impl FileRecord {
    pub(crate) fn new(
        id: RecordId,
        path: Option<PathBuf>,
        parts: Vec<Bytes>,
        owner: Weak<dyn RecordOwner>,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            id,
            path,
            content: RwLock::new(Content::new(parts)),
            requested: AtomicU64::new(0),
            destroyed: AtomicBool::new(false),
            events,
            owner,
        }
    }

    pub fn id(&self) -> RecordId {
        self.id
    }

    /// Location the record was loaded from, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Fingerprint of the current contents.
    pub fn fingerprint(&self) -> Fingerprint {
        self.content.read().fingerprint.clone()
    }

    /// How many times the record has been served.
    pub fn requested(&self) -> u64 {
        self.requested.load(Ordering::Relaxed)
    }

    /// Number of content parts.
    pub fn part_count(&self) -> usize {
        self.content.read().parts.len()
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::Acquire)
    }

    /// Receive content events for this record.
    pub fn subscribe(&self) -> broadcast::Receiver<ContentEvent> {
        self.events.subscribe()
    }

    /// Append a part.
    pub fn push(&self, part: impl Into<Bytes>) -> Result<&Self, RecordError> {
        let part = part.into();
        self.mutate(Mutation::Push, |parts| {
            parts.push(part);
            Some(())
        })?;
        Ok(self)
    }

    /// Prepend a part.
    pub fn unshift(&self, part: impl Into<Bytes>) -> Result<&Self, RecordError> {
        let part = part.into();
        self.mutate(Mutation::Unshift, |parts| {
            parts.insert(0, part);
            Some(())
        })?;
        Ok(self)
    }

    /// Remove and return the first part.
    pub fn shift(&self) -> Result<Option<Bytes>, RecordError> {
        self.mutate(Mutation::Shift, |parts| {
            if parts.is_empty() {
                None
            } else {
                Some(parts.remove(0))
            }
        })
    }

    /// Remove and return the last part.
    pub fn pop(&self) -> Result<Option<Bytes>, RecordError> {
        self.mutate(Mutation::Pop, |parts| parts.pop())
    }

    /// Recompute the fingerprint after an out-of-band change.
    pub fn modified(&self) -> Result<Fingerprint, RecordError> {
        self.ensure_live()?;
        let fingerprint = self.content.write().refresh();
        let _ = self.events.send(ContentEvent::Modified {
            fingerprint: fingerprint.clone(),
        });
        Ok(fingerprint)
    }

    /// Snapshot of the content parts.
    pub fn parts(&self) -> Result<Vec<Bytes>, RecordError> {
        self.ensure_live()?;
        Ok(self.content.read().parts.clone())
    }

    /// Compiled contents: every part concatenated in order.
    pub fn buffer(&self) -> Result<Bytes, RecordError> {
        self.ensure_live()?;
        let content = self.content.read();
        Ok(compile(&content.parts))
    }

    /// Serve the record: count the request and return the compiled contents.
    pub fn forward(&self) -> Result<Bytes, RecordError> {
        let buffer = self.buffer()?;
        self.mark_requested();
        Ok(buffer)
    }

    /// Concatenate `others` onto this record's contents as a new record.
    ///
    /// The new record is registered with the same factory. This record and
    /// every argument are destroyed afterwards.
    pub fn concat(&self, others: &[&FileRecord]) -> Result<Arc<FileRecord>, RecordError> {
        self.ensure_live()?;
        for other in others {
            other.ensure_live()?;
        }
        let owner = self.owner.upgrade().ok_or(RecordError::Detached(self.id))?;

        let mut parts = self.content.read().parts.clone();
        for other in others {
            parts.extend(other.content.read().parts.iter().cloned());
        }

        let combined = owner
            .adopt(None, parts)
            .ok_or(RecordError::Detached(self.id))?;

        let fingerprint = combined.fingerprint();
        debug!(
            record = %combined.id,
            sources = others.len() + 1,
            fingerprint = fingerprint.short(),
            "Concatenated file records"
        );

        for other in others {
            other.destroy();
        }
        self.destroy();

        Ok(combined)
    }

    /// Destroy the record and detach it from its factory.
    ///
    /// Returns `false` if it was already destroyed. The hot-path cache is
    /// left untouched.
    pub fn destroy(&self) -> bool {
        if self.destroyed.swap(true, Ordering::AcqRel) {
            return false;
        }

        self.content.write().parts.clear();
        let _ = self.events.send(ContentEvent::Destroyed);
        if let Some(owner) = self.owner.upgrade() {
            owner.release(self.id);
        }
        trace!(record = %self.id, "File record destroyed");
        true
    }

    /// Fingerprint and compiled contents read under one lock.
    pub(crate) fn snapshot(&self) -> Result<(Fingerprint, Bytes), RecordError> {
        self.ensure_live()?;
        let content = self.content.read();
        Ok((content.fingerprint.clone(), compile(&content.parts)))
    }

    pub(crate) fn mark_requested(&self) {
        self.requested.fetch_add(1, Ordering::Relaxed);
    }

    fn ensure_live(&self) -> Result<(), RecordError> {
        if self.is_destroyed() {
            Err(RecordError::Destroyed(self.id))
        } else {
            Ok(())
        }
    }

    fn mutate<R>(
        &self,
        mutation: Mutation,
        apply: impl FnOnce(&mut Vec<Bytes>) -> Option<R>,
    ) -> Result<Option<R>, RecordError> {
        self.ensure_live()?;

        let (result, fingerprint) = {
            let mut content = self.content.write();
            match apply(&mut content.parts) {
                Some(result) => (result, content.refresh()),
                None => return Ok(None),
            }
        };

        let _ = self.events.send(ContentEvent::Mutated {
            mutation,
            fingerprint,
        });
        Ok(Some(result))
    }
}

impl fmt::Debug for FileRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileRecord")
            .field("id", &self.id)
            .field("path", &self.path)
            .field("fingerprint", &self.fingerprint())
            .field("requested", &self.requested())
            .field("destroyed", &self.is_destroyed())
            .finish()
    }
}

fn compile(parts: &[Bytes]) -> Bytes {
    match parts {
        [] => Bytes::new(),
        [single] => single.clone(),
        _ => {
            let total = parts.iter().map(Bytes::len).sum();
            let mut buffer = BytesMut::with_capacity(total);
            for part in parts {
                buffer.extend_from_slice(part);
            }
            buffer.freeze()
        }
    }
}
