//! Logical files: content parts, fingerprints and request counters.

mod fingerprint;
mod record;

pub use fingerprint::Fingerprint;
pub(crate) use record::RecordOwner;
pub use record::{ContentEvent, FileRecord, Mutation, RecordError, RecordId};
