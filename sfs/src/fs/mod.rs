//! Filesystem access.
//!
//! [`FileSystem`] is the capability the rest of the crate consumes;
//! [`LocalFileSystem`] implements it on the local disk. [`Sfs`] wraps any
//! implementation and coalesces concurrent identical lookups.

mod capability;
mod coalesced;
mod error;

pub use capability::{FileStat, FileSystem, FsFuture, LocalFileSystem};
pub use coalesced::Sfs;
pub use error::FsError;
