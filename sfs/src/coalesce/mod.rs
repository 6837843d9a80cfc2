//! Request coalescing for filesystem operations.
//!
//! Concurrent callers asking for the same operation on the same path share
//! a single execution: one caller starts the work, the rest are queued and
//! all of them receive the identical outcome.

mod identity;
mod registry;

pub use identity::{OperationId, OperationKind};
pub use registry::{
    Completion, Outcome, PendingOperationRegistry, Registration, RegistryStats, Waiter,
};
