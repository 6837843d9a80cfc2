//! Registry of in-flight filesystem operations.
//!
//! # Architecture
//!
//! ```text
//! exists("/a") ─┐
//!               │                                   FileSystem
//! exists("/a") ─┼──► PendingOperationRegistry ─────► (one call)
//!               │         │                              │
//! exists("/a") ─┘         │                              │
//!                         ▼                              ▼
//!                  [all three waiters            complete(id, outcome)
//!                   receive the same  ◄──────────────────┘
//!                   outcome, FIFO]
//! ```
//!
//! The first caller for an identity starts the real operation; everyone
//! arriving before it completes is queued behind it. Completion removes the
//! identity from the map before any waiter runs, so a waiter that issues
//! the same operation again starts fresh work instead of joining a queue
//! that is already being drained.

use crate::coalesce::identity::{OperationId, OperationKind};
use crate::fs::FsError;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::future::Future;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

/// Result shared by every waiter of one operation.
pub type Outcome<T> = Result<T, FsError>;

/// Completion callback queued for an operation.
pub type Waiter<T> = Box<dyn FnOnce(Outcome<T>) + Send + 'static>;

/// How a caller was registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    /// This caller started the underlying operation
    Initiated,
    /// An identical operation was already running; this caller waits on it
    Coalesced,
}

/// Statistics for monitoring coalescing effectiveness.
#[derive(Debug, Default, Clone)]
pub struct RegistryStats {
    /// Total requests received
    pub total_requests: u64,
    /// Requests that were coalesced (waited for existing work)
    pub coalesced_requests: u64,
    /// Requests that triggered new work
    pub new_requests: u64,
}

impl RegistryStats {
    /// Returns the coalescing ratio (0.0 to 1.0)
    pub fn coalescing_ratio(&self) -> f64 {
        if self.total_requests == 0 {
            0.0
        } else {
            self.coalesced_requests as f64 / self.total_requests as f64
        }
    }
}

/// Tracks in-flight operations and fans each completion out to its waiters.
pub struct PendingOperationRegistry<T> {
    /// In-flight operations: identity -> waiters in arrival order
    in_flight: Mutex<HashMap<OperationId, Vec<Waiter<T>>>>,
    total_requests: AtomicU64,
    coalesced_requests: AtomicU64,
    new_requests: AtomicU64,
}

impl<T> PendingOperationRegistry<T>
where
    T: Clone + Send + 'static,
{
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            in_flight: Mutex::new(HashMap::new()),
            total_requests: AtomicU64::new(0),
            coalesced_requests: AtomicU64::new(0),
            new_requests: AtomicU64::new(0),
        }
    }

    /// Identity of `kind` against `path`.
    pub fn identity_of(kind: OperationKind, path: impl AsRef<Path>) -> OperationId {
        OperationId::new(kind, path)
    }

    /// Queue `waiter` for `id`, starting the operation if none is running.
    ///
    /// `perform` is only invoked for the first caller of an identity. It must
    /// arrange for [`complete`](Self::complete) to be called eventually. If it
    /// returns an error (or panics) the identity is completed with that
    /// failure immediately so no waiter is left behind.
    pub fn enqueue_or_run<F>(&self, id: OperationId, waiter: Waiter<T>, perform: F) -> Registration
    where
        F: FnOnce() -> Result<(), FsError>,
    {
        self.total_requests.fetch_add(1, Ordering::Relaxed);

        {
            let mut in_flight = self.in_flight.lock();
            if let Some(waiters) = in_flight.get_mut(&id) {
                waiters.push(waiter);
                self.coalesced_requests.fetch_add(1, Ordering::Relaxed);
                debug!(
                    operation = %id,
                    waiters = waiters.len(),
                    "Coalescing request - waiting for in-flight operation"
                );
                return Registration::Coalesced;
            }

            in_flight.insert(id.clone(), vec![waiter]);
            self.new_requests.fetch_add(1, Ordering::Relaxed);
            debug!(
                operation = %id,
                in_flight_count = in_flight.len(),
                "New request - starting operation"
            );
        }

        // The lock is released so `perform` may complete synchronously.
        let guard = StartGuard {
            registry: self,
            id: &id,
            armed: true,
        };
        let started = perform();
        guard.disarm();

        if let Err(e) = started {
            warn!(operation = %id, error = %e, "Operation failed to start");
            self.complete(&id, Err(e));
        }

        Registration::Initiated
    }

    /// Complete `id`, handing `outcome` to every queued waiter in order.
    ///
    /// Returns the number of waiters notified; zero if `id` was not in
    /// flight.
    pub fn complete(&self, id: &OperationId, outcome: Outcome<T>) -> usize {
        let Some(waiters) = self.in_flight.lock().remove(id) else {
            return 0;
        };

        let count = waiters.len();
        for waiter in waiters {
            waiter(outcome.clone());
        }

        if count > 1 {
            debug!(
                operation = %id,
                waiters = count,
                "Delivered result to {} coalesced waiters",
                count
            );
        }
        count
    }

    /// Whether an operation for `id` is currently running.
    pub fn is_in_flight(&self, id: &OperationId) -> bool {
        self.in_flight.lock().contains_key(id)
    }

    /// Returns the number of currently in-flight operations.
    pub fn in_flight_count(&self) -> usize {
        self.in_flight.lock().len()
    }

    /// Returns a snapshot of the current statistics.
    pub fn stats(&self) -> RegistryStats {
        RegistryStats {
            total_requests: self.total_requests.load(Ordering::Relaxed),
            coalesced_requests: self.coalesced_requests.load(Ordering::Relaxed),
            new_requests: self.new_requests.load(Ordering::Relaxed),
        }
    }

    /// Logs current statistics.
    pub fn log_stats(&self) {
        let stats = self.stats();
        info!(
            total_requests = stats.total_requests,
            coalesced = stats.coalesced_requests,
            new_requests = stats.new_requests,
            in_flight = self.in_flight_count(),
            coalescing_ratio = format!("{:.1}%", stats.coalescing_ratio() * 100.0),
            "Request coalescing statistics"
        );
    }
}

impl<T> PendingOperationRegistry<T>
where
    T: Clone + Send + 'static,
{
    /// Queue `waiter` for `id`, spawning `operation` on the current tokio
    /// runtime if nothing is in flight for it.
    ///
    /// Fails every waiter with [`FsError::Spawn`] when called outside a
    /// runtime, and with [`FsError::Abandoned`] if the spawned task dies
    /// before producing an outcome.
    pub fn dispatch<F, Fut>(
        self: &Arc<Self>,
        id: OperationId,
        waiter: Waiter<T>,
        operation: F,
    ) -> Registration
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Outcome<T>> + Send + 'static,
    {
        let registry = Arc::clone(self);
        let task_id = id.clone();

        self.enqueue_or_run(id, waiter, move || {
            let handle = Handle::try_current().map_err(|e| FsError::Spawn(e.to_string()))?;
            let completion = Completion::new(registry, task_id);
            handle.spawn(async move {
                let outcome = operation().await;
                completion.complete(outcome);
            });
            Ok(())
        })
    }

    /// Await the shared outcome of `operation` for `id`.
    pub async fn run<F, Fut>(self: &Arc<Self>, id: OperationId, operation: F) -> Outcome<T>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Outcome<T>> + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        self.dispatch(
            id,
            Box::new(move |outcome| {
                // Receiver gone means the caller stopped waiting
                let _ = tx.send(outcome);
            }),
            operation,
        );
        rx.await.unwrap_or(Err(FsError::Abandoned))
    }
}

impl<T> Default for PendingOperationRegistry<T>
where
    T: Clone + Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Clears an identity if `perform` unwinds before returning.
struct StartGuard<'a, T>
where
    T: Clone + Send + 'static,
{
    registry: &'a PendingOperationRegistry<T>,
    id: &'a OperationId,
    armed: bool,
}

impl<T> StartGuard<'_, T>
where
    T: Clone + Send + 'static,
{
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl<T> Drop for StartGuard<'_, T>
where
    T: Clone + Send + 'static,
{
    fn drop(&mut self) {
        if self.armed {
            warn!(operation = %self.id, "Operation panicked while starting");
            self.registry.complete(self.id, Err(FsError::Abandoned));
        }
    }
}

/// Owned right to complete one in-flight operation.
///
/// Dropping it without calling [`complete`](Self::complete) completes the
/// operation with [`FsError::Abandoned`], so waiters are released even when
/// the task carrying it panics.
pub struct Completion<T>
where
    T: Clone + Send + 'static,
{
    registry: Arc<PendingOperationRegistry<T>>,
    id: Option<OperationId>,
}

impl<T> Completion<T>
where
    T: Clone + Send + 'static,
{
    /// Bind a completion to `id` in `registry`.
    pub fn new(registry: Arc<PendingOperationRegistry<T>>, id: OperationId) -> Self {
        Self {
            registry,
            id: Some(id),
        }
    }

    /// Complete the operation, returning the number of waiters notified.
    pub fn complete(mut self, outcome: Outcome<T>) -> usize {
        match self.id.take() {
            Some(id) => self.registry.complete(&id, outcome),
            None => 0,
        }
    }
}

impl<T> Drop for Completion<T>
where
    T: Clone + Send + 'static,
{
    fn drop(&mut self) {
        if let Some(id) = self.id.take() {
            warn!(operation = %id, "Operation dropped without completing");
            self.registry.complete(&id, Err(FsError::Abandoned));
        }
    }
}
