//! # Storage Layer
//!
//! The [`SermonStore`] trait is the uniform persistence contract the service
//! facade binds to exactly once, at construction. Which backend sits behind it
//! is invisible to every call site above.
//!
//! ## Implementations
//!
//! - [`local::LocalStore`]: on-device persistence — the whole collection as
//!   one JSON array in a single file, seeded on first run and self-healing on
//!   corruption.
//! - [`remote::RemoteStore`]: a cloud document collection reached through the
//!   [`remote::DocumentCollection`] client trait, with live change
//!   notifications and a degraded local fallback on stream errors.
//! - [`memory::MemoryCollection`]: an in-memory `DocumentCollection` for
//!   tests and demos — no network, fault injection on demand.
//!
//! ## Subscriptions
//!
//! `subscribe` hands the callback a full ordered [`Snapshot`] on attach and
//! after every observed change, and returns a [`Subscription`] guard.
//! Snapshots reach a given subscriber in the order the backend emits them;
//! nothing is guaranteed across independent subscriptions.

use crate::error::Result;
use crate::model::Sermon;

pub mod local;
pub mod memory;
pub mod remote;

/// The full collection as observed at one instant by a subscriber.
pub type Snapshot = Vec<Sermon>;

/// Callback receiving each snapshot delivered to a subscription.
pub type SnapshotCallback = Box<dyn Fn(Snapshot) + Send + Sync>;

/// Abstract interface over the active persistence backend.
pub trait SermonStore: Send + Sync {
    /// Deliver the current snapshot and every subsequent change to `callback`
    /// until the returned subscription is torn down.
    fn subscribe(&self, callback: SnapshotCallback) -> Subscription;

    /// Create or fully replace a sermon. No partial-field patching.
    fn save(&self, sermon: &Sermon) -> Result<()>;

    /// Delete by id. Backends differ on absent ids; see each implementation.
    fn delete(&self, id: &str) -> Result<()>;

    /// Import a JSON payload. `Ok(false)` means the payload was rejected
    /// (top-level value not an array) and nothing was mutated.
    fn import_json(&self, raw: &str) -> Result<bool>;
}

/// Teardown handle for an active subscription.
///
/// Calling [`unsubscribe`](Self::unsubscribe) more than once is a no-op, and
/// dropping the handle unsubscribes, so setup and teardown stay paired on
/// every code path.
pub struct Subscription {
    teardown: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new<F>(teardown: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            teardown: Some(Box::new(teardown)),
        }
    }

    /// A subscription that was never live (e.g. a watch that failed to open).
    pub fn detached() -> Self {
        Self { teardown: None }
    }

    pub fn unsubscribe(&mut self) {
        if let Some(teardown) = self.teardown.take() {
            teardown();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}
