//! Change notification channels for the local store.
//!
//! Two transports sit behind one subscription surface:
//!
//! - [`ChangeBus`]: an in-process listener registry. A writer announces its
//!   own mutations here so subscribers in this process hear them immediately
//!   rather than a poll tick later.
//! - [`FileWatcher`]: a polling thread that notices the store file changing —
//!   chiefly another process editing the same collection, though it also
//!   observes this process's writes a tick after the bus has delivered them.
//!   Subscribers may therefore see the same state twice; every delivery is a
//!   full re-read snapshot. Last write wins; there is no locking across
//!   processes.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::thread::{self, JoinHandle};
use std::time::{Duration, SystemTime};

use once_cell::sync::Lazy;
use tracing::warn;

pub type ListenerId = u64;

type Listener = Arc<dyn Fn(&Path) + Send + Sync>;

/// In-process announcement channel: a registry of callbacks keyed by a
/// monotonically increasing id, so removal is exact.
///
/// Announcements carry the store path that changed — like the browser
/// `storage` event carries its key — so subscribers watching one store are
/// not woken by writes to another.
pub struct ChangeBus {
    listeners: RwLock<HashMap<ListenerId, Listener>>,
    next_id: AtomicU64,
}

impl ChangeBus {
    pub fn new() -> Self {
        Self {
            listeners: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn subscribe<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&Path) + Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.listeners
            .write()
            .unwrap()
            .insert(id, Arc::new(listener));
        id
    }

    /// Removing an unknown id is a no-op, so teardown stays idempotent.
    pub fn unsubscribe(&self, id: ListenerId) {
        self.listeners.write().unwrap().remove(&id);
    }

    pub fn announce(&self, path: &Path) {
        // Snapshot the listeners first so a callback may subscribe or
        // unsubscribe without deadlocking on the registry lock.
        let current: Vec<Listener> = self.listeners.read().unwrap().values().cloned().collect();
        for listener in current {
            listener(path);
        }
    }

    #[cfg(test)]
    pub fn listener_count(&self) -> usize {
        self.listeners.read().unwrap().len()
    }
}

impl Default for ChangeBus {
    fn default() -> Self {
        Self::new()
    }
}

static SAME_PROCESS_BUS: Lazy<ChangeBus> = Lazy::new(ChangeBus::new);

/// The process-wide channel local-store mutations are announced on.
pub fn same_process_bus() -> &'static ChangeBus {
    &SAME_PROCESS_BUS
}

const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Watches the store file's modification time from a background thread and
/// invokes the callback when another process rewrites it.
pub struct FileWatcher {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl FileWatcher {
    pub fn spawn<F>(path: PathBuf, on_change: F) -> Self
    where
        F: Fn() + Send + 'static,
    {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = Arc::clone(&stop);

        let handle = thread::Builder::new()
            .name("pulpit-store-watcher".to_string())
            .spawn(move || {
                let mut last_seen = modified_at(&path);
                while !stop_flag.load(Ordering::Relaxed) {
                    thread::sleep(POLL_INTERVAL);
                    let current = modified_at(&path);
                    if current != last_seen {
                        last_seen = current;
                        on_change();
                    }
                }
            });

        // A spawn failure degrades to a watcherless subscription: same-process
        // announcements still flow, cross-process changes go unobserved.
        let handle = match handle {
            Ok(handle) => Some(handle),
            Err(e) => {
                warn!(error = %e, "could not spawn store watcher; changes from other processes will not be observed");
                None
            }
        };

        Self { stop, handle }
    }

    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for FileWatcher {
    fn drop(&mut self) {
        self.stop();
    }
}

fn modified_at(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}
