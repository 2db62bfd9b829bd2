use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use uuid::Uuid;

use super::remote::{DocumentCollection, WatchEvent, WatchListener};
use super::Subscription;
use crate::error::{PulpitError, Result};
use crate::model::{Sermon, SermonFields};

/// In-memory [`DocumentCollection`]: no network, no persistence.
///
/// Serves unit tests and demos the way a fixture server would — snapshots are
/// delivered ordered by `date` descending, ids are server-minted UUIDs, and
/// [`fail_stream`](Self::fail_stream) injects a stream error so degraded-path
/// behavior can be exercised.
#[derive(Clone)]
pub struct MemoryCollection {
    inner: Arc<Inner>,
}

struct Inner {
    documents: Mutex<HashMap<String, SermonFields>>,
    watchers: Mutex<HashMap<u64, Arc<WatchListener>>>,
    next_watcher: AtomicU64,
}

impl MemoryCollection {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                documents: Mutex::new(HashMap::new()),
                watchers: Mutex::new(HashMap::new()),
                next_watcher: AtomicU64::new(1),
            }),
        }
    }

    /// Current collection, ordered by `date` descending as the query would
    /// deliver it.
    pub fn snapshot(&self) -> Vec<Sermon> {
        let documents = self.inner.documents.lock().unwrap();
        let mut sermons: Vec<Sermon> = documents
            .iter()
            .map(|(id, fields)| Sermon::from_fields(id.clone(), fields.clone()))
            .collect();
        sermons.sort_by(|a, b| b.date.cmp(&a.date));
        sermons
    }

    pub fn document_ids(&self) -> Vec<String> {
        self.inner.documents.lock().unwrap().keys().cloned().collect()
    }

    /// Fail every open watch with `reason` and drop the watchers; the stream
    /// is dead until someone watches again.
    pub fn fail_stream(&self, reason: &str) {
        let watchers: Vec<Arc<WatchListener>> =
            self.inner.watchers.lock().unwrap().drain().map(|(_, w)| w).collect();
        for watcher in watchers {
            watcher(WatchEvent::Error(reason.to_string()));
        }
    }

    fn notify_all(&self) {
        let snapshot = self.snapshot();
        let watchers: Vec<Arc<WatchListener>> =
            self.inner.watchers.lock().unwrap().values().cloned().collect();
        for watcher in watchers {
            watcher(WatchEvent::Snapshot(snapshot.clone()));
        }
    }
}

impl Default for MemoryCollection {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentCollection for MemoryCollection {
    fn add(&self, fields: &SermonFields) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        self.inner
            .documents
            .lock()
            .unwrap()
            .insert(id.clone(), fields.clone());
        self.notify_all();
        Ok(id)
    }

    fn set(&self, id: &str, fields: &SermonFields) -> Result<()> {
        {
            let mut documents = self.inner.documents.lock().unwrap();
            if !documents.contains_key(id) {
                return Err(PulpitError::SermonNotFound(id.to_string()));
            }
            documents.insert(id.to_string(), fields.clone());
        }
        self.notify_all();
        Ok(())
    }

    fn delete(&self, id: &str) -> Result<()> {
        {
            let mut documents = self.inner.documents.lock().unwrap();
            if documents.remove(id).is_none() {
                return Err(PulpitError::SermonNotFound(id.to_string()));
            }
        }
        self.notify_all();
        Ok(())
    }

    fn watch(&self, listener: WatchListener) -> Result<Subscription> {
        let listener = Arc::new(listener);
        let id = self.inner.next_watcher.fetch_add(1, Ordering::SeqCst);
        self.inner
            .watchers
            .lock()
            .unwrap()
            .insert(id, Arc::clone(&listener));

        // Initial attach counts as a change.
        listener(WatchEvent::Snapshot(self.snapshot()));

        let inner = Arc::clone(&self.inner);
        Ok(Subscription::new(move || {
            inner.watchers.lock().unwrap().remove(&id);
        }))
    }
}
