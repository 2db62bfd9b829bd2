use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::warn;

use super::{SermonStore, Snapshot, SnapshotCallback, Subscription};
use crate::error::Result;
use crate::model::{is_provisional_id, Sermon, SermonFields};
use crate::store::local::LocalStore;

/// Most records accepted by a single [`SermonStore::import_json`] call on the
/// remote path. Records beyond the cap are silently dropped — a documented
/// limit, not an error.
pub const IMPORT_BATCH_CAP: usize = 50;

/// One delivery from a live collection query.
pub enum WatchEvent {
    /// The full collection, ordered by `date` descending, emitted on attach
    /// and after every server-side change.
    Snapshot(Snapshot),
    /// The stream failed. No further events follow.
    Error(String),
}

pub type WatchListener = Box<dyn Fn(WatchEvent) + Send + Sync>;

/// Client-side view of the cloud document collection.
///
/// The document identifier lives outside the body: `add` lets the server mint
/// a permanent id, `set` fully replaces the body at an existing id. A real
/// network client is supplied by the embedding application;
/// [`memory::MemoryCollection`](super::memory::MemoryCollection) is the
/// in-process implementation used by tests and demos.
pub trait DocumentCollection: Send + Sync {
    /// Create a document; the returned id is server-assigned and never
    /// purely numeric.
    fn add(&self, fields: &SermonFields) -> Result<String>;

    /// Full-field replace of the document at `id`.
    fn set(&self, id: &str, fields: &SermonFields) -> Result<()>;

    fn delete(&self, id: &str) -> Result<()>;

    /// Open a live query ordered by `date` descending. The listener receives
    /// a snapshot immediately and after every change; dropping the returned
    /// handle tears the query down.
    fn watch(&self, listener: WatchListener) -> Result<Subscription>;
}

impl DocumentCollection for Box<dyn DocumentCollection> {
    fn add(&self, fields: &SermonFields) -> Result<String> {
        (**self).add(fields)
    }

    fn set(&self, id: &str, fields: &SermonFields) -> Result<()> {
        (**self).set(id, fields)
    }

    fn delete(&self, id: &str) -> Result<()> {
        (**self).delete(id)
    }

    fn watch(&self, listener: WatchListener) -> Result<Subscription> {
        (**self).watch(listener)
    }
}

/// Sermon persistence backed by a cloud document collection, with the local
/// store as a degraded read fallback when the live query fails.
pub struct RemoteStore<C: DocumentCollection> {
    collection: C,
    fallback: LocalStore,
}

impl<C: DocumentCollection> RemoteStore<C> {
    pub fn new(collection: C, fallback: LocalStore) -> Self {
        Self {
            collection,
            fallback,
        }
    }

    fn fallback_snapshot(&self) -> Snapshot {
        self.fallback.read_all().unwrap_or_else(|e| {
            warn!(error = %e, "local fallback read failed after remote error");
            Vec::new()
        })
    }
}

impl<C: DocumentCollection> SermonStore for RemoteStore<C> {
    fn subscribe(&self, callback: SnapshotCallback) -> Subscription {
        let callback: Arc<dyn Fn(Snapshot) + Send + Sync> = Arc::from(callback);

        // Set once the stream errors; remote delivery stops for good until
        // the caller re-subscribes.
        let degraded = Arc::new(AtomicBool::new(false));

        let cb = Arc::clone(&callback);
        let dead = Arc::clone(&degraded);
        let fallback = self.fallback.clone();
        let watch = self.collection.watch(Box::new(move |event| {
            if dead.load(Ordering::SeqCst) {
                return;
            }
            match event {
                WatchEvent::Snapshot(snapshot) => cb(snapshot),
                WatchEvent::Error(reason) => {
                    warn!(%reason, "remote subscription failed, delivering local fallback");
                    dead.store(true, Ordering::SeqCst);
                    let snapshot = fallback.read_all().unwrap_or_else(|e| {
                        warn!(error = %e, "local fallback read failed after remote error");
                        Vec::new()
                    });
                    cb(snapshot);
                }
            }
        }));

        match watch {
            Ok(mut handle) => Subscription::new(move || {
                degraded.store(true, Ordering::SeqCst);
                handle.unsubscribe();
            }),
            Err(e) => {
                warn!(error = %e, "could not open remote subscription, delivering local fallback");
                callback(self.fallback_snapshot());
                Subscription::detached()
            }
        }
    }

    fn save(&self, sermon: &Sermon) -> Result<()> {
        let fields = sermon.clone().into_fields();
        if is_provisional_id(&sermon.id) {
            // First remote save: always an add. The server assigns the
            // permanent id and the provisional one is discarded, so callers
            // must not rely on id stability across this call.
            self.collection.add(&fields)?;
        } else {
            self.collection.set(&sermon.id, &fields)?;
        }
        Ok(())
    }

    fn delete(&self, id: &str) -> Result<()> {
        self.collection.delete(id)
    }

    /// Add every array element as a new document (any `id` field stripped,
    /// server assigns one), capped at [`IMPORT_BATCH_CAP`]. Each add is an
    /// independent write: a mid-batch failure leaves prior adds committed and
    /// is logged rather than reported per record.
    fn import_json(&self, raw: &str) -> Result<bool> {
        let parsed: serde_json::Value = match serde_json::from_str(raw) {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, "import rejected: payload is not valid JSON");
                return Ok(false);
            }
        };
        let items = match parsed {
            serde_json::Value::Array(items) => items,
            _ => {
                warn!("import rejected: top-level JSON value is not an array");
                return Ok(false);
            }
        };

        for mut item in items.into_iter().take(IMPORT_BATCH_CAP) {
            if let Some(object) = item.as_object_mut() {
                object.remove("id");
            }
            let fields: SermonFields = match serde_json::from_value(item) {
                Ok(fields) => fields,
                Err(e) => {
                    warn!(error = %e, "skipping malformed record in import batch");
                    continue;
                }
            };
            if let Err(e) = self.collection.add(&fields) {
                warn!(error = %e, "import batch write failed, prior records remain committed");
            }
        }

        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryCollection;
    use std::sync::Mutex;

    fn fallback_in(dir: &tempfile::TempDir) -> LocalStore {
        LocalStore::new(dir.path().join("fallback.json"))
    }

    fn sermon(id: &str, date: &str) -> Sermon {
        Sermon {
            id: id.into(),
            title: format!("Sermon {id}"),
            preacher: "Rev. David Jenkins".into(),
            series: "Unshakeable".into(),
            date: date.into(),
            scripture: "Romans 8".into(),
            description: String::new(),
            audio_url: "https://example.com/s.mp3".into(),
            duration: None,
            tags: vec![],
        }
    }

    #[test]
    fn provisional_save_is_an_add_never_an_update() {
        let dir = tempfile::tempdir().unwrap();
        let collection = MemoryCollection::new();
        let store = RemoteStore::new(collection.clone(), fallback_in(&dir));

        store.save(&sermon("1700000000000", "2024-01-07")).unwrap();

        let ids = collection.document_ids();
        assert_eq!(ids.len(), 1);
        // The provisional id was discarded in favor of a server-assigned one.
        assert!(!ids.contains(&"1700000000000".to_string()));
        assert!(!is_provisional_id(&ids[0]));
    }

    #[test]
    fn permanent_save_updates_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let collection = MemoryCollection::new();
        let store = RemoteStore::new(collection.clone(), fallback_in(&dir));

        store.save(&sermon("1700000000000", "2024-01-07")).unwrap();
        let id = collection.document_ids().remove(0);

        let mut updated = sermon(&id, "2024-01-07");
        updated.title = "Revised".into();
        store.save(&updated).unwrap();

        assert_eq!(collection.document_ids().len(), 1);
        let snapshot = collection.snapshot();
        assert_eq!(snapshot[0].title, "Revised");
    }

    #[test]
    fn subscription_delivers_snapshots_ordered_by_date_descending() {
        let dir = tempfile::tempdir().unwrap();
        let collection = MemoryCollection::new();
        let store = RemoteStore::new(collection.clone(), fallback_in(&dir));

        store.save(&sermon("100", "2023-05-01")).unwrap();
        store.save(&sermon("200", "2024-01-01")).unwrap();
        store.save(&sermon("300", "2023-11-12")).unwrap();

        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = Arc::clone(&seen);
        let mut sub = store.subscribe(Box::new(move |snapshot| {
            s.lock().unwrap().push(snapshot);
        }));

        let snapshots = seen.lock().unwrap();
        let latest = snapshots.last().unwrap();
        let dates: Vec<&str> = latest.iter().map(|s| s.date.as_str()).collect();
        assert_eq!(dates, vec!["2024-01-01", "2023-11-12", "2023-05-01"]);
        drop(snapshots);
        sub.unsubscribe();
    }

    #[test]
    fn stream_error_falls_back_to_local_snapshot_once() {
        let dir = tempfile::tempdir().unwrap();
        let fallback = fallback_in(&dir);
        // Seed the fallback so the degraded snapshot is non-empty.
        fallback.read_all().unwrap();

        let collection = MemoryCollection::new();
        let store = RemoteStore::new(collection.clone(), fallback);
        store.save(&sermon("100", "2024-03-03")).unwrap();

        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = Arc::clone(&seen);
        let _sub = store.subscribe(Box::new(move |snapshot| {
            s.lock().unwrap().push(snapshot);
        }));

        collection.fail_stream("connection reset");
        // Further remote activity must not reach the dead subscription.
        store.save(&sermon("200", "2024-04-04")).unwrap();

        let snapshots = seen.lock().unwrap();
        let last = snapshots.last().unwrap();
        assert!(!last.is_empty());
        // The final delivery is the local seed, not remote data.
        assert!(last.iter().all(|s| s.id == "1" || s.id == "2"));
    }

    #[test]
    fn unsubscribed_callback_hears_nothing_further() {
        let dir = tempfile::tempdir().unwrap();
        let collection = MemoryCollection::new();
        let store = RemoteStore::new(collection.clone(), fallback_in(&dir));

        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = Arc::clone(&seen);
        let mut sub = store.subscribe(Box::new(move |snapshot| {
            s.lock().unwrap().push(snapshot);
        }));
        sub.unsubscribe();

        let before = seen.lock().unwrap().len();
        store.save(&sermon("100", "2024-05-05")).unwrap();
        assert_eq!(seen.lock().unwrap().len(), before);
    }

    #[test]
    fn import_rejects_non_array_without_writes() {
        let dir = tempfile::tempdir().unwrap();
        let collection = MemoryCollection::new();
        let store = RemoteStore::new(collection.clone(), fallback_in(&dir));

        assert!(!store.import_json("{}").unwrap());
        assert!(!store.import_json("oops").unwrap());
        assert!(collection.document_ids().is_empty());
    }

    #[test]
    fn import_caps_the_batch_and_strips_ids() {
        let dir = tempfile::tempdir().unwrap();
        let collection = MemoryCollection::new();
        let store = RemoteStore::new(collection.clone(), fallback_in(&dir));

        let records: Vec<Sermon> = (0..60)
            .map(|i| sermon(&i.to_string(), "2024-01-01"))
            .collect();
        let raw = serde_json::to_string(&records).unwrap();

        assert!(store.import_json(&raw).unwrap());
        let ids = collection.document_ids();
        assert_eq!(ids.len(), IMPORT_BATCH_CAP);
        assert!(ids.iter().all(|id| !is_provisional_id(id)));
    }
}
