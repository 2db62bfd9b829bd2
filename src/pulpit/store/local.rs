use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use directories::ProjectDirs;
use tracing::{debug, warn};

use super::{SermonStore, SnapshotCallback, Subscription};
use crate::bus::{same_process_bus, FileWatcher};
use crate::error::{PulpitError, Result};
use crate::model::Sermon;

const STORE_FILENAME: &str = "sermons_db_v1.json";

/// On-device sermon storage: the whole collection lives as one JSON array in
/// a single file, stored verbatim in the wire field names.
///
/// Reads are self-healing — a missing file is seeded with starter content and
/// a non-array payload is reset to it — so `read_all` never surfaces
/// corruption to the caller. Mutations announce on the same-process channel; other
/// processes are covered by the file watcher attached at subscribe time.
#[derive(Debug, Clone)]
pub struct LocalStore {
    path: PathBuf,
}

impl LocalStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Store file in the per-user data directory.
    pub fn default_path() -> PathBuf {
        ProjectDirs::from("com", "pulpit", "pulpit")
            .map(|dirs| dirs.data_dir().join(STORE_FILENAME))
            .unwrap_or_else(|| PathBuf::from(STORE_FILENAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the collection. Seeds starter content on first run; resets to it
    /// (with a logged warning) only when the stored payload is not a JSON
    /// array. Array elements are taken as-is, absent fields defaulting, so an
    /// accepted import is never destroyed by a later read.
    pub fn read_all(&self) -> Result<Vec<Sermon>> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "store file absent, seeding");
                let seed = seed_sermons();
                self.write_all(&seed)?;
                return Ok(seed);
            }
            Err(e) => return Err(PulpitError::Io(e)),
        };

        match serde_json::from_str::<Vec<serde_json::Value>>(&raw) {
            Ok(values) => Ok(values
                .into_iter()
                .map(|value| serde_json::from_value::<Sermon>(value).unwrap_or_default())
                .collect()),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "stored sermon data is not a JSON array, resetting to seed");
                let seed = seed_sermons();
                self.write_all(&seed)?;
                Ok(seed)
            }
        }
    }

    /// Replace the entire stored collection verbatim.
    pub fn write_all(&self, sermons: &[Sermon]) -> Result<()> {
        self.ensure_parent_dir()?;
        let content = serde_json::to_string(sermons)?;
        fs::write(&self.path, content)?;
        Ok(())
    }

    /// Replace a record with a matching id in place, keeping its position;
    /// otherwise prepend. This layer does not re-sort by date — ordering is a
    /// presentation concern on the local path (the remote path is
    /// server-ordered; the asymmetry is deliberate).
    pub fn upsert(&self, sermon: &Sermon) -> Result<()> {
        let mut sermons = self.read_all()?;
        match sermons.iter().position(|s| s.id == sermon.id) {
            Some(index) => sermons[index] = sermon.clone(),
            None => sermons.insert(0, sermon.clone()),
        }
        self.write_all(&sermons)?;
        same_process_bus().announce(&self.path);
        Ok(())
    }

    /// Delete by id. An absent id leaves the collection untouched and
    /// announces nothing.
    pub fn remove(&self, id: &str) -> Result<()> {
        let mut sermons = self.read_all()?;
        let before = sermons.len();
        sermons.retain(|s| s.id != id);
        if sermons.len() == before {
            return Ok(());
        }
        self.write_all(&sermons)?;
        same_process_bus().announce(&self.path);
        Ok(())
    }

    /// Replace the stored collection with `raw` iff it parses as a JSON
    /// array; the raw text is stored verbatim. Anything else — an object, a
    /// scalar, unparseable text, even a write fault — reports `false` and
    /// leaves prior state intact.
    pub fn import_replace(&self, raw: &str) -> bool {
        match serde_json::from_str::<serde_json::Value>(raw) {
            Ok(serde_json::Value::Array(_)) => {}
            Ok(_) => {
                warn!("import rejected: top-level JSON value is not an array");
                return false;
            }
            Err(e) => {
                warn!(error = %e, "import rejected: payload is not valid JSON");
                return false;
            }
        }

        if let Err(e) = self
            .ensure_parent_dir()
            .and_then(|_| fs::write(&self.path, raw).map_err(PulpitError::Io))
        {
            warn!(error = %e, "import failed writing store file");
            return false;
        }

        same_process_bus().announce(&self.path);
        true
    }

    fn ensure_parent_dir(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent).map_err(PulpitError::Io)?;
            }
        }
        Ok(())
    }

    fn snapshot_or_empty(&self) -> Vec<Sermon> {
        self.read_all().unwrap_or_else(|e| {
            warn!(error = %e, "failed reading local store for snapshot delivery");
            Vec::new()
        })
    }
}

impl SermonStore for LocalStore {
    fn subscribe(&self, callback: SnapshotCallback) -> Subscription {
        let callback: Arc<dyn Fn(Vec<Sermon>) + Send + Sync> = Arc::from(callback);

        // Initial snapshot, synchronously, before any listener attaches.
        callback(self.snapshot_or_empty());

        // Writes to other stores in this process are not ours to relay.
        let store = self.clone();
        let cb = Arc::clone(&callback);
        let listener_id = same_process_bus().subscribe(move |changed: &Path| {
            if changed == store.path {
                cb(store.snapshot_or_empty());
            }
        });

        let store = self.clone();
        let cb = Arc::clone(&callback);
        let mut watcher = FileWatcher::spawn(self.path.clone(), move || {
            cb(store.snapshot_or_empty());
        });

        Subscription::new(move || {
            same_process_bus().unsubscribe(listener_id);
            watcher.stop();
        })
    }

    fn save(&self, sermon: &Sermon) -> Result<()> {
        self.upsert(sermon)
    }

    fn delete(&self, id: &str) -> Result<()> {
        self.remove(id)
    }

    fn import_json(&self, raw: &str) -> Result<bool> {
        Ok(self.import_replace(raw))
    }
}

/// Starter content written on first run so the public feed is never empty.
pub fn seed_sermons() -> Vec<Sermon> {
    vec![
        Sermon {
            id: "1".into(),
            title: "The Foundation of Faith".into(),
            preacher: "Rev. David Jenkins".into(),
            series: "Unshakeable".into(),
            date: "2023-10-22".into(),
            scripture: "Hebrews 11:1-3".into(),
            description:
                "Exploring what it means to have faith that stands firm in the face of uncertainty."
                    .into(),
            audio_url: "https://www.soundhelix.com/examples/mp3/SoundHelix-Song-1.mp3".into(),
            duration: Some("34:12".into()),
            tags: vec!["Faith".into(), "Trust".into(), "Foundation".into()],
        },
        Sermon {
            id: "2".into(),
            title: "Walking in Love".into(),
            preacher: "Sarah Williams".into(),
            series: "Community Life".into(),
            date: "2023-10-29".into(),
            scripture: "1 Corinthians 13".into(),
            description:
                "Love is not just a feeling, it is an action we practice daily within the church family."
                    .into(),
            audio_url: "https://www.soundhelix.com/examples/mp3/SoundHelix-Song-2.mp3".into(),
            duration: Some("28:45".into()),
            tags: vec!["Love".into(), "Community".into(), "Action".into()],
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn store_in(dir: &tempfile::TempDir) -> LocalStore {
        LocalStore::new(dir.path().join("sermons.json"))
    }

    fn sample(id: &str, title: &str) -> Sermon {
        Sermon {
            id: id.into(),
            title: title.into(),
            preacher: "Rev. David Jenkins".into(),
            series: "Unshakeable".into(),
            date: "2024-02-04".into(),
            scripture: "Psalm 23".into(),
            description: String::new(),
            audio_url: "https://example.com/s.mp3".into(),
            duration: None,
            tags: vec![],
        }
    }

    #[test]
    fn first_read_seeds_the_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        let sermons = store.read_all().unwrap();
        assert_eq!(sermons, seed_sermons());
        assert!(store.path().exists());

        // Second read comes from disk, not a fresh seed write.
        assert_eq!(store.read_all().unwrap(), sermons);
    }

    #[test]
    fn corrupt_store_resets_to_seed() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        fs::write(store.path(), "{not json").unwrap();

        assert_eq!(store.read_all().unwrap(), seed_sermons());
        // The file was healed on disk too.
        let raw = fs::read_to_string(store.path()).unwrap();
        let parsed: Vec<Sermon> = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed, seed_sermons());
    }

    #[test]
    fn non_array_payload_also_counts_as_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        fs::write(store.path(), "{\"id\": \"1\"}").unwrap();

        assert_eq!(store.read_all().unwrap(), seed_sermons());
    }

    #[test]
    fn upsert_replaces_in_place_and_prepends_new() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.write_all(&[sample("a", "First"), sample("b", "Second")]).unwrap();

        store.upsert(&sample("b", "Second, revised")).unwrap();
        let sermons = store.read_all().unwrap();
        assert_eq!(sermons[0].title, "First");
        assert_eq!(sermons[1].title, "Second, revised");

        store.upsert(&sample("c", "Newest")).unwrap();
        let sermons = store.read_all().unwrap();
        assert_eq!(sermons[0].id, "c");
        assert_eq!(sermons.len(), 3);
    }

    #[test]
    fn repeated_upserts_keep_one_record_per_id() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.write_all(&[]).unwrap();

        store.upsert(&sample("x", "v1")).unwrap();
        store.upsert(&sample("y", "other")).unwrap();
        store.upsert(&sample("x", "v2")).unwrap();
        store.upsert(&sample("x", "v3")).unwrap();

        let sermons = store.read_all().unwrap();
        let xs: Vec<_> = sermons.iter().filter(|s| s.id == "x").collect();
        assert_eq!(xs.len(), 1);
        assert_eq!(xs[0].title, "v3");
    }

    #[test]
    fn remove_deletes_and_tolerates_absent_ids() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.write_all(&[sample("a", "A"), sample("b", "B")]).unwrap();

        store.remove("a").unwrap();
        let sermons = store.read_all().unwrap();
        assert!(sermons.iter().all(|s| s.id != "a"));

        store.remove("nope").unwrap();
        assert_eq!(store.read_all().unwrap(), sermons);
    }

    #[test]
    fn import_rejects_non_array_and_keeps_prior_data() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.write_all(&[sample("a", "Keep me")]).unwrap();

        assert!(!store.import_replace("{}"));
        assert!(!store.import_replace("not json at all"));
        assert!(!store.import_replace("42"));

        let sermons = store.read_all().unwrap();
        assert_eq!(sermons.len(), 1);
        assert_eq!(sermons[0].title, "Keep me");
    }

    #[test]
    fn import_array_replaces_wholesale() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.write_all(&[sample("a", "Old")]).unwrap();

        assert!(store.import_replace("[]"));
        assert!(store.read_all().unwrap().is_empty());

        let replacement = serde_json::to_string(&[sample("z", "New")]).unwrap();
        assert!(store.import_replace(&replacement));
        let sermons = store.read_all().unwrap();
        assert_eq!(sermons.len(), 1);
        assert_eq!(sermons[0].id, "z");
    }

    #[test]
    fn imported_schemaless_elements_survive_reads() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        assert!(store.import_replace(r#"[{"mystery": true}]"#));

        let sermons = store.read_all().unwrap();
        assert_ne!(sermons, seed_sermons());
        assert_eq!(sermons.len(), 1);
        assert!(sermons[0].id.is_empty());
        // The stored text is still the imported payload, untouched.
        let raw = fs::read_to_string(store.path()).unwrap();
        assert_eq!(raw, r#"[{"mystery": true}]"#);
    }

    #[test]
    fn subscribe_delivers_current_snapshot_immediately() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.write_all(&[sample("a", "Here")]).unwrap();

        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = Arc::clone(&seen);
        let mut sub = store.subscribe(Box::new(move |snapshot| {
            s.lock().unwrap().push(snapshot);
        }));

        {
            let snapshots = seen.lock().unwrap();
            assert_eq!(snapshots.len(), 1);
            assert_eq!(snapshots[0][0].id, "a");
        }
        sub.unsubscribe();
    }

    #[test]
    fn mutations_notify_same_process_subscribers() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.write_all(&[]).unwrap();

        let deliveries = Arc::new(AtomicUsize::new(0));
        let latest = Arc::new(Mutex::new(Vec::new()));
        let d = Arc::clone(&deliveries);
        let l = Arc::clone(&latest);
        let mut sub = store.subscribe(Box::new(move |snapshot| {
            d.fetch_add(1, Ordering::SeqCst);
            *l.lock().unwrap() = snapshot;
        }));

        store.upsert(&sample("n", "Announced")).unwrap();

        assert!(deliveries.load(Ordering::SeqCst) >= 2);
        assert!(latest.lock().unwrap().iter().any(|s| s.id == "n"));

        sub.unsubscribe();
        let after = deliveries.load(Ordering::SeqCst);
        store.upsert(&sample("m", "Unheard")).unwrap();
        assert_eq!(deliveries.load(Ordering::SeqCst), after);
    }
}
