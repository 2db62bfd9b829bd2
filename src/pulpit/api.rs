//! # Service Facade
//!
//! [`SermonService`] is the single entry point UI surfaces consume. It binds
//! to one [`SermonStore`] implementation at construction — remote when the
//! backend configuration carries remote settings and a client, local
//! otherwise — and nothing above it ever branches on the backend again.

use chrono::NaiveDate;
use tracing::warn;

use crate::config::BackendConfig;
use crate::error::Result;
use crate::model::Sermon;
use crate::store::local::LocalStore;
use crate::store::remote::{DocumentCollection, RemoteStore};
use crate::store::{SermonStore, SnapshotCallback, Subscription};

pub struct SermonService {
    store: Box<dyn SermonStore>,
    remote: bool,
}

impl SermonService {
    /// Local-only service, for demo mode and tests.
    pub fn local(store: LocalStore) -> Self {
        Self {
            store: Box::new(store),
            remote: false,
        }
    }

    /// Remote-backed service. `fallback` is the local store used for degraded
    /// snapshots when the live query fails.
    pub fn remote<C: DocumentCollection + 'static>(collection: C, fallback: LocalStore) -> Self {
        Self {
            store: Box::new(RemoteStore::new(collection, fallback)),
            remote: true,
        }
    }

    /// Compose from startup configuration. The document-collection client is
    /// injected by the embedding application; without one — or without remote
    /// settings — the service runs against local storage and says so once.
    pub fn from_config(
        config: &BackendConfig,
        client: Option<Box<dyn DocumentCollection>>,
    ) -> Self {
        let local = LocalStore::new(
            config
                .store_path
                .clone()
                .unwrap_or_else(LocalStore::default_path),
        );

        match (config.is_remote_configured(), client) {
            (true, Some(client)) => Self::remote(client, local),
            (true, None) => {
                warn!("remote backend configured but no client supplied; running in local demo mode");
                Self::local(local)
            }
            (false, _) => {
                warn!("no remote backend configured (PULPIT_API_KEY unset); running in local demo mode");
                Self::local(local)
            }
        }
    }

    /// Whether the remote backend is active — surfaces use this for the
    /// "local demo mode" notice.
    pub fn is_remote(&self) -> bool {
        self.remote
    }

    /// Deliver the current snapshot and all subsequent changes to `callback`.
    /// Each call creates an independent stream; tear it down via the returned
    /// handle (idempotent, also runs on drop).
    pub fn subscribe_to_sermons(&self, callback: SnapshotCallback) -> Subscription {
        self.store.subscribe(callback)
    }

    pub fn save_sermon(&self, sermon: &Sermon) -> Result<()> {
        self.store.save(sermon)
    }

    pub fn delete_sermon(&self, id: &str) -> Result<()> {
        self.store.delete(id)
    }

    /// Import a JSON backup through the active adapter. `Ok(false)` means the
    /// payload was rejected and nothing changed.
    pub fn import_sermons(&self, raw: &str) -> Result<bool> {
        self.store.import_json(raw)
    }
}

/// Pretty-printed JSON of the given collection, suitable for a backup file.
pub fn export_json(sermons: &[Sermon]) -> Result<String> {
    Ok(serde_json::to_string_pretty(sermons)?)
}

/// Backup filename carrying the calendar date, e.g.
/// `pulpit-sermons-backup-2026-08-23.json`.
pub fn export_filename(date: NaiveDate) -> String {
    format!("pulpit-sermons-backup-{}.json", date.format("%Y-%m-%d"))
}
