use std::env;
use std::path::PathBuf;

/// Settings a real document-collection client needs to reach the cloud
/// backend. Presence of these (specifically a non-empty API key) is what
/// flips the service out of local demo mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteSettings {
    pub api_key: String,
    pub project_id: String,
    pub collection: String,
}

/// Backend configuration, read once at startup and passed into the service
/// constructor. It never changes during a running session; its only visible
/// effect is which store adapter the facade binds to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackendConfig {
    pub remote: Option<RemoteSettings>,
    /// Override for the local store file. When unset, the per-user data
    /// directory is used.
    pub store_path: Option<PathBuf>,
}

const DEFAULT_COLLECTION: &str = "sermons";

impl BackendConfig {
    /// Read configuration from `PULPIT_*` environment variables.
    ///
    /// Remote settings count as configured only when `PULPIT_API_KEY` is set
    /// and non-empty; a missing key means local demo mode.
    pub fn from_env() -> Self {
        let api_key = env::var("PULPIT_API_KEY").unwrap_or_default();
        let remote = if api_key.is_empty() {
            None
        } else {
            Some(RemoteSettings {
                api_key,
                project_id: env::var("PULPIT_PROJECT_ID").unwrap_or_default(),
                collection: env::var("PULPIT_COLLECTION")
                    .unwrap_or_else(|_| DEFAULT_COLLECTION.to_string()),
            })
        };

        let store_path = env::var("PULPIT_STORE").ok().map(PathBuf::from);

        Self { remote, store_path }
    }

    pub fn is_remote_configured(&self) -> bool {
        self.remote.is_some()
    }
}
