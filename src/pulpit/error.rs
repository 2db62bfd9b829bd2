use thiserror::Error;

#[derive(Error, Debug)]
pub enum PulpitError {
    #[error("Sermon not found: {0}")]
    SermonNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Metadata generation failed: {0}")]
    Enrichment(String),
}

pub type Result<T> = std::result::Result<T, PulpitError>;
