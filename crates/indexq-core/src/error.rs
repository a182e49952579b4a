use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IndexqError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Build cache directory not found: {0}")]
    CacheRootNotFound(PathBuf),

    #[error("No build cache entry matching '{project}' under {root}")]
    ProjectNotFound { project: String, root: PathBuf },

    #[error("Index store not found in {0}")]
    StoreNotFound(PathBuf),

    #[error("Failed to open index store at {path}: {reason}")]
    Open { path: PathBuf, reason: String },

    #[error("Index consistency scan failed: {0}")]
    Scan(String),

    #[error("Session initialization failed: {0}")]
    Session(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Connection failed: {0}")]
    Connection(String),
}

pub type Result<T> = std::result::Result<T, IndexqError>;
