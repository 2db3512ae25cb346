use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("credentials unavailable: {0}")]
    Credentials(String),

    #[error("failed to stage document at {path}: {source}")]
    Staging {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("S3 PutObject error: {0}")]
    PutObject(String),

    #[error("filesystem store error for key {key}: {source}")]
    FileSystem {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid object key: {0}")]
    InvalidKey(String),
}

/// Result type for storage operations
pub type Result<T> = std::result::Result<T, StorageError>;
