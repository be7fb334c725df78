//! Storage errors

use mserver_core::ServerError;
use thiserror::Error;

/// Persistence-layer errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Row not found: {0}")]
    NotFound(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Corrupted data file: {0}")]
    Corrupted(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<StorageError> for ServerError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(what) => ServerError::DataNotFound(what),
            other => ServerError::PersistenceFailure(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, StorageError>;
