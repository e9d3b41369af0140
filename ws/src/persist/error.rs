//! Persistence errors

use thiserror::Error;

use crate::store::StoreError;

/// Errors from a storage adapter
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Errors from the persistence layer
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("State is not an object: {0}")]
    InvalidState(String),

    #[error("Rehydration failed: {0}")]
    Rehydrate(String),

    #[error("Dispatch error: {0}")]
    Dispatch(#[from] StoreError),

    #[error("Channel error")]
    ChannelError,
}

pub type PersistResult<T> = Result<T, PersistError>;
