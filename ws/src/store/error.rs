//! Store errors

use thiserror::Error;

/// Errors surfaced by a dispatch
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Middleware {name} failed: {reason}")]
    Middleware { name: &'static str, reason: String },

    #[error("Store dropped")]
    Dropped,
}

/// Result of a dispatch
pub type StoreResult<T> = Result<T, StoreError>;
