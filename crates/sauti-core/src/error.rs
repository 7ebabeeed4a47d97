//! Core error types.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Unknown model identifier.
    #[error("Model not found: {0}")]
    ModelNotFound(String),

    /// The backend failed to materialize a model instance. Nothing is
    /// cached on this path; the next request triggers a fresh load.
    #[error("Model load failed: {0}")]
    ModelLoadError(String),

    /// The backend failed during a batched call. Every request folded into
    /// the failing bucket receives this error.
    #[error("Batch execution failed: {0}")]
    BatchExecutionError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Credential rejected. Carries no cause on purpose: malformed, unknown,
    /// revoked, and expired tokens are indistinguishable to the caller.
    #[error("Invalid or expired credential")]
    InvalidCredential,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Storage error: {0}")]
    StorageError(#[from] rusqlite::Error),

    #[error("Credential hashing failed: {0}")]
    HashError(String),
}
