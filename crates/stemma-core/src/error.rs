//! Unified error types for the reconciliation engine.

use thiserror::Error;

use stemma_types::InvalidSyncMode;

/// Errors surfaced by a backing record store.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum StoreError {
    /// The requested record does not exist in this store.
    #[error("Record not found: {0}")]
    NotFound(String),

    /// A record with the same key already exists.
    #[error("Duplicate handle: {0}")]
    Duplicate(String),

    /// No transaction is open, or one is already open.
    #[error("Transaction error: {0}")]
    Transaction(String),

    /// Backend-specific failure.
    #[error("Store error: {0}")]
    Backend(String),
}

/// Main error type for synchronization runs.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum SyncError {
    /// A store-level commit/add/remove failed; the run halts immediately.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Unrecognized sync mode name. Fatal, never silently defaulted.
    #[error(transparent)]
    InvalidSyncMode(#[from] InvalidSyncMode),

    /// An action failed mid-run. Already-applied actions in the *other*
    /// store's scope remain committed; the counts tell the caller how far
    /// the run got.
    #[error("Sync halted after {completed} of {attempted} actions: {source}")]
    PartialApply {
        attempted: usize,
        completed: usize,
        #[source]
        source: Box<SyncError>,
    },

    /// Submitting the remote transaction payload failed.
    #[error("Remote commit failed: {0}")]
    Remote(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for synchronization operations.
pub type SyncResult<T> = Result<T, SyncError>;
