//! # Stemma Types
//!
//! Shared data model for Stemma Sync: versioned genealogical records, the
//! change taxonomy used by the reconciliation engine, and the wire types
//! exchanged with the remote web API.

pub mod change;
pub mod record;
pub mod report;
pub mod wire;

// Re-export commonly used types
pub use change::{Action, ActionKind, ChangeCategory, InvalidSyncMode, SyncMode};
pub use record::{Record, RecordKey, RecordType};
pub use report::{DirectionTotals, SyncReport};
pub use wire::{BackgroundTask, EntryKind, TaskState, TaskStatus, TransactionEntry};

/// Progress callback invoked by long-running operations.
///
/// The argument is a fraction in `0.0..=1.0` when known, or a negative value
/// when the operation cannot estimate its progress.
pub type ProgressFn = dyn Fn(f64) + Send + Sync;
