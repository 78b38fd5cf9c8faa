//! # Stemma Core
//!
//! The reconciliation engine: computes how two genealogical record stores
//! differ, classifies each difference relative to the last common sync point,
//! resolves a directional action per difference according to the selected
//! sync mode, and applies the actions inside paired transaction scopes.
//!
//! ```text
//! stemma-core/src/
//! ├── store.rs    # RecordStore trait, transaction guard, MemoryStore
//! ├── diff.rs     # store diff + common-sync-point computation
//! ├── classify.rs # seven-way change classification
//! ├── plan.rs     # mode-driven action resolution table
//! ├── merge.rs    # injected Merger strategy
//! ├── apply.rs    # ordered action application, remote payload queue
//! └── engine.rs   # diff → classify → plan → apply orchestration
//! ```
//!
//! Remote I/O goes through the [`engine::RemoteCommitter`] seam, implemented
//! by the `stemma-client` crate.

pub mod apply;
pub mod classify;
pub mod diff;
pub mod engine;
pub mod error;
pub mod merge;
pub mod plan;
pub mod store;

// Re-export commonly used types
pub use apply::{apply_actions, RemoteTransaction};
pub use classify::{classify, Change};
pub use diff::{common_sync_point, diff_stores, StoreDiff};
pub use engine::{RemoteCommitter, SyncEngine, SyncOptions};
pub use error::{StoreError, SyncError, SyncResult};
pub use merge::{JsonMerger, Merger};
pub use plan::{has_local_actions, has_remote_actions, plan_action, plan_changes};
pub use store::{MemoryStore, RecordStore, TransactionGuard, TransactionalStore};
