//! Full-run orchestration: diff → classify → plan → apply → remote submit.

use async_trait::async_trait;
use stemma_types::{ProgressFn, SyncMode, SyncReport, TransactionEntry};

use crate::apply::{apply_actions, RemoteTransaction};
use crate::classify::classify;
use crate::diff::{common_sync_point, diff_stores};
use crate::error::{SyncError, SyncResult};
use crate::merge::Merger;
use crate::plan::plan_changes;
use crate::store::{RecordStore, TransactionGuard, TransactionalStore};

/// Seam through which the queued remote transaction payload is submitted.
/// Implemented by the API client in `stemma-client`.
#[async_trait]
pub trait RemoteCommitter {
    async fn commit_transaction(
        &mut self,
        entries: &[TransactionEntry],
        force: bool,
        progress: Option<&ProgressFn>,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// Per-run settings.
#[derive(Debug, Clone, Copy)]
pub struct SyncOptions {
    pub mode: SyncMode,
    /// Persisted "last synced" timestamp; raises the computed sync point.
    pub last_synced: i64,
    /// Forwarded to the remote transaction endpoint as the force flag.
    pub force: bool,
}

impl SyncOptions {
    pub fn new(mode: SyncMode) -> Self {
        Self { mode, last_synced: 0, force: false }
    }
}

/// One synchronization run over a local store and a remote view.
///
/// Strictly sequential: actions are applied in planned order, one at a time,
/// and the remote payload is submitted as a single transaction before the
/// local scope commits. A failure partway through can leave one side applied
/// and the other not; re-running the pipeline against the partially-applied
/// state yields a smaller diff and resumes naturally.
pub struct SyncEngine<'a, R: RemoteCommitter> {
    remote_api: &'a mut R,
    merger: &'a dyn Merger,
}

impl<'a, R: RemoteCommitter> SyncEngine<'a, R> {
    pub fn new(remote_api: &'a mut R, merger: &'a dyn Merger) -> Self {
        Self { remote_api, merger }
    }

    /// Run the full pipeline. `remote_view` is a read snapshot of the remote
    /// store, e.g. loaded from a downloaded export.
    pub async fn run<L, V>(
        &mut self,
        local: &mut L,
        remote_view: &V,
        options: &SyncOptions,
        progress: Option<&ProgressFn>,
    ) -> SyncResult<SyncReport>
    where
        L: TransactionalStore + ?Sized,
        V: RecordStore + ?Sized,
    {
        let diff = diff_stores(local, remote_view)?;
        let sync_point = common_sync_point(local, remote_view, options.last_synced)?;
        let changes = classify(&diff, sync_point);
        let actions = plan_changes(&changes, options.mode);

        let mut report = SyncReport {
            sync_point,
            planned_local: actions.iter().filter(|a| a.kind.affects_local()).count(),
            planned_remote: actions.iter().filter(|a| a.kind.affects_remote()).count(),
            ..SyncReport::default()
        };

        tracing::info!(
            mode = ?options.mode,
            sync_point,
            planned = actions.len(),
            "Planned sync actions"
        );

        if actions.is_empty() {
            return Ok(report);
        }

        let mut guard = TransactionGuard::begin(local)?;
        let mut remote_txn = RemoteTransaction::new();
        apply_actions(&actions, &mut guard, &mut remote_txn, self.merger, &mut report)?;

        // Submit the remote payload first: if the server rejects it, the
        // local guard rolls back and nothing moved on either side.
        if !remote_txn.is_empty() {
            self.remote_api
                .commit_transaction(remote_txn.entries(), options.force, progress)
                .await
                .map_err(SyncError::Remote)?;
            report.remote_submitted = true;
        }
        guard.commit()?;

        tracing::info!(
            local_applied = report.applied_local(),
            remote_applied = report.applied_remote(),
            merged = report.merged,
            "Sync run complete"
        );
        Ok(report)
    }
}
