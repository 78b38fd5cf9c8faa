//! Per-run outcome reporting.

use serde::Serialize;

use crate::change::ActionKind;

/// Counts of mutations applied in one direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DirectionTotals {
    pub added: usize,
    pub updated: usize,
    pub deleted: usize,
}

impl DirectionTotals {
    pub fn total(&self) -> usize {
        self.added + self.updated + self.deleted
    }
}

/// Outcome of one synchronization run.
///
/// `planned_*` counts come from the action planner; the `local`/`remote`
/// totals and `merged` count what was actually applied. Comparing the two
/// tells a user whether local changes were not yet sent or remote changes
/// not yet applied, so a run can safely be re-run to resume.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SyncReport {
    /// Common sync point used to classify changes, seconds since epoch.
    pub sync_point: i64,
    /// Planned actions that mutate the local store (merges included).
    pub planned_local: usize,
    /// Planned actions that drive remote calls (merges included).
    pub planned_remote: usize,
    /// Mutations applied to the local store.
    pub local: DirectionTotals,
    /// Mutations queued for and submitted to the remote store.
    pub remote: DirectionTotals,
    /// Merge actions applied (each counts toward both sides).
    pub merged: usize,
    /// Whether the remote transaction payload was accepted by the server.
    pub remote_submitted: bool,
}

impl SyncReport {
    pub fn record(&mut self, kind: ActionKind) {
        match kind {
            ActionKind::AddLocal => self.local.added += 1,
            ActionKind::UpdateLocal => self.local.updated += 1,
            ActionKind::DeleteLocal => self.local.deleted += 1,
            ActionKind::AddRemote => self.remote.added += 1,
            ActionKind::UpdateRemote => self.remote.updated += 1,
            ActionKind::DeleteRemote => self.remote.deleted += 1,
            ActionKind::MergeRemote => self.merged += 1,
        }
    }

    pub fn applied_local(&self) -> usize {
        self.local.total() + self.merged
    }

    pub fn applied_remote(&self) -> usize {
        self.remote.total() + self.merged
    }

    /// Remote changes not yet applied to the local store.
    pub fn pending_local(&self) -> bool {
        self.planned_local > self.applied_local()
    }

    /// Local changes not yet sent to the remote store.
    pub fn pending_remote(&self) -> bool {
        self.planned_remote > self.applied_remote()
            || (self.planned_remote > 0 && !self.remote_submitted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_counts_toward_both_sides() {
        let mut report = SyncReport::default();
        report.planned_local = 1;
        report.planned_remote = 1;
        report.record(ActionKind::MergeRemote);
        assert_eq!(report.applied_local(), 1);
        assert_eq!(report.applied_remote(), 1);
        assert!(!report.pending_local());
        // Queued but never submitted: still pending on the remote side.
        assert!(report.pending_remote());
        report.remote_submitted = true;
        assert!(!report.pending_remote());
    }
}
