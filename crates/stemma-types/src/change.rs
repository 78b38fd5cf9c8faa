//! Change taxonomy: categories, sync modes, and planned actions.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::record::{Record, RecordKey};

/// How a record differs between the two stores, relative to the common sync
/// point. Exactly one category applies per differing key per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChangeCategory {
    ModifiedBoth,
    ModifiedLocal,
    ModifiedRemote,
    AddedLocal,
    AddedRemote,
    DeletedLocal,
    DeletedRemote,
}

impl ChangeCategory {
    pub const ALL: [ChangeCategory; 7] = [
        ChangeCategory::ModifiedBoth,
        ChangeCategory::ModifiedLocal,
        ChangeCategory::ModifiedRemote,
        ChangeCategory::AddedLocal,
        ChangeCategory::AddedRemote,
        ChangeCategory::DeletedLocal,
        ChangeCategory::DeletedRemote,
    ];
}

/// User-selected reconciliation policy. Selected once per run, never mixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SyncMode {
    Bidirectional,
    ResetToLocal,
    ResetToRemote,
    Merge,
}

impl SyncMode {
    pub const ALL: [SyncMode; 4] = [
        SyncMode::Bidirectional,
        SyncMode::ResetToLocal,
        SyncMode::ResetToRemote,
        SyncMode::Merge,
    ];
}

/// An unrecognized sync mode name. A configuration error, never silently
/// defaulted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid sync mode: {0}")]
pub struct InvalidSyncMode(pub String);

impl FromStr for SyncMode {
    type Err = InvalidSyncMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bidirectional" => Ok(SyncMode::Bidirectional),
            "reset-to-local" => Ok(SyncMode::ResetToLocal),
            "reset-to-remote" => Ok(SyncMode::ResetToRemote),
            "merge" => Ok(SyncMode::Merge),
            other => Err(InvalidSyncMode(other.to_string())),
        }
    }
}

/// Directional action resolved from a change category by the planner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionKind {
    AddLocal,
    AddRemote,
    DeleteLocal,
    DeleteRemote,
    UpdateLocal,
    UpdateRemote,
    /// Merge the two copies and commit the result to both stores.
    MergeRemote,
}

impl ActionKind {
    /// Whether applying this action mutates the local store.
    pub fn affects_local(&self) -> bool {
        matches!(
            self,
            ActionKind::AddLocal
                | ActionKind::DeleteLocal
                | ActionKind::UpdateLocal
                | ActionKind::MergeRemote
        )
    }

    /// Whether applying this action drives a call through the API client.
    pub fn affects_remote(&self) -> bool {
        matches!(
            self,
            ActionKind::AddRemote
                | ActionKind::DeleteRemote
                | ActionKind::UpdateRemote
                | ActionKind::MergeRemote
        )
    }
}

/// One planned mutation, carrying whichever copies of the record exist.
///
/// An action never targets a key absent from both stores.
#[derive(Debug, Clone, PartialEq)]
pub struct Action {
    pub kind: ActionKind,
    pub key: RecordKey,
    pub local: Option<Record>,
    pub remote: Option<Record>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_parses_known_names() {
        assert_eq!("bidirectional".parse(), Ok(SyncMode::Bidirectional));
        assert_eq!("reset-to-local".parse(), Ok(SyncMode::ResetToLocal));
        assert_eq!("reset-to-remote".parse(), Ok(SyncMode::ResetToRemote));
        assert_eq!("merge".parse(), Ok(SyncMode::Merge));
    }

    #[test]
    fn unknown_mode_fails_fast() {
        let err = "theirs".parse::<SyncMode>().unwrap_err();
        assert_eq!(err, InvalidSyncMode("theirs".to_string()));
    }

    #[test]
    fn merge_affects_both_sides() {
        assert!(ActionKind::MergeRemote.affects_local());
        assert!(ActionKind::MergeRemote.affects_remote());
        assert!(!ActionKind::AddRemote.affects_local());
        assert!(!ActionKind::DeleteLocal.affects_remote());
    }
}
