//! Policy-driven action resolution.

use stemma_types::{Action, ActionKind, ChangeCategory, SyncMode};

use crate::classify::Change;

/// Resolve a change category to a directional action under the given mode.
///
/// Total over all 28 category/mode combinations; the mode enum makes
/// unknown modes unrepresentable (parsing a mode name fails fast instead).
pub fn plan_action(category: ChangeCategory, mode: SyncMode) -> ActionKind {
    use ActionKind::*;
    use ChangeCategory::*;
    use SyncMode::*;

    match (category, mode) {
        (ModifiedBoth, Bidirectional | Merge) => MergeRemote,
        (ModifiedBoth, ResetToLocal) => UpdateRemote,
        (ModifiedBoth, ResetToRemote) => UpdateLocal,

        (AddedLocal, Bidirectional | ResetToLocal | Merge) => AddRemote,
        (AddedLocal, ResetToRemote) => DeleteLocal,

        (AddedRemote, Bidirectional | ResetToRemote | Merge) => AddLocal,
        (AddedRemote, ResetToLocal) => DeleteRemote,

        (DeletedLocal, Bidirectional | ResetToLocal) => DeleteRemote,
        (DeletedLocal, ResetToRemote | Merge) => AddLocal,

        (DeletedRemote, Bidirectional | ResetToRemote) => DeleteLocal,
        (DeletedRemote, ResetToLocal | Merge) => AddRemote,

        (ModifiedLocal, _) => UpdateRemote,
        (ModifiedRemote, _) => UpdateLocal,
    }
}

/// Plan one action per classified change, preserving discovery order.
pub fn plan_changes(changes: &[Change], mode: SyncMode) -> Vec<Action> {
    changes
        .iter()
        .map(|change| Action {
            kind: plan_action(change.category, mode),
            key: change.key.clone(),
            local: change.local.clone(),
            remote: change.remote.clone(),
        })
        .collect()
}

/// Whether any planned action mutates the local store.
pub fn has_local_actions(actions: &[Action]) -> bool {
    actions.iter().any(|a| a.kind.affects_local())
}

/// Whether any planned action drives a call through the API client.
pub fn has_remote_actions(actions: &[Action]) -> bool {
    actions.iter().any(|a| a.kind.affects_remote())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ActionKind::*;
    use ChangeCategory::*;
    use SyncMode::*;

    // The full resolution table: rows are categories, columns are
    // Bidirectional, ResetToLocal, ResetToRemote, Merge.
    const TABLE: [(ChangeCategory, [ActionKind; 4]); 7] = [
        (ModifiedBoth, [MergeRemote, UpdateRemote, UpdateLocal, MergeRemote]),
        (AddedLocal, [AddRemote, AddRemote, DeleteLocal, AddRemote]),
        (AddedRemote, [AddLocal, DeleteRemote, AddLocal, AddLocal]),
        (DeletedLocal, [DeleteRemote, DeleteRemote, AddLocal, AddLocal]),
        (DeletedRemote, [DeleteLocal, AddRemote, DeleteLocal, AddRemote]),
        (ModifiedLocal, [UpdateRemote, UpdateRemote, UpdateRemote, UpdateRemote]),
        (ModifiedRemote, [UpdateLocal, UpdateLocal, UpdateLocal, UpdateLocal]),
    ];

    #[test]
    fn planner_matches_table_for_all_28_cells() {
        for (category, expected) in TABLE {
            for (mode, want) in [Bidirectional, ResetToLocal, ResetToRemote, Merge]
                .into_iter()
                .zip(expected)
            {
                assert_eq!(
                    plan_action(category, mode),
                    want,
                    "category {:?} under mode {:?}",
                    category,
                    mode
                );
            }
        }
    }

    #[test]
    fn directional_predicates_follow_planned_kinds() {
        use stemma_types::{Action, RecordKey, RecordType};

        let action = |kind| Action {
            kind,
            key: RecordKey::new("h1", RecordType::Person),
            local: None,
            remote: None,
        };

        assert!(!has_local_actions(&[]));
        assert!(!has_remote_actions(&[]));

        let remote_only = [action(AddRemote), action(DeleteRemote)];
        assert!(!has_local_actions(&remote_only));
        assert!(has_remote_actions(&remote_only));

        let local_only = [action(UpdateLocal)];
        assert!(has_local_actions(&local_only));
        assert!(!has_remote_actions(&local_only));

        // A merge affects both sides.
        let merge = [action(MergeRemote)];
        assert!(has_local_actions(&merge));
        assert!(has_remote_actions(&merge));
    }

    #[test]
    fn planner_covers_every_category_and_mode() {
        assert_eq!(TABLE.len(), ChangeCategory::ALL.len());
        for category in ChangeCategory::ALL {
            assert!(TABLE.iter().any(|(c, _)| *c == category));
            for mode in SyncMode::ALL {
                // Must not panic for any combination.
                let _ = plan_action(category, mode);
            }
        }
    }
}
