//! Seven-way change classification relative to the common sync point.

use stemma_types::{ChangeCategory, Record, RecordKey};

use crate::diff::StoreDiff;

/// One classified difference, carrying whichever copies exist.
#[derive(Debug, Clone, PartialEq)]
pub struct Change {
    pub key: RecordKey,
    pub category: ChangeCategory,
    pub local: Option<Record>,
    pub remote: Option<Record>,
}

/// Classify every entry of a [`StoreDiff`]. Exactly one category applies to
/// each key; discovery order is preserved.
///
/// Concurrent edits on both sides (both timestamps past the sync point) are
/// a genuine conflict and classify as `ModifiedBoth` — conflicts are
/// resolved by the merge action, not by timestamp precedence. A record
/// present on one side whose own timestamp is past the sync point is an
/// addition, never a stale deletion: added wins.
pub fn classify(diff: &StoreDiff, sync_point: i64) -> Vec<Change> {
    let mut changes = Vec::with_capacity(diff.len());

    for (key, local, remote) in &diff.differences {
        let local_newer = local.change > sync_point;
        let remote_newer = remote.change > sync_point;
        let category = match (local_newer, remote_newer) {
            (true, false) => ChangeCategory::ModifiedLocal,
            (false, true) => ChangeCategory::ModifiedRemote,
            // Neither side past the sync point, or both: in both cases the
            // copies must be reconciled into one.
            _ => ChangeCategory::ModifiedBoth,
        };
        changes.push(Change {
            key: key.clone(),
            category,
            local: Some(local.clone()),
            remote: Some(remote.clone()),
        });
    }

    for (key, local) in &diff.missing_from_remote {
        let category = if local.change > sync_point {
            ChangeCategory::AddedLocal
        } else {
            ChangeCategory::DeletedRemote
        };
        changes.push(Change {
            key: key.clone(),
            category,
            local: Some(local.clone()),
            remote: None,
        });
    }

    for (key, remote) in &diff.missing_from_local {
        let category = if remote.change > sync_point {
            ChangeCategory::AddedRemote
        } else {
            ChangeCategory::DeletedLocal
        };
        changes.push(Change {
            key: key.clone(),
            category,
            local: None,
            remote: Some(remote.clone()),
        });
    }

    changes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::diff_stores;
    use crate::store::MemoryStore;
    use serde_json::json;
    use stemma_types::RecordType;

    fn record(handle: &str, change: i64, payload: &str) -> Record {
        Record::new(handle, RecordType::Person, change, json!({ "v": payload }))
    }

    fn classify_stores(local: &MemoryStore, remote: &MemoryStore, sync_point: i64) -> Vec<Change> {
        classify(&diff_stores(local, remote).unwrap(), sync_point)
    }

    #[test]
    fn modified_sides_relative_to_sync_point() {
        let local = MemoryStore::from_records([
            record("only-local-newer", 150, "l"),
            record("only-remote-newer", 50, "l"),
            record("both-newer", 150, "l"),
            record("neither-newer", 50, "l"),
        ]);
        let remote = MemoryStore::from_records([
            record("only-local-newer", 50, "r"),
            record("only-remote-newer", 150, "r"),
            record("both-newer", 160, "r"),
            record("neither-newer", 60, "r"),
        ]);

        let changes = classify_stores(&local, &remote, 100);
        let category = |handle: &str| {
            changes.iter().find(|c| c.key.handle == handle).map(|c| c.category).unwrap()
        };
        assert_eq!(category("only-local-newer"), ChangeCategory::ModifiedLocal);
        assert_eq!(category("only-remote-newer"), ChangeCategory::ModifiedRemote);
        assert_eq!(category("both-newer"), ChangeCategory::ModifiedBoth);
        assert_eq!(category("neither-newer"), ChangeCategory::ModifiedBoth);
    }

    #[test]
    fn one_sided_keys_split_into_added_and_deleted() {
        let local = MemoryStore::from_records([
            record("added-locally", 150, "l"),
            record("deleted-remotely", 50, "l"),
        ]);
        let remote = MemoryStore::from_records([
            record("added-remotely", 150, "r"),
            record("deleted-locally", 50, "r"),
        ]);

        let changes = classify_stores(&local, &remote, 100);
        let category = |handle: &str| {
            changes.iter().find(|c| c.key.handle == handle).map(|c| c.category).unwrap()
        };
        assert_eq!(category("added-locally"), ChangeCategory::AddedLocal);
        assert_eq!(category("deleted-remotely"), ChangeCategory::DeletedRemote);
        assert_eq!(category("added-remotely"), ChangeCategory::AddedRemote);
        assert_eq!(category("deleted-locally"), ChangeCategory::DeletedLocal);
    }

    #[test]
    fn every_key_gets_exactly_one_category() {
        let local = MemoryStore::from_records([
            record("a", 150, "l"),
            record("b", 50, "same"),
            record("c", 10, "l"),
        ]);
        let remote = MemoryStore::from_records([
            record("a", 150, "r"),
            record("b", 50, "same"),
            record("d", 999, "r"),
        ]);

        let changes = classify_stores(&local, &remote, 100);
        // "b" is identical and absent; a, c, d each appear once.
        assert_eq!(changes.len(), 3);
        let mut keys: Vec<_> = changes.iter().map(|c| c.key.handle.clone()).collect();
        keys.sort();
        keys.dedup();
        assert_eq!(keys, ["a", "c", "d"]);
    }
}
