//! Store diffing and common-sync-point computation.

use stemma_types::{Record, RecordKey, RecordType};

use crate::error::StoreError;
use crate::store::RecordStore;

/// Outcome of diffing two stores. Entry order is discovery order (types in
/// [`RecordType::ALL`] order, handles in store listing order) and is
/// preserved through planning and application.
#[derive(Debug, Clone, Default)]
pub struct StoreDiff {
    /// Keys present in both stores with unequal payloads: `(key, local, remote)`.
    pub differences: Vec<(RecordKey, Record, Record)>,
    /// Keys present only in the remote store.
    pub missing_from_local: Vec<(RecordKey, Record)>,
    /// Keys present only in the local store.
    pub missing_from_remote: Vec<(RecordKey, Record)>,
}

impl StoreDiff {
    pub fn is_empty(&self) -> bool {
        self.differences.is_empty()
            && self.missing_from_local.is_empty()
            && self.missing_from_remote.is_empty()
    }

    pub fn len(&self) -> usize {
        self.differences.len() + self.missing_from_local.len() + self.missing_from_remote.len()
    }
}

/// Compare two stores record by record.
pub fn diff_stores<L, R>(local: &L, remote: &R) -> Result<StoreDiff, StoreError>
where
    L: RecordStore + ?Sized,
    R: RecordStore + ?Sized,
{
    let mut diff = StoreDiff::default();

    for kind in RecordType::ALL {
        let local_handles = local.list_handles(kind)?;
        for handle in &local_handles {
            let key = RecordKey::new(handle.clone(), kind);
            let local_record = local
                .get(&key)?
                .ok_or_else(|| StoreError::NotFound(key.to_string()))?;
            match remote.get(&key)? {
                Some(remote_record) => {
                    if !local_record.same_payload(&remote_record) {
                        diff.differences.push((key, local_record, remote_record));
                    }
                }
                None => diff.missing_from_remote.push((key, local_record)),
            }
        }

        for handle in remote.list_handles(kind)? {
            if local_handles.contains(&handle) {
                continue;
            }
            let key = RecordKey::new(handle, kind);
            let remote_record = remote
                .get(&key)?
                .ok_or_else(|| StoreError::NotFound(key.to_string()))?;
            diff.missing_from_local.push((key, remote_record));
        }
    }

    Ok(diff)
}

/// Latest timestamp at which both stores are known to have agreed.
///
/// Per record type, candidates are the handles present in both stores with
/// equal payloads; a candidate contributes its `change` timestamp only when
/// both copies carry exactly the same one. Pairs that agree on payload but
/// disagree on timestamp are excluded, which under-advances the sync point
/// under clock skew but never over-advances it. The per-type maxima are
/// reduced to a run-wide maximum, raised to the persisted `last_synced`
/// value when that is newer.
pub fn common_sync_point<L, R>(local: &L, remote: &R, last_synced: i64) -> Result<i64, StoreError>
where
    L: RecordStore + ?Sized,
    R: RecordStore + ?Sized,
{
    let mut newest: i64 = 0;

    for kind in RecordType::ALL {
        let mut type_newest: i64 = 0;
        for handle in local.list_handles(kind)? {
            let key = RecordKey::new(handle, kind);
            let local_record = local
                .get(&key)?
                .ok_or_else(|| StoreError::NotFound(key.to_string()))?;
            let Some(remote_record) = remote.get(&key)? else {
                continue;
            };
            if !local_record.same_payload(&remote_record) {
                continue;
            }
            if local_record.change == remote_record.change {
                type_newest = type_newest.max(local_record.change);
            }
        }
        newest = newest.max(type_newest);
    }

    Ok(newest.max(last_synced))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde_json::json;
    use stemma_types::Record;

    fn record(handle: &str, kind: RecordType, change: i64, payload: &str) -> Record {
        Record::new(handle, kind, change, json!({ "v": payload }))
    }

    #[test]
    fn diff_partitions_keys() {
        let local = MemoryStore::from_records([
            record("both-same", RecordType::Person, 10, "a"),
            record("both-diff", RecordType::Person, 20, "local"),
            record("local-only", RecordType::Event, 30, "x"),
        ]);
        let remote = MemoryStore::from_records([
            record("both-same", RecordType::Person, 10, "a"),
            record("both-diff", RecordType::Person, 25, "remote"),
            record("remote-only", RecordType::Note, 40, "y"),
        ]);

        let diff = diff_stores(&local, &remote).unwrap();
        assert_eq!(diff.differences.len(), 1);
        assert_eq!(diff.differences[0].0.handle, "both-diff");
        assert_eq!(diff.missing_from_remote.len(), 1);
        assert_eq!(diff.missing_from_remote[0].0.handle, "local-only");
        assert_eq!(diff.missing_from_local.len(), 1);
        assert_eq!(diff.missing_from_local[0].0.handle, "remote-only");
    }

    #[test]
    fn identical_stores_have_empty_diff() {
        let records =
            [record("h1", RecordType::Person, 10, "a"), record("h2", RecordType::Tag, 20, "b")];
        let local = MemoryStore::from_records(records.clone());
        let remote = MemoryStore::from_records(records);
        assert!(diff_stores(&local, &remote).unwrap().is_empty());
    }

    #[test]
    fn sync_point_takes_newest_agreeing_timestamp() {
        let local = MemoryStore::from_records([
            record("h1", RecordType::Person, 100, "a"),
            record("h2", RecordType::Person, 300, "b"),
            record("h3", RecordType::Event, 200, "c"),
        ]);
        let remote = MemoryStore::from_records([
            record("h1", RecordType::Person, 100, "a"),
            record("h2", RecordType::Person, 300, "b"),
            record("h3", RecordType::Event, 200, "c"),
        ]);
        assert_eq!(common_sync_point(&local, &remote, 0).unwrap(), 300);
    }

    #[test]
    fn sync_point_excludes_timestamp_mismatch() {
        // Equal payload but different change timestamps: conservatively
        // not a candidate.
        let local = MemoryStore::from_records([record("h1", RecordType::Person, 100, "a")]);
        let remote = MemoryStore::from_records([record("h1", RecordType::Person, 150, "a")]);
        assert_eq!(common_sync_point(&local, &remote, 0).unwrap(), 0);
    }

    #[test]
    fn sync_point_excludes_differing_payloads() {
        let local = MemoryStore::from_records([record("h1", RecordType::Person, 500, "local")]);
        let remote = MemoryStore::from_records([record("h1", RecordType::Person, 500, "remote")]);
        assert_eq!(common_sync_point(&local, &remote, 0).unwrap(), 0);
    }

    #[test]
    fn sync_point_raised_by_persisted_value() {
        let local = MemoryStore::from_records([record("h1", RecordType::Person, 100, "a")]);
        let remote = MemoryStore::from_records([record("h1", RecordType::Person, 100, "a")]);
        assert_eq!(common_sync_point(&local, &remote, 250).unwrap(), 250);
        assert_eq!(common_sync_point(&local, &remote, 50).unwrap(), 100);
    }
}
