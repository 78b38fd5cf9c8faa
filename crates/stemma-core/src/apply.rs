//! Ordered action application against paired transaction scopes.

use serde_json::Value;
use stemma_types::{
    Action, ActionKind, EntryKind, Record, RecordType, SyncReport, TransactionEntry,
};

use crate::error::{StoreError, SyncError};
use crate::merge::Merger;
use crate::store::{TransactionGuard, TransactionalStore};

/// Outgoing transaction scope for the remote store: queues wire entries that
/// are submitted as one payload through the API client.
#[derive(Debug, Default)]
pub struct RemoteTransaction {
    entries: Vec<TransactionEntry>,
}

impl RemoteTransaction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn entries(&self) -> &[TransactionEntry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<TransactionEntry> {
        self.entries
    }

    /// Queue a pre-built entry from an ordered local transaction log.
    /// Entries whose class is a reference-only relation rather than a
    /// primary record class are skipped.
    pub fn push_entry(&mut self, entry: TransactionEntry) {
        if RecordType::from_class_name(&entry.class).is_none() {
            tracing::debug!("Skipping non-primary transaction entry: {}", entry.class);
            return;
        }
        self.entries.push(entry);
    }

    pub fn add(&mut self, record: &Record) -> Result<(), SyncError> {
        let new = serde_json::to_value(record)?;
        self.push(EntryKind::Add, record, None, Some(new));
        Ok(())
    }

    pub fn update(&mut self, old: &Record, new: &Record) -> Result<(), SyncError> {
        let old_value = serde_json::to_value(old)?;
        let new_value = serde_json::to_value(new)?;
        self.push(EntryKind::Update, new, Some(old_value), Some(new_value));
        Ok(())
    }

    pub fn delete(&mut self, record: &Record) -> Result<(), SyncError> {
        let old = serde_json::to_value(record)?;
        self.push(EntryKind::Delete, record, Some(old), None);
        Ok(())
    }

    fn push(&mut self, kind: EntryKind, record: &Record, old: Option<Value>, new: Option<Value>) {
        self.entries.push(TransactionEntry {
            kind,
            handle: record.handle.clone(),
            class: record.kind.class_name().to_string(),
            old,
            new,
        });
    }
}

fn expect_record<'a>(
    record: Option<&'a Record>,
    side: &str,
    action: &Action,
) -> Result<&'a Record, SyncError> {
    record.ok_or_else(|| {
        SyncError::Store(StoreError::Backend(format!(
            "{:?} for {} has no {} record",
            action.kind, action.key, side
        )))
    })
}

/// Apply each action exactly once, in list order, with no reordering or
/// batching. Local-facing actions mutate the store inside the open guard;
/// remote-facing actions queue wire entries. The first error halts the run
/// and is wrapped with how many actions were attempted vs. completed.
pub fn apply_actions<S: TransactionalStore + ?Sized>(
    actions: &[Action],
    local: &mut TransactionGuard<'_, S>,
    remote: &mut RemoteTransaction,
    merger: &dyn Merger,
    report: &mut SyncReport,
) -> Result<(), SyncError> {
    for (completed, action) in actions.iter().enumerate() {
        apply_one(action, local, remote, merger).map_err(|source| SyncError::PartialApply {
            attempted: actions.len(),
            completed,
            source: Box::new(source),
        })?;
        report.record(action.kind);
    }
    Ok(())
}

fn apply_one<S: TransactionalStore + ?Sized>(
    action: &Action,
    local: &mut TransactionGuard<'_, S>,
    remote: &mut RemoteTransaction,
    merger: &dyn Merger,
) -> Result<(), SyncError> {
    match action.kind {
        ActionKind::AddLocal => {
            let record = expect_record(action.remote.as_ref(), "remote", action)?;
            local.store().add(record.clone())?;
        }
        ActionKind::UpdateLocal => {
            let record = expect_record(action.remote.as_ref(), "remote", action)?;
            local.store().commit(record.clone())?;
        }
        ActionKind::DeleteLocal => {
            local.store().remove(&action.key)?;
        }
        ActionKind::AddRemote => {
            let record = expect_record(action.local.as_ref(), "local", action)?;
            remote.add(record)?;
        }
        ActionKind::UpdateRemote => {
            let new = expect_record(action.local.as_ref(), "local", action)?;
            let old = expect_record(action.remote.as_ref(), "remote", action)?;
            remote.update(old, new)?;
        }
        ActionKind::DeleteRemote => {
            let record = expect_record(action.remote.as_ref(), "remote", action)?;
            remote.delete(record)?;
        }
        ActionKind::MergeRemote => {
            let base = expect_record(action.remote.as_ref(), "remote", action)?;
            let local_copy = expect_record(action.local.as_ref(), "local", action)?;

            // The incoming copy loses its store-local identifier before the
            // base absorbs it; the merged result is committed to both
            // scopes under the base's handle and identifier.
            let mut incoming = local_copy.clone();
            incoming.gramps_id = None;
            let mut merged = merger.merge(base, &incoming);
            merged.handle = base.handle.clone();
            merged.kind = base.kind;
            merged.gramps_id = base.gramps_id.clone();

            local.store().commit(merged.clone())?;
            remote.update(base, &merged)?;
        }
    }
    Ok(())
}
