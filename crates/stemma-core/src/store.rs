//! Record store abstraction, transaction scoping, and an in-memory store.

use std::collections::BTreeMap;

use stemma_types::{Record, RecordKey, RecordType};

use crate::error::StoreError;

/// Object store adapter: per-type handle listing plus get/add/commit/remove
/// by key. The sync engine is agnostic of how records are persisted.
pub trait RecordStore {
    /// All handles of the given type, in a stable order.
    fn list_handles(&self, kind: RecordType) -> Result<Vec<String>, StoreError>;

    fn get(&self, key: &RecordKey) -> Result<Option<Record>, StoreError>;

    /// Add a record that must not already exist.
    fn add(&mut self, record: Record) -> Result<(), StoreError>;

    /// Commit (update) an existing record.
    fn commit(&mut self, record: Record) -> Result<(), StoreError>;

    fn remove(&mut self, key: &RecordKey) -> Result<(), StoreError>;
}

/// A store with explicit transaction boundaries. Mutations between
/// [`begin`](Self::begin) and [`commit_transaction`](Self::commit_transaction)
/// are atomic; [`rollback`](Self::rollback) discards them.
pub trait TransactionalStore: RecordStore {
    fn begin(&mut self) -> Result<(), StoreError>;
    fn commit_transaction(&mut self) -> Result<(), StoreError>;
    fn rollback(&mut self) -> Result<(), StoreError>;
}

/// Scoped transaction acquisition: rolls back on drop unless committed, so
/// every exit path, including panics during action application, releases the
/// scope.
pub struct TransactionGuard<'a, S: TransactionalStore + ?Sized> {
    store: &'a mut S,
    finished: bool,
}

impl<'a, S: TransactionalStore + ?Sized> TransactionGuard<'a, S> {
    pub fn begin(store: &'a mut S) -> Result<Self, StoreError> {
        store.begin()?;
        Ok(Self { store, finished: false })
    }

    pub fn store(&mut self) -> &mut S {
        self.store
    }

    pub fn commit(mut self) -> Result<(), StoreError> {
        self.finished = true;
        self.store.commit_transaction()
    }

    pub fn rollback(mut self) -> Result<(), StoreError> {
        self.finished = true;
        self.store.rollback()
    }
}

impl<S: TransactionalStore + ?Sized> Drop for TransactionGuard<'_, S> {
    fn drop(&mut self) {
        if !self.finished {
            if let Err(e) = self.store.rollback() {
                tracing::error!("Failed to roll back abandoned transaction: {}", e);
            }
        }
    }
}

/// In-memory reference store, used by tests and by remote views built from a
/// downloaded export.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: BTreeMap<RecordKey, Record>,
    snapshot: Option<BTreeMap<RecordKey, Record>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from a set of records, e.g. a parsed export.
    pub fn from_records(records: impl IntoIterator<Item = Record>) -> Self {
        Self {
            records: records.into_iter().map(|r| (r.key(), r)).collect(),
            snapshot: None,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> impl Iterator<Item = &Record> {
        self.records.values()
    }
}

impl RecordStore for MemoryStore {
    fn list_handles(&self, kind: RecordType) -> Result<Vec<String>, StoreError> {
        Ok(self
            .records
            .values()
            .filter(|r| r.kind == kind)
            .map(|r| r.handle.clone())
            .collect())
    }

    fn get(&self, key: &RecordKey) -> Result<Option<Record>, StoreError> {
        Ok(self.records.get(key).cloned())
    }

    fn add(&mut self, record: Record) -> Result<(), StoreError> {
        let key = record.key();
        if self.records.contains_key(&key) {
            return Err(StoreError::Duplicate(key.to_string()));
        }
        self.records.insert(key, record);
        Ok(())
    }

    fn commit(&mut self, record: Record) -> Result<(), StoreError> {
        self.records.insert(record.key(), record);
        Ok(())
    }

    fn remove(&mut self, key: &RecordKey) -> Result<(), StoreError> {
        self.records
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }
}

impl TransactionalStore for MemoryStore {
    fn begin(&mut self) -> Result<(), StoreError> {
        if self.snapshot.is_some() {
            return Err(StoreError::Transaction("transaction already open".into()));
        }
        self.snapshot = Some(self.records.clone());
        Ok(())
    }

    fn commit_transaction(&mut self) -> Result<(), StoreError> {
        self.snapshot
            .take()
            .map(|_| ())
            .ok_or_else(|| StoreError::Transaction("no open transaction".into()))
    }

    fn rollback(&mut self) -> Result<(), StoreError> {
        let snapshot = self
            .snapshot
            .take()
            .ok_or_else(|| StoreError::Transaction("no open transaction".into()))?;
        self.records = snapshot;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn person(handle: &str, change: i64) -> Record {
        Record::new(handle, RecordType::Person, change, json!({"handle": handle}))
    }

    #[test]
    fn add_rejects_duplicates() {
        let mut store = MemoryStore::new();
        store.add(person("h1", 10)).unwrap();
        assert!(matches!(store.add(person("h1", 20)), Err(StoreError::Duplicate(_))));
    }

    #[test]
    fn remove_missing_is_an_error() {
        let mut store = MemoryStore::new();
        let key = RecordKey::new("gone", RecordType::Person);
        assert!(matches!(store.remove(&key), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn guard_rolls_back_on_drop() {
        let mut store = MemoryStore::new();
        store.add(person("h1", 10)).unwrap();
        {
            let mut guard = TransactionGuard::begin(&mut store).unwrap();
            guard.store().remove(&RecordKey::new("h1", RecordType::Person)).unwrap();
            guard.store().add(person("h2", 20)).unwrap();
            // dropped without commit
        }
        assert_eq!(store.len(), 1);
        assert!(store.get(&RecordKey::new("h1", RecordType::Person)).unwrap().is_some());
    }

    #[test]
    fn guard_commit_keeps_mutations() {
        let mut store = MemoryStore::new();
        let mut guard = TransactionGuard::begin(&mut store).unwrap();
        guard.store().add(person("h1", 10)).unwrap();
        guard.commit().unwrap();
        assert_eq!(store.len(), 1);
    }
}
