//! Write batches and scoped transactions.
//!
//! A [`Transaction`] stages writes locally and hands them to the store as a
//! single [`WriteBatch`] on [`Transaction::commit`]. Dropping it, or calling
//! [`Transaction::end`], discards the staged writes. The store applies a
//! batch atomically: either every write is evaluated and merged, or the
//! batch fails and nothing changes.

use std::collections::BTreeSet;

use inv_types::Threshold;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::record::{Model, Record, Stamp};
use crate::traits::ObjectStore;

/// A single staged write.
#[derive(Clone, Debug, PartialEq)]
pub enum Write {
    /// Create; fails with `AlreadyExists` when the key is present.
    Insert(Record),
    /// Upsert with full replace, skipped when stale.
    Update(Record),
    /// Remove, skipped when stale. A non-zero threshold leaves a tombstone.
    Delete {
        kind: String,
        pk: String,
        stamp: Stamp,
    },
    /// Remove every record of `kind` stamped before `before` whose key is
    /// not in `keep`, and forget tombstones older than `before`.
    Prune {
        kind: String,
        before: Threshold,
        keep: BTreeSet<String>,
    },
}

impl Write {
    /// Kind and primary key targeted by a single-record write.
    pub fn key(&self) -> Option<(&str, &str)> {
        match self {
            Self::Insert(r) | Self::Update(r) => Some((&r.kind, &r.pk)),
            Self::Delete { kind, pk, .. } => Some((kind, pk)),
            Self::Prune { .. } => None,
        }
    }
}

/// An ordered batch of writes applied atomically.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WriteBatch {
    writes: Vec<Write>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(write: Write) -> Self {
        Self {
            writes: vec![write],
        }
    }

    pub fn push(&mut self, write: Write) {
        self.writes.push(write);
    }

    pub fn len(&self) -> usize {
        self.writes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Write> {
        self.writes.iter()
    }

    pub fn into_writes(self) -> Vec<Write> {
        self.writes
    }
}

/// Outcome of a committed batch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CommitReport {
    /// Writes that changed state.
    pub applied: usize,
    /// Writes rejected as stale.
    pub skipped: usize,
    /// Records removed by prune writes.
    pub pruned: usize,
}

/// A scoped write transaction.
///
/// Obtained from [`ObjectStore::begin`]. Exactly one of [`commit`] or
/// [`end`] (or drop) finishes it. Nested transactions are not supported;
/// reads through [`Transaction::get`] see the staged writes as issued, with
/// threshold guards deferred to commit.
///
/// [`commit`]: Transaction::commit
/// [`end`]: Transaction::end
pub struct Transaction<'a> {
    store: &'a dyn ObjectStore,
    batch: WriteBatch,
    finished: bool,
}

impl<'a> Transaction<'a> {
    pub fn new(store: &'a dyn ObjectStore) -> Self {
        Self {
            store,
            batch: WriteBatch::new(),
            finished: false,
        }
    }

    /// Read through the staged writes to the committed store.
    pub fn get(&self, kind: &str, pk: &str) -> StoreResult<Record> {
        let staged = self
            .batch
            .iter()
            .rev()
            .find(|w| w.key() == Some((kind, pk)));
        match staged {
            Some(Write::Insert(r)) | Some(Write::Update(r)) => Ok(r.clone()),
            Some(Write::Delete { .. }) => Err(StoreError::not_found(kind, pk)),
            _ => self.store.get(kind, pk),
        }
    }

    /// Stage an insert. Fails immediately if the key is already visible.
    pub fn insert(&mut self, record: Record) -> StoreResult<()> {
        match self.get(&record.kind, &record.pk) {
            Ok(_) => Err(StoreError::already_exists(&record.kind, &record.pk)),
            Err(e) if e.is_not_found() => {
                self.batch.push(Write::Insert(record));
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Stage an upsert.
    pub fn update(&mut self, record: Record) {
        self.batch.push(Write::Update(record));
    }

    /// Stage a delete.
    pub fn delete(&mut self, kind: &str, pk: &str, stamp: impl Into<Stamp>) {
        self.batch.push(Write::Delete {
            kind: kind.into(),
            pk: pk.into(),
            stamp: stamp.into(),
        });
    }

    /// Stage a prune of `kind`.
    pub fn prune(&mut self, kind: &str, before: Threshold, keep: BTreeSet<String>) {
        self.batch.push(Write::Prune {
            kind: kind.into(),
            before,
            keep,
        });
    }

    /// Stage an insert of a typed model.
    pub fn insert_model<M: Model>(&mut self, model: &M, threshold: Threshold) -> StoreResult<()> {
        self.insert(model.to_record(threshold)?)
    }

    /// Number of staged writes.
    pub fn len(&self) -> usize {
        self.batch.len()
    }

    pub fn is_empty(&self) -> bool {
        self.batch.is_empty()
    }

    /// Apply all staged writes atomically.
    pub fn commit(mut self) -> StoreResult<CommitReport> {
        self.finished = true;
        let batch = std::mem::take(&mut self.batch);
        self.store.commit(batch)
    }

    /// Discard all staged writes.
    pub fn end(mut self) {
        self.discard();
    }

    fn discard(&mut self) {
        if !self.finished {
            self.finished = true;
            if !self.batch.is_empty() {
                debug!(staged = self.batch.len(), "transaction ended; staged writes discarded");
            }
            self.batch = WriteBatch::new();
        }
    }
}

impl Drop for Transaction<'_> {
    fn drop(&mut self) {
        self.discard();
    }
}

impl std::fmt::Debug for Transaction<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transaction")
            .field("staged", &self.batch.len())
            .field("finished", &self.finished)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryStore;
    use crate::options::ListOptions;
    use crate::record::fixtures::widget_record;

    #[test]
    fn staged_writes_invisible_until_commit() {
        let store = InMemoryStore::new();
        let mut tx = store.begin().unwrap();
        tx.insert(widget_record("w-1", "", 1)).unwrap();
        tx.insert(widget_record("w-2", "", 1)).unwrap();

        assert!(store.get("Widget", "w-1").unwrap_err().is_not_found());
        assert!(tx.get("Widget", "w-1").is_ok());

        let report = tx.commit().unwrap();
        assert_eq!(report.applied, 2);
        assert!(store.get("Widget", "w-1").is_ok());
    }

    #[test]
    fn end_discards_everything() {
        let store = InMemoryStore::new();
        store.insert(widget_record("keep", "", 1)).unwrap();

        let mut tx = store.begin().unwrap();
        tx.insert(widget_record("w-1", "", 2)).unwrap();
        tx.delete("Widget", "keep", Threshold::new(2));
        tx.end();

        let all = store.list("Widget", &ListOptions::new()).unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].pk, "keep");
    }

    #[test]
    fn drop_without_commit_rolls_back() {
        let store = InMemoryStore::new();
        {
            let mut tx = store.begin().unwrap();
            tx.insert(widget_record("w-1", "", 1)).unwrap();
        }
        assert!(store.is_empty());
    }

    #[test]
    fn staged_duplicate_insert_fails() {
        let store = InMemoryStore::new();
        let mut tx = store.begin().unwrap();
        tx.insert(widget_record("w-1", "", 1)).unwrap();
        let err = tx.insert(widget_record("w-1", "", 1)).unwrap_err();
        assert!(err.is_already_exists());
    }

    #[test]
    fn insert_over_committed_fails() {
        let store = InMemoryStore::new();
        store.insert(widget_record("w-1", "", 1)).unwrap();
        let mut tx = store.begin().unwrap();
        assert!(tx.insert(widget_record("w-1", "", 2)).unwrap_err().is_already_exists());
    }

    #[test]
    fn staged_delete_hides_record() {
        let store = InMemoryStore::new();
        store.insert(widget_record("w-1", "", 1)).unwrap();
        let mut tx = store.begin().unwrap();
        tx.delete("Widget", "w-1", Threshold::new(2));
        assert!(tx.get("Widget", "w-1").unwrap_err().is_not_found());
        // Re-insert after a staged delete is allowed.
        tx.insert(widget_record("w-1", "", 3)).unwrap();
        assert_eq!(tx.len(), 2);
    }

    #[test]
    fn failed_commit_applies_nothing() {
        let store = InMemoryStore::new();
        let mut tx = store.begin().unwrap();
        tx.insert(widget_record("w-1", "", 1)).unwrap();
        tx.insert(widget_record("w-2", "", 1)).unwrap();

        // A concurrent writer claims w-2 before the commit.
        store.insert(widget_record("w-2", "", 1)).unwrap();

        let err = tx.commit().unwrap_err();
        assert!(err.is_already_exists());
        assert!(store.get("Widget", "w-1").unwrap_err().is_not_found());
        assert_eq!(store.len(), 1);
    }
}
