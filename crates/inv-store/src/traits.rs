use inv_types::Threshold;

use crate::error::StoreResult;
use crate::options::ListOptions;
use crate::record::{Model, Record, Stamp};
use crate::transaction::{CommitReport, Transaction, Write, WriteBatch};

/// Transactional record store.
///
/// All implementations must satisfy these invariants:
/// - Primary keys are unique per kind; `Insert` of a present key fails with
///   `AlreadyExists`.
/// - [`ObjectStore::commit`] applies a batch atomically. On error, state is
///   exactly as before the call.
/// - A write whose [`Stamp`] is older than the stored record (or the
///   tombstone of a deleted record) is skipped, not failed.
/// - Conflicting writes to the same key are serialized.
/// - Reads never observe uncommitted writes.
pub trait ObjectStore: Send + Sync {
    /// Read a record. Returns `NotFound` if absent.
    fn get(&self, kind: &str, pk: &str) -> StoreResult<Record>;

    /// List records of `kind` accepted by the options, ordered by pk.
    fn list(&self, kind: &str, options: &ListOptions) -> StoreResult<Vec<Record>>;

    /// Apply a batch of writes atomically.
    fn commit(&self, batch: WriteBatch) -> StoreResult<CommitReport>;

    /// Open a transaction against this store.
    fn begin(&self) -> StoreResult<Transaction<'_>>;

    /// Number of records of `kind` accepted by the options, ignoring paging.
    fn count(&self, kind: &str, options: &ListOptions) -> StoreResult<usize> {
        let mut unpaged = options.clone();
        unpaged.page = None;
        Ok(self.list(kind, &unpaged)?.len())
    }

    /// Insert a single record.
    fn insert(&self, record: Record) -> StoreResult<()> {
        self.commit(WriteBatch::single(Write::Insert(record)))
            .map(|_| ())
    }

    /// Upsert a single record. Returns `false` if the write was stale.
    fn update(&self, record: Record) -> StoreResult<bool> {
        self.commit(WriteBatch::single(Write::Update(record)))
            .map(|report| report.applied > 0)
    }

    /// Delete a record unconditionally. Absent records are not an error.
    fn delete(&self, kind: &str, pk: &str) -> StoreResult<()> {
        self.delete_at(kind, pk, Threshold::ZERO).map(|_| ())
    }

    /// Delete a record unless it carries a newer threshold. Returns `true`
    /// if a record was removed.
    fn delete_at(&self, kind: &str, pk: &str, threshold: Threshold) -> StoreResult<bool> {
        self.delete_stamped(kind, pk, Stamp::from(threshold))
    }

    /// Delete a record unless its stamp is newer than `stamp`.
    fn delete_stamped(&self, kind: &str, pk: &str, stamp: Stamp) -> StoreResult<bool> {
        self.commit(WriteBatch::single(Write::Delete {
            kind: kind.into(),
            pk: pk.into(),
            stamp,
        }))
        .map(|report| report.applied > 0)
    }
}

/// Typed helpers over any [`ObjectStore`].
pub trait StoreExt: ObjectStore {
    fn get_model<M: Model>(&self, pk: &str) -> StoreResult<M> {
        self.get(M::KIND, pk)?.decode()
    }

    fn list_models<M: Model>(&self, options: &ListOptions) -> StoreResult<Vec<M>> {
        self.list(M::KIND, options)?
            .iter()
            .map(|r| r.decode::<M>())
            .collect()
    }

    fn insert_model<M: Model>(&self, model: &M) -> StoreResult<()> {
        self.insert(model.to_record(Threshold::ZERO)?)
    }

    fn update_model<M: Model>(&self, model: &M) -> StoreResult<bool> {
        self.update(model.to_record(Threshold::ZERO)?)
    }

    fn delete_model<M: Model>(&self, pk: &str) -> StoreResult<()> {
        self.delete(M::KIND, pk)
    }
}

impl<S: ObjectStore + ?Sized> StoreExt for S {}
