use std::collections::{BTreeSet, HashMap};
use std::sync::RwLock;

use inv_types::Threshold;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::options::ListOptions;
use crate::record::{Record, Stamp};
use crate::traits::ObjectStore;
use crate::transaction::{CommitReport, Transaction, Write, WriteBatch};

/// Tombstones retained per kind before the oldest are evicted.
pub const DEFAULT_TOMBSTONE_LIMIT: usize = 4096;

/// In-memory, HashMap-based record store.
///
/// Records live in one table per kind behind a single `RwLock`. A commit
/// takes the write lock once, evaluates the whole batch against an overlay,
/// and merges the overlay only if every write succeeded. Deletes stamped
/// with a threshold leave a tombstone so that a stale write cannot bring
/// the record back.
///
/// Tombstones are forgotten by a reconcile prune, and each kind keeps at
/// most a fixed number of them. Past the limit the oldest quarter is
/// evicted, so a watch stream that only deletes cannot grow the map without
/// bound.
pub struct InMemoryStore {
    state: RwLock<StoreState>,
}

struct StoreState {
    tables: HashMap<String, HashMap<String, Record>>,
    tombstones: HashMap<String, HashMap<String, Stamp>>,
    tombstone_limit: usize,
}

impl Default for StoreState {
    fn default() -> Self {
        Self {
            tables: HashMap::new(),
            tombstones: HashMap::new(),
            tombstone_limit: DEFAULT_TOMBSTONE_LIMIT,
        }
    }
}

impl StoreState {
    fn record(&self, kind: &str, pk: &str) -> Option<&Record> {
        self.tables.get(kind).and_then(|t| t.get(pk))
    }

    fn tombstone(&self, kind: &str, pk: &str) -> Option<Stamp> {
        self.tombstones.get(kind).and_then(|t| t.get(pk)).copied()
    }

    /// Evict the oldest tombstones of every kind over the limit, down to
    /// three quarters of it.
    fn trim_tombstones(&mut self) {
        let limit = self.tombstone_limit;
        for (kind, tombs) in self.tombstones.iter_mut() {
            if tombs.len() <= limit {
                continue;
            }
            let before = tombs.len();
            let keep = limit - limit / 4;
            if keep == 0 {
                tombs.clear();
            } else {
                let mut ages: Vec<Threshold> = tombs.values().map(|s| s.threshold).collect();
                let cut = ages.len() - keep;
                let (_, floor, _) = ages.select_nth_unstable(cut);
                let floor = *floor;
                tombs.retain(|_, s| s.threshold >= floor);
            }
            debug!(%kind, evicted = before - tombs.len(), "tombstones evicted");
        }
    }
}

/// Pending state of one key while a batch is evaluated.
#[derive(Clone, Debug)]
enum Slot {
    Present(Record),
    Absent(Option<Stamp>),
}

/// Batch evaluation scratchpad. Nothing here touches committed state.
#[derive(Default)]
struct Overlay {
    slots: HashMap<(String, String), Slot>,
    purges: Vec<(String, Threshold)>,
    report: CommitReport,
}

impl Overlay {
    /// Effective record and tombstone for a key: overlay first, then state.
    fn view<'s>(
        &'s self,
        state: &'s StoreState,
        kind: &str,
        pk: &str,
    ) -> (Option<&'s Record>, Option<Stamp>) {
        match self.slots.get(&(kind.to_string(), pk.to_string())) {
            Some(Slot::Present(r)) => (Some(r), None),
            Some(Slot::Absent(t)) => (None, t.or_else(|| state.tombstone(kind, pk))),
            None => (state.record(kind, pk), state.tombstone(kind, pk)),
        }
    }

    fn set(&mut self, kind: &str, pk: &str, slot: Slot) {
        self.slots.insert((kind.to_string(), pk.to_string()), slot);
    }

    fn evaluate(&mut self, state: &StoreState, write: Write) -> StoreResult<()> {
        match write {
            Write::Insert(record) => {
                let (current, tombstone) = self.view(state, &record.kind, &record.pk);
                if current.is_some() {
                    return Err(StoreError::already_exists(&record.kind, &record.pk));
                }
                if tombstone.is_some_and(|t| record.stamp().is_stale_against(&t)) {
                    debug!(kind = %record.kind, pk = %record.pk, threshold = %record.threshold, "stale insert skipped");
                    self.report.skipped += 1;
                    return Ok(());
                }
                let (kind, pk) = (record.kind.clone(), record.pk.clone());
                self.set(&kind, &pk, Slot::Present(record));
                self.report.applied += 1;
            }
            Write::Update(record) => {
                let (current, tombstone) = self.view(state, &record.kind, &record.pk);
                let guard = current.map(Record::stamp).or(tombstone);
                if guard.is_some_and(|t| record.stamp().is_stale_against(&t)) {
                    debug!(kind = %record.kind, pk = %record.pk, threshold = %record.threshold, "stale update skipped");
                    self.report.skipped += 1;
                    return Ok(());
                }
                let (kind, pk) = (record.kind.clone(), record.pk.clone());
                self.set(&kind, &pk, Slot::Present(record));
                self.report.applied += 1;
            }
            Write::Delete { kind, pk, stamp } => {
                let (current, tombstone) = self.view(state, &kind, &pk);
                let stored = current.map(Record::stamp);
                let marker = (!stamp.threshold.is_zero()).then_some(stamp);
                match stored {
                    Some(t) if stamp.is_stale_against(&t) => {
                        debug!(%kind, %pk, threshold = %stamp.threshold, "stale delete skipped");
                        self.report.skipped += 1;
                    }
                    Some(_) => {
                        self.set(&kind, &pk, Slot::Absent(marker));
                        self.report.applied += 1;
                    }
                    None => {
                        // Absent already; only a newer tombstone is worth keeping.
                        let newer = marker.filter(|m| tombstone.map_or(true, |t| t.is_stale_against(m)));
                        if newer.is_some() {
                            self.set(&kind, &pk, Slot::Absent(newer));
                        }
                    }
                }
            }
            Write::Prune { kind, before, keep } => {
                self.prune(state, &kind, before, &keep);
            }
        }
        Ok(())
    }

    fn prune(&mut self, state: &StoreState, kind: &str, before: Threshold, keep: &BTreeSet<String>) {
        let mut candidates: BTreeSet<String> = state
            .tables
            .get(kind)
            .map(|t| t.keys().cloned().collect())
            .unwrap_or_default();
        candidates.extend(
            self.slots
                .keys()
                .filter(|(k, _)| k == kind)
                .map(|(_, pk)| pk.clone()),
        );
        for pk in candidates {
            if keep.contains(&pk) {
                continue;
            }
            let (current, _) = self.view(state, kind, &pk);
            if current.is_some_and(|r| r.threshold < before) {
                self.set(kind, &pk, Slot::Absent(None));
                self.report.pruned += 1;
            }
        }
        self.purges.push((kind.to_string(), before));
    }

    fn merge(self, state: &mut StoreState) -> CommitReport {
        for (kind, before) in &self.purges {
            if let Some(tombs) = state.tombstones.get_mut(kind) {
                tombs.retain(|_, t| t.threshold >= *before);
            }
        }
        for ((kind, pk), slot) in self.slots {
            match slot {
                Slot::Present(record) => {
                    if let Some(tombs) = state.tombstones.get_mut(&kind) {
                        tombs.remove(&pk);
                    }
                    state.tables.entry(kind).or_default().insert(pk, record);
                }
                Slot::Absent(marker) => {
                    if let Some(table) = state.tables.get_mut(&kind) {
                        table.remove(&pk);
                    }
                    if let Some(t) = marker {
                        state.tombstones.entry(kind).or_default().insert(pk, t);
                    }
                }
            }
        }
        state.trim_tombstones();
        self.report
    }
}

impl InMemoryStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            state: RwLock::new(StoreState::default()),
        }
    }

    /// Create an empty store retaining at most `limit` tombstones per kind.
    pub fn with_tombstone_limit(limit: usize) -> Self {
        Self {
            state: RwLock::new(StoreState {
                tombstone_limit: limit,
                ..StoreState::default()
            }),
        }
    }

    /// Total number of records across all kinds.
    pub fn len(&self) -> usize {
        self.state
            .read()
            .map(|s| s.tables.values().map(HashMap::len).sum())
            .unwrap_or(0)
    }

    /// Returns `true` if no records are stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sorted list of kinds that currently hold at least one record.
    pub fn kinds(&self) -> Vec<String> {
        let Ok(state) = self.state.read() else {
            return Vec::new();
        };
        let mut kinds: Vec<String> = state
            .tables
            .iter()
            .filter(|(_, t)| !t.is_empty())
            .map(|(k, _)| k.clone())
            .collect();
        kinds.sort();
        kinds
    }

    /// Number of tombstones currently retained.
    pub fn tombstone_count(&self) -> usize {
        self.state
            .read()
            .map(|s| s.tombstones.values().map(HashMap::len).sum())
            .unwrap_or(0)
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectStore for InMemoryStore {
    fn get(&self, kind: &str, pk: &str) -> StoreResult<Record> {
        let state = self.state.read().map_err(|_| StoreError::LockPoisoned)?;
        state
            .record(kind, pk)
            .cloned()
            .ok_or_else(|| StoreError::not_found(kind, pk))
    }

    fn list(&self, kind: &str, options: &ListOptions) -> StoreResult<Vec<Record>> {
        let state = self.state.read().map_err(|_| StoreError::LockPoisoned)?;
        let matched: Vec<Record> = state
            .tables
            .get(kind)
            .map(|table| {
                table
                    .values()
                    .filter(|r| options.accepts(r))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        Ok(options.window(matched))
    }

    fn commit(&self, batch: WriteBatch) -> StoreResult<CommitReport> {
        if batch.is_empty() {
            return Ok(CommitReport::default());
        }
        let mut state = self.state.write().map_err(|_| StoreError::LockPoisoned)?;
        let mut overlay = Overlay::default();
        for write in batch.into_writes() {
            overlay.evaluate(&state, write)?;
        }
        let report = overlay.merge(&mut state);
        debug!(
            applied = report.applied,
            skipped = report.skipped,
            pruned = report.pruned,
            "batch committed"
        );
        Ok(report)
    }

    fn begin(&self) -> StoreResult<Transaction<'_>> {
        Ok(Transaction::new(self))
    }
}

impl std::fmt::Debug for InMemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryStore")
            .field("record_count", &self.len())
            .field("tombstone_count", &self.tombstone_count())
            .finish()
    }
}
