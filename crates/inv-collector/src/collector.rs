use async_trait::async_trait;
use inv_types::Threshold;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::error::CollectResult;
use crate::event::{EventResult, Object, WatchEvent};

/// Lifecycle of a collector.
///
/// `Idle -> Reconciling -> Watching`. A canceled or failed pass returns the
/// collector to `Idle`; a periodic resync moves it from `Watching` back to
/// `Reconciling`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CollectorState {
    #[default]
    Idle,
    Reconciling,
    Watching,
}

/// Outcome of one reconcile pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Threshold stamped on every record the pass wrote.
    pub threshold: Threshold,
    /// Resources returned by the provider.
    pub listed: usize,
    /// Records written.
    pub applied: usize,
    /// Records left alone because a newer write already landed.
    pub skipped: usize,
    /// Records removed because the provider no longer lists them.
    pub pruned: usize,
    /// The pass was canceled and committed nothing.
    pub canceled: bool,
}

impl ReconcileReport {
    pub fn canceled(threshold: Threshold) -> Self {
        Self {
            threshold,
            canceled: true,
            ..Default::default()
        }
    }
}

/// Synchronizes one resource kind of one provider into the store.
#[async_trait]
pub trait Collector: Send + Sync {
    /// Kind tag of the records this collector writes.
    fn kind(&self) -> &'static str;

    fn state(&self) -> CollectorState;

    /// Observe state transitions.
    fn subscribe(&self) -> watch::Receiver<CollectorState>;

    /// Bulk load the provider's current resources in one transaction.
    ///
    /// Cancellation is checked before each resource; a canceled pass
    /// returns `Ok` with [`ReconcileReport::canceled`] set and commits
    /// nothing.
    async fn reconcile(&self, cancel: &CancellationToken) -> CollectResult<ReconcileReport>;

    fn created(&self, object: &Object) -> EventResult;

    fn updated(&self, old: &Object, new: &Object) -> EventResult;

    fn deleted(&self, object: &Object) -> EventResult;

    fn generic(&self, object: &Object) -> EventResult;

    /// Route an event to the matching handler.
    fn handle(&self, event: &WatchEvent) -> EventResult {
        match event {
            WatchEvent::Created(object) => self.created(object),
            WatchEvent::Updated { old, new } => self.updated(old, new),
            WatchEvent::Deleted(object) => self.deleted(object),
            WatchEvent::Generic(object) => self.generic(object),
        }
    }
}
