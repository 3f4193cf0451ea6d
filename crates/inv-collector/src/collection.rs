//! Generic collector over one (source type, model) pair.

use std::any::Any;
use std::collections::BTreeSet;
use std::marker::PhantomData;

use async_trait::async_trait;
use inv_model::With;
use inv_store::{Model, Stamp, StoreError};
use inv_types::Threshold;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::collector::{Collector, CollectorState, ReconcileReport};
use crate::context::CollectorContext;
use crate::error::{CollectError, CollectResult};
use crate::event::{EventResult, Object};
use crate::lister::Lister;

/// Collects provider resources of type `S` into store models `M`, listing
/// through `L`.
pub struct Collection<S, M, L> {
    context: CollectorContext,
    lister: L,
    state: watch::Sender<CollectorState>,
    _types: PhantomData<fn(&S) -> M>,
}

impl<S, M, L> Collection<S, M, L>
where
    S: Any + Send + Sync,
    M: Model + With<S>,
    L: Lister<S>,
{
    pub fn new(context: CollectorContext, lister: L) -> Self {
        let (state, _) = watch::channel(CollectorState::Idle);
        Self {
            context,
            lister,
            state,
            _types: PhantomData,
        }
    }

    pub fn context(&self) -> &CollectorContext {
        &self.context
    }

    pub fn lister(&self) -> &L {
        &self.lister
    }

    /// Stage every listed resource in one transaction and commit it.
    fn write_pass(
        &self,
        items: &[S],
        threshold: Threshold,
        cancel: &CancellationToken,
    ) -> CollectResult<ReconcileReport> {
        let store = self.context.store();
        let stage = |context: &str| {
            let context = format!("reconcile {context}");
            move |e: StoreError| CollectError::store(M::KIND, context, e)
        };
        let mut tx = store.begin().map_err(stage("begin"))?;
        let mut seen = BTreeSet::new();
        for item in items {
            if cancel.is_cancelled() {
                info!(
                    kind = M::KIND,
                    provider = self.context.provider(),
                    staged = tx.len(),
                    "reconcile canceled; nothing committed"
                );
                return Ok(ReconcileReport::canceled(threshold));
            }
            let model = M::with(item);
            let pk = model.pk().to_string();
            if !seen.insert(pk.clone()) {
                return Err(stage("listing")(StoreError::already_exists(M::KIND, pk)));
            }
            tx.update(model.to_record(threshold).map_err(stage("encode"))?);
            debug!(kind = M::KIND, %pk, %threshold, "staged");
        }
        tx.prune(M::KIND, threshold, seen);
        let committed = tx.commit().map_err(stage("commit"))?;
        Ok(ReconcileReport {
            threshold,
            listed: items.len(),
            applied: committed.applied,
            skipped: committed.skipped,
            pruned: committed.pruned,
            canceled: false,
        })
    }

    fn narrow<'o>(&self, object: &'o Object) -> Option<&'o S> {
        object.downcast_ref::<S>()
    }

    fn convert(&self, object: &Object) -> Option<(M, Threshold)> {
        let source = self.narrow(object)?;
        Some((M::with(source), self.context.tick()))
    }
}

#[async_trait]
impl<S, M, L> Collector for Collection<S, M, L>
where
    S: Any + Send + Sync,
    M: Model + With<S>,
    L: Lister<S>,
{
    fn kind(&self) -> &'static str {
        M::KIND
    }

    fn state(&self) -> CollectorState {
        *self.state.borrow()
    }

    fn subscribe(&self) -> watch::Receiver<CollectorState> {
        self.state.subscribe()
    }

    async fn reconcile(&self, cancel: &CancellationToken) -> CollectResult<ReconcileReport> {
        self.state.send_replace(CollectorState::Reconciling);
        // Taken before listing: anything the watch writes after this point
        // carries a newer threshold and wins over the listed snapshot.
        let threshold = self.context.tick();
        info!(
            kind = M::KIND,
            provider = self.context.provider(),
            %threshold,
            "reconcile started"
        );

        let listed = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            listed = self.lister.list() => Some(listed),
        };
        let result = match listed {
            None => Ok(ReconcileReport::canceled(threshold)),
            Some(Err(source)) => Err(CollectError::transport(M::KIND, "list", source)),
            Some(Ok(items)) => self.write_pass(&items, threshold, cancel),
        };

        match &result {
            Ok(report) if report.canceled => {
                self.state.send_replace(CollectorState::Idle);
            }
            Ok(report) => {
                info!(
                    kind = M::KIND,
                    provider = self.context.provider(),
                    listed = report.listed,
                    applied = report.applied,
                    skipped = report.skipped,
                    pruned = report.pruned,
                    "reconcile complete"
                );
                self.state.send_replace(CollectorState::Watching);
            }
            Err(e) => {
                warn!(kind = M::KIND, provider = self.context.provider(), error = %e, "reconcile failed");
                self.state.send_replace(CollectorState::Idle);
            }
        }
        result
    }

    fn created(&self, object: &Object) -> EventResult {
        let Some((model, threshold)) = self.convert(object) else {
            return EventResult::PassThrough;
        };
        let result = model
            .to_record(threshold)
            .and_then(|record| self.context.store().insert(record));
        match result {
            Ok(()) => debug!(kind = M::KIND, pk = model.pk(), %threshold, "created"),
            Err(e) => warn!(kind = M::KIND, pk = model.pk(), error = %e, "created event dropped"),
        }
        EventResult::Handled
    }

    fn updated(&self, _old: &Object, new: &Object) -> EventResult {
        let Some((model, threshold)) = self.convert(new) else {
            return EventResult::PassThrough;
        };
        let result = model
            .to_record(threshold)
            .and_then(|record| self.context.store().update(record));
        match result {
            Ok(true) => debug!(kind = M::KIND, pk = model.pk(), %threshold, "updated"),
            Ok(false) => debug!(kind = M::KIND, pk = model.pk(), %threshold, "stale update skipped"),
            Err(e) => warn!(kind = M::KIND, pk = model.pk(), error = %e, "updated event dropped"),
        }
        EventResult::Handled
    }

    fn deleted(&self, object: &Object) -> EventResult {
        let Some((model, threshold)) = self.convert(object) else {
            return EventResult::PassThrough;
        };
        let stamp = Stamp::new(threshold, model.version());
        match self.context.store().delete_stamped(M::KIND, model.pk(), stamp) {
            Ok(removed) => debug!(kind = M::KIND, pk = model.pk(), %threshold, removed, "deleted"),
            Err(e) => warn!(kind = M::KIND, pk = model.pk(), error = %e, "deleted event dropped"),
        }
        EventResult::Handled
    }

    fn generic(&self, object: &Object) -> EventResult {
        match self.narrow(object) {
            Some(_) => EventResult::Handled,
            None => EventResult::PassThrough,
        }
    }
}

impl<S, M, L> std::fmt::Debug for Collection<S, M, L>
where
    M: Model,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collection")
            .field("kind", &M::KIND)
            .field("provider", &self.context.provider())
            .field("state", &*self.state.borrow())
            .finish()
    }
}
