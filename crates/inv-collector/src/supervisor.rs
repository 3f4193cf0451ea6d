//! Runs a provider's collectors: parallel reconcile with retry, periodic
//! resync, and watch event dispatch.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::collector::{Collector, CollectorState};
use crate::config::{BackoffConfig, InventoryConfig};
use crate::context::CollectorContext;
use crate::event::{EventResult, WatchEvent};

/// Offer `event` to each collector in turn until one handles it.
pub fn dispatch(collectors: &[Arc<dyn Collector>], event: &WatchEvent) -> EventResult {
    for collector in collectors {
        if collector.handle(event).is_handled() {
            return EventResult::Handled;
        }
    }
    debug!(event = event.name(), "no collector claimed event");
    EventResult::PassThrough
}

/// Supervisor for one provider's collectors.
pub struct Inventory {
    context: CollectorContext,
    config: InventoryConfig,
    collectors: Vec<Arc<dyn Collector>>,
    cancel: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

impl Inventory {
    pub fn new(context: CollectorContext, config: InventoryConfig) -> Self {
        Self {
            context,
            config,
            collectors: Vec::new(),
            cancel: CancellationToken::new(),
            tasks: Vec::new(),
        }
    }

    /// Add a collector. Collectors registered after [`Inventory::start`]
    /// are not run.
    pub fn register(&mut self, collector: Arc<dyn Collector>) -> &mut Self {
        self.collectors.push(collector);
        self
    }

    pub fn context(&self) -> &CollectorContext {
        &self.context
    }

    pub fn collectors(&self) -> &[Arc<dyn Collector>] {
        &self.collectors
    }

    pub fn is_running(&self) -> bool {
        !self.tasks.is_empty()
    }

    /// Spawn one reconcile task per collector and the event dispatcher.
    /// Returns the sender through which watch events are delivered.
    pub fn start(&mut self) -> mpsc::Sender<WatchEvent> {
        let (tx, rx) = mpsc::channel(self.config.event_capacity);
        info!(
            provider = self.context.provider(),
            collectors = self.collectors.len(),
            "inventory started"
        );
        for collector in &self.collectors {
            self.tasks.push(tokio::spawn(run_collector(
                Arc::clone(collector),
                self.cancel.child_token(),
                self.config.backoff.clone(),
                self.config.resync(),
            )));
        }
        self.tasks.push(tokio::spawn(run_dispatcher(
            self.collectors.clone(),
            rx,
            self.cancel.child_token(),
        )));
        tx
    }

    /// Handle one event synchronously.
    pub fn handle(&self, event: &WatchEvent) -> EventResult {
        dispatch(&self.collectors, event)
    }

    /// Wait until every collector has completed a reconcile pass.
    ///
    /// Returns `false` if the inventory is shut down first.
    pub async fn wait_ready(&self) -> bool {
        for collector in &self.collectors {
            let mut state = collector.subscribe();
            let reached = tokio::select! {
                _ = self.cancel.cancelled() => false,
                r = state.wait_for(|s| *s == CollectorState::Watching) => r.is_ok(),
            };
            if !reached {
                return false;
            }
        }
        true
    }

    /// Returns `true` if every collector is watching.
    pub fn is_ready(&self) -> bool {
        self.collectors
            .iter()
            .all(|c| c.state() == CollectorState::Watching)
    }

    /// Cancel all tasks and wait for them to finish.
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        for task in self.tasks.drain(..) {
            if let Err(e) = task.await {
                warn!(error = %e, "collector task failed");
            }
        }
        info!(provider = self.context.provider(), "inventory stopped");
    }
}

impl Drop for Inventory {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl std::fmt::Debug for Inventory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Inventory")
            .field("provider", &self.context.provider())
            .field("collectors", &self.collectors.len())
            .field("running", &self.is_running())
            .finish()
    }
}

async fn run_collector(
    collector: Arc<dyn Collector>,
    cancel: CancellationToken,
    backoff: BackoffConfig,
    resync: Option<Duration>,
) {
    let mut delay = backoff.initial();
    loop {
        let pause = match collector.reconcile(&cancel).await {
            Ok(report) if report.canceled => return,
            Ok(_) => {
                delay = backoff.initial();
                match resync {
                    Some(interval) => interval,
                    None => return,
                }
            }
            Err(e) => {
                let retry_in = delay;
                delay = backoff.next(delay);
                warn!(
                    kind = collector.kind(),
                    error = %e,
                    retry_in_ms = retry_in.as_millis() as u64,
                    "reconcile will be retried"
                );
                retry_in
            }
        };
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = tokio::time::sleep(pause) => {}
        }
    }
}

async fn run_dispatcher(
    collectors: Vec<Arc<dyn Collector>>,
    mut events: mpsc::Receiver<WatchEvent>,
    cancel: CancellationToken,
) {
    loop {
        let event = tokio::select! {
            _ = cancel.cancelled() => return,
            event = events.recv() => event,
        };
        match event {
            Some(event) => {
                dispatch(&collectors, &event);
            }
            None => return,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use inv_model::ovirt::{self, api};
    use inv_store::{InMemoryStore, ObjectStore, StoreExt};

    use super::*;
    use crate::error::BoxError;
    use crate::lister::{Lister, StaticLister};
    use crate::platforms::ovirt::{ClusterCollection, DataCenterCollection};

    fn data_center(id: &str) -> api::DataCenter {
        api::DataCenter {
            id: Some(id.into()),
            name: Some(format!("dc {id}")),
            ..Default::default()
        }
    }

    fn cluster(id: &str, dc: &str) -> api::Cluster {
        api::Cluster {
            id: Some(id.into()),
            data_center: Some(api::Link::to(dc)),
            ..Default::default()
        }
    }

    fn fast_config() -> InventoryConfig {
        InventoryConfig {
            provider: "ovirt-test".into(),
            backoff: BackoffConfig {
                initial_ms: 5,
                max_ms: 20,
                multiplier: 2.0,
            },
            ..Default::default()
        }
    }

    fn inventory(store: Arc<InMemoryStore>, clusters: Vec<api::Cluster>) -> Inventory {
        let context = CollectorContext::new("ovirt-test", store);
        let mut inventory = Inventory::new(context.clone(), fast_config());
        inventory
            .register(Arc::new(DataCenterCollection::new(
                context.clone(),
                StaticLister::new(vec![data_center("dc-1")]),
            )))
            .register(Arc::new(ClusterCollection::new(
                context,
                StaticLister::new(clusters),
            )));
        inventory
    }

    async fn eventually(check: impl Fn() -> bool) -> bool {
        for _ in 0..200 {
            if check() {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        false
    }

    /// Fails the first `failures` listings.
    struct Flaky {
        failures: usize,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Lister<api::DataCenter> for Flaky {
        async fn list(&self) -> Result<Vec<api::DataCenter>, BoxError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.failures {
                return Err(format!("attempt {n} refused").into());
            }
            Ok(vec![data_center("dc-1")])
        }
    }

    // -----------------------------------------------------------------------
    // Dispatch
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn dispatch_stops_at_first_handler() {
        let store = Arc::new(InMemoryStore::new());
        let inventory = inventory(store.clone(), vec![]);

        let result = inventory.handle(&WatchEvent::created(cluster("cl-1", "dc-1")));
        assert_eq!(result, EventResult::Handled);
        assert_eq!(store.get_model::<ovirt::Cluster>("cl-1").unwrap().data_center, "dc-1");

        let result = inventory.handle(&WatchEvent::created(api::Host::default()));
        assert_eq!(result, EventResult::PassThrough);
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn start_reconciles_every_collector() {
        let store = Arc::new(InMemoryStore::new());
        let mut inventory = inventory(
            store.clone(),
            vec![cluster("cl-1", "dc-1"), cluster("cl-2", "dc-1")],
        );
        assert!(!inventory.is_ready());

        let _events = inventory.start();
        let ready = tokio::time::timeout(Duration::from_secs(5), inventory.wait_ready())
            .await
            .unwrap();
        assert!(ready);
        assert!(inventory.is_ready());
        assert_eq!(store.len(), 3);

        inventory.shutdown().await;
    }

    #[tokio::test]
    async fn watch_events_flow_through_channel() {
        let store = Arc::new(InMemoryStore::new());
        let mut inventory = inventory(store.clone(), vec![cluster("cl-1", "dc-1")]);
        let events = inventory.start();
        assert!(inventory.wait_ready().await);

        events
            .send(WatchEvent::created(cluster("cl-2", "dc-1")))
            .await
            .unwrap();
        events
            .send(WatchEvent::deleted(cluster("cl-1", "dc-1")))
            .await
            .unwrap();

        let observer = store.clone();
        assert!(
            eventually(move || {
                observer.get("Cluster", "cl-2").is_ok() && observer.get("Cluster", "cl-1").is_err()
            })
            .await
        );
        inventory.shutdown().await;
    }

    #[tokio::test]
    async fn failed_reconcile_is_retried() {
        let store = Arc::new(InMemoryStore::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let context = CollectorContext::new("ovirt-test", store.clone());
        let mut inventory = Inventory::new(context.clone(), fast_config());
        inventory.register(Arc::new(DataCenterCollection::new(
            context,
            Flaky {
                failures: 2,
                calls: calls.clone(),
            },
        )));

        inventory.start();
        let ready = tokio::time::timeout(Duration::from_secs(5), inventory.wait_ready())
            .await
            .unwrap();
        assert!(ready);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(store.get("DataCenter", "dc-1").is_ok());
        inventory.shutdown().await;
    }

    #[tokio::test]
    async fn shutdown_stops_resync_loop() {
        let store = Arc::new(InMemoryStore::new());
        let context = CollectorContext::new("ovirt-test", store.clone());
        let config = InventoryConfig {
            resync_secs: Some(3600),
            ..fast_config()
        };
        let mut inventory = Inventory::new(context.clone(), config);
        inventory.register(Arc::new(DataCenterCollection::new(
            context,
            StaticLister::new(vec![data_center("dc-1")]),
        )));
        inventory.start();
        assert!(inventory.wait_ready().await);
        assert!(inventory.is_running());

        tokio::time::timeout(Duration::from_secs(5), inventory.shutdown())
            .await
            .unwrap();
    }
}
