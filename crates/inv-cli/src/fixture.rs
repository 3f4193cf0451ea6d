//! JSON fixtures: provider resources by kind, plus watch events replayed
//! after the initial reconcile.

use std::any::Any;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context};
use inv_collector::{
    CancellationToken, Collection, Collector, CollectorContext, EventResult, Inventory,
    InventoryConfig, StaticLister, WatchEvent,
};
use inv_model::{ocp, ovirt, vsphere, Projection, With};
use inv_store::{Detail, InMemoryStore, Model, Record};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Ovirt,
    Vsphere,
    Ocp,
}

impl Platform {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Ovirt => "ovirt",
            Self::Vsphere => "vsphere",
            Self::Ocp => "ocp",
        }
    }

    pub fn kinds(&self) -> &'static [&'static str] {
        match self {
            Self::Ovirt => ovirt::Resource::KINDS,
            Self::Vsphere => vsphere::Resource::KINDS,
            Self::Ocp => ocp::Resource::KINDS,
        }
    }

    /// Project a stored record of this platform.
    pub fn content(&self, record: &Record, detail: Detail) -> anyhow::Result<Value> {
        Ok(match self {
            Self::Ovirt => ovirt::Resource::from_record(record)?.view().content(detail),
            Self::Vsphere => vsphere::Resource::from_record(record)?.view().content(detail),
            Self::Ocp => ocp::Resource::from_record(record)?.view().content(detail),
        })
    }

    fn bindings(&self) -> Vec<Binding> {
        match self {
            Self::Ovirt => vec![
                bind::<ovirt::api::DataCenter, ovirt::DataCenter>(),
                bind::<ovirt::api::Cluster, ovirt::Cluster>(),
                bind::<ovirt::api::Host, ovirt::Host>(),
                bind::<ovirt::api::Vm, ovirt::VM>(),
                bind::<ovirt::api::Network, ovirt::Network>(),
                bind::<ovirt::api::StorageDomain, ovirt::StorageDomain>(),
            ],
            Self::Vsphere => vec![
                bind::<vsphere::api::Folder, vsphere::Folder>(),
                bind::<vsphere::api::Datacenter, vsphere::Datacenter>(),
                bind::<vsphere::api::Cluster, vsphere::Cluster>(),
                bind::<vsphere::api::Host, vsphere::Host>(),
                bind::<vsphere::api::Network, vsphere::Network>(),
                bind::<vsphere::api::Datastore, vsphere::Datastore>(),
                bind::<vsphere::api::VirtualMachine, vsphere::VM>(),
            ],
            Self::Ocp => vec![
                bind::<ocp::api::StorageClass, ocp::StorageClass>(),
                bind::<ocp::api::NetworkAttachmentDefinition, ocp::NetworkAttachmentDefinition>(),
            ],
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventOp {
    Created,
    Updated,
    Deleted,
    Generic,
}

#[derive(Clone, Debug, Deserialize)]
pub struct FixtureEvent {
    pub op: EventOp,
    pub kind: String,
    pub object: Value,
    /// Prior state for updates. Defaults to `object`.
    #[serde(default)]
    pub old: Option<Value>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Fixture {
    pub platform: Platform,
    #[serde(default)]
    pub provider: Option<String>,
    /// External resources keyed by inventory kind.
    #[serde(default)]
    pub resources: BTreeMap<String, Vec<Value>>,
    #[serde(default)]
    pub events: Vec<FixtureEvent>,
}

impl Fixture {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading fixture {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing fixture {}", path.display()))
    }

    pub fn provider<'a>(&'a self, config: &'a InventoryConfig) -> &'a str {
        self.provider.as_deref().unwrap_or(&config.provider)
    }

    /// Reconcile every kind into a fresh store, then replay the events.
    pub async fn collect(&self, config: &InventoryConfig) -> anyhow::Result<Arc<InMemoryStore>> {
        let store = Arc::new(InMemoryStore::with_tombstone_limit(config.tombstone_limit));
        let context = CollectorContext::new(self.provider(config), store.clone());
        let mut inventory = Inventory::new(context.clone(), config.clone());

        let bindings = self.platform.bindings();
        for kind in self.resources.keys() {
            if !bindings.iter().any(|b| b.kind == kind.as_str()) {
                warn!(%kind, platform = self.platform.name(), "fixture kind not collected");
            }
        }
        for binding in &bindings {
            let items = self
                .resources
                .get(binding.kind)
                .map(Vec::as_slice)
                .unwrap_or_default();
            inventory.register((binding.collector)(&context, items)?);
        }

        let cancel = CancellationToken::new();
        for collector in inventory.collectors() {
            collector
                .reconcile(&cancel)
                .await
                .with_context(|| format!("collecting {}", collector.kind()))?;
        }

        for event in &self.events {
            let Some(binding) = bindings.iter().find(|b| b.kind == event.kind) else {
                bail!("event for unknown kind {}", event.kind);
            };
            let watch = (binding.event)(event)?;
            if inventory.handle(&watch) == EventResult::PassThrough {
                warn!(kind = %event.kind, "event not handled");
            }
        }
        info!(records = store.len(), events = self.events.len(), "fixture collected");
        Ok(store)
    }
}

type CollectorFactory = fn(&CollectorContext, &[Value]) -> anyhow::Result<Arc<dyn Collector>>;
type EventDecoder = fn(&FixtureEvent) -> anyhow::Result<WatchEvent>;

/// How to collect and decode one kind.
struct Binding {
    kind: &'static str,
    collector: CollectorFactory,
    event: EventDecoder,
}

fn bind<S, M>() -> Binding
where
    S: DeserializeOwned + Clone + Any + Send + Sync,
    M: Model + With<S>,
{
    Binding {
        kind: M::KIND,
        collector: collector::<S, M>,
        event: event::<S>,
    }
}

fn decode<S: DeserializeOwned>(kind: &str, value: &Value) -> anyhow::Result<S> {
    S::deserialize(value).with_context(|| format!("decoding {kind}"))
}

fn collector<S, M>(context: &CollectorContext, items: &[Value]) -> anyhow::Result<Arc<dyn Collector>>
where
    S: DeserializeOwned + Clone + Any + Send + Sync,
    M: Model + With<S>,
{
    let items = items
        .iter()
        .map(|v| decode::<S>(M::KIND, v))
        .collect::<anyhow::Result<Vec<S>>>()?;
    Ok(Arc::new(Collection::<S, M, _>::new(
        context.clone(),
        StaticLister::new(items),
    )))
}

fn event<S>(event: &FixtureEvent) -> anyhow::Result<WatchEvent>
where
    S: DeserializeOwned + Any + Send + Sync,
{
    let object: S = decode(&event.kind, &event.object)?;
    Ok(match event.op {
        EventOp::Created => WatchEvent::created(object),
        EventOp::Updated => {
            let old: S = decode(&event.kind, event.old.as_ref().unwrap_or(&event.object))?;
            WatchEvent::updated(old, object)
        }
        EventOp::Deleted => WatchEvent::deleted(object),
        EventOp::Generic => WatchEvent::generic(object),
    })
}
