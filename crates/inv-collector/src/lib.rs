//! Inventory collectors.
//!
//! A [`Collector`] keeps one resource kind of one provider synchronized
//! into an [`ObjectStore`](inv_store::ObjectStore). It first reconciles a
//! full listing inside a single transaction, then applies watch events one
//! record at a time. Every write carries a threshold from the provider's
//! shared clock, so a slow reconcile never overwrites a newer event.
//!
//! [`Inventory`] supervises a provider's collectors: it reconciles them in
//! parallel with retry and optional resync, and dispatches watch events.

pub mod collection;
pub mod collector;
pub mod config;
pub mod context;
pub mod error;
pub mod event;
pub mod lister;
pub mod platforms;
pub mod supervisor;

pub use collection::Collection;
pub use collector::{Collector, CollectorState, ReconcileReport};
pub use config::{BackoffConfig, InventoryConfig, TreeConfig};
pub use context::CollectorContext;
pub use error::{BoxError, CollectError, CollectResult};
pub use event::{EventResult, Object, WatchEvent};
pub use lister::{Lister, StaticLister};
pub use supervisor::{dispatch, Inventory};

pub use tokio_util::sync::CancellationToken;
