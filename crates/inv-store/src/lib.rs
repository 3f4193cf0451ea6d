//! Transactional typed record store for the inventory engine.
//!
//! Every inventory entity -- datacenters, clusters, hosts, VMs, storage --
//! is stored as a [`Record`]: a kind tag, a primary key, an update
//! [`Threshold`](inv_types::Threshold), an optional provider version and a
//! JSON body. Typed access goes
//! through the [`Model`] trait and the [`StoreExt`] helpers.
//!
//! # Storage Backends
//!
//! All backends implement the [`ObjectStore`] trait:
//!
//! - [`InMemoryStore`] -- `HashMap`-based store with bounded tombstones
//!
//! # Design Rules
//!
//! 1. Primary keys are unique per kind; a duplicate insert fails.
//! 2. Writes staged in a [`Transaction`] are invisible until commit, and a
//!    commit applies all of them or none of them.
//! 3. A write never replaces state with a newer [`Stamp`]: a newer provider
//!    version when both sides have one, a newer threshold otherwise.
//! 4. Parent links are not validated; orphans are allowed.
//! 5. Reads are per-record consistent only.

pub mod error;
pub mod memory;
pub mod options;
pub mod predicate;
pub mod record;
pub mod traits;
pub mod transaction;

// Re-export primary types at crate root for ergonomic imports.
pub use error::{StoreError, StoreResult};
pub use memory::{InMemoryStore, DEFAULT_TOMBSTONE_LIMIT};
pub use options::{Detail, ListOptions, Page};
pub use predicate::Predicate;
pub use record::{Labels, Model, Record, Stamp};
pub use traits::{ObjectStore, StoreExt};
pub use transaction::{CommitReport, Transaction, Write, WriteBatch};
