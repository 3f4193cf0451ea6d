//! oVirt inventory.
//!
//! Hierarchy: DataCenter > Cluster > Host. VMs belong to a cluster and
//! name the host they run on; networks and storage domains belong to a
//! data center.

pub mod api;
pub mod model;

pub use model::{Cluster, DataCenter, Host, Network, StorageDomain, VM};

use crate::base::resource_union;

resource_union! {
    /// Any oVirt entity.
    Resource { DataCenter, Cluster, Host, VM, Network, StorageDomain }
}
