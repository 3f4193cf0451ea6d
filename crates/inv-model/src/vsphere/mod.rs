//! vSphere inventory.
//!
//! Folders and datacenters nest by parent; a cluster's parent is its host
//! folder and a host's parent is its cluster. VMs live in VM folders and
//! name the host they are registered on. Relation lists (a cluster's
//! hosts, a VM's networks) are kept as encoded [`RefList`] strings.
//!
//! [`RefList`]: inv_types::RefList

pub mod api;
pub mod model;

pub use api::MoRef;
pub use model::{Cluster, Datacenter, Datastore, Folder, Host, Network, VM};

use crate::base::resource_union;

resource_union! {
    /// Any vSphere entity.
    Resource { Folder, Datacenter, Cluster, Host, Network, Datastore, VM }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::With;
    use inv_types::Threshold;

    #[test]
    fn dispatch_round_trips_through_record() {
        let vm = VM::with(&api::VirtualMachine {
            obj: MoRef::new("VirtualMachine", "vm-7"),
            host: Some(MoRef::new("HostSystem", "host-1")),
            ..Default::default()
        });
        let record = Resource::VM(vm.clone()).to_record(Threshold::new(9)).unwrap();
        assert_eq!(record.kind, "VM");
        assert_eq!(record.threshold, Threshold::new(9));
        assert_eq!(Resource::from_record(&record).unwrap(), Resource::VM(vm));
    }

    #[test]
    fn kinds_cover_every_entity() {
        assert_eq!(
            Resource::KINDS,
            &["Folder", "Datacenter", "Cluster", "Host", "Network", "Datastore", "VM"]
        );
    }
}
