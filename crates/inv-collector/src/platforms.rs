//! Collector types for each supported provider kind.

pub mod ovirt {
    use inv_model::ovirt::{api, model};

    use crate::collection::Collection;

    pub type DataCenterCollection<L> = Collection<api::DataCenter, model::DataCenter, L>;
    pub type ClusterCollection<L> = Collection<api::Cluster, model::Cluster, L>;
    pub type HostCollection<L> = Collection<api::Host, model::Host, L>;
    pub type VmCollection<L> = Collection<api::Vm, model::VM, L>;
    pub type NetworkCollection<L> = Collection<api::Network, model::Network, L>;
    pub type StorageDomainCollection<L> = Collection<api::StorageDomain, model::StorageDomain, L>;
}

pub mod vsphere {
    use inv_model::vsphere::{api, model};

    use crate::collection::Collection;

    pub type FolderCollection<L> = Collection<api::Folder, model::Folder, L>;
    pub type DatacenterCollection<L> = Collection<api::Datacenter, model::Datacenter, L>;
    pub type ClusterCollection<L> = Collection<api::Cluster, model::Cluster, L>;
    pub type HostCollection<L> = Collection<api::Host, model::Host, L>;
    pub type NetworkCollection<L> = Collection<api::Network, model::Network, L>;
    pub type DatastoreCollection<L> = Collection<api::Datastore, model::Datastore, L>;
    pub type VmCollection<L> = Collection<api::VirtualMachine, model::VM, L>;
}

pub mod ocp {
    use inv_model::ocp::{api, model};

    use crate::collection::Collection;

    pub type StorageClassCollection<L> = Collection<api::StorageClass, model::StorageClass, L>;
    pub type NetworkAttachmentDefinitionCollection<L> =
        Collection<api::NetworkAttachmentDefinition, model::NetworkAttachmentDefinition, L>;
}
