use inv_types::RefList;
use serde::{Deserialize, Serialize};

use crate::base::{entity, Base, With};
use crate::vsphere::api::{self, moref_id, MoRef};

/// Typed accessors over relation lists kept as encoded strings.
macro_rules! ref_lists {
    ($ty:ty { $($field:ident / $setter:ident),+ $(,)? }) => {
        impl $ty {
            $(
                pub fn $field(&self) -> RefList {
                    RefList::decode(&self.$field)
                }

                pub fn $setter(&mut self, list: &RefList) {
                    self.$field = list.encode();
                }
            )+
        }
    };
}

fn encode(morefs: &[MoRef]) -> String {
    morefs.iter().map(MoRef::to_ref).collect::<RefList>().encode()
}

fn base(obj: &MoRef, name: &Option<String>, parent: &Option<MoRef>) -> Base {
    Base::new(
        obj.value.clone(),
        name.clone().unwrap_or_default(),
        moref_id(parent),
    )
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Folder {
    #[serde(flatten)]
    pub base: Base,
    #[serde(default)]
    pub children: String,
}

entity!(Folder, "Folder");
ref_lists!(Folder { children / set_children });

impl With<api::Folder> for Folder {
    fn with(folder: &api::Folder) -> Self {
        Self {
            base: base(&folder.obj, &folder.name, &folder.parent),
            children: encode(&folder.child_entity),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Datacenter {
    #[serde(flatten)]
    pub base: Base,
    #[serde(default)]
    pub clusters: String,
    #[serde(default)]
    pub networks: String,
    #[serde(default)]
    pub datastores: String,
    #[serde(default)]
    pub vms: String,
}

entity!(Datacenter, "Datacenter");
ref_lists!(Datacenter {
    clusters / set_clusters,
    networks / set_networks,
    datastores / set_datastores,
    vms / set_vms,
});

impl With<api::Datacenter> for Datacenter {
    fn with(dc: &api::Datacenter) -> Self {
        Self {
            base: base(&dc.obj, &dc.name, &dc.parent),
            clusters: encode(&dc.cluster),
            networks: encode(&dc.network),
            datastores: encode(&dc.datastore),
            vms: encode(&dc.vm),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    #[serde(flatten)]
    pub base: Base,
    #[serde(default)]
    pub hosts: String,
    #[serde(default)]
    pub networks: String,
    #[serde(default)]
    pub datastores: String,
    #[serde(default)]
    pub das_enabled: bool,
    #[serde(default)]
    pub das_vms: String,
    #[serde(default)]
    pub drs_enabled: bool,
    #[serde(default)]
    pub drs_behavior: String,
    #[serde(default)]
    pub drs_vms: String,
}

entity!(Cluster, "Cluster");
ref_lists!(Cluster {
    hosts / set_hosts,
    networks / set_networks,
    datastores / set_datastores,
    das_vms / set_das_vms,
    drs_vms / set_drs_vms,
});

impl With<api::Cluster> for Cluster {
    fn with(cluster: &api::Cluster) -> Self {
        Self {
            base: base(&cluster.obj, &cluster.name, &cluster.parent),
            hosts: encode(&cluster.host),
            networks: encode(&cluster.network),
            datastores: encode(&cluster.datastore),
            das_enabled: cluster.das_enabled.unwrap_or_default(),
            das_vms: encode(&cluster.das_vms),
            drs_enabled: cluster.drs_enabled.unwrap_or_default(),
            drs_behavior: cluster.drs_behavior.clone().unwrap_or_default(),
            drs_vms: encode(&cluster.drs_vms),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Host {
    #[serde(flatten)]
    pub base: Base,
    #[serde(default)]
    pub in_maintenance_mode: bool,
    #[serde(default)]
    pub product_name: String,
    #[serde(default)]
    pub product_version: String,
    #[serde(default)]
    pub networks: String,
    #[serde(default)]
    pub datastores: String,
    #[serde(default)]
    pub vms: String,
}

entity!(Host, "Host");
ref_lists!(Host {
    networks / set_networks,
    datastores / set_datastores,
    vms / set_vms,
});

impl With<api::Host> for Host {
    fn with(host: &api::Host) -> Self {
        Self {
            base: base(&host.obj, &host.name, &host.parent),
            in_maintenance_mode: host.in_maintenance_mode.unwrap_or_default(),
            product_name: host.product_name.clone().unwrap_or_default(),
            product_version: host.product_version.clone().unwrap_or_default(),
            networks: encode(&host.network),
            datastores: encode(&host.datastore),
            vms: encode(&host.vm),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Network {
    #[serde(flatten)]
    pub base: Base,
    #[serde(default)]
    pub tag: String,
}

entity!(Network, "Network");

impl With<api::Network> for Network {
    fn with(network: &api::Network) -> Self {
        Self {
            base: base(&network.obj, &network.name, &network.parent),
            tag: network.tag.clone().unwrap_or_default(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Datastore {
    #[serde(flatten)]
    pub base: Base,
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub capacity: i64,
    #[serde(default)]
    pub free: i64,
    #[serde(default)]
    pub maintenance_mode: String,
}

entity!(Datastore, "Datastore");

impl With<api::Datastore> for Datastore {
    fn with(ds: &api::Datastore) -> Self {
        Self {
            base: base(&ds.obj, &ds.name, &ds.parent),
            kind: ds.kind.clone().unwrap_or_default(),
            capacity: ds.capacity.unwrap_or_default(),
            free: ds.free_space.unwrap_or_default(),
            maintenance_mode: ds.maintenance_mode.clone().unwrap_or_default(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct VM {
    #[serde(flatten)]
    pub base: Base,
    #[serde(default)]
    pub uuid: String,
    #[serde(default)]
    pub firmware: String,
    /// Comma separated CPU ids.
    #[serde(default)]
    pub cpu_affinity: String,
    #[serde(default)]
    pub cpu_hot_add_enabled: bool,
    #[serde(default)]
    pub cpu_hot_remove_enabled: bool,
    #[serde(default)]
    pub memory_hot_add_enabled: bool,
    #[serde(default)]
    pub cpu_count: i32,
    #[serde(default)]
    pub memory_mb: i32,
    #[serde(default)]
    pub guest_name: String,
    #[serde(default)]
    pub ballooned_memory: i32,
    #[serde(default)]
    pub ip_address: String,
    /// Host the VM is registered on.
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub networks: String,
    #[serde(default)]
    pub datastores: String,
}

entity!(VM, "VM");
ref_lists!(VM {
    networks / set_networks,
    datastores / set_datastores,
});

impl With<api::VirtualMachine> for VM {
    fn with(vm: &api::VirtualMachine) -> Self {
        Self {
            base: base(&vm.obj, &vm.name, &vm.parent),
            uuid: vm.uuid.clone().unwrap_or_default(),
            firmware: vm.firmware.clone().unwrap_or_default(),
            cpu_affinity: vm
                .cpu_affinity
                .iter()
                .map(i32::to_string)
                .collect::<Vec<_>>()
                .join(","),
            cpu_hot_add_enabled: vm.cpu_hot_add_enabled.unwrap_or_default(),
            cpu_hot_remove_enabled: vm.cpu_hot_remove_enabled.unwrap_or_default(),
            memory_hot_add_enabled: vm.memory_hot_add_enabled.unwrap_or_default(),
            cpu_count: vm.num_cpu.unwrap_or_default(),
            memory_mb: vm.memory_mb.unwrap_or_default(),
            guest_name: vm.guest_full_name.clone().unwrap_or_default(),
            ballooned_memory: vm.ballooned_memory.unwrap_or_default(),
            ip_address: vm.ip_address.clone().unwrap_or_default(),
            host: moref_id(&vm.host),
            networks: encode(&vm.network),
            datastores: encode(&vm.datastore),
        }
    }
}
