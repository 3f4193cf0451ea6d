//! vSphere managed object shapes, as flattened from property collector
//! results.

use inv_types::Ref;
use serde::{Deserialize, Serialize};

/// Managed object reference.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct MoRef {
    #[serde(rename = "type")]
    pub kind: String,
    pub value: String,
}

impl MoRef {
    pub fn new(kind: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            value: value.into(),
        }
    }

    /// Inventory kind for the managed object type. Unknown types pass
    /// through unchanged.
    pub fn inventory_kind(&self) -> &str {
        match self.kind.as_str() {
            "ClusterComputeResource" | "ComputeResource" => "Cluster",
            "HostSystem" => "Host",
            "VirtualMachine" => "VM",
            "DistributedVirtualPortgroup" | "OpaqueNetwork" => "Network",
            other => other,
        }
    }

    pub fn to_ref(&self) -> Ref {
        Ref::new(self.inventory_kind(), self.value.clone())
    }
}

/// Value of an optional reference, empty when absent.
pub(crate) fn moref_id(moref: &Option<MoRef>) -> String {
    moref.as_ref().map(|m| m.value.clone()).unwrap_or_default()
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Folder {
    pub obj: MoRef,
    pub name: Option<String>,
    pub parent: Option<MoRef>,
    pub child_entity: Vec<MoRef>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Datacenter {
    pub obj: MoRef,
    pub name: Option<String>,
    pub parent: Option<MoRef>,
    pub cluster: Vec<MoRef>,
    pub network: Vec<MoRef>,
    pub datastore: Vec<MoRef>,
    pub vm: Vec<MoRef>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Cluster {
    pub obj: MoRef,
    pub name: Option<String>,
    pub parent: Option<MoRef>,
    pub host: Vec<MoRef>,
    pub network: Vec<MoRef>,
    pub datastore: Vec<MoRef>,
    pub das_enabled: Option<bool>,
    pub das_vms: Vec<MoRef>,
    pub drs_enabled: Option<bool>,
    pub drs_behavior: Option<String>,
    pub drs_vms: Vec<MoRef>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Host {
    pub obj: MoRef,
    pub name: Option<String>,
    pub parent: Option<MoRef>,
    pub in_maintenance_mode: Option<bool>,
    pub product_name: Option<String>,
    pub product_version: Option<String>,
    pub network: Vec<MoRef>,
    pub datastore: Vec<MoRef>,
    pub vm: Vec<MoRef>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Network {
    pub obj: MoRef,
    pub name: Option<String>,
    pub parent: Option<MoRef>,
    pub tag: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Datastore {
    pub obj: MoRef,
    pub name: Option<String>,
    pub parent: Option<MoRef>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub capacity: Option<i64>,
    pub free_space: Option<i64>,
    pub maintenance_mode: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VirtualMachine {
    pub obj: MoRef,
    pub name: Option<String>,
    pub parent: Option<MoRef>,
    pub uuid: Option<String>,
    pub firmware: Option<String>,
    pub cpu_affinity: Vec<i32>,
    pub cpu_hot_add_enabled: Option<bool>,
    pub cpu_hot_remove_enabled: Option<bool>,
    pub memory_hot_add_enabled: Option<bool>,
    pub num_cpu: Option<i32>,
    #[serde(rename = "memoryMB")]
    pub memory_mb: Option<i32>,
    pub guest_full_name: Option<String>,
    pub ballooned_memory: Option<i32>,
    pub ip_address: Option<String>,
    pub host: Option<MoRef>,
    pub network: Vec<MoRef>,
    pub datastore: Vec<MoRef>,
}
