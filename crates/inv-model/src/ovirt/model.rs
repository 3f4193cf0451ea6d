use serde::{Deserialize, Serialize};

use crate::base::{entity, parse_or_default, Base, With};
use crate::ovirt::api::{self, link_id};

fn text(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

fn base(id: &Option<String>, name: &Option<String>, parent: String) -> Base {
    Base::new(text(id), text(name), parent)
}

fn topology(cpu: &Option<api::Cpu>) -> (i64, i64) {
    let topology = cpu.as_ref().and_then(|c| c.topology.as_ref());
    (
        parse_or_default(topology.and_then(|t| t.sockets.as_deref())),
        parse_or_default(topology.and_then(|t| t.cores.as_deref())),
    )
}

fn os_version(os: &Option<api::Os>) -> String {
    os.as_ref()
        .and_then(|o| o.version.as_ref())
        .and_then(|v| v.full_version.clone())
        .unwrap_or_default()
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DataCenter {
    #[serde(flatten)]
    pub base: Base,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub local: bool,
}

entity!(DataCenter, "DataCenter");

impl With<api::DataCenter> for DataCenter {
    fn with(dc: &api::DataCenter) -> Self {
        Self {
            base: base(&dc.id, &dc.name, String::new()),
            description: text(&dc.description),
            local: parse_or_default(dc.local.as_deref()),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    #[serde(flatten)]
    pub base: Base,
    #[serde(default)]
    pub data_center: String,
    #[serde(default)]
    pub ha_reservation: bool,
    #[serde(default)]
    pub ksm_enabled: bool,
    #[serde(default)]
    pub bios_type: String,
}

entity!(Cluster, "Cluster");

impl With<api::Cluster> for Cluster {
    fn with(cluster: &api::Cluster) -> Self {
        let data_center = link_id(&cluster.data_center);
        Self {
            base: base(&cluster.id, &cluster.name, data_center.clone()),
            data_center,
            ha_reservation: parse_or_default(cluster.ha_reservation.as_deref()),
            ksm_enabled: parse_or_default(
                cluster.ksm.as_ref().and_then(|k| k.enabled.as_deref()),
            ),
            bios_type: text(&cluster.bios_type),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Host {
    #[serde(flatten)]
    pub base: Base,
    #[serde(default)]
    pub cluster: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub product_name: String,
    #[serde(default)]
    pub product_version: String,
    #[serde(default)]
    pub in_maintenance: bool,
    #[serde(default)]
    pub cpu_sockets: i64,
    #[serde(default)]
    pub cpu_cores: i64,
    #[serde(default)]
    pub memory: i64,
}

entity!(Host, "Host");

impl With<api::Host> for Host {
    fn with(host: &api::Host) -> Self {
        let cluster = link_id(&host.cluster);
        let status = text(&host.status);
        let (cpu_sockets, cpu_cores) = topology(&host.cpu);
        Self {
            base: base(&host.id, &host.name, cluster.clone()),
            cluster,
            in_maintenance: status == "maintenance",
            status,
            product_name: host
                .os
                .as_ref()
                .and_then(|o| o.kind.clone())
                .unwrap_or_default(),
            product_version: os_version(&host.os),
            cpu_sockets,
            cpu_cores,
            memory: parse_or_default(host.memory.as_deref()),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct VM {
    #[serde(flatten)]
    pub base: Base,
    #[serde(default)]
    pub cluster: String,
    /// Empty while the VM is not running.
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub cpu_sockets: i64,
    #[serde(default)]
    pub cpu_cores: i64,
    #[serde(default)]
    pub memory: i64,
    #[serde(default)]
    pub bios_type: String,
    #[serde(default)]
    pub guest_os: String,
}

entity!(VM, "VM");

impl With<api::Vm> for VM {
    fn with(vm: &api::Vm) -> Self {
        let cluster = link_id(&vm.cluster);
        let (cpu_sockets, cpu_cores) = topology(&vm.cpu);
        Self {
            base: base(&vm.id, &vm.name, cluster.clone()),
            cluster,
            host: link_id(&vm.host),
            status: text(&vm.status),
            cpu_sockets,
            cpu_cores,
            memory: parse_or_default(vm.memory.as_deref()),
            bios_type: vm
                .bios
                .as_ref()
                .and_then(|b| b.kind.clone())
                .unwrap_or_default(),
            guest_os: vm
                .guest_operating_system
                .as_ref()
                .and_then(|o| o.kind.clone())
                .unwrap_or_default(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Network {
    #[serde(flatten)]
    pub base: Base,
    #[serde(default)]
    pub data_center: String,
    #[serde(default)]
    pub vlan: i64,
    #[serde(default)]
    pub usages: Vec<String>,
}

entity!(Network, "Network");

impl With<api::Network> for Network {
    fn with(network: &api::Network) -> Self {
        let data_center = link_id(&network.data_center);
        Self {
            base: base(&network.id, &network.name, data_center.clone()),
            data_center,
            vlan: parse_or_default(network.vlan.as_ref().and_then(|v| v.id.as_deref())),
            usages: network
                .usages
                .as_ref()
                .map(|u| u.usage.clone())
                .unwrap_or_default(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StorageDomain {
    #[serde(flatten)]
    pub base: Base,
    /// First attached data center.
    #[serde(default)]
    pub data_center: String,
    #[serde(default)]
    pub domain_type: String,
    #[serde(default)]
    pub storage_type: String,
    #[serde(default)]
    pub available: i64,
    #[serde(default)]
    pub used: i64,
}

entity!(StorageDomain, "StorageDomain");

impl With<api::StorageDomain> for StorageDomain {
    fn with(sd: &api::StorageDomain) -> Self {
        let data_center = sd
            .data_centers
            .as_ref()
            .and_then(|d| d.data_center.first())
            .and_then(|l| l.id.clone())
            .unwrap_or_default();
        Self {
            base: base(&sd.id, &sd.name, data_center.clone()),
            data_center,
            domain_type: text(&sd.kind),
            storage_type: sd
                .storage
                .as_ref()
                .and_then(|s| s.kind.clone())
                .unwrap_or_default(),
            available: parse_or_default(sd.available.as_deref()),
            used: parse_or_default(sd.used.as_deref()),
        }
    }
}

impl StorageDomain {
    pub fn capacity(&self) -> i64 {
        self.available + self.used
    }
}
