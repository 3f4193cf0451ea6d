//! oVirt REST resource shapes.
//!
//! The engine reports most scalars as strings (`"true"`, `"8589934592"`) and
//! links as `{ "id": ... }` objects. Every field is optional.

use serde::{Deserialize, Serialize};

/// A link to another resource.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Link {
    pub id: Option<String>,
    pub href: Option<String>,
}

impl Link {
    pub fn to(id: &str) -> Self {
        Self {
            id: Some(id.to_string()),
            href: None,
        }
    }
}

/// Id of an optional link, empty when absent.
pub(crate) fn link_id(link: &Option<Link>) -> String {
    link.as_ref()
        .and_then(|l| l.id.clone())
        .unwrap_or_default()
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataCenter {
    pub id: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub local: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Ksm {
    pub enabled: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Bios {
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Cluster {
    pub id: Option<String>,
    pub name: Option<String>,
    pub data_center: Option<Link>,
    pub ha_reservation: Option<String>,
    pub ksm: Option<Ksm>,
    pub bios_type: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Topology {
    pub sockets: Option<String>,
    pub cores: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Cpu {
    pub topology: Option<Topology>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Version {
    pub full_version: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Os {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub version: Option<Version>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Host {
    pub id: Option<String>,
    pub name: Option<String>,
    pub cluster: Option<Link>,
    pub status: Option<String>,
    pub os: Option<Os>,
    pub cpu: Option<Cpu>,
    pub memory: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Vm {
    pub id: Option<String>,
    pub name: Option<String>,
    pub cluster: Option<Link>,
    pub host: Option<Link>,
    pub status: Option<String>,
    pub cpu: Option<Cpu>,
    pub memory: Option<String>,
    pub bios: Option<Bios>,
    pub guest_operating_system: Option<Os>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Vlan {
    pub id: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Usages {
    pub usage: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Network {
    pub id: Option<String>,
    pub name: Option<String>,
    pub data_center: Option<Link>,
    pub vlan: Option<Vlan>,
    pub usages: Option<Usages>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Storage {
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataCenters {
    pub data_center: Vec<Link>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageDomain {
    pub id: Option<String>,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub storage: Option<Storage>,
    pub available: Option<String>,
    pub used: Option<String>,
    pub data_centers: Option<DataCenters>,
}
