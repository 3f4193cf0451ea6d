use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::base::{entity, Base, With};
use crate::ocp::api;

/// Annotation marking the cluster's default storage class.
pub const DEFAULT_CLASS_ANNOTATION: &str = "storageclass.kubernetes.io/is-default-class";

fn base(meta: &api::ObjectMeta) -> Base {
    Base {
        id: meta.uid.clone().unwrap_or_default(),
        name: meta.name.clone().unwrap_or_default(),
        parent: meta.namespace.clone().unwrap_or_default(),
        labels: meta.labels.clone(),
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StorageClass {
    #[serde(flatten)]
    pub base: Base,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub provisioner: String,
    #[serde(default)]
    pub parameters: BTreeMap<String, String>,
    #[serde(default)]
    pub reclaim_policy: String,
    #[serde(default)]
    pub volume_binding_mode: String,
    #[serde(default)]
    pub allow_expansion: bool,
    #[serde(default)]
    pub default: bool,
}

entity!(StorageClass, "StorageClass", versioned);

impl With<api::StorageClass> for StorageClass {
    fn with(sc: &api::StorageClass) -> Self {
        Self {
            base: base(&sc.metadata),
            version: sc.metadata.resource_version.clone().unwrap_or_default(),
            provisioner: sc.provisioner.clone().unwrap_or_default(),
            parameters: sc.parameters.clone(),
            reclaim_policy: sc.reclaim_policy.clone().unwrap_or_default(),
            volume_binding_mode: sc.volume_binding_mode.clone().unwrap_or_default(),
            allow_expansion: sc.allow_volume_expansion.unwrap_or_default(),
            default: sc
                .metadata
                .annotations
                .get(DEFAULT_CLASS_ANNOTATION)
                .is_some_and(|v| v.eq_ignore_ascii_case("true")),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkAttachmentDefinition {
    #[serde(flatten)]
    pub base: Base,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub namespace: String,
    /// CNI plugin type from the config, empty when the config is malformed.
    #[serde(default)]
    pub cni_type: String,
    #[serde(default)]
    pub config: String,
}

entity!(NetworkAttachmentDefinition, "NetworkAttachmentDefinition", versioned);

impl With<api::NetworkAttachmentDefinition> for NetworkAttachmentDefinition {
    fn with(nad: &api::NetworkAttachmentDefinition) -> Self {
        let config = nad.spec.config.clone().unwrap_or_default();
        Self {
            base: base(&nad.metadata),
            version: nad.metadata.resource_version.clone().unwrap_or_default(),
            namespace: nad.metadata.namespace.clone().unwrap_or_default(),
            cni_type: cni_type(&config),
            config,
        }
    }
}

fn cni_type(config: &str) -> String {
    if config.is_empty() {
        return String::new();
    }
    match serde_json::from_str::<Value>(config) {
        Ok(value) => value
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        Err(e) => {
            debug!(error = %e, "CNI config decode failed");
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(uid: &str, name: &str, namespace: Option<&str>) -> api::ObjectMeta {
        api::ObjectMeta {
            uid: Some(uid.into()),
            name: Some(name.into()),
            namespace: namespace.map(String::from),
            resource_version: Some("42".into()),
            ..Default::default()
        }
    }

    #[test]
    fn storage_class_keyed_by_uid() {
        let mut source = api::StorageClass {
            metadata: meta("uid-1", "standard", None),
            provisioner: Some("kubernetes.io/cinder".into()),
            allow_volume_expansion: Some(true),
            ..Default::default()
        };
        source.metadata.labels.insert("tier".into(), "gold".into());

        let sc = StorageClass::with(&source);
        assert_eq!(inv_store::Model::pk(&sc), "uid-1");
        assert_eq!(sc.base.name, "standard");
        assert!(sc.base.is_root());
        assert_eq!(inv_store::Model::labels(&sc).get("tier").map(String::as_str), Some("gold"));
        assert_eq!(sc.version, "42");
        assert!(sc.allow_expansion);
        assert!(!sc.default);
    }

    #[test]
    fn resource_version_is_the_provider_version() {
        let source = api::StorageClass {
            metadata: meta("uid-1", "standard", None),
            ..Default::default()
        };
        let sc = StorageClass::with(&source);
        assert_eq!(inv_store::Model::version(&sc), Some(42));
        let record = inv_store::Model::to_record(&sc, inv_types::Threshold::new(1)).unwrap();
        assert_eq!(record.version, Some(42));

        // Opaque or missing versions leave ordering to the threshold.
        let mut opaque = sc.clone();
        opaque.version = "abc".into();
        assert_eq!(inv_store::Model::version(&opaque), None);
        assert_eq!(inv_store::Model::version(&StorageClass::default()), None);
    }

    #[test]
    fn default_class_from_annotation() {
        let mut source = api::StorageClass {
            metadata: meta("uid-1", "standard", None),
            ..Default::default()
        };
        source
            .metadata
            .annotations
            .insert(DEFAULT_CLASS_ANNOTATION.into(), "True".into());
        assert!(StorageClass::with(&source).default);
    }

    #[test]
    fn nad_cni_type_from_config() {
        let nad = NetworkAttachmentDefinition::with(&api::NetworkAttachmentDefinition {
            metadata: meta("uid-2", "br-ext", Some("vms")),
            spec: api::NetworkAttachmentDefinitionSpec {
                config: Some(r#"{"cniVersion":"0.3.1","type":"bridge","bridge":"br1"}"#.into()),
            },
        });
        assert_eq!(nad.cni_type, "bridge");
        assert_eq!(nad.namespace, "vms");
        assert_eq!(nad.base.parent, "vms");
    }

    #[test]
    fn malformed_nad_config_is_swallowed() {
        let nad = NetworkAttachmentDefinition::with(&api::NetworkAttachmentDefinition {
            metadata: meta("uid-3", "broken", Some("vms")),
            spec: api::NetworkAttachmentDefinitionSpec {
                config: Some("{type: bridge".into()),
            },
        });
        assert_eq!(nad.cni_type, "");
        assert_eq!(nad.config, "{type: bridge");
        assert_eq!(nad.base.id, "uid-3");
    }

    #[test]
    fn empty_object_yields_zeroed_entity() {
        let nad = NetworkAttachmentDefinition::with(&api::NetworkAttachmentDefinition::default());
        assert_eq!(nad, NetworkAttachmentDefinition::default());
    }
}
