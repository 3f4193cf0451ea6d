use std::collections::BTreeMap;

use inv_types::Threshold;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{StoreError, StoreResult};

/// Label/annotation bag projected by every model.
pub type Labels = BTreeMap<String, String>;

/// A stored inventory record.
///
/// The store never interprets `body` beyond field lookup for predicates.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Kind tag of the entity (e.g. `"Cluster"`).
    pub kind: String,
    /// Primary key, unique within `kind`.
    pub pk: String,
    /// Update threshold the record was written with.
    pub threshold: Threshold,
    /// The provider's own version of the resource, when it publishes one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u64>,
    /// JSON encoding of the model.
    pub body: Value,
}

impl Record {
    pub fn new(
        kind: impl Into<String>,
        pk: impl Into<String>,
        threshold: Threshold,
        body: Value,
    ) -> Self {
        Self {
            kind: kind.into(),
            pk: pk.into(),
            threshold,
            version: None,
            body,
        }
    }

    /// Ordering key of this record.
    pub fn stamp(&self) -> Stamp {
        Stamp::new(self.threshold, self.version)
    }

    /// Look up a field of the body by name.
    ///
    /// Dotted paths descend into nested objects: `"data_center.id"`.
    pub fn field(&self, path: &str) -> Option<&Value> {
        path.split('.')
            .try_fold(&self.body, |value, segment| value.get(segment))
    }

    /// Return the record restamped with `threshold`.
    pub fn with_threshold(mut self, threshold: Threshold) -> Self {
        self.threshold = threshold;
        self
    }

    /// Decode the body into a typed model.
    pub fn decode<M: Model>(&self) -> StoreResult<M> {
        M::from_record(self)
    }
}

/// Ordering key of a write or of stored state.
///
/// When both sides carry a provider version and the versions differ, the
/// versions decide. Otherwise the local threshold does. A zero threshold is
/// never stale.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Stamp {
    pub threshold: Threshold,
    pub version: Option<u64>,
}

impl Stamp {
    pub fn new(threshold: Threshold, version: Option<u64>) -> Self {
        Self { threshold, version }
    }

    /// Returns `true` if a write stamped with `self` must not replace state
    /// stamped with `stored`.
    pub fn is_stale_against(&self, stored: &Stamp) -> bool {
        if self.threshold.is_zero() {
            return false;
        }
        match (self.version, stored.version) {
            (Some(incoming), Some(current)) if incoming != current => incoming < current,
            _ => self.threshold.is_stale_against(&stored.threshold),
        }
    }
}

impl From<Threshold> for Stamp {
    fn from(threshold: Threshold) -> Self {
        Self::new(threshold, None)
    }
}

/// A typed entity that can be kept in the store.
///
/// Identity is shallow: [`Model::equals`] compares primary keys only and is
/// meant for de-duplication, not change detection.
pub trait Model: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Kind tag shared by every record of this model.
    const KIND: &'static str;

    /// Primary key.
    fn pk(&self) -> &str;

    /// Label projection. Models without labels return an empty bag.
    fn labels(&self) -> Labels {
        Labels::new()
    }

    /// Shallow identity: same primary key.
    fn equals(&self, other: &Self) -> bool {
        self.pk() == other.pk()
    }

    /// Provider resource version. Models from providers without one
    /// return `None` and are ordered by threshold alone.
    fn version(&self) -> Option<u64> {
        None
    }

    /// Encode as a record stamped with `threshold`.
    fn to_record(&self, threshold: Threshold) -> StoreResult<Record> {
        let body =
            serde_json::to_value(self).map_err(|e| StoreError::Serialization(e.to_string()))?;
        let mut record = Record::new(Self::KIND, self.pk(), threshold, body);
        record.version = self.version();
        Ok(record)
    }

    /// Decode from a record of the same kind.
    fn from_record(record: &Record) -> StoreResult<Self> {
        if record.kind != Self::KIND {
            return Err(StoreError::KindMismatch {
                expected: Self::KIND.into(),
                found: record.kind.clone(),
            });
        }
        serde_json::from_value(record.body.clone())
            .map_err(|e| StoreError::Serialization(e.to_string()))
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    /// Minimal model used by the store's own tests.
    #[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
    pub struct Widget {
        pub id: String,
        pub name: String,
        pub parent: String,
        pub size: i64,
    }

    impl Widget {
        pub fn new(id: &str, parent: &str) -> Self {
            Self {
                id: id.into(),
                name: format!("widget {id}"),
                parent: parent.into(),
                size: 0,
            }
        }
    }

    impl Model for Widget {
        const KIND: &'static str = "Widget";

        fn pk(&self) -> &str {
            &self.id
        }
    }

    /// A widget record carrying a provider version.
    pub fn versioned_record(id: &str, parent: &str, threshold: u64, version: u64) -> Record {
        let mut record = widget_record(id, parent, threshold);
        record.version = Some(version);
        record
    }

    pub fn widget_record(id: &str, parent: &str, threshold: u64) -> Record {
        Widget::new(id, parent)
            .to_record(Threshold::new(threshold))
            .unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use serde_json::json;

    #[test]
    fn model_roundtrip_through_record() {
        let w = Widget::new("w-1", "p-1");
        let record = w.to_record(Threshold::new(5)).unwrap();
        assert_eq!(record.kind, "Widget");
        assert_eq!(record.pk, "w-1");
        assert_eq!(record.threshold, Threshold::new(5));
        assert_eq!(record.decode::<Widget>().unwrap(), w);
    }

    #[test]
    fn decode_rejects_other_kind() {
        let record = Record::new("Gadget", "g-1", Threshold::ZERO, json!({}));
        assert!(matches!(
            record.decode::<Widget>(),
            Err(StoreError::KindMismatch { .. })
        ));
    }

    #[test]
    fn field_lookup_supports_dotted_paths() {
        let record = Record::new(
            "Vm",
            "vm-1",
            Threshold::ZERO,
            json!({"host": {"id": "h-1"}, "name": "a"}),
        );
        assert_eq!(record.field("name"), Some(&json!("a")));
        assert_eq!(record.field("host.id"), Some(&json!("h-1")));
        assert_eq!(record.field("host.missing"), None);
        assert_eq!(record.field("nope"), None);
    }

    #[test]
    fn equals_compares_pk_only() {
        let a = Widget::new("w-1", "p-1");
        let mut b = Widget::new("w-1", "p-2");
        b.size = 99;
        assert!(a.equals(&b));
        assert!(!a.equals(&Widget::new("w-2", "p-1")));
    }

    #[test]
    fn provider_version_outranks_threshold() {
        let stored = Stamp::new(Threshold::new(20), Some(3));
        // Older local tick but newer provider version: applies.
        assert!(!Stamp::new(Threshold::new(10), Some(4)).is_stale_against(&stored));
        // Newer local tick but older provider version: stale.
        assert!(Stamp::new(Threshold::new(30), Some(2)).is_stale_against(&stored));
        // Same version falls back to the threshold.
        assert!(Stamp::new(Threshold::new(10), Some(3)).is_stale_against(&stored));
        // One side unversioned: threshold only.
        assert!(!Stamp::new(Threshold::new(30), None).is_stale_against(&stored));
        assert!(!Stamp::new(Threshold::ZERO, Some(1)).is_stale_against(&stored));
    }

    #[test]
    fn record_carries_model_version() {
        let record = versioned_record("w-1", "", 1, 7);
        assert_eq!(record.stamp(), Stamp::new(Threshold::new(1), Some(7)));
        assert_eq!(widget_record("w-1", "", 1).stamp().version, None);
    }

    #[test]
    fn restamp_keeps_body() {
        let record = widget_record("w-1", "", 1).with_threshold(Threshold::new(9));
        assert_eq!(record.threshold, Threshold::new(9));
        assert_eq!(record.field("id"), Some(&json!("w-1")));
    }
}
