//! Typed references and their JSON-in-scalar encoding.
//!
//! Many-to-many relations (a VM's networks, a cluster's datastores) are not
//! modelled as join tables. The list of `{Kind, ID}` pairs is encoded as JSON
//! and kept in a single string column of the owning record. Reads avoid a
//! join; writes re-encode the whole list.
//!
//! Decoding is lenient: [`Ref::decode`] and [`RefList::decode`] return the
//! default value for a malformed payload and log at `debug`. Use the
//! `try_decode` variants where the failure matters.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::TypeError;

/// A reference to another entity: its kind tag and primary key.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Ref {
    /// The kind (type) of the referenced entity.
    #[serde(rename = "Kind", default)]
    pub kind: String,
    /// The primary key of the referenced entity.
    #[serde(rename = "ID", default)]
    pub id: String,
}

impl Ref {
    pub fn new(kind: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            id: id.into(),
        }
    }

    /// Encode as a JSON string.
    pub fn encode(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Decode, falling back to an empty ref on malformed input.
    pub fn decode(j: &str) -> Self {
        Self::try_decode(j).unwrap_or_else(|e| {
            debug!(error = %e, "reference decode failed; using default");
            Self::default()
        })
    }

    /// Decode, surfacing malformed input as an error.
    pub fn try_decode(j: &str) -> Result<Self, TypeError> {
        serde_json::from_str(j).map_err(|e| TypeError::Decode(e.to_string()))
    }

    /// Returns `true` if both kind and id are empty.
    pub fn is_empty(&self) -> bool {
        self.kind.is_empty() && self.id.is_empty()
    }
}

impl fmt::Display for Ref {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

/// An ordered list of [`Ref`]s.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RefList(Vec<Ref>);

impl RefList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Encode as a JSON array string.
    pub fn encode(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "[]".into())
    }

    /// Decode, falling back to an empty list on malformed input.
    ///
    /// An empty string is the encoding of a never-populated column and
    /// decodes to an empty list without logging.
    pub fn decode(j: &str) -> Self {
        if j.trim().is_empty() {
            return Self::default();
        }
        Self::try_decode(j).unwrap_or_else(|e| {
            debug!(error = %e, "reference list decode failed; using empty list");
            Self::default()
        })
    }

    /// Decode, surfacing malformed input as an error.
    pub fn try_decode(j: &str) -> Result<Self, TypeError> {
        serde_json::from_str(j).map_err(|e| TypeError::Decode(e.to_string()))
    }

    pub fn push(&mut self, r: Ref) {
        self.0.push(r);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Ref> {
        self.0.iter()
    }

    /// Returns `true` if a ref with this kind and id is present.
    pub fn contains(&self, kind: &str, id: &str) -> bool {
        self.0.iter().any(|r| r.kind == kind && r.id == id)
    }

    /// Ids of the refs with the given kind, in list order.
    pub fn ids_of(&self, kind: &str) -> Vec<&str> {
        self.0
            .iter()
            .filter(|r| r.kind == kind)
            .map(|r| r.id.as_str())
            .collect()
    }
}

impl From<Vec<Ref>> for RefList {
    fn from(refs: Vec<Ref>) -> Self {
        Self(refs)
    }
}

impl FromIterator<Ref> for RefList {
    fn from_iter<I: IntoIterator<Item = Ref>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for RefList {
    type Item = Ref;
    type IntoIter = std::vec::IntoIter<Ref>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a RefList {
    type Item = &'a Ref;
    type IntoIter = std::slice::Iter<'a, Ref>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn ref_roundtrip() {
        let r = Ref::new("VM", "vm-1");
        assert_eq!(Ref::decode(&r.encode()), r);
    }

    #[test]
    fn ref_wire_shape() {
        let r = Ref::new("VM", "vm-1");
        assert_eq!(r.encode(), r#"{"Kind":"VM","ID":"vm-1"}"#);
    }

    #[test]
    fn malformed_ref_decodes_to_default() {
        assert_eq!(Ref::decode("{not json"), Ref::default());
        assert!(Ref::try_decode("{not json").is_err());
    }

    #[test]
    fn partial_ref_keeps_known_fields() {
        let r = Ref::decode(r#"{"Kind":"Host"}"#);
        assert_eq!(r.kind, "Host");
        assert!(r.id.is_empty());
    }

    #[test]
    fn list_roundtrip() {
        let list: RefList = vec![Ref::new("Network", "net-1"), Ref::new("Network", "net-2")].into();
        let decoded = RefList::decode(&list.encode());
        assert_eq!(decoded, list);
        assert_eq!(decoded.ids_of("Network"), vec!["net-1", "net-2"]);
    }

    #[test]
    fn empty_string_is_empty_list() {
        assert!(RefList::decode("").is_empty());
        assert_eq!(RefList::new().encode(), "[]");
    }

    #[test]
    fn malformed_list_decodes_to_empty() {
        assert!(RefList::decode(r#"[{"Kind": 1}"#).is_empty());
        assert!(matches!(
            RefList::try_decode("nope"),
            Err(TypeError::Decode(_))
        ));
    }

    #[test]
    fn contains_matches_kind_and_id() {
        let list: RefList = vec![Ref::new("Datastore", "ds-1")].into();
        assert!(list.contains("Datastore", "ds-1"));
        assert!(!list.contains("Network", "ds-1"));
    }

    fn arb_ref() -> impl Strategy<Value = Ref> {
        ("[A-Za-z]{0,12}", "\\PC{0,24}").prop_map(|(kind, id)| Ref::new(kind, id))
    }

    proptest! {
        #[test]
        fn any_ref_roundtrips(r in arb_ref()) {
            prop_assert_eq!(Ref::decode(&r.encode()), r);
        }

        #[test]
        fn any_list_roundtrips(refs in proptest::collection::vec(arb_ref(), 0..16)) {
            let list = RefList::from(refs);
            prop_assert_eq!(RefList::decode(&list.encode()), list);
        }
    }
}
