use inv_store::{Detail, Labels, ListOptions, Model, ObjectStore, StoreExt, StoreResult};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Fields shared by every entity.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Base {
    /// Provider-assigned identifier; the primary key.
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// Identifier of the immediate parent, empty for roots. Not validated.
    #[serde(default)]
    pub parent: String,
    #[serde(default)]
    pub labels: Labels,
}

impl Base {
    pub fn new(id: impl Into<String>, name: impl Into<String>, parent: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            parent: parent.into(),
            labels: Labels::new(),
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_empty()
    }
}

/// Conversion from an external provider resource.
///
/// Implementations copy field by field and never fail. Absent or
/// unparseable source data yields zero values in the local record; the
/// inventory prefers a partially populated record over no record.
pub trait With<S> {
    fn with(source: &S) -> Self;
}

/// A stored entity composed from [`Base`].
pub trait Entity: Model {
    fn base(&self) -> &Base;
}

/// Kind tag and content projection, usable as a trait object.
pub trait Projection {
    fn kind(&self) -> &'static str;

    /// Primary key.
    fn id(&self) -> &str;

    fn name(&self) -> &str;

    /// Full or summary JSON content.
    fn content(&self, detail: Detail) -> Value;
}

impl<E: Entity> Projection for E {
    fn kind(&self) -> &'static str {
        E::KIND
    }

    fn id(&self) -> &str {
        &Entity::base(self).id
    }

    fn name(&self) -> &str {
        &Entity::base(self).name
    }

    fn content(&self, detail: Detail) -> Value {
        match detail {
            Detail::Full => serde_json::to_value(self).unwrap_or(Value::Null),
            Detail::Summary => summary(Entity::base(self)),
        }
    }
}

fn summary(base: &Base) -> Value {
    let mut content = json!({
        "id": base.id,
        "name": base.name,
    });
    if !base.parent.is_empty() {
        content["parent"] = json!(base.parent);
    }
    content
}

/// List entities and project each at the requested detail level.
pub fn list_content<E: Entity, S: ObjectStore + ?Sized>(
    store: &S,
    options: &ListOptions,
) -> StoreResult<Vec<Value>> {
    Ok(store
        .list_models::<E>(options)?
        .iter()
        .map(|e| Projection::content(e, options.detail))
        .collect())
}

/// Implements [`Model`], [`Entity`] and `Display` for a struct with a
/// `base: Base` field. The `versioned` form also reports the numeric
/// `version: String` field as the provider version.
macro_rules! entity {
    (@impl $ty:ty, $kind:expr, { $($extra:tt)* }) => {
        impl inv_store::Model for $ty {
            const KIND: &'static str = $kind;

            fn pk(&self) -> &str {
                &self.base.id
            }

            fn labels(&self) -> inv_store::Labels {
                self.base.labels.clone()
            }

            $($extra)*
        }

        impl $crate::base::Entity for $ty {
            fn base(&self) -> &$crate::base::Base {
                &self.base
            }
        }

        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.base.id)
            }
        }
    };
    ($ty:ty, $kind:expr) => {
        $crate::base::entity!(@impl $ty, $kind, {});
    };
    ($ty:ty, $kind:expr, versioned) => {
        $crate::base::entity!(@impl $ty, $kind, {
            fn version(&self) -> Option<u64> {
                self.version.trim().parse().ok()
            }
        });
    };
}

pub(crate) use entity;

/// Declares a closed union over a platform's entity kinds, with kind
/// dispatch to and from store records.
macro_rules! resource_union {
    ($(#[$meta:meta])* $name:ident { $($variant:ident),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq)]
        pub enum $name {
            $($variant($variant)),+
        }

        impl $name {
            /// Every kind in the union, in declaration order.
            pub const KINDS: &'static [&'static str] = &[$(<$variant as inv_store::Model>::KIND),+];

            pub fn kind(&self) -> &'static str {
                match self {
                    $(Self::$variant(_) => <$variant as inv_store::Model>::KIND),+
                }
            }

            pub fn pk(&self) -> &str {
                match self {
                    $(Self::$variant(m) => inv_store::Model::pk(m)),+
                }
            }

            pub fn view(&self) -> &dyn $crate::base::Projection {
                match self {
                    $(Self::$variant(m) => m as &dyn $crate::base::Projection),+
                }
            }

            pub fn to_record(
                &self,
                threshold: inv_types::Threshold,
            ) -> inv_store::StoreResult<inv_store::Record> {
                match self {
                    $(Self::$variant(m) => inv_store::Model::to_record(m, threshold)),+
                }
            }

            /// Decode a record by its kind tag.
            pub fn from_record(record: &inv_store::Record) -> inv_store::StoreResult<Self> {
                $(
                    if record.kind == <$variant as inv_store::Model>::KIND {
                        return Ok(Self::$variant(record.decode()?));
                    }
                )+
                Err(inv_store::StoreError::KindMismatch {
                    expected: Self::KINDS.join("|"),
                    found: record.kind.clone(),
                })
            }
        }

        $(
            impl From<$variant> for $name {
                fn from(m: $variant) -> Self {
                    Self::$variant(m)
                }
            }
        )+
    };
}

pub(crate) use resource_union;

/// Parse a provider's stringly-typed scalar, falling back to zero.
pub(crate) fn parse_or_default<T: std::str::FromStr + Default>(raw: Option<&str>) -> T {
    raw.and_then(|s| s.trim().parse().ok()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use inv_store::InMemoryStore;

    #[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
    struct Gizmo {
        #[serde(flatten)]
        base: Base,
        weight: i64,
    }

    entity!(Gizmo, "Gizmo");

    fn gizmo(id: &str, parent: &str) -> Gizmo {
        Gizmo {
            base: Base::new(id, format!("gizmo {id}"), parent),
            weight: 7,
        }
    }

    #[test]
    fn display_is_pk() {
        assert_eq!(gizmo("g-1", "").to_string(), "g-1");
    }

    #[test]
    fn base_is_flattened_into_record() {
        let record = gizmo("g-1", "p-1").to_record(Default::default()).unwrap();
        assert_eq!(record.field("parent"), Some(&json!("p-1")));
        assert_eq!(record.field("weight"), Some(&json!(7)));
    }

    #[test]
    fn summary_and_full_content() {
        let g = gizmo("g-1", "p-1");
        let summary = Projection::content(&g, Detail::Summary);
        assert_eq!(summary, json!({"id": "g-1", "name": "gizmo g-1", "parent": "p-1"}));

        let full = Projection::content(&g, Detail::Full);
        assert_eq!(full["weight"], json!(7));
        assert_eq!(full["id"], json!("g-1"));
    }

    #[test]
    fn root_summary_omits_parent() {
        let summary = Projection::content(&gizmo("g-1", ""), Detail::Summary);
        assert!(summary.get("parent").is_none());
        assert!(gizmo("g-1", "").base.is_root());
    }

    #[test]
    fn list_content_honours_detail() {
        let store = InMemoryStore::new();
        store.insert_model(&gizmo("g-1", "")).unwrap();
        store.insert_model(&gizmo("g-2", "")).unwrap();

        let summaries = list_content::<Gizmo, _>(&store, &ListOptions::new()).unwrap();
        assert_eq!(summaries.len(), 2);
        assert!(summaries[0].get("weight").is_none());

        let full =
            list_content::<Gizmo, _>(&store, &ListOptions::new().detail(Detail::Full)).unwrap();
        assert_eq!(full[1]["weight"], json!(7));
    }

    #[test]
    fn parse_or_default_zeroes_garbage() {
        assert_eq!(parse_or_default::<i64>(Some("42")), 42);
        assert_eq!(parse_or_default::<i64>(Some("4x2")), 0);
        assert_eq!(parse_or_default::<i64>(None), 0);
        assert!(!parse_or_default::<bool>(Some("maybe")));
        assert!(parse_or_default::<bool>(Some("true")));
    }
}
