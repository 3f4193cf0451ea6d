//! OpenShift inventory: storage classes and network attachment
//! definitions. Objects are keyed by their UID; the namespace, if any, is
//! the parent.

pub mod api;
pub mod model;

pub use model::{NetworkAttachmentDefinition, StorageClass, DEFAULT_CLASS_ANNOTATION};

use crate::base::resource_union;

resource_union! {
    /// Any OpenShift entity.
    Resource { StorageClass, NetworkAttachmentDefinition }
}
