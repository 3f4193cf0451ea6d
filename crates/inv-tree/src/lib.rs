//! Inventory trees.
//!
//! A [`Tree`] walks a hierarchy depth first from one or more roots. A
//! [`Navigator`] lists each model's children; a [`NodeBuilder`] projects
//! each model into a [`TreeNode`] at the detail level configured for its
//! kind. Platform modules supply store-backed navigators and builders.

pub mod error;
pub mod ovirt;
pub mod tree;
pub mod vsphere;

pub use error::{TreeError, TreeResult};
pub use tree::{project, DetailMap, Navigator, NodeBuilder, NodeRef, SelfLink, Tree, TreeNode};
