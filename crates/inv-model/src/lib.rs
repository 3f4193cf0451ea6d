//! Inventory entity models.
//!
//! One module per provider platform. Each module holds:
//! - `api` -- the external resource shapes as the provider reports them
//! - `model` -- the local entities kept in the store
//! - a closed [`Resource`](ovirt::Resource)-style union over its kinds
//!
//! Every entity is composed from a shared [`Base`] (primary key, name,
//! parent link, labels) and implements [`Entity`] by delegating to it.
//! Conversion from the external shape never fails: missing or malformed
//! fields leave the local field at its zero value.

pub mod base;
pub mod ocp;
pub mod ovirt;
pub mod vsphere;

pub use base::{list_content, Base, Entity, Projection, With};
