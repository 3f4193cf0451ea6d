//! vSphere host tree: Folder/Datacenter > Folder/Cluster > Host > VM.

use inv_model::vsphere::{Cluster, Datacenter, Folder, Host, Resource, VM};
use inv_store::{ListOptions, Model, ObjectStore, Predicate, StoreExt};

use crate::error::{TreeError, TreeResult};
use crate::tree::{project, DetailMap, Navigator, NodeBuilder, NodeRef, SelfLink, Tree, TreeNode};

pub const PLATFORM: &str = "vsphere";

/// Route segment for a kind's self link.
pub fn route(kind: &str) -> &'static str {
    match kind {
        "Folder" => "folders",
        "Datacenter" => "datacenters",
        "Cluster" => "clusters",
        "Host" => "hosts",
        "Network" => "networks",
        "Datastore" => "datastores",
        "VM" => "vms",
        _ => "resources",
    }
}

/// Folders, datacenters and clusters nest by parent; hosts sit in
/// clusters; VMs are placed under the host they are registered on.
pub struct HostNavigator<'s> {
    store: &'s dyn ObjectStore,
}

impl<'s> HostNavigator<'s> {
    pub fn new(store: &'s dyn ObjectStore) -> Self {
        Self { store }
    }

    fn list<M>(&self, field: &str, parent: &Resource, into: &mut Vec<Resource>) -> TreeResult<()>
    where
        M: Model + Into<Resource>,
    {
        let options = ListOptions::new().filter(Predicate::eq(field, parent.pk()));
        let found = self
            .store
            .list_models::<M>(&options)
            .map_err(|source| TreeError::Navigation {
                kind: parent.kind().to_string(),
                id: parent.pk().to_string(),
                source,
            })?;
        into.extend(found.into_iter().map(Into::into));
        Ok(())
    }
}

impl Navigator<Resource> for HostNavigator<'_> {
    fn next(&self, parent: &Resource) -> TreeResult<Vec<Resource>> {
        let mut children = Vec::new();
        match parent {
            Resource::Folder(_) => {
                self.list::<Folder>("parent", parent, &mut children)?;
                self.list::<Datacenter>("parent", parent, &mut children)?;
                self.list::<Cluster>("parent", parent, &mut children)?;
            }
            Resource::Datacenter(_) => {
                self.list::<Folder>("parent", parent, &mut children)?;
                self.list::<Cluster>("parent", parent, &mut children)?;
            }
            Resource::Cluster(_) => self.list::<Host>("parent", parent, &mut children)?,
            Resource::Host(_) => self.list::<VM>("host", parent, &mut children)?,
            _ => {}
        }
        Ok(children)
    }
}

/// Projects vSphere models with self links.
#[derive(Clone, Debug)]
pub struct VsphereNodeBuilder {
    link: SelfLink,
    detail: DetailMap,
}

impl VsphereNodeBuilder {
    pub fn new(provider: impl Into<String>, detail: DetailMap) -> Self {
        Self {
            link: SelfLink::new(PLATFORM, provider),
            detail,
        }
    }
}

impl NodeBuilder<Resource> for VsphereNodeBuilder {
    fn node(&self, parent: Option<&NodeRef>, model: &Resource) -> TreeResult<TreeNode> {
        let kind = model.kind();
        project(
            parent,
            model.view(),
            self.detail.detail(kind),
            self.link.link(route(kind), model.pk()),
        )
    }
}

/// Build the host tree from every parentless folder and datacenter.
pub fn tree(store: &dyn ObjectStore, builder: VsphereNodeBuilder) -> TreeResult<TreeNode> {
    let top = ListOptions::new().filter(Predicate::eq("parent", ""));
    let mut roots: Vec<Resource> = store
        .list_models::<Folder>(&top)?
        .into_iter()
        .map(Resource::from)
        .collect();
    roots.extend(
        store
            .list_models::<Datacenter>(&top)?
            .into_iter()
            .map(Resource::from),
    );
    Tree::new(builder).build_all(&roots, &HostNavigator::new(store))
}
