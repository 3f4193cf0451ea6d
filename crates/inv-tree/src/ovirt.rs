//! oVirt tree: DataCenter > Cluster > Host > VM.

use inv_model::ovirt::{Cluster, DataCenter, Host, Resource, VM};
use inv_store::{ListOptions, Model, ObjectStore, Predicate, StoreExt};

use crate::error::{TreeError, TreeResult};
use crate::tree::{project, DetailMap, Navigator, NodeBuilder, NodeRef, SelfLink, Tree, TreeNode};

pub const PLATFORM: &str = "ovirt";

/// Route segment for a kind's self link.
pub fn route(kind: &str) -> &'static str {
    match kind {
        "DataCenter" => "datacenters",
        "Cluster" => "clusters",
        "Host" => "hosts",
        "VM" => "vms",
        "Network" => "networks",
        "StorageDomain" => "storagedomains",
        _ => "resources",
    }
}

/// Children by explicit parent field, listed from the store.
pub struct BranchNavigator<'s> {
    store: &'s dyn ObjectStore,
}

impl<'s> BranchNavigator<'s> {
    pub fn new(store: &'s dyn ObjectStore) -> Self {
        Self { store }
    }

    fn children<M>(&self, field: &str, parent: &Resource) -> TreeResult<Vec<Resource>>
    where
        M: Model + Into<Resource>,
    {
        let options = ListOptions::new().filter(Predicate::eq(field, parent.pk()));
        self.store
            .list_models::<M>(&options)
            .map(|list| list.into_iter().map(Into::into).collect())
            .map_err(|source| TreeError::Navigation {
                kind: parent.kind().to_string(),
                id: parent.pk().to_string(),
                source,
            })
    }
}

impl Navigator<Resource> for BranchNavigator<'_> {
    fn next(&self, parent: &Resource) -> TreeResult<Vec<Resource>> {
        match parent {
            Resource::DataCenter(_) => self.children::<Cluster>("data_center", parent),
            Resource::Cluster(_) => self.children::<Host>("cluster", parent),
            Resource::Host(_) => self.children::<VM>("host", parent),
            _ => Ok(Vec::new()),
        }
    }
}

/// Projects oVirt models with self links.
#[derive(Clone, Debug)]
pub struct OvirtNodeBuilder {
    link: SelfLink,
    detail: DetailMap,
}

impl OvirtNodeBuilder {
    pub fn new(provider: impl Into<String>, detail: DetailMap) -> Self {
        Self {
            link: SelfLink::new(PLATFORM, provider),
            detail,
        }
    }
}

impl NodeBuilder<Resource> for OvirtNodeBuilder {
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

/// Build the VM tree of every data center.
pub fn tree(store: &dyn ObjectStore, builder: OvirtNodeBuilder) -> TreeResult<TreeNode> {
    let roots: Vec<Resource> = store
        .list_models::<DataCenter>(&ListOptions::new())?
        .into_iter()
        .map(Resource::from)
        .collect();
    Tree::new(builder).build_all(&roots, &BranchNavigator::new(store))
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use inv_model::Base;
    use inv_store::{InMemoryStore, Record, StoreError, StoreResult};
    use inv_store::{CommitReport, Transaction, WriteBatch};
    use serde_json::json;

    use super::*;

    fn data_center(id: &str) -> DataCenter {
        DataCenter {
            base: Base::new(id, format!("dc {id}"), ""),
            ..Default::default()
        }
    }

    fn cluster(id: &str, dc: &str) -> Cluster {
        Cluster {
            base: Base::new(id, format!("cluster {id}"), dc),
            data_center: dc.into(),
            ..Default::default()
        }
    }

    fn host(id: &str, cluster: &str) -> Host {
        Host {
            base: Base::new(id, format!("host {id}"), cluster),
            cluster: cluster.into(),
            ..Default::default()
        }
    }

    /// One data center, two clusters, three hosts each.
    fn seeded() -> InMemoryStore {
        let store = InMemoryStore::new();
        store.insert_model(&data_center("dc-1")).unwrap();
        for c in 0..2 {
            let cl = format!("cl-{c}");
            store.insert_model(&cluster(&cl, "dc-1")).unwrap();
            for h in 0..3 {
                store.insert_model(&host(&format!("h-{c}-{h}"), &cl)).unwrap();
            }
        }
        store
    }

    fn builder() -> OvirtNodeBuilder {
        OvirtNodeBuilder::new("engine", DetailMap::default())
    }

    // -----------------------------------------------------------------------
    // Shape
    // -----------------------------------------------------------------------

    #[test]
    fn data_center_cluster_host_shape() {
        let store = seeded();
        let content = tree(&store, builder()).unwrap();

        assert_eq!(content.children.len(), 1);
        let dc = &content.children[0];
        assert_eq!(dc.kind, "DataCenter");
        assert_eq!(dc.children.len(), 2);
        for cluster in &dc.children {
            assert_eq!(cluster.kind, "Cluster");
            assert_eq!(cluster.parent.as_ref().map(|p| p.id.as_str()), Some("dc-1"));
            assert_eq!(cluster.children.len(), 3);
            for host in &cluster.children {
                assert_eq!(host.kind, "Host");
                assert!(host.children.is_empty());
            }
        }
        assert_eq!(dc.depth(), 3);
    }

    #[test]
    fn vms_hang_off_their_host() {
        let store = seeded();
        let vm = VM {
            base: Base::new("vm-1", "db", "cl-0"),
            cluster: "cl-0".into(),
            host: "h-0-1".into(),
            ..Default::default()
        };
        store.insert_model(&vm).unwrap();
        // Not running; no host.
        store
            .insert_model(&VM {
                base: Base::new("vm-2", "idle", "cl-0"),
                cluster: "cl-0".into(),
                ..Default::default()
            })
            .unwrap();

        let content = tree(&store, builder()).unwrap();
        let host = content.find("Host", "h-0-1").unwrap();
        assert_eq!(host.children.len(), 1);
        assert_eq!(host.children[0].kind, "VM");
        assert!(content.find("VM", "vm-2").is_none());
    }

    #[test]
    fn orphaned_hosts_stay_listable() {
        let store = seeded();
        store.delete_model::<Cluster>("cl-0").unwrap();

        let orphans = store
            .list_models::<Host>(&ListOptions::new().filter(Predicate::eq("cluster", "cl-0")))
            .unwrap();
        assert_eq!(orphans.len(), 3);
        assert!(orphans.iter().all(|h| h.base.parent == "cl-0"));

        let content = tree(&store, builder()).unwrap();
        assert_eq!(content.children[0].children.len(), 1);
        assert!(content.find("Host", "h-0-0").is_none());
    }

    // -----------------------------------------------------------------------
    // Content
    // -----------------------------------------------------------------------

    #[test]
    fn detail_and_self_links() {
        let store = seeded();
        let mut detail = DetailMap::default();
        detail.set("Host", true);
        let content = tree(&store, OvirtNodeBuilder::new("engine", detail)).unwrap();

        let cluster = content.find("Cluster", "cl-1").unwrap();
        assert_eq!(
            cluster.object,
            json!({
                "id": "cl-1",
                "name": "cluster cl-1",
                "parent": "dc-1",
                "selfLink": "/providers/ovirt/engine/clusters/cl-1",
            })
        );

        let host = content.find("Host", "h-1-2").unwrap();
        assert_eq!(host.object["cluster"], json!("cl-1"));
        assert_eq!(host.object["selfLink"], json!("/providers/ovirt/engine/hosts/h-1-2"));
    }

    #[test]
    fn empty_store_yields_empty_content() {
        let content = tree(&InMemoryStore::new(), builder()).unwrap();
        assert!(content.children.is_empty());
        assert_eq!(content.count(), 1);
    }

    // -----------------------------------------------------------------------
    // Failure
    // -----------------------------------------------------------------------

    /// Serves data centers and clusters but fails to list hosts.
    struct NoHosts(InMemoryStore);

    impl ObjectStore for NoHosts {
        fn get(&self, kind: &str, pk: &str) -> StoreResult<Record> {
            self.0.get(kind, pk)
        }

        fn list(&self, kind: &str, options: &ListOptions) -> StoreResult<Vec<Record>> {
            if kind == "Host" {
                return Err(StoreError::LockPoisoned);
            }
            self.0.list(kind, options)
        }

        fn commit(&self, batch: WriteBatch) -> StoreResult<CommitReport> {
            self.0.commit(batch)
        }

        fn begin(&self) -> StoreResult<Transaction<'_>> {
            Ok(Transaction::new(self))
        }
    }

    #[test]
    fn navigation_error_aborts_the_request() {
        let store = NoHosts(seeded());
        let err = tree(&store, builder()).unwrap_err();
        match err {
            TreeError::Navigation { kind, id, source } => {
                assert_eq!(kind, "Cluster");
                assert_eq!(id, "cl-0");
                assert_eq!(source, StoreError::LockPoisoned);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn builder_projects_full_root() {
        let detail = DetailMap::new(BTreeMap::from([("DataCenter".to_string(), true)]));
        let node = OvirtNodeBuilder::new("engine", detail)
            .node(None, &Resource::from(data_center("dc-9")))
            .unwrap();
        assert_eq!(node.object["description"], json!(""));
        assert!(node.parent.is_none());
    }
}
