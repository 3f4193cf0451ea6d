//! Depth-first materialization of a hierarchy into [`TreeNode`]s.

use std::collections::BTreeMap;

use inv_model::Projection;
use inv_store::Detail;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::error::{TreeError, TreeResult};

/// Non-owning reference from a node to its parent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NodeRef {
    pub kind: String,
    pub id: String,
}

/// A node of a materialized tree.
///
/// The implicit content root that holds several trees has an empty kind and
/// a null object.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct TreeNode {
    #[serde(skip)]
    pub parent: Option<NodeRef>,
    #[serde(skip)]
    pub id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub kind: String,
    #[serde(skip_serializing_if = "Value::is_null")]
    pub object: Value,
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    /// Reference to this node, handed to its children.
    pub fn reference(&self) -> NodeRef {
        NodeRef {
            kind: self.kind.clone(),
            id: self.id.clone(),
        }
    }

    /// Number of nodes in this subtree, including this one.
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(TreeNode::count).sum::<usize>()
    }

    /// Number of levels in this subtree, including this one.
    pub fn depth(&self) -> usize {
        1 + self.children.iter().map(TreeNode::depth).max().unwrap_or(0)
    }

    /// Pre-order search for a node of `kind` with primary key `id`.
    pub fn find(&self, kind: &str, id: &str) -> Option<&TreeNode> {
        if self.kind == kind && self.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(kind, id))
    }
}

/// Lists the children of a model.
pub trait Navigator<R> {
    fn next(&self, parent: &R) -> TreeResult<Vec<R>>;
}

/// Builds the node for a model.
pub trait NodeBuilder<R> {
    fn node(&self, parent: Option<&NodeRef>, model: &R) -> TreeResult<TreeNode>;
}

/// Tree builder.
#[derive(Clone, Debug)]
pub struct Tree<B> {
    builder: B,
}

impl<B> Tree<B> {
    pub fn new(builder: B) -> Self {
        Self { builder }
    }

    /// Build the tree rooted at `root`. Any navigator error aborts the build.
    pub fn build<R, N>(&self, root: &R, navigator: &N) -> TreeResult<TreeNode>
    where
        B: NodeBuilder<R>,
        N: Navigator<R>,
    {
        self.branch(None, root, navigator)
    }

    /// Build one tree per root as siblings under an implicit content root.
    pub fn build_all<R, N>(&self, roots: &[R], navigator: &N) -> TreeResult<TreeNode>
    where
        B: NodeBuilder<R>,
        N: Navigator<R>,
    {
        let mut content = TreeNode::default();
        for root in roots {
            content.children.push(self.branch(None, root, navigator)?);
        }
        Ok(content)
    }

    fn branch<R, N>(&self, parent: Option<&NodeRef>, model: &R, navigator: &N) -> TreeResult<TreeNode>
    where
        B: NodeBuilder<R>,
        N: Navigator<R>,
    {
        let mut node = self.builder.node(parent, model)?;
        let this = node.reference();
        for child in navigator.next(model)? {
            node.children.push(self.branch(Some(&this), &child, navigator)?);
        }
        debug!(kind = %node.kind, id = %node.id, children = node.children.len(), "tree node built");
        Ok(node)
    }
}

/// Detail level per kind. Unlisted kinds get summaries.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DetailMap {
    by_kind: BTreeMap<String, bool>,
}

impl DetailMap {
    pub fn new(by_kind: BTreeMap<String, bool>) -> Self {
        Self { by_kind }
    }

    /// The same level for every listed kind.
    pub fn uniform<'a>(kinds: impl IntoIterator<Item = &'a str>, full: bool) -> Self {
        Self {
            by_kind: kinds.into_iter().map(|k| (k.to_string(), full)).collect(),
        }
    }

    pub fn set(&mut self, kind: impl Into<String>, full: bool) {
        self.by_kind.insert(kind.into(), full);
    }

    pub fn detail(&self, kind: &str) -> Detail {
        Detail::from_flag(self.by_kind.get(kind).copied().unwrap_or(false))
    }
}

/// Builds `/providers/<platform>/<provider>/<route>/<id>` links.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelfLink {
    platform: &'static str,
    provider: String,
}

impl SelfLink {
    pub fn new(platform: &'static str, provider: impl Into<String>) -> Self {
        Self {
            platform,
            provider: provider.into(),
        }
    }

    pub fn link(&self, route: &str, id: &str) -> String {
        format!("/providers/{}/{}/{}/{}", self.platform, self.provider, route, id)
    }
}

/// Project a model into a node, adding its self link to the content.
pub fn project(
    parent: Option<&NodeRef>,
    view: &dyn Projection,
    detail: Detail,
    self_link: String,
) -> TreeResult<TreeNode> {
    let mut object = view.content(detail);
    match object.as_object_mut() {
        Some(fields) => {
            fields.insert("selfLink".into(), Value::String(self_link));
        }
        None => {
            return Err(TreeError::Projection(format!(
                "{} {} content is not an object",
                view.kind(),
                view.id()
            )))
        }
    }
    Ok(TreeNode {
        parent: parent.cloned(),
        id: view.id().to_string(),
        kind: view.kind().to_string(),
        object,
        children: Vec::new(),
    })
}
