//! Process tree: the hierarchical namespace over the variable registry.
//!
//! One tree is built per subsystem at startup and then frozen; browse
//! operations walk the frozen structure without taking any lock. Nodes
//! are a tagged variant (folder / object / variable) rather than a class
//! hierarchy; a variable node carries a back-reference handle into the
//! registry and its node id equals the registry identifier, which is what
//! lets a remote walker go straight from browse results to read requests.

use crate::error::TreeError;
use crate::registry::VarHandle;
use core::fmt;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ─── NodeKind ───────────────────────────────────────────────────────

/// Class of a process tree node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Folder,
    Object,
    Variable,
}

impl NodeKind {
    pub const fn is_container(self) -> bool {
        matches!(self, Self::Folder | Self::Object)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Folder => write!(f, "folder"),
            Self::Object => write!(f, "object"),
            Self::Variable => write!(f, "variable"),
        }
    }
}

// ─── NodeRef ────────────────────────────────────────────────────────

/// Subsystem-scoped node reference, as handed out by browse results.
///
/// For variable nodes the inner id equals the registry identifier;
/// clients treat the reference as opaque either way.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeRef(String);

impl NodeRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ─── Browse ─────────────────────────────────────────────────────────

/// One child in a browse result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrowseEntry {
    pub node: NodeRef,
    pub name: String,
    pub kind: NodeKind,
}

// ─── Tree ───────────────────────────────────────────────────────────

struct TreeNode {
    id: String,
    name: String,
    kind: NodeKind,
    #[allow(dead_code)] // back-reference kept for tooling; reads go by id
    var: Option<VarHandle>,
    children: Vec<usize>,
}

/// Frozen per-subsystem namespace.
pub struct ProcessTree {
    nodes: Vec<TreeNode>,
    by_id: HashMap<String, usize>,
    root: usize,
}

impl ProcessTree {
    /// Well-known entry point of this subsystem.
    pub fn root(&self) -> NodeRef {
        NodeRef::new(self.nodes[self.root].id.clone())
    }

    /// One level of children, in insertion order.
    ///
    /// # Errors
    ///
    /// `NodeNotFound` if the reference no longer names a node.
    pub fn browse(&self, node: &NodeRef) -> Result<Vec<BrowseEntry>, TreeError> {
        let index = *self
            .by_id
            .get(node.as_str())
            .ok_or_else(|| TreeError::NodeNotFound {
                node: node.as_str().to_string(),
            })?;
        Ok(self.nodes[index]
            .children
            .iter()
            .map(|&child| {
                let child = &self.nodes[child];
                BrowseEntry {
                    node: NodeRef::new(child.id.clone()),
                    name: child.name.clone(),
                    kind: child.kind,
                }
            })
            .collect())
    }

    /// Total node count, root included.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

// ─── Builder ────────────────────────────────────────────────────────

/// Build-once constructor for a [`ProcessTree`].
///
/// Enforces the structural invariants as nodes are added: node ids are
/// unique tree-wide, sibling names are unique, and children attach only
/// to containers. The resulting tree is acyclic by construction.
pub struct TreeBuilder {
    nodes: Vec<TreeNode>,
    by_id: HashMap<String, usize>,
}

impl TreeBuilder {
    /// Start a tree with its root object.
    pub fn new(root_id: &str, root_name: &str) -> Self {
        let mut by_id = HashMap::new();
        by_id.insert(root_id.to_string(), 0);
        Self {
            nodes: vec![TreeNode {
                id: root_id.to_string(),
                name: root_name.to_string(),
                kind: NodeKind::Object,
                var: None,
                children: Vec::new(),
            }],
            by_id,
        }
    }

    /// Reference to the root node.
    pub fn root(&self) -> NodeRef {
        NodeRef::new(self.nodes[0].id.clone())
    }

    pub fn add_object(
        &mut self,
        parent: &NodeRef,
        id: &str,
        name: &str,
    ) -> Result<NodeRef, TreeError> {
        self.add_node(parent, id, name, NodeKind::Object, None)
    }

    pub fn add_folder(
        &mut self,
        parent: &NodeRef,
        id: &str,
        name: &str,
    ) -> Result<NodeRef, TreeError> {
        self.add_node(parent, id, name, NodeKind::Folder, None)
    }

    /// Attach a variable leaf. `id` must be the registry identifier of
    /// `handle` so browse results double as read targets.
    pub fn add_variable(
        &mut self,
        parent: &NodeRef,
        id: &str,
        name: &str,
        handle: VarHandle,
    ) -> Result<NodeRef, TreeError> {
        self.add_node(parent, id, name, NodeKind::Variable, Some(handle))
    }

    fn add_node(
        &mut self,
        parent: &NodeRef,
        id: &str,
        name: &str,
        kind: NodeKind,
        var: Option<VarHandle>,
    ) -> Result<NodeRef, TreeError> {
        let parent_index =
            *self
                .by_id
                .get(parent.as_str())
                .ok_or_else(|| TreeError::NodeNotFound {
                    node: parent.as_str().to_string(),
                })?;
        if !self.nodes[parent_index].kind.is_container() {
            return Err(TreeError::NotAContainer {
                node: parent.as_str().to_string(),
            });
        }
        if self.by_id.contains_key(id) {
            return Err(TreeError::DuplicateId { id: id.to_string() });
        }
        let sibling_clash = self.nodes[parent_index]
            .children
            .iter()
            .any(|&child| self.nodes[child].name == name);
        if sibling_clash {
            return Err(TreeError::DuplicateName {
                parent: parent.as_str().to_string(),
                name: name.to_string(),
            });
        }

        let index = self.nodes.len();
        self.nodes.push(TreeNode {
            id: id.to_string(),
            name: name.to_string(),
            kind,
            var,
            children: Vec::new(),
        });
        self.by_id.insert(id.to_string(), index);
        self.nodes[parent_index].children.push(index);
        Ok(NodeRef::new(id))
    }

    /// Freeze the structure.
    pub fn finish(self) -> ProcessTree {
        ProcessTree {
            nodes: self.nodes,
            by_id: self.by_id,
            root: 0,
        }
    }
}
