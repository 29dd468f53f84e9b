//! Arena-backed dependency tree.

use crate::dedupe::ConflictRecord;
use crate::links::Links;
use crate::{ArtifactReference, Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

static NEXT_TREE_ID: AtomicU64 = AtomicU64::new(1);

fn next_tree_id() -> u64 {
    NEXT_TREE_ID.fetch_add(1, Ordering::Relaxed)
}

/// Handle to a node of a [`DependencyTree`].
///
/// Handles carry the id of the tree that created them; passing a handle to another
/// tree (including a clone) is rejected with [`Error::InvalidArgument`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    tree: u64,
    index: usize,
}

impl NodeId {
    pub(crate) const fn new(tree: u64, index: usize) -> Self {
        Self { tree, index }
    }

    /// Position of the node in its tree's arena.
    #[must_use]
    pub const fn index(self) -> usize {
        self.index
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}:{}", self.tree, self.index)
    }
}

/// Tree-wide behavior switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeConfig {
    /// Collapse version conflicts during [`DependencyTree::remove_duplicates`],
    /// keeping the node found first in breadth-first order.
    #[serde(default)]
    pub automatic_conflict_resolution: bool,
}

/// A node of the dependency tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub(crate) data: ArtifactReference,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) excluded: bool,
}

impl Node {
    /// The artifact reference carried by this node.
    #[must_use]
    pub const fn data(&self) -> &ArtifactReference {
        &self.data
    }

    /// Tree parent, `None` for root nodes and detached nodes.
    #[must_use]
    pub const fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Ordered children.
    #[must_use]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Whether an exclusion rule marked this node for pruning.
    #[must_use]
    pub const fn is_excluded(&self) -> bool {
        self.excluded
    }
}

/// Tree of artifact dependencies.
///
/// Nodes live in an arena and are addressed through [`NodeId`] handles. Removing a
/// node detaches it and its subtree; the handles stay valid for reading but the
/// nodes are no longer [members](Self::contains) of the tree.
#[derive(Debug)]
pub struct DependencyTree {
    id: u64,
    pub(crate) nodes: Vec<Node>,
    pub(crate) root_nodes: Vec<NodeId>,
    pub(crate) links: Links,
    pub(crate) conflicts: Vec<ConflictRecord>,
    pub(crate) config: TreeConfig,
}

impl Default for DependencyTree {
    fn default() -> Self {
        Self::new()
    }
}

impl DependencyTree {
    /// Create an empty tree with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(TreeConfig::default())
    }

    /// Create an empty tree.
    #[must_use]
    pub fn with_config(config: TreeConfig) -> Self {
        Self {
            id: next_tree_id(),
            nodes: Vec::new(),
            root_nodes: Vec::new(),
            links: Links::default(),
            conflicts: Vec::new(),
            config,
        }
    }

    /// Current configuration.
    #[must_use]
    pub const fn config(&self) -> &TreeConfig {
        &self.config
    }

    /// Allocate a detached node carrying `data`.
    pub fn create_node(&mut self, data: ArtifactReference) -> NodeId {
        let id = NodeId::new(self.id, self.nodes.len());
        self.nodes.push(Node {
            data,
            parent: None,
            children: Vec::new(),
            excluded: false,
        });
        id
    }

    pub(crate) fn check(&self, node: NodeId) -> Result<()> {
        if node.tree == self.id && node.index < self.nodes.len() {
            Ok(())
        } else {
            Err(Error::invalid_argument(format!(
                "node {node} was not created by this dependency tree"
            )))
        }
    }

    /// Look up a node. Returns `None` for handles issued by another tree.
    #[must_use]
    pub fn node(&self, node: NodeId) -> Option<&Node> {
        if node.tree == self.id {
            self.nodes.get(node.index)
        } else {
            None
        }
    }

    /// The artifact reference of a node.
    #[must_use]
    pub fn data(&self, node: NodeId) -> Option<&ArtifactReference> {
        self.node(node).map(Node::data)
    }

    /// Mutable access to the artifact reference of a node.
    pub fn data_mut(&mut self, node: NodeId) -> Option<&mut ArtifactReference> {
        if node.tree == self.id {
            self.nodes.get_mut(node.index).map(|n| &mut n.data)
        } else {
            None
        }
    }

    // Callers must have validated the handle.
    pub(crate) fn get(&self, node: NodeId) -> &Node {
        &self.nodes[node.index]
    }

    pub(crate) fn get_mut(&mut self, node: NodeId) -> &mut Node {
        &mut self.nodes[node.index]
    }

    /// Top-level nodes in insertion order.
    #[must_use]
    pub fn root_nodes(&self) -> &[NodeId] {
        &self.root_nodes
    }

    /// Insert `node` below `parent`, or as a root node when `parent` is `None`.
    ///
    /// The node is placed right before `before` when that node is a sibling at the
    /// target position, otherwise it is appended. A node that is already attached
    /// somewhere is moved.
    pub fn insert_node(
        &mut self,
        node: NodeId,
        parent: Option<NodeId>,
        before: Option<NodeId>,
    ) -> Result<NodeId> {
        self.check(node)?;
        if let Some(before) = before {
            self.check(before)?;
        }
        if let Some(parent) = parent {
            self.check(parent)?;
            if parent == node || self.is_tree_ancestor(node, parent) {
                return Err(Error::invalid_argument(format!(
                    "cannot insert node {node} below its own descendant {parent}"
                )));
            }
        }

        self.detach(node);

        let siblings = match parent {
            Some(parent) => &mut self.nodes[parent.index].children,
            None => &mut self.root_nodes,
        };
        let position = before
            .and_then(|before| siblings.iter().position(|sibling| *sibling == before))
            .unwrap_or(siblings.len());
        siblings.insert(position, node);
        self.get_mut(node).parent = parent;
        Ok(node)
    }

    /// Remove `node` and its subtree from the tree.
    ///
    /// Cross-edges touching any removed node are dropped. Returns `Ok(None)` when the
    /// node is not a member of the tree.
    pub fn remove_node(&mut self, node: NodeId) -> Result<Option<NodeId>> {
        self.check(node)?;
        if !self.contains(node) {
            debug!(%node, "remove_node: node is not a member of the tree");
            return Ok(None);
        }
        let mut subtree = Vec::new();
        self.walk_bf(&[node], |id, _| {
            subtree.push(id);
            true
        });
        for id in subtree {
            self.links.unlink(id);
        }
        self.detach(node);
        Ok(Some(node))
    }

    fn detach(&mut self, node: NodeId) {
        match self.get(node).parent {
            Some(parent) => self.get_mut(parent).children.retain(|c| *c != node),
            None => self.root_nodes.retain(|r| *r != node),
        }
        self.get_mut(node).parent = None;
    }

    // Whether `ancestor` is on the parent chain of `node`.
    fn is_tree_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = self.get(node).parent;
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.get(id).parent;
        }
        false
    }

    /// Whether `node` is reachable from the root nodes.
    #[must_use]
    pub fn contains(&self, node: NodeId) -> bool {
        if self.node(node).is_none() {
            return false;
        }
        let mut top = node;
        while let Some(parent) = self.get(top).parent {
            top = parent;
        }
        self.root_nodes.contains(&top)
    }

    /// Depth-first pre-order walk. Returning `false` from `visit` stops the walk.
    pub fn traverse_df(&self, mut visit: impl FnMut(NodeId, &Node) -> bool) {
        let mut stack: Vec<NodeId> = self.root_nodes.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            let node = self.get(id);
            if !visit(id, node) {
                return;
            }
            stack.extend(node.children.iter().rev().copied());
        }
    }

    /// Breadth-first walk over all root nodes. Returning `false` stops the walk.
    pub fn traverse_bf(&self, visit: impl FnMut(NodeId, &Node) -> bool) {
        self.walk_bf(&self.root_nodes, visit);
    }

    /// Breadth-first walk over the subtree rooted at `node`, `node` included.
    pub fn traverse_subtree_bf(
        &self,
        node: NodeId,
        visit: impl FnMut(NodeId, &Node) -> bool,
    ) -> Result<()> {
        self.check(node)?;
        self.walk_bf(&[node], visit);
        Ok(())
    }

    fn walk_bf(&self, start: &[NodeId], mut visit: impl FnMut(NodeId, &Node) -> bool) {
        let mut queue: VecDeque<NodeId> = start.iter().copied().collect();
        while let Some(id) = queue.pop_front() {
            let node = self.get(id);
            if !visit(id, node) {
                return;
            }
            queue.extend(node.children.iter().copied());
        }
    }

    /// Every member node in breadth-first order.
    #[must_use]
    pub fn bf_nodes(&self) -> Vec<NodeId> {
        let mut ids = Vec::with_capacity(self.nodes.len());
        self.traverse_bf(|id, _| {
            ids.push(id);
            true
        });
        ids
    }

    /// Nodes whose duplicates `node` used to depend on.
    #[must_use]
    pub fn uses_existing(&self, node: NodeId) -> &[NodeId] {
        self.links.uses_existing(node)
    }

    /// Nodes depending on `node` through a collapsed duplicate.
    #[must_use]
    pub fn used_by(&self, node: NodeId) -> &[NodeId] {
        self.links.used_by(node)
    }

    /// Record that `node` depends on the already present `existing` node.
    pub fn add_uses_existing(&mut self, node: NodeId, existing: NodeId) -> Result<()> {
        self.check(node)?;
        self.check(existing)?;
        self.links.link(node, existing);
        Ok(())
    }

    /// Whether `node` lies below `other`, following tree parents and `used_by` edges.
    pub fn is_descendant_of(&self, node: NodeId, other: NodeId) -> Result<bool> {
        self.check(node)?;
        self.check(other)?;
        Ok(self.reaches(node, other, |tree, id| {
            tree.get(id)
                .parent
                .into_iter()
                .chain(tree.used_by(id).iter().copied())
                .collect()
        }))
    }

    /// Whether `node` lies above `other`, following children and `uses_existing` edges.
    pub fn is_ancestor_of(&self, node: NodeId, other: NodeId) -> Result<bool> {
        self.check(node)?;
        self.check(other)?;
        Ok(self.reaches(node, other, |tree, id| {
            tree.get(id)
                .children
                .iter()
                .chain(tree.uses_existing(id))
                .copied()
                .collect()
        }))
    }

    fn reaches(
        &self,
        from: NodeId,
        target: NodeId,
        next: impl Fn(&Self, NodeId) -> Vec<NodeId>,
    ) -> bool {
        let mut seen = HashSet::from([from]);
        let mut queue: VecDeque<NodeId> = next(self, from).into();
        while let Some(id) = queue.pop_front() {
            if id == target {
                return true;
            }
            if seen.insert(id) {
                queue.extend(next(self, id));
            }
        }
        false
    }

    /// Whether both nodes carry the same artifact.
    pub fn equals_artifact(&self, a: NodeId, b: NodeId) -> Result<bool> {
        self.check(a)?;
        self.check(b)?;
        Ok(self.get(a).data.equals(&self.get(b).data))
    }

    /// Chain of `webpackageId/artifactId` ids from the root down to `node`,
    /// joined with `" > "`.
    pub fn path_as_string(&self, node: NodeId) -> Result<String> {
        self.check(node)?;
        let mut path = vec![self.get(node).data.id()];
        let mut current = self.get(node).parent;
        while let Some(id) = current {
            path.push(self.get(id).data.id());
            current = self.get(id).parent;
        }
        path.reverse();
        Ok(path.join(" > "))
    }
}

impl Clone for DependencyTree {
    /// Deep copy under a fresh tree id. Handles of the original are not valid for
    /// the copy; equivalent handles share the same [`NodeId::index`].
    fn clone(&self) -> Self {
        let id = next_tree_id();
        let map = |node: NodeId| NodeId::new(id, node.index);
        Self {
            id,
            nodes: self
                .nodes
                .iter()
                .map(|node| Node {
                    data: node.data.clone(),
                    parent: node.parent.map(map),
                    children: node.children.iter().copied().map(map).collect(),
                    excluded: node.excluded,
                })
                .collect(),
            root_nodes: self.root_nodes.iter().copied().map(map).collect(),
            links: self.links.rebase(map),
            conflicts: self.conflicts.iter().map(|c| c.rebase(map)).collect(),
            config: self.config,
        }
    }
}
