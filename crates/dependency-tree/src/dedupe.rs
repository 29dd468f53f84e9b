//! Duplicate collapsing and version conflict handling.
//!
//! The tree is walked in breadth-first order. The first node found for an artifact
//! is kept; every later node carrying the same artifact is merged into it and
//! removed together with its subtree. The former parent of a removed node keeps a
//! cross-edge to the kept node, see [`DependencyTree::uses_existing`].

use crate::{DependencyTree, Error, NodeId, NodeRelationship, Result};
use indexmap::IndexMap;
use std::collections::{HashMap, VecDeque};
use tracing::{debug, error, info, warn};

/// Kind of conflict between two nodes carrying the same artifact id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConflictType {
    /// Two versions of the same webpackage.
    Version,
    /// Two unrelated webpackages.
    Name,
}

/// A conflict found while removing duplicates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConflictRecord {
    /// The node that stays in the tree.
    pub node: NodeId,
    /// The node found later in breadth-first order.
    pub conflicted_node: NodeId,
    /// What kind of conflict was found.
    pub kind: ConflictType,
    /// Whether the conflicted node was removed in favor of `node`.
    pub resolved: bool,
}

impl ConflictRecord {
    pub(crate) fn rebase(&self, map: impl Fn(NodeId) -> NodeId) -> Self {
        Self {
            node: map(self.node),
            conflicted_node: map(self.conflicted_node),
            kind: self.kind,
            resolved: self.resolved,
        }
    }
}

/// Nodes sharing an artifact id across different versions of a webpackage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConflictGroup {
    /// The shared artifact id.
    pub artifact_id: String,
    /// Conflicting nodes in breadth-first order.
    pub nodes: Vec<NodeId>,
}

impl DependencyTree {
    /// Turn on automatic conflict resolution for subsequent
    /// [`remove_duplicates`](Self::remove_duplicates) calls.
    pub fn enable_acr(&mut self) -> &mut Self {
        self.config.automatic_conflict_resolution = true;
        self
    }

    /// Conflicts recorded by previous [`remove_duplicates`](Self::remove_duplicates) runs.
    #[must_use]
    pub fn conflicted_nodes(&self) -> &[ConflictRecord] {
        &self.conflicts
    }

    /// Collapse duplicated artifacts so each one appears in at most one member node.
    ///
    /// With automatic conflict resolution enabled, a node in version conflict with an
    /// earlier node is collapsed the same way. Name conflicts are only recorded.
    pub fn remove_duplicates(&mut self) -> &mut Self {
        let acr = self.config.automatic_conflict_resolution;
        let mut canonical_by_id: HashMap<String, NodeId> = HashMap::new();
        let mut kept_by_artifact: HashMap<String, Vec<NodeId>> = HashMap::new();
        let mut queue: VecDeque<NodeId> = self.root_nodes.iter().copied().collect();
        let mut removed = 0usize;

        while let Some(node) = queue.pop_front() {
            let concatenated_id = self.get(node).data.concatenated_id();
            if let Some(&canonical) = canonical_by_id.get(&concatenated_id) {
                self.merge_duplicate(canonical, node);
                removed += 1;
                continue;
            }

            let artifact_id = self.get(node).data.artifact_id.clone();
            let kept = kept_by_artifact.get(&artifact_id).cloned().unwrap_or_default();

            let mut collapsed = false;
            for &other in &kept {
                match NodeRelationship::between(&self.get(other).data, &self.get(node).data) {
                    NodeRelationship::VersionConflict if acr => {
                        self.remove_conflicted_node(other, node);
                        removed += 1;
                        collapsed = true;
                        break;
                    }
                    NodeRelationship::VersionConflict => {
                        self.record_conflict(other, node, ConflictType::Version, false);
                    }
                    NodeRelationship::NameConflict => {
                        warn!(
                            artifact = %artifact_id,
                            kept = %self.get(other).data.webpackage_id,
                            conflicting = %self.get(node).data.webpackage_id,
                            "Artifact name conflict between unrelated webpackages"
                        );
                        self.record_conflict(other, node, ConflictType::Name, false);
                    }
                    NodeRelationship::Duplicate | NodeRelationship::Distinct => {}
                }
            }
            if collapsed {
                continue;
            }

            canonical_by_id.insert(concatenated_id, node);
            kept_by_artifact.entry(artifact_id).or_default().push(node);
            queue.extend(self.get(node).children.iter().copied());
        }

        debug!(removed, acr, "Removed duplicated nodes");
        self
    }

    /// Merge `duplicate` into `canonical` and remove `duplicate` from the tree.
    ///
    /// The exclusion state of both subtrees is combined with AND, the referrers of
    /// `duplicate` are appended to the ones of `canonical` and the former parent of
    /// `duplicate` gets a cross-edge to `canonical`.
    pub(crate) fn merge_duplicate(&mut self, canonical: NodeId, duplicate: NodeId) {
        self.merge_excluded(canonical, duplicate);

        let referrers = self.get(duplicate).data.referrer.clone();
        self.get_mut(canonical).data.add_referrers(&referrers);

        let parent = self.get(duplicate).parent;
        if let Some(parent) = parent {
            self.links.link(parent, canonical);
        }
        // Handles were validated when the walk started.
        if let Ok(Some(_)) = self.remove_node(duplicate) {
            debug!(
                duplicate = %self.get(duplicate).data.id(),
                "Collapsed duplicate node"
            );
        }
    }

    fn merge_excluded(&mut self, canonical: NodeId, duplicate: NodeId) {
        let excluded = self.get(canonical).excluded && self.get(duplicate).excluded;
        self.get_mut(canonical).excluded = excluded;

        let counterparts: Vec<(NodeId, NodeId)> = self
            .get(canonical)
            .children
            .iter()
            .filter_map(|child| {
                self.get(duplicate)
                    .children
                    .iter()
                    .find(|other| self.get(*child).data.equals(&self.get(**other).data))
                    .map(|other| (*child, *other))
            })
            .collect();
        for (child, other) in counterparts {
            self.merge_excluded(child, other);
        }
    }

    /// Collapse `loser` into `winner` after a version conflict and record it.
    pub(crate) fn remove_conflicted_node(&mut self, winner: NodeId, loser: NodeId) {
        info!(
            kept = %self.get(winner).data.id(),
            removed = %self.get(loser).data.id(),
            "Resolved version conflict"
        );
        self.record_conflict(winner, loser, ConflictType::Version, true);
        self.merge_duplicate(winner, loser);
    }

    fn record_conflict(
        &mut self,
        node: NodeId,
        conflicted_node: NodeId,
        kind: ConflictType,
        resolved: bool,
    ) {
        let record = ConflictRecord {
            node,
            conflicted_node,
            kind,
            resolved,
        };
        if !self.conflicts.contains(&record) {
            self.conflicts.push(record);
        }
    }

    /// Version conflicts currently present in the tree, or in the subtree of `node`.
    ///
    /// Groups are keyed by artifact id in breadth-first discovery order; only groups
    /// with more than one node are returned.
    pub fn get_list_of_conflicted_nodes(&self, node: Option<NodeId>) -> Result<Vec<ConflictGroup>> {
        let mut groups: IndexMap<String, Vec<NodeId>> = IndexMap::new();
        let mut collect = |id: NodeId, _: &crate::Node| {
            let group = groups.entry(self.get(id).data.artifact_id.clone()).or_default();
            let relations: Vec<NodeRelationship> = group
                .iter()
                .map(|member| NodeRelationship::between(&self.get(*member).data, &self.get(id).data))
                .collect();
            if group.is_empty()
                || (!relations.contains(&NodeRelationship::Duplicate)
                    && relations.contains(&NodeRelationship::VersionConflict))
            {
                group.push(id);
            }
            true
        };

        match node {
            Some(node) => {
                self.check(node)?;
                if !self.contains(node) {
                    error!(%node, "Cannot list conflicts below a node outside the tree");
                    return Err(Error::NotAMember { node });
                }
                self.traverse_subtree_bf(node, &mut collect)?;
            }
            None => self.traverse_bf(&mut collect),
        }

        Ok(groups
            .into_iter()
            .filter(|(_, nodes)| nodes.len() > 1)
            .map(|(artifact_id, nodes)| ConflictGroup { artifact_id, nodes })
            .collect())
    }
}
