//! Plain serializable projection of a dependency tree.
//!
//! Cross-edges are rendered as bare identity pairs so the output stays a tree.

use crate::{ArtifactIdentity, DependencyTree, NodeId, ResourceItem, Result};
use serde::Serialize;

/// Serializable form of a whole tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeJson {
    /// One entry per root node.
    pub root_nodes: Vec<NodeJson>,
}

/// Serializable form of a node and its subtree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeJson {
    /// Webpackage of the artifact.
    pub webpackage_id: String,
    /// The artifact.
    pub artifact_id: String,
    /// Resources of the artifact, only present when requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resources: Option<Vec<ResourceItem>>,
    /// Serialized children.
    pub children: Vec<NodeJson>,
    /// Artifacts this node depends on through collapsed duplicates.
    pub uses_existing: Vec<ArtifactIdentity>,
    /// Artifacts depending on this node through collapsed duplicates.
    pub used_by: Vec<ArtifactIdentity>,
    /// Exclusion mark.
    pub excluded: bool,
}

impl DependencyTree {
    /// Project the whole tree.
    #[must_use]
    pub fn to_json(&self, include_resources: bool) -> TreeJson {
        TreeJson {
            root_nodes: self
                .root_nodes
                .iter()
                .map(|root| self.project(*root, include_resources))
                .collect(),
        }
    }

    /// Project a single node and its subtree.
    pub fn node_to_json(&self, node: NodeId, include_resources: bool) -> Result<NodeJson> {
        self.check(node)?;
        Ok(self.project(node, include_resources))
    }

    fn project(&self, node: NodeId, include_resources: bool) -> NodeJson {
        let current = self.get(node);
        let identities = |ids: &[NodeId]| -> Vec<ArtifactIdentity> {
            ids.iter().map(|id| self.get(*id).data.identity()).collect()
        };
        NodeJson {
            webpackage_id: current.data.webpackage_id.clone(),
            artifact_id: current.data.artifact_id.clone(),
            resources: include_resources.then(|| current.data.resources.clone()),
            children: current
                .children
                .iter()
                .map(|child| self.project(*child, include_resources))
                .collect(),
            uses_existing: identities(self.uses_existing(node)),
            used_by: identities(self.used_by(node)),
            excluded: current.excluded,
        }
    }
}
