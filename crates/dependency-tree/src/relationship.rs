//! Classification of how two nodes' artifacts relate to each other.

use crate::{ArtifactReference, DependencyTree, NodeId, Result};

/// Separates a webpackage name from its version.
const VERSION_DELIMITER: char = '@';

/// How the artifacts of two nodes relate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeRelationship {
    /// Same webpackage and artifact.
    Duplicate,
    /// Same artifact in two versions of the same webpackage.
    VersionConflict,
    /// Same artifact id in unrelated webpackages.
    NameConflict,
    /// Different artifact ids.
    Distinct,
}

impl NodeRelationship {
    /// Classify two artifact references.
    #[must_use]
    pub fn between(a: &ArtifactReference, b: &ArtifactReference) -> Self {
        if a.equals(b) {
            Self::Duplicate
        } else if a.artifact_id != b.artifact_id {
            Self::Distinct
        } else if webpackage_family(&a.webpackage_id) == webpackage_family(&b.webpackage_id) {
            Self::VersionConflict
        } else {
            Self::NameConflict
        }
    }
}

fn webpackage_family(webpackage_id: &str) -> &str {
    webpackage_id
        .split_once(VERSION_DELIMITER)
        .map_or(webpackage_id, |(family, _)| family)
}

impl DependencyTree {
    /// Classify the relationship between two nodes of this tree.
    pub fn determine_relationship(&self, a: NodeId, b: NodeId) -> Result<NodeRelationship> {
        self.check(a)?;
        self.check(b)?;
        Ok(NodeRelationship::between(&self.get(a).data, &self.get(b).data))
    }

    /// Filter `candidates` down to the nodes standing in `relationship` to `node`.
    pub fn get_related_nodes(
        &self,
        node: NodeId,
        candidates: &[NodeId],
        relationship: NodeRelationship,
    ) -> Result<Vec<NodeId>> {
        self.check(node)?;
        let mut related = Vec::new();
        for candidate in candidates {
            if self.determine_relationship(node, *candidate)? == relationship {
                related.push(*candidate);
            }
        }
        Ok(related)
    }
}
