//! Flattening into dependency order.

use crate::{DependencyTree, NodeId};

impl DependencyTree {
    /// Member nodes ordered so every node comes after the nodes it depends on.
    ///
    /// Nodes are taken in breadth-first order; each is placed right before the first
    /// already placed node that is its ancestor (through children or
    /// `uses_existing` edges), or appended when there is none.
    #[must_use]
    pub fn dependency_order(&self) -> Vec<NodeId> {
        let mut order: Vec<NodeId> = Vec::new();
        for node in self.bf_nodes() {
            let position = order
                .iter()
                .position(|placed| self.is_ancestor_of(*placed, node).unwrap_or(false));
            match position {
                Some(index) => order.insert(index, node),
                None => order.push(node),
            }
        }
        order
    }
}
