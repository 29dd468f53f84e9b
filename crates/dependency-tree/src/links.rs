//! Cross-edge index for collapsed duplicates.
//!
//! When a duplicate node is merged away, its former parent keeps depending on the
//! surviving node. That edge is not a tree edge, so it is tracked here as a pair of
//! adjacency lists owned by the tree rather than by the nodes themselves.

use crate::NodeId;
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct Links {
    uses_existing: HashMap<NodeId, Vec<NodeId>>,
    used_by: HashMap<NodeId, Vec<NodeId>>,
}

impl Links {
    /// Record that `from` depends on the existing node `to`. Repeated links are ignored.
    pub fn link(&mut self, from: NodeId, to: NodeId) {
        let targets = self.uses_existing.entry(from).or_default();
        if !targets.contains(&to) {
            targets.push(to);
        }
        let sources = self.used_by.entry(to).or_default();
        if !sources.contains(&from) {
            sources.push(from);
        }
    }

    pub fn uses_existing(&self, node: NodeId) -> &[NodeId] {
        self.uses_existing.get(&node).map_or(&[], Vec::as_slice)
    }

    pub fn used_by(&self, node: NodeId) -> &[NodeId] {
        self.used_by.get(&node).map_or(&[], Vec::as_slice)
    }

    /// Drop every link touching `node`, in both directions.
    pub fn unlink(&mut self, node: NodeId) {
        if let Some(sources) = self.used_by.remove(&node) {
            for source in sources {
                remove_from(&mut self.uses_existing, source, node);
            }
        }
        if let Some(targets) = self.uses_existing.remove(&node) {
            for target in targets {
                remove_from(&mut self.used_by, target, node);
            }
        }
    }

    /// Re-key every entry through `map`, used when a tree is cloned.
    pub fn rebase(&self, map: impl Fn(NodeId) -> NodeId) -> Self {
        let rebase_side = |side: &HashMap<NodeId, Vec<NodeId>>| {
            side.iter()
                .map(|(key, values)| (map(*key), values.iter().map(|v| map(*v)).collect()))
                .collect()
        };
        Self {
            uses_existing: rebase_side(&self.uses_existing),
            used_by: rebase_side(&self.used_by),
        }
    }
}

fn remove_from(side: &mut HashMap<NodeId, Vec<NodeId>>, key: NodeId, value: NodeId) {
    if let Some(values) = side.get_mut(&key) {
        values.retain(|v| *v != value);
        if values.is_empty() {
            side.remove(&key);
        }
    }
}
