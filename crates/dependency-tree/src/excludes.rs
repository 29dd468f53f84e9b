//! Exclusion marking and pruning.

use crate::{DependencyTree, NodeId};
use tracing::debug;

impl DependencyTree {
    /// Mark every node pruned by an ancestor's exclusion rules.
    ///
    /// For each node, every strict descendant matching one of the node's
    /// `dependency_excludes` is marked together with its whole subtree. Marks are only
    /// ever set here; they are cleared again when a duplicate that was not excluded is
    /// merged during [`remove_duplicates`](Self::remove_duplicates).
    pub fn apply_excludes(&mut self) -> &mut Self {
        let mut marked: Vec<NodeId> = Vec::new();
        for node in self.bf_nodes() {
            let rules = &self.get(node).data.dependency_excludes;
            if rules.is_empty() {
                continue;
            }
            let mut queue: Vec<NodeId> = self.get(node).children.clone();
            while let Some(id) = queue.pop() {
                let candidate = &self.get(id).data;
                if rules.iter().any(|rule| rule.matches(candidate)) {
                    self.collect_subtree(id, &mut marked);
                } else {
                    queue.extend(self.get(id).children.iter().copied());
                }
            }
        }
        debug!(count = marked.len(), "Marked excluded nodes");
        for id in marked {
            self.get_mut(id).excluded = true;
        }
        self
    }

    fn collect_subtree(&self, node: NodeId, into: &mut Vec<NodeId>) {
        let mut stack = vec![node];
        while let Some(id) = stack.pop() {
            into.push(id);
            stack.extend(self.get(id).children.iter().copied());
        }
    }

    /// Mark every node carrying the given artifact as excluded and clear the mark on
    /// all other nodes.
    pub fn apply_global_exclude(&mut self, webpackage_id: &str, artifact_id: &str) -> &mut Self {
        for node in self.bf_nodes() {
            let matches = self.get(node).data.is(webpackage_id, artifact_id);
            self.get_mut(node).excluded = matches;
        }
        self
    }

    /// Remove every excluded node together with its subtree.
    pub fn remove_excludes(&mut self) -> &mut Self {
        let excluded: Vec<NodeId> = self
            .bf_nodes()
            .into_iter()
            .filter(|id| self.get(*id).excluded)
            .collect();
        for node in excluded {
            // Nodes below an already removed node are no longer members.
            if let Ok(Some(removed)) = self.remove_node(node) {
                debug!(node = %self.get(removed).data.id(), "Removed excluded node");
            }
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use crate::{ArtifactIdentity, ArtifactReference, DependencyExclude, DependencyTree, NodeId};

    fn pkg(n: u8) -> ArtifactIdentity {
        ArtifactIdentity::new(format!("package{n}@1.0.0"), format!("util{n}"))
    }

    fn add(tree: &mut DependencyTree, parent: Option<NodeId>, n: u8) -> NodeId {
        let identity = pkg(n);
        let node = tree.create_node(ArtifactReference::new(
            identity.webpackage_id,
            identity.artifact_id,
            None,
        ));
        tree.insert_node(node, parent, None).unwrap()
    }

    fn exclude(n: u8) -> Vec<DependencyExclude> {
        let identity = pkg(n);
        vec![DependencyExclude::new(identity.webpackage_id, identity.artifact_id)]
    }

    fn excluded(tree: &DependencyTree, node: NodeId) -> bool {
        tree.node(node).unwrap().is_excluded()
    }

    #[test]
    fn test_apply_excludes_marks_matching_subtrees() {
        // util1[util4]{util3[util6]{util5{util6}}, util4}
        // util2[util5]{util3{util5{util6}}, util5{util6}, util4}
        let mut tree = DependencyTree::new();
        let a = add(&mut tree, None, 1);
        let b = add(&mut tree, None, 2);
        let a1 = add(&mut tree, Some(a), 3);
        let a2 = add(&mut tree, Some(a), 4);
        let b1 = add(&mut tree, Some(b), 3);
        let b2 = add(&mut tree, Some(b), 5);
        let a11 = add(&mut tree, Some(a1), 5);
        let b11 = add(&mut tree, Some(b1), 5);
        let b21 = add(&mut tree, Some(b2), 6);
        let a111 = add(&mut tree, Some(a11), 6);
        let b111 = add(&mut tree, Some(b11), 6);
        let b3 = add(&mut tree, Some(b), 4);

        tree.data_mut(a).unwrap().dependency_excludes = exclude(4);
        tree.data_mut(a1).unwrap().dependency_excludes = exclude(6);
        tree.data_mut(b).unwrap().dependency_excludes = exclude(5);

        tree.apply_excludes();

        for node in [a, b, a1, b1, b3, a11] {
            assert!(!excluded(&tree, node), "{}", tree.path_as_string(node).unwrap());
        }
        for node in [a2, b2, a111, b11, b21, b111] {
            assert!(excluded(&tree, node), "{}", tree.path_as_string(node).unwrap());
        }
    }

    #[test]
    fn test_apply_excludes_ignores_the_declaring_node() {
        let mut tree = DependencyTree::new();
        let a = add(&mut tree, None, 1);
        tree.data_mut(a).unwrap().dependency_excludes = exclude(1);
        tree.apply_excludes();
        assert!(!excluded(&tree, a));
    }

    #[test]
    fn test_apply_excludes_matches_endpoint_suffix() {
        let mut tree = DependencyTree::new();
        let a = add(&mut tree, None, 1);
        let child = tree.create_node(ArtifactReference::new("package2@1.0.0", "util2#main", None));
        tree.insert_node(child, Some(a), None).unwrap();
        tree.data_mut(a).unwrap().dependency_excludes = exclude(2);
        tree.apply_excludes();
        assert!(excluded(&tree, child));
    }

    #[test]
    fn test_apply_global_exclude() {
        let mut tree = DependencyTree::new();
        let a = add(&mut tree, None, 1);
        let a1 = add(&mut tree, Some(a), 3);
        let a2 = add(&mut tree, Some(a), 4);
        let b = add(&mut tree, None, 2);
        let b1 = add(&mut tree, Some(b), 3);
        tree.get_mut(a2).excluded = true;

        tree.apply_global_exclude("package3@1.0.0", "util3");
        assert!(excluded(&tree, a1));
        assert!(excluded(&tree, b1));
        assert!(!excluded(&tree, a));
        assert!(!excluded(&tree, a2));
        assert!(!excluded(&tree, b));
    }

    #[test]
    fn test_remove_excludes() {
        let mut tree = DependencyTree::new();
        let a = add(&mut tree, None, 1);
        let a1 = add(&mut tree, Some(a), 3);
        let a11 = add(&mut tree, Some(a1), 5);
        let a111 = add(&mut tree, Some(a11), 6);
        let b = add(&mut tree, None, 2);
        let b1 = add(&mut tree, Some(b), 5);
        for node in [a11, a111, b1] {
            tree.get_mut(node).excluded = true;
        }

        tree.remove_excludes();
        assert_eq!(tree.root_nodes(), &[a, b]);
        assert_eq!(tree.node(a).unwrap().children(), &[a1]);
        assert!(tree.node(a1).unwrap().children().is_empty());
        assert!(tree.node(b).unwrap().children().is_empty());

        let mut any_excluded = false;
        tree.traverse_bf(|_, node| {
            any_excluded |= node.is_excluded();
            true
        });
        assert!(!any_excluded);
    }
}
