//! Property-based tests for dependency tree invariants.
//!
//! These tests verify the behavioral contracts of the dependency tree:
//! - Duplicate removal is idempotent and keeps every artifact exactly once
//! - Cloning yields an equal but independent tree
//! - Dependency order puts every node after the nodes it depends on
//! - Exclusion pruning matches a rule-inheriting depth-first walk

use cubx_dependency_tree::{ArtifactReference, DependencyExclude, DependencyTree, NodeId};
use proptest::prelude::*;
use std::collections::HashSet;

// =============================================================================
// Strategies for generating test data
// =============================================================================

/// Highest artifact rank generated.
const MAX_RANK: usize = 8;

/// Generate a tree shape as `(parent, rank step)` pairs.
///
/// Every child carries an artifact of strictly higher rank than its parent. Cross
/// edges created by duplicate removal therefore always point to higher ranks, which
/// keeps the resulting graph acyclic.
fn tree_strategy(max_nodes: usize) -> impl Strategy<Value = Vec<(Option<prop::sample::Index>, usize)>> {
    proptest::collection::vec(
        (proptest::option::of(any::<prop::sample::Index>()), 1..=3_usize),
        1..=max_nodes,
    )
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Build a DependencyTree from a generated shape.
fn build_tree(shape: &[(Option<prop::sample::Index>, usize)]) -> DependencyTree {
    let mut tree = DependencyTree::new();
    let mut placed: Vec<(NodeId, usize)> = Vec::new();

    for (i, (parent, step)) in shape.iter().enumerate() {
        let parent = parent
            .filter(|_| i > 0)
            .map(|index| placed[index.index(i)])
            .filter(|(_, rank)| rank + step <= MAX_RANK);
        let rank = parent.map_or(step - 1, |(_, rank)| rank + step);

        let node = tree.create_node(ArtifactReference::new(
            format!("package{rank}@1.0.0"),
            format!("util{rank}"),
            None,
        ));
        tree.insert_node(node, parent.map(|(id, _)| id), None)
            .expect("insert should succeed");
        placed.push((node, rank));
    }

    tree
}

/// Give the `i`-th node in breadth-first order an exclude rule for the artifact of
/// rank `excludes[i]`.
fn attach_excludes(tree: &mut DependencyTree, excludes: &[Option<usize>]) {
    for (node, rank) in tree.bf_nodes().into_iter().zip(excludes) {
        if let Some(rank) = rank {
            let rule = DependencyExclude::new(format!("package{rank}@1.0.0"), format!("util{rank}"));
            tree.data_mut(node).expect("own handle").add_excludes([&rule]);
        }
    }
}

/// Nodes left after pruning, computed top-down: a node goes with its subtree when a
/// rule declared by any ancestor matches it.
fn surviving_nodes(tree: &DependencyTree) -> HashSet<NodeId> {
    fn visit(
        tree: &DependencyTree,
        node: NodeId,
        inherited: &[DependencyExclude],
        survivors: &mut HashSet<NodeId>,
    ) {
        let data = tree.data(node).expect("member node");
        if inherited.iter().any(|rule| rule.matches(data)) {
            return;
        }
        survivors.insert(node);
        let mut rules = inherited.to_vec();
        rules.extend(data.dependency_excludes.iter().cloned());
        for child in tree.node(node).expect("member node").children() {
            visit(tree, *child, &rules, survivors);
        }
    }

    let mut survivors = HashSet::new();
    for root in tree.root_nodes() {
        visit(tree, *root, &[], &mut survivors);
    }
    survivors
}

fn identities(tree: &DependencyTree) -> Vec<String> {
    tree.bf_nodes()
        .iter()
        .map(|node| tree.data(*node).expect("member node").id())
        .collect()
}

// =============================================================================
// Property Tests: Duplicate Removal
// =============================================================================

proptest! {
    /// Contract: Running remove_duplicates twice yields the same tree as once.
    #[test]
    fn remove_duplicates_is_idempotent(shape in tree_strategy(25)) {
        let mut tree = build_tree(&shape);
        tree.remove_duplicates();
        let once = tree.to_json(true);
        tree.remove_duplicates();
        prop_assert_eq!(tree.to_json(true), once);
    }

    /// Contract: The set of distinct artifacts survives duplicate removal, and each
    /// one is carried by exactly one member node afterwards.
    #[test]
    fn remove_duplicates_preserves_artifact_set(shape in tree_strategy(25)) {
        let mut tree = build_tree(&shape);
        let before: HashSet<String> = identities(&tree).into_iter().collect();

        tree.remove_duplicates();
        let after = identities(&tree);
        let after_set: HashSet<String> = after.iter().cloned().collect();

        prop_assert_eq!(&before, &after_set);
        prop_assert_eq!(after.len(), after_set.len(), "Each artifact should appear once");
    }
}

// =============================================================================
// Property Tests: Cloning
// =============================================================================

proptest! {
    /// Contract: A clone is deeply equal to its source at cloning time.
    #[test]
    fn clone_is_deeply_equal(shape in tree_strategy(25)) {
        let mut tree = build_tree(&shape);
        tree.remove_duplicates();
        let copy = tree.clone();
        prop_assert_eq!(copy.to_json(true), tree.to_json(true));
    }

    /// Contract: Mutating a clone leaves the source untouched.
    #[test]
    fn clone_is_independent(shape in tree_strategy(25)) {
        let tree = build_tree(&shape);
        let before = tree.to_json(true);

        let mut copy = tree.clone();
        let roots: Vec<NodeId> = copy.root_nodes().to_vec();
        for root in roots {
            copy.remove_node(root).expect("own handle");
        }

        prop_assert!(copy.root_nodes().is_empty());
        prop_assert_eq!(tree.to_json(true), before);
    }
}

// =============================================================================
// Property Tests: Dependency Order
// =============================================================================

proptest! {
    /// Contract: Every node appears after all nodes it depends on, following both
    /// tree edges and cross edges left by duplicate removal.
    #[test]
    fn dependency_order_is_topological(shape in tree_strategy(20)) {
        let mut tree = build_tree(&shape);
        tree.remove_duplicates();
        let order = tree.dependency_order();

        prop_assert_eq!(order.len(), tree.bf_nodes().len());
        for (i, earlier) in order.iter().enumerate() {
            for later in &order[i + 1..] {
                prop_assert!(
                    !tree.is_ancestor_of(*earlier, *later).expect("own handles"),
                    "'{}' depends on '{}' but comes first",
                    tree.data(*earlier).expect("member").id(),
                    tree.data(*later).expect("member").id()
                );
            }
        }
    }
}

// =============================================================================
// Property Tests: Excludes
// =============================================================================

proptest! {
    /// Contract: apply_excludes followed by remove_excludes keeps exactly the nodes
    /// no ancestor rule reaches, independent of the walk order used to mark them.
    #[test]
    fn exclude_pruning_matches_top_down_walk(
        shape in tree_strategy(25),
        excludes in proptest::collection::vec(proptest::option::of(0..=MAX_RANK), 25),
    ) {
        let mut tree = build_tree(&shape);
        attach_excludes(&mut tree, &excludes);
        let expected = surviving_nodes(&tree);

        tree.apply_excludes().remove_excludes();
        let actual: HashSet<NodeId> = tree.bf_nodes().into_iter().collect();

        prop_assert_eq!(actual, expected);
    }
}
