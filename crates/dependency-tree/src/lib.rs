//! Dependency tree for webpackage artifacts.
//!
//! This crate holds the tree built from manifest-declared artifact dependencies and
//! the algorithms run over it before a resource list can be emitted: exclusion
//! marking and pruning, duplicate collapsing with version conflict resolution, and
//! flattening into a dependency-respecting order.
//!
//! # Key Types
//!
//! - [`DependencyTree`]: arena owning every node plus the cross-edges left behind by
//!   merged duplicates
//! - [`NodeId`]: handle to a node, only valid for the tree that issued it
//! - [`ArtifactReference`]: the payload of each node
//!
//! # Example
//!
//! ```
//! use cubx_dependency_tree::{ArtifactReference, DependencyTree};
//!
//! let mut tree = DependencyTree::new();
//! let app = tree.create_node(ArtifactReference::new("app@1.0.0", "main", None));
//! tree.insert_node(app, None, None)?;
//! let util = tree.create_node(ArtifactReference::new("util@1.0.0", "util", None));
//! tree.insert_node(util, Some(app), None)?;
//!
//! let order = tree.dependency_order();
//! assert_eq!(order, vec![util, app]);
//! # Ok::<(), cubx_dependency_tree::Error>(())
//! ```

mod dedupe;
mod error;
mod excludes;
mod json;
mod links;
mod reference;
mod relationship;
mod traversal;
mod tree;

pub use dedupe::{ConflictGroup, ConflictRecord, ConflictType};
pub use error::{Error, Result};
pub use json::{NodeJson, TreeJson};
pub use reference::{
    ArtifactIdentity, ArtifactReference, DependencyExclude, ENDPOINT_SEPARATOR, Referrer,
    ResourceItem,
};
pub use relationship::NodeRelationship;
pub use tree::{DependencyTree, Node, NodeId, TreeConfig};
