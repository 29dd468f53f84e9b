//! Error types for dependency tree operations.

use crate::NodeId;
use miette::Diagnostic;
use thiserror::Error;

/// Result type for dependency tree operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while manipulating a [`DependencyTree`](crate::DependencyTree).
#[derive(Error, Debug, Clone, PartialEq, Eq, Diagnostic)]
pub enum Error {
    /// A parameter had the wrong shape, e.g. a node handle issued by another tree.
    #[error("Invalid argument: {message}")]
    #[diagnostic(
        code(cubx::tree::invalid_argument),
        help("Node handles are only valid for the tree that created them")
    )]
    InvalidArgument {
        /// Description of what is invalid.
        message: String,
    },

    /// The operation requires a node that is reachable from the tree's root nodes.
    #[error("Node {node} is not a member of this dependency tree")]
    #[diagnostic(
        code(cubx::tree::not_a_member),
        help("The node was removed or never inserted; insert it before using it as a subtree root")
    )]
    NotAMember {
        /// The detached node.
        node: NodeId,
    },
}

impl Error {
    /// Create an invalid argument error.
    #[must_use]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }
}
