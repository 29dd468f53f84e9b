//! Error types for dependency resolution.

use miette::Diagnostic;
use thiserror::Error;

/// Result type for resolver operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while resolving dependencies.
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// A parameter had the wrong shape.
    #[error("Invalid argument: {message}")]
    #[diagnostic(
        code(cubx::resolver::invalid_argument),
        help("Root dependencies must be a JSON array of {{webpackageId, artifactId}} objects")
    )]
    InvalidArgument {
        /// Description of what is invalid.
        message: String,
    },

    /// A manifest was loaded but does not declare the requested artifact.
    #[error("Artifact '{artifact_id}' is not defined in the manifest of '{webpackage_id}'")]
    #[diagnostic(
        code(cubx::resolver::artifact_not_found),
        help("Check the artifactId of the dependency against the artifacts listed in the manifest")
    )]
    ArtifactNotFound {
        /// Webpackage whose manifest was searched.
        webpackage_id: String,
        /// The missing artifact.
        artifact_id: String,
    },

    /// Fetching a manifest failed.
    #[error("Failed to fetch manifest from {url}: {message}")]
    #[diagnostic(
        code(cubx::resolver::transport),
        help("Check the base url and that the webpackage is deployed there")
    )]
    Transport {
        /// The requested url.
        url: String,
        /// What went wrong.
        message: String,
    },

    /// A manifest entry could not be decoded.
    #[error("Invalid manifest content: {source}")]
    #[diagnostic(code(cubx::resolver::json))]
    Json {
        /// The underlying decoding error.
        #[from]
        source: serde_json::Error,
    },

    /// A dependency tree operation failed.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Tree(#[from] cubx_dependency_tree::Error),
}

impl Error {
    /// Create an invalid argument error.
    #[must_use]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create a transport error.
    #[must_use]
    pub fn transport(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transport {
            url: url.into(),
            message: message.into(),
        }
    }
}
