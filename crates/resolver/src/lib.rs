//! Webpackage artifact dependency resolution.
//!
//! Given root dependencies and the base url their webpackages are deployed at, the
//! [`DependencyResolver`] fetches manifests, builds the [`DependencyTree`] of all
//! transitive dependencies, applies declared excludes and collapses duplicates.
//! The resolved tree is then projected into the ordered [`Resource`] list to load,
//! the list of webpackage ids, or the list of their manifests.
//!
//! # Example
//!
//! ```no_run
//! use cubx_resolver::{DependencyResolver, ResolverConfig};
//! use serde_json::json;
//!
//! # async fn run() -> cubx_resolver::Result<()> {
//! let mut resolver = DependencyResolver::new(ResolverConfig::default())?;
//! let roots = json!([{ "webpackageId": "package1@1.0.0", "artifactId": "util1" }]);
//! let resources = resolver
//!     .resolve_resources_list(&roots, "https://cubbles.world/sandbox", None)
//!     .await?;
//! for resource in &resources {
//!     println!("{}", resource.html_tag());
//! }
//! # Ok(())
//! # }
//! ```

mod cache;
mod config;
mod error;
mod fetch;
pub mod manifest;
mod references;
pub mod resource;
mod resolver;

pub use cache::ManifestCache;
pub use config::{DEFAULT_FETCH_TIMEOUT_SECS, ResolverConfig};
pub use cubx_dependency_tree::{ArtifactReference, DependencyExclude, DependencyTree};
pub use error::{Error, Result};
pub use fetch::{HttpManifestFetcher, ManifestFetcher};
pub use references::{create_references, determine_webpackage_id};
pub use resolver::{DependencyResolver, ResolvedReference};
pub use resource::{Resource, ResourceType, RuntimeMode};
