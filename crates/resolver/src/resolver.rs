//! Dependency resolution pipeline.
//!
//! [`DependencyResolver`] builds the raw tree level by level, fetching the manifests
//! of each level concurrently, then enriches it with declared excludes and reduces
//! it to the resolved tree the output views are derived from.

use crate::cache::ManifestCache;
use crate::config::ResolverConfig;
use crate::fetch::{HttpManifestFetcher, ManifestFetcher};
use crate::manifest::{ManifestArtifact, decode_excludes, find_artifact};
use crate::references::create_references;
use crate::resource::{Resource, RuntimeMode, create_resource, with_trailing_slash};
use crate::{Error, Result};
use cubx_dependency_tree::{
    ArtifactReference, DependencyExclude, DependencyTree, Node, NodeId, ResourceItem,
};
use futures::future::try_join_all;
use indexmap::{IndexMap, IndexSet};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, instrument, warn};

/// What a single reference resolved to.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedReference {
    /// Resources declared by the artifact.
    pub resources: Vec<ResourceItem>,
    /// Direct dependencies of the artifact.
    pub dependencies: Vec<ArtifactReference>,
}

/// Resolves root dependencies into trees, resource lists, webpackage lists and
/// manifest lists.
///
/// A resolver keeps the state of its last run: the root dependencies, the base url,
/// the raw and resolved trees and the resource list. Manifests are cached for the
/// lifetime of the resolver.
pub struct DependencyResolver {
    fetcher: Arc<dyn ManifestFetcher>,
    cache: ManifestCache,
    config: ResolverConfig,
    base_url: String,
    root_dependencies: Vec<ArtifactReference>,
    raw_tree: Option<DependencyTree>,
    resolved_tree: Option<DependencyTree>,
    resource_list: Vec<Resource>,
}

impl fmt::Debug for DependencyResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DependencyResolver")
            .field("config", &self.config)
            .field("base_url", &self.base_url)
            .field("cached_manifests", &self.cache.len())
            .finish_non_exhaustive()
    }
}

impl DependencyResolver {
    /// Create a resolver fetching manifests over HTTP.
    pub fn new(config: ResolverConfig) -> Result<Self> {
        Ok(Self::with_fetcher(config, Arc::new(HttpManifestFetcher::new()?)))
    }

    /// Create a resolver using the given transport.
    #[must_use]
    pub fn with_fetcher(config: ResolverConfig, fetcher: Arc<dyn ManifestFetcher>) -> Self {
        Self {
            fetcher,
            cache: ManifestCache::new(),
            config,
            base_url: String::new(),
            root_dependencies: Vec::new(),
            raw_tree: None,
            resolved_tree: None,
            resource_list: Vec::new(),
        }
    }

    /// Current configuration.
    #[must_use]
    pub const fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Manifest cache shared by every lookup of this resolver.
    #[must_use]
    pub const fn cache(&self) -> &ManifestCache {
        &self.cache
    }

    /// Base url of the last run.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Set the base url resource paths are prefixed with.
    pub fn set_base_url(&mut self, base_url: impl Into<String>) {
        self.base_url = base_url.into();
    }

    /// Root dependencies of the last run.
    #[must_use]
    pub fn root_dependencies(&self) -> &[ArtifactReference] {
        &self.root_dependencies
    }

    /// Replace the root dependencies used to look up root-level excludes.
    pub fn set_root_dependencies(&mut self, root_dependencies: &Value) -> Result<()> {
        self.root_dependencies = parse_root_dependencies(root_dependencies)?;
        Ok(())
    }

    /// Copy of the tree as built from the manifests, before any reduction.
    #[must_use]
    pub const fn raw_tree(&self) -> Option<&DependencyTree> {
        self.raw_tree.as_ref()
    }

    /// Tree after excludes and duplicates were removed.
    #[must_use]
    pub const fn resolved_tree(&self) -> Option<&DependencyTree> {
        self.resolved_tree.as_ref()
    }

    /// Resource list of the last [`resolve_resources_list`](Self::resolve_resources_list) run.
    #[must_use]
    pub fn resource_list(&self) -> &[Resource] {
        &self.resource_list
    }

    /// Url of the manifest of `webpackage_id` below `base_url`.
    #[must_use]
    pub fn manifest_url(&self, base_url: &str, webpackage_id: &str) -> String {
        format!(
            "{}{webpackage_id}/{}",
            with_trailing_slash(base_url),
            self.config.manifest_file_name
        )
    }

    /// Build the tree of all transitive dependencies of `root_dependencies`.
    ///
    /// Every level is resolved concurrently and inserted once the whole level
    /// succeeded. The first failing reference fails the build.
    #[instrument(skip(self, root_dependencies))]
    pub async fn build_raw_dependency_tree(
        &self,
        root_dependencies: &Value,
        base_url: &str,
    ) -> Result<DependencyTree> {
        let roots = parse_root_dependencies(root_dependencies)?;
        self.build_tree(&roots, base_url).await
    }

    async fn build_tree(
        &self,
        roots: &[ArtifactReference],
        base_url: &str,
    ) -> Result<DependencyTree> {
        let mut tree = DependencyTree::with_config(self.config.tree_config());
        let mut frontier = Vec::with_capacity(roots.len());
        for reference in roots {
            let node = tree.create_node(reference.clone());
            tree.insert_node(node, None, None)?;
            frontier.push((node, reference.clone()));
        }

        while !frontier.is_empty() {
            let results = try_join_all(
                frontier
                    .iter()
                    .map(|(_, reference)| self.resolve_reference_dependencies(reference, base_url)),
            )
            .await
            .inspect_err(|e| error!(error = %e, "Could not resolve dependency"))?;

            let mut next = Vec::new();
            for ((parent, _), resolved) in frontier.iter().zip(results) {
                if let Some(data) = tree.data_mut(*parent) {
                    data.resources = resolved.resources;
                }
                for child in resolved.dependencies {
                    let cyclic = closes_cycle(&tree, *parent, &child);
                    let node = tree.create_node(child.clone());
                    tree.insert_node(node, Some(*parent), None)?;
                    if cyclic {
                        warn!(
                            path = %tree.path_as_string(node)?,
                            "Dependency cycle detected, not expanding"
                        );
                    } else {
                        next.push((node, child));
                    }
                }
            }
            frontier = next;
        }

        debug!(nodes = tree.bf_nodes().len(), "Built raw dependency tree");
        Ok(tree)
    }

    /// Resources and direct dependencies of the artifact named by `reference`.
    #[instrument(skip(self, reference), fields(id = %reference.id()))]
    pub async fn resolve_reference_dependencies(
        &self,
        reference: &ArtifactReference,
        base_url: &str,
    ) -> Result<ResolvedReference> {
        let manifest = self.manifest_for_reference(reference, Some(base_url)).await?;
        let entry = find_artifact(&manifest, &reference.artifact_id).ok_or_else(|| {
            error!(id = %reference.id(), "The artifact is not defined in the manifest");
            Error::ArtifactNotFound {
                webpackage_id: reference.webpackage_id.clone(),
                artifact_id: reference.artifact_id.clone(),
            }
        })?;
        let artifact = ManifestArtifact::from_value(entry)?;
        let dependencies = create_references(&artifact.dependencies, Some(&reference.identity()));
        self.cache.add_item(&artifact.artifact_id, manifest.clone());

        Ok(ResolvedReference {
            resources: artifact.resources,
            dependencies,
        })
    }

    /// Manifest governing `reference`.
    ///
    /// Looked up in the cache by webpackage id first, then taken from the inline
    /// manifest of the reference, and fetched from `base_url` otherwise. Fetched
    /// manifests are cached.
    pub async fn manifest_for_reference(
        &self,
        reference: &ArtifactReference,
        base_url: Option<&str>,
    ) -> Result<Value> {
        if !reference.webpackage_id.is_empty() {
            if let Some(manifest) = self.cache.get(&reference.webpackage_id) {
                return Ok(manifest);
            }
        }
        if let Some(manifest) = &reference.manifest {
            return Ok(manifest.clone());
        }
        let base_url = base_url.ok_or_else(|| {
            Error::invalid_argument(format!(
                "a base url is required to fetch the manifest of '{}'",
                reference.webpackage_id
            ))
        })?;
        let url = self.manifest_url(base_url, &reference.webpackage_id);
        let manifest = self.fetch_manifest(&url).await?;
        self.cache.add_item(&reference.webpackage_id, manifest.clone());
        Ok(manifest)
    }

    async fn fetch_manifest(&self, url: &str) -> Result<Value> {
        let timeout = self.config.fetch_timeout();
        tokio::time::timeout(timeout, self.fetcher.fetch(url))
            .await
            .map_err(|_| Error::transport(url, format!("timed out after {timeout:?}")))?
    }

    /// Attach root-level and manifest-declared excludes to every node of `tree`.
    ///
    /// Root nodes receive the excludes of their root dependency entry and the
    /// configured global excludes first. Every node then receives the excludes its
    /// artifact declares in its manifest.
    #[instrument(skip(self, tree))]
    pub async fn check_tree_for_excludes(
        &self,
        tree: &mut DependencyTree,
        base_url: &str,
    ) -> Result<()> {
        for root in tree.root_nodes().to_vec() {
            self.add_root_excludes(tree, root)?;
        }

        let nodes: Vec<(NodeId, ArtifactReference)> = tree
            .bf_nodes()
            .into_iter()
            .filter_map(|node| tree.data(node).map(|data| (node, data.clone())))
            .collect();
        let manifests = try_join_all(
            nodes
                .iter()
                .map(|(_, reference)| self.manifest_for_reference(reference, Some(base_url))),
        )
        .await?;

        for ((node, _), manifest) in nodes.iter().zip(manifests) {
            if let Some(reference) = tree.data_mut(*node) {
                Self::add_manifest_excludes(reference, &manifest)?;
            }
        }
        Ok(())
    }

    /// Append the excludes declared for `node` in the root dependencies, followed by
    /// the configured global excludes.
    pub fn add_root_excludes(&self, tree: &mut DependencyTree, node: NodeId) -> Result<()> {
        let reference = tree.data_mut(node).ok_or_else(|| {
            Error::invalid_argument(format!("node {node} does not belong to the given tree"))
        })?;
        let declared: Vec<DependencyExclude> = self
            .root_dependencies
            .iter()
            .filter(|root| root.equals(reference))
            .flat_map(|root| root.dependency_excludes.iter().cloned())
            .collect();
        reference.add_excludes(&declared);
        reference.add_excludes(&self.config.global_excludes);
        Ok(())
    }

    /// Append the excludes the artifact of `reference` declares in `manifest`.
    pub fn add_manifest_excludes(reference: &mut ArtifactReference, manifest: &Value) -> Result<()> {
        if !manifest.is_object() {
            return Err(Error::invalid_argument(format!(
                "manifest of '{}' must be an object",
                reference.id()
            )));
        }
        let Some(excludes) = find_artifact(manifest, &reference.artifact_id)
            .and_then(|artifact| artifact.get("dependencyExcludes"))
        else {
            return Ok(());
        };
        reference.add_excludes(&decode_excludes(excludes));
        Ok(())
    }

    /// Build, enrich and reduce the dependency tree of `root_dependencies`.
    ///
    /// The raw tree is kept as [`raw_tree`](Self::raw_tree) and the result as
    /// [`resolved_tree`](Self::resolved_tree).
    #[instrument(skip(self, root_dependencies))]
    pub async fn resolve_dependencies(
        &mut self,
        root_dependencies: &Value,
        base_url: &str,
    ) -> Result<&DependencyTree> {
        match self.run_pipeline(root_dependencies, base_url).await {
            Ok(tree) => Ok(&*self.resolved_tree.insert(tree)),
            Err(e) => {
                error!(error = %e, "Error while building and processing dependency tree");
                Err(e)
            }
        }
    }

    async fn run_pipeline(
        &mut self,
        root_dependencies: &Value,
        base_url: &str,
    ) -> Result<DependencyTree> {
        self.set_root_dependencies(root_dependencies)?;
        self.base_url = base_url.to_string();
        self.raw_tree = None;
        self.resolved_tree = None;

        let mut tree = self.build_tree(&self.root_dependencies, base_url).await?;
        self.raw_tree = Some(tree.clone());
        self.check_tree_for_excludes(&mut tree, base_url).await?;
        tree.apply_excludes().remove_duplicates().remove_excludes();
        Ok(tree)
    }

    /// References of `tree` ordered so every dependency precedes its dependents.
    #[must_use]
    pub fn dependency_list_from_tree(tree: &DependencyTree) -> Vec<ArtifactReference> {
        tree.dependency_order()
            .into_iter()
            .filter_map(|node| tree.data(node).cloned())
            .collect()
    }

    /// Expand the resources of every reference in `list`, keeping list order and
    /// per-artifact declaration order.
    #[must_use]
    pub fn calculate_resource_list(
        &self,
        list: &[ArtifactReference],
        mode: RuntimeMode,
    ) -> Vec<Resource> {
        list.iter()
            .flat_map(|reference| {
                let id = format!("{}/{}", reference.webpackage_id, reference.artifact_base_id());
                reference
                    .resources
                    .iter()
                    .filter_map(|item| {
                        create_resource(&self.base_url, &id, item, mode, &reference.referrer)
                    })
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    /// Resolve `root_dependencies` into the ordered list of resources to load.
    ///
    /// `mode` defaults to the configured runtime mode.
    pub async fn resolve_resources_list(
        &mut self,
        root_dependencies: &Value,
        base_url: &str,
        mode: Option<RuntimeMode>,
    ) -> Result<Vec<Resource>> {
        let mode = mode.unwrap_or(self.config.runtime_mode);
        let list = Self::dependency_list_from_tree(
            self.resolve_dependencies(root_dependencies, base_url).await?,
        );
        self.resource_list = self.calculate_resource_list(&list, mode);
        Ok(self.resource_list.clone())
    }

    /// Resolve `root_dependencies` into the ordered list of distinct webpackage ids.
    pub async fn resolve_wp_list(
        &mut self,
        root_dependencies: &Value,
        base_url: &str,
    ) -> Result<Vec<String>> {
        let list = Self::dependency_list_from_tree(
            self.resolve_dependencies(root_dependencies, base_url).await?,
        );
        let webpackages: IndexSet<String> =
            list.into_iter().map(|reference| reference.webpackage_id).collect();
        Ok(webpackages.into_iter().collect())
    }

    /// Resolve `root_dependencies` into the manifests of the resolved webpackages,
    /// in the order of [`resolve_wp_list`](Self::resolve_wp_list).
    pub async fn resolve_manifests_list(
        &mut self,
        root_dependencies: &Value,
        base_url: &str,
    ) -> Result<Vec<Value>> {
        let list = Self::dependency_list_from_tree(
            self.resolve_dependencies(root_dependencies, base_url).await?,
        );
        let mut manifests: IndexMap<String, Value> = IndexMap::new();
        for reference in list {
            if manifests.contains_key(&reference.webpackage_id) {
                continue;
            }
            match self
                .cache
                .get(&reference.webpackage_id)
                .or(reference.manifest)
            {
                Some(manifest) => {
                    manifests.insert(reference.webpackage_id, manifest);
                }
                None => warn!(
                    webpackage_id = %reference.webpackage_id,
                    "No manifest available for webpackage"
                ),
            }
        }
        Ok(manifests.into_values().collect())
    }
}

/// Parse a root dependency list. The list must be a JSON array.
fn parse_root_dependencies(root_dependencies: &Value) -> Result<Vec<ArtifactReference>> {
    let entries = root_dependencies.as_array().ok_or_else(|| {
        Error::invalid_argument("Parameter 'rootDependencies' needs to be an array")
    })?;
    Ok(create_references(entries, None))
}

/// Whether `child` names `parent` or one of its tree ancestors.
fn closes_cycle(tree: &DependencyTree, parent: NodeId, child: &ArtifactReference) -> bool {
    std::iter::successors(Some(parent), |&node| tree.node(node).and_then(Node::parent))
        .filter_map(|node| tree.data(node))
        .any(|data| data.equals(child))
}
