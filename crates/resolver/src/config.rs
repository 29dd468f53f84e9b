//! Resolver configuration.

use crate::manifest::MANIFEST_FILE_NAME;
use crate::resource::RuntimeMode;
use cubx_dependency_tree::{DependencyExclude, TreeConfig};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default per-fetch timeout in seconds.
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;

/// Settings of a [`DependencyResolver`](crate::DependencyResolver).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResolverConfig {
    /// Mode used when a resource list is requested without an explicit mode.
    pub runtime_mode: RuntimeMode,
    /// Resolve version conflicts while removing duplicates.
    pub automatic_conflict_resolution: bool,
    /// Upper bound for a single manifest fetch.
    pub fetch_timeout_secs: u64,
    /// File name of a manifest below the webpackage url.
    pub manifest_file_name: String,
    /// Rules appended to the excludes of every root node.
    pub global_excludes: Vec<DependencyExclude>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            runtime_mode: RuntimeMode::default(),
            automatic_conflict_resolution: false,
            fetch_timeout_secs: DEFAULT_FETCH_TIMEOUT_SECS,
            manifest_file_name: MANIFEST_FILE_NAME.to_string(),
            global_excludes: Vec::new(),
        }
    }
}

impl ResolverConfig {
    /// Set the default runtime mode.
    #[must_use]
    pub const fn with_runtime_mode(mut self, mode: RuntimeMode) -> Self {
        self.runtime_mode = mode;
        self
    }

    /// Enable or disable automatic conflict resolution.
    #[must_use]
    pub const fn with_automatic_conflict_resolution(mut self, enabled: bool) -> Self {
        self.automatic_conflict_resolution = enabled;
        self
    }

    /// Set the per-fetch timeout.
    #[must_use]
    pub const fn with_fetch_timeout_secs(mut self, secs: u64) -> Self {
        self.fetch_timeout_secs = secs;
        self
    }

    /// Set the rules appended to every root node.
    #[must_use]
    pub fn with_global_excludes(mut self, excludes: Vec<DependencyExclude>) -> Self {
        self.global_excludes = excludes;
        self
    }

    /// Per-fetch timeout.
    #[must_use]
    pub const fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    /// Configuration for trees built by the resolver.
    #[must_use]
    pub const fn tree_config(&self) -> TreeConfig {
        TreeConfig {
            automatic_conflict_resolution: self.automatic_conflict_resolution,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let config = ResolverConfig::default();
        assert_eq!(config.runtime_mode, RuntimeMode::Prod);
        assert!(!config.automatic_conflict_resolution);
        assert_eq!(config.fetch_timeout(), Duration::from_secs(30));
        assert_eq!(config.manifest_file_name, "manifest.webpackage");
        assert!(config.global_excludes.is_empty());
    }

    #[test]
    fn test_deserialize_partial() {
        let config: ResolverConfig = serde_json::from_value(json!({
            "runtimeMode": "dev",
            "automaticConflictResolution": true,
            "globalExcludes": [{"webpackageId": "x@1", "artifactId": "y"}]
        }))
        .unwrap();
        assert_eq!(config.runtime_mode, RuntimeMode::Dev);
        assert!(config.tree_config().automatic_conflict_resolution);
        assert_eq!(config.fetch_timeout_secs, DEFAULT_FETCH_TIMEOUT_SECS);
        assert_eq!(config.global_excludes, vec![DependencyExclude::new("x@1", "y")]);
    }
}
