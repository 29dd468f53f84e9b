//! Manifest document access.
//!
//! A manifest lists its artifacts grouped by artifact type:
//!
//! ```json
//! {
//!   "artifacts": {
//!     "utilities": [
//!       { "artifactId": "util1", "resources": ["js/util1.js"], "dependencies": [] }
//!     ]
//!   }
//! }
//! ```

use cubx_dependency_tree::{DependencyExclude, ResourceItem};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::warn;

/// Default file name of a manifest below a webpackage's base url.
pub const MANIFEST_FILE_NAME: &str = "manifest.webpackage";

/// The parts of an artifact entry the resolver consumes.
///
/// Dependency entries are kept as raw JSON so a malformed entry can be skipped
/// without rejecting the whole artifact. Malformed resource items are dropped with
/// a warning.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestArtifact {
    /// Identifier of the artifact.
    pub artifact_id: String,
    /// Resource items in declaration order.
    #[serde(default, deserialize_with = "lenient_resources")]
    pub resources: Vec<ResourceItem>,
    /// Declared dependencies.
    #[serde(default)]
    pub dependencies: Vec<Value>,
}

impl ManifestArtifact {
    /// Decode an artifact entry.
    pub fn from_value(entry: &Value) -> serde_json::Result<Self> {
        Self::deserialize(entry)
    }
}

/// Decode a `dependencyExcludes` list rule by rule, skipping malformed rules.
#[must_use]
pub fn decode_excludes(value: &Value) -> Vec<DependencyExclude> {
    decode_list(value, "dependencyExcludes")
}

fn lenient_resources<'de, D>(deserializer: D) -> Result<Vec<ResourceItem>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(decode_list(&value, "resources"))
}

fn decode_list<T: DeserializeOwned>(value: &Value, field: &str) -> Vec<T> {
    let items = match value {
        Value::Array(items) => items,
        Value::Null => return Vec::new(),
        other => {
            warn!(field, value = %other, "Ignoring list field that is not an array");
            return Vec::new();
        }
    };
    items
        .iter()
        .filter_map(|item| match T::deserialize(item) {
            Ok(decoded) => Some(decoded),
            Err(e) => {
                warn!(field, %item, error = %e, "Skipping malformed item");
                None
            }
        })
        .collect()
}

/// Find the entry of `artifact_id`, searching every artifact type of the manifest.
#[must_use]
pub fn find_artifact<'a>(manifest: &'a Value, artifact_id: &str) -> Option<&'a Value> {
    manifest
        .get("artifacts")?
        .as_object()?
        .values()
        .filter_map(Value::as_array)
        .flatten()
        .find(|artifact| artifact.get("artifactId").and_then(Value::as_str) == Some(artifact_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn manifest() -> Value {
        json!({
            "name": "package1",
            "artifacts": {
                "apps": [{"artifactId": "app1"}],
                "utilities": [{
                    "artifactId": "util1",
                    "resources": ["js/pack1.js", {"prod": "a.min.css", "dev": "a.css"}],
                    "dependencies": [{"webpackageId": "package3@1.0.0", "artifactId": "util3"}],
                    "dependencyExcludes": [{"webpackageId": "x@1", "artifactId": "y"}]
                }]
            }
        })
    }

    #[test]
    fn test_find_artifact_across_types() {
        let manifest = manifest();
        assert_eq!(
            find_artifact(&manifest, "util1").and_then(|a| a.get("artifactId")),
            Some(&json!("util1"))
        );
        assert!(find_artifact(&manifest, "app1").is_some());
        assert!(find_artifact(&manifest, "missing").is_none());
    }

    #[test]
    fn test_find_artifact_in_malformed_manifest() {
        assert!(find_artifact(&json!({}), "util1").is_none());
        assert!(find_artifact(&json!({"artifacts": []}), "util1").is_none());
        assert!(find_artifact(&json!("manifest"), "util1").is_none());
    }

    #[test]
    fn test_decode_artifact() {
        let manifest = manifest();
        let artifact =
            ManifestArtifact::from_value(find_artifact(&manifest, "util1").unwrap()).unwrap();
        assert_eq!(artifact.resources.len(), 2);
        assert_eq!(artifact.dependencies.len(), 1);
    }

    #[test]
    fn test_decode_artifact_defaults() {
        let artifact = ManifestArtifact::from_value(&json!({"artifactId": "app1"})).unwrap();
        assert!(artifact.resources.is_empty());
        assert!(artifact.dependencies.is_empty());
    }

    #[test]
    fn test_malformed_resource_items_are_skipped() {
        let artifact = ManifestArtifact::from_value(&json!({
            "artifactId": "util1",
            "resources": ["a.js", {"prod": "b.min.js"}, 7, {"prod": "c.min.js", "dev": "c.js"}]
        }))
        .unwrap();
        assert_eq!(
            artifact.resources,
            vec![
                ResourceItem::Path("a.js".to_string()),
                ResourceItem::Variants {
                    prod: "c.min.js".to_string(),
                    dev: "c.js".to_string(),
                },
            ]
        );

        let artifact =
            ManifestArtifact::from_value(&json!({"artifactId": "util1", "resources": "a.js"}))
                .unwrap();
        assert!(artifact.resources.is_empty());
    }

    #[test]
    fn test_decode_excludes_skips_malformed_rules() {
        let excludes = decode_excludes(&json!([
            {"webpackageId": "x@1"},
            {"webpackageId": "x@1", "artifactId": "y"},
            "z"
        ]));
        assert_eq!(excludes, vec![DependencyExclude::new("x@1", "y")]);
        assert!(decode_excludes(&json!({"webpackageId": "x@1"})).is_empty());
    }
}
