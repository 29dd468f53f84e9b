//! Conversion of declared dependency entries into artifact references.

use crate::manifest::decode_excludes;
use cubx_dependency_tree::{ArtifactIdentity, ArtifactReference};
use serde_json::Value;
use tracing::error;

/// Build references from the `dependencies` entries of an artifact, or from a root
/// dependency list when `referrer` is `None`.
///
/// An entry needs a string `artifactId` and, when present, an object `manifest`.
/// Entries violating this are logged and skipped.
#[must_use]
pub fn create_references(
    entries: &[Value],
    referrer: Option<&ArtifactIdentity>,
) -> Vec<ArtifactReference> {
    entries
        .iter()
        .filter_map(|entry| create_reference(entry, referrer))
        .collect()
}

fn create_reference(entry: &Value, referrer: Option<&ArtifactIdentity>) -> Option<ArtifactReference> {
    let Some(artifact_id) = entry.get("artifactId").and_then(Value::as_str) else {
        error!(
            %entry,
            "Expected dependency to be an object containing at least string property 'artifactId'"
        );
        return None;
    };

    let manifest = match entry.get("manifest") {
        None | Some(Value::Null) => None,
        Some(manifest @ Value::Object(_)) => Some(manifest.clone()),
        Some(_) => {
            error!(%entry, "Expected 'manifest' of dependency to be an object");
            return None;
        }
    };

    let mut reference = ArtifactReference::new(
        determine_webpackage_id(entry, referrer),
        artifact_id,
        referrer.cloned(),
    );
    if let Some(manifest) = manifest {
        reference = reference.with_manifest(manifest);
    }
    if let Some(excludes) = entry.get("dependencyExcludes") {
        reference.add_excludes(&decode_excludes(excludes));
    }
    Some(reference)
}

/// Webpackage of a dependency entry.
///
/// A dependency without its own `webpackageId` lives in the webpackage of its
/// referrer. Root entries without one cannot be placed and yield `""`.
#[must_use]
pub fn determine_webpackage_id(entry: &Value, referrer: Option<&ArtifactIdentity>) -> String {
    if let Some(webpackage_id) = entry.get("webpackageId").and_then(Value::as_str) {
        return webpackage_id.to_string();
    }
    if let Some(referrer) = referrer {
        return referrer.webpackage_id.clone();
    }
    error!(%entry, "Could not determine webpackageId for dependency");
    String::new()
}
