//! Artifact references: the edges of a dependency declaration.
//!
//! An [`ArtifactReference`] names one artifact inside one webpackage, records who
//! referred to it and carries the exclusion rules that apply beneath it.

use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use std::fmt;

/// Separator between an artifact id and a connection endpoint (`util#main`).
pub const ENDPOINT_SEPARATOR: char = '#';

/// The `{webpackageId, artifactId}` pair identifying an artifact.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactIdentity {
    /// Identifier of the webpackage, usually `name@version`.
    pub webpackage_id: String,
    /// Identifier of the artifact inside the webpackage.
    pub artifact_id: String,
}

impl ArtifactIdentity {
    /// Create a new identity pair.
    #[must_use]
    pub fn new(webpackage_id: impl Into<String>, artifact_id: impl Into<String>) -> Self {
        Self {
            webpackage_id: webpackage_id.into(),
            artifact_id: artifact_id.into(),
        }
    }
}

impl fmt::Display for ArtifactIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.webpackage_id, self.artifact_id)
    }
}

/// Who declared a dependency.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Referrer {
    /// Declared in the root dependency list. Serialized as the string `"root"`.
    Root,
    /// Declared by another artifact.
    Artifact(ArtifactIdentity),
}

impl From<Option<ArtifactIdentity>> for Referrer {
    fn from(referrer: Option<ArtifactIdentity>) -> Self {
        referrer.map_or(Self::Root, Self::Artifact)
    }
}

impl Serialize for Referrer {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Root => serializer.serialize_str("root"),
            Self::Artifact(identity) => identity.serialize(serializer),
        }
    }
}

/// A resource entry of an artifact: a plain path or a per-runtime-mode pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResourceItem {
    /// The same file is used in every runtime mode.
    Path(String),
    /// Distinct files for production and development.
    Variants {
        /// File used in production mode.
        prod: String,
        /// File used in development mode.
        dev: String,
    },
}

impl From<&str> for ResourceItem {
    fn from(path: &str) -> Self {
        Self::Path(path.to_string())
    }
}

/// A rule pruning an artifact from the subtree beneath the node declaring it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyExclude {
    /// Webpackage of the excluded artifact.
    pub webpackage_id: String,
    /// The excluded artifact.
    pub artifact_id: String,
    /// Optional connection endpoint the rule is restricted to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint_id: Option<String>,
}

impl DependencyExclude {
    /// Create a rule excluding a whole artifact.
    #[must_use]
    pub fn new(webpackage_id: impl Into<String>, artifact_id: impl Into<String>) -> Self {
        Self {
            webpackage_id: webpackage_id.into(),
            artifact_id: artifact_id.into(),
            endpoint_id: None,
        }
    }

    /// Restrict the rule to one endpoint.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint_id: impl Into<String>) -> Self {
        self.endpoint_id = Some(endpoint_id.into());
        self
    }

    /// Whether this rule prunes the given reference.
    ///
    /// An artifact id carrying an `#endpoint` suffix matches a rule on its base id,
    /// unless the rule names a different endpoint.
    #[must_use]
    pub fn matches(&self, reference: &ArtifactReference) -> bool {
        if self.webpackage_id != reference.webpackage_id {
            return false;
        }
        if self.artifact_id == reference.artifact_id {
            return true;
        }
        match (reference.artifact_id.split_once(ENDPOINT_SEPARATOR), &self.endpoint_id) {
            (Some((base, _)), None) => base == self.artifact_id,
            (Some((base, endpoint)), Some(wanted)) => base == self.artifact_id && endpoint == wanted,
            (None, _) => false,
        }
    }
}

/// One dependency edge: an artifact of a webpackage, as referred to by its referrers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactReference {
    /// Identifier of the webpackage containing the artifact.
    pub webpackage_id: String,
    /// Identifier of the artifact, possibly carrying an `#endpoint` suffix.
    pub artifact_id: String,
    /// Every parent this dependency was reached from. Never empty.
    pub referrer: Vec<Referrer>,
    /// Resources of the artifact, filled in once its manifest was resolved.
    pub resources: Vec<ResourceItem>,
    /// Exclusion rules applying to the subtree beneath this reference.
    pub dependency_excludes: Vec<DependencyExclude>,
    /// Inline manifest used instead of fetching one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manifest: Option<Value>,
}

impl ArtifactReference {
    /// Create a reference. A missing referrer marks a root dependency.
    #[must_use]
    pub fn new(
        webpackage_id: impl Into<String>,
        artifact_id: impl Into<String>,
        referrer: Option<ArtifactIdentity>,
    ) -> Self {
        Self {
            webpackage_id: webpackage_id.into(),
            artifact_id: artifact_id.into(),
            referrer: vec![Referrer::from(referrer)],
            resources: Vec::new(),
            dependency_excludes: Vec::new(),
            manifest: None,
        }
    }

    /// Attach an inline manifest.
    #[must_use]
    pub fn with_manifest(mut self, manifest: Value) -> Self {
        self.manifest = Some(manifest);
        self
    }

    /// Attach exclusion rules.
    #[must_use]
    pub fn with_excludes(mut self, excludes: Vec<DependencyExclude>) -> Self {
        self.dependency_excludes = excludes;
        self
    }

    /// Attach resources.
    #[must_use]
    pub fn with_resources(mut self, resources: Vec<ResourceItem>) -> Self {
        self.resources = resources;
        self
    }

    /// `webpackageId/artifactId`.
    #[must_use]
    pub fn id(&self) -> String {
        format!("{}/{}", self.webpackage_id, self.artifact_id)
    }

    /// The identity pair of this reference.
    #[must_use]
    pub fn identity(&self) -> ArtifactIdentity {
        ArtifactIdentity::new(&self.webpackage_id, &self.artifact_id)
    }

    /// Artifact id without any `#endpoint` suffix.
    #[must_use]
    pub fn artifact_base_id(&self) -> &str {
        self.artifact_id
            .split_once(ENDPOINT_SEPARATOR)
            .map_or(self.artifact_id.as_str(), |(base, _)| base)
    }

    /// `webpackageId + artifactId` as one string, the key [`equals`](Self::equals)
    /// compares.
    #[must_use]
    pub fn concatenated_id(&self) -> String {
        format!("{}{}", self.webpackage_id, self.artifact_id)
    }

    /// Whether both references name the same artifact.
    ///
    /// Compares `webpackageId + artifactId` as one concatenated string, so pairs like
    /// `("ab", "c")` and `("a", "bc")` are considered equal.
    #[must_use]
    pub fn equals(&self, other: &Self) -> bool {
        self.webpackage_id.len() + self.artifact_id.len()
            == other.webpackage_id.len() + other.artifact_id.len()
            && self
                .webpackage_id
                .chars()
                .chain(self.artifact_id.chars())
                .eq(other.webpackage_id.chars().chain(other.artifact_id.chars()))
    }

    /// Whether this reference names the given identity pair, using the same
    /// concatenated comparison as [`equals`](Self::equals).
    #[must_use]
    pub fn is(&self, webpackage_id: &str, artifact_id: &str) -> bool {
        self.webpackage_id.len() + self.artifact_id.len()
            == webpackage_id.len() + artifact_id.len()
            && self
                .webpackage_id
                .chars()
                .chain(self.artifact_id.chars())
                .eq(webpackage_id.chars().chain(artifact_id.chars()))
    }

    /// Append exclusion rules, skipping rules that are already present.
    pub fn add_excludes<'a>(&mut self, excludes: impl IntoIterator<Item = &'a DependencyExclude>) {
        for exclude in excludes {
            if !self.dependency_excludes.contains(exclude) {
                self.dependency_excludes.push(exclude.clone());
            }
        }
    }

    /// Append referrers, skipping referrers that are already present.
    pub fn add_referrers<'a>(&mut self, referrers: impl IntoIterator<Item = &'a Referrer>) {
        for referrer in referrers {
            if !self.referrer.contains(referrer) {
                self.referrer.push(referrer.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_referrer_becomes_root() {
        let reference = ArtifactReference::new("package1@1.0.0", "util1", None);
        assert_eq!(reference.referrer, vec![Referrer::Root]);
    }

    #[test]
    fn test_referrer_is_kept() {
        let parent = ArtifactIdentity::new("package1@1.0.0", "util1");
        let reference = ArtifactReference::new("package3@1.0.0", "util3", Some(parent.clone()));
        assert_eq!(reference.referrer, vec![Referrer::Artifact(parent)]);
    }

    #[test]
    fn test_id_format() {
        let reference = ArtifactReference::new("package1@1.0.0", "util1", None);
        assert_eq!(reference.id(), "package1@1.0.0/util1");
    }

    #[test]
    fn test_equals_uses_concatenated_identity() {
        let a = ArtifactReference::new("pkgA", "artifactA", None);
        let b = ArtifactReference::new("pkgA", "artifactA", None);
        let c = ArtifactReference::new("pkgB", "artifactB", None);
        assert!(a.equals(&b));
        assert!(!a.equals(&c));

        // Overlapping pairs collide
        let left = ArtifactReference::new("ab", "c", None);
        let right = ArtifactReference::new("a", "bc", None);
        assert!(left.equals(&right));
        assert!(left.is("a", "bc"));
    }

    #[test]
    fn test_artifact_base_id_strips_endpoint() {
        let reference = ArtifactReference::new("package3@1.0.0", "util#main", None);
        assert_eq!(reference.artifact_base_id(), "util");
        let plain = ArtifactReference::new("package3@1.0.0", "util", None);
        assert_eq!(plain.artifact_base_id(), "util");
    }

    #[test]
    fn test_exclude_matching() {
        let reference = ArtifactReference::new("exclude@2", "util2#main", None);
        assert!(DependencyExclude::new("exclude@2", "util2").matches(&reference));
        assert!(
            DependencyExclude::new("exclude@2", "util2")
                .with_endpoint("main")
                .matches(&reference)
        );
        assert!(
            !DependencyExclude::new("exclude@2", "util2")
                .with_endpoint("other")
                .matches(&reference)
        );
        assert!(!DependencyExclude::new("exclude@1", "util2").matches(&reference));
    }

    #[test]
    fn test_add_excludes_skips_existing_rules() {
        let mut reference = ArtifactReference::new("package1@1.0.0", "util1", None)
            .with_excludes(vec![DependencyExclude::new("a@1", "x")]);
        let more = [DependencyExclude::new("a@1", "x"), DependencyExclude::new("b@1", "y")];
        reference.add_excludes(&more);
        assert_eq!(
            reference.dependency_excludes,
            vec![DependencyExclude::new("a@1", "x"), DependencyExclude::new("b@1", "y")]
        );
    }

    #[test]
    fn test_resource_item_deserialization() {
        let items: Vec<ResourceItem> =
            serde_json::from_value(json!(["a.js", {"prod": "a.min.js", "dev": "a.js"}])).unwrap();
        assert_eq!(items[0], ResourceItem::Path("a.js".to_string()));
        assert_eq!(
            items[1],
            ResourceItem::Variants {
                prod: "a.min.js".to_string(),
                dev: "a.js".to_string()
            }
        );
    }

    #[test]
    fn test_referrer_serialization() {
        let root = serde_json::to_value(Referrer::Root).unwrap();
        assert_eq!(root, json!("root"));
        let artifact =
            serde_json::to_value(Referrer::Artifact(ArtifactIdentity::new("p@1", "a"))).unwrap();
        assert_eq!(artifact, json!({"webpackageId": "p@1", "artifactId": "a"}));
    }
}
