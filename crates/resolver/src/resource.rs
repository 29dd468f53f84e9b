//! Resources emitted for resolved artifacts and their classification.

use crate::{Error, Result};
use cubx_dependency_tree::{Referrer, ResourceItem};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

/// Query suffix overriding the type derived from the file extension.
const TYPE_QUERY: &str = "?type=";

/// Kind of a resource, deciding how it is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResourceType {
    /// `css` files.
    Stylesheet,
    /// `html` and `htm` files.
    HtmlImport,
    /// `js` files.
    Javascript,
}

impl ResourceType {
    /// Every resource type.
    pub const ALL: [Self; 3] = [Self::Stylesheet, Self::HtmlImport, Self::Javascript];

    /// Name used in serialized output.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Stylesheet => "stylesheet",
            Self::HtmlImport => "htmlImport",
            Self::Javascript => "javascript",
        }
    }

    /// File extensions mapped to this type.
    #[must_use]
    pub const fn file_endings(self) -> &'static [&'static str] {
        match self {
            Self::Stylesheet => &["css"],
            Self::HtmlImport => &["html", "htm"],
            Self::Javascript => &["js"],
        }
    }

    /// Type for a file extension.
    #[must_use]
    pub fn from_extension(extension: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.file_endings().contains(&extension))
    }

    /// HTML element loading a resource of this type from `path`.
    #[must_use]
    pub fn html_tag(self, path: &str) -> String {
        match self {
            Self::Stylesheet => format!(r#"<link rel="stylesheet" href="{path}">"#),
            Self::HtmlImport => format!(r#"<link rel="import" href="{path}">"#),
            Self::Javascript => format!(r#"<script src="{path}"></script>"#),
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Chooses between the `prod` and `dev` file of a resource item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeMode {
    /// Production files.
    #[default]
    Prod,
    /// Development files.
    Dev,
}

impl RuntimeMode {
    /// Parse a runtime mode, falling back to [`RuntimeMode::Prod`] with a warning when
    /// the value is not recognized.
    #[must_use]
    pub fn parse_or_default(value: Option<&str>) -> Self {
        match value {
            None => Self::default(),
            Some(value) => value.parse().unwrap_or_else(|_| {
                warn!(
                    mode = value,
                    "Invalid runtime mode, expected 'prod' or 'dev'. Falling back to 'prod'"
                );
                Self::default()
            }),
        }
    }

    /// Pick the file of `item` for this mode.
    #[must_use]
    pub fn select(self, item: &ResourceItem) -> &str {
        match (item, self) {
            (ResourceItem::Path(path), _) => path,
            (ResourceItem::Variants { prod, .. }, Self::Prod) => prod,
            (ResourceItem::Variants { dev, .. }, Self::Dev) => dev,
        }
    }
}

impl FromStr for RuntimeMode {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value {
            "prod" => Ok(Self::Prod),
            "dev" => Ok(Self::Dev),
            other => Err(Error::invalid_argument(format!(
                "unknown runtime mode '{other}'"
            ))),
        }
    }
}

impl fmt::Display for RuntimeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Prod => "prod",
            Self::Dev => "dev",
        })
    }
}

/// A file to load, in dependency order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resource {
    path: String,
    #[serde(rename = "type")]
    resource_type: ResourceType,
    referrer: Vec<Referrer>,
}

impl Resource {
    /// Create a resource. The path must not be empty.
    pub fn new(
        path: impl Into<String>,
        resource_type: ResourceType,
        referrer: Vec<Referrer>,
    ) -> Result<Self> {
        let path = path.into();
        if path.is_empty() {
            return Err(Error::invalid_argument("resource path must not be empty"));
        }
        Ok(Self {
            path,
            resource_type,
            referrer,
        })
    }

    /// Full path of the file.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Kind of the file.
    #[must_use]
    pub const fn resource_type(&self) -> ResourceType {
        self.resource_type
    }

    /// Referrers of the artifact declaring this resource.
    #[must_use]
    pub fn referrer(&self) -> &[Referrer] {
        &self.referrer
    }

    /// HTML element loading this resource.
    #[must_use]
    pub fn html_tag(&self) -> String {
        self.resource_type.html_tag(&self.path)
    }
}

/// Result of classifying a resource file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classified {
    /// File name with any `?type=` suffix removed.
    pub file_name: String,
    /// Detected type, if any.
    pub resource_type: Option<ResourceType>,
}

/// Determine the type of a resource file.
///
/// A trailing `?type=<extension>` wins over the file extension and is stripped from
/// the name. Other query strings are left untouched and yield no type.
#[must_use]
pub fn classify(file: &str) -> Classified {
    if let Some(index) = file.rfind(TYPE_QUERY) {
        let (name, query) = file.split_at(index);
        return Classified {
            file_name: name.to_string(),
            resource_type: ResourceType::from_extension(&query[TYPE_QUERY.len()..]),
        };
    }
    Classified {
        file_name: file.to_string(),
        resource_type: file
            .rsplit_once('.')
            .and_then(|(_, extension)| ResourceType::from_extension(extension)),
    }
}

/// `base_url` with a trailing `/`, unless it is empty.
pub(crate) fn with_trailing_slash(base_url: &str) -> String {
    if base_url.is_empty() || base_url.ends_with('/') {
        base_url.to_string()
    } else {
        format!("{base_url}/")
    }
}

/// Build the resource for one item of an artifact.
///
/// `id` is `webpackageId/artifactId` of the declaring artifact. Items whose type
/// cannot be determined are skipped with a warning.
#[must_use]
pub fn create_resource(
    base_url: &str,
    id: &str,
    item: &ResourceItem,
    mode: RuntimeMode,
    referrer: &[Referrer],
) -> Option<Resource> {
    let Classified {
        file_name,
        resource_type,
    } = classify(mode.select(item));
    let Some(resource_type) = resource_type else {
        warn!(%id, file = %file_name, "Skipping resource of unknown type");
        return None;
    };
    let path = format!("{}{id}/{file_name}", with_trailing_slash(base_url));
    Resource::new(path, resource_type, referrer.to_vec()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const ID: &str = "package1-1.0.0/my-artifact";

    fn variants() -> ResourceItem {
        ResourceItem::Variants {
            prod: "test.min.js".to_string(),
            dev: "test.js".to_string(),
        }
    }

    #[test]
    fn test_classify_by_extension() {
        assert_eq!(classify("test.min.js").resource_type, Some(ResourceType::Javascript));
        assert_eq!(classify("test.min.css").resource_type, Some(ResourceType::Stylesheet));
        assert_eq!(classify("import.html").resource_type, Some(ResourceType::HtmlImport));
        assert_eq!(classify("import.htm").resource_type, Some(ResourceType::HtmlImport));
        assert_eq!(classify("readme.md").resource_type, None);
    }

    #[test]
    fn test_classify_type_query() {
        for (query, expected) in [
            ("js", ResourceType::Javascript),
            ("html", ResourceType::HtmlImport),
            ("css", ResourceType::Stylesheet),
        ] {
            let classified = classify(&format!("blob:http://xxxxxx?type={query}"));
            assert_eq!(classified.file_name, "blob:http://xxxxxx");
            assert_eq!(classified.resource_type, Some(expected));
        }
    }

    #[test]
    fn test_classify_unknown_type_query_strips_name() {
        let classified = classify("blob:http://xxxxxx?type=xxx");
        assert_eq!(classified.file_name, "blob:http://xxxxxx");
        assert_eq!(classified.resource_type, None);
    }

    #[test]
    fn test_classify_without_type() {
        let classified = classify("blob:http://xxxxxx");
        assert_eq!(classified.file_name, "blob:http://xxxxxx");
        assert_eq!(classified.resource_type, None);

        let classified = classify("blob:http://xxxxxx?yyy");
        assert_eq!(classified.file_name, "blob:http://xxxxxx?yyy");
        assert_eq!(classified.resource_type, None);
    }

    #[test]
    fn test_create_resource_from_variants() {
        let resource = create_resource("", ID, &variants(), RuntimeMode::Prod, &[]).unwrap();
        assert_eq!(resource.path(), format!("{ID}/test.min.js"));
        assert_eq!(resource.resource_type(), ResourceType::Javascript);

        let resource = create_resource("", ID, &variants(), RuntimeMode::Dev, &[]).unwrap();
        assert_eq!(resource.path(), format!("{ID}/test.js"));
    }

    #[test]
    fn test_create_resource_from_path() {
        let item = ResourceItem::from("test.css");
        let resource = create_resource("", ID, &item, RuntimeMode::Prod, &[]).unwrap();
        assert_eq!(resource.path(), format!("{ID}/test.css"));
        assert_eq!(resource.resource_type(), ResourceType::Stylesheet);
    }

    #[test]
    fn test_create_resource_prefixes_base_url() {
        let base = "https://cubbles.world/sandbox//";
        let resource = create_resource(base, ID, &variants(), RuntimeMode::Prod, &[]).unwrap();
        assert_eq!(resource.path(), format!("{base}{ID}/test.min.js"));

        let resource = create_resource(
            "https://cubbles.world/sandbox",
            ID,
            &variants(),
            RuntimeMode::Prod,
            &[],
        )
        .unwrap();
        assert_eq!(
            resource.path(),
            format!("https://cubbles.world/sandbox/{ID}/test.min.js")
        );
    }

    #[test]
    fn test_create_resource_skips_unknown_type() {
        let item = ResourceItem::from("notes.txt");
        assert!(create_resource("", ID, &item, RuntimeMode::Prod, &[]).is_none());
    }

    #[test]
    fn test_resource_rejects_empty_path() {
        assert!(Resource::new("", ResourceType::Javascript, vec![]).is_err());
    }

    #[test]
    fn test_resource_serialization() {
        let resource =
            Resource::new("a/b.js", ResourceType::Javascript, vec![Referrer::Root]).unwrap();
        assert_eq!(
            serde_json::to_value(&resource).unwrap(),
            serde_json::json!({"path": "a/b.js", "type": "javascript", "referrer": ["root"]})
        );
    }

    #[test]
    fn test_html_tag() {
        let resource = Resource::new("a/b.css", ResourceType::Stylesheet, vec![]).unwrap();
        assert_eq!(resource.html_tag(), r#"<link rel="stylesheet" href="a/b.css">"#);
    }

    #[test]
    fn test_runtime_mode_parsing() {
        assert_eq!(RuntimeMode::parse_or_default(None), RuntimeMode::Prod);
        assert_eq!(RuntimeMode::parse_or_default(Some("dev")), RuntimeMode::Dev);
        assert_eq!(RuntimeMode::parse_or_default(Some("development")), RuntimeMode::Prod);
        assert!("development".parse::<RuntimeMode>().is_err());
    }
}
