//! Chart descriptors and user-declared rewrite rules

use std::hash::{Hash, Hasher};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Source repository coordinates for a chart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepoRef {
    pub name: String,
    pub url: String,
}

impl RepoRef {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }

    /// OCI repositories are addressed by reference, not index file.
    pub fn is_oci(&self) -> bool {
        self.url.starts_with("oci://")
    }
}

/// A rule operand holding an image reference prefix.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefPrefix {
    #[serde(rename = "ref")]
    pub reference: String,
}

/// Rewrites an image reference whose canonical string starts with `from`,
/// or replaces a chart value at `from_value_path` before extraction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModifyRule {
    #[serde(default)]
    pub from: String,
    #[serde(default)]
    pub from_value_path: String,
    pub to: String,
}

/// Per-chart rewrite rules, applied after discovery.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageRules {
    #[serde(default)]
    pub exclude: Vec<RefPrefix>,
    #[serde(default)]
    pub exclude_from_patch: Vec<RefPrefix>,
    #[serde(default)]
    pub modify: Vec<ModifyRule>,
}

impl ImageRules {
    pub fn is_empty(&self) -> bool {
        self.exclude.is_empty() && self.exclude_from_patch.is_empty() && self.modify.is_empty()
    }
}

/// Rewrites the registry segment of matching images, leaving
/// repository/tag/digest untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MirrorRule {
    pub registry: String,
    pub mirror: String,
}

/// A packaged deployment bundle to discover images in.
///
/// The version field holds the user's constraint (exact, `*`-wildcard or
/// semver range) until the resolver pins it to a concrete version in place.
/// `parent` is set only on a discovered sub-chart; the relationship is
/// always a tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chart {
    pub name: String,
    pub version: String,
    pub repo: RepoRef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values_file_path: Option<PathBuf>,
    #[serde(skip)]
    pub parent: Option<Box<Chart>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<ImageRules>,
}

impl PartialEq for Chart {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.version == other.version && self.repo.url == other.repo.url
    }
}

impl Eq for Chart {}

impl Hash for Chart {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.version.hash(state);
        self.repo.url.hash(state);
    }
}

impl Chart {
    pub fn new(name: impl Into<String>, version: impl Into<String>, repo: RepoRef) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            repo,
            values_file_path: None,
            parent: None,
            images: None,
        }
    }

    /// Synthetic owner for standalone image entries, so the discovery
    /// result always keys purely on charts.
    pub fn placeholder() -> Self {
        Self::new("images", "0.0.0", RepoRef::new("images", ""))
    }

    /// Stable key joining chart and image companion documents.
    pub fn release_key(&self) -> String {
        let base = self.repo.url.trim_end_matches('/');
        if base.is_empty() {
            format!("{}/{}", self.name, self.version)
        } else {
            format!("{}/{}/{}", base, self.name, self.version)
        }
    }
}

/// The user-supplied set of charts for one discovery run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChartCollection {
    #[serde(default)]
    pub charts: Vec<Chart>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chart(name: &str, version: &str, url: &str) -> Chart {
        Chart::new(name, version, RepoRef::new("repo", url))
    }

    #[test]
    fn test_chart_identity_is_name_version_url() {
        let a = chart("nginx", "1.0.0", "https://example.com");
        let b = chart("nginx", "1.0.0", "https://example.com");
        assert_eq!(a, b);

        let c = chart("nginx", "1.0.1", "https://example.com");
        assert_ne!(a, c);
    }

    #[test]
    fn test_release_key() {
        let c = chart("nginx", "15.0.0", "https://charts.example.com/");
        assert_eq!(c.release_key(), "https://charts.example.com/nginx/15.0.0");

        assert_eq!(Chart::placeholder().release_key(), "images/0.0.0");
    }

    #[test]
    fn test_chart_deserialization() {
        let yaml = r#"
name: prometheus
version: "25.x"
repo:
  name: prometheus-community
  url: https://prometheus-community.github.io/helm-charts
valuesFilePath: custom/values.yaml
images:
  exclude:
    - ref: docker.io/library/busybox
  excludeFromPatch:
    - ref: quay.io/prometheus
  modify:
    - from: docker.io
      to: mirror.corp.io
"#;
        let c: Chart = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(c.name, "prometheus");
        assert_eq!(c.version, "25.x");
        assert!(c.values_file_path.is_some());

        let rules = c.images.unwrap();
        assert_eq!(rules.exclude[0].reference, "docker.io/library/busybox");
        assert_eq!(rules.exclude_from_patch[0].reference, "quay.io/prometheus");
        assert_eq!(rules.modify[0].to, "mirror.corp.io");
    }

    #[test]
    fn test_repo_ref_is_oci() {
        assert!(RepoRef::new("r", "oci://ghcr.io/org/charts").is_oci());
        assert!(!RepoRef::new("r", "https://charts.example.com").is_oci());
    }
}
