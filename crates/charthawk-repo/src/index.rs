//! Repository index types
//!
//! Helm-compatible repository index format. The version resolver depends on
//! each entry list being sorted descending by published version, so that
//! contract lives here in `sort_entries` rather than in the resolver.

use chrono::{DateTime, Utc};
use semver::Version;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::error::{RepoError, Result};

/// Repository index (Helm-compatible)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryIndex {
    /// API version
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// When this index was generated
    #[serde(default = "Utc::now")]
    pub generated: DateTime<Utc>,

    /// Charts indexed by name
    #[serde(default)]
    pub entries: HashMap<String, Vec<ChartEntry>>,
}

fn default_api_version() -> String {
    "v1".to_string()
}

impl Default for RepositoryIndex {
    fn default() -> Self {
        Self {
            api_version: default_api_version(),
            generated: Utc::now(),
            entries: HashMap::new(),
        }
    }
}

impl RepositoryIndex {
    /// Parse index from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(|e| RepoError::IndexParseError {
            message: e.to_string(),
        })
    }

    /// Parse index from bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let yaml = std::str::from_utf8(bytes).map_err(|e| RepoError::IndexParseError {
            message: format!("Invalid UTF-8: {}", e),
        })?;
        Self::from_yaml(yaml)
    }

    /// Load and sort an index file from disk
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content =
            std::fs::read_to_string(path.as_ref()).map_err(|_| RepoError::IndexNotFound {
                location: path.as_ref().display().to_string(),
            })?;
        let mut index = Self::from_yaml(&content)?;
        index.sort_entries();
        Ok(index)
    }

    /// Sort every entry list descending by version, latest first.
    ///
    /// Non-semver versions sort after all semver ones. Version resolution
    /// walks candidate lists in this order and takes the first match, so
    /// any other ordering changes which version a range selects.
    pub fn sort_entries(&mut self) {
        for versions in self.entries.values_mut() {
            versions.sort_by(|a, b| {
                let va = Version::parse(a.version.trim_start_matches('v')).ok();
                let vb = Version::parse(b.version.trim_start_matches('v')).ok();
                match (va, vb) {
                    (Some(va), Some(vb)) => vb.cmp(&va),
                    (Some(_), None) => std::cmp::Ordering::Less,
                    (None, Some(_)) => std::cmp::Ordering::Greater,
                    (None, None) => b.version.cmp(&a.version),
                }
            });
        }
    }

    /// Get all entries of a chart
    pub fn get(&self, name: &str) -> Option<&Vec<ChartEntry>> {
        self.entries.get(name)
    }

    /// Get a specific version of a chart
    pub fn get_version(&self, name: &str, version: &str) -> Option<&ChartEntry> {
        self.entries
            .get(name)?
            .iter()
            .find(|e| e.version == version)
    }

    /// Published version strings of a chart in stored (descending) order.
    pub fn versions(&self, name: &str) -> Vec<String> {
        self.entries
            .get(name)
            .map(|entries| entries.iter().map(|e| e.version.clone()).collect())
            .unwrap_or_default()
    }
}

/// Chart entry in the index
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartEntry {
    /// Chart name
    pub name: String,

    /// Chart version (semver)
    pub version: String,

    /// Application version the chart deploys
    #[serde(default)]
    pub app_version: Option<String>,

    /// Description
    #[serde(default)]
    pub description: Option<String>,

    /// URLs to download the chart archive
    #[serde(default)]
    pub urls: Vec<String>,

    /// SHA256 digest of the archive
    #[serde(default)]
    pub digest: Option<String>,

    /// Creation timestamp
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,

    /// Declared chart dependencies
    #[serde(default)]
    pub dependencies: Vec<IndexDependency>,
}

impl ChartEntry {
    /// Get the primary download URL
    pub fn download_url(&self) -> Option<&str> {
        self.urls.first().map(|s| s.as_str())
    }
}

/// Dependency declared by an index entry
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndexDependency {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub repository: Option<String>,
    #[serde(default)]
    pub condition: Option<String>,
    #[serde(default)]
    pub alias: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_index() -> RepositoryIndex {
        let yaml = r#"
apiVersion: v1
generated: "2024-01-01T00:00:00Z"
entries:
  nginx:
    - name: nginx
      version: "14.0.0"
      appVersion: "1.24.0"
      urls:
        - https://example.com/charts/nginx-14.0.0.tgz
    - name: nginx
      version: "15.0.0"
      appVersion: "1.25.0"
      urls:
        - https://example.com/charts/nginx-15.0.0.tgz
      digest: "sha256:abc123"
    - name: nginx
      version: "15.1.0-rc.1"
      appVersion: "1.25.1"
  redis:
    - name: redis
      version: "17.0.0"
      dependencies:
        - name: common
          version: "2.x"
          repository: https://example.com/charts
          condition: common.enabled
"#;
        let mut index = RepositoryIndex::from_yaml(yaml).unwrap();
        index.sort_entries();
        index
    }

    #[test]
    fn test_parse_index() {
        let index = sample_index();
        assert_eq!(index.entries.len(), 2);
        assert!(index.entries.contains_key("nginx"));
        assert!(index.entries.contains_key("redis"));
    }

    #[test]
    fn test_sort_entries_descending() {
        let index = sample_index();
        let versions = index.versions("nginx");
        assert_eq!(versions, vec!["15.1.0-rc.1", "15.0.0", "14.0.0"]);
    }

    #[test]
    fn test_sort_entries_non_semver_last() {
        let yaml = r#"
entries:
  app:
    - name: app
      version: "nightly"
    - name: app
      version: "1.2.0"
    - name: app
      version: "1.10.0"
"#;
        let mut index = RepositoryIndex::from_yaml(yaml).unwrap();
        index.sort_entries();
        assert_eq!(index.versions("app"), vec!["1.10.0", "1.2.0", "nightly"]);
    }

    #[test]
    fn test_get_version() {
        let index = sample_index();
        let v14 = index.get_version("nginx", "14.0.0").unwrap();
        assert_eq!(v14.app_version, Some("1.24.0".to_string()));
        assert!(index.get_version("nginx", "13.0.0").is_none());
    }

    #[test]
    fn test_versions_of_unknown_chart_is_empty() {
        let index = sample_index();
        assert!(index.versions("postgresql").is_empty());
    }

    #[test]
    fn test_dependencies_parsed() {
        let index = sample_index();
        let redis = index.get_version("redis", "17.0.0").unwrap();
        assert_eq!(redis.dependencies.len(), 1);
        assert_eq!(
            redis.dependencies[0].condition,
            Some("common.enabled".to_string())
        );
    }
}
