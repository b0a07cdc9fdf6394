//! Chart materialization
//!
//! `ChartLoader` is the seam between version resolution and values
//! extraction: given a `Chart`, it produces the chart's metadata, its
//! merged values tree and its declared dependencies. `IndexLoader` is the
//! local-directory implementation; network loaders live outside this crate.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use charthawk_core::{Chart, Values};

use crate::error::{RepoError, Result};
use crate::index::RepositoryIndex;

/// Chart metadata as declared in its manifest
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartMeta {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub app_version: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub dependencies: Vec<DependencyEdge>,
}

/// Dependency declared by a chart manifest.
///
/// `repository == ""` marks an embedded dependency and a `file://`
/// repository a local one; both are reported but never materialized.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DependencyEdge {
    pub name: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub repository: String,
    #[serde(default)]
    pub condition: Option<String>,
    #[serde(default)]
    pub alias: Option<String>,
}

impl DependencyEdge {
    /// True when this edge points at a repository that can be fetched
    pub fn is_remote(&self) -> bool {
        !self.repository.is_empty() && !self.repository.starts_with("file://")
    }

    /// Name the sub-chart is addressed by (alias wins over name)
    pub fn effective_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

/// Materialization boundary for charts
#[async_trait]
pub trait ChartLoader: Send + Sync {
    /// Directory holding the chart's unpacked contents
    async fn locate(&self, chart: &Chart) -> Result<PathBuf>;

    /// Chart manifest metadata
    async fn metadata(&self, chart: &Chart) -> Result<ChartMeta>;

    /// Default values merged with the chart's custom values file, when one
    /// is configured. Custom values replace defaults on conflict.
    async fn merged_values(&self, chart: &Chart) -> Result<Values>;

    /// Declared dependency edges
    async fn dependencies(&self, chart: &Chart) -> Result<Vec<DependencyEdge>>;

    /// Published versions of the chart, latest first
    async fn published_versions(&self, chart: &Chart) -> Result<Vec<String>>;
}

/// Loader over a local directory tree of unpacked charts and index files.
///
/// Layout under the root:
/// - `<repo-name>-index.yaml` with the repository index
/// - `<repo-name>/<chart-name>-<version>/Chart.yaml`
/// - `<repo-name>/<chart-name>-<version>/values.yaml`
///
/// Locating the same chart and version twice yields the same path, so
/// repeated runs are idempotent.
pub struct IndexLoader {
    root: PathBuf,
}

impl IndexLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn chart_dir(&self, chart: &Chart) -> PathBuf {
        self.root
            .join(&chart.repo.name)
            .join(format!("{}-{}", chart.name, chart.version))
    }

    fn index_path(&self, chart: &Chart) -> PathBuf {
        self.root.join(format!("{}-index.yaml", chart.repo.name))
    }

    fn read_values(path: &Path) -> Result<Values> {
        if !path.exists() {
            return Ok(Values::new());
        }
        Values::from_file(path).map_err(|e| RepoError::MaterializeFailed {
            name: path.display().to_string(),
            message: e.to_string(),
        })
    }
}

#[async_trait]
impl ChartLoader for IndexLoader {
    async fn locate(&self, chart: &Chart) -> Result<PathBuf> {
        let dir = self.chart_dir(chart);
        if !dir.is_dir() {
            return Err(RepoError::ChartNotFound {
                name: format!("{}-{}", chart.name, chart.version),
                repo: chart.repo.name.clone(),
            });
        }
        Ok(dir)
    }

    async fn metadata(&self, chart: &Chart) -> Result<ChartMeta> {
        let manifest = self.locate(chart).await?.join("Chart.yaml");
        let content = std::fs::read_to_string(&manifest)?;
        serde_yaml::from_str(&content).map_err(|e| RepoError::MaterializeFailed {
            name: chart.name.clone(),
            message: format!("invalid Chart.yaml: {}", e),
        })
    }

    async fn merged_values(&self, chart: &Chart) -> Result<Values> {
        let dir = self.locate(chart).await?;
        let mut values = Self::read_values(&dir.join("values.yaml"))?;

        if let Some(custom) = &chart.values_file_path {
            let overrides = Self::read_values(custom)?;
            values.merge(&overrides);
        }

        Ok(values)
    }

    async fn dependencies(&self, chart: &Chart) -> Result<Vec<DependencyEdge>> {
        Ok(self.metadata(chart).await?.dependencies)
    }

    async fn published_versions(&self, chart: &Chart) -> Result<Vec<String>> {
        let index = RepositoryIndex::from_file(self.index_path(chart))?;
        let versions = index.versions(&chart.name);
        if versions.is_empty() {
            return Err(RepoError::NoVersionsAvailable {
                name: chart.name.clone(),
            });
        }
        Ok(versions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use charthawk_core::RepoRef;
    use tempfile::TempDir;

    fn write_chart(root: &Path, repo: &str, name: &str, version: &str, values: &str) {
        let dir = root.join(repo).join(format!("{}-{}", name, version));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join("Chart.yaml"),
            format!(
                "apiVersion: v2\nname: {name}\nversion: \"{version}\"\nappVersion: \"1.25.0\"\ndependencies:\n  - name: common\n    version: 2.x\n    repository: https://charts.example.com\n    condition: common.enabled\n  - name: embedded\n    version: 1.0.0\n"
            ),
        )
        .unwrap();
        std::fs::write(dir.join("values.yaml"), values).unwrap();
    }

    fn setup() -> (TempDir, Chart) {
        let tmp = TempDir::new().unwrap();
        write_chart(
            tmp.path(),
            "stable",
            "nginx",
            "15.0.0",
            "image:\n  repository: nginx\n  tag: \"1.25.0\"\nreplicas: 1\n",
        );
        std::fs::write(
            tmp.path().join("stable-index.yaml"),
            "entries:\n  nginx:\n    - name: nginx\n      version: \"14.0.0\"\n    - name: nginx\n      version: \"15.0.0\"\n",
        )
        .unwrap();

        let chart = Chart::new(
            "nginx",
            "15.0.0",
            RepoRef::new("stable", "https://charts.example.com"),
        );
        (tmp, chart)
    }

    #[tokio::test]
    async fn test_locate_and_metadata() {
        let (tmp, chart) = setup();
        let loader = IndexLoader::new(tmp.path());

        let dir = loader.locate(&chart).await.unwrap();
        assert!(dir.ends_with("stable/nginx-15.0.0"));

        let meta = loader.metadata(&chart).await.unwrap();
        assert_eq!(meta.name, "nginx");
        assert_eq!(meta.app_version, Some("1.25.0".to_string()));
        assert_eq!(meta.dependencies.len(), 2);
    }

    #[tokio::test]
    async fn test_locate_missing_chart() {
        let (tmp, mut chart) = setup();
        chart.version = "99.0.0".to_string();
        let loader = IndexLoader::new(tmp.path());
        let err = loader.locate(&chart).await.unwrap_err();
        assert!(matches!(err, RepoError::ChartNotFound { .. }));
    }

    #[tokio::test]
    async fn test_merged_values_custom_file_wins() {
        let (tmp, mut chart) = setup();
        let custom = tmp.path().join("custom.yaml");
        std::fs::write(&custom, "image:\n  tag: \"1.24.0\"\n").unwrap();
        chart.values_file_path = Some(custom);

        let loader = IndexLoader::new(tmp.path());
        let values = loader.merged_values(&chart).await.unwrap();
        assert_eq!(
            values.get("image.tag").and_then(|v| v.as_str()),
            Some("1.24.0")
        );
        // Untouched defaults survive the merge
        assert_eq!(
            values.get("image.repository").and_then(|v| v.as_str()),
            Some("nginx")
        );
    }

    #[tokio::test]
    async fn test_dependency_edge_classification() {
        let (tmp, chart) = setup();
        let loader = IndexLoader::new(tmp.path());
        let deps = loader.dependencies(&chart).await.unwrap();

        assert!(deps[0].is_remote());
        assert_eq!(deps[0].condition, Some("common.enabled".to_string()));
        assert!(!deps[1].is_remote());
    }

    #[tokio::test]
    async fn test_published_versions_descending() {
        let (tmp, chart) = setup();
        let loader = IndexLoader::new(tmp.path());
        let versions = loader.published_versions(&chart).await.unwrap();
        assert_eq!(versions, vec!["15.0.0", "14.0.0"]);
    }
}
