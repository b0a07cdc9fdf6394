//! Configuration file loading
//!
//! The config file is a single YAML document with camelCase keys:
//!
//! ```yaml
//! k8sVersion: "1.30.2"
//! chartsDir: ./charts
//! charts:
//!   - name: nginx
//!     version: ">=15.0.0 <16.0.0"
//!     repo:
//!       name: stable
//!       url: https://charts.example.com
//! images:
//!   - docker.io/library/busybox:1.36
//! mirrors:
//!   - registry: docker.io
//!     mirror: mirror.corp.io
//! parser:
//!   useCustomValues: false
//!   failOnMissingImages: false
//! ```

use serde::Deserialize;
use std::path::{Path, PathBuf};

use charthawk_core::{Chart, ChartCollection, ImageReference, MirrorRule};
use charthawk_discover::DiscoverOptions;

use crate::error::{CliError, Result};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Tag fallback for `kubectl` images with no tag in values
    #[serde(default)]
    pub k8s_version: String,

    /// Verbose logging (same effect as --debug)
    #[serde(default)]
    pub verbose: bool,

    /// Root of the local chart and index cache
    #[serde(default = "default_charts_dir")]
    pub charts_dir: PathBuf,

    /// Charts to discover images in
    #[serde(default)]
    pub charts: Vec<Chart>,

    /// Standalone image references with no owning chart
    #[serde(default)]
    pub images: Vec<String>,

    /// Global registry mirror rules
    #[serde(default)]
    pub mirrors: Vec<MirrorRule>,

    /// Pipeline tuning
    #[serde(default)]
    pub parser: ParserSection,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParserSection {
    /// Collect charts only, skip image extraction and probing
    #[serde(default)]
    pub disable_image_detection: bool,

    /// Merge per-chart custom values files over chart defaults
    #[serde(default)]
    pub use_custom_values: bool,

    /// Treat an unavailable image as a fatal error
    #[serde(default)]
    pub fail_on_missing_images: bool,

    /// Upper bound on concurrent registry probes
    #[serde(default = "default_probe_concurrency")]
    pub probe_concurrency: usize,
}

fn default_charts_dir() -> PathBuf {
    PathBuf::from("./charts")
}

fn default_probe_concurrency() -> usize {
    32
}

impl Default for ParserSection {
    fn default() -> Self {
        Self {
            disable_image_detection: false,
            use_custom_values: false,
            fail_on_missing_images: false,
            probe_concurrency: default_probe_concurrency(),
        }
    }
}

impl Config {
    /// Load and parse a config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            CliError::config_with_help(
                format!("cannot read {}: {}", path.display(), e),
                "pass the config file with --config <file>",
            )
        })?;
        serde_yaml::from_str(&content)
            .map_err(|e| CliError::config(format!("invalid config {}: {}", path.display(), e)))
    }

    /// Chart collection declared in the config
    pub fn collection(&self) -> ChartCollection {
        ChartCollection {
            charts: self.charts.clone(),
        }
    }

    /// Parse the standalone image list
    pub fn standalone_images(&self) -> Result<Vec<ImageReference>> {
        self.images
            .iter()
            .map(|s| {
                ImageReference::parse(s)
                    .map_err(|e| CliError::config(format!("invalid image '{}': {}", s, e)))
            })
            .collect()
    }

    /// Discovery options derived from the config plus CLI flags
    pub fn discover_options(&self, update: bool) -> DiscoverOptions {
        DiscoverOptions {
            identify_images: !self.parser.disable_image_detection,
            use_custom_values: self.parser.use_custom_values,
            fail_on_missing: self.parser.fail_on_missing_images,
            k8s_version: self.k8s_version.clone(),
            update_to_latest: update,
            probe_concurrency: self.parser.probe_concurrency,
        }
    }
}
