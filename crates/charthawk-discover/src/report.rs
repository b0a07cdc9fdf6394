//! Result serialization
//!
//! A discovery result serializes to two companion views in one document:
//! the chart list and the distinct image list, joined by a `mapping` from
//! each chart's release key to the normalized image strings it owns.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

use charthawk_core::{Chart, ImageReference};

use crate::error::{DiscoverError, Result};
use crate::pipeline::{ChartData, ImageMap};

/// Serializable projection of a discovery result
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Output {
    /// Every chart in the run, sub-charts included
    pub charts: Vec<Chart>,
    /// Distinct normalized image references across all charts
    pub images: Vec<String>,
    /// Release key (`repo-url/name/version`) to owned image strings
    pub mapping: IndexMap<String, Vec<String>>,
}

impl Output {
    /// Project a discovery result into its serializable form.
    pub fn from_data(data: &ChartData) -> Self {
        let mut charts = Vec::with_capacity(data.len());
        let mut images: Vec<String> = Vec::new();
        let mut mapping = IndexMap::with_capacity(data.len());

        for (chart, image_map) in data {
            let owned: Vec<String> = image_map
                .keys()
                .map(|i| i.normalized().to_string())
                .collect();
            for s in &owned {
                if !images.contains(s) {
                    images.push(s.clone());
                }
            }
            mapping.insert(chart.release_key(), owned);
            charts.push(chart.clone());
        }

        Self {
            charts,
            images,
            mapping,
        }
    }

    /// Rebuild a discovery result from its serialized form. Provenance
    /// paths are not serialized, so each image comes back with an empty
    /// provenance list. A mapping key without a chart entry is an error.
    pub fn into_data(self) -> Result<ChartData> {
        let mut data = ChartData::new();

        for (key, image_strings) in self.mapping {
            let chart = self
                .charts
                .iter()
                .find(|c| c.release_key() == key)
                .cloned()
                .ok_or_else(|| {
                    DiscoverError::Serialization(format!(
                        "mapping key '{}' has no matching chart entry",
                        key
                    ))
                })?;

            let mut image_map = ImageMap::with_capacity(image_strings.len());
            for s in &image_strings {
                let image = ImageReference::parse(s)?;
                image_map.entry(image).or_default();
            }
            data.insert(chart, image_map);
        }

        Ok(data)
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Write the result to `<path>.yaml`
    pub fn write_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref().with_extension("yaml");
        let yaml = self.to_yaml()?;
        std::fs::write(&path, yaml).map_err(|e| DiscoverError::Serialization(e.to_string()))
    }

    /// Read a result back from `<path>.yaml`
    pub fn read_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().with_extension("yaml");
        let content =
            std::fs::read_to_string(&path).map_err(|e| DiscoverError::Serialization(e.to_string()))?;
        Self::from_yaml(&content)
    }
}
