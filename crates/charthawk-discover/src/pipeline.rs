//! Discovery pipeline
//!
//! Orchestrates a run over a chart collection:
//! version resolution, values materialization, image extraction,
//! one-level dependency expansion, concurrent registry validation and
//! rewrite-rule application. The run is fail-fast: the first fatal error
//! in any stage cancels the remaining work and no partial result is
//! returned.

use std::collections::{HashMap, HashSet};

use futures::future::try_join_all;
use futures::stream::{self, StreamExt, TryStreamExt};
use indexmap::IndexMap;

use charthawk_core::{condition_met, Chart, ChartCollection, ImageReference, MirrorRule, RepoRef, Values};
use charthawk_repo::loader::ChartMeta;
use charthawk_repo::{probe_image, resolver, ChartLoader, RegistryProber};

use crate::error::{DiscoverError, Result};
use crate::extract::extract;
use crate::rules::apply_rules;

/// Images discovered for one chart, keyed by value identity, with the
/// ordered provenance paths that contributed each reference.
pub type ImageMap = IndexMap<ImageReference, Vec<String>>;

/// The full discovery result: every input chart (and each enabled
/// sub-chart) is keyed, even when it yielded zero images.
pub type ChartData = IndexMap<Chart, ImageMap>;

/// Token in a modify rule's `to` that expands to the chart's pinned version
const VERSION_TOKEN: &str = "{.version}";

/// Tuning knobs for a discovery run
#[derive(Debug, Clone)]
pub struct DiscoverOptions {
    /// Extract and validate images; when false only charts are collected
    pub identify_images: bool,
    /// Merge each chart's custom values file over its defaults
    pub use_custom_values: bool,
    /// Treat an unavailable image as fatal instead of dropping it
    pub fail_on_missing: bool,
    /// Tag fallback for images named `kubectl`
    pub k8s_version: String,
    /// Pin every chart to its latest published version, ignoring constraints
    pub update_to_latest: bool,
    /// Upper bound on concurrent registry probes
    pub probe_concurrency: usize,
}

impl Default for DiscoverOptions {
    fn default() -> Self {
        Self {
            identify_images: true,
            use_custom_values: false,
            fail_on_missing: false,
            k8s_version: String::new(),
            update_to_latest: false,
            probe_concurrency: 32,
        }
    }
}

/// A configured discovery run
pub struct Discovery<L, P> {
    loader: L,
    prober: P,
    mirrors: Vec<MirrorRule>,
    standalone_images: Vec<ImageReference>,
    options: DiscoverOptions,
}

impl<L: ChartLoader, P: RegistryProber> Discovery<L, P> {
    pub fn new(loader: L, prober: P) -> Self {
        Self {
            loader,
            prober,
            mirrors: Vec::new(),
            standalone_images: Vec::new(),
            options: DiscoverOptions::default(),
        }
    }

    pub fn with_options(mut self, options: DiscoverOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_mirrors(mut self, mirrors: Vec<MirrorRule>) -> Self {
        self.mirrors = mirrors;
        self
    }

    /// Images supplied directly in configuration, without an owning chart.
    /// They are validated and rewritten under a synthetic placeholder chart.
    pub fn with_standalone_images(mut self, images: Vec<ImageReference>) -> Self {
        self.standalone_images = images;
        self
    }

    /// Run discovery over a chart collection.
    pub async fn run(&self, collection: &ChartCollection) -> Result<ChartData> {
        let walks = collection
            .charts
            .iter()
            .map(|chart| self.walk_chart(chart.clone()));
        let walked = try_join_all(walks).await?;

        let mut data = ChartData::new();
        for group in walked {
            for (chart, images) in group {
                let entry = data.entry(chart).or_default();
                for (image, provenance) in images {
                    entry.entry(image).or_default().extend(provenance);
                }
            }
        }

        if !self.standalone_images.is_empty() {
            let entry = data.entry(Chart::placeholder()).or_default();
            for image in &self.standalone_images {
                entry.entry(image.clone()).or_default();
            }
        }

        if self.options.identify_images {
            self.validate_images(&mut data).await?;
        }

        apply_rules(&mut data, &self.mirrors);

        Ok(data)
    }

    /// Resolve, materialize and extract one chart plus its enabled
    /// remote dependencies. Dependency edges of a sub-chart are never
    /// walked further: expansion is exactly one level deep.
    async fn walk_chart(&self, mut chart: Chart) -> Result<Vec<(Chart, ImageMap)>> {
        if !self.options.use_custom_values {
            chart.values_file_path = None;
        }
        self.resolve_version(&mut chart).await?;

        let meta = self.loader.metadata(&chart).await?;
        let values = self.prepared_values(&chart).await?;
        let images = self.extract_images(&values, &meta)?;

        let mut out = vec![(chart.clone(), images)];

        for edge in self.loader.dependencies(&chart).await? {
            // A missing condition behaves like an empty one: not enabled.
            let enabled = edge
                .condition
                .as_deref()
                .map(|c| condition_met(c, &values))
                .unwrap_or(false);

            if !edge.is_remote() {
                tracing::info!(
                    chart = %chart.name,
                    dependency = %edge.effective_name(),
                    enabled,
                    "embedded or local dependency, not materialized"
                );
                continue;
            }
            if !enabled {
                tracing::debug!(
                    chart = %chart.name,
                    dependency = %edge.effective_name(),
                    "dependency disabled by condition"
                );
                continue;
            }

            let mut sub = Chart::new(
                edge.name.clone(),
                edge.version.clone(),
                RepoRef::new(edge.name.clone(), edge.repository.clone()),
            );
            sub.parent = Some(Box::new(chart.clone()));

            self.resolve_version(&mut sub).await?;
            let sub_meta = self.loader.metadata(&sub).await?;
            let sub_values = self.prepared_values(&sub).await?;
            let sub_images = self.extract_images(&sub_values, &sub_meta)?;
            out.push((sub, sub_images));
        }

        Ok(out)
    }

    /// Pin the chart's version in place. An exact pin passes through
    /// without consulting the repository.
    async fn resolve_version(&self, chart: &mut Chart) -> Result<()> {
        if self.options.update_to_latest {
            let published = self.loader.published_versions(chart).await?;
            chart.version = resolver::latest_candidates(&chart.name, &published)?;
        } else if !resolver::is_exact(&chart.version) {
            let published = self.loader.published_versions(chart).await?;
            chart.version =
                resolver::resolve_candidates(&chart.name, &published, &chart.version)?;
        }
        tracing::debug!(chart = %chart.name, version = %chart.version, "version pinned");
        Ok(())
    }

    /// Merged values with the chart's value-path modify rules applied
    /// before extraction sees the tree.
    async fn prepared_values(&self, chart: &Chart) -> Result<Values> {
        let mut values = self.loader.merged_values(chart).await?;

        if let Some(rules) = &chart.images {
            for rule in &rules.modify {
                if rule.from_value_path.is_empty() {
                    continue;
                }
                let replacement = rule.to.replace(VERSION_TOKEN, &chart.version);
                values
                    .replace_string(&rule.from_value_path, &replacement)
                    .map_err(|e| DiscoverError::ValueReplace {
                        path: rule.from_value_path.clone(),
                        message: e.to_string(),
                    })?;
            }
        }

        Ok(values)
    }

    /// Extract candidates from a prepared values tree and fill in empty
    /// tags: `kubectl` falls back to the configured Kubernetes version,
    /// everything else to the owning chart's application version.
    fn extract_images(&self, values: &Values, meta: &ChartMeta) -> Result<ImageMap> {
        if !self.options.identify_images {
            return Ok(ImageMap::new());
        }

        let mut images = ImageMap::new();
        for (mut image, provenance) in extract(values, None, false) {
            if image.tag().is_empty() && image.digest().is_empty() {
                let fallback = if image.name() == "kubectl" {
                    self.options.k8s_version.clone()
                } else {
                    meta.app_version.clone().unwrap_or_default()
                };
                if fallback.is_empty() {
                    tracing::warn!(
                        image = %image.normalized(),
                        "no tag in values and no fallback version available"
                    );
                } else {
                    image.set_tag(fallback);
                }
            }
            images.entry(image).or_default().extend(provenance);
        }
        Ok(images)
    }

    /// Probe every distinct candidate once, concurrently and fail-fast.
    /// Unavailable images are dropped (or fatal under `fail_on_missing`);
    /// a prober tag correction rewrites the reference everywhere it occurs.
    async fn validate_images(&self, data: &mut ChartData) -> Result<()> {
        let mut distinct: Vec<ImageReference> = Vec::new();
        let mut seen = HashSet::new();
        for images in data.values() {
            for image in images.keys() {
                if seen.insert(image.clone()) {
                    distinct.push(image.clone());
                }
            }
        }

        let outcomes: Vec<(ImageReference, Option<ImageReference>)> =
            stream::iter(distinct.into_iter().map(|image| {
                let prober = &self.prober;
                async move {
                    let found = probe_image(prober, &image).await?;
                    Ok::<_, DiscoverError>((image, found))
                }
            }))
            .buffer_unordered(self.options.probe_concurrency.max(1))
            .try_collect()
            .await?;

        let outcome_map: HashMap<ImageReference, Option<ImageReference>> =
            outcomes.into_iter().collect();

        for images in data.values_mut() {
            let mut kept = ImageMap::with_capacity(images.len());
            for (image, provenance) in images.drain(..) {
                match outcome_map.get(&image) {
                    Some(Some(found)) => {
                        kept.entry(found.clone()).or_default().extend(provenance);
                    }
                    _ => {
                        if self.options.fail_on_missing {
                            return Err(DiscoverError::MissingImage {
                                reference: image.normalized().to_string(),
                            });
                        }
                        tracing::warn!(
                            image = %image.normalized(),
                            "image not available in its registry, dropped from result"
                        );
                    }
                }
            }
            *images = kept;
        }

        Ok(())
    }
}
