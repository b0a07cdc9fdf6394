//! Rewrite-rule application
//!
//! Single pass over a discovery result, applied after validation.
//! Order per image: excludes, exclude-from-patch, modify, mirror.

use indexmap::IndexMap;

use charthawk_core::{Chart, ImageReference, MirrorRule};

use crate::pipeline::ChartData;

/// Apply each chart's own rules plus the global mirror rules in place.
pub fn apply_rules(data: &mut ChartData, mirrors: &[MirrorRule]) {
    let charts: Vec<Chart> = data.keys().cloned().collect();

    for chart in charts {
        let Some(images) = data.get_mut(&chart) else {
            continue;
        };
        let rules = chart.images.clone().unwrap_or_default();

        let mut rewritten: IndexMap<ImageReference, Vec<String>> =
            IndexMap::with_capacity(images.len());

        for (image, provenance) in images.drain(..) {
            let mut image = image;
            let canonical = image.normalized().to_string();

            if rules
                .exclude
                .iter()
                .any(|p| canonical.starts_with(&p.reference))
            {
                tracing::info!(chart = %chart.name, image = %canonical, "excluded by rule");
                continue;
            }

            if rules
                .exclude_from_patch
                .iter()
                .any(|p| canonical.starts_with(&p.reference))
            {
                image.set_patch(Some(false));
            }

            for rule in &rules.modify {
                if rule.from.is_empty() {
                    continue;
                }
                if let Some(rest) = image.normalized().strip_prefix(&rule.from) {
                    let replacement = format!("{}{}", rule.to, rest);
                    match ImageReference::parse(&replacement) {
                        Ok(mut modified) => {
                            // The canonical form omits an unpinned digest, so
                            // carry it over rather than losing it in the
                            // string round-trip.
                            if modified.digest().is_empty() && !image.digest().is_empty() {
                                modified.set_digest(image.digest().to_string());
                            }
                            modified.set_use_digest(image.use_digest());
                            modified.set_patch(image.patch());
                            tracing::debug!(
                                from = %image.normalized(),
                                to = %modified.normalized(),
                                "modify rule applied"
                            );
                            image = modified;
                        }
                        Err(e) => {
                            tracing::warn!(
                                reference = %replacement,
                                error = %e,
                                "modify rule produced an unparsable reference, keeping original"
                            );
                        }
                    }
                }
            }

            for mirror in mirrors {
                if image.registry() == mirror.registry {
                    image.set_registry(mirror.mirror.clone());
                }
            }

            rewritten
                .entry(image)
                .or_default()
                .extend(provenance);
        }

        *images = rewritten;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use charthawk_core::{ImageRules, RefPrefix, RepoRef};

    fn chart_with_rules(rules: ImageRules) -> Chart {
        let mut chart = Chart::new(
            "nginx",
            "15.0.0",
            RepoRef::new("stable", "https://charts.example.com"),
        );
        chart.images = Some(rules);
        chart
    }

    fn image(s: &str) -> ImageReference {
        ImageReference::parse(s).unwrap()
    }

    fn data_with(chart: Chart, images: &[&str]) -> ChartData {
        let mut map = IndexMap::new();
        for s in images {
            map.insert(image(s), vec![format!("image.{}", s)]);
        }
        let mut data = ChartData::new();
        data.insert(chart, map);
        data
    }

    #[test]
    fn test_exclude_removes_entry() {
        let chart = chart_with_rules(ImageRules {
            exclude: vec![RefPrefix {
                reference: "docker.io/library/busybox".to_string(),
            }],
            ..Default::default()
        });
        let mut data = data_with(
            chart.clone(),
            &["docker.io/library/busybox:1.36", "docker.io/library/nginx:1.25"],
        );

        apply_rules(&mut data, &[]);

        let images = &data[&chart];
        assert_eq!(images.len(), 1);
        assert!(images.contains_key(&image("docker.io/library/nginx:1.25")));
    }

    #[test]
    fn test_exclude_from_patch_sets_override() {
        let chart = chart_with_rules(ImageRules {
            exclude_from_patch: vec![RefPrefix {
                reference: "docker.io/library/nginx".to_string(),
            }],
            ..Default::default()
        });
        let mut data = data_with(chart.clone(), &["docker.io/library/nginx:1.25"]);

        apply_rules(&mut data, &[]);

        let (img, _) = data[&chart].first().unwrap();
        assert_eq!(img.patch(), Some(false));
    }

    #[test]
    fn test_modify_rewrites_prefix_and_keeps_provenance() {
        let chart = chart_with_rules(ImageRules {
            modify: vec![charthawk_core::ModifyRule {
                from: "docker.io/library".to_string(),
                from_value_path: String::new(),
                to: "registry.corp.io/mirrored".to_string(),
            }],
            ..Default::default()
        });
        let mut data = data_with(chart.clone(), &["docker.io/library/nginx:1.25"]);

        apply_rules(&mut data, &[]);

        let (img, paths) = data[&chart].first().unwrap();
        assert_eq!(img.normalized(), "registry.corp.io/mirrored/nginx:1.25");
        assert_eq!(paths.len(), 1);
    }

    #[test]
    fn test_modify_keeps_unpinned_digest() {
        let chart = chart_with_rules(ImageRules {
            modify: vec![charthawk_core::ModifyRule {
                from: "docker.io/library".to_string(),
                from_value_path: String::new(),
                to: "registry.corp.io/mirrored".to_string(),
            }],
            ..Default::default()
        });
        // A digest recorded without a digest pin is absent from the
        // canonical form but must survive the rewrite.
        let mut img = image("docker.io/library/nginx:1.25");
        img.set_digest("sha256:abc123");
        let mut map = IndexMap::new();
        map.insert(img, vec!["image.nginx".to_string()]);
        let mut data = ChartData::new();
        data.insert(chart.clone(), map);

        apply_rules(&mut data, &[]);

        let (img, _) = data[&chart].first().unwrap();
        assert_eq!(img.normalized(), "registry.corp.io/mirrored/nginx:1.25");
        assert_eq!(img.digest(), "sha256:abc123");
        assert!(!img.use_digest());
    }

    #[test]
    fn test_mirror_rewrites_registry_only() {
        let chart = chart_with_rules(ImageRules::default());
        let mut data = data_with(chart.clone(), &["docker.io/library/nginx:1.21"]);

        apply_rules(
            &mut data,
            &[MirrorRule {
                registry: "docker.io".to_string(),
                mirror: "mirror.corp.io".to_string(),
            }],
        );

        let (img, _) = data[&chart].first().unwrap();
        assert_eq!(img.normalized(), "mirror.corp.io/library/nginx:1.21");
        assert_eq!(img.repository(), "library/nginx");
        assert_eq!(img.tag(), "1.21");
    }

    #[test]
    fn test_mirror_ignores_other_registries() {
        let chart = chart_with_rules(ImageRules::default());
        let mut data = data_with(chart.clone(), &["quay.io/acme/tool:1.0"]);

        apply_rules(
            &mut data,
            &[MirrorRule {
                registry: "docker.io".to_string(),
                mirror: "mirror.corp.io".to_string(),
            }],
        );

        let (img, _) = data[&chart].first().unwrap();
        assert_eq!(img.normalized(), "quay.io/acme/tool:1.0");
    }
}
