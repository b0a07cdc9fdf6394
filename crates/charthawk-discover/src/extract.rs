//! Values-tree image extraction
//!
//! Walks a chart's values tree depth-first and assembles one candidate
//! `ImageReference` per map node that carries recognized image-identity
//! keys. Subtrees carrying `enabled: false` are skipped entirely.

use indexmap::IndexMap;
use serde_json::{Map, Value as JsonValue};

use charthawk_core::{ImageReference, Values};

/// Recognized image-identity fragment kinds.
///
/// The set of key names is closed: anything else in a values tree is
/// never treated as part of an image reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fragment {
    Registry,
    Repository,
    /// Alias for [`Fragment::Repository`]
    Image,
    Tag,
    Digest,
    /// Alias for [`Fragment::Digest`]
    Sha,
}

impl Fragment {
    /// Map a values-tree key name onto a fragment kind
    pub fn from_key(key: &str) -> Option<Fragment> {
        match key {
            "registry" => Some(Fragment::Registry),
            "repository" => Some(Fragment::Repository),
            "image" => Some(Fragment::Image),
            "tag" => Some(Fragment::Tag),
            "digest" => Some(Fragment::Digest),
            "sha" => Some(Fragment::Sha),
            _ => None,
        }
    }

    /// Assign the fragment's value onto a candidate reference
    pub fn apply(&self, image: &mut ImageReference, value: &str) {
        match self {
            Fragment::Registry => image.set_registry(value),
            Fragment::Repository | Fragment::Image => image.set_repository(value),
            Fragment::Tag => image.set_tag(value),
            Fragment::Digest | Fragment::Sha => image.set_digest(value),
        }
    }
}

/// Boolean key that pins an image to its digest rather than its tag
const USE_DIGEST_KEY: &str = "useDigest";

/// Key that gates a whole subtree
const ENABLED_KEY: &str = "enabled";

/// Extract all candidate image references from a values tree.
///
/// Returns a deterministic mapping from each candidate to the ordered list
/// of dotted paths that contributed a fragment to it. When `use_overrides`
/// is set and `overrides` holds a sibling value at the same path, the
/// override value wins over the in-tree one.
pub fn extract(
    tree: &Values,
    overrides: Option<&Values>,
    use_overrides: bool,
) -> IndexMap<ImageReference, Vec<String>> {
    let mut result = IndexMap::new();

    if let Some(root) = tree.as_object() {
        let override_root = if use_overrides {
            overrides.and_then(|o| o.as_object())
        } else {
            None
        };
        walk(root, override_root, "", &mut result);
    }

    result
}

fn walk(
    node: &Map<String, JsonValue>,
    overrides: Option<&Map<String, JsonValue>>,
    acc: &str,
    result: &mut IndexMap<ImageReference, Vec<String>>,
) {
    let mut candidate = ImageReference::default();
    let mut provenance: Vec<String> = Vec::new();

    for (key, value) in node {
        let effective = overrides.and_then(|o| o.get(key)).unwrap_or(value);

        match effective {
            JsonValue::String(s) => {
                if let Some(fragment) = Fragment::from_key(key) {
                    fragment.apply(&mut candidate, s);
                    provenance.push(join_path(acc, key));
                }
            }
            JsonValue::Bool(b) => {
                if key == USE_DIGEST_KEY {
                    candidate.set_use_digest(*b);
                }
            }
            JsonValue::Object(child) => {
                let child_overrides = overrides.and_then(|o| o.get(key)).and_then(|v| v.as_object());
                if !subtree_enabled(child, child_overrides) {
                    tracing::debug!(path = %join_path(acc, key), "skipping disabled subtree");
                    continue;
                }
                walk(child, child_overrides, &join_path(acc, key), result);
            }
            _ => {}
        }
    }

    if !provenance.is_empty() && !candidate.is_empty() {
        result.entry(candidate).or_default().extend(provenance);
    }
}

/// A subtree is enabled unless it carries a sibling `enabled` key that is
/// boolean `false` or the string `"false"`. Only literal booleans and the
/// strings `"true"`/`"false"` are recognized.
fn subtree_enabled(
    node: &Map<String, JsonValue>,
    overrides: Option<&Map<String, JsonValue>>,
) -> bool {
    let flag = overrides
        .and_then(|o| o.get(ENABLED_KEY))
        .or_else(|| node.get(ENABLED_KEY));

    match flag {
        Some(JsonValue::Bool(b)) => *b,
        Some(JsonValue::String(s)) => s != "false",
        _ => true,
    }
}

fn join_path(acc: &str, key: &str) -> String {
    if acc.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", acc, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(yaml: &str) -> Values {
        Values::from_yaml(yaml).unwrap()
    }

    #[test]
    fn test_fragment_from_key() {
        assert_eq!(Fragment::from_key("registry"), Some(Fragment::Registry));
        assert_eq!(Fragment::from_key("image"), Some(Fragment::Image));
        assert_eq!(Fragment::from_key("sha"), Some(Fragment::Sha));
        assert_eq!(Fragment::from_key("pullPolicy"), None);
    }

    #[test]
    fn test_extract_single_image() {
        let tree = values(
            r#"
image:
  registry: docker.io
  repository: library/nginx
  tag: "1.21"
"#,
        );
        let found = extract(&tree, None, false);
        assert_eq!(found.len(), 1);

        let (image, paths) = found.first().unwrap();
        assert_eq!(image.normalized(), "docker.io/library/nginx:1.21");
        assert_eq!(
            paths,
            &vec![
                "image.registry".to_string(),
                "image.repository".to_string(),
                "image.tag".to_string()
            ]
        );
    }

    #[test]
    fn test_extract_stable_across_runs() {
        let tree = values(
            r#"
controller:
  image:
    registry: quay.io
    repository: acme/controller
    tag: "2.0"
sidecar:
  image: acme/sidecar
  tag: "1.0"
"#,
        );
        let first = extract(&tree, None, false);
        let second = extract(&tree, None, false);
        let a: Vec<_> = first.iter().collect();
        let b: Vec<_> = second.iter().collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_extract_disabled_subtree_yields_nothing() {
        let tree = values(
            r#"
metrics:
  enabled: false
  image:
    repository: x
    tag: y
"#,
        );
        assert!(extract(&tree, None, false).is_empty());
    }

    #[test]
    fn test_extract_string_false_disables() {
        let tree = values(
            r#"
metrics:
  enabled: "false"
  image:
    repository: x
    tag: y
"#,
        );
        assert!(extract(&tree, None, false).is_empty());
    }

    #[test]
    fn test_extract_enabled_subtree_kept() {
        let tree = values(
            r#"
metrics:
  enabled: true
  image:
    repository: prom/exporter
    tag: "0.5"
"#,
        );
        let found = extract(&tree, None, false);
        assert_eq!(found.len(), 1);
        let (image, _) = found.first().unwrap();
        assert_eq!(image.repository(), "prom/exporter");
    }

    #[test]
    fn test_extract_use_digest_flag() {
        let tree = values(
            r#"
image:
  repository: library/nginx
  tag: "1.21"
  digest: "sha256:abc"
  useDigest: true
"#,
        );
        let found = extract(&tree, None, false);
        let (image, _) = found.first().unwrap();
        assert!(image.use_digest());
        assert_eq!(image.digest(), "sha256:abc");
    }

    #[test]
    fn test_extract_override_wins() {
        let tree = values("image:\n  repository: library/nginx\n  tag: \"1.21\"\n");
        let overrides = values("image:\n  tag: \"1.25\"\n");

        let found = extract(&tree, Some(&overrides), true);
        let (image, _) = found.first().unwrap();
        assert_eq!(image.tag(), "1.25");

        // Overrides ignored when not opted in
        let found = extract(&tree, Some(&overrides), false);
        let (image, _) = found.first().unwrap();
        assert_eq!(image.tag(), "1.21");
    }

    #[test]
    fn test_extract_override_can_disable_subtree() {
        let tree = values("metrics:\n  enabled: true\n  image:\n    repository: x\n    tag: y\n");
        let overrides = values("metrics:\n  enabled: false\n");
        assert!(extract(&tree, Some(&overrides), true).is_empty());
    }

    #[test]
    fn test_extract_unrecognized_keys_produce_nothing() {
        let tree = values("service:\n  type: ClusterIP\n  port: \"80\"\n");
        assert!(extract(&tree, None, false).is_empty());
    }

    #[test]
    fn test_extract_merges_same_reference_from_two_branches() {
        let tree = values(
            r#"
frontend:
  image: acme/web
  tag: "1.0"
canary:
  image: acme/web
  tag: "1.0"
"#,
        );
        let found = extract(&tree, None, false);
        assert_eq!(found.len(), 1);
        let (_, paths) = found.first().unwrap();
        assert_eq!(paths.len(), 4);
    }
}
