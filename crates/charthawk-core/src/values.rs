//! Merged chart configuration with deep merge and dot-path lookup

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::path::Path;

use crate::error::{CoreError, Result};

/// Merged configuration tree for one chart (defaults + overrides).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Values(pub JsonValue);

impl Values {
    /// Create empty values
    pub fn new() -> Self {
        Self(JsonValue::Object(serde_json::Map::new()))
    }

    /// Load values from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    /// Parse values from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let value: JsonValue = serde_yaml::from_str(yaml)?;
        Ok(Self(value))
    }

    /// Deep merge another Values into this one
    ///
    /// Rules:
    /// - Scalars: overlay replaces base
    /// - Objects: recursive merge
    /// - Arrays: overlay replaces base (not appended)
    pub fn merge(&mut self, overlay: &Values) {
        deep_merge(&mut self.0, &overlay.0);
    }

    /// Get a value by dotted path (e.g., "controller.image.tag")
    pub fn get(&self, path: &str) -> Option<&JsonValue> {
        let parts: Vec<&str> = path.split('.').collect();
        get_nested(&self.0, &parts)
    }

    /// Get the inner JSON value
    pub fn inner(&self) -> &JsonValue {
        &self.0
    }

    /// The top-level key/value map, when the tree is an object.
    pub fn as_object(&self) -> Option<&serde_json::Map<String, JsonValue>> {
        self.0.as_object()
    }

    /// Check if values are empty
    pub fn is_empty(&self) -> bool {
        match &self.0 {
            JsonValue::Object(map) => map.is_empty(),
            JsonValue::Null => true,
            _ => false,
        }
    }

    /// Replace an existing string leaf at a dotted path.
    ///
    /// Fails when the path does not terminate in a string, so a rewrite
    /// rule can never silently create new configuration.
    pub fn replace_string(&mut self, path: &str, new: &str) -> Result<()> {
        let parts: Vec<&str> = path.split('.').collect();
        replace_nested(&mut self.0, &parts, new).ok_or_else(|| CoreError::ValuesMerge {
            message: format!("could not replace value at '{}'", path),
        })
    }
}

/// Evaluate a boolean enablement condition against a values tree.
///
/// Walks `tree` one path segment at a time. At the final segment a boolean
/// is returned as-is and a string is true only when it is exactly `"true"`.
/// A missing path or a non-map intermediate segment yields `false`; no
/// error is ever raised.
pub fn condition_met(condition: &str, values: &Values) -> bool {
    if condition.is_empty() {
        return false;
    }

    let mut pos = match values.0.as_object() {
        Some(map) => map,
        None => return false,
    };

    let segments: Vec<&str> = condition.split('.').collect();
    for (i, segment) in segments.iter().enumerate() {
        let last = i == segments.len() - 1;
        match pos.get(*segment) {
            Some(JsonValue::Bool(b)) if last => return *b,
            Some(JsonValue::String(s)) if last => return s == "true",
            Some(JsonValue::Object(map)) if !last => pos = map,
            _ => return false,
        }
    }

    false
}

/// Deep merge two JSON values
fn deep_merge(base: &mut JsonValue, overlay: &JsonValue) {
    match (base, overlay) {
        (JsonValue::Object(base_map), JsonValue::Object(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                match base_map.get_mut(key) {
                    Some(base_value) => deep_merge(base_value, overlay_value),
                    None => {
                        base_map.insert(key.clone(), overlay_value.clone());
                    }
                }
            }
        }
        (base, overlay) => {
            *base = overlay.clone();
        }
    }
}

/// Get a nested value by path
fn get_nested<'a>(value: &'a JsonValue, path: &[&str]) -> Option<&'a JsonValue> {
    if path.is_empty() {
        return Some(value);
    }

    match value {
        JsonValue::Object(map) => map
            .get(path[0])
            .and_then(|v| get_nested(v, &path[1..])),
        _ => None,
    }
}

fn replace_nested(value: &mut JsonValue, path: &[&str], new: &str) -> Option<()> {
    let map = value.as_object_mut()?;
    let entry = map.get_mut(path[0])?;
    if path.len() == 1 {
        match entry {
            JsonValue::String(s) => {
                *s = new.to_string();
                Some(())
            }
            _ => None,
        }
    } else {
        replace_nested(entry, &path[1..], new)
    }
}
