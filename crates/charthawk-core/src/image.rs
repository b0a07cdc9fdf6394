//! Container image reference model
//!
//! Parses, normalizes and re-serializes image identities of the form
//! `[registry/]repository[:tag][@digest]`. Identity for deduplication is
//! always the value tuple (registry, repository, tag, digest), never
//! allocation identity, so the same logical image discovered at different
//! configuration paths collapses to one entry.

use std::fmt;
use std::hash::{Hash, Hasher};

use once_cell::sync::OnceCell;

use crate::error::{CoreError, Result};

/// A normalized container image identity.
#[derive(Debug, Clone, Default)]
pub struct ImageReference {
    registry: String,
    repository: String,
    tag: String,
    digest: String,
    use_digest: bool,
    /// Per-chart patch-eligibility override. `None` means "no opinion".
    patch: Option<bool>,
    /// Cached canonical string, invalidated on mutation.
    normalized: OnceCell<String>,
}

impl PartialEq for ImageReference {
    fn eq(&self, other: &Self) -> bool {
        self.registry == other.registry
            && self.repository == other.repository
            && self.tag == other.tag
            && self.digest == other.digest
    }
}

impl Eq for ImageReference {}

impl Hash for ImageReference {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.registry.hash(state);
        self.repository.hash(state);
        self.tag.hash(state);
        self.digest.hash(state);
    }
}

impl fmt::Display for ImageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.normalized())
    }
}

/// Strips a stray leading/trailing separator from a segment.
fn clean_segment<'a>(s: &'a str, sep: char) -> &'a str {
    s.trim_start_matches(sep).trim_end_matches(sep)
}

/// True when the first path segment of a reference names a registry host.
/// Follows the distribution grammar: a domain contains a dot or a port, or
/// is the literal `localhost`.
fn is_registry_segment(s: &str) -> bool {
    s == "localhost" || s.contains('.') || s.contains(':')
}

fn valid_path(s: &str) -> bool {
    !s.is_empty()
        && s.chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-' | '/'))
}

impl ImageReference {
    /// Create a reference from raw parts. Used by the extractor builder.
    pub fn new(registry: impl Into<String>, repository: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            registry: registry.into(),
            repository: repository.into(),
            tag: tag.into(),
            ..Default::default()
        }
    }

    /// Parse a canonical `[registry/]repository[:tag][@digest]` string.
    pub fn parse(reference: &str) -> Result<Self> {
        let malformed = || CoreError::MalformedReference {
            reference: reference.to_string(),
        };

        let s = reference.trim().trim_start_matches("oci://");
        if s.is_empty() || s.contains(char::is_whitespace) {
            return Err(malformed());
        }

        // Digest comes after '@' and must carry an algorithm prefix.
        let (rest, digest) = match s.rsplit_once('@') {
            Some((r, d)) if d.contains(':') => (r, d),
            Some(_) => return Err(malformed()),
            None => (s, ""),
        };

        // A tag is a ':' past the last path separator, to not confuse it
        // with a registry port.
        let (name, tag) = match rest.rsplit_once(':') {
            Some((n, t)) if !t.contains('/') => (n, t),
            _ => (rest, ""),
        };

        let (registry, repository) = match name.split_once('/') {
            Some((first, remainder)) if is_registry_segment(first) => (first, remainder),
            _ => ("", name),
        };

        if !valid_path(repository) {
            return Err(malformed());
        }

        Ok(Self {
            registry: registry.to_string(),
            repository: repository.to_string(),
            tag: tag.to_string(),
            digest: digest.to_string(),
            use_digest: !digest.is_empty(),
            patch: None,
            normalized: OnceCell::new(),
        })
    }

    pub fn registry(&self) -> &str {
        &self.registry
    }

    pub fn repository(&self) -> &str {
        &self.repository
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn digest(&self) -> &str {
        &self.digest
    }

    pub fn use_digest(&self) -> bool {
        self.use_digest
    }

    pub fn patch(&self) -> Option<bool> {
        self.patch
    }

    pub fn set_registry(&mut self, registry: impl Into<String>) {
        self.registry = registry.into();
        self.normalized.take();
    }

    pub fn set_repository(&mut self, repository: impl Into<String>) {
        self.repository = repository.into();
        self.normalized.take();
    }

    pub fn set_tag(&mut self, tag: impl Into<String>) {
        self.tag = tag.into();
        self.normalized.take();
    }

    pub fn set_digest(&mut self, digest: impl Into<String>) {
        self.digest = digest.into();
        self.normalized.take();
    }

    pub fn set_use_digest(&mut self, use_digest: bool) {
        self.use_digest = use_digest;
        self.normalized.take();
    }

    pub fn set_patch(&mut self, patch: Option<bool>) {
        self.patch = patch;
    }

    /// An image is empty when registry, repository and tag are all unset.
    /// Empty references are filtered before they ever reach a caller.
    pub fn is_empty(&self) -> bool {
        self.registry.is_empty() && self.repository.is_empty() && self.tag.is_empty()
    }

    /// The canonical string form. The registry segment is omitted when
    /// empty and stray separators are stripped before reassembly. The
    /// result is cached so repeated calls are stable and cheap.
    pub fn normalized(&self) -> &str {
        self.normalized.get_or_init(|| {
            let mut out = String::new();
            if !self.registry.is_empty() {
                out.push_str(clean_segment(&self.registry, '/'));
                out.push('/');
            }
            out.push_str(clean_segment(&self.repository, '/'));
            if !self.tag.is_empty() {
                out.push(':');
                out.push_str(clean_segment(&self.tag, ':'));
            }
            if self.use_digest && !self.digest.is_empty() {
                out.push('@');
                out.push_str(clean_segment(&self.digest, '@'));
            }
            out
        })
    }

    /// Split the repository path into (registry, namespace, name).
    ///
    /// Uses the last-two-segments heuristic for deeply nested registry
    /// paths: with more than two segments the first two become the
    /// namespace and the remainder the name; a bare single segment gets
    /// the conventional `library` namespace.
    pub fn elements(&self) -> Result<(String, String, String)> {
        let path = clean_segment(&self.repository, '/');
        if path.is_empty() {
            return Err(CoreError::MalformedReference {
                reference: self.normalized().to_string(),
            });
        }

        let parts: Vec<&str> = path.split('/').collect();
        let (namespace, name) = match parts.len() {
            1 => ("library".to_string(), parts[0].to_string()),
            2 => (parts[0].to_string(), parts[1].to_string()),
            _ => (parts[..2].join("/"), parts[2..].join("/")),
        };

        Ok((self.registry.clone(), namespace, name))
    }

    /// The leaf image name, e.g. `nginx` for `docker.io/library/nginx`.
    pub fn name(&self) -> &str {
        self.repository
            .rsplit('/')
            .next()
            .unwrap_or(&self.repository)
    }

    /// Tag, digest, or `tag@digest`; an error only when both are empty.
    pub fn tag_or_digest(&self) -> Result<String> {
        match (self.tag.is_empty(), self.digest.is_empty()) {
            (false, false) => Ok(format!("{}@{}", self.tag, self.digest)),
            (false, true) => Ok(self.tag.clone()),
            (true, false) => Ok(self.digest.clone()),
            (true, true) => Err(CoreError::NoTagOrDigest),
        }
    }
}
