//! Version resolution
//!
//! Resolves a version constraint against a descending candidate list:
//! - An exact version pin is returned verbatim (including any `v` prefix)
//! - A range walks the candidates latest-first and picks the first
//!   stable version that satisfies it; pre-releases never match a range

use semver::{Version, VersionReq};

use crate::error::{RepoError, Result};
use crate::index::RepositoryIndex;

/// Parse a version string leniently: accepts a leading `v` and pads
/// missing minor/patch components, so `v1.2` parses as `1.2.0`.
pub fn parse_tolerant(version: &str) -> Result<Version> {
    let trimmed = version.trim().trim_start_matches('v');
    if let Ok(v) = Version::parse(trimmed) {
        return Ok(v);
    }
    // Split any pre-release/build suffix off before padding
    let (core, suffix) = match trimmed.find(['-', '+']) {
        Some(idx) => (&trimmed[..idx], &trimmed[idx..]),
        None => (trimmed, ""),
    };
    let dots = core.chars().filter(|c| *c == '.').count();
    let padded = match dots {
        0 => format!("{}.0.0{}", core, suffix),
        1 => format!("{}.0{}", core, suffix),
        _ => trimmed.to_string(),
    };
    Version::parse(&padded).map_err(|e| RepoError::InvalidConstraint {
        constraint: version.to_string(),
        message: e.to_string(),
    })
}

/// True when the constraint names a single concrete version rather
/// than a range.
pub fn is_exact(constraint: &str) -> bool {
    let trimmed = constraint.trim().trim_start_matches('v');
    Version::parse(trimmed).is_ok()
}

/// Normalize a Helm-style constraint into `VersionReq` syntax: comparators
/// may be space-separated (`>=1.0.0 <2.0.0`) and versions may carry a `v`
/// prefix.
fn parse_constraint(constraint: &str) -> Result<VersionReq> {
    let comparators: Vec<String> = if constraint.contains(',') {
        constraint.split(',').map(|c| c.trim().to_string()).collect()
    } else {
        constraint
            .split_whitespace()
            .map(|c| c.to_string())
            .collect()
    };
    let cleaned = comparators
        .iter()
        .map(|c| {
            let op_end = c
                .find(|ch: char| !matches!(ch, '=' | '<' | '>' | '^' | '~' | '!'))
                .unwrap_or(c.len());
            let (op, version) = c.split_at(op_end);
            format!("{}{}", op, version.trim_start_matches('v'))
        })
        .collect::<Vec<_>>()
        .join(", ");
    VersionReq::parse(&cleaned).map_err(|e| RepoError::InvalidConstraint {
        constraint: constraint.to_string(),
        message: e.to_string(),
    })
}

/// Resolve a version constraint against a descending candidate list.
///
/// Candidates are evaluated in the given order and the first stable match
/// wins, so the caller must preserve the index's latest-first ordering.
/// The result is the candidate string exactly as published (or, for exact
/// pins, exactly as given), so any `v` prefix survives resolution.
pub fn resolve_candidates(name: &str, candidates: &[String], constraint: &str) -> Result<String> {
    if is_exact(constraint) {
        return Ok(constraint.trim().to_string());
    }

    let req = parse_constraint(constraint)?;

    if candidates.is_empty() {
        return Err(RepoError::NoVersionsAvailable {
            name: name.to_string(),
        });
    }

    for version in candidates {
        let parsed = match parse_tolerant(version) {
            Ok(v) => v,
            Err(_) => continue,
        };
        if !parsed.pre.is_empty() {
            continue;
        }
        if req.matches(&parsed) {
            return Ok(version.clone());
        }
    }

    Err(RepoError::VersionNotFound {
        name: name.to_string(),
        constraint: constraint.to_string(),
    })
}

/// Latest stable version in a descending candidate list. Falls back to the
/// first raw entry when nothing in the list parses as semver at all.
pub fn latest_candidates(name: &str, candidates: &[String]) -> Result<String> {
    if candidates.is_empty() {
        return Err(RepoError::NoVersionsAvailable {
            name: name.to_string(),
        });
    }
    if let Some(stable) = candidates
        .iter()
        .find(|v| matches!(parse_tolerant(v), Ok(parsed) if parsed.pre.is_empty()))
    {
        return Ok(stable.clone());
    }
    if candidates.iter().all(|v| parse_tolerant(v).is_err()) {
        return Ok(candidates[0].clone());
    }
    Err(RepoError::VersionNotFound {
        name: name.to_string(),
        constraint: "*".to_string(),
    })
}

/// Resolve a constraint for a chart against a sorted index
pub fn resolve(index: &RepositoryIndex, name: &str, constraint: &str) -> Result<String> {
    resolve_candidates(name, &index.versions(name), constraint)
}

/// All stable published versions of a chart that satisfy a range,
/// latest first.
pub fn versions_in_range(
    index: &RepositoryIndex,
    name: &str,
    constraint: &str,
) -> Result<Vec<String>> {
    let req = parse_constraint(constraint)?;

    Ok(index
        .versions(name)
        .into_iter()
        .filter(|v| match parse_tolerant(v) {
            Ok(parsed) => parsed.pre.is_empty() && req.matches(&parsed),
            Err(_) => false,
        })
        .collect())
}

/// Latest stable published version of a chart
pub fn latest(index: &RepositoryIndex, name: &str) -> Result<String> {
    latest_candidates(name, &index.versions(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{ChartEntry, RepositoryIndex};

    fn index_with(name: &str, versions: &[&str]) -> RepositoryIndex {
        let mut index = RepositoryIndex::default();
        index.entries.insert(
            name.to_string(),
            versions
                .iter()
                .map(|v| ChartEntry {
                    name: name.to_string(),
                    version: v.to_string(),
                    ..Default::default()
                })
                .collect(),
        );
        index.sort_entries();
        index
    }

    #[test]
    fn test_parse_tolerant() {
        assert_eq!(parse_tolerant("1.2.3").unwrap(), Version::new(1, 2, 3));
        assert_eq!(parse_tolerant("v1.2.3").unwrap(), Version::new(1, 2, 3));
        assert_eq!(parse_tolerant("1.2").unwrap(), Version::new(1, 2, 0));
        assert_eq!(parse_tolerant("v2").unwrap(), Version::new(2, 0, 0));
        assert!(parse_tolerant("not-a-version").is_err());
    }

    #[test]
    fn test_resolve_exact_pin_returned_verbatim() {
        let index = index_with("nginx", &["1.4.0", "1.5.0"]);
        assert_eq!(resolve(&index, "nginx", "v1.4.0").unwrap(), "v1.4.0");
        assert_eq!(resolve(&index, "nginx", "1.4.0").unwrap(), "1.4.0");
    }

    #[test]
    fn test_resolve_range_picks_highest_stable() {
        let index = index_with("nginx", &["1.4.0", "1.5.0", "1.6.0-beta.1", "1.3.2"]);
        assert_eq!(resolve(&index, "nginx", ">=1.4.0, <1.6.0").unwrap(), "1.5.0");
    }

    #[test]
    fn test_resolve_space_separated_range() {
        let index = index_with("nginx", &["2.0.0", "1.5.0", "1.0.0", "0.9.0"]);
        assert_eq!(resolve(&index, "nginx", ">=1.0.0 <2.0.0").unwrap(), "1.5.0");
    }

    #[test]
    fn test_resolve_v_prefixed_range() {
        let index = index_with("tool", &["v1.4.0", "v1.2.0"]);
        assert_eq!(resolve(&index, "tool", ">=v1.0.0").unwrap(), "v1.4.0");
    }

    #[test]
    fn test_resolve_wildcard() {
        let index = index_with("nginx", &["1.4.0", "2.0.0-rc.1", "1.5.0"]);
        assert_eq!(resolve(&index, "nginx", "*").unwrap(), "1.5.0");
    }

    #[test]
    fn test_resolve_skips_prereleases() {
        let index = index_with("nginx", &["2.0.0-rc.1", "1.9.0"]);
        assert_eq!(resolve(&index, "nginx", ">=1.0.0").unwrap(), "1.9.0");
    }

    #[test]
    fn test_resolve_no_match() {
        let index = index_with("nginx", &["1.4.0"]);
        let err = resolve(&index, "nginx", ">=2.0.0").unwrap_err();
        assert!(matches!(err, RepoError::VersionNotFound { .. }));
    }

    #[test]
    fn test_resolve_unknown_chart() {
        let index = index_with("nginx", &["1.4.0"]);
        let err = resolve(&index, "postgresql", ">=1.0.0").unwrap_err();
        assert!(matches!(err, RepoError::NoVersionsAvailable { .. }));
    }

    #[test]
    fn test_resolve_invalid_constraint() {
        let index = index_with("nginx", &["1.4.0"]);
        let err = resolve(&index, "nginx", "not a range").unwrap_err();
        assert!(matches!(err, RepoError::InvalidConstraint { .. }));
    }

    #[test]
    fn test_versions_in_range() {
        let index = index_with("nginx", &["1.3.0", "1.4.0", "1.5.0", "2.0.0", "1.5.1-rc.1"]);
        let matching = versions_in_range(&index, "nginx", "^1.4").unwrap();
        assert_eq!(matching, vec!["1.5.0", "1.4.0"]);
    }

    #[test]
    fn test_latest_skips_prerelease() {
        let index = index_with("nginx", &["2.0.0-alpha.1", "1.9.0", "1.8.0"]);
        assert_eq!(latest(&index, "nginx").unwrap(), "1.9.0");
    }

    #[test]
    fn test_latest_raw_fallback_when_nothing_parses() {
        let candidates = vec!["nightly".to_string(), "edge".to_string()];
        assert_eq!(latest_candidates("app", &candidates).unwrap(), "nightly");
    }
}
