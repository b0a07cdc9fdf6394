//! charthawk-repo: repository access for charthawk
//!
//! Everything between a chart declaration and its materialized contents:
//! - Helm-compatible repository index parsing with a descending sort contract
//! - Version constraint resolution (exact pins, ranges, wildcards)
//! - Registry probing: manifest existence checks with a `v`-prefix tag fallback
//! - Chart materialization behind the `ChartLoader` seam

pub mod error;
pub mod http;
pub mod index;
pub mod loader;
pub mod probe;
pub mod resolver;

pub use error::{RepoError, Result};
pub use http::HttpRepository;
pub use index::{ChartEntry, IndexDependency, RepositoryIndex};
pub use loader::{ChartLoader, ChartMeta, DependencyEdge, IndexLoader};
pub use probe::{probe_image, OciProber, RegistryProber};
pub use resolver::{
    is_exact, latest, latest_candidates, parse_tolerant, resolve, resolve_candidates,
    versions_in_range,
};
