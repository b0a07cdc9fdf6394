//! Error types for repository operations

use thiserror::Error;

/// Repository operation errors
#[derive(Debug, Error)]
pub enum RepoError {
    // ============ Version Errors ============
    #[error("Version not found: {name}@{constraint} has no published match")]
    VersionNotFound { name: String, constraint: String },

    #[error("No versions available for chart: {name}")]
    NoVersionsAvailable { name: String },

    #[error("Invalid version constraint '{constraint}': {message}")]
    InvalidConstraint { constraint: String, message: String },

    // ============ Index Errors ============
    #[error("Index not found at {location}")]
    IndexNotFound { location: String },

    #[error("Index parse error: {message}")]
    IndexParseError { message: String },

    // ============ Materialization Errors ============
    #[error("Chart not found: {name} in repository {repo}")]
    ChartNotFound { name: String, repo: String },

    #[error("Failed to materialize chart {name}: {message}")]
    MaterializeFailed { name: String, message: String },

    // ============ Probe Errors ============
    #[error("Registry probe failed for {reference}: {message}")]
    ProbeFailure { reference: String, message: String },

    #[error("Invalid image reference: {reference}")]
    InvalidReference { reference: String },

    // ============ Network Errors ============
    #[error("HTTP error: {status} - {message}")]
    HttpError { status: u16, message: String },

    #[error("Network error: {message}")]
    NetworkError { message: String },

    // ============ IO Errors ============
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type for repository operations
pub type Result<T> = std::result::Result<T, RepoError>;

impl From<reqwest::Error> for RepoError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_connect() {
            RepoError::NetworkError {
                message: format!("Connection failed: {}", e),
            }
        } else if let Some(status) = e.status() {
            RepoError::HttpError {
                status: status.as_u16(),
                message: e.to_string(),
            }
        } else {
            RepoError::NetworkError {
                message: e.to_string(),
            }
        }
    }
}

impl From<serde_yaml::Error> for RepoError {
    fn from(e: serde_yaml::Error) -> Self {
        RepoError::Serialization(e.to_string())
    }
}

impl From<semver::Error> for RepoError {
    fn from(e: semver::Error) -> Self {
        RepoError::InvalidConstraint {
            constraint: String::new(),
            message: e.to_string(),
        }
    }
}
