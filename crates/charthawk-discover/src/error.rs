//! Error types for the discovery pipeline

use thiserror::Error;

/// Discovery pipeline errors
#[derive(Debug, Error)]
pub enum DiscoverError {
    // ============ Wrapped Errors ============
    #[error(transparent)]
    Core(#[from] charthawk_core::CoreError),

    #[error(transparent)]
    Repo(#[from] charthawk_repo::RepoError),

    // ============ Pipeline Errors ============
    #[error("Image not available in any registry: {reference}")]
    MissingImage { reference: String },

    #[error("Failed to rewrite value at '{path}': {message}")]
    ValueReplace { path: String, message: String },

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type for discovery operations
pub type Result<T> = std::result::Result<T, DiscoverError>;

impl From<serde_yaml::Error> for DiscoverError {
    fn from(e: serde_yaml::Error) -> Self {
        DiscoverError::Serialization(e.to_string())
    }
}
