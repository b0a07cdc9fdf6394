//! HTTP repository access
//!
//! Fetch and cache Helm-style `index.yaml` files over HTTP.

use reqwest::Client;
use url::Url;

use charthawk_core::RepoRef;

use crate::error::{RepoError, Result};
use crate::index::RepositoryIndex;

/// HTTP repository client with a cached, sorted index
pub struct HttpRepository {
    repo: RepoRef,
    client: Client,
    cached_index: Option<RepositoryIndex>,
}

impl HttpRepository {
    pub fn new(repo: RepoRef) -> Self {
        Self {
            repo,
            client: Client::new(),
            cached_index: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.repo.name
    }

    pub fn url(&self) -> &str {
        &self.repo.url
    }

    /// URL of the repository's index file
    pub fn index_url(&self) -> Result<Url> {
        let base = format!("{}/index.yaml", self.repo.url.trim_end_matches('/'));
        Url::parse(&base).map_err(|_| RepoError::IndexNotFound {
            location: base.clone(),
        })
    }

    /// Fetch the index, parse it and sort its entries descending.
    /// The parsed index is cached for the lifetime of this client.
    pub async fn fetch_index(&mut self) -> Result<&RepositoryIndex> {
        if self.cached_index.is_none() {
            let url = self.index_url()?;
            let response = self.client.get(url.clone()).send().await?;

            if !response.status().is_success() {
                return Err(RepoError::HttpError {
                    status: response.status().as_u16(),
                    message: format!("fetching {}", url),
                });
            }

            let body = response.bytes().await?;
            let mut index = RepositoryIndex::from_bytes(&body)?;
            index.sort_entries();
            tracing::debug!(
                repo = %self.repo.name,
                charts = index.entries.len(),
                "fetched repository index"
            );
            self.cached_index = Some(index);
        }

        self.cached_index.as_ref().ok_or_else(|| RepoError::IndexNotFound {
            location: self.repo.url.clone(),
        })
    }

    /// Get the cached index without fetching
    pub fn index(&self) -> Option<&RepositoryIndex> {
        self.cached_index.as_ref()
    }

    /// Published versions of a chart, latest first
    pub async fn published_versions(&mut self, name: &str) -> Result<Vec<String>> {
        let index = self.fetch_index().await?;
        let versions = index.versions(name);
        if versions.is_empty() {
            return Err(RepoError::NoVersionsAvailable {
                name: name.to_string(),
            });
        }
        Ok(versions)
    }
}
