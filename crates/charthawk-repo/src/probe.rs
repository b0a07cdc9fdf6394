//! Registry probing
//!
//! Existence checks for container images against OCI-compliant registries.
//! Probing only asks "does this manifest exist" via a manifest digest fetch,
//! it never pulls layers. A tag that is not found is retried once with a
//! `v` prefix (upstream charts frequently publish `v1.2.3` while templating
//! `1.2.3` into their values). Registries on localhost or 0.0.0.0 are
//! contacted over plain HTTP, everything else over HTTPS.

use async_trait::async_trait;
use oci_distribution::client::{Client, ClientConfig, ClientProtocol};
use oci_distribution::secrets::RegistryAuth;
use oci_distribution::Reference;

use charthawk_core::ImageReference;

use crate::error::{RepoError, Result};

/// Existence check against a container registry.
///
/// Abstracted behind a trait so the discovery pipeline can be exercised
/// without network access.
#[async_trait]
pub trait RegistryProber: Send + Sync {
    /// Check whether the manifest for `image` exists in its registry.
    async fn manifest_exists(&self, image: &ImageReference) -> Result<bool>;
}

/// Registries reached by a loopback name are served without TLS.
fn plain_http_registry(registry: &str) -> bool {
    registry.contains("localhost") || registry.contains("0.0.0.0")
}

/// Prober backed by the OCI distribution API
pub struct OciProber {
    https: Client,
    http: Client,
    auth: RegistryAuth,
}

impl OciProber {
    /// Create a prober with anonymous auth. The protocol is chosen per
    /// image: localhost and 0.0.0.0 registries are contacted over plain
    /// HTTP, everything else over HTTPS.
    pub fn new() -> Self {
        Self {
            https: Self::client_with(ClientProtocol::Https),
            http: Self::client_with(ClientProtocol::Http),
            auth: RegistryAuth::Anonymous,
        }
    }

    fn client_with(protocol: ClientProtocol) -> Client {
        Client::new(ClientConfig {
            protocol,
            ..Default::default()
        })
    }

    fn client_for(&self, registry: &str) -> &Client {
        if plain_http_registry(registry) {
            &self.http
        } else {
            &self.https
        }
    }

    fn to_oci_reference(image: &ImageReference) -> Result<Reference> {
        Reference::try_from(image.normalized()).map_err(|_| RepoError::InvalidReference {
            reference: image.normalized().to_string(),
        })
    }
}

impl Default for OciProber {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RegistryProber for OciProber {
    async fn manifest_exists(&self, image: &ImageReference) -> Result<bool> {
        let reference = Self::to_oci_reference(image)?;

        match self
            .client_for(image.registry())
            .fetch_manifest_digest(&reference, &self.auth)
            .await
        {
            Ok(_) => Ok(true),
            Err(e) => {
                let error_str = e.to_string().to_lowercase();
                if error_str.contains("not found")
                    || error_str.contains("manifest unknown")
                    || error_str.contains("404")
                {
                    Ok(false)
                } else {
                    Err(RepoError::ProbeFailure {
                        reference: image.normalized().to_string(),
                        message: e.to_string(),
                    })
                }
            }
        }
    }
}

/// Probe an image, falling back to a `v`-prefixed tag.
///
/// Returns the reference that was actually found, or `None` when neither
/// the published tag nor its `v`-prefixed variant exists. The returned
/// reference is the input with at most its tag rewritten.
pub async fn probe_image<P: RegistryProber + ?Sized>(
    prober: &P,
    image: &ImageReference,
) -> Result<Option<ImageReference>> {
    if prober.manifest_exists(image).await? {
        return Ok(Some(image.clone()));
    }

    let tag = image.tag();
    if tag.is_empty() || tag.starts_with('v') || !image.digest().is_empty() {
        return Ok(None);
    }
    if !tag.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        return Ok(None);
    }

    let mut prefixed = image.clone();
    prefixed.set_tag(format!("v{}", tag));
    tracing::debug!(
        image = %image.normalized(),
        fallback = %prefixed.normalized(),
        "tag not found, retrying with v prefix"
    );

    if prober.manifest_exists(&prefixed).await? {
        Ok(Some(prefixed))
    } else {
        Ok(None)
    }
}
