//! HTTP client for the candidate index service.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use tracing::debug;

use crate::config::CatalogConfig;
use crate::ids::ContentId;
use crate::metrics;

use super::{CandidateCatalog, CatalogError, RetrievalCandidate};

/// Catalog client speaking `GET <endpoint>/<cid>`.
pub struct HttpCandidateCatalog {
    client: Client,
    endpoint: Url,
}

impl HttpCandidateCatalog {
    /// Create a client for the configured endpoint.
    pub fn new(config: &CatalogConfig) -> Result<Self, CatalogError> {
        let endpoint = parse_endpoint(&config.endpoint)?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(CatalogError::Client)?;

        Ok(Self { client, endpoint })
    }

    /// Build the lookup URL by joining the CID onto the endpoint path.
    fn candidates_url(&self, cid: &ContentId) -> Url {
        let mut url = self.endpoint.clone();
        let path = format!("{}/{}", url.path().trim_end_matches('/'), cid);
        url.set_path(&path);
        url
    }
}

/// Parse an endpoint string, accepting only absolute http(s) URLs.
pub(crate) fn parse_endpoint(endpoint: &str) -> Result<Url, CatalogError> {
    let url = Url::parse(endpoint).map_err(|_| CatalogError::InvalidEndpoint(endpoint.to_string()))?;
    if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
        return Err(CatalogError::InvalidEndpoint(endpoint.to_string()));
    }
    Ok(url)
}

#[async_trait]
impl CandidateCatalog for HttpCandidateCatalog {
    fn name(&self) -> &str {
        "http"
    }

    async fn candidates(&self, cid: &ContentId) -> Result<Vec<RetrievalCandidate>, CatalogError> {
        let result = self.fetch_candidates(cid).await;
        let label = if result.is_ok() { "success" } else { "failure" };
        metrics::CATALOG_LOOKUPS.with_label_values(&[label]).inc();
        result
    }
}

impl HttpCandidateCatalog {
    async fn fetch_candidates(
        &self,
        cid: &ContentId,
    ) -> Result<Vec<RetrievalCandidate>, CatalogError> {
        let url = self.candidates_url(cid);
        debug!(url = %url, "Fetching retrieval candidates");

        let response = self.client.get(url.clone()).send().await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(CatalogError::UnexpectedStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(|source| CatalogError::Body {
            url: url.to_string(),
            source,
        })?;
        let candidates: Vec<RetrievalCandidate> =
            serde_json::from_slice(&body).map_err(|e| CatalogError::Malformed {
                cid: cid.to_string(),
                message: e.to_string(),
            })?;

        debug!(cid = %cid, count = candidates.len(), "Catalog lookup complete");
        Ok(candidates)
    }
}
