//! Candidate catalog - the index service listing which providers store a CID.
//!
//! The catalog is the entry point of a market retrieval: it turns a content
//! identifier into a list of [`RetrievalCandidate`]s that the market path
//! then queries, ranks and tries one by one.

mod http;
mod types;

pub use http::HttpCandidateCatalog;
pub(crate) use http::parse_endpoint;
pub use types::*;

use async_trait::async_trait;
use thiserror::Error;

use crate::ids::ContentId;

/// Errors that can occur when looking up candidates.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The configured endpoint is not a usable URL.
    #[error("Catalog endpoint {0} is not a valid url")]
    InvalidEndpoint(String),

    /// The HTTP client could not be set up (e.g. TLS backend failure).
    #[error("Failed to build catalog http client: {0}")]
    Client(#[source] reqwest::Error),

    /// The request never produced a response.
    #[error("Catalog unreachable: {0}")]
    Unreachable(#[from] reqwest::Error),

    /// The catalog answered with something other than 200.
    #[error("Catalog request to {url} got status {status}")]
    UnexpectedStatus { url: String, status: u16 },

    /// The response started but its body could not be read in full.
    #[error("Failed to read catalog response body from {url}: {source}")]
    Body {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The body was not a JSON array of candidates.
    #[error("Could not decode catalog response for cid {cid}: {message}")]
    Malformed { cid: String, message: String },
}

/// Trait for candidate catalog backends.
#[async_trait]
pub trait CandidateCatalog: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &str;

    /// List the providers that claim to store `cid`.
    async fn candidates(&self, cid: &ContentId) -> Result<Vec<RetrievalCandidate>, CatalogError>;
}
