//! Mock candidate catalog for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::catalog::{CandidateCatalog, CatalogError, RetrievalCandidate};
use crate::ids::ContentId;

/// Mock implementation of the CandidateCatalog trait.
///
/// Unknown CIDs yield an empty candidate list.
#[derive(Debug)]
pub struct MockCatalog {
    /// Candidates by CID.
    candidates: Arc<RwLock<HashMap<String, Vec<RetrievalCandidate>>>>,
    /// CIDs looked up, in order.
    lookups: Arc<RwLock<Vec<String>>>,
    /// If set, the next lookup fails with this error.
    next_error: Arc<RwLock<Option<CatalogError>>>,
}

impl Default for MockCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl MockCatalog {
    pub fn new() -> Self {
        Self {
            candidates: Arc::new(RwLock::new(HashMap::new())),
            lookups: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
        }
    }

    /// Set the candidates returned for `cid`.
    pub async fn set_candidates(&self, cid: &str, candidates: Vec<RetrievalCandidate>) {
        self.candidates
            .write()
            .await
            .insert(cid.to_string(), candidates);
    }

    /// Configure the next lookup to fail with the given error.
    pub async fn set_next_error(&self, error: CatalogError) {
        *self.next_error.write().await = Some(error);
    }

    /// CIDs looked up so far.
    pub async fn lookups(&self) -> Vec<String> {
        self.lookups.read().await.clone()
    }
}

#[async_trait]
impl CandidateCatalog for MockCatalog {
    fn name(&self) -> &str {
        "mock"
    }

    async fn candidates(&self, cid: &ContentId) -> Result<Vec<RetrievalCandidate>, CatalogError> {
        self.lookups.write().await.push(cid.to_string());

        if let Some(error) = self.next_error.write().await.take() {
            return Err(error);
        }

        Ok(self
            .candidates
            .read()
            .await
            .get(cid.as_str())
            .cloned()
            .unwrap_or_default())
    }
}
