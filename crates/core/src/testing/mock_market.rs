//! Mock storage-market client for testing.

use alloy_primitives::U256;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use crate::ids::{ContentId, ProviderId};
use crate::market::{
    MarketClient, MarketError, ProgressCallback, QueryResponse, RetrievalProposal, TransferStats,
};

/// Configured outcome of a query or transfer.
#[derive(Debug, Clone)]
enum Outcome<T> {
    Succeed(T),
    Fail(String),
}

/// A transfer that reached the mock.
#[derive(Debug, Clone)]
struct RecordedTransfer {
    provider: String,
    proposal: RetrievalProposal,
}

/// Mock implementation of the MarketClient trait.
///
/// Provides controllable behavior for testing:
/// - Per-provider query responses and transfer sizes
/// - Per-provider failures
/// - Query delays, global or per provider, and transfer delays
/// - Recorded queries and transfers
///
/// Providers without a configured outcome fail.
#[derive(Debug)]
pub struct MockMarketClient {
    queries: Arc<RwLock<HashMap<String, Outcome<QueryResponse>>>>,
    transfers: Arc<RwLock<HashMap<String, Outcome<u64>>>>,
    query_delay: Arc<RwLock<Option<Duration>>>,
    provider_query_delays: Arc<RwLock<HashMap<String, Duration>>>,
    transfer_delay: Arc<RwLock<Option<Duration>>>,
    /// Providers queried, in call order.
    queried: Arc<RwLock<Vec<String>>>,
    /// Transfers started, in call order.
    retrieved: Arc<RwLock<Vec<RecordedTransfer>>>,
}

impl Default for MockMarketClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MockMarketClient {
    pub fn new() -> Self {
        Self {
            queries: Arc::new(RwLock::new(HashMap::new())),
            transfers: Arc::new(RwLock::new(HashMap::new())),
            query_delay: Arc::new(RwLock::new(None)),
            provider_query_delays: Arc::new(RwLock::new(HashMap::new())),
            transfer_delay: Arc::new(RwLock::new(None)),
            queried: Arc::new(RwLock::new(Vec::new())),
            retrieved: Arc::new(RwLock::new(Vec::new())),
        }
    }

    // =========================================================================
    // Configuration
    // =========================================================================

    /// Answer queries to `provider` with `response`.
    pub async fn set_query_response(&self, provider: &str, response: QueryResponse) {
        self.queries
            .write()
            .await
            .insert(provider.to_string(), Outcome::Succeed(response));
    }

    /// Fail queries to `provider`.
    pub async fn set_query_error(&self, provider: &str, message: &str) {
        self.queries
            .write()
            .await
            .insert(provider.to_string(), Outcome::Fail(message.to_string()));
    }

    /// Delay every query by `delay`.
    pub async fn set_query_delay(&self, delay: Duration) {
        *self.query_delay.write().await = Some(delay);
    }

    /// Delay queries to one provider. Takes precedence over the global delay.
    pub async fn set_provider_query_delay(&self, provider: &str, delay: Duration) {
        self.provider_query_delays
            .write()
            .await
            .insert(provider.to_string(), delay);
    }

    /// Delay every transfer by `delay` after the first progress report.
    pub async fn set_transfer_delay(&self, delay: Duration) {
        *self.transfer_delay.write().await = Some(delay);
    }

    /// Let transfers from `provider` succeed with `bytes` bytes.
    pub async fn set_transfer_bytes(&self, provider: &str, bytes: u64) {
        self.transfers
            .write()
            .await
            .insert(provider.to_string(), Outcome::Succeed(bytes));
    }

    /// Fail transfers from `provider`.
    pub async fn set_transfer_error(&self, provider: &str, message: &str) {
        self.transfers
            .write()
            .await
            .insert(provider.to_string(), Outcome::Fail(message.to_string()));
    }

    // =========================================================================
    // Assertions
    // =========================================================================

    /// Number of queries received.
    pub async fn query_count(&self) -> usize {
        self.queried.read().await.len()
    }

    /// Number of transfers started.
    pub async fn retrieve_count(&self) -> usize {
        self.retrieved.read().await.len()
    }

    /// Providers a transfer was started with, in order.
    pub async fn retrieved_providers(&self) -> Vec<String> {
        self.retrieved
            .read()
            .await
            .iter()
            .map(|t| t.provider.clone())
            .collect()
    }

    /// Proposals sent, in order.
    pub async fn recorded_proposals(&self) -> Vec<RetrievalProposal> {
        self.retrieved
            .read()
            .await
            .iter()
            .map(|t| t.proposal.clone())
            .collect()
    }
}

#[async_trait]
impl MarketClient for MockMarketClient {
    fn name(&self) -> &str {
        "mock"
    }

    async fn query(
        &self,
        provider: &ProviderId,
        _root: &ContentId,
    ) -> Result<QueryResponse, MarketError> {
        self.queried.write().await.push(provider.to_string());

        let delay = match self.provider_query_delays.read().await.get(provider.as_str()) {
            Some(delay) => Some(*delay),
            None => *self.query_delay.read().await,
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        match self.queries.read().await.get(provider.as_str()) {
            Some(Outcome::Succeed(response)) => Ok(response.clone()),
            Some(Outcome::Fail(message)) => Err(MarketError::Query {
                provider: provider.clone(),
                message: message.clone(),
            }),
            None => Err(MarketError::Query {
                provider: provider.clone(),
                message: "no response configured".to_string(),
            }),
        }
    }

    async fn retrieve(
        &self,
        provider: &ProviderId,
        proposal: &RetrievalProposal,
        progress: ProgressCallback,
    ) -> Result<TransferStats, MarketError> {
        self.retrieved.write().await.push(RecordedTransfer {
            provider: provider.to_string(),
            proposal: proposal.clone(),
        });

        let outcome = self.transfers.read().await.get(provider.as_str()).cloned();
        let bytes = match outcome {
            Some(Outcome::Succeed(bytes)) => bytes,
            Some(Outcome::Fail(message)) => {
                return Err(MarketError::Transfer {
                    provider: provider.clone(),
                    message,
                })
            }
            None => {
                return Err(MarketError::Transfer {
                    provider: provider.clone(),
                    message: "no transfer configured".to_string(),
                })
            }
        };

        let start = Instant::now();
        progress(bytes / 2);
        let delay = *self.transfer_delay.read().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        progress(bytes);

        let total_payment = U256::from(bytes)
            .saturating_mul(proposal.price_per_byte)
            .saturating_add(proposal.unseal_price);

        Ok(TransferStats {
            provider: provider.clone(),
            size: bytes,
            duration: start.elapsed(),
            total_payment,
            num_payments: if total_payment.is_zero() { 0 } else { 1 },
            ask_price: proposal.price_per_byte,
        })
    }
}
