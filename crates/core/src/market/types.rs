//! Types for storage-market retrieval.

use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::U256;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::catalog::RetrievalCandidate;
use crate::ids::{effective_selector, ContentId, ProviderId, Selector};

/// Per-candidate errors of the market path. None of them aborts a retrieval.
#[derive(Debug, Error)]
pub enum MarketError {
    #[error("Retrieval query to {provider} failed: {message}")]
    Query {
        provider: ProviderId,
        message: String,
    },

    #[error("Could not build retrieval proposal: {0}")]
    Proposal(String),

    #[error("Transfer from {provider} failed: {message}")]
    Transfer {
        provider: ProviderId,
        message: String,
    },
}

/// Availability reported by a provider in its query response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryStatus {
    Available,
    Unavailable,
    Error,
}

/// A provider's answer to a retrieval query. Amounts are in attoFIL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    pub status: QueryStatus,
    /// Declared size of the content in bytes.
    pub size: u64,
    pub min_price_per_byte: U256,
    /// Price for unsealing; zero when an unsealed copy is on hand.
    pub unseal_price: U256,
    /// Bytes the provider sends before asking for a payment.
    pub max_payment_interval: u64,
    pub max_payment_interval_increase: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_address: Option<String>,
    /// Free-form status message from the provider.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,
}

impl QueryResponse {
    /// An "available" response with the given prices and size.
    pub fn available(size: u64, min_price_per_byte: U256, unseal_price: U256) -> Self {
        Self {
            status: QueryStatus::Available,
            size,
            min_price_per_byte,
            unseal_price,
            max_payment_interval: 1 << 20,
            max_payment_interval_increase: 1 << 20,
            payment_address: None,
            message: String::new(),
        }
    }
}

/// A candidate paired with the response it gave in the query phase.
#[derive(Debug, Clone)]
pub struct CandidateQueryResult {
    pub candidate: RetrievalCandidate,
    pub response: QueryResponse,
}

/// Deal proposal sent to a provider to start a paid transfer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalProposal {
    pub id: Uuid,
    pub payload_cid: ContentId,
    pub selector: Selector,
    pub price_per_byte: U256,
    pub unseal_price: U256,
    pub payment_interval: u64,
    pub payment_interval_increase: u64,
}

impl RetrievalProposal {
    /// Build a proposal matching a provider's ask.
    ///
    /// Without a selector the whole DAG below `payload_cid` is requested.
    pub fn for_ask(
        ask: &QueryResponse,
        payload_cid: &ContentId,
        selector: Option<&Selector>,
    ) -> Result<Self, MarketError> {
        if ask.status != QueryStatus::Available {
            return Err(MarketError::Proposal(format!(
                "provider reported content as {:?}: {}",
                ask.status, ask.message
            )));
        }

        let selector = match effective_selector(selector) {
            Some(selector) => {
                serde_json::from_str::<serde_json::Value>(selector.as_str()).map_err(|e| {
                    MarketError::Proposal(format!("selector is not valid DAG-JSON: {}", e))
                })?;
                selector.clone()
            }
            None => Selector::explore_all(),
        };

        Ok(Self {
            id: Uuid::new_v4(),
            payload_cid: payload_cid.clone(),
            selector,
            price_per_byte: ask.min_price_per_byte,
            unseal_price: ask.unseal_price,
            payment_interval: ask.max_payment_interval,
            payment_interval_increase: ask.max_payment_interval_increase,
        })
    }
}

/// What the market client reports after a completed transfer.
#[derive(Debug, Clone)]
pub struct TransferStats {
    pub provider: ProviderId,
    pub size: u64,
    pub duration: Duration,
    pub total_payment: U256,
    pub num_payments: u32,
    pub ask_price: U256,
}

/// Invoked with the cumulative number of bytes received so far.
pub type ProgressCallback = Arc<dyn Fn(u64) + Send + Sync>;

/// Trait for storage-market clients.
///
/// The client owns the query and transfer protocols; this crate only decides
/// whom to ask and in which order.
#[async_trait]
pub trait MarketClient: Send + Sync {
    /// Client name for logging.
    fn name(&self) -> &str;

    /// Ask a provider for price and availability of `root`.
    async fn query(
        &self,
        provider: &ProviderId,
        root: &ContentId,
    ) -> Result<QueryResponse, MarketError>;

    /// Run a paid transfer, calling `progress` as bytes arrive.
    async fn retrieve(
        &self,
        provider: &ProviderId,
        proposal: &RetrievalProposal,
        progress: ProgressCallback,
    ) -> Result<TransferStats, MarketError>;
}
