//! Retriever - chooses between the peer-to-peer and market paths.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::catalog::RetrievalCandidate;
use crate::config::Config;
use crate::ids::{effective_selector, ContentId, Selector};
use crate::market::{query_candidates, rank_candidates, retrieve_in_order, MarketClient};
use crate::metrics;
use crate::peer::PeerNetwork;
use crate::progress::ProgressReporter;

use super::{
    CandidateSelectionConfig, MarketRetrievalStats, PeerRetrievalStats, RetrievalError,
    RetrievalPath, RetrievalStats,
};

/// Top-level entry point for fetching a CID.
///
/// Holds the market client and, optionally, a peer-to-peer network. Each
/// call to [`Retriever::retrieve`] is an independent attempt with its own
/// counters.
pub struct Retriever {
    market: Arc<dyn MarketClient>,
    peers: Option<PeerNetwork>,
    progress: ProgressReporter,
    /// Used by [`Retriever::retrieve_configured`].
    selection: CandidateSelectionConfig,
}

impl Retriever {
    /// Create a retriever with only the market path.
    pub fn new(market: Arc<dyn MarketClient>) -> Self {
        Self {
            market,
            peers: None,
            progress: ProgressReporter::default(),
            selection: CandidateSelectionConfig::default(),
        }
    }

    /// Create a retriever whose progress output and candidate selection come
    /// from `config`.
    pub fn from_config(market: Arc<dyn MarketClient>, config: &Config) -> Self {
        Self::new(market)
            .with_progress(ProgressReporter::from(&config.progress))
            .with_selection(config.selection.clone())
    }

    /// Enable the peer-to-peer path.
    pub fn with_peer_network(mut self, network: PeerNetwork) -> Self {
        self.peers = Some(network);
        self
    }

    /// Replace the progress reporter (e.g. to silence stderr).
    pub fn with_progress(mut self, progress: ProgressReporter) -> Self {
        self.progress = progress;
        self
    }

    /// Replace the selection used by [`Retriever::retrieve_configured`].
    pub fn with_selection(mut self, selection: CandidateSelectionConfig) -> Self {
        self.selection = selection;
        self
    }

    pub fn selection(&self) -> &CandidateSelectionConfig {
        &self.selection
    }

    /// [`Retriever::retrieve`] with the selection this retriever was built with.
    pub async fn retrieve_configured(
        &self,
        cid: &ContentId,
        selector: Option<&Selector>,
        candidates: &[RetrievalCandidate],
        cancel: &CancellationToken,
    ) -> Result<RetrievalStats, RetrievalError> {
        self.retrieve(cid, selector, candidates, &self.selection, cancel)
            .await
    }

    /// Retrieve `cid`, preferring whichever path `selection` asks for.
    ///
    /// Cancellation is returned as is; it never triggers the fallback.
    pub async fn retrieve(
        &self,
        cid: &ContentId,
        selector: Option<&Selector>,
        candidates: &[RetrievalCandidate],
        selection: &CandidateSelectionConfig,
        cancel: &CancellationToken,
    ) -> Result<RetrievalStats, RetrievalError> {
        let selector = effective_selector(selector);
        let mut peer_error = None;

        if selection.prefer_peer_to_peer && selector.is_none() {
            match &self.peers {
                Some(peers) => match self.try_peer(peers, cid, cancel).await {
                    Ok(stats) => return Ok(RetrievalStats::PeerToPeer(stats)),
                    Err(RetrievalError::Cancelled) => return Err(RetrievalError::Cancelled),
                    Err(e) => {
                        error!(cid = %cid, error = %e, "Peer-to-peer retrieval failed, falling back to market");
                        peer_error = Some(Box::new(e));
                    }
                },
                None => debug!("No peer-to-peer network configured, skipping"),
            }
        }

        match self
            .try_market(cid, selector, candidates, selection, cancel)
            .await
        {
            Ok(stats) => Ok(RetrievalStats::Market(stats)),
            Err(RetrievalError::Cancelled) => Err(RetrievalError::Cancelled),
            Err(e) => {
                error!(cid = %cid, error = %e, "Market retrieval failed");
                Err(RetrievalError::AllRetrievalAttemptsFailed {
                    peer: peer_error,
                    market: Box::new(e),
                })
            }
        }
    }

    async fn try_peer(
        &self,
        peers: &PeerNetwork,
        cid: &ContentId,
        cancel: &CancellationToken,
    ) -> Result<PeerRetrievalStats, RetrievalError> {
        let result = peers.retrieve(cid, self.progress, cancel).await;
        record_outcome(
            RetrievalPath::PeerToPeer,
            result.as_ref().map(|s| (s.byte_size, s.duration)),
        );
        result
    }

    /// Query, rank, then try candidates in order.
    async fn try_market(
        &self,
        cid: &ContentId,
        selector: Option<&Selector>,
        candidates: &[RetrievalCandidate],
        selection: &CandidateSelectionConfig,
        cancel: &CancellationToken,
    ) -> Result<MarketRetrievalStats, RetrievalError> {
        let result = self
            .run_market_pipeline(cid, selector, candidates, selection, cancel)
            .await;
        record_outcome(
            RetrievalPath::Market,
            result.as_ref().map(|s| (s.byte_size, s.duration)),
        );
        result
    }

    async fn run_market_pipeline(
        &self,
        cid: &ContentId,
        selector: Option<&Selector>,
        candidates: &[RetrievalCandidate],
        selection: &CandidateSelectionConfig,
        cancel: &CancellationToken,
    ) -> Result<MarketRetrievalStats, RetrievalError> {
        if candidates.is_empty() {
            info!(cid = %cid, "No candidates were provided, will not attempt market retrieval");
            return Err(RetrievalError::NoCandidatesProvided);
        }

        let results =
            query_candidates(self.market.as_ref(), candidates, self.progress, cancel).await?;
        if results.is_empty() {
            return Err(RetrievalError::AllQueriesFailed {
                candidates: candidates.len(),
            });
        }

        let ranked = rank_candidates(results, selection.no_sort);
        retrieve_in_order(self.market.as_ref(), &ranked, selector, self.progress, cancel).await
    }
}

fn record_outcome<E>(path: RetrievalPath, outcome: Result<(u64, std::time::Duration), E>) {
    match outcome {
        Ok((bytes, duration)) => {
            metrics::RETRIEVAL_ATTEMPTS
                .with_label_values(&[path.as_str(), "success"])
                .inc();
            metrics::BYTES_RETRIEVED
                .with_label_values(&[path.as_str()])
                .inc_by(bytes);
            metrics::RETRIEVAL_DURATION
                .with_label_values(&[path.as_str()])
                .observe(duration.as_secs_f64());
        }
        Err(_) => {
            metrics::RETRIEVAL_ATTEMPTS
                .with_label_values(&[path.as_str(), "failure"])
                .inc();
        }
    }
}
