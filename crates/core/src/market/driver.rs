//! Serial retrieval over ranked candidates.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::ids::{effective_selector, Selector};
use crate::metrics;
use crate::progress::{ByteCounter, ProgressReporter};
use crate::retrieval::{MarketRetrievalStats, RetrievalError};

use super::cost::{format_fil, total_cost};
use super::{CandidateQueryResult, MarketClient, ProgressCallback, RetrievalProposal};

/// Try candidates strictly in the given order until one transfer succeeds.
///
/// A candidate whose proposal cannot be built, or whose transfer fails, is
/// skipped; nothing is retried and nothing after the first success runs.
pub async fn retrieve_in_order(
    client: &dyn MarketClient,
    ranked: &[CandidateQueryResult],
    selector: Option<&Selector>,
    progress: ProgressReporter,
    cancel: &CancellationToken,
) -> Result<MarketRetrievalStats, RetrievalError> {
    if ranked.is_empty() {
        return Err(RetrievalError::NoCandidatesProvided);
    }

    let selector = effective_selector(selector);

    for query in ranked {
        let candidate = &query.candidate;
        info!(
            provider = %candidate.provider,
            root = %candidate.root_cid,
            cost = %format_fil(total_cost(&query.response)),
            "Attempting market retrieval"
        );
        if let Some(selector) = selector {
            info!(selector = %selector, "Using selector");
        }

        let proposal = match RetrievalProposal::for_ask(&query.response, &candidate.root_cid, selector) {
            Ok(proposal) => proposal,
            Err(e) => {
                metrics::CANDIDATE_TRANSFERS
                    .with_label_values(&["proposal_failed"])
                    .inc();
                debug!(provider = %candidate.provider, error = %e, "Failed to create retrieval proposal");
                continue;
            }
        };

        // Fresh counter per transfer: the client reports cumulative bytes
        // for its own transfer only.
        let counter = ByteCounter::new(progress);
        let on_progress: ProgressCallback = {
            let counter = counter.clone();
            Arc::new(move |received| {
                counter.observe_total(received);
            })
        };

        let transfer = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(RetrievalError::Cancelled),
            result = client.retrieve(&candidate.provider, &proposal, on_progress) => result,
        };

        match transfer {
            Ok(stats) => {
                metrics::CANDIDATE_TRANSFERS
                    .with_label_values(&["success"])
                    .inc();
                info!(
                    provider = %candidate.provider,
                    bytes = stats.size,
                    "Market retrieval succeeded"
                );
                return Ok(MarketRetrievalStats::from_transfer(
                    candidate.root_cid.clone(),
                    stats,
                ));
            }
            Err(e) => {
                metrics::CANDIDATE_TRANSFERS
                    .with_label_values(&["transfer_failed"])
                    .inc();
                error!(
                    provider = %candidate.provider,
                    bytes_received = counter.total(),
                    error = %e,
                    "Failed to retrieve content from candidate"
                );
            }
        }
    }

    Err(RetrievalError::AllRetrievalsFailed {
        attempted: ranked.len(),
    })
}
