//! Concurrent price/availability queries against every candidate.

use std::sync::Mutex;

use futures::future::join_all;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::catalog::RetrievalCandidate;
use crate::metrics;
use crate::progress::ProgressReporter;
use crate::retrieval::RetrievalError;

use super::{CandidateQueryResult, MarketClient};

/// Results gathered while queries complete, owned by one fan-out call.
#[derive(Default)]
struct QueryAccumulator {
    /// Successful responses tagged with the candidate's input position.
    results: Vec<(usize, CandidateQueryResult)>,
    completed: usize,
}

/// Query every candidate concurrently and keep the ones that answered.
///
/// A failed query only drops its own candidate. All queries are awaited
/// before returning. Survivors keep the order they had in `candidates`, so a
/// caller that skips ranking gets its own order back. The result may be
/// empty.
pub async fn query_candidates(
    client: &dyn MarketClient,
    candidates: &[RetrievalCandidate],
    progress: ProgressReporter,
    cancel: &CancellationToken,
) -> Result<Vec<CandidateQueryResult>, RetrievalError> {
    let total = candidates.len();
    let accumulator = Mutex::new(QueryAccumulator::default());

    info!(candidates = total, client = client.name(), "Querying retrieval candidates");

    let queries = candidates.iter().enumerate().map(|(index, candidate)| {
        let accumulator = &accumulator;
        async move {
            let outcome = client.query(&candidate.provider, &candidate.root_cid).await;

            let mut acc = accumulator
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            acc.completed += 1;
            match outcome {
                Ok(response) => {
                    metrics::CANDIDATE_QUERIES
                        .with_label_values(&["success"])
                        .inc();
                    acc.results.push((
                        index,
                        CandidateQueryResult {
                            candidate: candidate.clone(),
                            response,
                        },
                    ));
                }
                Err(e) => {
                    metrics::CANDIDATE_QUERIES
                        .with_label_values(&["failure"])
                        .inc();
                    debug!(provider = %candidate.provider, error = %e, "Retrieval query failed");
                }
            }
            progress.queries(acc.completed, total);
        }
    });

    tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(RetrievalError::Cancelled),
        _ = join_all(queries) => {}
    }

    let mut tagged = accumulator
        .into_inner()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .results;
    tagged.sort_by_key(|(index, _)| *index);
    let results: Vec<CandidateQueryResult> = tagged.into_iter().map(|(_, result)| result).collect();

    info!(
        "Got back {} retrieval query results of a total of {} candidates",
        results.len(),
        total
    );

    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fixtures, MockMarketClient};
    use std::time::Duration;

    #[tokio::test]
    async fn test_failed_queries_are_dropped() {
        let client = MockMarketClient::new();
        client.set_query_response("f01", fixtures::ask(0, 1, 100)).await;
        client.set_query_error("f02", "connection refused").await;
        client.set_query_response("f03", fixtures::ask(0, 2, 100)).await;

        let candidates = fixtures::candidates(&["f01", "f02", "f03"]);
        let results = query_candidates(
            &client,
            &candidates,
            ProgressReporter::disabled(),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        let providers: Vec<_> = results
            .iter()
            .map(|r| r.candidate.provider.to_string())
            .collect();
        assert_eq!(providers, vec!["f01", "f03"]);
        assert_eq!(client.query_count().await, 3);
    }

    #[tokio::test]
    async fn test_results_keep_input_order() {
        let client = MockMarketClient::new();
        client.set_query_response("f01", fixtures::ask(0, 1, 100)).await;
        client.set_query_response("f02", fixtures::ask(0, 1, 100)).await;
        client.set_query_response("f03", fixtures::ask(0, 1, 100)).await;
        // The first candidate answers last.
        client
            .set_provider_query_delay("f01", Duration::from_millis(100))
            .await;

        let candidates = fixtures::candidates(&["f01", "f02", "f03"]);
        let results = query_candidates(
            &client,
            &candidates,
            ProgressReporter::disabled(),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        let providers: Vec<_> = results
            .iter()
            .map(|r| r.candidate.provider.to_string())
            .collect();
        assert_eq!(providers, vec!["f01", "f02", "f03"]);
    }

    #[tokio::test]
    async fn test_all_failed_is_empty_not_error() {
        let client = MockMarketClient::new();
        client.set_query_error("f01", "timeout").await;
        client.set_query_error("f02", "timeout").await;

        let candidates = fixtures::candidates(&["f01", "f02"]);
        let results = query_candidates(
            &client,
            &candidates,
            ProgressReporter::disabled(),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_queries_run_concurrently() {
        let client = MockMarketClient::new();
        client.set_query_delay(Duration::from_millis(200)).await;
        for provider in ["f01", "f02", "f03", "f04", "f05"] {
            client.set_query_response(provider, fixtures::ask(0, 1, 10)).await;
        }

        let candidates = fixtures::candidates(&["f01", "f02", "f03", "f04", "f05"]);
        let start = std::time::Instant::now();
        let results = query_candidates(
            &client,
            &candidates,
            ProgressReporter::disabled(),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        assert_eq!(results.len(), 5);
        assert!(start.elapsed() < Duration::from_millis(900));
    }

    #[tokio::test]
    async fn test_cancelled_query_phase() {
        let client = MockMarketClient::new();
        client.set_query_delay(Duration::from_secs(30)).await;
        client.set_query_response("f01", fixtures::ask(0, 1, 10)).await;

        let cancel = CancellationToken::new();
        cancel.cancel();

        let candidates = fixtures::candidates(&["f01"]);
        let result =
            query_candidates(&client, &candidates, ProgressReporter::disabled(), &cancel).await;
        assert!(matches!(result, Err(RetrievalError::Cancelled)));
    }
}
