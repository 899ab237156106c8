//! Concurrent DAG walk with a global visited set.

use std::collections::{HashSet, VecDeque};

use futures::stream::{FuturesUnordered, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::ids::ContentId;
use crate::progress::ByteCounter;
use crate::retrieval::RetrievalError;

use super::{BlockExchange, DagNode, PeerError};

/// Totals from a completed walk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TraversalSummary {
    /// Sum of the sizes of nodes without links.
    pub leaf_bytes: u64,
    /// Distinct nodes fetched.
    pub blocks: u64,
}

/// Fetch every node reachable from `root`, each exactly once.
///
/// Up to `max_concurrent` fetches run at a time. Only leaf sizes go into
/// `counter`. Raw-codec nodes are never expanded. The first failed fetch
/// aborts the walk.
pub async fn walk_dag(
    exchange: &dyn BlockExchange,
    root: &ContentId,
    max_concurrent: usize,
    counter: &ByteCounter,
    cancel: &CancellationToken,
) -> Result<TraversalSummary, RetrievalError> {
    let max_concurrent = max_concurrent.max(1);
    let mut visited: HashSet<ContentId> = HashSet::new();
    let mut queued: VecDeque<ContentId> = VecDeque::new();
    let mut in_flight = FuturesUnordered::new();
    let mut summary = TraversalSummary::default();

    visited.insert(root.clone());
    queued.push_back(root.clone());

    loop {
        while in_flight.len() < max_concurrent {
            match queued.pop_front() {
                Some(cid) => in_flight.push(fetch_block(exchange, cid)),
                None => break,
            }
        }

        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(RetrievalError::Cancelled),
            next = in_flight.next() => next,
        };
        let Some((cid, fetched)) = next else {
            break;
        };

        let node = fetched.map_err(RetrievalError::TraversalFailed)?;
        summary.blocks += 1;

        if node.links.is_empty() {
            summary.leaf_bytes = summary.leaf_bytes.saturating_add(node.size);
            counter.add(node.size);
        }

        if cid.is_raw_leaf() {
            continue;
        }

        for link in node.links {
            if visited.insert(link.clone()) {
                queued.push_back(link);
            }
        }
    }

    debug!(
        blocks = summary.blocks,
        leaf_bytes = summary.leaf_bytes,
        "DAG traversal complete"
    );
    Ok(summary)
}

async fn fetch_block(
    exchange: &dyn BlockExchange,
    cid: ContentId,
) -> (ContentId, Result<DagNode, PeerError>) {
    let fetched = exchange.fetch(&cid).await;
    (cid, fetched)
}
