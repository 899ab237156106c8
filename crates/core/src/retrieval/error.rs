use thiserror::Error;

use crate::peer::PeerError;

/// Errors surfaced by a retrieval path or by the coordinator.
///
/// Per-candidate failures never show up here: they are logged and the next
/// candidate is tried.
#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("Retrieval failed: no candidates were provided")]
    NoCandidatesProvided,

    #[error("Retrieval failed: queries failed for all {candidates} candidates")]
    AllQueriesFailed { candidates: usize },

    #[error("Retrieval failed for all {attempted} candidates")]
    AllRetrievalsFailed { attempted: usize },

    #[error("No reachable peer-to-peer provider")]
    NoReachableProvider,

    #[error("Peer-to-peer traversal failed: {0}")]
    TraversalFailed(#[source] PeerError),

    #[error("Retrieval cancelled")]
    Cancelled,

    /// Both paths failed. Keeps each path's error for diagnostics.
    #[error("All retrieval attempts failed")]
    AllRetrievalAttemptsFailed {
        /// `None` when the peer-to-peer path was not attempted.
        peer: Option<Box<RetrievalError>>,
        market: Box<RetrievalError>,
    },
}

impl RetrievalError {
    /// Each underlying path failure, for detailed reporting.
    pub fn path_errors(&self) -> Vec<&RetrievalError> {
        match self {
            RetrievalError::AllRetrievalAttemptsFailed { peer, market } => peer
                .iter()
                .map(|e| e.as_ref())
                .chain(std::iter::once(market.as_ref()))
                .collect(),
            other => vec![other],
        }
    }
}
