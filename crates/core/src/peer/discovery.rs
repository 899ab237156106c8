//! Finding one reachable provider.

use std::time::Duration;

use futures::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::ids::{ContentId, PeerId};
use crate::retrieval::RetrievalError;

use super::{BlockExchange, ProviderDiscovery};

/// Drain discovery until a provider accepts a connection.
///
/// Placeholder records and failed connections are skipped. Discovery stops
/// as soon as one connection succeeds, the stream ends, `timeout` passes, or
/// `cancel` fires.
pub async fn connect_first_provider(
    discovery: &dyn ProviderDiscovery,
    exchange: &dyn BlockExchange,
    cid: &ContentId,
    max_providers: usize,
    timeout: Duration,
    cancel: &CancellationToken,
) -> Result<PeerId, RetrievalError> {
    info!(cid = %cid, "Searching peer-to-peer network for CID");

    let mut providers = discovery.find_providers(cid, max_providers);
    let search = async move {
        while let Some(provider) = providers.next().await {
            if provider.id.is_empty() {
                continue;
            }

            info!(provider = %provider.id, "Provider candidate");

            match exchange.connect(&provider).await {
                Ok(()) => {
                    info!(provider = %provider.id, "Connected to provider");
                    return Some(provider.id);
                }
                Err(e) => {
                    warn!(provider = %provider.id, error = %e, "Failed to connect to provider");
                }
            }
        }
        None
    };

    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(RetrievalError::Cancelled),
        outcome = tokio::time::timeout(timeout, search) => match outcome {
            Ok(Some(provider)) => Ok(provider),
            Ok(None) => Err(RetrievalError::NoReachableProvider),
            Err(_) => {
                warn!(timeout_secs = timeout.as_secs(), "Timed out waiting for a reachable provider");
                Err(RetrievalError::NoReachableProvider)
            }
        },
    }
}
