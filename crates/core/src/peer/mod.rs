//! Peer-to-peer retrieval: find a provider, then pull the DAG block by block.
//!
//! The routing and exchange protocols are behind [`ProviderDiscovery`] and
//! [`BlockExchange`]; this module only drives them.

mod discovery;
mod traversal;
mod types;

pub use discovery::connect_first_provider;
pub use traversal::{walk_dag, TraversalSummary};
pub use types::*;

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::{Config, PeerConfig};
use crate::ids::ContentId;
use crate::progress::{ByteCounter, ProgressReporter};
use crate::retrieval::{PeerRetrievalStats, RetrievalError};

/// Handle on a peer-to-peer network.
#[derive(Clone)]
pub struct PeerNetwork {
    discovery: Arc<dyn ProviderDiscovery>,
    exchange: Arc<dyn BlockExchange>,
    config: PeerConfig,
}

impl PeerNetwork {
    pub fn new(
        discovery: Arc<dyn ProviderDiscovery>,
        exchange: Arc<dyn BlockExchange>,
        config: PeerConfig,
    ) -> Self {
        Self {
            discovery,
            exchange,
            config,
        }
    }

    /// Build a network using the `[peer]` section of `config`.
    pub fn from_config(
        discovery: Arc<dyn ProviderDiscovery>,
        exchange: Arc<dyn BlockExchange>,
        config: &Config,
    ) -> Self {
        Self::new(discovery, exchange, config.peer.clone())
    }

    /// Connect to one provider of `cid` and fetch the whole DAG below it.
    pub async fn retrieve(
        &self,
        cid: &ContentId,
        progress: ProgressReporter,
        cancel: &CancellationToken,
    ) -> Result<PeerRetrievalStats, RetrievalError> {
        let provider = connect_first_provider(
            self.discovery.as_ref(),
            self.exchange.as_ref(),
            cid,
            self.config.max_providers,
            Duration::from_secs(self.config.discovery_timeout_secs),
            cancel,
        )
        .await?;

        info!(provider = %provider, "Starting peer-to-peer retrieval");

        let start = Instant::now();
        let counter = ByteCounter::new(progress);
        let summary = walk_dag(
            self.exchange.as_ref(),
            cid,
            self.config.max_concurrent_fetches,
            &counter,
            cancel,
        )
        .await?;

        info!(bytes = summary.leaf_bytes, blocks = summary.blocks, "Peer-to-peer retrieval succeeded");

        Ok(PeerRetrievalStats {
            provider,
            byte_size: summary.leaf_bytes,
            duration: start.elapsed(),
            blocks: summary.blocks,
        })
    }
}

impl std::fmt::Debug for PeerNetwork {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PeerNetwork")
            .field("discovery", &"<discovery>")
            .field("exchange", &"<exchange>")
            .field("config", &self.config)
            .finish()
    }
}
