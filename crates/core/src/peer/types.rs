//! Types for the peer-to-peer path.

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ids::{ContentId, PeerId};

/// Errors reported by the peer-to-peer stack.
#[derive(Debug, Error)]
pub enum PeerError {
    #[error("Failed to connect to provider {provider}: {message}")]
    Connect { provider: PeerId, message: String },

    #[error("Failed to fetch block {cid}: {message}")]
    Fetch { cid: ContentId, message: String },
}

/// A provider announced by discovery.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderRecord {
    /// Empty for placeholder records, which are skipped.
    pub id: PeerId,
    /// Known multiaddrs.
    #[serde(default)]
    pub addrs: Vec<String>,
}

impl ProviderRecord {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: PeerId::new(id),
            addrs: Vec::new(),
        }
    }
}

/// A fetched DAG node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DagNode {
    /// Children to visit next.
    pub links: Vec<ContentId>,
    /// Size reported for this node. Only counted when the node has no links.
    pub size: u64,
}

impl DagNode {
    pub fn leaf(size: u64) -> Self {
        Self {
            links: Vec::new(),
            size,
        }
    }

    pub fn branch(links: Vec<ContentId>, size: u64) -> Self {
        Self { links, size }
    }
}

/// Finds providers of a CID on the content-routing layer.
pub trait ProviderDiscovery: Send + Sync {
    /// Stream up to `max_providers` provider records for `cid`.
    ///
    /// Dropping the stream stops the search.
    fn find_providers(&self, cid: &ContentId, max_providers: usize)
        -> BoxStream<'static, ProviderRecord>;
}

/// Connects to providers and fetches blocks over the exchange protocol.
#[async_trait]
pub trait BlockExchange: Send + Sync {
    async fn connect(&self, provider: &ProviderRecord) -> Result<(), PeerError>;

    /// Fetch a block from any connected provider.
    async fn fetch(&self, cid: &ContentId) -> Result<DagNode, PeerError>;
}
