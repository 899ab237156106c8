//! Mock peer-to-peer network for testing.

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::ids::ContentId;
use crate::peer::{BlockExchange, DagNode, PeerError, ProviderDiscovery, ProviderRecord};

/// Mock implementation of both ProviderDiscovery and BlockExchange.
///
/// Provides controllable behavior for testing:
/// - A fixed list of announced providers, or a discovery that never yields
/// - Per-provider connection failures
/// - An in-memory block store; missing blocks fail to fetch
/// - Fetch counts and peak fetch concurrency
#[derive(Debug)]
pub struct MockPeerNetwork {
    providers: Arc<RwLock<Vec<ProviderRecord>>>,
    discovery_pending: Arc<RwLock<bool>>,
    connect_failures: Arc<RwLock<HashSet<String>>>,
    connect_attempts: Arc<RwLock<Vec<String>>>,
    blocks: Arc<RwLock<HashMap<String, DagNode>>>,
    fetch_counts: Arc<RwLock<HashMap<String, usize>>>,
    fetch_latency: Duration,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl Default for MockPeerNetwork {
    fn default() -> Self {
        Self::new()
    }
}

impl MockPeerNetwork {
    pub fn new() -> Self {
        Self {
            providers: Arc::new(RwLock::new(Vec::new())),
            discovery_pending: Arc::new(RwLock::new(false)),
            connect_failures: Arc::new(RwLock::new(HashSet::new())),
            connect_attempts: Arc::new(RwLock::new(Vec::new())),
            blocks: Arc::new(RwLock::new(HashMap::new())),
            fetch_counts: Arc::new(RwLock::new(HashMap::new())),
            fetch_latency: Duration::from_millis(2),
            in_flight: AtomicUsize::new(0),
            peak_in_flight: AtomicUsize::new(0),
        }
    }

    /// Providers announced by discovery, in order.
    pub async fn set_providers(&self, providers: Vec<ProviderRecord>) {
        *self.providers.write().await = providers;
    }

    /// Make discovery hang without yielding any provider.
    pub async fn set_discovery_pending(&self, pending: bool) {
        *self.discovery_pending.write().await = pending;
    }

    /// Refuse connections to `provider`.
    pub async fn set_connect_failure(&self, provider: &str) {
        self.connect_failures
            .write()
            .await
            .insert(provider.to_string());
    }

    /// Store a block under `cid`.
    pub async fn add_block(&self, cid: &str, node: DagNode) {
        self.blocks.write().await.insert(cid.to_string(), node);
    }

    /// Providers a connection was attempted with, in order.
    pub async fn connect_attempts(&self) -> Vec<String> {
        self.connect_attempts.read().await.clone()
    }

    /// How often `cid` was fetched.
    pub async fn fetch_count(&self, cid: &str) -> usize {
        self.fetch_counts
            .read()
            .await
            .get(cid)
            .copied()
            .unwrap_or(0)
    }

    /// Highest number of fetches that were in flight at once.
    pub async fn max_concurrent_fetches(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }
}

impl ProviderDiscovery for MockPeerNetwork {
    fn find_providers(
        &self,
        _cid: &ContentId,
        max_providers: usize,
    ) -> BoxStream<'static, ProviderRecord> {
        let providers = self.providers.clone();
        let pending = self.discovery_pending.clone();

        stream::once(async move {
            if *pending.read().await {
                futures::future::pending::<()>().await;
            }
            let records = providers.read().await.clone();
            stream::iter(records.into_iter().take(max_providers))
        })
        .flatten()
        .boxed()
    }
}

#[async_trait]
impl BlockExchange for MockPeerNetwork {
    async fn connect(&self, provider: &ProviderRecord) -> Result<(), PeerError> {
        let id = provider.id.to_string();
        self.connect_attempts.write().await.push(id.clone());

        if self.connect_failures.read().await.contains(&id) {
            return Err(PeerError::Connect {
                provider: provider.id.clone(),
                message: "connection refused".to_string(),
            });
        }
        Ok(())
    }

    async fn fetch(&self, cid: &ContentId) -> Result<DagNode, PeerError> {
        *self
            .fetch_counts
            .write()
            .await
            .entry(cid.to_string())
            .or_insert(0) += 1;

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(self.fetch_latency).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        self.blocks
            .read()
            .await
            .get(cid.as_str())
            .cloned()
            .ok_or_else(|| PeerError::Fetch {
                cid: cid.clone(),
                message: "block not found".to_string(),
            })
    }
}
