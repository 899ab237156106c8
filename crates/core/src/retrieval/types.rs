//! Types for the retrieval coordinator.

use std::fmt;
use std::time::Duration;

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

use crate::ids::{ContentId, PeerId, ProviderId};
use crate::market::TransferStats;

/// How candidates are chosen for one retrieval.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateSelectionConfig {
    /// Try the peer-to-peer network before paying for a market retrieval.
    #[serde(default)]
    pub prefer_peer_to_peer: bool,
    /// Try market candidates exactly in the order given.
    #[serde(default)]
    pub no_sort: bool,
}

/// Which path produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetrievalPath {
    PeerToPeer,
    Market,
}

impl RetrievalPath {
    /// Label used in logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            RetrievalPath::PeerToPeer => "peer",
            RetrievalPath::Market => "market",
        }
    }
}

impl fmt::Display for RetrievalPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a paid market transfer.
#[derive(Debug, Clone)]
pub struct MarketRetrievalStats {
    pub provider: ProviderId,
    pub root_cid: ContentId,
    pub byte_size: u64,
    pub duration: Duration,
    /// Total paid to the provider, in attoFIL.
    pub total_payment: U256,
    pub num_payments: u32,
    pub ask_price: U256,
}

impl MarketRetrievalStats {
    pub fn from_transfer(root_cid: ContentId, stats: TransferStats) -> Self {
        Self {
            provider: stats.provider,
            root_cid,
            byte_size: stats.size,
            duration: stats.duration,
            total_payment: stats.total_payment,
            num_payments: stats.num_payments,
            ask_price: stats.ask_price,
        }
    }
}

/// Outcome of a peer-to-peer DAG pull.
#[derive(Debug, Clone)]
pub struct PeerRetrievalStats {
    /// Provider the first connection went to.
    pub provider: PeerId,
    /// Sum of leaf block sizes.
    pub byte_size: u64,
    pub duration: Duration,
    /// Number of distinct blocks fetched.
    pub blocks: u64,
}

/// Stats of a successful retrieval from either path.
#[derive(Debug, Clone)]
pub enum RetrievalStats {
    Market(MarketRetrievalStats),
    PeerToPeer(PeerRetrievalStats),
}

impl RetrievalStats {
    pub fn path(&self) -> RetrievalPath {
        match self {
            RetrievalStats::Market(_) => RetrievalPath::Market,
            RetrievalStats::PeerToPeer(_) => RetrievalPath::PeerToPeer,
        }
    }

    pub fn byte_size(&self) -> u64 {
        match self {
            RetrievalStats::Market(stats) => stats.byte_size,
            RetrievalStats::PeerToPeer(stats) => stats.byte_size,
        }
    }

    pub fn duration(&self) -> Duration {
        match self {
            RetrievalStats::Market(stats) => stats.duration,
            RetrievalStats::PeerToPeer(stats) => stats.duration,
        }
    }

    /// Average throughput; zero when no time elapsed.
    pub fn average_bytes_per_second(&self) -> u64 {
        average_bytes_per_second(self.byte_size(), self.duration())
    }
}

/// `bytes / duration` in whole bytes per second, zero for a zero duration.
pub fn average_bytes_per_second(bytes: u64, duration: Duration) -> u64 {
    let nanos = duration.as_nanos();
    if nanos == 0 {
        return 0;
    }
    let rate = u128::from(bytes) * 1_000_000_000 / nanos;
    u64::try_from(rate).unwrap_or(u64::MAX)
}
