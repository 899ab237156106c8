//! Testing utilities and mock implementations.
//!
//! Mocks stand in for the market client, the candidate catalog and the
//! peer-to-peer network so retrievals can be exercised end to end without a
//! real network.
//!
//! # Example
//!
//! ```rust,ignore
//! use cidfetch_core::testing::{fixtures, MockMarketClient};
//!
//! let market = MockMarketClient::new();
//! market.set_query_response("f01234", fixtures::ask(0, 1, 1024)).await;
//! market.set_transfer_bytes("f01234", 1024).await;
//! ```

mod mock_catalog;
mod mock_market;
mod mock_peer_network;

pub use mock_catalog::MockCatalog;
pub use mock_market::MockMarketClient;
pub use mock_peer_network::MockPeerNetwork;

/// Test fixtures and helper functions.
pub mod fixtures {
    use alloy_primitives::U256;

    use crate::catalog::RetrievalCandidate;
    use crate::ids::{ContentId, ProviderId};
    use crate::market::{CandidateQueryResult, QueryResponse};

    /// Root CID shared by fixture candidates.
    pub const ROOT_CID: &str = "bafyroot";

    /// An available ask with the given unseal price, price per byte and size.
    pub fn ask(unseal_price: u64, price_per_byte: u64, size: u64) -> QueryResponse {
        QueryResponse::available(size, U256::from(price_per_byte), U256::from(unseal_price))
    }

    /// A candidate for `provider` storing [`ROOT_CID`].
    pub fn candidate(provider: &str) -> RetrievalCandidate {
        RetrievalCandidate::new(
            ProviderId::parse(provider).expect("fixture provider id"),
            ContentId::parse(ROOT_CID).expect("fixture root cid"),
        )
    }

    /// One candidate per provider, in order.
    pub fn candidates(providers: &[&str]) -> Vec<RetrievalCandidate> {
        providers.iter().map(|p| candidate(p)).collect()
    }

    /// A queried candidate whose ask is built by [`ask`].
    pub fn query_result(
        provider: &str,
        unseal_price: u64,
        price_per_byte: u64,
        size: u64,
    ) -> CandidateQueryResult {
        CandidateQueryResult {
            candidate: candidate(provider),
            response: ask(unseal_price, price_per_byte, size),
        }
    }
}
