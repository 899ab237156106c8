//! Retrieval lifecycle integration tests.
//!
//! These tests drive a full retrieval through the public API:
//! catalog lookup -> peer-to-peer attempt -> query fan-out -> ranking -> transfer

use std::sync::Arc;
use std::time::Duration;

use axum::routing::get;
use axum::Router;
use tokio_test::{assert_err, assert_ok};
use tokio_util::sync::CancellationToken;

use cidfetch_core::{
    load_config_from_str,
    testing::{fixtures, MockCatalog, MockMarketClient, MockPeerNetwork},
    CandidateCatalog, CandidateSelectionConfig, ContentId, DagNode, HttpCandidateCatalog,
    PeerNetwork, ProgressReporter, ProviderRecord, RetrievalError, RetrievalPath, RetrievalStats,
    Retriever,
};

/// Test helper wiring mocks into a retriever.
struct TestHarness {
    catalog: MockCatalog,
    market: Arc<MockMarketClient>,
    peers: Arc<MockPeerNetwork>,
}

impl TestHarness {
    fn new() -> Self {
        Self {
            catalog: MockCatalog::new(),
            market: Arc::new(MockMarketClient::new()),
            peers: Arc::new(MockPeerNetwork::new()),
        }
    }

    fn retriever(&self) -> Retriever {
        let config = load_config_from_str(
            "[peer]\ndiscovery_timeout_secs = 1\n\n[progress]\nenabled = false\n",
        )
        .expect("Failed to load config");
        let network = PeerNetwork::from_config(self.peers.clone(), self.peers.clone(), &config);

        Retriever::from_config(self.market.clone(), &config).with_peer_network(network)
    }

    async fn run(
        &self,
        selection: &CandidateSelectionConfig,
    ) -> Result<RetrievalStats, RetrievalError> {
        let cid = root();
        let candidates = self
            .catalog
            .candidates(&cid)
            .await
            .expect("Catalog lookup failed");

        self.retriever()
            .retrieve(&cid, None, &candidates, selection, &CancellationToken::new())
            .await
    }
}

fn root() -> ContentId {
    ContentId::parse(fixtures::ROOT_CID).unwrap()
}

fn prefer_peer() -> CandidateSelectionConfig {
    CandidateSelectionConfig {
        prefer_peer_to_peer: true,
        no_sort: false,
    }
}

#[tokio::test]
async fn test_market_retrieval_picks_cheapest_unsealed_candidate() {
    let harness = TestHarness::new();
    harness
        .catalog
        .set_candidates(
            fixtures::ROOT_CID,
            fixtures::candidates(&["f-sealed", "f-pricey", "f-cheap"]),
        )
        .await;
    harness
        .market
        .set_query_response("f-sealed", fixtures::ask(1_000, 0, 4096))
        .await;
    harness
        .market
        .set_query_response("f-pricey", fixtures::ask(0, 50, 4096))
        .await;
    harness
        .market
        .set_query_response("f-cheap", fixtures::ask(0, 2, 4096))
        .await;
    for provider in ["f-sealed", "f-pricey", "f-cheap"] {
        harness.market.set_transfer_bytes(provider, 4096).await;
    }

    let stats = assert_ok!(harness.run(&CandidateSelectionConfig::default()).await);

    match stats {
        RetrievalStats::Market(stats) => {
            assert_eq!(stats.provider.as_str(), "f-cheap");
            assert_eq!(stats.byte_size, 4096);
            assert_eq!(stats.root_cid, root());
        }
        other => panic!("expected market stats, got {other:?}"),
    }
    assert_eq!(harness.market.query_count().await, 3);
    assert_eq!(harness.market.retrieved_providers().await, vec!["f-cheap"]);
}

#[tokio::test]
async fn test_market_falls_through_failed_transfers() {
    let harness = TestHarness::new();
    harness
        .catalog
        .set_candidates(fixtures::ROOT_CID, fixtures::candidates(&["f01", "f02", "f03"]))
        .await;
    harness.market.set_query_response("f01", fixtures::ask(0, 1, 10)).await;
    harness.market.set_query_error("f02", "deadline exceeded").await;
    harness.market.set_query_response("f03", fixtures::ask(0, 3, 10)).await;
    harness.market.set_transfer_error("f01", "stream reset").await;
    harness.market.set_transfer_bytes("f03", 10).await;

    let stats = assert_ok!(harness.run(&CandidateSelectionConfig::default()).await);

    assert_eq!(stats.path(), RetrievalPath::Market);
    assert_eq!(harness.market.retrieved_providers().await, vec!["f01", "f03"]);
}

#[tokio::test]
async fn test_peer_retrieval_preferred_and_successful() {
    let harness = TestHarness::new();
    harness
        .catalog
        .set_candidates(fixtures::ROOT_CID, fixtures::candidates(&["f01"]))
        .await;
    harness
        .peers
        .set_providers(vec![ProviderRecord::default(), ProviderRecord::new("peer-a")])
        .await;
    harness
        .peers
        .add_block(
            fixtures::ROOT_CID,
            DagNode::branch(
                vec![
                    ContentId::parse("bafkone").unwrap(),
                    ContentId::parse("bafytwo").unwrap(),
                ],
                0,
            ),
        )
        .await;
    harness.peers.add_block("bafkone", DagNode::leaf(1024)).await;
    harness
        .peers
        .add_block(
            "bafytwo",
            DagNode::branch(vec![ContentId::parse("bafkone").unwrap()], 0),
        )
        .await;

    let stats = assert_ok!(harness.run(&prefer_peer()).await);

    assert_eq!(stats.path(), RetrievalPath::PeerToPeer);
    assert_eq!(stats.byte_size(), 1024);
    assert_eq!(harness.peers.fetch_count("bafkone").await, 1);
    assert_eq!(harness.market.query_count().await, 0);
}

#[tokio::test]
async fn test_peer_traversal_failure_falls_back_to_market() {
    let harness = TestHarness::new();
    harness
        .catalog
        .set_candidates(fixtures::ROOT_CID, fixtures::candidates(&["f01"]))
        .await;
    harness
        .peers
        .set_providers(vec![ProviderRecord::new("peer-a")])
        .await;
    // Root is announced but its block is missing.
    harness.market.set_query_response("f01", fixtures::ask(0, 1, 64)).await;
    harness.market.set_transfer_bytes("f01", 64).await;

    let stats = assert_ok!(harness.run(&prefer_peer()).await);

    assert_eq!(stats.path(), RetrievalPath::Market);
    assert_eq!(harness.peers.connect_attempts().await, vec!["peer-a"]);
}

#[tokio::test]
async fn test_both_paths_fail_with_combined_error() {
    let harness = TestHarness::new();
    harness.peers.set_discovery_pending(true).await;

    let err = assert_err!(harness.run(&prefer_peer()).await);

    assert!(matches!(err, RetrievalError::AllRetrievalAttemptsFailed { .. }));
    let causes = err.path_errors();
    assert_eq!(causes.len(), 2);
    assert!(matches!(causes[0], RetrievalError::NoReachableProvider));
    assert!(matches!(causes[1], RetrievalError::NoCandidatesProvided));
    assert_eq!(harness.catalog.lookups().await, vec![fixtures::ROOT_CID]);
}

#[tokio::test]
async fn test_cancellation_during_market_queries() {
    let harness = TestHarness::new();
    harness.market.set_query_delay(Duration::from_secs(30)).await;
    harness.market.set_query_response("f01", fixtures::ask(0, 1, 10)).await;

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let result = harness
        .retriever()
        .retrieve(
            &root(),
            None,
            &fixtures::candidates(&["f01"]),
            &CandidateSelectionConfig::default(),
            &cancel,
        )
        .await;

    assert!(matches!(result, Err(RetrievalError::Cancelled)));
    assert_eq!(harness.market.retrieve_count().await, 0);
}

#[tokio::test]
async fn test_http_catalog_feeds_market_retrieval() {
    let router = Router::new().route(
        "/{cid}",
        get(|| async {
            r#"[
                {"Miner": "f0100", "RootCid": {"/": "bafyroot"}, "DealID": 11},
                {"Miner": "f0200", "RootCid": {"/": "bafyroot"}, "DealID": 0}
            ]"#
        }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    let config = load_config_from_str(&format!(
        "[catalog]\nendpoint = \"http://{}\"\ntimeout_secs = 5\n",
        addr
    ))
    .unwrap();
    let catalog = HttpCandidateCatalog::new(config.catalog.as_ref().unwrap()).unwrap();
    let candidates = assert_ok!(catalog.candidates(&root()).await);
    assert_eq!(candidates.len(), 2);
    assert_eq!(candidates[0].deal_id, Some(11));
    assert_eq!(candidates[1].deal_id, None);

    let market = Arc::new(MockMarketClient::new());
    market.set_query_response("f0100", fixtures::ask(0, 9, 100)).await;
    market.set_query_response("f0200", fixtures::ask(0, 1, 100)).await;
    market.set_transfer_bytes("f0200", 100).await;

    let stats = Retriever::new(market.clone())
        .with_progress(ProgressReporter::disabled())
        .retrieve(
            &root(),
            None,
            &candidates,
            &CandidateSelectionConfig::default(),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(stats.byte_size(), 100);
    assert_eq!(market.retrieved_providers().await, vec!["f0200"]);
}
