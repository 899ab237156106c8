pub mod catalog;
pub mod config;
pub mod ids;
pub mod market;
pub mod metrics;
pub mod peer;
pub mod progress;
pub mod retrieval;
pub mod testing;

pub use catalog::{CandidateCatalog, CatalogError, HttpCandidateCatalog, RetrievalCandidate};
pub use config::{
    load_config, load_config_from_str, validate_config, CatalogConfig, Config, ConfigError,
    PeerConfig, ProgressConfig,
};
pub use ids::{ContentId, IdError, PeerId, ProviderId, Selector};
pub use market::{
    CandidateQueryResult, MarketClient, MarketError, QueryResponse, QueryStatus,
    RetrievalProposal, TransferStats,
};
pub use peer::{BlockExchange, DagNode, PeerError, PeerNetwork, ProviderDiscovery, ProviderRecord};
pub use progress::ProgressReporter;
pub use retrieval::{
    average_bytes_per_second, CandidateSelectionConfig, MarketRetrievalStats,
    PeerRetrievalStats, RetrievalError, RetrievalPath, RetrievalStats, Retriever,
};
