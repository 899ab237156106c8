use serde::{Deserialize, Serialize};

use crate::retrieval::CandidateSelectionConfig;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    /// Candidate index service. Without it, market retrievals have no candidates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog: Option<CatalogConfig>,
    #[serde(default)]
    pub selection: CandidateSelectionConfig,
    #[serde(default)]
    pub peer: PeerConfig,
    #[serde(default)]
    pub progress: ProgressConfig,
}

/// Candidate index service configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CatalogConfig {
    /// Base URL; the CID is appended as the last path segment.
    pub endpoint: String,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_timeout() -> u64 {
    30
}

/// Peer-to-peer retrieval configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PeerConfig {
    /// How many providers discovery may yield for one CID (default: 20)
    #[serde(default = "default_max_providers")]
    pub max_providers: usize,
    /// Upper bound on finding a reachable provider, in seconds (default: 60)
    #[serde(default = "default_discovery_timeout")]
    pub discovery_timeout_secs: u64,
    /// Blocks fetched in parallel during traversal (default: 32)
    #[serde(default = "default_max_concurrent_fetches")]
    pub max_concurrent_fetches: usize,
}

impl Default for PeerConfig {
    fn default() -> Self {
        Self {
            max_providers: default_max_providers(),
            discovery_timeout_secs: default_discovery_timeout(),
            max_concurrent_fetches: default_max_concurrent_fetches(),
        }
    }
}

fn default_max_providers() -> usize {
    20
}

fn default_discovery_timeout() -> u64 {
    60
}

fn default_max_concurrent_fetches() -> usize {
    32
}

/// Progress line configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProgressConfig {
    /// Draw progress on stderr (default: true)
    #[serde(default = "default_progress_enabled")]
    pub enabled: bool,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            enabled: default_progress_enabled(),
        }
    }
}

fn default_progress_enabled() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert!(config.catalog.is_none());
        assert!(!config.selection.prefer_peer_to_peer);
        assert!(!config.selection.no_sort);
        assert_eq!(config.peer.max_providers, 20);
        assert_eq!(config.peer.discovery_timeout_secs, 60);
        assert_eq!(config.peer.max_concurrent_fetches, 32);
        assert!(config.progress.enabled);
    }

    #[test]
    fn test_deserialize_full_config() {
        let toml = r#"
[catalog]
endpoint = "https://index.example/candidates"

[selection]
prefer_peer_to_peer = true
no_sort = true

[peer]
max_providers = 5
discovery_timeout_secs = 10

[progress]
enabled = false
"#;
        let config: Config = toml::from_str(toml).unwrap();
        let catalog = config.catalog.as_ref().unwrap();
        assert_eq!(catalog.endpoint, "https://index.example/candidates");
        assert_eq!(catalog.timeout_secs, 30); // default
        assert!(config.selection.prefer_peer_to_peer);
        assert!(config.selection.no_sort);
        assert_eq!(config.peer.max_providers, 5);
        assert_eq!(config.peer.discovery_timeout_secs, 10);
        assert_eq!(config.peer.max_concurrent_fetches, 32); // default
        assert!(!config.progress.enabled);
    }

    #[test]
    fn test_catalog_requires_endpoint() {
        let toml = r#"
[catalog]
timeout_secs = 10
"#;
        let result: Result<Config, _> = toml::from_str(toml);
        assert!(result.is_err());
    }

    #[test]
    fn test_config_serializes_back_to_toml() {
        let config = Config {
            catalog: Some(CatalogConfig {
                endpoint: "http://localhost:8080".to_string(),
                timeout_secs: 15,
            }),
            ..Default::default()
        };
        let rendered = toml::to_string(&config).unwrap();
        assert!(rendered.contains("endpoint = \"http://localhost:8080\""));
        assert!(rendered.contains("max_providers = 20"));
    }
}
