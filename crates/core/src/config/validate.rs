use crate::catalog::parse_endpoint;

use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Catalog endpoint is an absolute http(s) URL and its timeout is not 0
/// - Peer limits and timeouts are not 0
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if let Some(catalog) = &config.catalog {
        parse_endpoint(&catalog.endpoint)
            .map_err(|e| ConfigError::ValidationError(e.to_string()))?;
        if catalog.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "catalog.timeout_secs cannot be 0".to_string(),
            ));
        }
    }

    if config.peer.max_providers == 0 {
        return Err(ConfigError::ValidationError(
            "peer.max_providers cannot be 0".to_string(),
        ));
    }
    if config.peer.max_concurrent_fetches == 0 {
        return Err(ConfigError::ValidationError(
            "peer.max_concurrent_fetches cannot be 0".to_string(),
        ));
    }
    if config.peer.discovery_timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "peer.discovery_timeout_secs cannot be 0".to_string(),
        ));
    }

    Ok(())
}
