//! Prometheus metrics for retrieval.
//!
//! This module provides metrics for:
//! - Retrieval attempts per path (peer-to-peer, market)
//! - Catalog lookups
//! - The market query phase and per-candidate transfers
//! - Bytes moved and time spent

use once_cell::sync::Lazy;
use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder};

/// Registry holding every metric in this module.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    for metric in all_metrics() {
        // Only fails on duplicate registration, which cannot happen here.
        let _ = registry.register(metric);
    }
    registry
});

// =============================================================================
// Retrieval attempts
// =============================================================================

/// Retrieval attempts by path and result.
pub static RETRIEVAL_ATTEMPTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "cidfetch_retrieval_attempts_total",
            "Total retrieval attempts",
        ),
        &["path", "result"], // path: "peer", "market"; result: "success", "failure"
    )
    .unwrap()
});

/// Retrieval duration in seconds for successful attempts.
pub static RETRIEVAL_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "cidfetch_retrieval_duration_seconds",
            "Duration of successful retrievals",
        )
        .buckets(vec![0.1, 0.5, 1.0, 5.0, 15.0, 60.0, 300.0, 900.0, 3600.0]),
        &["path"],
    )
    .unwrap()
});

/// Bytes retrieved by path.
pub static BYTES_RETRIEVED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("cidfetch_bytes_retrieved_total", "Total bytes retrieved"),
        &["path"],
    )
    .unwrap()
});

// =============================================================================
// Catalog
// =============================================================================

/// Catalog lookup outcomes.
pub static CATALOG_LOOKUPS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "cidfetch_catalog_lookups_total",
            "Total candidate lookups against the catalog",
        ),
        &["result"], // "success", "failure"
    )
    .unwrap()
});

// =============================================================================
// Market
// =============================================================================

/// Candidate query outcomes.
pub static CANDIDATE_QUERIES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "cidfetch_candidate_queries_total",
            "Total retrieval queries sent to candidates",
        ),
        &["result"], // "success", "failure"
    )
    .unwrap()
});

/// Per-candidate transfer outcomes.
pub static CANDIDATE_TRANSFERS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "cidfetch_candidate_transfers_total",
            "Total transfer attempts against candidates",
        ),
        &["result"], // "success", "proposal_failed", "transfer_failed"
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(RETRIEVAL_ATTEMPTS.clone()),
        Box::new(RETRIEVAL_DURATION.clone()),
        Box::new(BYTES_RETRIEVED.clone()),
        Box::new(CATALOG_LOOKUPS.clone()),
        Box::new(CANDIDATE_QUERIES.clone()),
        Box::new(CANDIDATE_TRANSFERS.clone()),
    ]
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if encoder.encode(&metric_families, &mut buffer).is_err() {
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_includes_touched_metrics() {
        CANDIDATE_QUERIES.with_label_values(&["success"]).inc();
        RETRIEVAL_ATTEMPTS.with_label_values(&["market", "failure"]).inc();
        CATALOG_LOOKUPS.with_label_values(&["failure"]).inc();

        let text = encode_metrics();
        assert!(text.contains("cidfetch_candidate_queries_total"));
        assert!(text.contains("cidfetch_retrieval_attempts_total"));
        assert!(text.contains("cidfetch_catalog_lookups_total"));
    }
}
