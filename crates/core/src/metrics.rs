//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Indexer requests (results, durations, queueing behind rate limits)
//! - Parsing and scoring (releases parsed, decisions)
//! - Searches (terminal status, tiers fetched)

use once_cell::sync::Lazy;
use prometheus::{Histogram, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Indexer Requests
// =============================================================================

/// Indexer requests total by indexer and result.
pub static INDEXER_REQUESTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("quarry_indexer_requests_total", "Total indexer requests"),
        &["indexer", "result"], // result: "success" or a failure reason code
    )
    .unwrap()
});

/// Indexer request duration in seconds.
pub static INDEXER_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "quarry_indexer_request_duration_seconds",
            "Duration of indexer requests",
        )
        .buckets(vec![0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]),
        &["indexer"],
    )
    .unwrap()
});

/// Time spent queued behind the per-indexer rate limit.
pub static RATE_LIMIT_WAIT: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "quarry_rate_limit_wait_seconds",
            "Time requests waited for a rate limit token",
        )
        .buckets(vec![0.0, 0.5, 1.0, 5.0, 10.0, 30.0, 60.0]),
        &["indexer"],
    )
    .unwrap()
});

// =============================================================================
// Parsing & Scoring
// =============================================================================

/// Release titles parsed.
pub static RELEASES_PARSED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("quarry_releases_parsed_total", "Total release titles parsed").unwrap()
});

/// Decisions by result.
pub static DECISIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("quarry_decisions_total", "Total release decisions"),
        &["result"], // "accepted" or the first rejection reason code
    )
    .unwrap()
});

// =============================================================================
// Searches
// =============================================================================

/// Searches by terminal status.
pub static SEARCHES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("quarry_searches_total", "Total searches by terminal status"),
        &["kind", "status"], // kind: "search", "rss"
    )
    .unwrap()
});

/// Tiers fetched per search.
pub static TIERS_FETCHED: Lazy<Histogram> = Lazy::new(|| {
    Histogram::with_opts(
        HistogramOpts::new("quarry_tiers_fetched", "Number of tiers fetched per search")
            .buckets(vec![0.0, 1.0, 2.0, 3.0, 4.0, 6.0, 8.0]),
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Indexer requests
        Box::new(INDEXER_REQUESTS.clone()),
        Box::new(INDEXER_REQUEST_DURATION.clone()),
        Box::new(RATE_LIMIT_WAIT.clone()),
        // Parsing & scoring
        Box::new(RELEASES_PARSED.clone()),
        Box::new(DECISIONS.clone()),
        // Searches
        Box::new(SEARCHES.clone()),
        Box::new(TIERS_FETCHED.clone()),
    ]
}
