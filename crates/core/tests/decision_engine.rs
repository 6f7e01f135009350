//! Decision engine integration tests.
//!
//! These tests drive the engine end to end against a scripted transport:
//! - Tier ordering and early stop once a tier yields an accepted release
//! - Exhaustion causes (transport failures vs nothing acceptable)
//! - Partial failures within a tier
//! - Paging limits and the accepted-result cap
//! - Cancellation before and during a tier
//! - Requests queueing behind the per-indexer rate limit

use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use tokio_util::sync::CancellationToken;

use quarry_core::{
    config::IndexerConfig,
    criteria::{EpisodeInfo, SearchCriteria, SeriesRef},
    decision::{DecisionEngine, EngineSettings, ExhaustionCause, SearchState, SearchStatus},
    indexer::{create_provider, RateLimiterPool, TransportError},
    profile::RejectionReason,
    testing::{fixtures, fixtures::FeedItem, MockTransport, RequestMatch},
    SearchCriteriaBuilder, SearchIntent, SearchTarget,
};

/// Test helper wiring an engine to a mock transport.
struct TestHarness {
    engine: DecisionEngine,
    transport: Arc<MockTransport>,
}

impl TestHarness {
    fn new(indexers: Vec<IndexerConfig>) -> Self {
        Self::build(indexers, false, None)
    }

    /// Rate limits taken from the indexer configs.
    fn rate_limited(indexers: Vec<IndexerConfig>) -> Self {
        Self::build(indexers, true, None)
    }

    /// Keep at most `max_results` accepted candidates.
    fn capped(indexers: Vec<IndexerConfig>, max_results: usize) -> Self {
        Self::build(indexers, false, Some(max_results))
    }

    fn build(indexers: Vec<IndexerConfig>, rate_limited: bool, max_results: Option<usize>) -> Self {
        let transport = Arc::new(MockTransport::new());
        let rate_limiter = if rate_limited {
            RateLimiterPool::new(&indexers)
        } else {
            RateLimiterPool::empty()
        };
        let engine = DecisionEngine::new(
            indexers.iter().map(create_provider).collect(),
            transport.clone(),
            Arc::new(rate_limiter),
            EngineSettings {
                request_timeout: Duration::from_secs(30),
                max_results,
            },
        );
        Self { engine, transport }
    }

    async fn search(&self, criteria: &[SearchCriteria]) -> quarry_core::SearchReport {
        self.engine
            .search(criteria, &fixtures::profile_set(), &CancellationToken::new())
            .await
    }
}

fn season_criteria(episodes: u32) -> Vec<SearchCriteria> {
    let target = SearchTarget::Season {
        series: SeriesRef::new("Some Show"),
        season: 2,
        episodes: (1..=episodes)
            .map(|episode| EpisodeInfo {
                season: 2,
                episode,
                air_date: None,
                has_file: false,
            })
            .collect(),
    };
    SearchCriteriaBuilder::new(fixtures::fixed_time()).build(
        &target,
        &SearchIntent::Manual,
        &fixtures::profile_set(),
    )
}

fn movie_criteria() -> Vec<SearchCriteria> {
    let target = SearchTarget::Movie {
        title: "The Movie".to_string(),
        year: Some(2020),
        imdb_id: Some("tt0123456".to_string()),
    };
    SearchCriteriaBuilder::new(fixtures::fixed_time()).build(
        &target,
        &SearchIntent::Manual,
        &fixtures::profile_set(),
    )
}

fn feed(titles: &[&str]) -> String {
    let items: Vec<_> = titles.iter().map(|t| FeedItem::new(t)).collect();
    fixtures::newznab_feed(&items)
}

// =============================================================================
// Tier ordering
// =============================================================================

#[tokio::test]
async fn test_empty_pack_tier_falls_back_to_episodes() {
    let harness = TestHarness::new(vec![fixtures::newznab_indexer("geek")]);
    harness
        .transport
        .respond(
            RequestMatch::param("ep", "1"),
            feed(&["Some.Show.S02E01.1080p.WEB-DL-GRP"]),
        )
        .await;
    harness
        .transport
        .respond(
            RequestMatch::param("ep", "2"),
            feed(&["Some.Show.S02E02.720p.HDTV-GRP"]),
        )
        .await;
    harness.transport.respond(RequestMatch::Any, feed(&[])).await;

    let criteria = season_criteria(2);
    assert_eq!(criteria.len(), 3);

    let report = harness.search(&criteria).await;

    assert_eq!(report.status, SearchStatus::Satisfied);
    assert_eq!(report.tiers_fetched, 2);
    assert_eq!(report.accepted.len(), 2);
    assert!(report.accepted.iter().all(|d| d.tier == 1));
    // WEB-DL 1080p ranks above HDTV 720p in the profile.
    assert_eq!(report.accepted[0].item.title, "Some.Show.S02E01.1080p.WEB-DL-GRP");
    assert_eq!(
        report.transitions,
        vec![
            SearchState::Pending,
            SearchState::FetchingTier(0),
            SearchState::Parsing(0),
            SearchState::Scoring(0),
            SearchState::FetchingTier(1),
            SearchState::Parsing(1),
            SearchState::Scoring(1),
            SearchState::Satisfied,
        ]
    );

    let requests = harness.transport.recorded_requests().await;
    assert_eq!(requests.len(), 3);
    // The pack request goes out first and carries no episode number.
    assert_eq!(requests[0].request.param("season"), Some("2"));
    assert_eq!(requests[0].request.param("ep"), None);
}

#[tokio::test]
async fn test_accepted_pack_skips_episode_tier() {
    let harness = TestHarness::new(vec![fixtures::newznab_indexer("geek")]);
    harness
        .transport
        .respond(RequestMatch::Any, feed(&["Some.Show.S02.1080p.WEB-DL-GRP"]))
        .await;

    let report = harness.search(&season_criteria(3)).await;

    assert!(report.is_satisfied());
    assert_eq!(report.tiers_fetched, 1);
    assert_eq!(harness.transport.request_count().await, 1);
    assert_eq!(
        report.best().map(|d| d.item.title.as_str()),
        Some("Some.Show.S02.1080p.WEB-DL-GRP")
    );
}

#[tokio::test]
async fn test_mismatched_pack_results_do_not_stop_search() {
    let harness = TestHarness::new(vec![fixtures::newznab_indexer("geek")]);
    // The pack query only turns up single episodes, which are not the pack.
    harness
        .transport
        .respond(
            RequestMatch::param("ep", "1"),
            feed(&["Some.Show.S02E01.1080p.WEB-DL-GRP"]),
        )
        .await;
    harness
        .transport
        .respond(RequestMatch::Any, feed(&["Some.Show.S02E01.1080p.WEB-DL-GRP"]))
        .await;

    let report = harness.search(&season_criteria(2)).await;

    assert!(report.is_satisfied());
    assert_eq!(report.tiers_fetched, 2);
    assert_eq!(
        report.rejection_summary.get(&RejectionReason::TargetMismatch),
        Some(&2)
    );
    let best = report.best().unwrap();
    assert_eq!(best.tier, 1);
    assert_eq!(best.criteria_index, Some(1));
}

#[tokio::test]
async fn test_id_tier_runs_before_text_tier() {
    let mut indexer = fixtures::newznab_indexer("geek");
    indexer.supports_movie_ids = true;
    let harness = TestHarness::new(vec![indexer]);
    harness
        .transport
        .respond(RequestMatch::param("imdbid", "0123456"), feed(&[]))
        .await;
    harness
        .transport
        .respond(RequestMatch::Any, feed(&["The.Movie.2020.1080p.BluRay.x264-GRP"]))
        .await;

    let report = harness.search(&movie_criteria()).await;

    assert!(report.is_satisfied());
    let requests = harness.transport.recorded_requests().await;
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].request.param("imdbid"), Some("0123456"));
    assert_eq!(requests[1].request.param("q"), Some("The Movie 2020"));
}

// =============================================================================
// Exhaustion
// =============================================================================

#[tokio::test]
async fn test_all_requests_failed() {
    let harness = TestHarness::new(vec![
        fixtures::newznab_indexer("one"),
        fixtures::torznab_indexer("two"),
    ]);
    harness
        .transport
        .fail(RequestMatch::indexer("one"), TransportError::Timeout)
        .await;
    harness
        .transport
        .respond_status(RequestMatch::indexer("two"), 503, "maintenance")
        .await;

    let report = harness.search(&movie_criteria()).await;

    assert_eq!(
        report.status,
        SearchStatus::Exhausted(ExhaustionCause::AllTransportFailed)
    );
    assert_eq!(report.requests_issued, 2);
    let mut reasons: Vec<_> = report
        .request_failures
        .iter()
        .map(|f| f.reason.as_str())
        .collect();
    reasons.sort();
    assert_eq!(reasons, vec!["http_status", "timeout"]);
    // The API key never leaks into the report.
    assert!(report
        .request_failures
        .iter()
        .all(|f| !f.url.contains("one-key") && !f.url.contains("two-key")));
}

#[tokio::test]
async fn test_nothing_acceptable_is_not_a_transport_failure() {
    let harness = TestHarness::new(vec![fixtures::newznab_indexer("geek")]);
    harness
        .transport
        .respond(
            RequestMatch::Any,
            feed(&[
                "The.Movie.2020.DVDRip.XviD-GRP",
                "The.Movie.2020.German.1080p.BluRay.x264-GRP",
            ]),
        )
        .await;

    let report = harness.search(&movie_criteria()).await;

    assert_eq!(
        report.status,
        SearchStatus::Exhausted(ExhaustionCause::NoAcceptedCandidates)
    );
    assert!(report.request_failures.is_empty());
    assert_eq!(report.rejected.len(), 2);
    let codes = report.rejection_codes();
    assert!(codes.contains(&"quality_not_allowed"));
    assert!(codes.contains(&"language_not_allowed"));
}

#[tokio::test]
async fn test_indexer_error_document_is_a_failure() {
    let harness = TestHarness::new(vec![fixtures::newznab_indexer("geek")]);
    harness
        .transport
        .respond(
            RequestMatch::Any,
            fixtures::newznab_error(100, "Incorrect user credentials"),
        )
        .await;

    let report = harness.search(&movie_criteria()).await;

    assert_eq!(
        report.status,
        SearchStatus::Exhausted(ExhaustionCause::AllTransportFailed)
    );
    assert_eq!(report.request_failures[0].reason, "invalid_api_key");
}

// =============================================================================
// Partial failure
// =============================================================================

#[tokio::test]
async fn test_failed_indexer_does_not_abort_tier() {
    let harness = TestHarness::new(vec![
        fixtures::newznab_indexer("broken"),
        fixtures::newznab_indexer("good"),
    ]);
    harness
        .transport
        .fail(
            RequestMatch::indexer("broken"),
            TransportError::ConnectionFailed("refused".to_string()),
        )
        .await;
    harness
        .transport
        .respond(
            RequestMatch::indexer("good"),
            feed(&["The.Movie.2020.1080p.BluRay.x264-GRP"]),
        )
        .await;

    let report = harness.search(&movie_criteria()).await;

    assert!(report.is_satisfied());
    assert_eq!(report.accepted.len(), 1);
    assert_eq!(report.request_failures.len(), 1);
    assert_eq!(report.request_failures[0].indexer, "broken");
    assert_eq!(report.request_failures[0].reason, "connection_failed");
}

#[tokio::test]
async fn test_duplicates_across_indexers_collapse_by_guid() {
    let harness = TestHarness::new(vec![
        fixtures::newznab_indexer("one"),
        fixtures::newznab_indexer("two"),
    ]);
    harness
        .transport
        .respond(
            RequestMatch::Any,
            feed(&["The.Movie.2020.1080p.BluRay.x264-GRP"]),
        )
        .await;

    let report = harness.search(&movie_criteria()).await;

    assert_eq!(harness.transport.request_count().await, 2);
    assert_eq!(report.accepted.len(), 1);
}

// =============================================================================
// Result cap
// =============================================================================

#[tokio::test]
async fn test_result_cap_keeps_best_candidate() {
    let harness = TestHarness::capped(vec![fixtures::newznab_indexer("geek")], 1);
    harness
        .transport
        .respond(
            RequestMatch::Any,
            feed(&[
                "The.Movie.2020.1080p.WEB-DL-GRP",
                "The.Movie.2020.1080p.BluRay.x264-GRP",
            ]),
        )
        .await;

    let report = harness.search(&movie_criteria()).await;

    assert_eq!(report.status, SearchStatus::Satisfied);
    assert_eq!(report.accepted.len(), 1);
    assert_eq!(
        report.best().map(|d| d.item.title.as_str()),
        Some("The.Movie.2020.1080p.BluRay.x264-GRP")
    );
    assert!(report.rejected.is_empty());
}

#[tokio::test]
async fn test_zero_result_cap_still_satisfies() {
    let harness = TestHarness::capped(vec![fixtures::newznab_indexer("geek")], 0);
    harness
        .transport
        .respond(
            RequestMatch::Any,
            feed(&["The.Movie.2020.1080p.BluRay.x264-GRP"]),
        )
        .await;

    let report = harness.search(&movie_criteria()).await;

    assert_eq!(report.status, SearchStatus::Satisfied);
    assert_eq!(report.accepted.len(), 1);
    assert_eq!(report.transitions.last(), Some(&SearchState::Satisfied));
}

// =============================================================================
// Paging
// =============================================================================

#[tokio::test]
async fn test_paging_stops_at_max_pages() {
    let mut indexer = fixtures::newznab_indexer("geek");
    indexer.page_size = 2;
    indexer.max_pages = 3;
    let harness = TestHarness::new(vec![indexer]);
    for offset in ["0", "2", "4", "6"] {
        harness
            .transport
            .respond(
                RequestMatch::param("offset", offset),
                feed(&[
                    format!("Other.Film.{}.A.2020.1080p.BluRay-GRP", offset).as_str(),
                    format!("Other.Film.{}.B.2020.1080p.BluRay-GRP", offset).as_str(),
                ]),
            )
            .await;
    }

    let report = harness.search(&movie_criteria()).await;

    assert_eq!(harness.transport.request_count().await, 3);
    assert_eq!(report.requests_issued, 3);
    assert_eq!(report.rejected.len(), 6);
    assert_eq!(
        report.status,
        SearchStatus::Exhausted(ExhaustionCause::NoAcceptedCandidates)
    );
}

#[tokio::test]
async fn test_short_page_stops_paging() {
    let mut indexer = fixtures::newznab_indexer("geek");
    indexer.page_size = 2;
    indexer.max_pages = 5;
    let harness = TestHarness::new(vec![indexer]);
    harness
        .transport
        .respond(
            RequestMatch::param("offset", "0"),
            feed(&[
                "Other.Film.A.2020.1080p.BluRay-GRP",
                "Other.Film.B.2020.1080p.BluRay-GRP",
            ]),
        )
        .await;
    harness
        .transport
        .respond(
            RequestMatch::param("offset", "2"),
            feed(&["Other.Film.C.2020.1080p.BluRay-GRP"]),
        )
        .await;

    harness.search(&movie_criteria()).await;

    assert_eq!(harness.transport.request_count().await, 2);
}

// =============================================================================
// Cancellation
// =============================================================================

#[tokio::test]
async fn test_cancelled_before_start() {
    let harness = TestHarness::new(vec![fixtures::newznab_indexer("geek")]);
    let cancel = CancellationToken::new();
    cancel.cancel();

    let report = harness
        .engine
        .search(&movie_criteria(), &fixtures::profile_set(), &cancel)
        .await;

    assert_eq!(report.status, SearchStatus::Cancelled);
    assert_eq!(harness.transport.request_count().await, 0);
    assert_eq!(
        report.transitions,
        vec![SearchState::Pending, SearchState::Cancelled]
    );
}

#[tokio::test(start_paused = true)]
async fn test_cancel_mid_tier_does_not_wait_for_slow_indexer() {
    let harness = TestHarness::new(vec![
        fixtures::newznab_indexer("fast"),
        fixtures::newznab_indexer("slow"),
    ]);
    harness
        .transport
        .respond_after(
            RequestMatch::indexer("slow"),
            Duration::from_secs(20),
            feed(&["The.Movie.2020.1080p.BluRay.x264-SLOW"]),
        )
        .await;
    harness
        .transport
        .respond(
            RequestMatch::indexer("fast"),
            feed(&["The.Movie.2020.1080p.BluRay.x264-FAST"]),
        )
        .await;

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(1)).await;
        trigger.cancel();
    });

    let start = tokio::time::Instant::now();
    let report = harness
        .engine
        .search(&movie_criteria(), &fixtures::profile_set(), &cancel)
        .await;

    assert!(start.elapsed() < Duration::from_secs(20));
    assert_eq!(report.status, SearchStatus::Cancelled);
    // Results already received from the fast indexer are discarded too.
    assert!(report.accepted.is_empty());
    assert_eq!(report.tiers_fetched, 0);
    assert_eq!(report.transitions.last(), Some(&SearchState::Cancelled));
}

// =============================================================================
// Rate limiting
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_rate_limited_requests_queue() {
    let mut indexer = fixtures::newznab_indexer("geek");
    indexer.rate_limit_rpm = 1;
    indexer.page_size = 1;
    indexer.max_pages = 3;
    let harness = TestHarness::rate_limited(vec![indexer]);
    for (offset, letter) in [("0", "A"), ("1", "B"), ("2", "C")] {
        harness
            .transport
            .respond(
                RequestMatch::param("offset", offset),
                feed(&[format!("Other.Film.{}.2020.1080p.BluRay-GRP", letter).as_str()]),
            )
            .await;
    }

    let report = harness.search(&movie_criteria()).await;

    // Every page was issued: queued, never dropped.
    assert!(report.request_failures.is_empty());
    let requests = harness.transport.recorded_requests().await;
    assert_eq!(requests.len(), 3);
    for pair in requests.windows(2) {
        let gap = pair[1].started_at.duration_since(pair[0].started_at);
        assert!(gap >= Duration::from_secs(59), "gap was {:?}", gap);
    }
}

#[tokio::test]
async fn test_rss_sync_scores_without_target() {
    let harness = TestHarness::new(vec![fixtures::newznab_indexer("geek")]);
    harness
        .transport
        .respond(
            RequestMatch::param("t", "search"),
            feed(&[
                "Any.Show.S01E01.1080p.WEB-DL-GRP",
                "Any.Movie.2021.DVDRip.XviD-GRP",
            ]),
        )
        .await;

    let report = harness
        .engine
        .rss_sync(&fixtures::profile_set(), &CancellationToken::new())
        .await;

    assert!(report.is_satisfied());
    assert_eq!(report.accepted.len(), 1);
    assert_eq!(report.accepted[0].criteria_index, None);
    assert_eq!(report.rejected.len(), 1);
}

#[test]
fn test_criteria_fixture_dates() {
    // Season criteria are built against the fixture clock.
    let criteria = season_criteria(2);
    assert_eq!(
        criteria[0].as_of,
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    );
}
