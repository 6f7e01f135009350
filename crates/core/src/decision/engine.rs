//! Tiered search orchestration.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::{Config, EngineConfig};
use crate::criteria::SearchCriteria;
use crate::indexer::{
    create_provider, IndexerError, IndexerProvider, PageableRequest, RateLimiterPool,
    ReleaseItem, Transport, TransportError,
};
use crate::metrics;
use crate::parser::TitleParser;
use crate::profile::{Decision, ProfileMatcher, ProfileSet};

use super::specs::{check_target, check_upgrade};
use super::types::{
    ExhaustionCause, ReleaseDecision, RequestFailure, SearchReport, SearchState, SearchStatus,
};

/// Engine tunables.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Timeout applied to each request independently.
    pub request_timeout: Duration,
    /// Keep at most this many accepted candidates.
    pub max_results: Option<usize>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self::from(&EngineConfig::default())
    }
}

impl From<&EngineConfig> for EngineSettings {
    fn from(config: &EngineConfig) -> Self {
        Self {
            request_timeout: Duration::from_secs(config.request_timeout_secs),
            max_results: config.max_results_per_search,
        }
    }
}

/// A pageable request bound to the provider that parses it.
struct PlannedRequest {
    provider: Arc<dyn IndexerProvider>,
    request: PageableRequest,
    criteria_index: Option<usize>,
}

struct PlannedTier {
    label: String,
    requests: Vec<PlannedRequest>,
}

/// What one pageable request produced.
#[derive(Default)]
struct FetchOutcome {
    items: Vec<ReleaseItem>,
    failures: Vec<RequestFailure>,
    issued: usize,
    succeeded: usize,
}

/// Runs searches: fetches tiers, parses titles, scores and ranks releases.
pub struct DecisionEngine {
    providers: Vec<Arc<dyn IndexerProvider>>,
    transport: Arc<dyn Transport>,
    rate_limiter: Arc<RateLimiterPool>,
    settings: EngineSettings,
}

impl DecisionEngine {
    pub fn new(
        providers: Vec<Arc<dyn IndexerProvider>>,
        transport: Arc<dyn Transport>,
        rate_limiter: Arc<RateLimiterPool>,
        settings: EngineSettings,
    ) -> Self {
        Self {
            providers,
            transport,
            rate_limiter,
            settings,
        }
    }

    /// Build providers and rate limits from configuration.
    pub fn from_config(config: &Config, transport: Arc<dyn Transport>) -> Self {
        let providers = config.indexers.iter().map(create_provider).collect();
        let rate_limiter = Arc::new(RateLimiterPool::new(&config.indexers));
        Self::new(
            providers,
            transport,
            rate_limiter,
            EngineSettings::from(&config.engine),
        )
    }

    pub fn providers(&self) -> &[Arc<dyn IndexerProvider>] {
        &self.providers
    }

    /// Search for the given criteria.
    ///
    /// Criteria are grouped by their `tier`; each group expands into the
    /// providers' request tiers. Tiers run in order and the search stops at
    /// the first tier that yields an accepted candidate.
    pub async fn search(
        &self,
        criteria: &[SearchCriteria],
        profiles: &ProfileSet,
        cancel: &CancellationToken,
    ) -> SearchReport {
        let tiers = self.plan_search(criteria);
        let report = self
            .run(&tiers, Some(criteria), profiles, cancel)
            .await;
        metrics::SEARCHES
            .with_label_values(&["search", report.status.code()])
            .inc();
        report
    }

    /// Fetch and score the recent releases of every RSS-capable provider.
    pub async fn rss_sync(&self, profiles: &ProfileSet, cancel: &CancellationToken) -> SearchReport {
        let mut tiers: Vec<PlannedTier> = Vec::new();
        for provider in &self.providers {
            merge_chain(&mut tiers, provider, provider.recent_requests().into_tiers(), None);
        }
        let report = self.run(&tiers, None, profiles, cancel).await;
        metrics::SEARCHES
            .with_label_values(&["rss", report.status.code()])
            .inc();
        report
    }

    /// Score already-fetched releases, best first.
    ///
    /// With `criteria`, target and upgrade checks apply as in a search.
    pub fn evaluate(
        &self,
        items: Vec<ReleaseItem>,
        criteria: Option<&SearchCriteria>,
        profiles: &ProfileSet,
    ) -> Vec<ReleaseDecision> {
        let parser = TitleParser::standard();
        let mut decisions: Vec<ReleaseDecision> = items
            .into_iter()
            .map(|item| {
                let parsed = parser.parse(&item.title);
                metrics::RELEASES_PARSED.inc();
                let decision = score(&parsed, criteria, profiles);
                ReleaseDecision {
                    item,
                    parsed,
                    decision,
                    criteria_index: criteria.map(|_| 0),
                    tier: 0,
                }
            })
            .collect();
        decisions.sort_by(compare_decisions);
        decisions
    }

    fn plan_search(&self, criteria: &[SearchCriteria]) -> Vec<PlannedTier> {
        let mut groups: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for (index, c) in criteria.iter().enumerate() {
            groups.entry(c.tier).or_default().push(index);
        }

        let mut planned = Vec::new();
        for indexes in groups.into_values() {
            let mut group: Vec<PlannedTier> = Vec::new();
            for index in indexes {
                for provider in &self.providers {
                    let chain = provider.search_requests(&criteria[index]);
                    merge_chain(&mut group, provider, chain.into_tiers(), Some(index));
                }
            }
            planned.extend(group);
        }
        planned
    }

    async fn run(
        &self,
        tiers: &[PlannedTier],
        criteria: Option<&[SearchCriteria]>,
        profiles: &ProfileSet,
        cancel: &CancellationToken,
    ) -> SearchReport {
        let parser = TitleParser::standard();
        let mut report = SearchReport::new();
        let mut seen: HashSet<(Option<usize>, (String, String))> = HashSet::new();
        let mut succeeded = 0;

        debug!(search_id = %report.search_id, tiers = tiers.len(), "Starting search");

        for (index, tier) in tiers.iter().enumerate() {
            if cancel.is_cancelled() {
                break;
            }

            report.transition(SearchState::FetchingTier(index));
            debug!(
                search_id = %report.search_id,
                tier = index,
                label = %tier.label,
                requests = tier.requests.len(),
                "Fetching tier"
            );

            let Some(fetched) = self.fetch_tier(index, tier, cancel).await else {
                break;
            };
            report.tiers_fetched += 1;

            let mut items = Vec::new();
            for (criteria_index, outcome) in fetched {
                report.requests_issued += outcome.issued;
                succeeded += outcome.succeeded;
                report.request_failures.extend(outcome.failures);
                for item in outcome.items {
                    if seen.insert((criteria_index, item.dedup_key())) {
                        items.push((criteria_index, item));
                    }
                }
            }

            report.transition(SearchState::Parsing(index));
            let parsed: Vec<_> = items
                .into_iter()
                .map(|(criteria_index, item)| {
                    let parsed = parser.parse(&item.title);
                    metrics::RELEASES_PARSED.inc();
                    (criteria_index, item, parsed)
                })
                .collect();

            report.transition(SearchState::Scoring(index));
            let mut accepted = Vec::new();
            for (criteria_index, item, parsed) in parsed {
                let target = criteria.zip(criteria_index).map(|(all, i)| &all[i]);
                let decision = score(&parsed, target, profiles);
                let result = decision
                    .rejections
                    .first()
                    .map(|r| r.code())
                    .unwrap_or("accepted");
                metrics::DECISIONS.with_label_values(&[result]).inc();

                let release = ReleaseDecision {
                    item,
                    parsed,
                    decision,
                    criteria_index,
                    tier: index,
                };
                if release.accepted() {
                    accepted.push(release);
                } else {
                    report.record_rejected(release);
                }
            }

            if !accepted.is_empty() {
                accepted.sort_by(compare_decisions);
                // Keep at least one; this tier already satisfied the search.
                if let Some(max) = self.settings.max_results {
                    accepted.truncate(max.max(1));
                }
                report.accepted = accepted;
                break;
            }
        }

        let status = if cancel.is_cancelled() && report.accepted.is_empty() {
            SearchStatus::Cancelled
        } else if !report.accepted.is_empty() {
            SearchStatus::Satisfied
        } else if report.requests_issued == 0 {
            SearchStatus::Exhausted(ExhaustionCause::NothingToSearch)
        } else if succeeded == 0 {
            SearchStatus::Exhausted(ExhaustionCause::AllTransportFailed)
        } else {
            SearchStatus::Exhausted(ExhaustionCause::NoAcceptedCandidates)
        };
        report.status = status;
        report.transition(match status {
            SearchStatus::Satisfied => SearchState::Satisfied,
            SearchStatus::Exhausted(_) => SearchState::Exhausted,
            SearchStatus::Cancelled => SearchState::Cancelled,
        });
        metrics::TIERS_FETCHED.observe(report.tiers_fetched as f64);

        info!(
            search_id = %report.search_id,
            status = status.code(),
            accepted = report.accepted.len(),
            rejected = report.rejected.len(),
            failures = report.request_failures.len(),
            tiers_fetched = report.tiers_fetched,
            "Search finished"
        );

        report
    }

    /// Fetch every request of a tier concurrently.
    ///
    /// Returns `None` when cancelled mid-tier; requests already in flight run
    /// to completion in the background and their results are dropped.
    async fn fetch_tier(
        &self,
        tier_index: usize,
        tier: &PlannedTier,
        cancel: &CancellationToken,
    ) -> Option<Vec<(Option<usize>, FetchOutcome)>> {
        let handles: Vec<_> = tier
            .requests
            .iter()
            .map(|planned| {
                let provider = planned.provider.clone();
                let transport = self.transport.clone();
                let rate_limiter = self.rate_limiter.clone();
                let request = planned.request.clone();
                let timeout = self.settings.request_timeout;
                let cancel = cancel.clone();
                let criteria_index = planned.criteria_index;
                tokio::spawn(async move {
                    let outcome = fetch_pages(
                        provider,
                        transport,
                        rate_limiter,
                        request,
                        tier_index,
                        timeout,
                        cancel,
                    )
                    .await;
                    (criteria_index, outcome)
                })
            })
            .collect();

        let results = tokio::select! {
            results = join_all(handles) => results,
            _ = cancel.cancelled() => {
                debug!(tier = tier_index, "Search cancelled mid-tier, discarding results");
                return None;
            }
        };

        if cancel.is_cancelled() {
            return None;
        }

        Some(
            results
                .into_iter()
                .filter_map(|joined| match joined {
                    Ok(outcome) => Some(outcome),
                    Err(e) => {
                        warn!(tier = tier_index, error = %e, "Request task failed");
                        None
                    }
                })
                .collect(),
        )
    }
}

/// Fold provider tiers into a plan, tier `i` with tier `i`.
fn merge_chain(
    plan: &mut Vec<PlannedTier>,
    provider: &Arc<dyn IndexerProvider>,
    tiers: Vec<crate::indexer::RequestTier>,
    criteria_index: Option<usize>,
) {
    for (index, tier) in tiers.into_iter().enumerate() {
        let requests = tier.requests.into_iter().map(|request| PlannedRequest {
            provider: provider.clone(),
            request,
            criteria_index,
        });
        match plan.get_mut(index) {
            Some(existing) => existing.requests.extend(requests),
            None => plan.push(PlannedTier {
                label: tier.label,
                requests: requests.collect(),
            }),
        }
    }
}

/// Page through one request sequentially.
async fn fetch_pages(
    provider: Arc<dyn IndexerProvider>,
    transport: Arc<dyn Transport>,
    rate_limiter: Arc<RateLimiterPool>,
    pageable: PageableRequest,
    tier: usize,
    timeout: Duration,
    cancel: CancellationToken,
) -> FetchOutcome {
    let mut outcome = FetchOutcome::default();
    let indexer = provider.name().to_string();
    let mut page = 0;

    while let Some(request) = pageable.page(page) {
        let waited = tokio::select! {
            waited = rate_limiter.acquire(&indexer) => waited,
            _ = cancel.cancelled() => break,
        };
        metrics::RATE_LIMIT_WAIT
            .with_label_values(&[&indexer])
            .observe(waited.as_secs_f64());

        outcome.issued += 1;
        let start = Instant::now();
        let result = match tokio::time::timeout(timeout, transport.execute(&request)).await {
            Ok(Ok(response)) if response.is_success() => provider.parse_response(&request, &response),
            Ok(Ok(response)) => Err(TransportError::from_response(&response).into()),
            Ok(Err(e)) => Err(IndexerError::from(e)),
            Err(_) => Err(TransportError::Timeout.into()),
        };
        metrics::INDEXER_REQUEST_DURATION
            .with_label_values(&[&indexer])
            .observe(start.elapsed().as_secs_f64());

        match result {
            Ok(items) => {
                metrics::INDEXER_REQUESTS
                    .with_label_values(&[&indexer, "success"])
                    .inc();
                debug!(indexer = %indexer, page, items = items.len(), "Fetched page");
                outcome.succeeded += 1;
                let count = items.len();
                outcome.items.extend(items);
                if !pageable.should_continue(page, count) {
                    break;
                }
                page += 1;
            }
            Err(e) => {
                metrics::INDEXER_REQUESTS
                    .with_label_values(&[&indexer, e.reason_code()])
                    .inc();
                warn!(indexer = %indexer, page, error = %e, "Indexer request failed");
                outcome.failures.push(RequestFailure::new(
                    &indexer,
                    request.redacted_url(),
                    page,
                    tier,
                    &e,
                ));
                break;
            }
        }
    }

    outcome
}

/// Profile verdict plus target and upgrade checks.
fn score(
    parsed: &crate::parser::ParsedReleaseInfo,
    criteria: Option<&SearchCriteria>,
    profiles: &ProfileSet,
) -> Decision {
    let verdict = ProfileMatcher.evaluate(parsed, &profiles.quality, &profiles.language);
    let Some(criteria) = criteria else {
        return verdict;
    };

    let mut rejections = Vec::new();
    rejections.extend(check_target(parsed, criteria));
    rejections.extend(verdict.rejections.iter().copied());
    rejections.extend(check_upgrade(parsed, criteria, &profiles.quality));

    match verdict.rank {
        Some(rank) if rejections.is_empty() => Decision::accept(rank),
        _ => Decision::reject(rejections),
    }
}

/// Best first: accepted before rejected, then rank, seeders, recency.
fn compare_decisions(a: &ReleaseDecision, b: &ReleaseDecision) -> Ordering {
    b.decision
        .accepted
        .cmp(&a.decision.accepted)
        .then_with(|| b.decision.rank.cmp(&a.decision.rank))
        .then_with(|| seeder_bucket(&b.item).cmp(&seeder_bucket(&a.item)))
        .then_with(|| b.item.publish_date.cmp(&a.item.publish_date))
        .then_with(|| a.item.title.cmp(&b.item.title))
}

/// Seeders on a log10 scale, so 40 and 60 seeders tie.
fn seeder_bucket(item: &ReleaseItem) -> u32 {
    match item.seeders {
        Some(seeders) if seeders > 0 => (seeders as f64).log10().round() as u32,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{IndexerConfig, IndexerKind};
    use crate::criteria::{CriteriaTarget, SearchMode, SeriesRef};
    use crate::language::Language;
    use crate::profile::{LanguageProfile, QualityProfile, RejectionReason};
    use crate::quality::Quality;
    use chrono::{TimeZone, Utc};

    fn profiles() -> ProfileSet {
        ProfileSet::new(
            QualityProfile::allowing(
                1,
                "HD",
                &[Quality::WebDl1080p, Quality::Bluray1080p],
                Quality::Bluray1080p,
            ),
            LanguageProfile::allowing(1, "English", &[Language::English], true),
        )
    }

    fn engine() -> DecisionEngine {
        struct NoTransport;

        #[async_trait::async_trait]
        impl Transport for NoTransport {
            async fn execute(
                &self,
                _request: &crate::indexer::IndexerRequest,
            ) -> Result<crate::indexer::TransportResponse, TransportError> {
                Err(TransportError::ConnectionFailed("offline".into()))
            }
        }

        let config = IndexerConfig::new("geek", IndexerKind::Newznab, "https://api.example");
        DecisionEngine::new(
            vec![create_provider(&config)],
            Arc::new(NoTransport),
            Arc::new(RateLimiterPool::empty()),
            EngineSettings::default(),
        )
    }

    fn item(title: &str, seeders: Option<u32>) -> ReleaseItem {
        let mut item = ReleaseItem::new("geek", title);
        item.seeders = seeders;
        item
    }

    fn episode_criteria(tier: usize) -> SearchCriteria {
        SearchCriteria {
            target: CriteriaTarget::Episode {
                series: SeriesRef::new("Some Show"),
                season: 2,
                episodes: vec![5],
            },
            mode: SearchMode::Automatic,
            tier,
            quality_profile_id: 1,
            language_profile_id: 1,
            current_quality: None,
            as_of: Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_evaluate_ranks_proper_first() {
        let decisions = engine().evaluate(
            vec![
                item("Some.Show.S02E05.1080p.WEB-TEAM", None),
                item("Some.Show.S02E05.HDTV.XviD-LOL", None),
                item("Some.Show.S02E05.1080p.WEB.PROPER-TEAM", None),
            ],
            None,
            &profiles(),
        );

        assert_eq!(decisions[0].item.title, "Some.Show.S02E05.1080p.WEB.PROPER-TEAM");
        assert_eq!(decisions[1].item.title, "Some.Show.S02E05.1080p.WEB-TEAM");
        assert!(!decisions[2].accepted());
        assert_eq!(
            decisions[2].decision.rejections,
            vec![RejectionReason::QualityNotAllowed]
        );
    }

    #[test]
    fn test_evaluate_with_criteria_checks_target() {
        let criteria = episode_criteria(0);
        let decisions = engine().evaluate(
            vec![
                item("Some.Show.S02E06.1080p.WEB-TEAM", None),
                item("Some.Show.S02E05.1080p.WEB-TEAM", None),
            ],
            Some(&criteria),
            &profiles(),
        );
        assert!(decisions[0].accepted());
        assert_eq!(decisions[0].item.title, "Some.Show.S02E05.1080p.WEB-TEAM");
        assert_eq!(
            decisions[1].decision.rejections,
            vec![RejectionReason::TargetMismatch]
        );
    }

    #[test]
    fn test_seeders_break_ties() {
        let decisions = engine().evaluate(
            vec![
                item("Some.Show.S02E05.1080p.WEB-AAA", Some(3)),
                item("Some.Show.S02E05.1080p.WEB-BBB", Some(250)),
            ],
            None,
            &profiles(),
        );
        assert_eq!(decisions[0].item.title, "Some.Show.S02E05.1080p.WEB-BBB");
    }

    #[test]
    fn test_seeder_bucket() {
        assert_eq!(seeder_bucket(&item("x", None)), 0);
        assert_eq!(seeder_bucket(&item("x", Some(0))), 0);
        assert_eq!(seeder_bucket(&item("x", Some(40))), seeder_bucket(&item("x", Some(60))));
        assert!(seeder_bucket(&item("x", Some(500))) > seeder_bucket(&item("x", Some(50))));
    }

    #[test]
    fn test_plan_groups_criteria_by_tier() {
        let engine = engine();
        let mut pack = episode_criteria(0);
        pack.target = CriteriaTarget::SeasonPack {
            series: SeriesRef::new("Some Show"),
            season: 2,
        };
        let plan = engine.plan_search(&[episode_criteria(1), pack]);

        // Text-only provider: one tier per criteria group, pack group first.
        assert_eq!(plan.len(), 2);
        assert_eq!(plan[0].requests[0].criteria_index, Some(1));
        assert_eq!(plan[1].requests[0].criteria_index, Some(0));
    }

    #[tokio::test]
    async fn test_search_all_failed() {
        let report = engine()
            .search(&[episode_criteria(0)], &profiles(), &CancellationToken::new())
            .await;
        assert_eq!(
            report.status,
            SearchStatus::Exhausted(ExhaustionCause::AllTransportFailed)
        );
        assert_eq!(report.request_failures[0].reason, "connection_failed");
    }

    #[tokio::test]
    async fn test_search_nothing_to_search() {
        let report = engine()
            .search(&[], &profiles(), &CancellationToken::new())
            .await;
        assert_eq!(
            report.status,
            SearchStatus::Exhausted(ExhaustionCause::NothingToSearch)
        );
        assert_eq!(
            report.transitions,
            vec![SearchState::Pending, SearchState::Exhausted]
        );
    }
}
