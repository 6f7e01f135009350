//! Values produced by a decision pass.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::indexer::{IndexerError, ReleaseItem};
use crate::parser::ParsedReleaseInfo;
use crate::profile::{Decision, RejectionReason};

/// One release together with its parse and verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseDecision {
    pub item: ReleaseItem,
    pub parsed: ParsedReleaseInfo,
    pub decision: Decision,
    /// Index of the criteria the release was fetched for, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub criteria_index: Option<usize>,
    /// Tier the release came from.
    pub tier: usize,
}

impl ReleaseDecision {
    pub fn accepted(&self) -> bool {
        self.decision.accepted
    }
}

/// Where a search invocation is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "tier", rename_all = "snake_case")]
pub enum SearchState {
    Pending,
    FetchingTier(usize),
    Parsing(usize),
    Scoring(usize),
    Satisfied,
    Exhausted,
    Cancelled,
}

/// Why a search ended without an accepted candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExhaustionCause {
    /// Indexers answered, but nothing passed the checks.
    NoAcceptedCandidates,
    /// Every request issued failed.
    AllTransportFailed,
    /// No provider produced a request.
    NothingToSearch,
}

/// Terminal outcome of a search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "cause", rename_all = "snake_case")]
pub enum SearchStatus {
    Satisfied,
    Exhausted(ExhaustionCause),
    Cancelled,
}

impl SearchStatus {
    /// Stable code for logs and metrics.
    pub fn code(&self) -> &'static str {
        match self {
            SearchStatus::Satisfied => "satisfied",
            SearchStatus::Exhausted(ExhaustionCause::NoAcceptedCandidates) => {
                "exhausted_no_accepted_candidates"
            }
            SearchStatus::Exhausted(ExhaustionCause::AllTransportFailed) => {
                "exhausted_all_transport_failed"
            }
            SearchStatus::Exhausted(ExhaustionCause::NothingToSearch) => {
                "exhausted_nothing_to_search"
            }
            SearchStatus::Cancelled => "cancelled",
        }
    }
}

/// A request that did not produce items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestFailure {
    pub indexer: String,
    /// Request URL with the API key removed.
    pub url: String,
    pub page: u32,
    pub tier: usize,
    /// Stable reason code.
    pub reason: String,
    pub message: String,
}

impl RequestFailure {
    pub fn new(indexer: &str, url: String, page: u32, tier: usize, error: &IndexerError) -> Self {
        Self {
            indexer: indexer.to_string(),
            url,
            page,
            tier,
            reason: error.reason_code().to_string(),
            message: error.to_string(),
        }
    }
}

/// Decision summary returned by every engine entry point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchReport {
    pub search_id: Uuid,
    pub status: SearchStatus,
    /// Accepted candidates, best first.
    pub accepted: Vec<ReleaseDecision>,
    pub rejected: Vec<ReleaseDecision>,
    /// How often each rejection reason was seen.
    pub rejection_summary: BTreeMap<RejectionReason, usize>,
    pub request_failures: Vec<RequestFailure>,
    pub tiers_fetched: usize,
    pub requests_issued: usize,
    pub transitions: Vec<SearchState>,
}

impl Default for SearchReport {
    fn default() -> Self {
        Self::new()
    }
}

impl SearchReport {
    pub fn new() -> Self {
        Self {
            search_id: Uuid::new_v4(),
            status: SearchStatus::Exhausted(ExhaustionCause::NothingToSearch),
            accepted: Vec::new(),
            rejected: Vec::new(),
            rejection_summary: BTreeMap::new(),
            request_failures: Vec::new(),
            tiers_fetched: 0,
            requests_issued: 0,
            transitions: vec![SearchState::Pending],
        }
    }

    /// Top-ranked accepted candidate.
    pub fn best(&self) -> Option<&ReleaseDecision> {
        self.accepted.first()
    }

    /// Rejection reason codes seen, most frequent first.
    pub fn rejection_codes(&self) -> Vec<&'static str> {
        let mut reasons: Vec<_> = self.rejection_summary.iter().collect();
        reasons.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
        reasons.into_iter().map(|(reason, _)| reason.code()).collect()
    }

    pub fn is_satisfied(&self) -> bool {
        self.status == SearchStatus::Satisfied
    }

    pub(crate) fn transition(&mut self, state: SearchState) {
        self.transitions.push(state);
    }

    pub(crate) fn record_rejected(&mut self, decision: ReleaseDecision) {
        for reason in &decision.decision.rejections {
            *self.rejection_summary.entry(*reason).or_insert(0) += 1;
        }
        self.rejected.push(decision);
    }
}
