//! Types for indexer request generation and responses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::criteria::SearchCriteria;

use super::transport::{TransportError, TransportResponse};

/// Body format a request expects back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AcceptType {
    Rss,
    Json,
    Html,
}

impl AcceptType {
    pub fn mime(&self) -> &'static str {
        match self {
            AcceptType::Rss => "application/rss+xml",
            AcceptType::Json => "application/json",
            AcceptType::Html => "text/html",
        }
    }
}

/// One HTTP call descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexerRequest {
    /// Indexer that will parse the response.
    pub indexer: String,
    /// Base URL without query string.
    pub url: String,
    /// Query parameters, in order.
    pub params: Vec<(String, String)>,
    pub accept: AcceptType,
    /// Zero-based page cursor.
    pub page: u32,
}

impl IndexerRequest {
    pub fn new(indexer: impl Into<String>, url: impl Into<String>, accept: AcceptType) -> Self {
        Self {
            indexer: indexer.into(),
            url: url.into(),
            params: Vec::new(),
            accept,
            page: 0,
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_param(key, value);
        self
    }

    /// Set a parameter, replacing any existing value for the key.
    pub fn set_param(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.params.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = value,
            None => self.params.push((key, value)),
        }
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// URL with encoded query string.
    pub fn full_url(&self) -> String {
        if self.params.is_empty() {
            return self.url.clone();
        }
        let query: Vec<String> = self
            .params
            .iter()
            .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
            .collect();
        let separator = if self.url.contains('?') { '&' } else { '?' };
        format!("{}{}{}", self.url, separator, query.join("&"))
    }

    /// Same URL with any API key parameter masked, for logs.
    pub fn redacted_url(&self) -> String {
        let mut redacted = self.clone();
        for (key, value) in redacted.params.iter_mut() {
            if key.eq_ignore_ascii_case("apikey") {
                *value = "(removed)".to_string();
            }
        }
        redacted.full_url()
    }
}

/// How a request pages through results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Paging {
    /// A single request; no further pages exist.
    Single,
    /// `offset`/`limit` parameters, `page_size` items per page.
    Offset { page_size: u32, max_pages: u32 },
}

/// A request that may expand into several pages.
///
/// Pages are produced one at a time: page `n + 1` is only materialised after
/// the caller has seen page `n` and [`PageableRequest::should_continue`]
/// allowed it. The sequence is restartable from page 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageableRequest {
    pub template: IndexerRequest,
    pub paging: Paging,
}

impl PageableRequest {
    pub fn single(request: IndexerRequest) -> Self {
        Self {
            template: request,
            paging: Paging::Single,
        }
    }

    pub fn offset(request: IndexerRequest, page_size: u32, max_pages: u32) -> Self {
        Self {
            template: request,
            paging: Paging::Offset {
                page_size: page_size.max(1),
                max_pages: max_pages.max(1),
            },
        }
    }

    pub fn indexer(&self) -> &str {
        &self.template.indexer
    }

    pub fn max_pages(&self) -> u32 {
        match self.paging {
            Paging::Single => 1,
            Paging::Offset { max_pages, .. } => max_pages,
        }
    }

    /// The request for `page`, or `None` past the declared maximum.
    pub fn page(&self, page: u32) -> Option<IndexerRequest> {
        if page >= self.max_pages() {
            return None;
        }
        let mut request = self.template.clone();
        request.page = page;
        if let Paging::Offset { page_size, .. } = self.paging {
            request.set_param("offset", (page * page_size).to_string());
            request.set_param("limit", page_size.to_string());
        }
        Some(request)
    }

    /// Whether another page should follow `page`, which returned `item_count` items.
    ///
    /// Stops on a short page or once the maximum page count is reached.
    pub fn should_continue(&self, page: u32, item_count: usize) -> bool {
        match self.paging {
            Paging::Single => false,
            Paging::Offset {
                page_size,
                max_pages,
            } => item_count >= page_size as usize && page + 1 < max_pages,
        }
    }
}

/// A set of requests issued together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestTier {
    pub label: String,
    pub requests: Vec<PageableRequest>,
}

/// Ordered tiers; a tier is only tried when every earlier one came back empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestChain {
    tiers: Vec<RequestTier>,
}

impl RequestChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a tier; empty tiers are dropped.
    pub fn push_tier(&mut self, label: impl Into<String>, requests: Vec<PageableRequest>) {
        if requests.is_empty() {
            return;
        }
        self.tiers.push(RequestTier {
            label: label.into(),
            requests,
        });
    }

    pub fn with_tier(mut self, label: impl Into<String>, requests: Vec<PageableRequest>) -> Self {
        self.push_tier(label, requests);
        self
    }

    /// Merge another chain tier-by-tier, so tier `i` of both run together.
    pub fn merge(&mut self, other: RequestChain) {
        for (index, tier) in other.tiers.into_iter().enumerate() {
            match self.tiers.get_mut(index) {
                Some(existing) => existing.requests.extend(tier.requests),
                None => self.tiers.push(tier),
            }
        }
    }

    /// Append another chain's tiers after this one's.
    pub fn append(&mut self, other: RequestChain) {
        self.tiers.extend(other.tiers);
    }

    pub fn tiers(&self) -> &[RequestTier] {
        &self.tiers
    }

    pub fn into_tiers(self) -> Vec<RequestTier> {
        self.tiers
    }

    pub fn is_empty(&self) -> bool {
        self.tiers.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tiers.len()
    }

    /// Total pageable requests across all tiers.
    pub fn request_count(&self) -> usize {
        self.tiers.iter().map(|t| t.requests.len()).sum()
    }
}

/// What a provider can do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    pub rss: bool,
    pub search: bool,
    pub pagination: bool,
}

/// One release as reported by an indexer, before parsing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseItem {
    pub title: String,
    pub indexer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info_url: Option<String>,
    #[serde(default)]
    pub size_bytes: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seeders: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub peers: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publish_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub categories: Vec<u32>,
}

impl ReleaseItem {
    pub fn new(indexer: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            indexer: indexer.into(),
            guid: None,
            download_url: None,
            info_url: None,
            size_bytes: 0,
            seeders: None,
            peers: None,
            publish_date: None,
            categories: Vec::new(),
        }
    }

    /// Identity used to collapse duplicates: guid, else indexer and title.
    pub fn dedup_key(&self) -> (String, String) {
        match &self.guid {
            Some(guid) => (String::new(), guid.clone()),
            None => (self.indexer.clone(), self.title.clone()),
        }
    }
}

/// Errors that can occur fetching or reading one indexer request.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IndexerError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Invalid API key")]
    InvalidApiKey,

    #[error("Request limit reached")]
    RequestLimitReached,

    #[error("Indexer API error {code}: {description}")]
    Api { code: u32, description: String },
}

impl IndexerError {
    /// Stable code for reports and logs.
    pub fn reason_code(&self) -> &'static str {
        match self {
            IndexerError::Transport(e) => e.reason_code(),
            IndexerError::MalformedResponse(_) => "malformed_response",
            IndexerError::InvalidApiKey => "invalid_api_key",
            IndexerError::RequestLimitReached => "request_limit_reached",
            IndexerError::Api { .. } => "api_error",
        }
    }
}

/// A request generation and response parsing strategy for one indexer.
///
/// Providers lacking a capability return an empty chain instead of failing.
pub trait IndexerProvider: Send + Sync {
    fn name(&self) -> &str;

    fn capabilities(&self) -> Capabilities;

    /// Requests for periodic sync, independent of any target.
    fn recent_requests(&self) -> RequestChain;

    /// Requests for an explicit search.
    fn search_requests(&self, criteria: &SearchCriteria) -> RequestChain;

    /// Read the items out of a successful response.
    fn parse_response(
        &self,
        request: &IndexerRequest,
        response: &TransportResponse,
    ) -> Result<Vec<ReleaseItem>, IndexerError>;
}
