//! Jackett JSON search API.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::debug;

use crate::config::IndexerConfig;
use crate::criteria::{CriteriaTarget, SearchCriteria};

use super::transport::TransportResponse;
use super::types::{
    AcceptType, Capabilities, IndexerError, IndexerProvider, IndexerRequest, PageableRequest,
    ReleaseItem, RequestChain,
};
use super::{default_categories, search_enabled, search_term};

/// Provider for one Jackett indexer.
///
/// Jackett returns every result in one response, so requests never page, and
/// it has no RSS endpoint here: the recent chain is always empty.
pub struct JackettProvider {
    config: IndexerConfig,
}

impl JackettProvider {
    pub fn new(config: IndexerConfig) -> Self {
        Self { config }
    }

    /// Build the Jackett API request for a search.
    fn build_search_request(&self, query: &str, categories: &[u32]) -> IndexerRequest {
        let url = format!(
            "{}/api/v2.0/indexers/{}/results",
            self.config.url.trim_end_matches('/'),
            urlencoding::encode(&self.config.name)
        );
        let mut request = IndexerRequest::new(self.config.name.clone(), url, AcceptType::Json)
            .with_param("apikey", self.config.api_key.clone())
            .with_param("Query", query);
        for cat in categories {
            request.params.push(("Category[]".to_string(), cat.to_string()));
        }
        request
    }
}

/// Free-text query for a target.
fn query_for(target: &CriteriaTarget) -> String {
    match target {
        CriteriaTarget::Movie { title, year, .. } => match year {
            Some(year) => format!("{} {}", search_term(title), year),
            None => search_term(title),
        },
        CriteriaTarget::Episode {
            series,
            season,
            episodes,
        } => {
            let eps: String = episodes.iter().map(|e| format!("E{:02}", e)).collect();
            format!("{} S{:02}{}", search_term(&series.title), season, eps)
        }
        CriteriaTarget::DailyEpisode { series, air_date } => format!(
            "{} {}",
            search_term(&series.title),
            air_date.format("%Y %m %d")
        ),
        CriteriaTarget::SeasonPack { series, season } => {
            format!("{} S{:02}", search_term(&series.title), season)
        }
        CriteriaTarget::Album { artist, album, .. } => {
            format!("{} {}", search_term(artist), search_term(album))
        }
    }
}

impl IndexerProvider for JackettProvider {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            rss: false,
            search: self.config.enable_automatic_search || self.config.enable_interactive_search,
            pagination: false,
        }
    }

    fn recent_requests(&self) -> RequestChain {
        RequestChain::new()
    }

    fn search_requests(&self, criteria: &SearchCriteria) -> RequestChain {
        if !search_enabled(&self.config, criteria.mode) {
            return RequestChain::new();
        }
        let categories = if self.config.categories.is_empty() {
            default_categories(&criteria.target)
        } else {
            self.config.categories.clone()
        };
        let request = self.build_search_request(&query_for(&criteria.target), &categories);
        RequestChain::new().with_tier("text", vec![PageableRequest::single(request)])
    }

    fn parse_response(
        &self,
        _request: &IndexerRequest,
        response: &TransportResponse,
    ) -> Result<Vec<ReleaseItem>, IndexerError> {
        let jackett_response: JackettResponse = serde_json::from_str(&response.body)
            .map_err(|e| IndexerError::MalformedResponse(format!("Failed to parse response: {}", e)))?;

        debug!(
            indexer = %self.config.name,
            results = jackett_response.Results.len(),
            "Jackett search complete"
        );

        Ok(jackett_response
            .Results
            .into_iter()
            .map(|r| {
                let seeders = r.Seeders.map(|s| s.max(0) as u32);
                ReleaseItem {
                    title: r.Title,
                    indexer: self.config.name.clone(),
                    guid: r
                        .Guid
                        .or_else(|| r.InfoHash.map(|h| h.to_lowercase())),
                    download_url: r.Link.or(r.MagnetUri),
                    info_url: r.Details,
                    size_bytes: r.Size.unwrap_or(0).max(0) as u64,
                    seeders,
                    peers: r.Peers.map(|p| p.max(0) as u32),
                    publish_date: r.PublishDate.and_then(|d| parse_jackett_date(&d)),
                    categories: r
                        .Category
                        .unwrap_or_default()
                        .into_iter()
                        .filter_map(|c| u32::try_from(c).ok())
                        .collect(),
                }
            })
            .collect())
    }
}

/// Parse Jackett's date format.
fn parse_jackett_date(date_str: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(date_str)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|| {
            chrono::NaiveDateTime::parse_from_str(date_str, "%Y-%m-%dT%H:%M:%S")
                .ok()
                .map(|ndt| ndt.and_utc())
        })
}

// Jackett API response types
#[derive(Debug, Deserialize)]
#[allow(non_snake_case)]
struct JackettResponse {
    Results: Vec<JackettResult>,
}

#[derive(Debug, Deserialize)]
#[allow(non_snake_case)]
struct JackettResult {
    Title: String,
    Guid: Option<String>,
    MagnetUri: Option<String>,
    Link: Option<String>,
    InfoHash: Option<String>,
    Size: Option<i64>,
    Seeders: Option<i32>,
    Peers: Option<i32>,
    Category: Option<Vec<i64>>,
    PublishDate: Option<String>,
    Details: Option<String>,
}
