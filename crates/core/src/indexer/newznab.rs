//! Newznab and Torznab request generation.

use crate::config::{IndexerConfig, IndexerKind};
use crate::criteria::{CriteriaTarget, SearchCriteria};

use super::rss::parse_feed;
use super::transport::TransportResponse;
use super::types::{
    AcceptType, Capabilities, IndexerError, IndexerProvider, IndexerRequest, PageableRequest,
    ReleaseItem, RequestChain,
};
use super::{default_categories, search_enabled, search_term};

/// API flavour; both share request shape and feed format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flavour {
    Newznab,
    Torznab,
}

/// Provider for Newznab (usenet) and Torznab (torrent) APIs.
///
/// Searches with id parameters first when the indexer supports them, then
/// falls back to a free-text tier.
pub struct NewznabProvider {
    config: IndexerConfig,
    flavour: Flavour,
}

impl NewznabProvider {
    pub fn new(config: IndexerConfig) -> Self {
        let flavour = match config.kind {
            IndexerKind::Torznab => Flavour::Torznab,
            _ => Flavour::Newznab,
        };
        Self { config, flavour }
    }

    pub fn flavour(&self) -> Flavour {
        self.flavour
    }

    fn api_url(&self) -> String {
        format!(
            "{}/{}",
            self.config.url.trim_end_matches('/'),
            self.config.api_path.trim_start_matches('/')
        )
    }

    fn base_request(&self, function: &str, categories: &[u32]) -> IndexerRequest {
        let mut request = IndexerRequest::new(self.config.name.clone(), self.api_url(), AcceptType::Rss)
            .with_param("t", function);
        if !self.config.api_key.is_empty() {
            request.set_param("apikey", self.config.api_key.clone());
        }
        if !categories.is_empty() {
            let cats: Vec<String> = categories.iter().map(|c| c.to_string()).collect();
            request.set_param("cat", cats.join(","));
        }
        request.with_param("extended", "1")
    }

    fn categories_for(&self, target: &CriteriaTarget) -> Vec<u32> {
        if self.config.categories.is_empty() {
            default_categories(target)
        } else {
            self.config.categories.clone()
        }
    }

    fn paged(&self, request: IndexerRequest) -> PageableRequest {
        PageableRequest::offset(request, self.config.page_size, self.config.max_pages)
    }

    /// Id based tier, when the indexer understands the ids the target carries.
    fn id_requests(&self, target: &CriteriaTarget, categories: &[u32]) -> Vec<IndexerRequest> {
        match target {
            CriteriaTarget::Movie {
                imdb_id: Some(imdb_id),
                ..
            } if self.config.supports_movie_ids => vec![self
                .base_request("movie", categories)
                .with_param("imdbid", imdb_id.trim_start_matches("tt"))],
            CriteriaTarget::Episode {
                series,
                season,
                episodes,
            } if self.config.supports_tv_ids => match series.tvdb_id {
                Some(tvdb_id) => episodes
                    .iter()
                    .map(|episode| {
                        self.base_request("tvsearch", categories)
                            .with_param("tvdbid", tvdb_id.to_string())
                            .with_param("season", season.to_string())
                            .with_param("ep", episode.to_string())
                    })
                    .collect(),
                None => Vec::new(),
            },
            CriteriaTarget::DailyEpisode { series, air_date } if self.config.supports_tv_ids => {
                match series.tvdb_id {
                    Some(tvdb_id) => vec![self
                        .base_request("tvsearch", categories)
                        .with_param("tvdbid", tvdb_id.to_string())
                        .with_param("season", air_date.format("%Y").to_string())
                        .with_param("ep", air_date.format("%m/%d").to_string())],
                    None => Vec::new(),
                }
            }
            CriteriaTarget::SeasonPack { series, season } if self.config.supports_tv_ids => {
                match series.tvdb_id {
                    Some(tvdb_id) => vec![self
                        .base_request("tvsearch", categories)
                        .with_param("tvdbid", tvdb_id.to_string())
                        .with_param("season", season.to_string())],
                    None => Vec::new(),
                }
            }
            CriteriaTarget::Album { artist, album, .. } if self.config.supports_music_search => {
                vec![self
                    .base_request("music", categories)
                    .with_param("artist", search_term(artist))
                    .with_param("album", search_term(album))]
            }
            _ => Vec::new(),
        }
    }

    /// Free-text tier.
    fn text_requests(&self, target: &CriteriaTarget, categories: &[u32]) -> Vec<IndexerRequest> {
        match target {
            CriteriaTarget::Movie { title, year, .. } => {
                let query = match year {
                    Some(year) => format!("{} {}", search_term(title), year),
                    None => search_term(title),
                };
                vec![self.base_request("movie", categories).with_param("q", query)]
            }
            CriteriaTarget::Episode {
                series,
                season,
                episodes,
            } => episodes
                .iter()
                .map(|episode| {
                    self.base_request("tvsearch", categories)
                        .with_param("q", search_term(&series.title))
                        .with_param("season", season.to_string())
                        .with_param("ep", episode.to_string())
                })
                .collect(),
            CriteriaTarget::DailyEpisode { series, air_date } => vec![self
                .base_request("tvsearch", categories)
                .with_param("q", search_term(&series.title))
                .with_param("season", air_date.format("%Y").to_string())
                .with_param("ep", air_date.format("%m/%d").to_string())],
            CriteriaTarget::SeasonPack { series, season } => vec![self
                .base_request("tvsearch", categories)
                .with_param("q", search_term(&series.title))
                .with_param("season", season.to_string())],
            CriteriaTarget::Album { artist, album, .. } => vec![self
                .base_request("search", categories)
                .with_param("q", format!("{} {}", search_term(artist), search_term(album)))],
        }
    }
}

impl IndexerProvider for NewznabProvider {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            rss: self.config.enable_rss,
            search: self.config.enable_automatic_search || self.config.enable_interactive_search,
            pagination: true,
        }
    }

    fn recent_requests(&self) -> RequestChain {
        if !self.config.enable_rss {
            return RequestChain::new();
        }
        let request = self.base_request("search", &self.config.categories);
        let paged = PageableRequest::offset(request, self.config.page_size, self.config.recent_pages);
        RequestChain::new().with_tier("recent", vec![paged])
    }

    fn search_requests(&self, criteria: &SearchCriteria) -> RequestChain {
        if !search_enabled(&self.config, criteria.mode) {
            return RequestChain::new();
        }
        let categories = self.categories_for(&criteria.target);

        let ids = self.id_requests(&criteria.target, &categories);
        let text = self.text_requests(&criteria.target, &categories);

        RequestChain::new()
            .with_tier("ids", ids.into_iter().map(|r| self.paged(r)).collect())
            .with_tier("text", text.into_iter().map(|r| self.paged(r)).collect())
    }

    fn parse_response(
        &self,
        _request: &IndexerRequest,
        response: &TransportResponse,
    ) -> Result<Vec<ReleaseItem>, IndexerError> {
        parse_feed(&self.config.name, &response.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::criteria::{SearchMode, SeriesRef};
    use chrono::{NaiveDate, TimeZone, Utc};

    fn config() -> IndexerConfig {
        let mut config = IndexerConfig::new("geek", IndexerKind::Newznab, "https://api.example/");
        config.api_key = "secret".to_string();
        config.page_size = 50;
        config.max_pages = 3;
        config
    }

    fn criteria(target: CriteriaTarget) -> SearchCriteria {
        SearchCriteria {
            target,
            mode: SearchMode::Automatic,
            tier: 0,
            quality_profile_id: 1,
            language_profile_id: 1,
            current_quality: None,
            as_of: Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap(),
        }
    }

    fn series() -> SeriesRef {
        SeriesRef {
            title: "Marvel's Agents of S.H.I.E.L.D.".to_string(),
            tvdb_id: Some(263365),
            imdb_id: None,
            daily: false,
        }
    }

    #[test]
    fn test_recent_requests() {
        let provider = NewznabProvider::new(config());
        let chain = provider.recent_requests();
        assert_eq!(chain.len(), 1);

        let pageable = &chain.tiers()[0].requests[0];
        assert_eq!(pageable.max_pages(), 1);
        let url = pageable.page(0).unwrap().full_url();
        assert!(url.starts_with("https://api.example/api?t=search&apikey=secret"));
        assert!(url.contains("offset=0"));
        assert!(url.contains("limit=50"));
    }

    #[test]
    fn test_rss_disabled_returns_empty_chain() {
        let mut config = config();
        config.enable_rss = false;
        assert!(NewznabProvider::new(config).recent_requests().is_empty());
    }

    #[test]
    fn test_episode_without_id_support_is_text_only() {
        let provider = NewznabProvider::new(config());
        let chain = provider.search_requests(&criteria(CriteriaTarget::Episode {
            series: series(),
            season: 2,
            episodes: vec![5],
        }));

        assert_eq!(chain.len(), 1);
        assert_eq!(chain.tiers()[0].label, "text");
        let request = chain.tiers()[0].requests[0].page(0).unwrap();
        assert_eq!(request.param("t"), Some("tvsearch"));
        assert_eq!(request.param("q"), Some("Marvels Agents of S H I E L D"));
        assert_eq!(request.param("season"), Some("2"));
        assert_eq!(request.param("ep"), Some("5"));
        assert_eq!(request.param("cat"), Some("5000"));
    }

    #[test]
    fn test_episode_with_ids_falls_back_to_text() {
        let mut config = config();
        config.supports_tv_ids = true;
        let provider = NewznabProvider::new(config);
        let chain = provider.search_requests(&criteria(CriteriaTarget::Episode {
            series: series(),
            season: 2,
            episodes: vec![5],
        }));

        assert_eq!(chain.len(), 2);
        assert_eq!(chain.tiers()[0].label, "ids");
        let request = chain.tiers()[0].requests[0].page(0).unwrap();
        assert_eq!(request.param("tvdbid"), Some("263365"));
        assert!(request.param("q").is_none());
        assert_eq!(chain.tiers()[1].label, "text");
    }

    #[test]
    fn test_daily_episode_params() {
        let mut daily = series();
        daily.daily = true;
        let provider = NewznabProvider::new(config());
        let chain = provider.search_requests(&criteria(CriteriaTarget::DailyEpisode {
            series: daily,
            air_date: NaiveDate::from_ymd_opt(2024, 2, 9).unwrap(),
        }));
        let request = chain.tiers()[0].requests[0].page(0).unwrap();
        assert_eq!(request.param("season"), Some("2024"));
        assert_eq!(request.param("ep"), Some("02/09"));
        assert!(request.full_url().contains("ep=02%2F09"));
    }

    #[test]
    fn test_movie_imdb() {
        let mut config = config();
        config.supports_movie_ids = true;
        config.categories = vec![2040, 2045];
        let provider = NewznabProvider::new(config);
        let chain = provider.search_requests(&criteria(CriteriaTarget::Movie {
            title: "The Movie".to_string(),
            year: Some(2020),
            imdb_id: Some("tt0123456".to_string()),
        }));

        let ids = chain.tiers()[0].requests[0].page(0).unwrap();
        assert_eq!(ids.param("t"), Some("movie"));
        assert_eq!(ids.param("imdbid"), Some("0123456"));
        assert_eq!(ids.param("cat"), Some("2040,2045"));

        let text = chain.tiers()[1].requests[0].page(0).unwrap();
        assert_eq!(text.param("q"), Some("The Movie 2020"));
    }

    #[test]
    fn test_album_music_search() {
        let mut config = config();
        config.kind = IndexerKind::Torznab;
        config.supports_music_search = true;
        let provider = NewznabProvider::new(config);
        assert_eq!(provider.flavour(), Flavour::Torznab);

        let chain = provider.search_requests(&criteria(CriteriaTarget::Album {
            artist: "Artist Name".to_string(),
            album: "Album Title".to_string(),
            year: Some(2020),
        }));
        let music = chain.tiers()[0].requests[0].page(0).unwrap();
        assert_eq!(music.param("t"), Some("music"));
        assert_eq!(music.param("artist"), Some("Artist Name"));
        assert_eq!(music.param("cat"), Some("3000"));

        let text = chain.tiers()[1].requests[0].page(0).unwrap();
        assert_eq!(text.param("q"), Some("Artist Name Album Title"));
    }

    #[test]
    fn test_search_paging() {
        let provider = NewznabProvider::new(config());
        let chain = provider.search_requests(&criteria(CriteriaTarget::SeasonPack {
            series: series(),
            season: 1,
        }));
        let pageable = &chain.tiers()[0].requests[0];
        assert_eq!(pageable.max_pages(), 3);
        assert_eq!(pageable.page(2).unwrap().param("offset"), Some("100"));
        assert!(pageable.page(3).is_none());
    }

    #[test]
    fn test_interactive_disabled() {
        let mut config = config();
        config.enable_interactive_search = false;
        let provider = NewznabProvider::new(config);

        let mut interactive = criteria(CriteriaTarget::SeasonPack {
            series: series(),
            season: 1,
        });
        interactive.mode = SearchMode::Interactive;
        assert!(provider.search_requests(&interactive).is_empty());

        interactive.mode = SearchMode::Automatic;
        assert!(!provider.search_requests(&interactive).is_empty());
    }
}
