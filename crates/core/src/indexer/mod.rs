//! Indexer request generation, transport and response parsing.

mod jackett;
mod newznab;
mod rate_limiter;
mod rss;
mod transport;
mod types;

pub use jackett::JackettProvider;
pub use newznab::{Flavour, NewznabProvider};
pub use rate_limiter::{RateLimiterPool, TokenBucket};
pub use rss::{parse_feed, RssFeedProvider};
pub use transport::{HttpTransport, Transport, TransportError, TransportResponse};
pub use types::*;

use std::sync::Arc;

use crate::config::{IndexerConfig, IndexerKind};
use crate::criteria::{CriteriaTarget, SearchMode};

/// Create the provider for an indexer configuration.
pub fn create_provider(config: &IndexerConfig) -> Arc<dyn IndexerProvider> {
    match config.kind {
        IndexerKind::Newznab | IndexerKind::Torznab => Arc::new(NewznabProvider::new(config.clone())),
        IndexerKind::Jackett => Arc::new(JackettProvider::new(config.clone())),
        IndexerKind::Rss => Arc::new(RssFeedProvider::from_config(config)),
    }
}

/// Whether the indexer takes part in searches of this mode.
pub(crate) fn search_enabled(config: &IndexerConfig, mode: SearchMode) -> bool {
    match mode {
        SearchMode::Interactive => config.enable_interactive_search,
        SearchMode::Automatic => config.enable_automatic_search,
        SearchMode::Rss => config.enable_rss,
    }
}

/// Standard category ids for a target when none are configured.
pub(crate) fn default_categories(target: &CriteriaTarget) -> Vec<u32> {
    match target {
        CriteriaTarget::Movie { .. } => vec![2000],
        CriteriaTarget::Episode { .. }
        | CriteriaTarget::DailyEpisode { .. }
        | CriteriaTarget::SeasonPack { .. } => vec![5000],
        CriteriaTarget::Album { .. } => vec![3000],
    }
}

/// Reduce a title to a plain search term.
///
/// Apostrophes are dropped, `&` becomes "and", other punctuation becomes a space.
pub fn search_term(title: &str) -> String {
    let mut term = String::with_capacity(title.len());
    for c in title.chars() {
        match c {
            '\'' | '\u{2019}' => {}
            '&' => term.push_str(" and "),
            c if c.is_alphanumeric() => term.push(c),
            _ => term.push(' '),
        }
    }
    term.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_term() {
        assert_eq!(search_term("Marvel's Agents of S.H.I.E.L.D."), "Marvels Agents of S H I E L D");
        assert_eq!(search_term("Law & Order: SVU"), "Law and Order SVU");
        assert_eq!(search_term("  Amélie  "), "Amélie");
    }

    #[test]
    fn test_create_provider_by_kind() {
        let newznab = IndexerConfig::new("nz", IndexerKind::Newznab, "https://nz.example");
        let torznab = IndexerConfig::new("tz", IndexerKind::Torznab, "https://tz.example");
        let jackett = IndexerConfig::new("jk", IndexerKind::Jackett, "http://localhost:9117");
        let rss = IndexerConfig::new("feed", IndexerKind::Rss, "https://example.org/rss");

        assert!(create_provider(&newznab).capabilities().pagination);
        assert_eq!(create_provider(&torznab).name(), "tz");
        assert!(!create_provider(&jackett).capabilities().rss);
        assert!(!create_provider(&rss).capabilities().search);
    }
}
