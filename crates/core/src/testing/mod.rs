//! Testing utilities and mock implementations.
//!
//! Provides a scripted [`MockTransport`] so the decision engine can be driven
//! end to end without a network, plus fixtures for feeds and profiles.
//!
//! # Example
//!
//! ```rust,ignore
//! use quarry_core::testing::{fixtures, MockTransport, RequestMatch};
//!
//! let transport = MockTransport::new();
//! transport
//!     .respond(
//!         RequestMatch::Any,
//!         fixtures::newznab_feed(&[fixtures::FeedItem::new("Some.Show.S01E01.720p.HDTV-GRP")]),
//!     )
//!     .await;
//! ```

mod mock_transport;

pub use mock_transport::{MockReply, MockTransport, RecordedRequest, RequestMatch};

/// Test fixtures and helper functions.
pub mod fixtures {
    use chrono::{DateTime, TimeZone, Utc};

    use crate::config::{IndexerConfig, IndexerKind};
    use crate::language::Language;
    use crate::profile::{LanguageProfile, ProfileSet, QualityProfile};
    use crate::quality::Quality;

    /// One item of a generated feed.
    #[derive(Debug, Clone)]
    pub struct FeedItem {
        pub title: String,
        pub guid: Option<String>,
        pub size_bytes: u64,
        pub seeders: Option<u32>,
        pub category: u32,
        pub publish_date: DateTime<Utc>,
    }

    impl FeedItem {
        /// An item with reasonable defaults; the guid is derived from the title.
        pub fn new(title: &str) -> Self {
            Self {
                title: title.to_string(),
                guid: Some(format!("guid-{}", title.to_lowercase())),
                size_bytes: 1024 * 1024 * 1024, // 1 GB
                seeders: None,
                category: 5000,
                publish_date: fixed_time(),
            }
        }

        pub fn seeders(mut self, seeders: u32) -> Self {
            self.seeders = Some(seeders);
            self
        }

        pub fn category(mut self, category: u32) -> Self {
            self.category = category;
            self
        }

        pub fn without_guid(mut self) -> Self {
            self.guid = None;
            self
        }
    }

    /// A fixed clock reading for deterministic tests.
    pub fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0)
            .single()
            .unwrap_or_default()
    }

    /// A Newznab search response.
    pub fn newznab_feed(items: &[FeedItem]) -> String {
        feed("newznab", "http://www.newznab.com/DTD/2010/feeds/attributes/", items)
    }

    /// A Torznab search response.
    pub fn torznab_feed(items: &[FeedItem]) -> String {
        feed("torznab", "http://torznab.com/schemas/2015/feed", items)
    }

    /// A Newznab error document.
    pub fn newznab_error(code: u32, description: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<error code="{}" description="{}"/>"#,
            code,
            escape(description)
        )
    }

    fn feed(prefix: &str, namespace: &str, items: &[FeedItem]) -> String {
        let mut xml = format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:{prefix}="{namespace}">
<channel>
<title>mock</title>
"#
        );
        for item in items {
            xml.push_str("<item>\n");
            xml.push_str(&format!("<title>{}</title>\n", escape(&item.title)));
            if let Some(guid) = &item.guid {
                xml.push_str(&format!("<guid>{}</guid>\n", escape(guid)));
            }
            xml.push_str(&format!(
                "<link>https://indexer.example/get/{}</link>\n",
                item.title.len()
            ));
            xml.push_str(&format!(
                "<pubDate>{}</pubDate>\n",
                item.publish_date.to_rfc2822()
            ));
            xml.push_str(&format!(
                "<{prefix}:attr name=\"size\" value=\"{}\"/>\n",
                item.size_bytes
            ));
            xml.push_str(&format!(
                "<{prefix}:attr name=\"category\" value=\"{}\"/>\n",
                item.category
            ));
            if let Some(seeders) = item.seeders {
                xml.push_str(&format!(
                    "<{prefix}:attr name=\"seeders\" value=\"{}\"/>\n",
                    seeders
                ));
            }
            xml.push_str("</item>\n");
        }
        xml.push_str("</channel>\n</rss>\n");
        xml
    }

    fn escape(text: &str) -> String {
        text.replace('&', "&amp;")
            .replace('<', "&lt;")
            .replace('>', "&gt;")
            .replace('"', "&quot;")
    }

    /// A Jackett results document.
    pub fn jackett_json(items: &[FeedItem]) -> String {
        let results: Vec<_> = items
            .iter()
            .map(|item| {
                serde_json::json!({
                    "Title": item.title,
                    "Guid": item.guid,
                    "Link": format!("https://jackett.example/dl/{}", item.title.len()),
                    "Size": item.size_bytes,
                    "Seeders": item.seeders,
                    "Peers": item.seeders,
                    "Category": [item.category],
                    "PublishDate": item.publish_date.to_rfc3339(),
                })
            })
            .collect();
        serde_json::json!({ "Results": results }).to_string()
    }

    /// HD qualities, most preferred first, cutoff at Bluray-1080p.
    pub fn hd_profile() -> QualityProfile {
        QualityProfile::allowing(
            1,
            "HD",
            &[
                Quality::Bluray1080p,
                Quality::WebDl1080p,
                Quality::WebDl720p,
                Quality::Hdtv720p,
            ],
            Quality::Bluray1080p,
        )
    }

    /// English only, untagged releases allowed.
    pub fn english_profile() -> LanguageProfile {
        LanguageProfile::allowing(1, "English", &[Language::English], true)
    }

    pub fn profile_set() -> ProfileSet {
        ProfileSet::new(hd_profile(), english_profile())
    }

    /// A Newznab indexer with an API key, 100 results per page, 5 pages.
    pub fn newznab_indexer(name: &str) -> IndexerConfig {
        let mut config = IndexerConfig::new(
            name,
            IndexerKind::Newznab,
            format!("https://{}.example", name),
        );
        config.api_key = format!("{}-key", name);
        config
    }

    /// A Torznab indexer addressed the same way.
    pub fn torznab_indexer(name: &str) -> IndexerConfig {
        let mut config = newznab_indexer(name);
        config.kind = IndexerKind::Torznab;
        config
    }
}
