//! RSS feed parsing (plain RSS, Newznab and Torznab) and the plain feed provider.

use chrono::{DateTime, Utc};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::{debug, warn};

use crate::config::IndexerConfig;
use crate::criteria::SearchCriteria;

use super::transport::TransportResponse;
use super::types::{
    AcceptType, Capabilities, IndexerError, IndexerProvider, IndexerRequest, PageableRequest,
    ReleaseItem, RequestChain,
};

/// Parse an RSS body into release items.
///
/// Understands `newznab:attr`/`torznab:attr` extensions and the Newznab
/// `<error code=".." description=".."/>` document.
pub fn parse_feed(indexer: &str, xml: &str) -> Result<Vec<ReleaseItem>, IndexerError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut items = Vec::new();
    let mut current: Option<ItemBuilder> = None;
    let mut current_tag = String::new();
    let mut saw_channel = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                let tag = tag_name(e);
                match tag.as_str() {
                    "rss" | "channel" | "feed" => saw_channel = true,
                    "item" => current = Some(ItemBuilder::default()),
                    "error" => return Err(api_error(e)),
                    _ => {
                        if let Some(item) = current.as_mut() {
                            item.apply_element(&tag, e);
                        }
                    }
                }
                current_tag = tag;
            }
            Ok(Event::Empty(ref e)) => {
                let tag = tag_name(e);
                if tag == "error" {
                    return Err(api_error(e));
                }
                if let Some(item) = current.as_mut() {
                    item.apply_element(&tag, e);
                }
            }
            Ok(Event::Text(ref e)) => {
                if let Some(item) = current.as_mut() {
                    let text = e.unescape().unwrap_or_default().to_string();
                    if !text.is_empty() {
                        item.apply_text(&current_tag, text);
                    }
                }
            }
            Ok(Event::CData(ref e)) => {
                if let Some(item) = current.as_mut() {
                    let text = String::from_utf8_lossy(e.as_ref()).trim().to_string();
                    if !text.is_empty() {
                        item.apply_text(&current_tag, text);
                    }
                }
            }
            Ok(Event::End(ref e)) => {
                if e.name().as_ref() == b"item" {
                    if let Some(item) = current.take().and_then(|b| b.build(indexer)) {
                        items.push(item);
                    }
                }
                current_tag.clear();
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(IndexerError::MalformedResponse(format!(
                    "XML parse error at {}: {}",
                    reader.error_position(),
                    e
                )))
            }
            _ => {}
        }
    }

    if !saw_channel {
        return Err(IndexerError::MalformedResponse(
            "Response is not an RSS feed".to_string(),
        ));
    }

    debug!(indexer = %indexer, items = items.len(), "Parsed feed");
    Ok(items)
}

fn tag_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.name().as_ref()).to_string()
}

fn attribute(e: &BytesStart<'_>, name: &str) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == name.as_bytes())
        .map(|a| {
            a.unescape_value()
                .map(|v| v.to_string())
                .unwrap_or_else(|_| String::from_utf8_lossy(&a.value).to_string())
        })
}

/// Map a Newznab `<error>` element to an indexer error.
fn api_error(e: &BytesStart<'_>) -> IndexerError {
    let code = attribute(e, "code")
        .and_then(|c| c.parse::<u32>().ok())
        .unwrap_or(0);
    let description = attribute(e, "description").unwrap_or_default();

    if (100..200).contains(&code) {
        IndexerError::InvalidApiKey
    } else if description.contains("Request limit reached") {
        IndexerError::RequestLimitReached
    } else {
        IndexerError::Api { code, description }
    }
}

#[derive(Debug, Default)]
struct ItemBuilder {
    title: Option<String>,
    guid: Option<String>,
    link: Option<String>,
    comments: Option<String>,
    enclosure_url: Option<String>,
    size: Option<u64>,
    seeders: Option<u32>,
    peers: Option<u32>,
    pub_date: Option<DateTime<Utc>>,
    categories: Vec<u32>,
}

impl ItemBuilder {
    fn apply_element(&mut self, tag: &str, e: &BytesStart<'_>) {
        match tag {
            "enclosure" => {
                if let Some(url) = attribute(e, "url") {
                    self.enclosure_url = Some(url);
                }
                if self.size.is_none() {
                    self.size = attribute(e, "length").and_then(|l| l.parse().ok());
                }
            }
            "newznab:attr" | "torznab:attr" => {
                if let (Some(name), Some(value)) = (attribute(e, "name"), attribute(e, "value")) {
                    self.apply_attr(&name, &value);
                }
            }
            _ => {}
        }
    }

    fn apply_attr(&mut self, name: &str, value: &str) {
        match name {
            "size" => self.size = value.parse().ok().or(self.size),
            "seeders" => self.seeders = value.parse().ok(),
            "peers" => self.peers = value.parse().ok(),
            "guid" => self.guid = Some(value.to_string()),
            "category" => {
                if let Ok(category) = value.parse() {
                    if !self.categories.contains(&category) {
                        self.categories.push(category);
                    }
                }
            }
            _ => {}
        }
    }

    fn apply_text(&mut self, tag: &str, text: String) {
        match tag {
            "title" => self.title = Some(text),
            "guid" => {
                if self.guid.is_none() {
                    self.guid = Some(text);
                }
            }
            "link" => self.link = Some(text),
            "comments" => self.comments = Some(text),
            "pubDate" => self.pub_date = parse_rfc822_date(&text),
            "size" => self.size = text.parse().ok().or(self.size),
            "category" => {
                if let Ok(category) = text.parse() {
                    if !self.categories.contains(&category) {
                        self.categories.push(category);
                    }
                }
            }
            _ => {}
        }
    }

    fn build(self, indexer: &str) -> Option<ReleaseItem> {
        let title = self.title?;
        Some(ReleaseItem {
            title,
            indexer: indexer.to_string(),
            guid: self.guid,
            download_url: self.enclosure_url.or(self.link),
            info_url: self.comments,
            size_bytes: self.size.unwrap_or(0),
            seeders: self.seeders,
            peers: self.peers,
            publish_date: self.pub_date,
            categories: self.categories,
        })
    }
}

/// Parse RFC 822 dates as used by RSS feeds.
fn parse_rfc822_date(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    warn!(date_string = s, "Failed to parse date");
    None
}

/// A plain RSS feed: recent releases only, no search.
pub struct RssFeedProvider {
    name: String,
    url: String,
}

impl RssFeedProvider {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }

    pub fn from_config(config: &IndexerConfig) -> Self {
        Self::new(config.name.clone(), config.url.clone())
    }
}

impl IndexerProvider for RssFeedProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            rss: true,
            search: false,
            pagination: false,
        }
    }

    fn recent_requests(&self) -> RequestChain {
        let request = IndexerRequest::new(self.name.clone(), self.url.clone(), AcceptType::Rss);
        RequestChain::new().with_tier("recent", vec![PageableRequest::single(request)])
    }

    fn search_requests(&self, _criteria: &SearchCriteria) -> RequestChain {
        RequestChain::new()
    }

    fn parse_response(
        &self,
        _request: &IndexerRequest,
        response: &TransportResponse,
    ) -> Result<Vec<ReleaseItem>, IndexerError> {
        parse_feed(&self.name, &response.body)
    }
}
