//! Parsed release metadata.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::language::Language;
use crate::quality::{Codec, QualitySignal};

/// Boolean markers that do not change the quality level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecialFlag {
    Hdr,
    DolbyVision,
    Remux,
    ThreeD,
    HardcodedSubs,
    DiscImage,
}

/// Which layout the media tokens were extracted with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Unknown,
    Movie,
    Episode,
    DailyEpisode,
    SeasonPack,
    Album,
}

/// One identifying token pulled from the title, in title order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum MediaToken {
    Title(String),
    Year(u16),
    Season(u32),
    Episode(u32),
    AirDate(NaiveDate),
    Artist(String),
    Album(String),
}

/// Result of parsing one release title.
///
/// Parsing never fails; fields that could not be extracted hold their unknown
/// value (`Quality::Unknown`, empty sets, `None`, no tokens).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedReleaseInfo {
    pub original_title: String,
    pub quality: QualitySignal,
    /// Empty means unknown.
    pub languages: BTreeSet<Language>,
    pub release_group: Option<String>,
    pub edition: Option<String>,
    pub special_flags: BTreeSet<SpecialFlag>,
    pub codec: Option<Codec>,
    pub media_kind: MediaKind,
    pub matched_media_tokens: Vec<MediaToken>,
}

impl ParsedReleaseInfo {
    /// A record with every signal unknown.
    pub fn unmatched(original_title: &str) -> Self {
        Self {
            original_title: original_title.to_string(),
            quality: QualitySignal::unknown(),
            languages: BTreeSet::new(),
            release_group: None,
            edition: None,
            special_flags: BTreeSet::new(),
            codec: None,
            media_kind: MediaKind::Unknown,
            matched_media_tokens: Vec::new(),
        }
    }

    pub fn title(&self) -> Option<&str> {
        self.matched_media_tokens.iter().find_map(|t| match t {
            MediaToken::Title(s) => Some(s.as_str()),
            _ => None,
        })
    }

    pub fn year(&self) -> Option<u16> {
        self.matched_media_tokens.iter().find_map(|t| match t {
            MediaToken::Year(y) => Some(*y),
            _ => None,
        })
    }

    pub fn season(&self) -> Option<u32> {
        self.matched_media_tokens.iter().find_map(|t| match t {
            MediaToken::Season(s) => Some(*s),
            _ => None,
        })
    }

    pub fn episodes(&self) -> Vec<u32> {
        self.matched_media_tokens
            .iter()
            .filter_map(|t| match t {
                MediaToken::Episode(e) => Some(*e),
                _ => None,
            })
            .collect()
    }

    pub fn air_date(&self) -> Option<NaiveDate> {
        self.matched_media_tokens.iter().find_map(|t| match t {
            MediaToken::AirDate(d) => Some(*d),
            _ => None,
        })
    }

    pub fn artist(&self) -> Option<&str> {
        self.matched_media_tokens.iter().find_map(|t| match t {
            MediaToken::Artist(s) => Some(s.as_str()),
            _ => None,
        })
    }

    pub fn album(&self) -> Option<&str> {
        self.matched_media_tokens.iter().find_map(|t| match t {
            MediaToken::Album(s) => Some(s.as_str()),
            _ => None,
        })
    }

    pub fn has_media_tokens(&self) -> bool {
        !self.matched_media_tokens.is_empty()
    }
}
