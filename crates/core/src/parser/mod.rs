//! Release title parsing.
//!
//! [`parse`] turns a free-text release title into a [`ParsedReleaseInfo`]. It
//! is total and deterministic: any string, including empty or non-ASCII input,
//! yields a value, and the same input always yields the same value.

mod clean;
mod patterns;
mod quality;
mod release_group;
mod title;
mod types;

pub use clean::normalize_title;
pub use patterns::{Extraction, PatternCategory, PatternRule, RuleMatch, TitlePatternLibrary};
pub use types::{MediaKind, MediaToken, ParsedReleaseInfo, SpecialFlag};

use std::collections::BTreeSet;
use tracing::debug;

use crate::quality::Modifier;

/// Parse a title with the built-in pattern library.
pub fn parse(title: &str) -> ParsedReleaseInfo {
    TitleParser::standard().parse(title)
}

/// Title parser bound to a pattern library.
#[derive(Debug, Clone, Copy)]
pub struct TitleParser<'a> {
    library: &'a TitlePatternLibrary,
}

impl TitleParser<'static> {
    pub fn standard() -> Self {
        Self::new(TitlePatternLibrary::standard())
    }
}

impl<'a> TitleParser<'a> {
    pub fn new(library: &'a TitlePatternLibrary) -> Self {
        Self { library }
    }

    pub fn parse(&self, raw_title: &str) -> ParsedReleaseInfo {
        let trimmed = raw_title.trim();
        if trimmed.is_empty() {
            return ParsedReleaseInfo::unmatched(raw_title);
        }

        let (without_ext, extension) = clean::strip_extension(trimmed);
        let cleaned = clean::strip_site_markers(without_ext);
        // Underscores separate words just like dots and spaces.
        let text = cleaned.replace('_', " ");

        let (quality, codec) = quality::parse_quality(self.library, &text, extension.as_deref());

        let layout = title::match_layout(&text, quality.level.is_audio());
        let tail = match &layout {
            Some(m) => &text[m.end..],
            None => text.as_str(),
        };

        let languages: BTreeSet<_> = self
            .library
            .all_matches(PatternCategory::Language, tail)
            .into_iter()
            .filter_map(|m| match m.extraction() {
                Extraction::Language(language) => Some(language),
                _ => None,
            })
            .collect();

        let edition = self
            .library
            .first_match(PatternCategory::Edition, tail)
            .and_then(|m| match m.extraction() {
                Extraction::Edition(edition) => Some(edition.to_string()),
                _ => None,
            });

        let mut special_flags: BTreeSet<_> = self
            .library
            .all_matches(PatternCategory::Special, tail)
            .into_iter()
            .filter_map(|m| match m.extraction() {
                Extraction::Flag(flag) => Some(flag),
                _ => None,
            })
            .collect();
        match quality.modifier {
            Modifier::Remux => {
                special_flags.insert(SpecialFlag::Remux);
            }
            Modifier::Disc => {
                special_flags.insert(SpecialFlag::DiscImage);
            }
            _ => {}
        }

        let release_group = release_group::parse_release_group(&cleaned);

        let (media_kind, matched_media_tokens) = match layout {
            Some(m) => {
                debug!(title = %raw_title, layout = m.layout, "Matched title layout");
                (m.kind, m.tokens)
            }
            None => {
                debug!(title = %raw_title, "No title layout matched");
                (MediaKind::Unknown, Vec::new())
            }
        };

        ParsedReleaseInfo {
            original_title: raw_title.to_string(),
            quality,
            languages,
            release_group,
            edition,
            special_flags,
            codec,
            media_kind,
            matched_media_tokens,
        }
    }
}
