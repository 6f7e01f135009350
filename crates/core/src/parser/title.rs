//! Media token extraction: a cascade of alternative title layouts.
//!
//! Layouts are tried in order; the first whose required groups all resolve to
//! non-empty values wins.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex_lite::{Captures, Regex};

use super::clean::clean_title;
use super::types::{MediaKind, MediaToken};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LayoutShape {
    Episode,
    Daily,
    SeasonPack,
    Album,
    DottedAlbum,
    Movie,
}

struct Layout {
    name: &'static str,
    shape: LayoutShape,
    /// Only tried when the title carries an audio quality.
    audio_only: bool,
    regex: Regex,
}

/// A layout that resolved.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct LayoutMatch {
    pub layout: &'static str,
    pub kind: MediaKind,
    pub tokens: Vec<MediaToken>,
    /// Byte offset where the identifying part of the title ends.
    pub end: usize,
}

const YEAR: &str = r"(?:19|20)\d{2}";

static LAYOUTS: Lazy<Vec<Layout>> = Lazy::new(|| {
    let defs: Vec<(&'static str, LayoutShape, bool, String)> = vec![
        (
            "episode_sxxeyy",
            LayoutShape::Episode,
            false,
            r"(?i)^(?P<title>.+?)[-_. ]+S(?P<season>\d{1,3})(?P<episodes>(?:[-_. ]?E\d{1,3})+)"
                .to_string(),
        ),
        (
            "episode_nxnn",
            LayoutShape::Episode,
            false,
            r"(?i)^(?P<title>.+?)[-_. ]+(?P<season>\d{1,2})x(?P<episodes>\d{1,3}(?:[-x]\d{1,3})*)\b"
                .to_string(),
        ),
        (
            "episode_verbose",
            LayoutShape::Episode,
            false,
            r"(?i)^(?P<title>.+?)[-_. ]+season[-_. ]*(?P<season>\d{1,2})[-_. ]+episode[-_. ]*(?P<episodes>\d{1,3})\b"
                .to_string(),
        ),
        (
            "daily",
            LayoutShape::Daily,
            false,
            format!(
                r"(?i)^(?P<title>.+?)[-_. ]+(?P<year>{YEAR})[-_. ](?P<month>\d{{2}})[-_. ](?P<day>\d{{2}})\b"
            ),
        ),
        (
            "season_pack",
            LayoutShape::SeasonPack,
            false,
            r"(?i)^(?P<title>.+?)[-_. ]+S(?P<season>\d{1,2})\b".to_string(),
        ),
        (
            "season_pack_verbose",
            LayoutShape::SeasonPack,
            false,
            r"(?i)^(?P<title>.+?)[-_. ]+season[-_. ]*(?P<season>\d{1,2})\b".to_string(),
        ),
        (
            "album_paren_year",
            LayoutShape::Album,
            true,
            format!(
                r"^(?P<artist>.+?)\s+-\s+(?P<album>.+?)\s*[(\[](?P<year>{YEAR})[)\]]"
            ),
        ),
        (
            "album_dash_year",
            LayoutShape::Album,
            true,
            format!(r"^(?P<artist>.+?)\s+-\s+(?P<album>.+?)\s+-\s+(?P<year>{YEAR})\b"),
        ),
        (
            "album_scene",
            LayoutShape::Album,
            true,
            format!(
                r"(?i)^(?P<artist>[^-]+?)-(?P<album>[^-]+?)-(?:(?:web|cd|cdr|vinyl|vls|flac|mp3|\d{{1,2}}cd|ep|single|bonus)-)*(?P<year>{YEAR})\b"
            ),
        ),
        (
            "album_dotted",
            LayoutShape::DottedAlbum,
            true,
            format!(r"^(?P<words>[^-_. ]+(?:[_. ][^-_. ]+)+?)[_. ]+(?P<year>{YEAR})\b"),
        ),
        (
            "movie_paren_year",
            LayoutShape::Movie,
            false,
            format!(r"^(?P<title>.+?)[-_. ]*[(\[](?P<year>{YEAR})[)\]]"),
        ),
        (
            "movie_year_in_title",
            LayoutShape::Movie,
            false,
            format!(r"^(?P<title>.+?[-_. ]+{YEAR})[-_. ]+(?P<year>{YEAR})\b"),
        ),
        (
            "movie_year",
            LayoutShape::Movie,
            false,
            format!(r"^(?P<title>.+?)[-_. ]+(?P<year>{YEAR})\b"),
        ),
    ];

    defs.into_iter()
        .map(|(name, shape, audio_only, pattern)| Layout {
            name,
            shape,
            audio_only,
            regex: Regex::new(&pattern)
                .unwrap_or_else(|e| panic!("invalid title layout '{}': {}", name, e)),
        })
        .collect()
});

/// Run the layout cascade over a cleaned title.
pub(crate) fn match_layout(text: &str, has_audio_quality: bool) -> Option<LayoutMatch> {
    LAYOUTS
        .iter()
        .filter(|layout| has_audio_quality || !layout.audio_only)
        .find_map(|layout| {
            let caps = layout.regex.captures(text)?;
            let end = caps.get(0)?.end();
            let (kind, tokens) = extract(layout.shape, &caps)?;
            Some(LayoutMatch {
                layout: layout.name,
                kind,
                tokens,
                end,
            })
        })
}

fn extract(shape: LayoutShape, caps: &Captures<'_>) -> Option<(MediaKind, Vec<MediaToken>)> {
    match shape {
        LayoutShape::Episode => {
            let title = required_text(caps, "title")?;
            let season = number::<u32>(caps, "season")?;
            let episodes = digit_runs(caps.name("episodes")?.as_str());
            if episodes.is_empty() {
                return None;
            }
            let mut tokens = vec![MediaToken::Title(title), MediaToken::Season(season)];
            tokens.extend(episodes.into_iter().map(MediaToken::Episode));
            Some((MediaKind::Episode, tokens))
        }
        LayoutShape::Daily => {
            let title = required_text(caps, "title")?;
            let date = NaiveDate::from_ymd_opt(
                number::<i32>(caps, "year")?,
                number::<u32>(caps, "month")?,
                number::<u32>(caps, "day")?,
            )?;
            Some((
                MediaKind::DailyEpisode,
                vec![MediaToken::Title(title), MediaToken::AirDate(date)],
            ))
        }
        LayoutShape::SeasonPack => {
            let title = required_text(caps, "title")?;
            let season = number::<u32>(caps, "season")?;
            Some((
                MediaKind::SeasonPack,
                vec![MediaToken::Title(title), MediaToken::Season(season)],
            ))
        }
        LayoutShape::Album => {
            let artist = required_text(caps, "artist")?;
            let album = required_text(caps, "album")?;
            let year = number::<u16>(caps, "year")?;
            Some((
                MediaKind::Album,
                vec![
                    MediaToken::Artist(artist),
                    MediaToken::Album(album),
                    MediaToken::Year(year),
                ],
            ))
        }
        LayoutShape::DottedAlbum => {
            let words: Vec<&str> = caps
                .name("words")?
                .as_str()
                .split(['.', '_', ' '])
                .filter(|w| !w.is_empty())
                .collect();
            if words.len() < 2 {
                return None;
            }
            // No separator marks the artist/album boundary; split evenly.
            let split = words.len() / 2;
            let year = number::<u16>(caps, "year")?;
            Some((
                MediaKind::Album,
                vec![
                    MediaToken::Artist(words[..split].join(" ")),
                    MediaToken::Album(words[split..].join(" ")),
                    MediaToken::Year(year),
                ],
            ))
        }
        LayoutShape::Movie => {
            let title = required_text(caps, "title")?;
            let year = number::<u16>(caps, "year")?;
            Some((
                MediaKind::Movie,
                vec![MediaToken::Title(title), MediaToken::Year(year)],
            ))
        }
    }
}

fn required_text(caps: &Captures<'_>, group: &str) -> Option<String> {
    let cleaned = clean_title(caps.name(group)?.as_str());
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

fn number<T: std::str::FromStr>(caps: &Captures<'_>, group: &str) -> Option<T> {
    caps.name(group)?.as_str().parse().ok()
}

fn digit_runs(text: &str) -> Vec<u32> {
    text.split(|c: char| !c.is_ascii_digit())
        .filter(|run| !run.is_empty())
        .filter_map(|run| run.parse().ok())
        .collect()
}
