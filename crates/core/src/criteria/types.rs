//! Search targets, intents and the criteria built from them.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::quality::QualitySignal;

/// A series as the search layer needs to know it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesRef {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tvdb_id: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imdb_id: Option<String>,
    /// Episodes are identified by air date rather than number.
    #[serde(default)]
    pub daily: bool,
}

impl SeriesRef {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            tvdb_id: None,
            imdb_id: None,
            daily: false,
        }
    }
}

/// One episode of a series and whether a file is already held for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpisodeInfo {
    pub season: u32,
    pub episode: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub air_date: Option<NaiveDate>,
    #[serde(default)]
    pub has_file: bool,
}

/// The media entity a search is for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SearchTarget {
    Movie {
        title: String,
        year: Option<u16>,
        imdb_id: Option<String>,
    },
    Episode {
        series: SeriesRef,
        episode: EpisodeInfo,
    },
    Season {
        series: SeriesRef,
        season: u32,
        episodes: Vec<EpisodeInfo>,
    },
    Album {
        artist: String,
        album: String,
        year: Option<u16>,
    },
}

/// Why a search is being run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SearchIntent {
    /// Nothing is held yet.
    Missing,
    /// A file is held at `current` and may be replaced.
    Upgrade { current: QualitySignal },
    /// User-initiated; availability and cutoff filters do not apply.
    Manual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    Rss,
    Interactive,
    Automatic,
}

/// The narrowed identity one criteria object searches for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CriteriaTarget {
    Movie {
        title: String,
        year: Option<u16>,
        imdb_id: Option<String>,
    },
    Episode {
        series: SeriesRef,
        season: u32,
        episodes: Vec<u32>,
    },
    DailyEpisode {
        series: SeriesRef,
        air_date: NaiveDate,
    },
    SeasonPack {
        series: SeriesRef,
        season: u32,
    },
    Album {
        artist: String,
        album: String,
        year: Option<u16>,
    },
}

impl CriteriaTarget {
    /// Short label for logs and reports.
    pub fn describe(&self) -> String {
        match self {
            CriteriaTarget::Movie { title, year, .. } => match year {
                Some(year) => format!("{} ({})", title, year),
                None => title.clone(),
            },
            CriteriaTarget::Episode {
                series,
                season,
                episodes,
            } => {
                let eps: Vec<String> = episodes.iter().map(|e| format!("E{:02}", e)).collect();
                format!("{} S{:02}{}", series.title, season, eps.join(""))
            }
            CriteriaTarget::DailyEpisode { series, air_date } => {
                format!("{} {}", series.title, air_date.format("%Y-%m-%d"))
            }
            CriteriaTarget::SeasonPack { series, season } => {
                format!("{} S{:02}", series.title, season)
            }
            CriteriaTarget::Album { artist, album, .. } => format!("{} - {}", artist, album),
        }
    }
}

/// One search intent, ready for request generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchCriteria {
    pub target: CriteriaTarget,
    pub mode: SearchMode,
    /// Fallback group: criteria with a higher tier are only searched when
    /// every lower tier produced nothing acceptable.
    pub tier: usize,
    pub quality_profile_id: u32,
    pub language_profile_id: u32,
    /// Quality already held, for upgrade searches.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_quality: Option<QualitySignal>,
    pub as_of: DateTime<Utc>,
}
