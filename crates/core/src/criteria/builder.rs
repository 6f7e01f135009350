//! Builds search criteria from a target and an intent.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::profile::ProfileSet;

use super::types::{
    CriteriaTarget, EpisodeInfo, SearchCriteria, SearchIntent, SearchMode, SearchTarget, SeriesRef,
};

/// Turns a media target and search intent into ordered [`SearchCriteria`].
///
/// The only time input is the `as_of` timestamp given at construction, which
/// decides whether an episode has aired yet.
#[derive(Debug, Clone, Copy)]
pub struct SearchCriteriaBuilder {
    as_of: DateTime<Utc>,
}

impl SearchCriteriaBuilder {
    pub fn new(as_of: DateTime<Utc>) -> Self {
        Self { as_of }
    }

    pub fn as_of(&self) -> DateTime<Utc> {
        self.as_of
    }

    /// Build criteria, pack-first for seasons.
    ///
    /// Returns an empty list when there is nothing worth searching for: an
    /// upgrade whose held quality already meets the cutoff, a profile that
    /// forbids upgrades, or a season with no aired wanted episodes.
    pub fn build(
        &self,
        target: &SearchTarget,
        intent: &SearchIntent,
        profiles: &ProfileSet,
    ) -> Vec<SearchCriteria> {
        let current_quality = match intent {
            SearchIntent::Upgrade { current } => {
                if !profiles.quality.upgrade_allowed {
                    debug!(profile = %profiles.quality.name, "Upgrades disabled, skipping search");
                    return Vec::new();
                }
                if profiles.quality.cutoff_met(current) {
                    debug!(
                        profile = %profiles.quality.name,
                        current = %current.level,
                        "Cutoff already met, skipping search"
                    );
                    return Vec::new();
                }
                Some(current.clone())
            }
            SearchIntent::Missing | SearchIntent::Manual => None,
        };
        let mode = match intent {
            SearchIntent::Manual => SearchMode::Interactive,
            _ => SearchMode::Automatic,
        };
        let criteria = |target: CriteriaTarget, tier: usize| SearchCriteria {
            target,
            mode,
            tier,
            quality_profile_id: profiles.quality.id,
            language_profile_id: profiles.language.id,
            current_quality: current_quality.clone(),
            as_of: self.as_of,
        };

        let built = match target {
            SearchTarget::Movie {
                title,
                year,
                imdb_id,
            } => vec![criteria(
                CriteriaTarget::Movie {
                    title: title.clone(),
                    year: *year,
                    imdb_id: imdb_id.clone(),
                },
                0,
            )],
            SearchTarget::Album {
                artist,
                album,
                year,
            } => vec![criteria(
                CriteriaTarget::Album {
                    artist: artist.clone(),
                    album: album.clone(),
                    year: *year,
                },
                0,
            )],
            SearchTarget::Episode { series, episode } => {
                if !self.is_wanted(episode, intent) {
                    debug!(series = %series.title, episode = episode.episode, "Episode not wanted");
                    return Vec::new();
                }
                vec![criteria(episode_target(series, episode), 0)]
            }
            SearchTarget::Season {
                series,
                season,
                episodes,
            } => {
                let wanted: Vec<&EpisodeInfo> = episodes
                    .iter()
                    .filter(|e| e.season == *season && self.is_wanted(e, intent))
                    .collect();

                match wanted.as_slice() {
                    [] => Vec::new(),
                    [single] => vec![criteria(episode_target(series, single), 0)],
                    many => {
                        let mut built = Vec::with_capacity(many.len() + 1);
                        built.push(criteria(
                            CriteriaTarget::SeasonPack {
                                series: series.clone(),
                                season: *season,
                            },
                            0,
                        ));
                        built.extend(many.iter().map(|e| criteria(episode_target(series, e), 1)));
                        built
                    }
                }
            }
        };

        debug!(count = built.len(), mode = ?mode, "Built search criteria");
        built
    }

    /// Whether an episode should be searched for under this intent.
    fn is_wanted(&self, episode: &EpisodeInfo, intent: &SearchIntent) -> bool {
        match intent {
            SearchIntent::Manual => true,
            SearchIntent::Missing => !episode.has_file && self.has_aired(episode),
            SearchIntent::Upgrade { .. } => episode.has_file && self.has_aired(episode),
        }
    }

    fn has_aired(&self, episode: &EpisodeInfo) -> bool {
        match episode.air_date {
            Some(date) => date <= self.as_of.date_naive(),
            None => false,
        }
    }
}

fn episode_target(series: &SeriesRef, episode: &EpisodeInfo) -> CriteriaTarget {
    match (series.daily, episode.air_date) {
        (true, Some(air_date)) => CriteriaTarget::DailyEpisode {
            series: series.clone(),
            air_date,
        },
        _ => CriteriaTarget::Episode {
            series: series.clone(),
            season: episode.season,
            episodes: vec![episode.episode],
        },
    }
}
