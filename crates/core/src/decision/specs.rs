//! Checks applied on top of the profile verdict when a release was fetched for
//! specific criteria.

use crate::criteria::{CriteriaTarget, SearchCriteria};
use crate::parser::{normalize_title, MediaKind, ParsedReleaseInfo};
use crate::profile::{QualityProfile, RejectionReason};
use crate::quality::QualityModel;

/// Whether the release is for the criteria's target.
pub fn check_target(parsed: &ParsedReleaseInfo, criteria: &SearchCriteria) -> Option<RejectionReason> {
    if !parsed.has_media_tokens() {
        return Some(RejectionReason::UnknownMedia);
    }
    if matches_target(parsed, &criteria.target) {
        None
    } else {
        Some(RejectionReason::TargetMismatch)
    }
}

fn matches_target(parsed: &ParsedReleaseInfo, target: &CriteriaTarget) -> bool {
    match target {
        CriteriaTarget::Movie { title, year, .. } => {
            parsed.media_kind == MediaKind::Movie
                && same_title(parsed.title(), title)
                && same_year(parsed.year(), *year)
        }
        CriteriaTarget::Episode {
            series,
            season,
            episodes,
        } => {
            let found = parsed.episodes();
            parsed.media_kind == MediaKind::Episode
                && same_title(parsed.title(), &series.title)
                && parsed.season() == Some(*season)
                && episodes.iter().all(|e| found.contains(e))
        }
        CriteriaTarget::DailyEpisode { series, air_date } => {
            parsed.media_kind == MediaKind::DailyEpisode
                && same_title(parsed.title(), &series.title)
                && parsed.air_date() == Some(*air_date)
        }
        CriteriaTarget::SeasonPack { series, season } => {
            parsed.media_kind == MediaKind::SeasonPack
                && same_title(parsed.title(), &series.title)
                && parsed.season() == Some(*season)
        }
        CriteriaTarget::Album {
            artist,
            album,
            year,
        } => {
            // Dotted layouts cannot place the artist/album boundary reliably,
            // so compare the two together.
            let found = format!(
                "{}{}",
                parsed.artist().unwrap_or_default(),
                parsed.album().unwrap_or_default()
            );
            parsed.media_kind == MediaKind::Album
                && normalize_title(&found) == normalize_title(&format!("{}{}", artist, album))
                && same_year(parsed.year(), *year)
        }
    }
}

fn same_title(found: Option<&str>, wanted: &str) -> bool {
    found.is_some_and(|found| {
        let found = normalize_title(found);
        !found.is_empty() && found == normalize_title(wanted)
    })
}

/// Years only disagree when both are known.
fn same_year(found: Option<u16>, wanted: Option<u16>) -> bool {
    match (found, wanted) {
        (Some(found), Some(wanted)) => found == wanted,
        _ => true,
    }
}

/// Checks for criteria carrying a held quality.
pub fn check_upgrade(
    parsed: &ParsedReleaseInfo,
    criteria: &SearchCriteria,
    profile: &QualityProfile,
) -> Vec<RejectionReason> {
    let Some(current) = &criteria.current_quality else {
        return Vec::new();
    };

    let mut rejections = Vec::new();
    if !profile.upgrade_allowed {
        rejections.push(RejectionReason::UpgradesNotAllowed);
    }
    if profile.cutoff_met(current) {
        rejections.push(RejectionReason::CutoffAlreadyMet);
    }
    if !QualityModel.is_upgrade(current, &parsed.quality) {
        rejections.push(RejectionReason::NotAnUpgrade);
    }
    rejections
}
