//! Profile definitions and the decision value produced by matching.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use tracing::warn;

use crate::language::Language;
use crate::quality::{Quality, QualityModel, QualitySignal, Revision};

/// One entry of a quality profile's preference list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityProfileItem {
    pub quality: Quality,
    #[serde(default = "default_allowed")]
    pub allowed: bool,
}

/// User-defined quality preferences.
///
/// `items` is ordered most preferred first. The cutoff is always one of the
/// allowed qualities; construction clamps it when it is not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawQualityProfile")]
pub struct QualityProfile {
    pub id: u32,
    pub name: String,
    pub items: Vec<QualityProfileItem>,
    pub cutoff: Quality,
    pub upgrade_allowed: bool,
}

#[derive(Deserialize)]
struct RawQualityProfile {
    id: u32,
    name: String,
    items: Vec<QualityProfileItem>,
    cutoff: Quality,
    #[serde(default = "default_allowed")]
    upgrade_allowed: bool,
}

impl From<RawQualityProfile> for QualityProfile {
    fn from(raw: RawQualityProfile) -> Self {
        let mut profile = QualityProfile::new(raw.id, raw.name, raw.items, raw.cutoff);
        profile.upgrade_allowed = raw.upgrade_allowed;
        profile
    }
}

fn default_allowed() -> bool {
    true
}

impl QualityProfile {
    pub fn new(
        id: u32,
        name: impl Into<String>,
        items: Vec<QualityProfileItem>,
        cutoff: Quality,
    ) -> Self {
        let mut profile = Self {
            id,
            name: name.into(),
            items,
            cutoff,
            upgrade_allowed: true,
        };
        profile.clamp_cutoff();
        profile
    }

    /// Convenience constructor: every listed quality allowed, in preference order.
    pub fn allowing(id: u32, name: impl Into<String>, qualities: &[Quality], cutoff: Quality) -> Self {
        let items = qualities
            .iter()
            .map(|quality| QualityProfileItem {
                quality: *quality,
                allowed: true,
            })
            .collect();
        Self::new(id, name, items, cutoff)
    }

    pub fn is_allowed(&self, quality: Quality) -> bool {
        self.items.iter().any(|i| i.quality == quality && i.allowed)
    }

    pub fn allowed_qualities(&self) -> impl Iterator<Item = Quality> + '_ {
        self.items.iter().filter(|i| i.allowed).map(|i| i.quality)
    }

    /// Position among allowed items; 0 is most preferred.
    pub fn position(&self, quality: Quality) -> Option<usize> {
        self.allowed_qualities().position(|q| q == quality)
    }

    /// Whether a held quality already meets the cutoff.
    pub fn cutoff_met(&self, current: &QualitySignal) -> bool {
        QualityModel.cutoff_met(self.cutoff, current)
    }

    fn clamp_cutoff(&mut self) {
        if self.is_allowed(self.cutoff) {
            return;
        }
        if let Some(lowest) = self.allowed_qualities().min() {
            warn!(
                profile = %self.name,
                cutoff = %self.cutoff,
                clamped_to = %lowest,
                "Quality cutoff is not an allowed quality, clamping"
            );
            self.cutoff = lowest;
        }
    }
}

/// One entry of a language profile's preference list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageProfileItem {
    pub language: Language,
    #[serde(default = "default_allowed")]
    pub allowed: bool,
}

/// User-defined language preferences, most preferred first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawLanguageProfile")]
pub struct LanguageProfile {
    pub id: u32,
    pub name: String,
    pub items: Vec<LanguageProfileItem>,
    pub cutoff: Language,
    /// Accept releases whose language could not be detected.
    pub allow_unknown: bool,
}

#[derive(Deserialize)]
struct RawLanguageProfile {
    id: u32,
    name: String,
    items: Vec<LanguageProfileItem>,
    cutoff: Language,
    #[serde(default)]
    allow_unknown: bool,
}

impl From<RawLanguageProfile> for LanguageProfile {
    fn from(raw: RawLanguageProfile) -> Self {
        LanguageProfile::new(raw.id, raw.name, raw.items, raw.cutoff, raw.allow_unknown)
    }
}

impl LanguageProfile {
    pub fn new(
        id: u32,
        name: impl Into<String>,
        items: Vec<LanguageProfileItem>,
        cutoff: Language,
        allow_unknown: bool,
    ) -> Self {
        let mut profile = Self {
            id,
            name: name.into(),
            items,
            cutoff,
            allow_unknown,
        };
        profile.clamp_cutoff();
        profile
    }

    pub fn allowing(
        id: u32,
        name: impl Into<String>,
        languages: &[Language],
        allow_unknown: bool,
    ) -> Self {
        let items = languages
            .iter()
            .map(|language| LanguageProfileItem {
                language: *language,
                allowed: true,
            })
            .collect::<Vec<_>>();
        let cutoff = languages.first().copied().unwrap_or(Language::English);
        Self::new(id, name, items, cutoff, allow_unknown)
    }

    pub fn is_allowed(&self, language: Language) -> bool {
        self.items.iter().any(|i| i.language == language && i.allowed)
    }

    pub fn allowed_languages(&self) -> impl Iterator<Item = Language> + '_ {
        self.items.iter().filter(|i| i.allowed).map(|i| i.language)
    }

    pub fn position(&self, language: Language) -> Option<usize> {
        self.allowed_languages().position(|l| l == language)
    }

    /// Languages have no global order, so the least preferred allowed entry is the lowest.
    fn clamp_cutoff(&mut self) {
        if self.is_allowed(self.cutoff) {
            return;
        }
        if let Some(lowest) = self.allowed_languages().last() {
            warn!(
                profile = %self.name,
                cutoff = %self.cutoff,
                clamped_to = %lowest,
                "Language cutoff is not an allowed language, clamping"
            );
            self.cutoff = lowest;
        }
    }
}

/// Stable, user-facing reason a candidate was not accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionReason {
    /// No media identity could be extracted from the title.
    UnknownMedia,
    /// The title names a different movie, episode or album.
    TargetMismatch,
    QualityNotAllowed,
    LanguageNotAllowed,
    /// The held quality already meets the profile cutoff.
    CutoffAlreadyMet,
    UpgradesNotAllowed,
    NotAnUpgrade,
}

impl RejectionReason {
    pub fn code(self) -> &'static str {
        match self {
            RejectionReason::UnknownMedia => "unknown_media",
            RejectionReason::TargetMismatch => "target_mismatch",
            RejectionReason::QualityNotAllowed => "quality_not_allowed",
            RejectionReason::LanguageNotAllowed => "language_not_allowed",
            RejectionReason::CutoffAlreadyMet => "cutoff_already_met",
            RejectionReason::UpgradesNotAllowed => "upgrades_not_allowed",
            RejectionReason::NotAnUpgrade => "not_an_upgrade",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            RejectionReason::UnknownMedia => "Unable to parse release",
            RejectionReason::TargetMismatch => "Release is for a different item",
            RejectionReason::QualityNotAllowed => "Quality is not wanted in profile",
            RejectionReason::LanguageNotAllowed => "Language is not wanted in profile",
            RejectionReason::CutoffAlreadyMet => "Existing file meets cutoff",
            RejectionReason::UpgradesNotAllowed => "Profile does not allow upgrades",
            RejectionReason::NotAnUpgrade => "Not an upgrade for existing file",
        }
    }
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Composite ranking key among accepted candidates for one target.
///
/// Greater is better: lower preference positions and newer revisions win.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rank {
    pub quality_position: usize,
    pub revision: Revision,
    pub language_position: usize,
}

impl Ord for Rank {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .quality_position
            .cmp(&self.quality_position)
            .then_with(|| self.revision.cmp(&other.revision))
            .then_with(|| other.language_position.cmp(&self.language_position))
    }
}

impl PartialOrd for Rank {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Verdict for one parsed release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub accepted: bool,
    pub rejections: Vec<RejectionReason>,
    /// Present only when accepted.
    pub rank: Option<Rank>,
}

impl Decision {
    pub fn accept(rank: Rank) -> Self {
        Self {
            accepted: true,
            rejections: Vec::new(),
            rank: Some(rank),
        }
    }

    pub fn reject(rejections: Vec<RejectionReason>) -> Self {
        Self {
            accepted: false,
            rejections,
            rank: None,
        }
    }

    /// Add a rejection, turning an accepted decision into a rejected one.
    pub fn push_rejection(&mut self, reason: RejectionReason) {
        if !self.rejections.contains(&reason) {
            self.rejections.push(reason);
        }
        self.accepted = false;
        self.rank = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cutoff_clamped_to_lowest_allowed() {
        let profile = QualityProfile::allowing(
            1,
            "HD",
            &[Quality::Bluray1080p, Quality::WebDl1080p, Quality::Hdtv720p],
            Quality::Remux2160p,
        );
        assert_eq!(profile.cutoff, Quality::Hdtv720p);
    }

    #[test]
    fn test_cutoff_kept_when_allowed() {
        let profile = QualityProfile::allowing(
            1,
            "HD",
            &[Quality::WebDl1080p, Quality::Bluray1080p],
            Quality::Bluray1080p,
        );
        assert_eq!(profile.cutoff, Quality::Bluray1080p);
    }

    #[test]
    fn test_disallowed_item_is_not_a_valid_cutoff() {
        let profile = QualityProfile::new(
            1,
            "HD",
            vec![
                QualityProfileItem {
                    quality: Quality::Bluray1080p,
                    allowed: false,
                },
                QualityProfileItem {
                    quality: Quality::WebDl1080p,
                    allowed: true,
                },
            ],
            Quality::Bluray1080p,
        );
        assert_eq!(profile.cutoff, Quality::WebDl1080p);
        assert_eq!(profile.position(Quality::WebDl1080p), Some(0));
        assert_eq!(profile.position(Quality::Bluray1080p), None);
    }

    #[test]
    fn test_deserialize_clamps() {
        let json = r#"{
            "id": 3,
            "name": "Clamp",
            "items": [{"quality": "webdl_1080p"}, {"quality": 4}],
            "cutoff": "bluray_2160p"
        }"#;
        let profile: QualityProfile = serde_json::from_str(json).unwrap();
        assert_eq!(profile.cutoff, Quality::Hdtv720p);
        assert!(profile.upgrade_allowed);
    }

    #[test]
    fn test_language_cutoff_clamped_to_last_allowed() {
        let profile = LanguageProfile::new(
            1,
            "Euro",
            vec![
                LanguageProfileItem {
                    language: Language::English,
                    allowed: true,
                },
                LanguageProfileItem {
                    language: Language::French,
                    allowed: true,
                },
            ],
            Language::Japanese,
            false,
        );
        assert_eq!(profile.cutoff, Language::French);
    }

    #[test]
    fn test_rank_ordering() {
        let base = Rank {
            quality_position: 1,
            revision: Revision::default(),
            language_position: 0,
        };
        let better_quality = Rank {
            quality_position: 0,
            ..base
        };
        let proper = Rank {
            revision: Revision {
                version: 2,
                proper: true,
                ..Revision::default()
            },
            ..base
        };
        let worse_language = Rank {
            language_position: 2,
            ..base
        };

        assert!(better_quality > base);
        assert!(better_quality > proper);
        assert!(proper > base);
        assert!(base > worse_language);
    }

    #[test]
    fn test_rejection_codes_are_stable() {
        assert_eq!(RejectionReason::QualityNotAllowed.code(), "quality_not_allowed");
        assert_eq!(
            serde_json::to_string(&RejectionReason::LanguageNotAllowed).unwrap(),
            "\"language_not_allowed\""
        );
    }
}
