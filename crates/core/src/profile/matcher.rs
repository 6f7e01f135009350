//! Profile evaluation of parsed releases.

use tracing::trace;

use crate::parser::ParsedReleaseInfo;

use super::types::{Decision, LanguageProfile, QualityProfile, Rank, RejectionReason};

/// Evaluates parsed releases against quality and language profiles.
///
/// Pure: the same inputs always produce the same [`Decision`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ProfileMatcher;

impl ProfileMatcher {
    pub fn evaluate(
        &self,
        parsed: &ParsedReleaseInfo,
        quality_profile: &QualityProfile,
        language_profile: &LanguageProfile,
    ) -> Decision {
        let mut rejections = Vec::new();

        let quality_position = quality_profile.position(parsed.quality.level);
        if quality_position.is_none() {
            rejections.push(RejectionReason::QualityNotAllowed);
        }

        let language_position = if parsed.languages.is_empty() {
            if language_profile.allow_unknown {
                // Unknown language ranks behind every explicit match.
                Some(language_profile.items.len())
            } else {
                None
            }
        } else {
            parsed
                .languages
                .iter()
                .filter_map(|language| language_profile.position(*language))
                .min()
        };
        if language_position.is_none() {
            rejections.push(RejectionReason::LanguageNotAllowed);
        }

        let decision = match (quality_position, language_position) {
            (Some(quality_position), Some(language_position)) => Decision::accept(Rank {
                quality_position,
                revision: parsed.quality.revision,
                language_position,
            }),
            _ => Decision::reject(rejections),
        };

        trace!(
            title = %parsed.original_title,
            accepted = decision.accepted,
            "Evaluated release against profiles"
        );

        decision
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::Language;
    use crate::parser::parse;
    use crate::quality::Quality;

    fn hd_profile() -> QualityProfile {
        QualityProfile::allowing(
            1,
            "HD-1080p",
            &[Quality::WebDl1080p, Quality::Bluray1080p],
            Quality::Bluray1080p,
        )
    }

    fn english(allow_unknown: bool) -> LanguageProfile {
        LanguageProfile::allowing(1, "English", &[Language::English], allow_unknown)
    }

    #[test]
    fn test_quality_not_allowed() {
        let parsed = parse("Some.Show.S01E01.PDTV.XviD-GRP");
        assert_eq!(parsed.quality.level, Quality::Sdtv);

        let decision = ProfileMatcher.evaluate(&parsed, &hd_profile(), &english(true));
        assert!(!decision.accepted);
        assert_eq!(decision.rejections, vec![RejectionReason::QualityNotAllowed]);
        assert!(decision.rank.is_none());
    }

    #[test]
    fn test_language_not_allowed() {
        let parsed = parse("Some.Show.S01E01.German.1080p.WEB-DL-GRP");
        let decision = ProfileMatcher.evaluate(&parsed, &hd_profile(), &english(true));
        assert!(!decision.accepted);
        assert_eq!(decision.rejections, vec![RejectionReason::LanguageNotAllowed]);
    }

    #[test]
    fn test_unknown_language_needs_permission() {
        let parsed = parse("Some.Show.S01E01.1080p.WEB-DL-GRP");
        assert!(parsed.languages.is_empty());

        assert!(ProfileMatcher
            .evaluate(&parsed, &hd_profile(), &english(true))
            .accepted);
        let strict = ProfileMatcher.evaluate(&parsed, &hd_profile(), &english(false));
        assert_eq!(strict.rejections, vec![RejectionReason::LanguageNotAllowed]);
    }

    #[test]
    fn test_both_rejections_reported_in_order() {
        let parsed = parse("Some.Show.S01E01.German.PDTV.XviD-GRP");
        let decision = ProfileMatcher.evaluate(&parsed, &hd_profile(), &english(false));
        assert_eq!(
            decision.rejections,
            vec![
                RejectionReason::QualityNotAllowed,
                RejectionReason::LanguageNotAllowed
            ]
        );
    }

    #[test]
    fn test_proper_ranks_higher() {
        let original = parse("Some.Show.S02E05.1080p.WEB-DL-TEAM");
        let proper = parse("Some.Show.S02E05.1080p.WEB-DL.PROPER-TEAM");

        let a = ProfileMatcher.evaluate(&original, &hd_profile(), &english(true));
        let b = ProfileMatcher.evaluate(&proper, &hd_profile(), &english(true));
        assert!(a.accepted && b.accepted);
        assert!(b.rank > a.rank);
    }

    #[test]
    fn test_profile_order_beats_global_order() {
        // Listed first, so preferred even though Bluray sorts higher globally.
        let profile = hd_profile();
        let web = parse("Movie.2020.1080p.WEB-DL-GRP");
        let bluray = parse("Movie.2020.1080p.BluRay-GRP");

        let web_rank = ProfileMatcher.evaluate(&web, &profile, &english(true)).rank;
        let bluray_rank = ProfileMatcher.evaluate(&bluray, &profile, &english(true)).rank;
        assert!(web_rank > bluray_rank);
    }

    #[test]
    fn test_idempotent() {
        let parsed = parse("Some.Show.S02E05.1080p.WEB.PROPER-TEAM");
        let first = ProfileMatcher.evaluate(&parsed, &hd_profile(), &english(true));
        let second = ProfileMatcher.evaluate(&parsed, &hd_profile(), &english(true));
        assert_eq!(first, second);
    }
}
