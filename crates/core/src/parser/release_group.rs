//! Release group extraction.

use once_cell::sync::Lazy;
use regex_lite::Regex;

static JUNK_SUFFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(?:-(?:rp|1|nzbgeek|obfuscated|scrambled|sample|pre|postbot|xpost|rakuv[a-z0-9]*|whiterev|buymore|asrequested|alternativetorequested|gerov|z0ids3n|chamele0n|4p|4planet))+$",
    )
    .expect("junk suffix pattern")
});

static ANIME_GROUP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\[(?P<group>[^\]]+)\]").expect("anime group pattern"));

static TRAILING_GROUP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"-(?P<group>[A-Za-z0-9]+)$|[-_. ]\[(?P<bracket>[A-Za-z0-9]+)\]$")
        .expect("release group pattern")
});

/// Tokens that trail a dash without being a group name.
const NOT_A_GROUP: &[&str] = &[
    "mp3", "alac", "flac", "aac", "wav", "web", "dl", "rip", "hd", "x264", "x265", "h264", "h265",
    "hevc", "dts", "ac3",
];

/// Extract the release group from a cleaned title (no extension or site tags).
pub(crate) fn parse_release_group(title: &str) -> Option<String> {
    let title = title.trim();

    if let Some(caps) = ANIME_GROUP.captures(title) {
        if let Some(group) = caps.name("group") {
            let group = group.as_str().trim();
            if !group.is_empty() {
                return Some(group.to_string());
            }
        }
    }

    let cleaned = JUNK_SUFFIX.replace(title, "");
    let caps = TRAILING_GROUP.captures(&cleaned)?;
    let group = caps.name("group").or_else(|| caps.name("bracket"))?.as_str();

    if group.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    if NOT_A_GROUP
        .iter()
        .any(|token| token.eq_ignore_ascii_case(group))
    {
        return None;
    }
    if is_resolution_token(group) {
        return None;
    }

    Some(group.to_string())
}

fn is_resolution_token(token: &str) -> bool {
    let lower = token.to_ascii_lowercase();
    lower
        .strip_suffix('p')
        .map(|digits| !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_group() {
        assert_eq!(
            parse_release_group("Some.Show.S02E05.1080p.WEB.PROPER-TEAM").as_deref(),
            Some("TEAM")
        );
        assert_eq!(
            parse_release_group("Artist.Name.Album.Title.2020.FLAC-GROUP").as_deref(),
            Some("GROUP")
        );
    }

    #[test]
    fn test_anime_group() {
        assert_eq!(
            parse_release_group("[SubGroup] Show - 05 [1080p]").as_deref(),
            Some("SubGroup")
        );
    }

    #[test]
    fn test_junk_suffixes_are_dropped() {
        assert_eq!(
            parse_release_group("Movie.2020.1080p.BluRay.x264-GRP-Obfuscated").as_deref(),
            Some("GRP")
        );
        assert_eq!(
            parse_release_group("Movie.2020.1080p.BluRay.x264-GRP-postbot-xpost").as_deref(),
            Some("GRP")
        );
    }

    #[test]
    fn test_non_groups() {
        assert!(parse_release_group("Movie.2020.1080p.WEB-DL").is_none());
        assert!(parse_release_group("Artist-Album-2020-FLAC").is_none());
        assert!(parse_release_group("Show.S01E01-1080p").is_none());
        assert!(parse_release_group("Movie-2020").is_none());
        assert!(parse_release_group("No group here").is_none());
    }

    #[test]
    fn test_bracket_group() {
        assert_eq!(
            parse_release_group("Movie 2020 1080p BluRay [GRP]").as_deref(),
            Some("GRP")
        );
    }
}
