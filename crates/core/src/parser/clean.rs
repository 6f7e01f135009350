//! Title pre-cleaning: extensions, site tags and token normalization.

use once_cell::sync::Lazy;
use regex_lite::Regex;

static EXTENSION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\.(?P<ext>mkv|mp4|avi|m4v|wmv|ts|nzb|par2|torrent|flac|mp3|m4a|wav)$")
        .expect("extension pattern")
});

static WEBSITE_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:\[\s*(?:www\.)?[a-z0-9-]+\.[a-z]{2,6}\s*\]|www\.[a-z0-9-]+\.[a-z]{2,6}\s+-)[-_. ]*")
        .expect("website prefix pattern")
});

static WEBSITE_POSTFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)[-_. ]*\[\s*(?:www\.)?[a-z0-9-]+\.(?:com|net|org|info|to|me)\s*\]$")
        .expect("website postfix pattern")
});

static TORRENT_SUFFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)[-_. ]*\[(?:ettv|rartv|rarbg|cttv|eztv)\]$").expect("torrent suffix pattern")
});

static MULTI_SPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("space pattern"));

/// Strip a trailing file extension, returning it lowercased.
pub(crate) fn strip_extension(title: &str) -> (&str, Option<String>) {
    match EXTENSION.captures(title) {
        Some(caps) => {
            let start = caps.get(0).map(|m| m.start()).unwrap_or(title.len());
            let ext = caps.name("ext").map(|m| m.as_str().to_ascii_lowercase());
            (&title[..start], ext)
        }
        None => (title, None),
    }
}

/// Remove website tags and torrent site suffixes.
pub(crate) fn strip_site_markers(title: &str) -> String {
    let title = WEBSITE_PREFIX.replace(title, "");
    let title = WEBSITE_POSTFIX.replace(&title, "");
    let title = TORRENT_SUFFIX.replace(&title, "");
    title.trim().to_string()
}

/// Turn a raw token run like `Some.Show_Name -` into `Some Show Name`.
pub(crate) fn clean_title(raw: &str) -> String {
    let spaced: String = raw
        .chars()
        .map(|c| if c == '.' || c == '_' { ' ' } else { c })
        .collect();
    let collapsed = MULTI_SPACE.replace_all(&spaced, " ");
    collapsed
        .trim_matches(|c: char| c.is_whitespace() || matches!(c, '-' | '(' | '[' | ')' | ']'))
        .to_string()
}

/// Lowercase alphanumerics only, for title comparisons.
pub fn normalize_title(title: &str) -> String {
    title
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(|c| c.to_lowercase())
        .collect()
}
