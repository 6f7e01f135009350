//! Ordered, data-driven extraction rules for release titles.
//!
//! Each rule belongs to one [`PatternCategory`] (derived from what it extracts)
//! and carries an explicit priority. Within a single-valued category the
//! highest-priority matching rule wins regardless of where its token sits in
//! the title; multi-valued categories report every matching rule.

use once_cell::sync::Lazy;
use regex_lite::Regex;

use crate::language::Language;
use crate::quality::{Codec, Modifier, Quality, Resolution, Source};

use super::types::SpecialFlag;

/// Field a rule extracts into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PatternCategory {
    Resolution,
    Source,
    Modifier,
    Codec,
    Audio,
    Edition,
    Language,
    Special,
    Revision,
}

impl PatternCategory {
    /// Multi-valued categories collect every matching rule.
    pub fn is_multi_valued(self) -> bool {
        matches!(
            self,
            PatternCategory::Language | PatternCategory::Special | PatternCategory::Revision
        )
    }
}

/// What a rule yields when it matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extraction {
    Resolution(Resolution),
    Source(Source),
    Modifier(Modifier),
    Codec(Codec),
    Audio(Quality),
    Edition(&'static str),
    Language(Language),
    Flag(SpecialFlag),
    Proper,
    Repack,
    /// Explicit version number, read from the `value` capture group.
    Version,
    /// Case-sensitive REAL marker; counted, not just detected.
    Real,
}

impl Extraction {
    pub fn category(&self) -> PatternCategory {
        match self {
            Extraction::Resolution(_) => PatternCategory::Resolution,
            Extraction::Source(_) => PatternCategory::Source,
            Extraction::Modifier(_) => PatternCategory::Modifier,
            Extraction::Codec(_) => PatternCategory::Codec,
            Extraction::Audio(_) => PatternCategory::Audio,
            Extraction::Edition(_) => PatternCategory::Edition,
            Extraction::Language(_) => PatternCategory::Language,
            Extraction::Flag(_) => PatternCategory::Special,
            Extraction::Proper | Extraction::Repack | Extraction::Version | Extraction::Real => {
                PatternCategory::Revision
            }
        }
    }
}

/// One named extraction rule.
#[derive(Debug, Clone)]
pub struct PatternRule {
    pub name: &'static str,
    pub category: PatternCategory,
    /// Higher wins within a category.
    pub priority: i32,
    pub extraction: Extraction,
    regex: Regex,
}

/// A successful rule application.
#[derive(Debug, Clone)]
pub struct RuleMatch<'a> {
    pub rule: &'a PatternRule,
    pub start: usize,
    pub end: usize,
    /// Content of the `value` capture group, when the rule defines one.
    pub value: Option<&'a str>,
}

impl RuleMatch<'_> {
    pub fn extraction(&self) -> Extraction {
        self.rule.extraction
    }
}

impl PatternRule {
    pub fn new(
        name: &'static str,
        priority: i32,
        pattern: &str,
        extraction: Extraction,
    ) -> Result<Self, regex_lite::Error> {
        Ok(Self {
            name,
            category: extraction.category(),
            priority,
            extraction,
            regex: Regex::new(pattern)?,
        })
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    pub fn find<'t>(&'t self, text: &'t str) -> Option<RuleMatch<'t>> {
        let caps = self.regex.captures(text)?;
        let whole = caps.get(0)?;
        Some(RuleMatch {
            rule: self,
            start: whole.start(),
            end: whole.end(),
            value: caps.name("value").map(|m| m.as_str()),
        })
    }

    /// Number of non-overlapping matches.
    pub fn count(&self, text: &str) -> usize {
        self.regex.find_iter(text).count()
    }
}

/// The full rule set, sorted by category then descending priority.
#[derive(Debug, Clone)]
pub struct TitlePatternLibrary {
    rules: Vec<PatternRule>,
}

impl TitlePatternLibrary {
    /// Build a library; ties in priority keep their given order.
    pub fn new(mut rules: Vec<PatternRule>) -> Self {
        rules.sort_by(|a, b| {
            a.category
                .cmp(&b.category)
                .then_with(|| b.priority.cmp(&a.priority))
        });
        Self { rules }
    }

    /// The built-in rule set.
    pub fn standard() -> &'static TitlePatternLibrary {
        &STANDARD
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Rules of one category in evaluation order.
    pub fn rules(&self, category: PatternCategory) -> impl Iterator<Item = &PatternRule> {
        self.rules.iter().filter(move |r| r.category == category)
    }

    /// Highest-priority rule of `category` matching `text`.
    ///
    /// Lower-priority rules are not evaluated once one matches.
    pub fn first_match<'t>(&'t self, category: PatternCategory, text: &'t str) -> Option<RuleMatch<'t>> {
        self.rules(category).find_map(|rule| rule.find(text))
    }

    /// Every rule of `category` matching `text`, in priority order.
    pub fn all_matches<'t>(&'t self, category: PatternCategory, text: &'t str) -> Vec<RuleMatch<'t>> {
        self.rules(category).filter_map(|rule| rule.find(text)).collect()
    }
}

static STANDARD: Lazy<TitlePatternLibrary> = Lazy::new(|| {
    let rules = STANDARD_RULES
        .iter()
        .map(|(name, priority, pattern, extraction)| {
            PatternRule::new(*name, *priority, pattern, *extraction)
                .unwrap_or_else(|e| panic!("invalid built-in pattern '{}': {}", name, e))
        })
        .collect();
    TitlePatternLibrary::new(rules)
});

use Extraction as X;

#[rustfmt::skip]
const STANDARD_RULES: &[(&str, i32, &str, Extraction)] = &[
    // Resolution
    ("r2160p", 100, r"(?i)\b(?:2160[pi]|3840x2160|4k|uhd)\b", X::Resolution(Resolution::R2160p)),
    ("r1080p", 90, r"(?i)\b(?:1080[pi]|1920x1080|fullhd|fhd)\b", X::Resolution(Resolution::R1080p)),
    ("r720p", 80, r"(?i)\b(?:720[pi]|1280x720|960p)\b", X::Resolution(Resolution::R720p)),
    ("r576p", 70, r"(?i)\b576[pi]\b", X::Resolution(Resolution::R576p)),
    ("r480p", 60, r"(?i)\b(?:480[pi]|640x480|848x480)\b", X::Resolution(Resolution::R480p)),

    // Source
    ("bluray", 100, r"(?i)\b(?:m?blu[-_. ]?ray|hd[-_. ]?dvd|bd(?:25|50|66|100)?|bd[-_. ]?rip|br[-_. ]?rip|bdremux|uhd[-_. ]?bd)\b", X::Source(Source::Bluray)),
    ("webrip", 95, r"(?i)\b(?:web[-_. ]?rip|webmux|web[-_. ]?cap)\b", X::Source(Source::WebRip)),
    ("webdl", 90, r"(?i)\b(?:web[-_. ]?dl(?:mux)?|webhd|hd[-_. ]?web|web|itunes(?:hd)?|amzn|dsnp|hmax|atvp)\b", X::Source(Source::WebDl)),
    ("television", 80, r"(?i)\b(?:hdtv(?:rip)?|pdtv|sdtv|tvrip|dsr(?:ip)?|satrip|dthrip|dvbrip|hd[-_. ]?tv)\b", X::Source(Source::Television)),
    ("dvd", 70, r"(?i)\b(?:dvd(?:[-_. ]?r|5|9|rip|mux)?|dvd[-_. ]?scr(?:eener)?|ntsc|pal|xvidvd)\b", X::Source(Source::Dvd)),
    ("telecine", 50, r"(?i)\b(?:telecine|hd[-_. ]?tc|tc)\b", X::Source(Source::Telecine)),
    ("telesync", 48, r"(?i)\b(?:telesync|hd[-_. ]?ts|ts|pdvd|tsrip)\b", X::Source(Source::Telesync)),
    ("cam", 46, r"(?i)\b(?:cam|cam[-_. ]?rip|hd[-_. ]?cam)\b", X::Source(Source::Cam)),
    ("workprint", 44, r"(?i)\b(?:wp|workprint)\b", X::Source(Source::Workprint)),

    // Modifier
    ("remux", 100, r"(?i)\b(?:remux|bdremux)\b", X::Modifier(Modifier::Remux)),
    ("br_disk", 90, r"(?i)\b(?:br[-_. ]?disk|bd(?:25|50|66|100)|complete[-_. ]blu[-_. ]?ray|avc[-_. ]?bd)\b", X::Modifier(Modifier::Disc)),
    ("dvd_disc", 85, r"(?i)\b(?:dvd[-_. ]?r|dvd5|dvd9)\b", X::Modifier(Modifier::Disc)),
    ("raw_hd", 80, r"(?i)\b(?:raw[-_. ]?hd|mpeg[-_. ]?2)\b", X::Modifier(Modifier::RawHd)),
    ("screener", 70, r"(?i)\b(?:dvd[-_. ]?scr(?:eener)?|bd[-_. ]?scr|web[-_. ]?scr|scr|screener)\b", X::Modifier(Modifier::Screener)),
    ("regional", 60, r"(?i)\b(?:r5|r6|regional)\b", X::Modifier(Modifier::Regional)),

    // Codec
    ("x265", 100, r"(?i)\b(?:x265|h[-_. ]?265|hevc)\b", X::Codec(Codec::X265)),
    ("x264", 90, r"(?i)\b(?:x264|h[-_. ]?264|avc)\b", X::Codec(Codec::X264)),
    ("xvid", 80, r"(?i)\bxvid\b", X::Codec(Codec::Xvid)),
    ("divx", 70, r"(?i)\bdivx\b", X::Codec(Codec::Divx)),
    ("av1", 60, r"(?i)\bav1\b", X::Codec(Codec::Av1)),

    // Audio
    ("flac_24", 100, r"(?i)\bflac[-_. ]?24(?:[-_. ]?bit)?\b|\b24[-_. ]?bit\b.*\bflac\b|\bflac\b.*\b24[-_. ]?bit\b", X::Audio(Quality::Flac24)),
    ("flac", 90, r"(?i)\bflac\b", X::Audio(Quality::Flac)),
    ("alac", 85, r"(?i)\balac\b", X::Audio(Quality::Alac)),
    ("wav", 80, r"(?i)\bwav\b", X::Audio(Quality::Wav)),
    ("mp3_320", 75, r"(?i)\bmp3[-_. ]?320\b|\b320[-_. ]?(?:kbps|kbs|cbr)\b|\b320\b.*\bmp3\b|\bmp3\b.*\b320\b", X::Audio(Quality::Mp3Cbr320)),
    ("mp3_vbr_v0", 70, r"(?i)\b(?:mp3[-_. ]?)?(?:vbr[-_. ]?)?v0\b", X::Audio(Quality::Mp3VbrV0)),
    ("mp3_vbr_v2", 65, r"(?i)\b(?:mp3|vbr)[-_. ]?v2\b|\bv2\b.*\b(?:mp3|vbr)\b|\b(?:mp3|vbr)\b.*\bv2\b", X::Audio(Quality::Mp3VbrV2)),
    ("mp3_256", 60, r"(?i)\bmp3[-_. ]?256\b|\b256[-_. ]?(?:kbps|kbs|cbr)\b", X::Audio(Quality::Mp3Cbr256)),
    ("mp3_192", 55, r"(?i)\bmp3[-_. ]?192\b|\b192[-_. ]?(?:kbps|kbs|cbr)\b", X::Audio(Quality::Mp3Cbr192)),
    ("aac", 50, r"(?i)\b(?:aac|m4a)\b", X::Audio(Quality::Aac)),
    ("mp3", 40, r"(?i)\bmp3\b", X::Audio(Quality::Mp3Cbr192)),

    // Edition
    ("directors_cut", 100, r"(?i)\bdirector'?s?[-_. ]?cut\b", X::Edition("Director's Cut")),
    ("final_cut", 95, r"(?i)\bfinal[-_. ]?cut\b", X::Edition("Final Cut")),
    ("extended", 90, r"(?i)\bextended(?:[-_. ](?:cut|edition|version))?\b", X::Edition("Extended")),
    ("theatrical", 85, r"(?i)\btheatrical(?:[-_. ](?:cut|edition|version))?\b", X::Edition("Theatrical")),
    ("unrated", 80, r"(?i)\bunrated\b", X::Edition("Unrated")),
    ("uncut", 78, r"(?i)\buncut\b", X::Edition("Uncut")),
    ("remastered", 75, r"(?i)\bremaster(?:ed)?\b", X::Edition("Remastered")),
    ("criterion", 70, r"(?i)\bcriterion(?:[-_. ]collection)?\b", X::Edition("Criterion")),
    ("imax", 65, r"(?i)\bimax\b", X::Edition("IMAX")),
    ("collectors", 60, r"(?i)\bcollector'?s?[-_. ]edition\b", X::Edition("Collector's Edition")),
    ("special", 55, r"(?i)\bspecial[-_. ]edition\b", X::Edition("Special Edition")),
    ("anniversary", 50, r"(?i)\b\d{2,3}(?:th)?[-_. ]anniversary(?:[-_. ]edition)?\b|\banniversary[-_. ]edition\b", X::Edition("Anniversary Edition")),
    ("ultimate", 45, r"(?i)\bultimate[-_. ](?:cut|edition)\b", X::Edition("Ultimate Edition")),
    ("deluxe", 40, r"(?i)\bdeluxe[-_. ]edition\b", X::Edition("Deluxe Edition")),

    // Language
    ("english", 0, r"(?i)\benglish\b", X::Language(Language::English)),
    ("french", 0, r"(?i)\b(?:french|truefrench|vostfr|vff|vfq|vf2)\b", X::Language(Language::French)),
    ("spanish", 0, r"(?i)\b(?:spanish|espanol|castellano|latino)\b", X::Language(Language::Spanish)),
    ("german", 0, r"(?i)\b(?:german|deutsch)\b", X::Language(Language::German)),
    ("italian", 0, r"(?i)\b(?:italian|ita)\b", X::Language(Language::Italian)),
    ("danish", 0, r"(?i)\bdanish\b", X::Language(Language::Danish)),
    ("dutch", 0, r"(?i)\bdutch\b", X::Language(Language::Dutch)),
    ("japanese", 0, r"(?i)\b(?:japanese|jap)\b", X::Language(Language::Japanese)),
    ("icelandic", 0, r"(?i)\bicelandic\b", X::Language(Language::Icelandic)),
    ("chinese", 0, r"(?i)\b(?:chinese|mandarin|cantonese)\b", X::Language(Language::Chinese)),
    ("russian", 0, r"(?i)\b(?:russian|rus)\b", X::Language(Language::Russian)),
    ("polish", 0, r"(?i)\b(?:polish|pldub)\b", X::Language(Language::Polish)),
    ("vietnamese", 0, r"(?i)\bvietnamese\b", X::Language(Language::Vietnamese)),
    ("swedish", 0, r"(?i)\b(?:swedish|swe)\b", X::Language(Language::Swedish)),
    ("norwegian", 0, r"(?i)\bnorwegian\b", X::Language(Language::Norwegian)),
    ("finnish", 0, r"(?i)\bfinnish\b", X::Language(Language::Finnish)),
    ("turkish", 0, r"(?i)\bturkish\b", X::Language(Language::Turkish)),
    ("portuguese", 0, r"(?i)\b(?:portuguese|dublado|pt[-_. ]?br)\b", X::Language(Language::Portuguese)),
    ("flemish", 0, r"(?i)\bflemish\b", X::Language(Language::Flemish)),
    ("greek", 0, r"(?i)\bgreek\b", X::Language(Language::Greek)),
    ("korean", 0, r"(?i)\b(?:korean|kor)\b", X::Language(Language::Korean)),
    ("hungarian", 0, r"(?i)\b(?:hungarian|hundub)\b", X::Language(Language::Hungarian)),
    ("hebrew", 0, r"(?i)\bhebrew\b", X::Language(Language::Hebrew)),
    ("lithuanian", 0, r"(?i)\blithuanian\b", X::Language(Language::Lithuanian)),
    ("czech", 0, r"(?i)\bczech\b", X::Language(Language::Czech)),
    ("hindi", 0, r"(?i)\bhindi\b", X::Language(Language::Hindi)),
    ("arabic", 0, r"(?i)\barabic\b", X::Language(Language::Arabic)),
    ("thai", 0, r"(?i)\bthai\b", X::Language(Language::Thai)),
    ("romanian", 0, r"(?i)\bromanian\b", X::Language(Language::Romanian)),
    ("ukrainian", 0, r"(?i)\b(?:ukrainian|ukr)\b", X::Language(Language::Ukrainian)),

    // Special flags
    ("hdr", 0, r"(?i)\b(?:hdr(?:10)?(?:plus)?|hdr10p|hlg)\b", X::Flag(SpecialFlag::Hdr)),
    ("dolby_vision", 0, r"(?i)\b(?:dv|dovi|dolby[-_. ]?vision)\b", X::Flag(SpecialFlag::DolbyVision)),
    ("three_d", 0, r"(?i)\b(?:3d|h[-_. ]?sbs|half[-_. ]?sbs|sbs|h[-_. ]?ou|half[-_. ]?ou|htab)\b", X::Flag(SpecialFlag::ThreeD)),
    ("hardcoded_subs", 0, r"(?i)\b(?:hc|subbed|hardsub(?:bed)?|[a-z]+subs?)\b", X::Flag(SpecialFlag::HardcodedSubs)),

    // Revision
    ("proper", 100, r"(?i)\bproper\b", X::Proper),
    ("repack", 90, r"(?i)\b(?:repack|rerip)\d?\b", X::Repack),
    ("version_suffix", 80, r"(?i)\dv(?P<value>\d)\b", X::Version),
    ("version_bracket", 79, r"(?i)\[v(?P<value>\d)\]", X::Version),
    ("real", 70, r"\bREAL\b", X::Real),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_library_compiles() {
        let library = TitlePatternLibrary::standard();
        assert_eq!(library.len(), STANDARD_RULES.len());
    }

    #[test]
    fn test_rules_sorted_by_priority_within_category() {
        let library = TitlePatternLibrary::standard();
        let priorities: Vec<i32> = library
            .rules(PatternCategory::Resolution)
            .map(|r| r.priority)
            .collect();
        let mut sorted = priorities.clone();
        sorted.sort_by(|a, b| b.cmp(a));
        assert_eq!(priorities, sorted);
    }

    #[test]
    fn test_first_match_prefers_priority_over_position() {
        let library = TitlePatternLibrary::standard();
        let m = library
            .first_match(PatternCategory::Resolution, "Movie.720p.then.1080p")
            .unwrap();
        assert_eq!(m.extraction(), Extraction::Resolution(Resolution::R1080p));
    }

    #[test]
    fn test_priority_is_explicit_not_declaration_order() {
        let library = TitlePatternLibrary::new(vec![
            PatternRule::new("low", 1, r"(?i)\bfoo\b", X::Edition("Low")).unwrap(),
            PatternRule::new("high", 10, r"(?i)\bfoo\b", X::Edition("High")).unwrap(),
        ]);
        let m = library.first_match(PatternCategory::Edition, "a foo b").unwrap();
        assert_eq!(m.rule.name, "high");
    }

    #[test]
    fn test_word_boundaries() {
        let library = TitlePatternLibrary::standard();
        assert!(library
            .first_match(PatternCategory::Resolution, "Movie.2019.x264-GRP480p2")
            .is_none());
        assert!(library
            .first_match(PatternCategory::Source, "Handwebster.2019")
            .is_none());
    }

    #[test]
    fn test_version_capture() {
        let library = TitlePatternLibrary::standard();
        let m = library
            .first_match(PatternCategory::Revision, "[Group] Show - 05v2 [720p]")
            .unwrap();
        assert_eq!(m.extraction(), X::Version);
        assert_eq!(m.value, Some("2"));
    }

    #[test]
    fn test_real_is_case_sensitive() {
        let library = TitlePatternLibrary::standard();
        let real = library
            .rules(PatternCategory::Revision)
            .find(|r| r.extraction == X::Real)
            .unwrap();
        assert_eq!(real.count("Show.S01E01.REAL.REAL.PROPER.720p"), 2);
        assert_eq!(real.count("The.Real.Show.S01E01"), 0);
    }

    #[test]
    fn test_multi_valued_categories() {
        assert!(PatternCategory::Language.is_multi_valued());
        assert!(!PatternCategory::Resolution.is_multi_valued());
        let library = TitlePatternLibrary::standard();
        let langs = library.all_matches(PatternCategory::Language, "Movie.2020.French.German.1080p");
        assert_eq!(langs.len(), 2);
    }
}
