//! Quality extraction from a cleaned title.

use tracing::trace;

use crate::quality::{
    Codec, DetectionSource, Modifier, Quality, QualitySignal, Resolution, Revision, Source,
};

use super::patterns::{Extraction, PatternCategory, TitlePatternLibrary};

/// Extract the quality signal and codec from `text`.
///
/// `extension` is the lowercased file extension stripped from the title, used
/// only when nothing in the name identified a quality.
pub(crate) fn parse_quality(
    library: &TitlePatternLibrary,
    text: &str,
    extension: Option<&str>,
) -> (QualitySignal, Option<Codec>) {
    let revision = parse_revision(library, text);

    let mut resolution = match library.first_match(PatternCategory::Resolution, text) {
        Some(m) => match m.extraction() {
            Extraction::Resolution(r) => r,
            _ => Resolution::Unknown,
        },
        None => Resolution::Unknown,
    };
    let mut source = match library.first_match(PatternCategory::Source, text) {
        Some(m) => match m.extraction() {
            Extraction::Source(s) => s,
            _ => Source::Unknown,
        },
        None => Source::Unknown,
    };
    let modifier = match library.first_match(PatternCategory::Modifier, text) {
        Some(m) => match m.extraction() {
            Extraction::Modifier(m) => m,
            _ => Modifier::None,
        },
        None => Modifier::None,
    };
    let codec = library
        .first_match(PatternCategory::Codec, text)
        .and_then(|m| match m.extraction() {
            Extraction::Codec(c) => Some(c),
            _ => None,
        });

    let audio = library
        .first_match(PatternCategory::Audio, text)
        .and_then(|m| match m.extraction() {
            Extraction::Audio(q) => Some(q),
            _ => None,
        });

    // Scene music releases say WEB without any video markers.
    if let Some(audio) = audio {
        if resolution == Resolution::Unknown
            && codec.is_none()
            && modifier == Modifier::None
            && matches!(source, Source::Unknown | Source::WebDl)
        {
            trace!(title = %text, quality = %audio, "Parsed audio quality");
            return (
                QualitySignal {
                    level: audio,
                    resolution: Resolution::Unknown,
                    source: Source::Unknown,
                    modifier: Modifier::None,
                    revision,
                    detection: DetectionSource::Name,
                },
                None,
            );
        }
    }

    // XviD/DivX encodes of Blu-ray sources are DVD quality.
    if source == Source::Bluray && matches!(codec, Some(Codec::Xvid) | Some(Codec::Divx)) {
        source = Source::Dvd;
        resolution = Resolution::R480p;
    }

    if resolution == Resolution::Unknown {
        resolution = match (source, modifier) {
            (Source::Bluray, Modifier::Disc) | (Source::Bluray, Modifier::Remux) => {
                Resolution::R1080p
            }
            (Source::Bluray, _) => Resolution::R720p,
            (Source::WebDl, _) | (Source::WebRip, _) | (Source::Dvd, _) => Resolution::R480p,
            _ => Resolution::Unknown,
        };
    }

    let mut level = Quality::from_parts(source, resolution, modifier);
    let mut detection = DetectionSource::Name;

    if level == Quality::Unknown {
        if let Some(audio) = audio {
            level = audio;
        }
    }

    if level == Quality::Unknown && codec == Some(Codec::X264) {
        level = Quality::Dvd;
    }

    if level == Quality::Unknown {
        if let Some(q) = extension.and_then(quality_from_extension) {
            level = q;
            detection = DetectionSource::Extension;
        } else {
            detection = DetectionSource::Unknown;
        }
    }

    trace!(title = %text, quality = %level, "Parsed quality");

    let signal = if level.is_audio() || level == Quality::Unknown {
        QualitySignal {
            level,
            resolution: Resolution::Unknown,
            source: Source::Unknown,
            modifier: Modifier::None,
            revision,
            detection,
        }
    } else {
        QualitySignal {
            level,
            resolution: level.resolution(),
            source: level.source(),
            modifier: level.modifier(),
            revision,
            detection,
        }
    };

    (signal, codec)
}

fn parse_revision(library: &TitlePatternLibrary, text: &str) -> Revision {
    let mut revision = Revision::default();

    for rule in library.rules(PatternCategory::Revision) {
        match rule.extraction {
            Extraction::Proper if rule.is_match(text) => {
                revision.proper = true;
                revision.version = revision.version.max(2);
            }
            Extraction::Repack if rule.is_match(text) => {
                revision.repack = true;
                revision.version = revision.version.max(2);
            }
            Extraction::Version => {
                if let Some(version) = rule
                    .find(text)
                    .and_then(|m| m.value)
                    .and_then(|v| v.parse::<u8>().ok())
                {
                    revision.version = revision.version.max(version);
                }
            }
            Extraction::Real => {
                revision.real = rule.count(text).min(u8::MAX as usize) as u8;
            }
            _ => {}
        }
    }

    revision
}

fn quality_from_extension(extension: &str) -> Option<Quality> {
    match extension {
        "flac" => Some(Quality::Flac),
        "mp3" => Some(Quality::Mp3Cbr192),
        "m4a" => Some(Quality::Aac),
        "wav" => Some(Quality::Wav),
        _ => None,
    }
}
