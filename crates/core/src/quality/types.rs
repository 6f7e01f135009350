//! Quality enumeration and the signal extracted from a release title.

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;

/// Where the release was captured or ripped from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    Unknown,
    Workprint,
    Cam,
    Telesync,
    Telecine,
    Television,
    Dvd,
    WebDl,
    WebRip,
    Bluray,
}

/// Vertical resolution class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Resolution {
    #[serde(rename = "unknown")]
    Unknown,
    #[serde(rename = "480p")]
    R480p,
    #[serde(rename = "576p")]
    R576p,
    #[serde(rename = "720p")]
    R720p,
    #[serde(rename = "1080p")]
    R1080p,
    #[serde(rename = "2160p")]
    R2160p,
}

/// Qualifier applied on top of a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Modifier {
    None,
    Regional,
    Screener,
    RawHd,
    /// Full disc image (BR-DISK, DVD-R).
    Disc,
    Remux,
}

/// Video codec named in a title.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Codec {
    X264,
    X265,
    Xvid,
    Divx,
    Av1,
}

/// How the quality level was determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionSource {
    Name,
    Extension,
    Unknown,
}

macro_rules! qualities {
    ($($variant:ident = $id:literal, $name:literal, $display:literal, $source:ident, $res:ident, $modifier:ident;)+) => {
        /// A quality level.
        ///
        /// Ids and names are persisted in profiles and never reused; new levels are
        /// appended with a fresh id and slotted into [`QUALITY_ORDER`].
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Quality {
            $($variant,)+
        }

        impl Quality {
            /// Every quality, in id order.
            pub const ALL: &'static [Quality] = &[$(Quality::$variant,)+];

            /// Stable numeric identifier.
            pub fn id(self) -> u16 {
                match self {
                    $(Quality::$variant => $id,)+
                }
            }

            /// Stable snake_case identifier.
            pub fn name(self) -> &'static str {
                match self {
                    $(Quality::$variant => $name,)+
                }
            }

            /// Human readable label, e.g. `WEBDL-1080p`.
            pub fn display_name(self) -> &'static str {
                match self {
                    $(Quality::$variant => $display,)+
                }
            }

            pub fn source(self) -> Source {
                match self {
                    $(Quality::$variant => Source::$source,)+
                }
            }

            pub fn resolution(self) -> Resolution {
                match self {
                    $(Quality::$variant => Resolution::$res,)+
                }
            }

            pub fn modifier(self) -> Modifier {
                match self {
                    $(Quality::$variant => Modifier::$modifier,)+
                }
            }

            pub fn from_id(id: u16) -> Option<Quality> {
                match id {
                    $($id => Some(Quality::$variant),)+
                    _ => None,
                }
            }

            pub fn from_name(name: &str) -> Option<Quality> {
                let lowered = name.trim().to_ascii_lowercase();
                Quality::ALL
                    .iter()
                    .copied()
                    .find(|q| q.name() == lowered || q.display_name().eq_ignore_ascii_case(&lowered))
            }
        }
    };
}

qualities! {
    Unknown = 0, "unknown", "Unknown", Unknown, Unknown, None;
    Sdtv = 1, "sdtv", "SDTV", Television, R480p, None;
    Dvd = 2, "dvd", "DVD", Dvd, R480p, None;
    WebDl1080p = 3, "webdl_1080p", "WEBDL-1080p", WebDl, R1080p, None;
    Hdtv720p = 4, "hdtv_720p", "HDTV-720p", Television, R720p, None;
    WebDl720p = 5, "webdl_720p", "WEBDL-720p", WebDl, R720p, None;
    Bluray720p = 6, "bluray_720p", "Bluray-720p", Bluray, R720p, None;
    Bluray1080p = 7, "bluray_1080p", "Bluray-1080p", Bluray, R1080p, None;
    WebDl480p = 8, "webdl_480p", "WEBDL-480p", WebDl, R480p, None;
    Hdtv1080p = 9, "hdtv_1080p", "HDTV-1080p", Television, R1080p, None;
    RawHd = 10, "raw_hd", "Raw-HD", Television, R1080p, RawHd;
    WebRip480p = 12, "webrip_480p", "WEBRip-480p", WebRip, R480p, None;
    WebRip720p = 14, "webrip_720p", "WEBRip-720p", WebRip, R720p, None;
    WebRip1080p = 15, "webrip_1080p", "WEBRip-1080p", WebRip, R1080p, None;
    Hdtv2160p = 16, "hdtv_2160p", "HDTV-2160p", Television, R2160p, None;
    WebRip2160p = 17, "webrip_2160p", "WEBRip-2160p", WebRip, R2160p, None;
    WebDl2160p = 18, "webdl_2160p", "WEBDL-2160p", WebDl, R2160p, None;
    Bluray2160p = 19, "bluray_2160p", "Bluray-2160p", Bluray, R2160p, None;
    Bluray480p = 20, "bluray_480p", "Bluray-480p", Bluray, R480p, None;
    Bluray576p = 21, "bluray_576p", "Bluray-576p", Bluray, R576p, None;
    BrDisk = 22, "br_disk", "BR-DISK", Bluray, R1080p, Disc;
    DvdR = 23, "dvd_r", "DVD-R", Dvd, R480p, Disc;
    Workprint = 24, "workprint", "WORKPRINT", Workprint, Unknown, None;
    Cam = 25, "cam", "CAM", Cam, Unknown, None;
    Telesync = 26, "telesync", "TELESYNC", Telesync, Unknown, None;
    Telecine = 27, "telecine", "TELECINE", Telecine, Unknown, None;
    Regional = 28, "regional", "REGIONAL", Dvd, R480p, Regional;
    DvdScr = 29, "dvdscr", "DVDSCR", Dvd, R480p, Screener;
    Remux1080p = 30, "remux_1080p", "Remux-1080p", Bluray, R1080p, Remux;
    Remux2160p = 31, "remux_2160p", "Remux-2160p", Bluray, R2160p, Remux;
    Mp3Cbr192 = 100, "mp3_192", "MP3-192", Unknown, Unknown, None;
    Mp3VbrV2 = 101, "mp3_vbr_v2", "MP3-VBR-V2", Unknown, Unknown, None;
    Mp3Cbr256 = 102, "mp3_256", "MP3-256", Unknown, Unknown, None;
    Mp3VbrV0 = 103, "mp3_vbr_v0", "MP3-VBR-V0", Unknown, Unknown, None;
    Mp3Cbr320 = 104, "mp3_320", "MP3-320", Unknown, Unknown, None;
    Aac = 105, "aac", "AAC", Unknown, Unknown, None;
    Flac = 106, "flac", "FLAC", Unknown, Unknown, None;
    Alac = 107, "alac", "ALAC", Unknown, Unknown, None;
    Flac24 = 108, "flac_24", "FLAC 24bit", Unknown, Unknown, None;
    Wav = 109, "wav", "WAV", Unknown, Unknown, None;
}

/// The global total order, lowest first.
///
/// Positions here are never persisted; profiles store ids.
pub const QUALITY_ORDER: &[Quality] = &[
    Quality::Unknown,
    Quality::Mp3Cbr192,
    Quality::Mp3VbrV2,
    Quality::Mp3Cbr256,
    Quality::Mp3VbrV0,
    Quality::Mp3Cbr320,
    Quality::Aac,
    Quality::Flac,
    Quality::Alac,
    Quality::Flac24,
    Quality::Wav,
    Quality::Workprint,
    Quality::Cam,
    Quality::Telesync,
    Quality::Telecine,
    Quality::Regional,
    Quality::DvdScr,
    Quality::Sdtv,
    Quality::Dvd,
    Quality::DvdR,
    Quality::WebDl480p,
    Quality::WebRip480p,
    Quality::Bluray480p,
    Quality::Bluray576p,
    Quality::Hdtv720p,
    Quality::WebDl720p,
    Quality::WebRip720p,
    Quality::Bluray720p,
    Quality::Hdtv1080p,
    Quality::WebDl1080p,
    Quality::WebRip1080p,
    Quality::Bluray1080p,
    Quality::Remux1080p,
    Quality::Hdtv2160p,
    Quality::WebDl2160p,
    Quality::WebRip2160p,
    Quality::Bluray2160p,
    Quality::Remux2160p,
    Quality::BrDisk,
    Quality::RawHd,
];

impl Quality {
    /// Position in [`QUALITY_ORDER`].
    pub fn weight(self) -> usize {
        QUALITY_ORDER
            .iter()
            .position(|q| *q == self)
            .unwrap_or_default()
    }

    pub fn is_audio(self) -> bool {
        (100..200).contains(&self.id())
    }

    /// Map extracted title parts to a video quality level.
    pub fn from_parts(source: Source, resolution: Resolution, modifier: Modifier) -> Quality {
        match modifier {
            Modifier::Regional => return Quality::Regional,
            Modifier::Screener => return Quality::DvdScr,
            Modifier::RawHd => return Quality::RawHd,
            _ => {}
        }

        match source {
            Source::Bluray => match (modifier, resolution) {
                (Modifier::Disc, _) => Quality::BrDisk,
                (Modifier::Remux, Resolution::R2160p) => Quality::Remux2160p,
                (Modifier::Remux, _) => Quality::Remux1080p,
                (_, Resolution::R480p) => Quality::Bluray480p,
                (_, Resolution::R576p) => Quality::Bluray576p,
                (_, Resolution::R1080p) => Quality::Bluray1080p,
                (_, Resolution::R2160p) => Quality::Bluray2160p,
                _ => Quality::Bluray720p,
            },
            Source::WebDl => match resolution {
                Resolution::R720p => Quality::WebDl720p,
                Resolution::R1080p => Quality::WebDl1080p,
                Resolution::R2160p => Quality::WebDl2160p,
                _ => Quality::WebDl480p,
            },
            Source::WebRip => match resolution {
                Resolution::R720p => Quality::WebRip720p,
                Resolution::R1080p => Quality::WebRip1080p,
                Resolution::R2160p => Quality::WebRip2160p,
                _ => Quality::WebRip480p,
            },
            Source::Television => match resolution {
                Resolution::R720p => Quality::Hdtv720p,
                Resolution::R1080p => Quality::Hdtv1080p,
                Resolution::R2160p => Quality::Hdtv2160p,
                _ => Quality::Sdtv,
            },
            Source::Dvd => match modifier {
                Modifier::Disc => Quality::DvdR,
                _ => Quality::Dvd,
            },
            Source::Cam => Quality::Cam,
            Source::Telesync => Quality::Telesync,
            Source::Telecine => Quality::Telecine,
            Source::Workprint => Quality::Workprint,
            Source::Unknown => match (modifier, resolution) {
                (Modifier::Remux, Resolution::R2160p) => Quality::Remux2160p,
                (Modifier::Remux, _) => Quality::Remux1080p,
                (_, Resolution::R2160p) => Quality::WebDl2160p,
                (_, Resolution::R1080p) => Quality::WebDl1080p,
                (_, Resolution::R720p) => Quality::WebDl720p,
                (_, Resolution::R480p) | (_, Resolution::R576p) => Quality::Dvd,
                _ => Quality::Unknown,
            },
        }
    }
}

impl Ord for Quality {
    fn cmp(&self, other: &Self) -> Ordering {
        self.weight().cmp(&other.weight())
    }
}

impl PartialOrd for Quality {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl Serialize for Quality {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u16(self.id())
    }
}

impl<'de> Deserialize<'de> for Quality {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum QualityRef {
            Id(u16),
            Name(String),
        }

        match QualityRef::deserialize(deserializer)? {
            QualityRef::Id(id) => Quality::from_id(id)
                .ok_or_else(|| de::Error::custom(format!("unknown quality id {}", id))),
            QualityRef::Name(name) => Quality::from_name(&name)
                .ok_or_else(|| de::Error::custom(format!("unknown quality '{}'", name))),
        }
    }
}

/// Re-release markers of a single release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Revision {
    /// 1 for an original release, raised by PROPER/REPACK or an explicit `v2`.
    pub version: u8,
    /// Number of case-sensitive `REAL` markers.
    pub real: u8,
    pub proper: bool,
    pub repack: bool,
}

impl Default for Revision {
    fn default() -> Self {
        Self {
            version: 1,
            real: 0,
            proper: false,
            repack: false,
        }
    }
}

impl Revision {
    pub fn is_rerelease(&self) -> bool {
        self.proper || self.repack
    }
}

/// A proper or repack outranks an original; then higher version; then REAL count.
impl Ord for Revision {
    fn cmp(&self, other: &Self) -> Ordering {
        self.is_rerelease()
            .cmp(&other.is_rerelease())
            .then(self.version.cmp(&other.version))
            .then(self.real.cmp(&other.real))
    }
}

impl PartialOrd for Revision {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Quality information extracted from one title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualitySignal {
    pub level: Quality,
    pub resolution: Resolution,
    pub source: Source,
    pub modifier: Modifier,
    pub revision: Revision,
    pub detection: DetectionSource,
}

impl QualitySignal {
    pub fn unknown() -> Self {
        Self {
            level: Quality::Unknown,
            resolution: Resolution::Unknown,
            source: Source::Unknown,
            modifier: Modifier::None,
            revision: Revision::default(),
            detection: DetectionSource::Unknown,
        }
    }

    /// A signal for a known level with default revision.
    pub fn new(level: Quality) -> Self {
        Self {
            level,
            resolution: level.resolution(),
            source: level.source(),
            modifier: level.modifier(),
            revision: Revision::default(),
            detection: DetectionSource::Name,
        }
    }

    pub fn with_revision(mut self, revision: Revision) -> Self {
        self.revision = revision;
        self
    }
}

impl Default for QualitySignal {
    fn default() -> Self {
        Self::unknown()
    }
}
