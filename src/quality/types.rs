//! Quality taxonomy, revisions and the immutable quality model.
//!
//! Every [`Quality`] variant belongs to one media family ladder and carries
//! an explicit rank. Upgrade decisions compare ranks (then revisions), never
//! declaration order, so the ladders can be extended without reordering.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Media family a candidate file belongs to.
///
/// Each family has its own quality ladder and set of recognized extensions.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum MediaFamily {
    Music,
    Audiobook,
    Ebook,
    Movie,
}

impl MediaFamily {
    /// Lowercase file extensions (without dot) recognized for this family.
    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            Self::Music => &[
                "mp3", "m4a", "aac", "ogg", "oga", "opus", "wma", "ape", "wv", "flac", "wav",
                "aif", "aiff", "alac", "dsf", "dff",
            ],
            Self::Audiobook => &["mp3", "m4a", "m4b", "aac", "flac"],
            Self::Ebook => &["epub", "mobi", "azw3", "azw", "pdf"],
            Self::Movie => &[
                "mkv", "mp4", "m4v", "avi", "ts", "m2ts", "wmv", "mpg", "mpeg", "webm", "mov",
            ],
        }
    }

    /// Check whether a path carries one of this family's extensions.
    pub fn is_supported_path(self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| self.extensions().contains(&e.to_lowercase().as_str()))
            .unwrap_or(false)
    }

    /// Whether files of this family are expected to carry an audio track.
    pub fn expects_audio(self) -> bool {
        !matches!(self, Self::Ebook)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Music => "music",
            Self::Audiobook => "audiobook",
            Self::Ebook => "ebook",
            Self::Movie => "movie",
        }
    }
}

impl fmt::Display for MediaFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Generates the [`Quality`] enum and its lookup tables from one ladder.
///
/// Each row is `Variant => Family, rank, "stable_id", "Display title";`.
/// Ranks must be unique within a family.
macro_rules! quality_ladder {
    ($($variant:ident => $family:ident, $rank:literal, $id:literal, $title:literal;)*) => {
        /// A technical quality level on one of the media family ladders.
        ///
        /// `Unknown` has rank 0 and sorts below every known quality.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub enum Quality {
            Unknown,
            $($variant,)*
        }

        impl Quality {
            /// Every quality, `Unknown` first, in ladder-table order.
            pub const ALL: &'static [Quality] = &[Quality::Unknown, $(Quality::$variant,)*];

            /// The family ladder this quality belongs to (`None` for `Unknown`).
            pub fn family(self) -> Option<MediaFamily> {
                match self {
                    Quality::Unknown => None,
                    $(Quality::$variant => Some(MediaFamily::$family),)*
                }
            }

            /// Explicit rank within the family ladder.
            pub const fn rank(self) -> u16 {
                match self {
                    Quality::Unknown => 0,
                    $(Quality::$variant => $rank,)*
                }
            }

            /// Stable identifier used for storage.
            pub fn id(self) -> &'static str {
                match self {
                    Quality::Unknown => "unknown",
                    $(Quality::$variant => $id,)*
                }
            }

            /// Human-readable title.
            pub fn title(self) -> &'static str {
                match self {
                    Quality::Unknown => "Unknown",
                    $(Quality::$variant => $title,)*
                }
            }
        }
    };
}

quality_ladder! {
    // === Music: lossy ===
    MusicWma => Music, 5, "music_wma", "WMA";
    MusicMp3_096 => Music, 8, "music_mp3_096", "MP3-96";
    MusicMp3_128 => Music, 10, "music_mp3_128", "MP3-128";
    MusicMp3_160 => Music, 12, "music_mp3_160", "MP3-160";
    MusicMp3_192 => Music, 14, "music_mp3_192", "MP3-192";
    MusicAac192 => Music, 15, "music_aac_192", "AAC-192";
    MusicVorbisQ5 => Music, 16, "music_vorbis_q5", "OGG Vorbis Q5";
    MusicMp3_224 => Music, 17, "music_mp3_224", "MP3-224";
    MusicMp3_256 => Music, 18, "music_mp3_256", "MP3-256";
    MusicAac256 => Music, 19, "music_aac_256", "AAC-256";
    MusicVorbisQ6 => Music, 20, "music_vorbis_q6", "OGG Vorbis Q6";
    MusicMp3Vbr => Music, 21, "music_mp3_vbr", "MP3-VBR";
    MusicAacVbr => Music, 22, "music_aac_vbr", "AAC-VBR";
    MusicVorbisQ7 => Music, 23, "music_vorbis_q7", "OGG Vorbis Q7";
    MusicMp3_320 => Music, 24, "music_mp3_320", "MP3-320";
    MusicAac320 => Music, 25, "music_aac_320", "AAC-320";
    MusicVorbisQ8 => Music, 26, "music_vorbis_q8", "OGG Vorbis Q8";
    MusicVorbisQ9 => Music, 27, "music_vorbis_q9", "OGG Vorbis Q9";
    MusicVorbisQ10 => Music, 28, "music_vorbis_q10", "OGG Vorbis Q10";
    MusicOpus => Music, 29, "music_opus", "Opus";

    // === Music: lossless (resolution outranks container) ===
    MusicApe => Music, 40, "music_ape", "APE";
    MusicWavPack => Music, 41, "music_wavpack", "WavPack";
    MusicWav16_44 => Music, 50, "music_wav_16_44", "WAV 16bit/44.1kHz";
    MusicAiff16_44 => Music, 51, "music_aiff_16_44", "AIFF 16bit/44.1kHz";
    MusicAlac16_44 => Music, 52, "music_alac_16_44", "ALAC 16bit/44.1kHz";
    MusicFlac16_44 => Music, 53, "music_flac_16_44", "FLAC 16bit/44.1kHz";
    MusicWav16_48 => Music, 54, "music_wav_16_48", "WAV 16bit/48kHz";
    MusicAiff16_48 => Music, 55, "music_aiff_16_48", "AIFF 16bit/48kHz";
    MusicAlac16_48 => Music, 56, "music_alac_16_48", "ALAC 16bit/48kHz";
    MusicFlac16_48 => Music, 57, "music_flac_16_48", "FLAC 16bit/48kHz";
    MusicWav24_44 => Music, 58, "music_wav_24_44", "WAV 24bit/44.1kHz";
    MusicAiff24_44 => Music, 59, "music_aiff_24_44", "AIFF 24bit/44.1kHz";
    MusicAlac24_44 => Music, 60, "music_alac_24_44", "ALAC 24bit/44.1kHz";
    MusicFlac24_44 => Music, 61, "music_flac_24_44", "FLAC 24bit/44.1kHz";
    MusicWav24_48 => Music, 62, "music_wav_24_48", "WAV 24bit/48kHz";
    MusicAiff24_48 => Music, 63, "music_aiff_24_48", "AIFF 24bit/48kHz";
    MusicAlac24_48 => Music, 64, "music_alac_24_48", "ALAC 24bit/48kHz";
    MusicFlac24_48 => Music, 65, "music_flac_24_48", "FLAC 24bit/48kHz";
    MusicWav24_88 => Music, 66, "music_wav_24_88", "WAV 24bit/88.2kHz";
    MusicAiff24_88 => Music, 67, "music_aiff_24_88", "AIFF 24bit/88.2kHz";
    MusicAlac24_88 => Music, 68, "music_alac_24_88", "ALAC 24bit/88.2kHz";
    MusicFlac24_88 => Music, 69, "music_flac_24_88", "FLAC 24bit/88.2kHz";
    MusicWav24_96 => Music, 70, "music_wav_24_96", "WAV 24bit/96kHz";
    MusicAiff24_96 => Music, 71, "music_aiff_24_96", "AIFF 24bit/96kHz";
    MusicAlac24_96 => Music, 72, "music_alac_24_96", "ALAC 24bit/96kHz";
    MusicFlac24_96 => Music, 73, "music_flac_24_96", "FLAC 24bit/96kHz";
    MusicWav24_176 => Music, 74, "music_wav_24_176", "WAV 24bit/176.4kHz";
    MusicAiff24_176 => Music, 75, "music_aiff_24_176", "AIFF 24bit/176.4kHz";
    MusicAlac24_176 => Music, 76, "music_alac_24_176", "ALAC 24bit/176.4kHz";
    MusicFlac24_176 => Music, 77, "music_flac_24_176", "FLAC 24bit/176.4kHz";
    MusicWav24_192 => Music, 78, "music_wav_24_192", "WAV 24bit/192kHz";
    MusicAiff24_192 => Music, 79, "music_aiff_24_192", "AIFF 24bit/192kHz";
    MusicAlac24_192 => Music, 80, "music_alac_24_192", "ALAC 24bit/192kHz";
    MusicFlac24_192 => Music, 81, "music_flac_24_192", "FLAC 24bit/192kHz";

    // === Music: DSD ===
    MusicDsd64 => Music, 90, "music_dsd64", "DSD64";
    MusicDsd128 => Music, 91, "music_dsd128", "DSD128";
    MusicDsd256 => Music, 92, "music_dsd256", "DSD256";
    MusicDsd512 => Music, 93, "music_dsd512", "DSD512";

    // === Audiobooks ===
    AudiobookMp3 => Audiobook, 1, "audiobook_mp3", "Audiobook MP3";
    AudiobookM4a => Audiobook, 2, "audiobook_m4a", "Audiobook M4A";
    AudiobookM4b => Audiobook, 3, "audiobook_m4b", "Audiobook M4B";
    AudiobookFlac => Audiobook, 4, "audiobook_flac", "Audiobook FLAC";

    // === Ebooks ===
    EbookPdf => Ebook, 1, "ebook_pdf", "PDF";
    EbookMobi => Ebook, 2, "ebook_mobi", "MOBI";
    EbookEpub => Ebook, 3, "ebook_epub", "EPUB";
    EbookAzw3 => Ebook, 4, "ebook_azw3", "AZW3";

    // === Movies ===
    MovieSdtv => Movie, 1, "movie_sdtv", "SDTV";
    MovieDvd => Movie, 2, "movie_dvd", "DVD";
    MovieHdtv720p => Movie, 3, "movie_hdtv_720p", "HDTV-720p";
    MovieWeb720p => Movie, 4, "movie_web_720p", "WEB-720p";
    MovieBluray720p => Movie, 5, "movie_bluray_720p", "Bluray-720p";
    MovieHdtv1080p => Movie, 6, "movie_hdtv_1080p", "HDTV-1080p";
    MovieWeb1080p => Movie, 7, "movie_web_1080p", "WEB-1080p";
    MovieBluray1080p => Movie, 8, "movie_bluray_1080p", "Bluray-1080p";
    MovieRemux1080p => Movie, 9, "movie_remux_1080p", "Remux-1080p";
    MovieHdtv2160p => Movie, 10, "movie_hdtv_2160p", "HDTV-2160p";
    MovieWeb2160p => Movie, 11, "movie_web_2160p", "WEB-2160p";
    MovieBluray2160p => Movie, 12, "movie_bluray_2160p", "Bluray-2160p";
    MovieRemux2160p => Movie, 13, "movie_remux_2160p", "Remux-2160p";
}

impl Quality {
    pub fn is_unknown(self) -> bool {
        self == Quality::Unknown
    }

    /// Lossless PCM-family container (WAV/AIFF/ALAC/FLAC), any resolution.
    pub fn lossless_format(self) -> Option<LosslessFormat> {
        let rank = self.rank();
        if self.family() != Some(MediaFamily::Music) || !(50..=81).contains(&rank) {
            return None;
        }
        Some(LosslessFormat::ALL[usize::from((rank - 50) % 4)])
    }

    pub fn is_dsd(self) -> bool {
        matches!(
            self,
            Self::MusicDsd64 | Self::MusicDsd128 | Self::MusicDsd256 | Self::MusicDsd512
        )
    }
}

impl Ord for Quality {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank()
            .cmp(&other.rank())
            .then_with(|| self.family().cmp(&other.family()))
    }
}

impl PartialOrd for Quality {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// Error returned when a stored quality identifier is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown quality identifier: {0}")]
pub struct UnknownQualityId(pub String);

impl FromStr for Quality {
    type Err = UnknownQualityId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Quality::ALL
            .iter()
            .copied()
            .find(|q| q.id() == s)
            .ok_or_else(|| UnknownQualityId(s.to_string()))
    }
}

impl TryFrom<String> for Quality {
    type Error = UnknownQualityId;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Quality> for String {
    fn from(quality: Quality) -> Self {
        quality.id().to_string()
    }
}

/// Lossless container formats that share the bit-depth/sample-rate tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LosslessFormat {
    Wav,
    Aiff,
    Alac,
    Flac,
}

impl LosslessFormat {
    /// Formats in ladder order within a tier.
    pub const ALL: [LosslessFormat; 4] = [Self::Wav, Self::Aiff, Self::Alac, Self::Flac];

    fn offset(self) -> u16 {
        match self {
            Self::Wav => 0,
            Self::Aiff => 1,
            Self::Alac => 2,
            Self::Flac => 3,
        }
    }

    /// Resolve the quality for this format at a resolution tier.
    pub fn at(self, tier: LosslessTier) -> Quality {
        let rank = 50 + tier.index() * 4 + self.offset();
        Quality::ALL
            .iter()
            .copied()
            .find(|q| q.family() == Some(MediaFamily::Music) && q.rank() == rank)
            .unwrap_or(Quality::Unknown)
    }
}

/// Bit-depth/sample-rate tiers for lossless audio, lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LosslessTier {
    Bits16Khz44,
    Bits16Khz48,
    Bits24Khz44,
    Bits24Khz48,
    Bits24Khz88,
    Bits24Khz96,
    Bits24Khz176,
    Bits24Khz192,
}

impl LosslessTier {
    fn index(self) -> u16 {
        self as u16
    }

    /// Nearest tier at or below the given bit depth and sample rate (Hz).
    ///
    /// Combinations without an exact tier fall to the nearest lower one;
    /// anything below 16/44.1 resolves to the 16/44.1 default.
    pub fn from_resolution(bits: u32, sample_rate_hz: u32) -> Self {
        if bits >= 24 {
            match sample_rate_hz {
                r if r >= 192_000 => Self::Bits24Khz192,
                r if r >= 176_400 => Self::Bits24Khz176,
                r if r >= 96_000 => Self::Bits24Khz96,
                r if r >= 88_200 => Self::Bits24Khz88,
                r if r >= 48_000 => Self::Bits24Khz48,
                _ => Self::Bits24Khz44,
            }
        } else if sample_rate_hz >= 48_000 {
            Self::Bits16Khz48
        } else {
            Self::Bits16Khz44
        }
    }
}

/// Distinguishes re-releases at the same quality (e.g. a corrected re-encode).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Revision {
    /// Release version, 1 for the original release
    pub version: u32,
    /// Count of "REAL" markers (fixes to a broken proper)
    pub real: u32,
}

impl Revision {
    pub const fn new(version: u32, real: u32) -> Self {
        Self { version, real }
    }
}

impl Default for Revision {
    fn default() -> Self {
        Self::new(1, 0)
    }
}

/// Where a quality value was detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionSource {
    /// Tokens in the file or release name
    Name,
    /// The container extension's default mapping
    Extension,
    /// Embedded audio properties or probed media info
    MediaInfo,
    /// Nothing matched
    Unknown,
}

impl DetectionSource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Extension => "extension",
            Self::MediaInfo => "media_info",
            Self::Unknown => "unknown",
        }
    }

    /// Parse a stored value; unrecognized values map to `Unknown`.
    pub fn from_str_lossy(s: &str) -> Self {
        match s {
            "name" => Self::Name,
            "extension" => Self::Extension,
            "media_info" => Self::MediaInfo,
            _ => Self::Unknown,
        }
    }
}

/// A detected quality together with its revision and detection source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QualityModel {
    pub quality: Quality,
    pub revision: Revision,
    pub source: DetectionSource,
}

impl QualityModel {
    pub fn new(quality: Quality, revision: Revision, source: DetectionSource) -> Self {
        Self {
            quality,
            revision,
            source,
        }
    }

    /// The unclassified model.
    pub fn unknown() -> Self {
        Self::new(Quality::Unknown, Revision::default(), DetectionSource::Unknown)
    }

    pub fn is_unknown(&self) -> bool {
        self.quality.is_unknown()
    }
}

impl Default for QualityModel {
    fn default() -> Self {
        Self::unknown()
    }
}

impl fmt::Display for QualityModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.quality)?;
        if self.revision.version > 1 {
            write!(f, " v{}", self.revision.version)?;
        }
        if self.revision.real > 0 {
            write!(f, " REAL")?;
        }
        Ok(())
    }
}
