//! Quality detection from file names and container extensions.
//!
//! Detection order for a name with a recognized extension:
//!
//! ```text
//! 1. Strip the extension, normalize "_" to spaces, match name tokens
//! 2. Fall back to the extension's default quality
//! ```
//!
//! Names without a recognized extension are matched as-is. Nothing here
//! fails: anything unrecognized resolves to [`Quality::Unknown`].

use regex::{Captures, Regex};
use std::sync::LazyLock;

use super::types::{
    DetectionSource, LosslessFormat, LosslessTier, MediaFamily, Quality, QualityModel, Revision,
};

static MUSIC_FORMAT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:(?P<flac>flac)|(?P<alac>alac)|(?P<wav>wav|pcm)|(?P<aiff>aiff?)|(?P<ape>ape|monkey'?s audio)|(?P<wavpack>wavpack|wv)|(?P<dsd>dsd|dsf|dff)(?P<dsdrate>64|128|256|512)?|(?P<mp3>mp3|mpeg-?3)|(?P<aac>aac|m4a)|(?P<vorbis>vorbis|ogg)|(?P<opus>opus)|(?P<wma>wma))\b",
    )
    .expect("music format regex")
});

static LOSSY_BITRATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?P<rate>96|128|160|192|224|256|320)\s*(?:k|kbps|kbit/?s?)?\b")
        .expect("bitrate regex")
});

static LOSSY_VBR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:vbr|v0|v1|v2)\b").expect("vbr regex"));

static VORBIS_LEVEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bq(?P<q>10|[5-9])\b").expect("vorbis regex"));

static LOSSLESS_RESOLUTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?P<bits>16|24|32)\s*(?:-?bits?)?\s*[-/ ]?\s*(?P<rate>44(?:[.,]1)?|48|88(?:[.,]2)?|96|176(?:[.,]4)?|192|352(?:[.,]8)?|384)\s*(?:k(?:hz)?)?\b",
    )
    .expect("lossless resolution regex")
});

static LOSSLESS_24BIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b24\s*-?\s*bits?\b").expect("24bit regex"));

static AUDIOBOOK_FORMAT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:(?P<m4b>m4b)|(?P<m4a>m4a|aac)|(?P<flac>flac)|(?P<mp3>mp3))\b")
        .expect("audiobook regex")
});

static EBOOK_FORMAT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:(?P<epub>epub)|(?P<azw3>azw3?|kindle)|(?P<mobi>mobi)|(?P<pdf>pdf))\b")
        .expect("ebook regex")
});

static MOVIE_RESOLUTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:(?P<r2160>2160p|4k|uhd)|(?P<r1080>1080[pi])|(?P<r720>720p)|(?P<r576>576p)|(?P<r480>480p))\b",
    )
    .expect("movie resolution regex")
});

static MOVIE_SOURCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:(?P<remux>remux)|(?P<bluray>blu-?ray|bdrip|brrip|bd25|bd50)|(?P<web>web-?dl|webrip|web)|(?P<hdtv>hdtv|pdtv)|(?P<dvd>dvd(?:rip|r|5|9)?)|(?P<sdtv>sdtv|tvrip))\b",
    )
    .expect("movie source regex")
});

static REVISION_PROPER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:proper|repack|rerip)\b").expect("proper regex"));

static REVISION_VERSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bv(?P<version>[2-9])\b").expect("version regex"));

static REVISION_REAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bREAL\b").expect("real regex"));

/// Parse the quality of a file or release name for the given media family.
pub fn parse_quality(family: MediaFamily, name: &str) -> QualityModel {
    let name = name.trim();
    if name.is_empty() {
        return QualityModel::unknown();
    }

    let revision = parse_revision(name);

    if let Some((stem, ext)) = split_extension(name, family) {
        let normalized = stem.replace('_', " ");
        if let Some(quality) = quality_from_name(family, &normalized, Some(&ext)) {
            return QualityModel::new(quality, revision, DetectionSource::Name);
        }
        if let Some(quality) = quality_from_extension(family, &ext) {
            return QualityModel::new(quality, revision, DetectionSource::Extension);
        }
    }

    let normalized = name.replace('_', " ");
    match quality_from_name(family, &normalized, None) {
        Some(quality) => QualityModel::new(quality, revision, DetectionSource::Name),
        None => QualityModel::new(Quality::Unknown, revision, DetectionSource::Unknown),
    }
}

pub fn parse_music_quality(name: &str) -> QualityModel {
    parse_quality(MediaFamily::Music, name)
}

pub fn parse_audiobook_quality(name: &str) -> QualityModel {
    parse_quality(MediaFamily::Audiobook, name)
}

pub fn parse_ebook_quality(name: &str) -> QualityModel {
    parse_quality(MediaFamily::Ebook, name)
}

pub fn parse_movie_quality(name: &str) -> QualityModel {
    parse_quality(MediaFamily::Movie, name)
}

/// Parse release revision markers (PROPER/REPACK, vN, REAL).
pub fn parse_revision(name: &str) -> Revision {
    let mut revision = Revision::default();

    if REVISION_PROPER.is_match(name) {
        revision.version = 2;
    }
    if let Some(version) = REVISION_VERSION
        .captures(name)
        .and_then(|c| c["version"].parse::<u32>().ok())
    {
        revision.version = revision.version.max(version);
    }
    revision.real = REVISION_REAL.find_iter(name).count() as u32;

    revision
}

/// Select a DSD tier from the sample rate in kHz.
pub fn dsd_quality_for_sample_rate(sample_rate_khz: u32) -> Quality {
    match sample_rate_khz {
        r if r >= 22_000 => Quality::MusicDsd512,
        r if r >= 11_000 => Quality::MusicDsd256,
        r if r >= 5_000 => Quality::MusicDsd128,
        _ => Quality::MusicDsd64,
    }
}

/// Technical properties read from the file itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TechnicalHints {
    pub bit_depth: Option<u32>,
    pub sample_rate_hz: Option<u32>,
    pub video_width: Option<u32>,
    pub video_height: Option<u32>,
}

/// Refine an extension-derived quality with the file's technical properties.
///
/// Name-derived qualities are explicit and left untouched.
pub fn refine_quality(model: QualityModel, hints: &TechnicalHints) -> QualityModel {
    if model.source != DetectionSource::Extension {
        return model;
    }

    let refined = if let Some(format) = model.quality.lossless_format() {
        match (hints.bit_depth, hints.sample_rate_hz) {
            (Some(bits), Some(rate)) => Some(format.at(LosslessTier::from_resolution(bits, rate))),
            _ => None,
        }
    } else if model.quality.is_dsd() {
        hints
            .sample_rate_hz
            .map(|hz| dsd_quality_for_sample_rate(hz / 1000))
    } else if model.quality.family() == Some(MediaFamily::Movie) {
        resolution_from_dimensions(hints.video_width, hints.video_height).and_then(|resolution| {
            let source = match model.quality {
                Quality::MovieBluray1080p => MovieSource::Bluray,
                _ => MovieSource::Hdtv,
            };
            movie_quality(Some(source), Some(resolution))
        })
    } else {
        None
    };

    match refined {
        Some(quality) if quality != model.quality => {
            QualityModel::new(quality, model.revision, DetectionSource::MediaInfo)
        }
        _ => model,
    }
}

fn split_extension(name: &str, family: MediaFamily) -> Option<(String, String)> {
    let (stem, ext) = name.rsplit_once('.')?;
    let ext = ext.to_lowercase();
    if stem.is_empty() || !family.extensions().contains(&ext.as_str()) {
        return None;
    }
    Some((stem.to_string(), ext))
}

fn quality_from_name(family: MediaFamily, text: &str, ext: Option<&str>) -> Option<Quality> {
    match family {
        MediaFamily::Music => music_from_name(text, ext),
        MediaFamily::Audiobook => audiobook_from_name(text),
        MediaFamily::Ebook => ebook_from_name(text),
        MediaFamily::Movie => movie_from_name(text),
    }
}

fn quality_from_extension(family: MediaFamily, ext: &str) -> Option<Quality> {
    match family {
        MediaFamily::Music => music_from_extension(ext),
        MediaFamily::Audiobook => match ext {
            "mp3" => Some(Quality::AudiobookMp3),
            "m4a" | "aac" => Some(Quality::AudiobookM4a),
            "m4b" => Some(Quality::AudiobookM4b),
            "flac" => Some(Quality::AudiobookFlac),
            _ => None,
        },
        MediaFamily::Ebook => match ext {
            "epub" => Some(Quality::EbookEpub),
            "mobi" => Some(Quality::EbookMobi),
            "azw3" | "azw" => Some(Quality::EbookAzw3),
            "pdf" => Some(Quality::EbookPdf),
            _ => None,
        },
        MediaFamily::Movie => match ext {
            "m2ts" => Some(Quality::MovieBluray1080p),
            "avi" | "wmv" | "mpg" | "mpeg" => Some(Quality::MovieSdtv),
            "mkv" | "mp4" | "m4v" | "ts" | "webm" | "mov" => Some(Quality::MovieHdtv720p),
            _ => None,
        },
    }
}

// ============================================================================
// Music
// ============================================================================

fn music_from_extension(ext: &str) -> Option<Quality> {
    Some(match ext {
        "mp3" => Quality::MusicMp3_320,
        "m4a" | "aac" => Quality::MusicAac320,
        "ogg" | "oga" => Quality::MusicVorbisQ10,
        "opus" => Quality::MusicOpus,
        "wma" => Quality::MusicWma,
        "ape" => Quality::MusicApe,
        "wv" => Quality::MusicWavPack,
        "dsf" | "dff" => Quality::MusicDsd64,
        _ => return lossless_from_extension(ext).map(|f| f.at(LosslessTier::Bits16Khz44)),
    })
}

fn lossless_from_extension(ext: &str) -> Option<LosslessFormat> {
    match ext {
        "flac" => Some(LosslessFormat::Flac),
        "wav" => Some(LosslessFormat::Wav),
        "aif" | "aiff" => Some(LosslessFormat::Aiff),
        "alac" => Some(LosslessFormat::Alac),
        _ => None,
    }
}

fn music_from_name(text: &str, ext: Option<&str>) -> Option<Quality> {
    let Some(caps) = MUSIC_FORMAT.captures(text) else {
        // A resolution token alone still qualifies a lossless container
        let format = ext.and_then(lossless_from_extension)?;
        return lossless_tier_from_name(text).map(|tier| format.at(tier));
    };

    let has = |group: &str| caps.name(group).is_some();

    if let Some(format) = [
        ("flac", LosslessFormat::Flac),
        ("alac", LosslessFormat::Alac),
        ("wav", LosslessFormat::Wav),
        ("aiff", LosslessFormat::Aiff),
    ]
    .into_iter()
    .find_map(|(group, format)| has(group).then_some(format))
    {
        let tier = lossless_tier_from_name(text).unwrap_or(LosslessTier::Bits16Khz44);
        return Some(format.at(tier));
    }

    if has("dsd") {
        return Some(dsd_from_captures(&caps));
    }
    if has("ape") {
        return Some(Quality::MusicApe);
    }
    if has("wavpack") {
        return Some(Quality::MusicWavPack);
    }
    if has("mp3") {
        return Some(mp3_from_name(text));
    }
    if has("aac") {
        return Some(aac_from_name(text));
    }
    if has("vorbis") {
        return Some(vorbis_from_name(text));
    }
    if has("opus") {
        return Some(Quality::MusicOpus);
    }
    if has("wma") {
        return Some(Quality::MusicWma);
    }
    None
}

fn dsd_from_captures(caps: &Captures<'_>) -> Quality {
    match caps.name("dsdrate").map(|m| m.as_str()) {
        Some("512") => Quality::MusicDsd512,
        Some("256") => Quality::MusicDsd256,
        Some("128") => Quality::MusicDsd128,
        _ => Quality::MusicDsd64,
    }
}

fn lossy_bitrate(text: &str) -> Option<u32> {
    LOSSY_BITRATE
        .captures(text)
        .and_then(|c| c["rate"].parse().ok())
}

fn mp3_from_name(text: &str) -> Quality {
    match lossy_bitrate(text) {
        Some(320) => Quality::MusicMp3_320,
        Some(256) => Quality::MusicMp3_256,
        Some(224) => Quality::MusicMp3_224,
        Some(192) => Quality::MusicMp3_192,
        Some(160) => Quality::MusicMp3_160,
        Some(128) => Quality::MusicMp3_128,
        Some(96) => Quality::MusicMp3_096,
        _ if LOSSY_VBR.is_match(text) => Quality::MusicMp3Vbr,
        _ => Quality::MusicMp3_320,
    }
}

fn aac_from_name(text: &str) -> Quality {
    match lossy_bitrate(text) {
        Some(320) => Quality::MusicAac320,
        Some(256) => Quality::MusicAac256,
        Some(rate) if rate <= 192 => Quality::MusicAac192,
        _ if LOSSY_VBR.is_match(text) => Quality::MusicAacVbr,
        _ => Quality::MusicAac320,
    }
}

fn vorbis_from_name(text: &str) -> Quality {
    let level = VORBIS_LEVEL
        .captures(text)
        .and_then(|c| c["q"].parse::<u32>().ok());
    match level {
        Some(5) => Quality::MusicVorbisQ5,
        Some(6) => Quality::MusicVorbisQ6,
        Some(7) => Quality::MusicVorbisQ7,
        Some(8) => Quality::MusicVorbisQ8,
        Some(9) => Quality::MusicVorbisQ9,
        _ => Quality::MusicVorbisQ10,
    }
}

fn lossless_tier_from_name(text: &str) -> Option<LosslessTier> {
    if let Some(caps) = LOSSLESS_RESOLUTION.captures(text) {
        let bits: u32 = caps["bits"].parse().ok()?;
        let rate = sample_rate_token_hz(&caps["rate"])?;
        return Some(LosslessTier::from_resolution(bits, rate));
    }
    LOSSLESS_24BIT
        .is_match(text)
        .then_some(LosslessTier::Bits24Khz44)
}

fn sample_rate_token_hz(token: &str) -> Option<u32> {
    let whole = token.split(['.', ',']).next()?;
    Some(match whole {
        "44" => 44_100,
        "48" => 48_000,
        "88" => 88_200,
        "96" => 96_000,
        "176" => 176_400,
        "192" => 192_000,
        "352" => 352_800,
        "384" => 384_000,
        _ => return None,
    })
}

// ============================================================================
// Audiobooks and ebooks
// ============================================================================

fn audiobook_from_name(text: &str) -> Option<Quality> {
    let caps = AUDIOBOOK_FORMAT.captures(text)?;
    if caps.name("m4b").is_some() {
        Some(Quality::AudiobookM4b)
    } else if caps.name("m4a").is_some() {
        Some(Quality::AudiobookM4a)
    } else if caps.name("flac").is_some() {
        Some(Quality::AudiobookFlac)
    } else if caps.name("mp3").is_some() {
        Some(Quality::AudiobookMp3)
    } else {
        None
    }
}

fn ebook_from_name(text: &str) -> Option<Quality> {
    let caps = EBOOK_FORMAT.captures(text)?;
    if caps.name("epub").is_some() {
        Some(Quality::EbookEpub)
    } else if caps.name("azw3").is_some() {
        Some(Quality::EbookAzw3)
    } else if caps.name("mobi").is_some() {
        Some(Quality::EbookMobi)
    } else if caps.name("pdf").is_some() {
        Some(Quality::EbookPdf)
    } else {
        None
    }
}

// ============================================================================
// Movies
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MovieSource {
    Sdtv,
    Dvd,
    Hdtv,
    Web,
    Bluray,
    Remux,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Resolution {
    R480,
    R576,
    R720,
    R1080,
    R2160,
}

fn movie_from_name(text: &str) -> Option<Quality> {
    let resolution = MOVIE_RESOLUTION.captures(text).and_then(|caps| {
        [
            ("r2160", Resolution::R2160),
            ("r1080", Resolution::R1080),
            ("r720", Resolution::R720),
            ("r576", Resolution::R576),
            ("r480", Resolution::R480),
        ]
        .into_iter()
        .find_map(|(group, res)| caps.name(group).map(|_| res))
    });

    // Release names often carry several source tokens ("BluRay.REMUX"),
    // so the most specific one wins rather than the leftmost.
    const SOURCE_PRIORITY: [(&str, MovieSource); 6] = [
        ("remux", MovieSource::Remux),
        ("bluray", MovieSource::Bluray),
        ("web", MovieSource::Web),
        ("hdtv", MovieSource::Hdtv),
        ("dvd", MovieSource::Dvd),
        ("sdtv", MovieSource::Sdtv),
    ];
    let source = MOVIE_SOURCE
        .captures_iter(text)
        .filter_map(|caps| {
            SOURCE_PRIORITY
                .iter()
                .position(|(group, _)| caps.name(group).is_some())
        })
        .min()
        .map(|idx| SOURCE_PRIORITY[idx].1);

    movie_quality(source, resolution)
}

fn movie_quality(source: Option<MovieSource>, resolution: Option<Resolution>) -> Option<Quality> {
    use Resolution::*;

    let quality = match (source, resolution) {
        (None, None) => return None,
        (Some(MovieSource::Remux), Some(R2160)) => Quality::MovieRemux2160p,
        (Some(MovieSource::Remux), _) => Quality::MovieRemux1080p,
        (Some(MovieSource::Bluray), Some(R2160)) => Quality::MovieBluray2160p,
        (Some(MovieSource::Bluray), Some(R1080) | None) => Quality::MovieBluray1080p,
        (Some(MovieSource::Bluray), Some(R720)) => Quality::MovieBluray720p,
        (Some(MovieSource::Bluray), Some(_)) => Quality::MovieDvd,
        (Some(MovieSource::Web), Some(R2160)) => Quality::MovieWeb2160p,
        (Some(MovieSource::Web), Some(R1080)) => Quality::MovieWeb1080p,
        (Some(MovieSource::Web), Some(R720) | None) => Quality::MovieWeb720p,
        (Some(MovieSource::Web), Some(_)) => Quality::MovieSdtv,
        (Some(MovieSource::Dvd), _) => Quality::MovieDvd,
        (Some(MovieSource::Sdtv), _) => Quality::MovieSdtv,
        (Some(MovieSource::Hdtv) | None, Some(R2160)) => Quality::MovieHdtv2160p,
        (Some(MovieSource::Hdtv) | None, Some(R1080)) => Quality::MovieHdtv1080p,
        (Some(MovieSource::Hdtv) | None, Some(R720)) => Quality::MovieHdtv720p,
        (Some(MovieSource::Hdtv) | None, _) => Quality::MovieSdtv,
    };
    Some(quality)
}

fn resolution_from_dimensions(width: Option<u32>, height: Option<u32>) -> Option<Resolution> {
    match (width.filter(|w| *w > 0), height.filter(|h| *h > 0)) {
        (Some(w), _) if w >= 3200 => Some(Resolution::R2160),
        (Some(w), _) if w >= 1800 => Some(Resolution::R1080),
        (Some(w), _) if w >= 1200 => Some(Resolution::R720),
        (Some(_), _) => Some(Resolution::R480),
        (None, Some(h)) if h >= 1600 => Some(Resolution::R2160),
        (None, Some(h)) if h >= 800 => Some(Resolution::R1080),
        (None, Some(h)) if h >= 600 => Some(Resolution::R720),
        (None, Some(_)) => Some(Resolution::R480),
        (None, None) => None,
    }
}


/// Property-based tests using proptest
#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn any_family() -> impl Strategy<Value = MediaFamily> {
        prop::sample::select(vec![
            MediaFamily::Music,
            MediaFamily::Audiobook,
            MediaFamily::Ebook,
            MediaFamily::Movie,
        ])
    }

    proptest! {
        /// Parsing never panics and is deterministic
        #[test]
        fn parse_is_total_and_deterministic(family in any_family(), name in ".{0,80}") {
            let first = parse_quality(family, &name);
            let second = parse_quality(family, &name);
            prop_assert_eq!(first, second);
        }

        /// A detected quality always belongs to the requested family
        #[test]
        fn parsed_quality_matches_family(family in any_family(), name in "[A-Za-z0-9 ._\\-\\[\\]]{0,60}") {
            let model = parse_quality(family, &name);
            prop_assert!(model.quality.is_unknown() || model.quality.family() == Some(family));
        }

        /// Every recognized extension yields a known quality
        #[test]
        fn recognized_extensions_never_unknown(family in any_family(), stem in "[a-z]{1,12}", idx in 0usize..16) {
            let exts = family.extensions();
            let ext = exts[idx % exts.len()];
            let model = parse_quality(family, &format!("{stem}.{ext}"));
            prop_assert!(!model.is_unknown(), "{}.{} was unknown", stem, ext);
        }
    }
}
