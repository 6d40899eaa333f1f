//! Embedded audio properties and tags.
//!
//! Uses the lofty crate for format-independent access to MP3, FLAC, OGG,
//! M4A/M4B, WAV, AIFF, APE, WavPack and DSF files. Properties feed quality
//! refinement; tags feed destination naming.

use anyhow::{Context, Result};
use lofty::file::{AudioFile, TaggedFileExt};
use lofty::probe::Probe;
use lofty::tag::{Accessor, ItemKey, Tag};
use std::path::Path;
use std::time::Duration;

use crate::quality::TechnicalHints;

/// Stream properties decoded from the container headers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AudioProperties {
    pub duration: Duration,
    /// Audio bitrate in kbps
    pub bitrate_kbps: Option<u32>,
    pub sample_rate_hz: Option<u32>,
    pub bit_depth: Option<u32>,
    pub channels: Option<u32>,
}

impl AudioProperties {
    pub fn technical_hints(&self) -> TechnicalHints {
        TechnicalHints {
            bit_depth: self.bit_depth,
            sample_rate_hz: self.sample_rate_hz,
            ..Default::default()
        }
    }
}

/// Embedded tags relevant to naming and item matching.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmbeddedTags {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album_artist: Option<String>,
    pub album: Option<String>,
    pub track_number: Option<u32>,
    pub year: Option<u32>,
    /// Audiobooks conventionally store the narrator as composer
    pub composer: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileMetadata {
    pub properties: AudioProperties,
    pub tags: EmbeddedTags,
}

pub fn read(path: &Path) -> Result<FileMetadata> {
    let tagged_file = Probe::open(path)
        .context("Failed to open file for probing")?
        .read()
        .context("Failed to read file metadata")?;

    let props = tagged_file.properties();
    let properties = AudioProperties {
        duration: props.duration(),
        bitrate_kbps: props.audio_bitrate().or(props.overall_bitrate()),
        sample_rate_hz: props.sample_rate(),
        bit_depth: props.bit_depth().map(u32::from),
        channels: props.channels().map(u32::from),
    };

    // Primary tag, or fall back to the first available tag
    let tags = tagged_file
        .primary_tag()
        .or_else(|| tagged_file.first_tag())
        .map(tags_from)
        .unwrap_or_default();

    Ok(FileMetadata { properties, tags })
}

fn tags_from(tag: &Tag) -> EmbeddedTags {
    let text = |key: &ItemKey| {
        tag.get(key)
            .and_then(|item| item.value().text())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };
    let non_empty = |s: Option<std::borrow::Cow<'_, str>>| {
        s.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
    };

    EmbeddedTags {
        title: non_empty(tag.title()),
        artist: non_empty(tag.artist()),
        album_artist: text(&ItemKey::AlbumArtist),
        album: non_empty(tag.album()),
        track_number: tag.track(),
        year: tag.year(),
        composer: text(&ItemKey::Composer),
    }
}
