//! Serde mirror of ffprobe's `-print_format json` output.
//!
//! ffprobe reports most numeric fields (bit rates, durations, sample rates)
//! as strings; they are kept as strings here and parsed leniently by the
//! model builder.

use serde::Deserialize;
use std::collections::HashMap;

/// Top-level ffprobe document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FfprobeOutput {
    #[serde(default)]
    pub streams: Vec<StreamDto>,
    #[serde(default)]
    pub format: Option<FormatDto>,
    #[serde(default)]
    pub frames: Vec<FrameDto>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StreamDto {
    #[serde(default)]
    pub index: u32,
    pub codec_type: Option<String>,
    pub codec_name: Option<String>,
    pub codec_tag_string: Option<String>,
    pub profile: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub pix_fmt: Option<String>,
    pub bits_per_raw_sample: Option<String>,
    pub color_primaries: Option<String>,
    pub color_transfer: Option<String>,
    pub r_frame_rate: Option<String>,
    pub avg_frame_rate: Option<String>,
    pub channels: Option<u32>,
    pub channel_layout: Option<String>,
    pub sample_rate: Option<String>,
    pub bit_rate: Option<String>,
    pub duration: Option<String>,
    #[serde(default)]
    pub tags: HashMap<String, String>,
    #[serde(default)]
    pub side_data_list: Vec<SideDataDto>,
}

impl StreamDto {
    pub fn is_video(&self) -> bool {
        self.codec_type.as_deref() == Some("video")
    }

    pub fn is_audio(&self) -> bool {
        self.codec_type.as_deref() == Some("audio")
    }

    pub fn is_subtitle(&self) -> bool {
        self.codec_type.as_deref() == Some("subtitle")
    }

    /// Case-insensitive tag lookup (Matroska writes `BPS`, MP4 `bps`).
    pub fn tag(&self, key: &str) -> Option<&str> {
        tag_lookup(&self.tags, key)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FormatDto {
    pub format_name: Option<String>,
    pub duration: Option<String>,
    pub bit_rate: Option<String>,
    #[serde(default)]
    pub tags: HashMap<String, String>,
}

/// One decoded frame from the `-show_frames` pass.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FrameDto {
    pub media_type: Option<String>,
    #[serde(default)]
    pub side_data_list: Vec<SideDataDto>,
}

/// Stream or frame side data block.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SideDataDto {
    #[serde(default)]
    pub side_data_type: String,
    pub dv_profile: Option<u32>,
    pub dv_bl_signal_compatibility_id: Option<u32>,
}

impl SideDataDto {
    pub fn is_dolby_vision(&self) -> bool {
        self.side_data_type.contains("DOVI") || self.dv_profile.is_some()
    }

    pub fn is_hdr10_plus(&self) -> bool {
        self.side_data_type.contains("SMPTE2094-40") || self.side_data_type.contains("HDR10+")
    }

    /// Static HDR metadata: mastering display or content light level.
    pub fn is_static_hdr(&self) -> bool {
        self.side_data_type == "Mastering display metadata"
            || self.side_data_type == "Content light level metadata"
    }
}

pub(crate) fn tag_lookup<'a>(tags: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    tags.iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(key))
        .map(|(_, v)| v.as_str())
}
