//! Normalized technical description of a probed file.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;
use std::time::Duration;

use super::dto::{FfprobeOutput, SideDataDto, StreamDto};
use super::hdr::{HdrSignals, classify_hdr};

/// Bumped whenever the model gains or reinterprets fields.
pub const CURRENT_SCHEMA_REVISION: u32 = 1;

/// Codecs ffprobe reports as video streams that are really still images.
const IMAGE_CODECS: &[&str] = &["mjpeg", "png", "bmp", "gif", "webp", "tiff"];

/// Language lists are short; most files carry one or two tracks.
pub type LanguageList = SmallVec<[String; 4]>;

/// HDR classification of the primary video stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum HdrFormat {
    #[default]
    None,
    Pq10,
    Hdr10,
    Hdr10Plus,
    Hlg10,
    DolbyVision,
    DolbyVisionHdr10,
    DolbyVisionSdr,
    DolbyVisionHlg,
    DolbyVisionHdr10Plus,
}

impl HdrFormat {
    pub fn is_hdr(self) -> bool {
        !matches!(self, Self::None | Self::DolbyVisionSdr)
    }
}

impl fmt::Display for HdrFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::None => "SDR",
            Self::Pq10 => "PQ10",
            Self::Hdr10 => "HDR10",
            Self::Hdr10Plus => "HDR10+",
            Self::Hlg10 => "HLG",
            Self::DolbyVision => "DV",
            Self::DolbyVisionHdr10 => "DV HDR10",
            Self::DolbyVisionSdr => "DV SDR",
            Self::DolbyVisionHlg => "DV HLG",
            Self::DolbyVisionHdr10Plus => "DV HDR10+",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaInfoModel {
    pub schema_revision: u32,
    pub container_format: String,

    pub video_format: Option<String>,
    pub video_codec_id: Option<String>,
    pub video_profile: Option<String>,
    pub video_bitrate: u64,
    pub video_bit_depth: u32,
    pub width: u32,
    pub height: u32,
    pub video_fps: f64,
    pub video_color_primaries: Option<String>,
    pub video_transfer_characteristics: Option<String>,
    pub video_hdr_format: HdrFormat,

    pub audio_format: Option<String>,
    pub audio_codec_id: Option<String>,
    pub audio_profile: Option<String>,
    pub audio_bitrate: u64,
    pub audio_channels: u32,
    pub audio_channel_layout: Option<String>,
    pub audio_sample_rate: u32,
    pub audio_stream_count: u32,
    pub audio_languages: LanguageList,
    pub subtitles: LanguageList,

    pub run_time: Duration,
}

impl MediaInfoModel {
    pub fn has_video(&self) -> bool {
        self.video_format.is_some()
    }
}

/// Primary video stream and its ordinal among video streams (for `v:N`).
///
/// The first video stream wins unless the file has several streams and
/// that one is an image codec (embedded cover art); then the first
/// motion stream is used, or none if there is no motion stream.
pub fn primary_video_stream(output: &FfprobeOutput) -> Option<(usize, &StreamDto)> {
    let mut videos = output.streams.iter().filter(|s| s.is_video()).enumerate();
    let (ordinal, first) = videos.next()?;

    if output.streams.len() > 1 && is_image_codec(first) {
        return videos.find(|(_, s)| !is_image_codec(s));
    }
    Some((ordinal, first))
}

pub fn primary_audio_stream(output: &FfprobeOutput) -> Option<&StreamDto> {
    output.streams.iter().find(|s| s.is_audio())
}

fn is_image_codec(stream: &StreamDto) -> bool {
    stream
        .codec_name
        .as_deref()
        .is_some_and(|c| IMAGE_CODECS.contains(&c))
}

/// Build the normalized model from a format/streams pass plus any side
/// data read from the first decoded video frame.
pub fn build_media_info(output: &FfprobeOutput, frame_side_data: &[SideDataDto]) -> MediaInfoModel {
    let video = primary_video_stream(output).map(|(_, s)| s);
    let audio = primary_audio_stream(output);

    let mut info = MediaInfoModel {
        schema_revision: CURRENT_SCHEMA_REVISION,
        container_format: output
            .format
            .as_ref()
            .and_then(|f| f.format_name.clone())
            .unwrap_or_default(),
        ..Default::default()
    };

    if let Some(video) = video {
        info.video_format = video.codec_name.clone();
        info.video_codec_id = video.codec_tag_string.clone();
        info.video_profile = video.profile.clone();
        info.video_bitrate = stream_bitrate(video);
        info.video_bit_depth = video_bit_depth(video);
        info.width = video.width.unwrap_or(0);
        info.height = video.height.unwrap_or(0);
        info.video_fps = video
            .r_frame_rate
            .as_deref()
            .and_then(parse_frame_rate)
            .or_else(|| video.avg_frame_rate.as_deref().and_then(parse_frame_rate))
            .unwrap_or(0.0);
        info.video_color_primaries = video.color_primaries.clone();
        info.video_transfer_characteristics = video.color_transfer.clone();

        let side_data = || video.side_data_list.iter().chain(frame_side_data);
        info.video_hdr_format = classify_hdr(&HdrSignals {
            bit_depth: info.video_bit_depth,
            color_primaries: video.color_primaries.as_deref(),
            transfer_characteristics: video.color_transfer.as_deref(),
            dolby_vision: side_data().any(SideDataDto::is_dolby_vision),
            dynamic_metadata: side_data().any(SideDataDto::is_hdr10_plus),
            static_metadata: side_data().any(SideDataDto::is_static_hdr),
        });
    }

    if let Some(audio) = audio {
        info.audio_format = audio.codec_name.clone();
        info.audio_codec_id = audio.codec_tag_string.clone();
        info.audio_profile = audio.profile.clone();
        info.audio_bitrate = stream_bitrate(audio);
        info.audio_channels = audio.channels.unwrap_or(0);
        info.audio_channel_layout = audio.channel_layout.clone();
        info.audio_sample_rate = audio
            .sample_rate
            .as_deref()
            .and_then(|r| r.trim().parse().ok())
            .unwrap_or(0);
    }

    for stream in &output.streams {
        if stream.is_audio() {
            info.audio_stream_count += 1;
            info.audio_languages.push(stream_language(stream));
        } else if stream.is_subtitle() {
            info.subtitles.push(stream_language(stream));
        }
    }

    info.run_time = video
        .and_then(stream_duration)
        .or_else(|| audio.and_then(stream_duration))
        .or_else(|| {
            output
                .format
                .as_ref()
                .and_then(|f| f.duration.as_deref())
                .and_then(parse_seconds)
        })
        .unwrap_or_default();

    info
}

/// Explicit bit rate, else the `BPS` statistics tag, else 0.
pub fn stream_bitrate(stream: &StreamDto) -> u64 {
    let parse = |s: &str| s.trim().parse::<u64>().ok().filter(|v| *v > 0);

    stream
        .bit_rate
        .as_deref()
        .and_then(parse)
        .or_else(|| stream.tag("BPS").and_then(parse))
        .or_else(|| stream.tag("BPS-eng").and_then(parse))
        .unwrap_or(0)
}

fn stream_duration(stream: &StreamDto) -> Option<Duration> {
    stream
        .duration
        .as_deref()
        .and_then(parse_seconds)
        .or_else(|| stream.tag("DURATION").and_then(parse_timecode))
        .or_else(|| stream.tag("DURATION-eng").and_then(parse_timecode))
}

fn video_bit_depth(stream: &StreamDto) -> u32 {
    if let Some(bits) = stream
        .bits_per_raw_sample
        .as_deref()
        .and_then(|b| b.trim().parse::<u32>().ok())
        .filter(|b| *b > 0)
    {
        return bits;
    }
    match stream.pix_fmt.as_deref() {
        Some(fmt) if fmt.contains("p16") => 16,
        Some(fmt) if fmt.contains("p12") => 12,
        Some(fmt) if fmt.contains("p10") => 10,
        _ => 8,
    }
}

fn stream_language(stream: &StreamDto) -> String {
    stream
        .tag("language")
        .filter(|l| !l.is_empty())
        .unwrap_or("und")
        .to_string()
}

/// Positive seconds as a decimal string (`"5400.120000"`).
fn parse_seconds(value: &str) -> Option<Duration> {
    let secs: f64 = value.trim().parse().ok()?;
    (secs.is_finite() && secs > 0.0).then(|| Duration::from_secs_f64(secs))
}

/// Matroska statistics timecode (`"01:30:00.120000000"`).
fn parse_timecode(value: &str) -> Option<Duration> {
    let mut parts = value.trim().splitn(3, ':');
    let hours: f64 = parts.next()?.parse().ok()?;
    let minutes: f64 = parts.next()?.parse().ok()?;
    let seconds: f64 = parts.next()?.parse().ok()?;
    let total = hours * 3600.0 + minutes * 60.0 + seconds;
    (total.is_finite() && total > 0.0).then(|| Duration::from_secs_f64(total))
}

/// `"24000/1001"` style rational, or a plain number.
fn parse_frame_rate(value: &str) -> Option<f64> {
    let rate = match value.split_once('/') {
        Some((num, den)) => {
            let den: f64 = den.trim().parse().ok()?;
            if den == 0.0 {
                return None;
            }
            num.trim().parse::<f64>().ok()? / den
        }
        None => value.trim().parse().ok()?,
    };
    (rate.is_finite() && rate > 0.0).then_some(rate)
}
