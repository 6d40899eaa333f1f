//! Technical media probing.
//!
//! Runs `ffprobe`, parses its JSON into [`dto`] records and normalizes
//! them into a [`MediaInfoModel`], including HDR classification.
//!
//! # Overview
//!
//! - [`Ffprobe`]: locates the tool and runs the probe passes
//! - [`MediaInfoReader`]: batch-safe wrapper that logs failures and returns `None`
//! - [`build_media_info`]: pure conversion from ffprobe output
//! - [`classify_hdr`]: HDR priority cascade

pub mod dto;
mod ffprobe;
mod hdr;
mod model;
mod reader;

use std::path::PathBuf;

pub use ffprobe::{Ffprobe, MediaProbe};
pub use hdr::{HdrSignals, classify_hdr};
pub use model::{
    CURRENT_SCHEMA_REVISION, HdrFormat, LanguageList, MediaInfoModel, build_media_info,
    primary_audio_stream, primary_video_stream, stream_bitrate,
};
pub use reader::MediaInfoReader;

#[cfg(test)]
pub use ffprobe::mocks;

/// Probe failures. Callers doing batch work go through [`MediaInfoReader`],
/// which turns these into `None`.
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("ffprobe not found. Install FFmpeg or set probe.ffprobe_path")]
    Unavailable,

    #[error("File not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to run ffprobe: {0}")]
    Launch(#[source] std::io::Error),

    #[error("ffprobe failed ({status}): {stderr}")]
    ExitStatus { status: String, stderr: String },

    #[error("Failed to parse ffprobe output: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Probe cancelled")]
    Cancelled,
}

impl ProbeError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
