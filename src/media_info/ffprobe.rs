//! Technical probing through the `ffprobe` command-line tool.
//!
//! Install ffprobe (part of FFmpeg):
//! - Windows: `winget install Gyan.FFmpeg`
//! - macOS: `brew install ffmpeg`
//! - Linux: `apt install ffmpeg` or equivalent

use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;
use tokio_util::sync::CancellationToken;

use super::ProbeError;
use super::dto::FfprobeOutput;
use super::hdr::is_pq;
use super::model::{MediaInfoModel, build_media_info, primary_audio_stream, primary_video_stream};
use crate::config::ProbeConfig;

#[cfg(windows)]
const FFPROBE_PATHS: &[&str] = &[
    "ffprobe", // In PATH
    r"C:\Program Files\ffmpeg\bin\ffprobe.exe",
    r"C:\ffmpeg\bin\ffprobe.exe",
];

#[cfg(not(windows))]
const FFPROBE_PATHS: &[&str] = &[
    "ffprobe", // In PATH
    "/usr/bin/ffprobe",
    "/usr/local/bin/ffprobe",
    "/opt/homebrew/bin/ffprobe",
];

/// Anything that can produce a [`MediaInfoModel`] for a file.
#[async_trait]
pub trait MediaProbe: Send + Sync {
    async fn probe(
        &self,
        path: &Path,
        cancel: &CancellationToken,
    ) -> Result<MediaInfoModel, ProbeError>;
}

fn responds_to_version(program: &Path) -> bool {
    Command::new(program)
        .arg("-version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// A located ffprobe executable plus its analysis budgets.
#[derive(Debug, Clone)]
pub struct Ffprobe {
    program: PathBuf,
    settings: ProbeConfig,
}

impl Ffprobe {
    /// Find ffprobe: the configured path, else well-known locations and PATH.
    pub fn locate(settings: &ProbeConfig) -> Result<Self, ProbeError> {
        let program = match &settings.ffprobe_path {
            Some(explicit) => responds_to_version(explicit).then(|| explicit.clone()),
            None => FFPROBE_PATHS
                .iter()
                .map(PathBuf::from)
                .find(|p| responds_to_version(p)),
        }
        .ok_or(ProbeError::Unavailable)?;

        tracing::debug!(program = %program.display(), "Located ffprobe");
        Ok(Self::with_program(program, settings.clone()))
    }

    pub fn with_program(program: PathBuf, settings: ProbeConfig) -> Self {
        Self { program, settings }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// ffprobe version line (for diagnostics)
    pub fn version(&self) -> Option<String> {
        Command::new(&self.program)
            .arg("-version")
            .output()
            .ok()
            .filter(|o| o.status.success())
            .and_then(|o| {
                String::from_utf8_lossy(&o.stdout)
                    .lines()
                    .next()
                    .map(|l| l.trim().to_string())
            })
    }

    async fn probe_streams(
        &self,
        path: &Path,
        probe_size: u64,
        analyze_duration: u64,
        cancel: &CancellationToken,
    ) -> Result<FfprobeOutput, ProbeError> {
        let args: Vec<OsString> = vec![
            "-v".into(),
            "error".into(),
            "-print_format".into(),
            "json".into(),
            "-show_format".into(),
            "-show_streams".into(),
            "-probesize".into(),
            probe_size.to_string().into(),
            "-analyzeduration".into(),
            analyze_duration.to_string().into(),
            path.into(),
        ];
        let stdout = self.run(args, cancel).await?;
        Ok(serde_json::from_slice(&stdout)?)
    }

    async fn probe_first_frame(
        &self,
        path: &Path,
        video_ordinal: usize,
        cancel: &CancellationToken,
    ) -> Result<FfprobeOutput, ProbeError> {
        let args: Vec<OsString> = vec![
            "-v".into(),
            "error".into(),
            "-print_format".into(),
            "json".into(),
            "-select_streams".into(),
            format!("v:{video_ordinal}").into(),
            "-read_intervals".into(),
            "%+#1".into(),
            "-show_frames".into(),
            path.into(),
        ];
        let stdout = self.run(args, cancel).await?;
        Ok(serde_json::from_slice(&stdout)?)
    }

    async fn run(
        &self,
        args: Vec<OsString>,
        cancel: &CancellationToken,
    ) -> Result<Vec<u8>, ProbeError> {
        let child = tokio::process::Command::new(&self.program)
            .args(&args)
            .kill_on_drop(true)
            .output();

        let output = tokio::select! {
            _ = cancel.cancelled() => return Err(ProbeError::Cancelled),
            output = child => output.map_err(ProbeError::Launch)?,
        };

        if !output.status.success() {
            return Err(ProbeError::ExitStatus {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(output.stdout)
    }
}

#[async_trait]
impl MediaProbe for Ffprobe {
    async fn probe(
        &self,
        path: &Path,
        cancel: &CancellationToken,
    ) -> Result<MediaInfoModel, ProbeError> {
        if cancel.is_cancelled() {
            return Err(ProbeError::Cancelled);
        }
        if !path.exists() {
            return Err(ProbeError::NotFound(path.to_path_buf()));
        }

        let mut output = self
            .probe_streams(
                path,
                self.settings.probe_size,
                self.settings.analyze_duration,
                cancel,
            )
            .await?;

        // Some containers only resolve the channel layout with a deeper scan
        if primary_audio_stream(&output).is_some_and(|a| a.channel_layout.is_none()) {
            tracing::debug!(path = %path.display(), "Channel layout unresolved, re-probing with extended budget");
            output = self
                .probe_streams(
                    path,
                    self.settings.extended_probe_size,
                    self.settings.extended_analyze_duration,
                    cancel,
                )
                .await?;
        }

        let mut frame_side_data = Vec::new();
        if let Some((ordinal, video)) = primary_video_stream(&output)
            && is_pq(video.color_transfer.as_deref())
        {
            // The frame pass only refines HDR; stream-level side data still
            // classifies when it fails.
            match self.probe_first_frame(path, ordinal, cancel).await {
                Ok(frames) => {
                    frame_side_data = frames
                        .frames
                        .into_iter()
                        .flat_map(|f| f.side_data_list)
                        .collect();
                }
                Err(e) if e.is_cancelled() => return Err(e),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "First-frame probe failed, using stream side data");
                }
            }
        }

        Ok(build_media_info(&output, &frame_side_data))
    }
}
