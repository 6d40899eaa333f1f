//! Single-file inspection commands.

use anyhow::bail;
use std::path::Path;
use std::sync::Arc;
use tokio::runtime::Runtime;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::integrity::IntegrityVerifier;
use crate::media_info::{Ffprobe, MediaProbe};
use crate::quality::{MediaFamily, parse_quality};
use crate::transfer::{FileStrategy, ProcMountTable, StrategySelector};

/// Classify names against a family ladder
pub fn cmd_classify(names: &[String], family: MediaFamily, json: bool) -> anyhow::Result<()> {
    for name in names {
        let model = parse_quality(family, name);
        if json {
            let line = serde_json::json!({
                "name": name,
                "quality": model.quality,
                "title": model.quality.title(),
                "rank": model.quality.rank(),
                "revision": model.revision,
                "source": model.source,
            });
            println!("{line}");
        } else {
            println!("{name}");
            println!("  Quality:  {model}");
            println!("  Source:   {}", model.source.as_str());
        }
    }
    Ok(())
}

/// Probe a media file with ffprobe
pub fn cmd_probe(rt: &Runtime, config: &Config, path: &Path, json: bool) -> anyhow::Result<()> {
    let ffprobe = match Ffprobe::locate(&config.probe) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Error: {e}");
            eprintln!("Install FFmpeg:");
            eprintln!("  Windows: winget install Gyan.FFmpeg");
            eprintln!("  macOS:   brew install ffmpeg");
            eprintln!("  Linux:   apt install ffmpeg");
            return Err(e.into());
        }
    };

    let info = rt.block_on(ffprobe.probe(path, &CancellationToken::new()))?;
    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    println!("File: {}", path.display());
    println!("  Container:  {}", info.container_format);
    if info.has_video() {
        println!(
            "  Video:      {} {}x{} @ {:.3} fps, {}-bit",
            info.video_format.as_deref().unwrap_or("?"),
            info.width,
            info.height,
            info.video_fps,
            info.video_bit_depth
        );
        println!("  HDR:        {}", info.video_hdr_format);
    }
    if info.audio_stream_count > 0 {
        println!(
            "  Audio:      {} {}ch {} Hz ({} streams)",
            info.audio_format.as_deref().unwrap_or("?"),
            info.audio_channels,
            info.audio_sample_rate,
            info.audio_stream_count
        );
        if !info.audio_languages.is_empty() {
            println!("  Languages:  {}", info.audio_languages.join(", "));
        }
    }
    if !info.subtitles.is_empty() {
        println!("  Subtitles:  {}", info.subtitles.join(", "));
    }
    println!("  Run time:   {}s", info.run_time.as_secs());
    Ok(())
}

/// Show the strategy mount detection would choose
pub fn cmd_strategy(
    source: &Path,
    destination: &Path,
    prefer: Option<FileStrategy>,
) -> anyhow::Result<()> {
    let selector = StrategySelector::new(Arc::new(ProcMountTable::new()));
    let strategy = selector.select(source, destination, prefer);
    println!("{strategy} ({})", strategy.transfer_mode());
    Ok(())
}

/// Verify a transferred file against its source
pub fn cmd_verify(
    rt: &Runtime,
    source: &Path,
    destination: &Path,
    checksum: bool,
) -> anyhow::Result<()> {
    let verified = rt.block_on(IntegrityVerifier::new().verify(
        source,
        destination,
        checksum,
        &CancellationToken::new(),
    ))?;
    if !verified {
        bail!("{} does not match {}", destination.display(), source.display());
    }
    println!("OK: {} matches {}", destination.display(), source.display());
    Ok(())
}
