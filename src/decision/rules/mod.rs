//! Built-in import rules.

mod upgrade;

use async_trait::async_trait;
use std::path::Component;

use super::specification::{EvaluationContext, ImportSpecification};
use super::types::{ImportRejection, RejectionReason};
use crate::import::CandidateFile;

pub use upgrade::UpgradeSpecification;

/// Rejects candidates the classifier could not place on a ladder.
#[derive(Debug, Clone, Copy, Default)]
pub struct MinimumQualitySpecification;

#[async_trait]
impl ImportSpecification for MinimumQualitySpecification {
    fn name(&self) -> &'static str {
        "minimum_quality"
    }

    async fn evaluate(
        &self,
        candidate: &CandidateFile,
        _ctx: &EvaluationContext,
    ) -> Option<ImportRejection> {
        candidate.quality.is_unknown().then(|| {
            ImportRejection::new(
                RejectionReason::MinimumQuality,
                format!("unable to determine quality of {}", candidate.file_name()),
            )
        })
    }
}

/// Rejects files that cannot currently be opened for reading.
///
/// Missing files are left to [`ValidPathSpecification`].
#[derive(Debug, Clone, Copy, Default)]
pub struct FileLockSpecification;

#[async_trait]
impl ImportSpecification for FileLockSpecification {
    fn name(&self) -> &'static str {
        "file_lock"
    }

    async fn evaluate(
        &self,
        candidate: &CandidateFile,
        _ctx: &EvaluationContext,
    ) -> Option<ImportRejection> {
        match tokio::fs::File::open(&candidate.path).await {
            Ok(_) => None,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => Some(ImportRejection::new(
                RejectionReason::FileLocked,
                format!("cannot open {}: {e}", candidate.path.display()),
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ValidPathSpecification;

#[async_trait]
impl ImportSpecification for ValidPathSpecification {
    fn name(&self) -> &'static str {
        "valid_path"
    }

    async fn evaluate(
        &self,
        candidate: &CandidateFile,
        _ctx: &EvaluationContext,
    ) -> Option<ImportRejection> {
        let path = &candidate.path;
        let reject = |why: &str| {
            Some(ImportRejection::new(
                RejectionReason::InvalidFilePath,
                format!("{}: {why}", path.display()),
            ))
        };

        let Some(text) = path.to_str() else {
            return reject("path is not valid UTF-8");
        };
        if text.contains('\0') {
            return reject("path contains a NUL byte");
        }
        if !path.is_absolute() {
            return reject("path is not absolute");
        }
        if path.components().any(|c| c == Component::ParentDir) {
            return reject("path contains '..'");
        }
        match tokio::fs::metadata(path).await {
            Ok(meta) if meta.is_file() => None,
            Ok(_) => reject("not a regular file"),
            Err(_) => reject("file does not exist"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SupportedExtensionSpecification;

#[async_trait]
impl ImportSpecification for SupportedExtensionSpecification {
    fn name(&self) -> &'static str {
        "supported_extension"
    }

    async fn evaluate(
        &self,
        candidate: &CandidateFile,
        _ctx: &EvaluationContext,
    ) -> Option<ImportRejection> {
        if candidate.family.is_supported_path(&candidate.path) {
            return None;
        }
        Some(ImportRejection::new(
            RejectionReason::UnsupportedExtension,
            format!(
                "'{}' is not a supported {} extension",
                candidate.extension().unwrap_or_default(),
                candidate.family
            ),
        ))
    }
}

/// Rejects candidates with neither a media item nor a title.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParsedItemSpecification;

#[async_trait]
impl ImportSpecification for ParsedItemSpecification {
    fn name(&self) -> &'static str {
        "parsed_item"
    }

    async fn evaluate(
        &self,
        candidate: &CandidateFile,
        _ctx: &EvaluationContext,
    ) -> Option<ImportRejection> {
        if candidate.media_item_id.is_some() || candidate.tags.title().is_some() {
            return None;
        }
        Some(ImportRejection::new(
            RejectionReason::UnableToParse,
            format!("no title found for {}", candidate.file_name()),
        ))
    }
}

/// Rejects a file the catalog already holds for this item, either at its
/// library path or as the file it was imported from.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlreadyImportedSpecification;

#[async_trait]
impl ImportSpecification for AlreadyImportedSpecification {
    fn name(&self) -> &'static str {
        "already_imported"
    }

    async fn evaluate(
        &self,
        candidate: &CandidateFile,
        ctx: &EvaluationContext,
    ) -> Option<ImportRejection> {
        let item_id = candidate.media_item_id.as_deref()?;
        if ctx.cancel.is_cancelled() {
            return Some(ImportRejection::new(
                RejectionReason::Error,
                "cancelled before catalog lookup",
            ));
        }

        match ctx.catalog.find_existing_file_for_media_item(item_id).await {
            Ok(Some(existing)) if existing.refers_to(&candidate.path) => {
                Some(ImportRejection::new(
                    RejectionReason::AlreadyImported,
                    format!("{} is already in the library", candidate.path.display()),
                ))
            }
            Ok(_) => None,
            Err(e) => {
                tracing::warn!(item = item_id, error = %e, "Catalog lookup failed");
                Some(ImportRejection::new(
                    RejectionReason::Error,
                    format!("catalog lookup failed: {e}"),
                ))
            }
        }
    }
}

/// Rejects audio and video files that carry no audio.
///
/// Files with no probe data and no readable properties pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAudioTrackSpecification;

#[async_trait]
impl ImportSpecification for NoAudioTrackSpecification {
    fn name(&self) -> &'static str {
        "no_audio_track"
    }

    async fn evaluate(
        &self,
        candidate: &CandidateFile,
        _ctx: &EvaluationContext,
    ) -> Option<ImportRejection> {
        if !candidate.family.expects_audio() || candidate.audio_track_count() != Some(0) {
            return None;
        }
        Some(ImportRejection::new(
            RejectionReason::NoAudioTrack,
            format!("{} has no audio track", candidate.file_name()),
        ))
    }
}
