//! Upgrade rule: only replace a library file with something strictly better.

use async_trait::async_trait;

use crate::decision::specification::{EvaluationContext, ImportSpecification};
use crate::decision::types::{ImportRejection, RejectionReason};
use crate::import::CandidateFile;
use crate::quality::{Quality, is_upgrade, is_upgrade_with_cutoff};

/// Compares the candidate against the library's current file for the same
/// media item.
///
/// No current file approves. A current file of unknown quality also
/// approves, whatever the candidate's own quality: unclassified library
/// data is never allowed to block a replacement.
#[derive(Debug, Clone, Copy, Default)]
pub struct UpgradeSpecification {
    cutoff: Option<Quality>,
}

impl UpgradeSpecification {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop upgrading once the library file reaches `cutoff`.
    pub fn with_cutoff(cutoff: Quality) -> Self {
        Self {
            cutoff: Some(cutoff),
        }
    }
}

#[async_trait]
impl ImportSpecification for UpgradeSpecification {
    fn name(&self) -> &'static str {
        "upgrade"
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

        let existing = match ctx.catalog.find_existing_file_for_media_item(item_id).await {
            Ok(Some(existing)) => existing,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(item = item_id, error = %e, "Catalog lookup failed");
                return Some(ImportRejection::new(
                    RejectionReason::Error,
                    format!("catalog lookup failed: {e}"),
                ));
            }
        };

        if existing.quality.is_unknown() {
            tracing::debug!(
                item = item_id,
                path = %existing.path.display(),
                "Existing file has unknown quality, accepting candidate"
            );
            return None;
        }

        let upgrade = match self.cutoff {
            Some(cutoff) => {
                is_upgrade_with_cutoff(Some(&existing.quality), &candidate.quality, cutoff)
            }
            None => is_upgrade(Some(&existing.quality), &candidate.quality),
        };
        if upgrade {
            return None;
        }

        Some(ImportRejection::new(
            RejectionReason::NotQualityUpgrade,
            format!(
                "{} is not an upgrade over existing {}",
                candidate.quality, existing.quality
            ),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::mocks::MemoryCatalog;
    use crate::quality::{DetectionSource, QualityModel, Revision};
    use crate::test_utils::{mock_candidate, mock_file_record};
    use std::sync::Arc;
    use tokio_util::sync::CancellationToken;

    const ITEM: &str = "music:artist/album/01-song";

    fn ctx(catalog: MemoryCatalog) -> EvaluationContext {
        EvaluationContext::new(Arc::new(catalog), CancellationToken::new())
    }

    fn existing(quality: Quality, revision: Revision) -> MemoryCatalog {
        let mut record = mock_file_record(ITEM, "/library/song.flac");
        record.quality = QualityModel::new(quality, revision, DetectionSource::Name);
        MemoryCatalog::with_record(record)
    }

    fn candidate(quality: Quality, revision: Revision) -> CandidateFile {
        let mut c = mock_candidate("/dl/song.flac", quality);
        c.quality.revision = revision;
        c.media_item_id = Some(ITEM.to_string());
        c
    }

    #[tokio::test]
    async fn test_no_existing_file_approves() {
        let result = UpgradeSpecification::new()
            .evaluate(
                &candidate(Quality::MusicMp3_128, Revision::default()),
                &ctx(MemoryCatalog::default()),
            )
            .await;
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_higher_quality_approves() {
        let result = UpgradeSpecification::new()
            .evaluate(
                &candidate(Quality::MusicFlac24_96, Revision::default()),
                &ctx(existing(Quality::MusicFlac16_44, Revision::default())),
            )
            .await;
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_equal_quality_rejects() {
        let result = UpgradeSpecification::new()
            .evaluate(
                &candidate(Quality::MusicFlac16_44, Revision::default()),
                &ctx(existing(Quality::MusicFlac16_44, Revision::default())),
            )
            .await
            .unwrap();
        assert_eq!(result.reason(), RejectionReason::NotQualityUpgrade);
    }

    #[tokio::test]
    async fn test_revision_breaks_tie() {
        let result = UpgradeSpecification::new()
            .evaluate(
                &candidate(Quality::MusicFlac16_44, Revision::new(2, 0)),
                &ctx(existing(Quality::MusicFlac16_44, Revision::default())),
            )
            .await;
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_lower_quality_with_higher_revision_rejects() {
        let result = UpgradeSpecification::new()
            .evaluate(
                &candidate(Quality::MusicMp3_320, Revision::new(3, 1)),
                &ctx(existing(Quality::MusicFlac16_44, Revision::default())),
            )
            .await;
        assert!(result.is_some());
    }

    #[tokio::test]
    async fn test_unknown_existing_always_approves() {
        let result = UpgradeSpecification::new()
            .evaluate(
                &candidate(Quality::Unknown, Revision::default()),
                &ctx(existing(Quality::Unknown, Revision::default())),
            )
            .await;
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_cutoff_blocks_further_upgrades() {
        let spec = UpgradeSpecification::with_cutoff(Quality::MusicFlac16_44);
        let result = spec
            .evaluate(
                &candidate(Quality::MusicFlac24_192, Revision::default()),
                &ctx(existing(Quality::MusicFlac16_48, Revision::default())),
            )
            .await;
        assert!(result.is_some());

        let result = spec
            .evaluate(
                &candidate(Quality::MusicFlac16_44, Revision::default()),
                &ctx(existing(Quality::MusicMp3_320, Revision::default())),
            )
            .await;
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_catalog_error_rejects_with_error() {
        let result = UpgradeSpecification::new()
            .evaluate(
                &candidate(Quality::MusicFlac16_44, Revision::default()),
                &ctx(MemoryCatalog::failing()),
            )
            .await
            .unwrap();
        assert_eq!(result.reason(), RejectionReason::Error);
    }
}
