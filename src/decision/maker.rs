//! Runs the rule chain over candidates.

use std::sync::Arc;

use super::rules::{
    AlreadyImportedSpecification, FileLockSpecification, MinimumQualitySpecification,
    NoAudioTrackSpecification, ParsedItemSpecification, SupportedExtensionSpecification,
    UpgradeSpecification, ValidPathSpecification,
};
use super::specification::{EvaluationContext, ImportSpecification};
use super::types::ImportDecision;
use crate::error::{Error, Result};
use crate::import::CandidateFile;

/// Evaluates every registered rule for each candidate.
///
/// Rules run in registration order and all of them run: a decision lists
/// every objection, not just the first.
#[derive(Default)]
pub struct DecisionMaker {
    specifications: Vec<Arc<dyn ImportSpecification>>,
}

impl DecisionMaker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default_rules() -> Self {
        Self::new()
            .with_rule(ValidPathSpecification)
            .with_rule(SupportedExtensionSpecification)
            .with_rule(FileLockSpecification)
            .with_rule(ParsedItemSpecification)
            .with_rule(MinimumQualitySpecification)
            .with_rule(NoAudioTrackSpecification)
            .with_rule(AlreadyImportedSpecification)
            .with_rule(UpgradeSpecification::new())
    }

    pub fn with_rule(mut self, spec: impl ImportSpecification + 'static) -> Self {
        self.specifications.push(Arc::new(spec));
        self
    }

    pub fn rule_names(&self) -> Vec<&'static str> {
        self.specifications.iter().map(|s| s.name()).collect()
    }

    pub async fn evaluate(&self, candidate: CandidateFile, ctx: &EvaluationContext) -> ImportDecision {
        let mut decision = ImportDecision::new(candidate);
        for spec in &self.specifications {
            if let Some(rejection) = spec.evaluate(decision.candidate(), ctx).await {
                tracing::debug!(
                    path = %decision.candidate().path.display(),
                    rule = spec.name(),
                    reason = %rejection.reason(),
                    "Candidate rejected"
                );
                decision.add_rejection(rejection);
            }
        }

        if decision.approved() {
            tracing::debug!(
                path = %decision.candidate().path.display(),
                quality = %decision.candidate().quality,
                "Candidate approved"
            );
        } else {
            tracing::info!(
                path = %decision.candidate().path.display(),
                rejections = decision.rejections().len(),
                "Candidate rejected"
            );
        }
        decision
    }

    /// One decision per candidate, in input order. Stops early with
    /// [`Error::Cancelled`] if the token fires between candidates.
    pub async fn get_import_decisions(
        &self,
        candidates: Vec<CandidateFile>,
        ctx: &EvaluationContext,
    ) -> Result<Vec<ImportDecision>> {
        let mut decisions = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            if ctx.cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }
            decisions.push(self.evaluate(candidate, ctx).await);
        }
        Ok(decisions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::mocks::MemoryCatalog;
    use crate::decision::RejectionReason;
    use crate::quality::{DetectionSource, Quality, QualityModel, Revision};
    use crate::test_utils::{mock_candidate, mock_file_record};
    use tokio_util::sync::CancellationToken;

    fn ctx(catalog: MemoryCatalog) -> EvaluationContext {
        EvaluationContext::new(Arc::new(catalog), CancellationToken::new())
    }

    #[test]
    fn test_default_rules_registered() {
        let maker = DecisionMaker::with_default_rules();
        let names = maker.rule_names();
        assert_eq!(names.len(), 8);
        assert!(names.contains(&"upgrade"));
        assert!(names.contains(&"minimum_quality"));
    }

    #[tokio::test]
    async fn test_empty_chain_approves() {
        let decision = DecisionMaker::new()
            .evaluate(
                mock_candidate("/dl/whatever", Quality::Unknown),
                &ctx(MemoryCatalog::default()),
            )
            .await;
        assert!(decision.approved());
    }

    #[tokio::test]
    async fn test_unknown_quality_always_rejected() {
        let item = "music:artist/album/01-song";
        for existing_quality in [None, Some(Quality::Unknown), Some(Quality::MusicMp3_128)] {
            let catalog = match existing_quality {
                Some(q) => {
                    let mut record = mock_file_record(item, "/library/song.mp3");
                    record.quality = QualityModel::new(q, Revision::default(), DetectionSource::Name);
                    MemoryCatalog::with_record(record)
                }
                None => MemoryCatalog::default(),
            };

            let mut candidate = mock_candidate("/dl/song.xyz", Quality::Unknown);
            candidate.media_item_id = Some(item.to_string());

            let decision = DecisionMaker::new()
                .with_rule(MinimumQualitySpecification)
                .with_rule(UpgradeSpecification::new())
                .evaluate(candidate, &ctx(catalog))
                .await;

            assert!(!decision.approved());
            assert!(decision.has_reason(RejectionReason::MinimumQuality));
        }
    }

    #[tokio::test]
    async fn test_collects_every_rejection() {
        let mut candidate = mock_candidate("relative/song.xyz", Quality::Unknown);
        candidate.media_item_id = None;
        candidate.tags = crate::import::MediaTags::empty(candidate.family);

        let decision = DecisionMaker::with_default_rules()
            .evaluate(candidate, &ctx(MemoryCatalog::default()))
            .await;

        for reason in [
            RejectionReason::InvalidFilePath,
            RejectionReason::UnsupportedExtension,
            RejectionReason::UnableToParse,
            RejectionReason::MinimumQuality,
        ] {
            assert!(decision.has_reason(reason), "missing {reason:?}");
        }
    }

    #[tokio::test]
    async fn test_decisions_stop_on_cancel() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let ctx = EvaluationContext::new(Arc::new(MemoryCatalog::default()), cancel);

        let result = DecisionMaker::with_default_rules()
            .get_import_decisions(vec![mock_candidate("/dl/a.flac", Quality::MusicFlac16_44)], &ctx)
            .await;
        assert!(matches!(result, Err(Error::Cancelled)));
    }

    #[tokio::test]
    async fn test_one_decision_per_candidate() {
        let candidates = vec![
            mock_candidate("/dl/a.flac", Quality::MusicFlac16_44),
            mock_candidate("/dl/b.xyz", Quality::Unknown),
        ];
        let decisions = DecisionMaker::new()
            .with_rule(MinimumQualitySpecification)
            .get_import_decisions(candidates, &ctx(MemoryCatalog::default()))
            .await
            .unwrap();

        assert_eq!(decisions.len(), 2);
        assert!(decisions[0].approved());
        assert!(!decisions[1].approved());
    }
}
