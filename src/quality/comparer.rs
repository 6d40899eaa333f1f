//! Quality comparison primitives used by the upgrade rules.

use std::cmp::Ordering;

use super::types::{Quality, QualityModel};

/// Compare two quality models: quality rank first, revision as tiebreaker.
pub fn compare(a: &QualityModel, b: &QualityModel) -> Ordering {
    a.quality
        .cmp(&b.quality)
        .then_with(|| a.revision.cmp(&b.revision))
}

/// Whether `candidate` strictly improves on `current`.
///
/// Anything is an upgrade over nothing.
pub fn is_upgrade(current: Option<&QualityModel>, candidate: &QualityModel) -> bool {
    match current {
        None => true,
        Some(current) => compare(candidate, current) == Ordering::Greater,
    }
}

/// Like [`is_upgrade`], but nothing is an upgrade once `current` has already
/// reached `cutoff`.
pub fn is_upgrade_with_cutoff(
    current: Option<&QualityModel>,
    candidate: &QualityModel,
    cutoff: Quality,
) -> bool {
    if let Some(current) = current
        && current.quality >= cutoff
    {
        return false;
    }
    is_upgrade(current, candidate)
}

/// The higher-ranked of two models; ties favor `a`.
pub fn better_quality<'a>(a: &'a QualityModel, b: &'a QualityModel) -> &'a QualityModel {
    if compare(b, a) == Ordering::Greater { b } else { a }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quality::types::{DetectionSource, Revision};

    fn model(quality: Quality) -> QualityModel {
        QualityModel::new(quality, Revision::default(), DetectionSource::Name)
    }

    #[test]
    fn test_upgrade_over_nothing() {
        assert!(is_upgrade(None, &model(Quality::MusicMp3_128)));
        assert!(is_upgrade(None, &QualityModel::unknown()));
    }

    #[test]
    fn test_higher_rank_is_upgrade() {
        let mp3 = model(Quality::MusicMp3_320);
        let flac = model(Quality::MusicFlac16_44);
        assert!(is_upgrade(Some(&mp3), &flac));
        assert!(!is_upgrade(Some(&flac), &mp3));
    }

    #[test]
    fn test_equal_quality_is_not_upgrade() {
        let flac = model(Quality::MusicFlac24_96);
        assert!(!is_upgrade(Some(&flac), &flac));
    }

    #[test]
    fn test_revision_breaks_ties() {
        let original = model(Quality::EbookEpub);
        let proper = QualityModel::new(
            Quality::EbookEpub,
            Revision::new(2, 0),
            DetectionSource::Name,
        );
        assert!(is_upgrade(Some(&original), &proper));
        assert!(!is_upgrade(Some(&proper), &original));
    }

    #[test]
    fn test_cutoff_blocks_upgrades() {
        let current = model(Quality::MusicFlac16_44);
        let candidate = model(Quality::MusicFlac24_192);
        assert!(!is_upgrade_with_cutoff(
            Some(&current),
            &candidate,
            Quality::MusicFlac16_44
        ));
        assert!(is_upgrade_with_cutoff(
            Some(&current),
            &candidate,
            Quality::MusicFlac24_96
        ));
        assert!(is_upgrade_with_cutoff(None, &candidate, Quality::Unknown));
    }

    #[test]
    fn test_better_quality_tie_favors_first() {
        let a = QualityModel::new(Quality::MovieWeb1080p, Revision::default(), DetectionSource::Name);
        let b = QualityModel::new(
            Quality::MovieWeb1080p,
            Revision::default(),
            DetectionSource::Extension,
        );
        assert_eq!(better_quality(&a, &b).source, DetectionSource::Name);
        assert_eq!(better_quality(&b, &a).source, DetectionSource::Extension);
    }
}
