//! Test utilities and fixtures.
//!
//! Common helpers for building candidates, catalog records and on-disk
//! fixtures, to reduce boilerplate in tests.
//!
//! # Example
//!
//! ```ignore
//! use media_intake::test_utils::{temp_catalog, mock_file_record};
//!
//! #[tokio::test]
//! async fn test_something() {
//!     let (catalog, _dir) = temp_catalog().await;
//!     catalog.insert_record(mock_file_record("ebook:a/b", "/books/b.epub")).await.unwrap();
//!     // ... test logic
//! }
//! ```

use chrono::Utc;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::catalog::{FileRecord, SqliteCatalog, db_url};
use crate::import::CandidateFile;
use crate::quality::{DetectionSource, MediaFamily, Quality, QualityModel, Revision};

/// Creates a temporary catalog database for testing.
///
/// The database lives in a temporary directory that is removed when the
/// returned `TempDir` is dropped. Migrations are run automatically.
///
/// ```ignore
/// let (catalog, _dir) = temp_catalog().await;
/// // Database is deleted when _dir goes out of scope
/// ```
pub async fn temp_catalog() -> (SqliteCatalog, TempDir) {
    let dir = tempfile::tempdir().expect("Failed to create temp directory");
    let db_path = dir.path().join("test.db");

    let catalog = SqliteCatalog::open(&db_url(Some(&db_path)))
        .await
        .expect("Failed to initialize test catalog");

    (catalog, dir)
}

/// Creates a catalog record for a FLAC file with sensible defaults.
///
/// Customize using struct update syntax:
///
/// ```ignore
/// let record = FileRecord {
///     checksum: None,
///     ..mock_file_record("music:a/b/01-c", "/library/c.flac")
/// };
/// ```
pub fn mock_file_record(media_item_id: &str, path: &str) -> FileRecord {
    FileRecord {
        id: None,
        media_item_id: media_item_id.to_string(),
        family: media_item_id
            .split_once(':')
            .and_then(|(family, _)| family_named(family))
            .unwrap_or(MediaFamily::Music),
        path: PathBuf::from(path),
        original_path: None,
        size: 1024,
        quality: QualityModel::new(Quality::MusicFlac16_44, Revision::default(), DetectionSource::Name),
        checksum: Some("0".repeat(64)),
        date_added: Utc::now(),
    }
}

fn family_named(name: &str) -> Option<MediaFamily> {
    [
        MediaFamily::Music,
        MediaFamily::Audiobook,
        MediaFamily::Ebook,
        MediaFamily::Movie,
    ]
    .into_iter()
    .find(|f| f.as_str() == name)
}

/// Creates a candidate at `path` with a fixed name-detected quality.
///
/// The family follows the quality's ladder (music for `Unknown`); tags and
/// media item are derived from the file name.
pub fn mock_candidate(path: impl Into<PathBuf>, quality: Quality) -> CandidateFile {
    let family = quality.family().unwrap_or(MediaFamily::Music);
    let mut candidate = CandidateFile::new(path, family);
    candidate.quality = QualityModel::new(quality, Revision::default(), DetectionSource::Name);
    candidate
}

/// Writes a PCM WAV file of silence.
pub fn write_silent_wav(
    path: &Path,
    sample_rate: u32,
    bits_per_sample: u16,
    channels: u16,
    frames: u32,
) -> std::io::Result<()> {
    let block_align = channels * (bits_per_sample / 8);
    let byte_rate = sample_rate * u32::from(block_align);
    let data_len = frames * u32::from(block_align);

    let mut out = Vec::with_capacity(44 + data_len as usize);
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(36 + data_len).to_le_bytes());
    out.extend_from_slice(b"WAVE");
    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes()); // PCM
    out.extend_from_slice(&channels.to_le_bytes());
    out.extend_from_slice(&sample_rate.to_le_bytes());
    out.extend_from_slice(&byte_rate.to_le_bytes());
    out.extend_from_slice(&block_align.to_le_bytes());
    out.extend_from_slice(&bits_per_sample.to_le_bytes());
    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_len.to_le_bytes());
    out.resize(44 + data_len as usize, 0);

    std::fs::File::create(path)?.write_all(&out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;

    #[tokio::test]
    async fn test_temp_catalog_creates_working_database() {
        let (catalog, _dir) = temp_catalog().await;
        assert!(catalog.list_records().await.unwrap().is_empty());

        catalog
            .insert_record(mock_file_record("music:a/b/01-c", "/library/c.flac"))
            .await
            .unwrap();
        assert_eq!(catalog.list_records().await.unwrap().len(), 1);
    }

    #[test]
    fn test_mock_file_record_family_from_item() {
        assert_eq!(
            mock_file_record("movie:film (2001)", "/m/f.mkv").family,
            MediaFamily::Movie
        );
        assert_eq!(mock_file_record("odd", "/x").family, MediaFamily::Music);
    }

    #[test]
    fn test_mock_candidate_family_follows_quality() {
        let candidate = mock_candidate("/dl/book.epub", Quality::EbookEpub);
        assert_eq!(candidate.family, MediaFamily::Ebook);
        assert_eq!(candidate.quality.source, DetectionSource::Name);
    }

    #[test]
    fn test_silent_wav_size() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("s.wav");
        write_silent_wav(&path, 44_100, 16, 2, 100).unwrap();
        assert_eq!(std::fs::metadata(&path).unwrap().len(), 44 + 400);
    }
}
