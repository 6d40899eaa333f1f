//! Post-transfer integrity verification.

use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;

use super::hash::checksum_async;
use crate::error::{Error, Result};

/// Size and (optionally) digest of a file captured before it was moved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSnapshot {
    pub path: PathBuf,
    pub size: u64,
    pub checksum: Option<String>,
}

/// Outcome of a verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verification {
    pub verified: bool,
    /// Lowercase hex SHA-256 of the verified content, when computed
    pub checksum: Option<String>,
}

impl Verification {
    const FAILED: Self = Self {
        verified: false,
        checksum: None,
    };
}

/// Compares a transferred file against its origin. Never deletes anything;
/// rollback is the caller's job.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntegrityVerifier;

impl IntegrityVerifier {
    pub fn new() -> Self {
        Self
    }

    /// Verify `destination` against `source`: size first, then (when
    /// requested) full SHA-256 digests computed concurrently.
    ///
    /// A missing file on either side is a failed verification, not an
    /// error. Only cancellation is returned as `Err`.
    pub async fn verify(
        &self,
        source: &Path,
        destination: &Path,
        checksum: bool,
        cancel: &CancellationToken,
    ) -> Result<bool> {
        self.verify_transfer(source, destination, checksum, cancel)
            .await
            .map(|v| v.verified)
    }

    /// Like [`verify`](Self::verify), also returning the digest that was
    /// matched so callers can record it.
    pub async fn verify_transfer(
        &self,
        source: &Path,
        destination: &Path,
        checksum: bool,
        cancel: &CancellationToken,
    ) -> Result<Verification> {
        let (Some(source_size), Some(dest_size)) =
            (file_size(source).await, file_size(destination).await)
        else {
            tracing::warn!(
                source = %source.display(),
                destination = %destination.display(),
                "Cannot verify: file missing"
            );
            return Ok(Verification::FAILED);
        };

        if source_size != dest_size {
            tracing::warn!(
                destination = %destination.display(),
                expected = source_size,
                actual = dest_size,
                "Size mismatch after transfer"
            );
            return Ok(Verification::FAILED);
        }

        if !checksum {
            return Ok(Verification {
                verified: true,
                checksum: None,
            });
        }

        let (source_hash, dest_hash) = tokio::join!(
            checksum_async(source.to_path_buf(), cancel.clone()),
            checksum_async(destination.to_path_buf(), cancel.clone()),
        );
        match (source_hash, dest_hash) {
            (Ok(a), Ok(b)) => Ok(if digests_match(destination, &a, &b) {
                Verification {
                    verified: true,
                    checksum: Some(b),
                }
            } else {
                Verification::FAILED
            }),
            (Err(e), _) | (_, Err(e)) => unreadable(destination, e).map(|_| Verification::FAILED),
        }
    }

    /// Capture what a file looks like before a move removes it.
    pub async fn snapshot(
        &self,
        path: &Path,
        checksum: bool,
        cancel: &CancellationToken,
    ) -> Result<FileSnapshot> {
        let size = file_size(path)
            .await
            .ok_or_else(|| Error::not_found(path))?;
        let checksum = if checksum {
            Some(checksum_async(path.to_path_buf(), cancel.clone()).await?)
        } else {
            None
        };
        Ok(FileSnapshot {
            path: path.to_path_buf(),
            size,
            checksum,
        })
    }

    /// Verify `destination` against a snapshot taken before transfer.
    pub async fn verify_against(
        &self,
        snapshot: &FileSnapshot,
        destination: &Path,
        cancel: &CancellationToken,
    ) -> Result<bool> {
        let Some(dest_size) = file_size(destination).await else {
            tracing::warn!(destination = %destination.display(), "Cannot verify: destination missing");
            return Ok(false);
        };

        if dest_size != snapshot.size {
            tracing::warn!(
                destination = %destination.display(),
                expected = snapshot.size,
                actual = dest_size,
                "Size mismatch after transfer"
            );
            return Ok(false);
        }

        let Some(expected) = &snapshot.checksum else {
            return Ok(true);
        };
        match checksum_async(destination.to_path_buf(), cancel.clone()).await {
            Ok(actual) => Ok(digests_match(destination, expected, &actual)),
            Err(e) => unreadable(destination, e),
        }
    }
}

async fn file_size(path: &Path) -> Option<u64> {
    tokio::fs::metadata(path)
        .await
        .ok()
        .filter(|m| m.is_file())
        .map(|m| m.len())
}

fn digests_match(destination: &Path, expected: &str, actual: &str) -> bool {
    let matched = expected == actual;
    if !matched {
        tracing::warn!(
            destination = %destination.display(),
            expected,
            actual,
            "Checksum mismatch after transfer"
        );
    }
    matched
}

fn unreadable(destination: &Path, e: Error) -> Result<bool> {
    if e.is_cancelled() {
        return Err(e);
    }
    tracing::warn!(destination = %destination.display(), error = %e, "Cannot checksum file");
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write(dir: &Path, name: &str, data: &[u8]) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, data).unwrap();
        path
    }

    #[tokio::test]
    async fn test_identical_files_verify_both_ways() {
        let dir = tempdir().unwrap();
        let a = write(dir.path(), "a.flac", b"identical content");
        let b = write(dir.path(), "b.flac", b"identical content");
        let cancel = CancellationToken::new();
        let verifier = IntegrityVerifier::new();

        assert!(verifier.verify(&a, &b, true, &cancel).await.unwrap());
        assert!(verifier.verify(&b, &a, true, &cancel).await.unwrap());
    }

    #[tokio::test]
    async fn test_verify_transfer_reports_digest() {
        let dir = tempdir().unwrap();
        let a = write(dir.path(), "a.flac", b"abc");
        let b = write(dir.path(), "b.flac", b"abc");
        let cancel = CancellationToken::new();
        let verifier = IntegrityVerifier::new();

        let checked = verifier.verify_transfer(&a, &b, true, &cancel).await.unwrap();
        assert!(checked.verified);
        assert_eq!(
            checked.checksum.as_deref(),
            Some("ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad")
        );

        let unchecked = verifier.verify_transfer(&a, &b, false, &cancel).await.unwrap();
        assert!(unchecked.verified);
        assert!(unchecked.checksum.is_none());
    }

    #[tokio::test]
    async fn test_missing_side_fails() {
        let dir = tempdir().unwrap();
        let a = write(dir.path(), "a.flac", b"data");
        let missing = dir.path().join("missing.flac");
        let cancel = CancellationToken::new();
        let verifier = IntegrityVerifier::new();

        assert!(!verifier.verify(&a, &missing, true, &cancel).await.unwrap());
        assert!(!verifier.verify(&missing, &a, false, &cancel).await.unwrap());
    }

    #[tokio::test]
    async fn test_size_mismatch_short_circuits_checksum() {
        let dir = tempdir().unwrap();
        let a = write(dir.path(), "a.flac", b"longer data");
        let b = write(dir.path(), "b.flac", b"short");
        // A cancelled token would make any checksum attempt return Err
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = IntegrityVerifier::new().verify(&a, &b, true, &cancel).await;
        assert!(!result.unwrap());
    }

    #[tokio::test]
    async fn test_same_size_different_content() {
        let dir = tempdir().unwrap();
        let a = write(dir.path(), "a.flac", b"aaaa");
        let b = write(dir.path(), "b.flac", b"aaab");
        let cancel = CancellationToken::new();
        let verifier = IntegrityVerifier::new();

        assert!(!verifier.verify(&a, &b, true, &cancel).await.unwrap());
        // Without checksums only size is compared
        assert!(verifier.verify(&a, &b, false, &cancel).await.unwrap());
    }

    #[tokio::test]
    async fn test_cancellation_propagates() {
        let dir = tempdir().unwrap();
        let a = write(dir.path(), "a.flac", b"aaaa");
        let b = write(dir.path(), "b.flac", b"aaaa");
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = IntegrityVerifier::new()
            .verify(&a, &b, true, &cancel)
            .await
            .unwrap_err();
        assert!(err.is_cancelled());
    }

    #[tokio::test]
    async fn test_snapshot_survives_move() {
        let dir = tempdir().unwrap();
        let source = write(dir.path(), "a.epub", b"book bytes");
        let cancel = CancellationToken::new();
        let verifier = IntegrityVerifier::new();

        let snapshot = verifier.snapshot(&source, true, &cancel).await.unwrap();
        let dest = dir.path().join("moved.epub");
        std::fs::rename(&source, &dest).unwrap();

        assert!(verifier.verify_against(&snapshot, &dest, &cancel).await.unwrap());

        std::fs::write(&dest, b"book bytez").unwrap();
        assert!(!verifier.verify_against(&snapshot, &dest, &cancel).await.unwrap());
    }

    #[tokio::test]
    async fn test_snapshot_of_missing_file_errors() {
        let result = IntegrityVerifier::new()
            .snapshot(Path::new("/nonexistent/a.flac"), true, &CancellationToken::new())
            .await;
        assert!(matches!(result, Err(Error::NotFound(_))));
    }
}
