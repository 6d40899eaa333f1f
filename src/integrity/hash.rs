//! Whole-file content digests.

use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};

const CHUNK_SIZE: usize = 1024 * 1024; // 1MB

/// Compute the SHA-256 digest of an entire file.
///
/// Reads in 1MB chunks and checks `cancel` before each one.
///
/// # Returns
///
/// SHA256 hash as a lowercase hex string (64 characters)
///
/// # Errors
///
/// [`Error::Io`] if the file cannot be read, [`Error::Cancelled`] if the
/// token fires mid-read.
pub fn compute_file_checksum(path: &Path, cancel: &CancellationToken) -> Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; CHUNK_SIZE];

    loop {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        let read = file.read(&mut buffer)?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

/// [`compute_file_checksum`] on the blocking pool.
pub async fn checksum_async(path: PathBuf, cancel: CancellationToken) -> Result<String> {
    tokio::task::spawn_blocking(move || compute_file_checksum(&path, &cancel))
        .await
        .map_err(|e| Error::Io(std::io::Error::other(e)))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_known_digest() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("hello.txt");
        std::fs::write(&path, b"hello").unwrap();

        let hash = compute_file_checksum(&path, &CancellationToken::new()).unwrap();
        assert_eq!(
            hash,
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }

    #[test]
    fn test_large_file_spanning_chunks() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("a.bin");
        let b = dir.path().join("b.bin");
        let mut data = vec![7u8; CHUNK_SIZE * 2 + 17];
        std::fs::write(&a, &data).unwrap();
        // Differ only in the middle chunk
        data[CHUNK_SIZE + 5] = 8;
        std::fs::write(&b, &data).unwrap();

        let cancel = CancellationToken::new();
        let ha = compute_file_checksum(&a, &cancel).unwrap();
        let hb = compute_file_checksum(&b, &cancel).unwrap();
        assert_eq!(ha.len(), 64);
        assert_ne!(ha, hb);
    }

    #[test]
    fn test_cancelled_before_read() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.bin");
        std::fs::write(&path, b"data").unwrap();

        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = compute_file_checksum(&path, &cancel).unwrap_err();
        assert!(err.is_cancelled());
    }

    #[tokio::test]
    async fn test_async_matches_sync() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.bin");
        std::fs::write(&path, b"same bytes").unwrap();

        let cancel = CancellationToken::new();
        let sync = compute_file_checksum(&path, &cancel).unwrap();
        let asynced = checksum_async(path, cancel).await.unwrap();
        assert_eq!(sync, asynced);
    }
}
