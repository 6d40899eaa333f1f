//! Physical transfer primitive.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use super::strategy::TransferMode;
use crate::error::{Error, Result, ResultExt};

/// Executes placements and reversible deletes.
#[async_trait]
pub trait TransferExecutor: Send + Sync {
    /// Place `source` at `destination` using `mode`, returning the mode
    /// actually achieved (a hardlink request may end as a copy).
    async fn transfer_file(
        &self,
        source: &Path,
        destination: &Path,
        mode: TransferMode,
        overwrite: bool,
    ) -> Result<TransferMode>;

    /// Reversibly delete `path`. Returns false when that isn't possible so
    /// the caller can fall back to a permanent delete.
    async fn delete_file(&self, path: &Path) -> bool;
}

/// Local filesystem executor backed by `tokio::fs`.
#[derive(Debug, Clone, Default)]
pub struct LocalTransferExecutor {
    recycle_bin: Option<PathBuf>,
}

impl LocalTransferExecutor {
    pub fn new(recycle_bin: Option<PathBuf>) -> Self {
        Self { recycle_bin }
    }

    async fn copy(source: &Path, destination: &Path) -> Result<()> {
        tokio::fs::copy(source, destination)
            .await
            .with_context(format!("copying to {}", destination.display()))?;
        Ok(())
    }

    /// Rename, or copy + remove when crossing devices.
    async fn rename_or_copy(source: &Path, destination: &Path) -> Result<()> {
        if tokio::fs::rename(source, destination).await.is_ok() {
            return Ok(());
        }
        Self::copy(source, destination).await?;
        tokio::fs::remove_file(source)
            .await
            .with_context(format!("removing moved source {}", source.display()))
    }

    #[cfg(unix)]
    async fn symlink(source: &Path, destination: &Path) -> std::io::Result<()> {
        tokio::fs::symlink(source, destination).await
    }

    #[cfg(windows)]
    async fn symlink(source: &Path, destination: &Path) -> std::io::Result<()> {
        tokio::fs::symlink_file(source, destination).await
    }
}

#[async_trait]
impl TransferExecutor for LocalTransferExecutor {
    async fn transfer_file(
        &self,
        source: &Path,
        destination: &Path,
        mode: TransferMode,
        overwrite: bool,
    ) -> Result<TransferMode> {
        if tokio::fs::try_exists(destination).await.unwrap_or(false) {
            if !overwrite {
                return Err(Error::AlreadyExists(destination.to_path_buf()));
            }
            tokio::fs::remove_file(destination)
                .await
                .with_context("removing file being overwritten")?;
        }

        if let Some(parent) = destination.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(format!("creating directory {}", parent.display()))?;
        }

        if mode.contains(TransferMode::HARDLINK) {
            match tokio::fs::hard_link(source, destination).await {
                Ok(()) => return Ok(TransferMode::HARDLINK),
                Err(e) if mode.contains(TransferMode::COPY) => {
                    tracing::debug!(error = %e, "Hardlink failed, falling back to copy");
                    Self::copy(source, destination).await?;
                    return Ok(TransferMode::COPY);
                }
                Err(e) => {
                    return Err(Error::Io(e).context(format!("hardlinking {}", source.display())));
                }
            }
        }

        if mode.contains(TransferMode::MOVE) {
            Self::rename_or_copy(source, destination).await?;
            return Ok(TransferMode::MOVE);
        }

        if mode.contains(TransferMode::COPY) {
            Self::copy(source, destination).await?;
            return Ok(TransferMode::COPY);
        }

        if mode.contains(TransferMode::SYMLINK) {
            Self::symlink(source, destination)
                .await
                .with_context(format!("symlinking {}", source.display()))?;
            return Ok(TransferMode::SYMLINK);
        }

        Err(Error::transfer(format!("unsupported transfer mode: {mode}")))
    }

    async fn delete_file(&self, path: &Path) -> bool {
        let Some(bin) = &self.recycle_bin else {
            return false;
        };
        let Some(name) = path.file_name() else {
            return false;
        };

        let stamp = chrono::Utc::now().format("%Y%m%d-%H%M%S").to_string();
        let folder = bin.join(stamp);
        let mut target = folder.join(name);
        let mut n = 1;
        while tokio::fs::try_exists(&target).await.unwrap_or(false) {
            target = folder.join(format!("{}.{n}", name.to_string_lossy()));
            n += 1;
        }

        if let Err(e) = tokio::fs::create_dir_all(&folder).await {
            tracing::warn!(bin = %folder.display(), error = %e, "Cannot create recycle bin folder");
            return false;
        }

        match Self::rename_or_copy(path, &target).await {
            Ok(()) => {
                tracing::info!(from = %path.display(), to = %target.display(), "Recycled file");
                true
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Recycle failed");
                false
            }
        }
    }
}
