//! Import orchestrator.
//!
//! Per approved file:
//!
//! ```text
//! pre-check -> select strategy -> [snapshot] -> transfer -> verify -> record
//!                                                  \          \         \
//!                                                   +----------+---------+--> cleanup
//! ```
//!
//! Cleanup restores a moved file to its source when it can; otherwise it
//! deletes the destination (recycle first, then permanently). After any
//! failed result the destination does not exist, unless it held the file
//! being upgraded in place: that file waits at `<name>.intake-old` during
//! the import and is put back on failure.

use chrono::Utc;
use futures::StreamExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use super::candidate::CandidateFile;
use super::naming::destination_for;
use super::result::{ImportOutcome, ImportResult};
use crate::catalog::{Catalog, FileRecord};
use crate::config::{ImportConfig, NamingConfig};
use crate::decision::ImportDecision;
use crate::error::{Error, Result};
use crate::integrity::{FileSnapshot, IntegrityVerifier};
use crate::transfer::{FileStrategy, StrategySelector, TransferExecutor, TransferMode};

pub struct ImportService {
    selector: StrategySelector,
    executor: Arc<dyn TransferExecutor>,
    catalog: Arc<dyn Catalog>,
    verifier: IntegrityVerifier,
    verify_checksum: bool,
    max_parallel: usize,
    naming: NamingConfig,
}

impl ImportService {
    pub fn new(
        selector: StrategySelector,
        executor: Arc<dyn TransferExecutor>,
        catalog: Arc<dyn Catalog>,
    ) -> Self {
        Self {
            selector,
            executor,
            catalog,
            verifier: IntegrityVerifier::new(),
            verify_checksum: true,
            max_parallel: 1,
            naming: NamingConfig::default(),
        }
    }

    /// Apply checksum, parallelism and naming settings.
    pub fn with_config(mut self, config: &ImportConfig) -> Self {
        self.verify_checksum = config.verify_checksum;
        self.max_parallel = config.max_parallel.max(1);
        self.naming = config.naming.clone();
        self
    }

    pub fn with_checksum(mut self, verify_checksum: bool) -> Self {
        self.verify_checksum = verify_checksum;
        self
    }

    pub fn with_max_parallel(mut self, max_parallel: usize) -> Self {
        self.max_parallel = max_parallel.max(1);
        self
    }

    pub fn selector(&self) -> &StrategySelector {
        &self.selector
    }

    /// Where a candidate would land under `library_root`.
    pub fn destination_for(&self, candidate: &CandidateFile, library_root: &Path) -> PathBuf {
        destination_for(
            candidate,
            self.naming.pattern_for(candidate.family),
            library_root,
        )
    }

    /// Import one approved decision to `destination`.
    pub async fn import_file(
        &self,
        decision: &ImportDecision,
        destination: &Path,
        preferred: Option<FileStrategy>,
        cancel: &CancellationToken,
    ) -> ImportResult {
        let candidate = decision.candidate();
        let source = candidate.path.as_path();

        if !decision.approved() {
            return ImportResult::failure(destination, None, "decision was rejected");
        }
        if cancel.is_cancelled() {
            return ImportResult::failure(destination, None, "import cancelled");
        }
        if !tokio::fs::try_exists(source).await.unwrap_or(false) {
            tracing::warn!(source = %source.display(), "Source file missing");
            return ImportResult::failure(
                destination,
                None,
                format!("source file not found: {}", source.display()),
            );
        }

        let existing = match &candidate.media_item_id {
            Some(item_id) => match self.catalog.find_existing_file_for_media_item(item_id).await {
                Ok(existing) => existing,
                Err(e) => {
                    return ImportResult::failure(
                        destination,
                        None,
                        format!("catalog lookup failed: {e}"),
                    );
                }
            },
            None => None,
        };

        let replacing_in_place = existing.as_ref().is_some_and(|e| e.path == destination);
        if !replacing_in_place && path_occupied(destination).await {
            tracing::warn!(destination = %destination.display(), "Destination already exists");
            return ImportResult::failure(
                destination,
                None,
                format!("destination already exists: {}", destination.display()),
            );
        }

        let strategy = self.selector.select(source, destination, preferred);
        tracing::info!(
            source = %source.display(),
            destination = %destination.display(),
            strategy = %strategy,
            quality = %candidate.quality,
            "Importing file"
        );

        let snapshot = if strategy == FileStrategy::Move {
            match self
                .verifier
                .snapshot(source, self.verify_checksum, cancel)
                .await
            {
                Ok(snapshot) => Some(snapshot),
                Err(e) => {
                    return ImportResult::failure(
                        destination,
                        Some(strategy),
                        format!("cannot read source before move: {e}"),
                    );
                }
            }
        } else {
            None
        };

        // An in-place upgrade keeps the old file beside the destination
        // until the new one is verified and recorded.
        let backup = if replacing_in_place && path_occupied(destination).await {
            match set_aside(destination).await {
                Ok(backup) => Some(backup),
                Err(e) => {
                    tracing::warn!(path = %destination.display(), error = %e, "Cannot set aside file being upgraded");
                    return ImportResult::failure(
                        destination,
                        Some(strategy),
                        format!("cannot set aside file being upgraded: {e}"),
                    );
                }
            }
        } else {
            None
        };

        let placed = self
            .place(
                candidate,
                destination,
                strategy,
                snapshot.as_ref(),
                existing.as_ref(),
                cancel,
            )
            .await;

        let actual_mode = match placed {
            Ok(mode) => mode,
            Err(e) => {
                if let Some(backup) = &backup {
                    put_back(backup, destination).await;
                }
                let message = if e.is_cancelled() {
                    "import cancelled".to_string()
                } else {
                    e.to_string()
                };
                return ImportResult::failure(destination, Some(strategy), message);
            }
        };

        if let Some(backup) = &backup {
            self.discard(backup).await;
        }
        if let Some(old) = existing.filter(|e| e.path != destination)
            && path_occupied(&old.path).await
            && !self.executor.delete_file(&old.path).await
        {
            tracing::warn!(path = %old.path.display(), "Could not recycle replaced file");
        }

        tracing::info!(
            destination = %destination.display(),
            mode = %actual_mode,
            "Import complete"
        );
        ImportResult::success(destination, strategy, actual_mode)
    }

    /// Transfer, verify and record. Any failure after the transfer has
    /// started runs cleanup, except when the destination turned out to be
    /// someone else's file.
    async fn place(
        &self,
        candidate: &CandidateFile,
        destination: &Path,
        strategy: FileStrategy,
        snapshot: Option<&FileSnapshot>,
        existing: Option<&FileRecord>,
        cancel: &CancellationToken,
    ) -> Result<TransferMode> {
        let source = candidate.path.as_path();

        let actual_mode = match self
            .executor
            .transfer_file(source, destination, strategy.transfer_mode(), false)
            .await
        {
            Ok(mode) => mode,
            Err(e @ Error::AlreadyExists(_)) => return Err(e),
            Err(e) => {
                tracing::warn!(destination = %destination.display(), error = %e, "Transfer failed");
                self.cleanup(source, destination, strategy).await;
                return Err(e);
            }
        };

        if cancel.is_cancelled() {
            tracing::info!(destination = %destination.display(), "Import cancelled during transfer");
            self.cleanup(source, destination, strategy).await;
            return Err(Error::Cancelled);
        }

        let verification = match snapshot {
            Some(snapshot) => self
                .verifier
                .verify_against(snapshot, destination, cancel)
                .await
                .map(|verified| (verified, snapshot.checksum.clone())),
            None => self
                .verifier
                .verify_transfer(source, destination, self.verify_checksum, cancel)
                .await
                .map(|v| (v.verified, v.checksum)),
        };
        let checksum = match verification {
            Ok((true, checksum)) => checksum,
            Ok((false, _)) => {
                self.cleanup(source, destination, strategy).await;
                return Err(Error::Verification(destination.to_path_buf()));
            }
            Err(e) => {
                self.cleanup(source, destination, strategy).await;
                return Err(e);
            }
        };

        if let Err(e) = self.record(candidate, destination, checksum, existing).await {
            tracing::warn!(destination = %destination.display(), error = %e, "Catalog insert failed");
            self.cleanup(source, destination, strategy).await;
            return Err(e.context("catalog insert failed"));
        }

        Ok(actual_mode)
    }

    /// Drop the set-aside copy of an upgraded file: recycle it, else delete.
    async fn discard(&self, backup: &Path) {
        if self.executor.delete_file(backup).await {
            tracing::info!(path = %backup.display(), "Recycled file replaced by upgrade");
            return;
        }
        if let Err(e) = tokio::fs::remove_file(backup).await {
            tracing::warn!(path = %backup.display(), error = %e, "Could not remove file replaced by upgrade");
        }
    }

    /// Import a batch of decisions under `library_root`.
    ///
    /// Rejected decisions are reported, never transferred. Exactly one
    /// outcome per input; with `max_parallel > 1` outcomes arrive in
    /// completion order.
    pub async fn import_decisions(
        &self,
        decisions: Vec<ImportDecision>,
        library_root: &Path,
        preferred: Option<FileStrategy>,
        cancel: &CancellationToken,
    ) -> Vec<ImportOutcome> {
        let jobs = decisions
            .into_iter()
            .map(|decision| self.import_one(decision, library_root, preferred, cancel));

        if self.max_parallel <= 1 {
            let mut outcomes = Vec::new();
            for job in jobs {
                outcomes.push(job.await);
            }
            outcomes
        } else {
            futures::stream::iter(jobs)
                .buffer_unordered(self.max_parallel)
                .collect()
                .await
        }
    }

    async fn import_one(
        &self,
        decision: ImportDecision,
        library_root: &Path,
        preferred: Option<FileStrategy>,
        cancel: &CancellationToken,
    ) -> ImportOutcome {
        if !decision.approved() {
            let (candidate, rejections) = decision.into_parts();
            return ImportOutcome::Rejected {
                path: candidate.path,
                rejections,
            };
        }
        let destination = self.destination_for(decision.candidate(), library_root);
        ImportOutcome::Imported(
            self.import_file(&decision, &destination, preferred, cancel)
                .await,
        )
    }

    async fn record(
        &self,
        candidate: &CandidateFile,
        destination: &Path,
        checksum: Option<String>,
        existing: Option<&FileRecord>,
    ) -> Result<FileRecord> {
        let size = tokio::fs::metadata(destination)
            .await
            .map(|m| m.len())
            .unwrap_or(candidate.size);
        let media_item_id = candidate
            .media_item_id
            .clone()
            .unwrap_or_else(|| format!("path:{}", destination.display()));

        self.catalog
            .insert_record(FileRecord {
                id: existing.and_then(|e| e.id),
                media_item_id,
                family: candidate.family,
                path: destination.to_path_buf(),
                original_path: Some(candidate.path.clone()),
                size,
                quality: candidate.quality,
                checksum,
                date_added: Utc::now(),
            })
            .await
    }

    /// Undo a failed transfer. Afterwards `destination` does not exist.
    async fn cleanup(&self, source: &Path, destination: &Path, strategy: FileStrategy) {
        if !path_occupied(destination).await {
            return;
        }

        if strategy == FileStrategy::Move && !path_occupied(source).await {
            match restore(destination, source).await {
                Ok(()) => {
                    tracing::info!(source = %source.display(), "Restored moved file to source");
                    return;
                }
                Err(e) => {
                    tracing::warn!(source = %source.display(), error = %e, "Could not restore moved file");
                }
            }
        }

        if self.executor.delete_file(destination).await {
            tracing::info!(destination = %destination.display(), "Recycled failed transfer");
            return;
        }
        match tokio::fs::remove_file(destination).await {
            Ok(()) => {
                tracing::info!(destination = %destination.display(), "Deleted failed transfer");
            }
            Err(e) => {
                tracing::error!(
                    destination = %destination.display(),
                    error = %e,
                    "Could not delete failed transfer"
                );
            }
        }
    }
}

/// Whether anything (including a dangling symlink) sits at `path`.
async fn path_occupied(path: &Path) -> bool {
    tokio::fs::symlink_metadata(path).await.is_ok()
}

/// Sibling path an upgraded file waits at until the import settles.
fn backup_path(destination: &Path) -> PathBuf {
    let mut name = destination
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".intake-old");
    destination.with_file_name(name)
}

async fn set_aside(destination: &Path) -> std::io::Result<PathBuf> {
    let backup = backup_path(destination);
    if path_occupied(&backup).await {
        return Err(std::io::Error::new(
            std::io::ErrorKind::AlreadyExists,
            format!("{} already exists", backup.display()),
        ));
    }
    tokio::fs::rename(destination, &backup).await?;
    Ok(backup)
}

/// Return a set-aside file to its place after a failed upgrade.
async fn put_back(backup: &Path, destination: &Path) {
    if path_occupied(destination).await {
        tracing::error!(
            backup = %backup.display(),
            destination = %destination.display(),
            "Destination reoccupied, leaving upgraded file set aside"
        );
        return;
    }
    match tokio::fs::rename(backup, destination).await {
        Ok(()) => {
            tracing::info!(path = %destination.display(), "Restored file after failed upgrade");
        }
        Err(e) => {
            tracing::error!(
                backup = %backup.display(),
                destination = %destination.display(),
                error = %e,
                "Could not restore file after failed upgrade"
            );
        }
    }
}

/// Move a file back to where it came from (rename, else copy + remove).
async fn restore(from: &Path, to: &Path) -> std::io::Result<()> {
    if let Some(parent) = to.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    if tokio::fs::rename(from, to).await.is_ok() {
        return Ok(());
    }
    tokio::fs::copy(from, to).await?;
    tokio::fs::remove_file(from).await
}

impl std::fmt::Debug for ImportService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImportService")
            .field("verify_checksum", &self.verify_checksum)
            .field("max_parallel", &self.max_parallel)
            .finish_non_exhaustive()
    }
}
