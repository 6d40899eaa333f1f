//! Per-file import outcomes.

use serde::{Serialize, Serializer};
use std::path::{Path, PathBuf};

use crate::decision::ImportRejection;
use crate::transfer::{FileStrategy, TransferMode};

/// Result of an attempted transfer. Built only through
/// [`ImportResult::success`] and [`ImportResult::failure`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportResult {
    is_success: bool,
    destination_path: PathBuf,
    requested_strategy: Option<FileStrategy>,
    #[serde(serialize_with = "mode_name")]
    actual_mode: Option<TransferMode>,
    error_message: Option<String>,
}

impl ImportResult {
    pub fn success(
        destination_path: impl Into<PathBuf>,
        requested_strategy: FileStrategy,
        actual_mode: TransferMode,
    ) -> Self {
        Self {
            is_success: true,
            destination_path: destination_path.into(),
            requested_strategy: Some(requested_strategy),
            actual_mode: Some(actual_mode),
            error_message: None,
        }
    }

    pub fn failure(
        destination_path: impl Into<PathBuf>,
        requested_strategy: Option<FileStrategy>,
        error_message: impl Into<String>,
    ) -> Self {
        Self {
            is_success: false,
            destination_path: destination_path.into(),
            requested_strategy,
            actual_mode: None,
            error_message: Some(error_message.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.is_success
    }

    pub fn destination_path(&self) -> &Path {
        &self.destination_path
    }

    pub fn requested_strategy(&self) -> Option<FileStrategy> {
        self.requested_strategy
    }

    pub fn actual_mode(&self) -> Option<TransferMode> {
        self.actual_mode
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }
}

/// Transfer modes serialize by name (`"copy"`, `"hardlink"`).
fn mode_name<S: Serializer>(mode: &Option<TransferMode>, serializer: S) -> Result<S::Ok, S::Error> {
    match mode {
        Some(mode) => serializer.collect_str(mode),
        None => serializer.serialize_none(),
    }
}

/// What happened to one input decision of a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportOutcome {
    Imported(ImportResult),
    Rejected {
        path: PathBuf,
        rejections: Vec<ImportRejection>,
    },
}

impl ImportOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Imported(result) if result.is_success())
    }

    /// The attempted result, if the decision was approved.
    pub fn result(&self) -> Option<&ImportResult> {
        match self {
            Self::Imported(result) => Some(result),
            Self::Rejected { .. } => None,
        }
    }
}
