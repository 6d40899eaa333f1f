//! Decision outcome types.

use serde::Serialize;
use std::fmt;

use crate::import::CandidateFile;

/// Why a candidate was turned away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionReason {
    FileLocked,
    InvalidFilePath,
    UnsupportedExtension,
    UnableToParse,
    AlreadyImported,
    MinimumQuality,
    NoAudioTrack,
    NotQualityUpgrade,
    Error,
    Unknown,
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::FileLocked => "file locked",
            Self::InvalidFilePath => "invalid file path",
            Self::UnsupportedExtension => "unsupported extension",
            Self::UnableToParse => "unable to parse",
            Self::AlreadyImported => "already imported",
            Self::MinimumQuality => "minimum quality",
            Self::NoAudioTrack => "no audio track",
            Self::NotQualityUpgrade => "not a quality upgrade",
            Self::Error => "error",
            Self::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportRejection {
    reason: RejectionReason,
    message: String,
}

impl ImportRejection {
    pub fn new(reason: RejectionReason, message: impl Into<String>) -> Self {
        Self {
            reason,
            message: message.into(),
        }
    }

    pub fn reason(&self) -> RejectionReason {
        self.reason
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ImportRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.reason, self.message)
    }
}

/// A candidate plus everything the rule chain objected to.
#[derive(Debug, Clone)]
pub struct ImportDecision {
    candidate: CandidateFile,
    rejections: Vec<ImportRejection>,
}

impl ImportDecision {
    pub fn new(candidate: CandidateFile) -> Self {
        Self {
            candidate,
            rejections: Vec::new(),
        }
    }

    pub fn candidate(&self) -> &CandidateFile {
        &self.candidate
    }

    pub fn rejections(&self) -> &[ImportRejection] {
        &self.rejections
    }

    pub fn approved(&self) -> bool {
        self.rejections.is_empty()
    }

    pub fn has_reason(&self, reason: RejectionReason) -> bool {
        self.rejections.iter().any(|r| r.reason == reason)
    }

    pub(crate) fn add_rejection(&mut self, rejection: ImportRejection) {
        self.rejections.push(rejection);
    }

    pub fn into_parts(self) -> (CandidateFile, Vec<ImportRejection>) {
        (self.candidate, self.rejections)
    }
}
