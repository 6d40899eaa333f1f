//! Candidate analysis, destination naming and the import orchestrator.

mod candidate;
mod naming;
mod result;
mod service;

pub use candidate::{CandidateAnalyzer, CandidateFile, MediaTags};
pub use naming::{destination_for, sanitize_filename};
pub use result::{ImportOutcome, ImportResult};
pub use service::ImportService;
