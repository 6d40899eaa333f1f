//! media-intake - quality-aware media import core.
//!
//! Candidates found on disk are classified ([`quality`]), probed
//! ([`media_info`]), run through a chain of approve/reject rules
//! ([`decision`]) and finally transferred into the library by the import
//! orchestrator ([`import`]), which picks a transfer strategy
//! ([`transfer`]), verifies the result ([`integrity`]) and records it in the
//! [`catalog`].

pub mod catalog;
pub mod cli;
pub mod config;
pub mod decision;
pub mod error;
pub mod import;
pub mod integrity;
pub mod media_info;
pub mod metadata;
pub mod quality;
pub mod scanner;
#[cfg(test)]
pub mod test_utils;
pub mod transfer;
