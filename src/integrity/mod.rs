//! Transfer integrity checks.
//!
//! Size comparison plus optional full-content SHA-256 digests. Digests
//! guard against transfer corruption; they are not a tamper check.

mod hash;
mod verifier;

pub use hash::{checksum_async, compute_file_checksum};
pub use verifier::{FileSnapshot, IntegrityVerifier, Verification};
