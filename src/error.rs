//! Crate-wide error types.
//!
//! Library modules use specific error types via `thiserror`, while the
//! CLI uses `anyhow` for convenient error propagation.
//!
//! # Design
//!
//! - [`Error`]: Top-level error enum
//! - Module-specific errors (e.g., [`ProbeError`](crate::media_info::ProbeError),
//!   which never crosses into [`Error`]: failed probes degrade to `None`)
//! - All errors implement `std::error::Error` for compatibility
//!
//! # Example
//!
//! ```ignore
//! use media_intake::error::{Error, Result, ResultExt};
//!
//! fn read_size(path: &Path) -> Result<u64> {
//!     let meta = std::fs::metadata(path).with_context("reading candidate")?;
//!     Ok(meta.len())
//! }
//! ```

use std::path::PathBuf;

/// Crate-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error.
///
/// Aggregates errors from all subsystems for unified handling.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Catalog database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Database migration error
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Physical transfer failed
    #[error("Transfer error: {0}")]
    Transfer(String),

    /// Destination did not match the source after transfer
    #[error("Verification failed for {0}")]
    Verification(PathBuf),

    /// File not found
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    /// Destination already occupied
    #[error("Destination already exists: {0}")]
    AlreadyExists(PathBuf),

    /// Operation cancelled by the caller
    #[error("Operation cancelled")]
    Cancelled,

    /// Generic error with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Create a transfer error.
    pub fn transfer(message: impl Into<String>) -> Self {
        Self::Transfer(message.into())
    }

    /// Create a not found error.
    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        Self::NotFound(path.into())
    }

    /// Add context to an error.
    pub fn context(self, ctx: impl Into<String>) -> Self {
        Self::WithContext {
            context: ctx.into(),
            source: Box::new(self),
        }
    }

    /// Whether this error (or the error it wraps) is a cancellation.
    pub fn is_cancelled(&self) -> bool {
        match self {
            Self::Cancelled => true,
            Self::WithContext { source, .. } => source.is_cancelled(),
            _ => false,
        }
    }
}

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn with_context(self, ctx: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn with_context(self, ctx: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.context(ctx))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, std::io::Error> {
    fn with_context(self, ctx: impl Into<String>) -> Result<T> {
        self.map_err(|e| Error::Io(e).context(ctx))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, sqlx::Error> {
    fn with_context(self, ctx: impl Into<String>) -> Result<T> {
        self.map_err(|e| Error::Database(e).context(ctx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::not_found("/downloads/track.flac");
        assert!(err.to_string().contains("/downloads/track.flac"));
    }

    #[test]
    fn test_error_with_context() {
        let err = Error::transfer("cross-device link").context("while importing track");
        let msg = err.to_string();
        assert!(msg.contains("while importing track"));
        assert!(msg.contains("cross-device link"));
    }

    #[test]
    fn test_cancelled_survives_context() {
        let err = Error::Cancelled.context("verifying destination");
        assert!(err.is_cancelled());
        assert!(!Error::transfer("boom").is_cancelled());
    }

    #[test]
    fn test_verification_error_names_path() {
        let err = Error::Verification(PathBuf::from("/library/a.flac"));
        assert_eq!(err.to_string(), "Verification failed for /library/a.flac");
    }

    #[test]
    fn test_result_ext() {
        let result: Result<()> = Err(Error::transfer("test"));
        let with_ctx = result.with_context("additional context");
        assert!(with_ctx.unwrap_err().to_string().contains("additional context"));
    }

    #[test]
    fn test_io_result_ext() {
        let result: std::io::Result<()> = Err(std::io::Error::other("disk gone"));
        let err = result.with_context("copying").unwrap_err();
        assert!(err.to_string().contains("copying"));
    }
}
