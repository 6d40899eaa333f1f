//! Library catalog collaborator.
//!
//! The import pipeline only needs two operations: find the file currently
//! held for a media item, and record a newly imported one. [`Catalog`]
//! captures exactly that; [`SqliteCatalog`] is the bundled implementation.

mod sqlite;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::quality::{MediaFamily, QualityModel};

pub use sqlite::{SqliteCatalog, db_url};

/// Default database filename.
pub const DEFAULT_DB_NAME: &str = "catalog.db";

/// A library file as the catalog knows it.
#[derive(Debug, Clone, PartialEq)]
pub struct FileRecord {
    /// Database ID (None before insertion)
    pub id: Option<i64>,
    /// Media item this file belongs to
    pub media_item_id: String,
    pub family: MediaFamily,
    /// Location inside the library
    pub path: PathBuf,
    /// Where the file was imported from
    pub original_path: Option<PathBuf>,
    pub size: u64,
    pub quality: QualityModel,
    /// Lowercase hex SHA-256, when verified with checksums
    pub checksum: Option<String>,
    pub date_added: DateTime<Utc>,
}

impl FileRecord {
    /// Whether `path` is this record's library path or its import origin.
    pub fn refers_to(&self, path: &Path) -> bool {
        self.path == path || self.original_path.as_deref() == Some(path)
    }
}

#[async_trait]
pub trait Catalog: Send + Sync {
    async fn find_existing_file_for_media_item(
        &self,
        media_item_id: &str,
    ) -> Result<Option<FileRecord>>;

    /// Insert (or replace the item's existing) record, returning it with its ID.
    async fn insert_record(&self, record: FileRecord) -> Result<FileRecord>;
}
