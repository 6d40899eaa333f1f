//! SQLite-backed catalog.
//!
//! Uses SQLx with SQLite for lightweight, embedded storage of imported
//! file records, keyed by media item.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::migrate::MigrateDatabase;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use std::path::{Path, PathBuf};

use super::{Catalog, DEFAULT_DB_NAME, FileRecord};
use crate::error::{Result, ResultExt};
use crate::quality::{DetectionSource, MediaFamily, Quality, QualityModel, Revision};

/// Build a SQLite database URL from an optional path.
///
/// If no path is provided, uses [`DEFAULT_DB_NAME`] in the current directory.
pub fn db_url(path: Option<&Path>) -> String {
    match path {
        Some(p) => format!("sqlite:{}", p.display()),
        None => format!("sqlite:{}", DEFAULT_DB_NAME),
    }
}

#[derive(Debug, sqlx::FromRow)]
struct FileRecordRow {
    id: i64,
    media_item_id: String,
    family: String,
    path: String,
    original_path: Option<String>,
    size: i64,
    quality: String,
    revision_version: i64,
    revision_real: i64,
    quality_source: String,
    checksum: Option<String>,
    date_added: String,
}

impl From<FileRecordRow> for FileRecord {
    fn from(row: FileRecordRow) -> Self {
        FileRecord {
            id: Some(row.id),
            media_item_id: row.media_item_id,
            family: parse_family(&row.family),
            path: PathBuf::from(row.path),
            original_path: row.original_path.map(PathBuf::from),
            size: u64::try_from(row.size).unwrap_or(0),
            quality: QualityModel::new(
                row.quality.parse().unwrap_or(Quality::Unknown),
                Revision::new(
                    u32::try_from(row.revision_version).unwrap_or(1),
                    u32::try_from(row.revision_real).unwrap_or(0),
                ),
                DetectionSource::from_str_lossy(&row.quality_source),
            ),
            checksum: row.checksum,
            date_added: row.date_added.parse().unwrap_or_else(|_| Utc::now()),
        }
    }
}

fn parse_family(value: &str) -> MediaFamily {
    match value {
        "audiobook" => MediaFamily::Audiobook,
        "ebook" => MediaFamily::Ebook,
        "movie" => MediaFamily::Movie,
        _ => MediaFamily::Music,
    }
}

#[derive(Debug, Clone)]
pub struct SqliteCatalog {
    pool: SqlitePool,
}

impl SqliteCatalog {
    /// Open (creating if needed) the database and run migrations.
    pub async fn open(db_url: &str) -> Result<Self> {
        if !sqlx::Sqlite::database_exists(db_url).await.unwrap_or(false) {
            sqlx::Sqlite::create_database(db_url)
                .await
                .with_context("creating catalog database")?;
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(db_url)
            .await
            .with_context("connecting to catalog")?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// All records, newest first.
    pub async fn list_records(&self) -> Result<Vec<FileRecord>> {
        let rows = sqlx::query_as::<_, FileRecordRow>(
            "SELECT * FROM file_records ORDER BY date_added DESC, id DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(FileRecord::from).collect())
    }
}

#[async_trait]
impl Catalog for SqliteCatalog {
    async fn find_existing_file_for_media_item(
        &self,
        media_item_id: &str,
    ) -> Result<Option<FileRecord>> {
        let row = sqlx::query_as::<_, FileRecordRow>(
            "SELECT * FROM file_records WHERE media_item_id = ?",
        )
        .bind(media_item_id)
        .fetch_optional(&self.pool)
        .await
        .with_context(format!("looking up media item {media_item_id}"))?;
        Ok(row.map(FileRecord::from))
    }

    async fn insert_record(&self, record: FileRecord) -> Result<FileRecord> {
        let size = i64::try_from(record.size).unwrap_or(i64::MAX);
        let original_path = record
            .original_path
            .as_ref()
            .map(|p| p.to_string_lossy().into_owned());

        let row: (i64,) = sqlx::query_as(
            r#"
            INSERT INTO file_records (
                media_item_id, family, path, original_path, size,
                quality, revision_version, revision_real, quality_source,
                checksum, date_added
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(media_item_id) DO UPDATE SET
                family = excluded.family,
                path = excluded.path,
                original_path = excluded.original_path,
                size = excluded.size,
                quality = excluded.quality,
                revision_version = excluded.revision_version,
                revision_real = excluded.revision_real,
                quality_source = excluded.quality_source,
                checksum = excluded.checksum,
                date_added = excluded.date_added
            RETURNING id
            "#,
        )
        .bind(&record.media_item_id)
        .bind(record.family.as_str())
        .bind(record.path.to_string_lossy())
        .bind(original_path)
        .bind(size)
        .bind(record.quality.quality.id())
        .bind(i64::from(record.quality.revision.version))
        .bind(i64::from(record.quality.revision.real))
        .bind(record.quality.source.as_str())
        .bind(&record.checksum)
        .bind(record.date_added.to_rfc3339())
        .fetch_one(&self.pool)
        .await
        .with_context(format!("recording {}", record.path.display()))?;

        Ok(FileRecord {
            id: Some(row.0),
            ..record
        })
    }
}
