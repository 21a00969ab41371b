use chrono::{NaiveDateTime, Utc};
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::Row;

use crate::error::StoreError;
use crate::file_id;
use crate::model::{FileRecord, NewFile};

const SELECT_FILES: &str =
    "SELECT filename, file_id, filesize, COALESCE(description, '') AS description, upload_date FROM files";

/// The metadata store.
///
/// Cheap to clone; all clones share one pool. Each public method is a
/// single unit of work against the pool's only connection, so no two store
/// calls ever interleave.
#[derive(Clone)]
pub struct FileRepo {
    pool: SqlitePool,
}

impl FileRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Stores a new record. Returns false when `file_id` was already present,
    /// in which case nothing is changed.
    pub async fn insert(&self, file: &NewFile) -> Result<bool, StoreError> {
        file_id::parse(&file.file_id)?;
        if file.filename.is_empty() {
            return Err(StoreError::InvalidRecord("filename is empty".into()));
        }
        let filesize = i64::try_from(file.filesize)
            .map_err(|_| StoreError::InvalidRecord(format!("filesize {} too large", file.filesize)))?;

        let result = sqlx::query(
            "INSERT OR IGNORE INTO files (filename, file_id, filesize, description, upload_date) VALUES (?, ?, ?, ?, ?)"
        )
        .bind(&file.filename)
        .bind(&file.file_id)
        .bind(filesize)
        .bind(&file.description)
        .bind(Utc::now().naive_utc())
        .execute(&self.pool)
        .await?;

        let inserted = result.rows_affected() > 0;
        if inserted {
            log::info!("added file metadata: {} ({})", file.filename, file.file_id);
        } else {
            log::debug!("file {} already stored, insert ignored", file.file_id);
        }
        Ok(inserted)
    }

    /// All records, newest upload first.
    pub async fn list_all(&self) -> Result<Vec<FileRecord>, StoreError> {
        let sql = format!("{} ORDER BY upload_date DESC, id DESC", SELECT_FILES);
        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(file_from_row).collect()
    }

    pub async fn get_by_file_id(&self, file_id: &str) -> Result<Option<FileRecord>, StoreError> {
        let sql = format!("{} WHERE file_id = ?", SELECT_FILES);
        let row = sqlx::query(&sql)
            .bind(file_id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(file_from_row).transpose()
    }

    pub async fn delete_by_file_id(&self, file_id: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM files WHERE file_id = ?")
            .bind(file_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Deletes the file uploaded in `message_id` and returns its file id.
    pub async fn delete_by_message_id(&self, message_id: i64) -> Result<Option<String>, StoreError> {
        let mut tx = self.pool.begin().await?;

        let Some(found) = find_by_message_id(&mut tx, message_id).await? else {
            return Ok(None);
        };
        sqlx::query("DELETE FROM files WHERE file_id = ?")
            .bind(&found)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        log::info!("deleted file {} of message {}", found, message_id);
        Ok(Some(found))
    }

    /// Replaces the description of the file uploaded in `message_id` and
    /// returns its file id.
    pub async fn update_description_by_message_id(
        &self,
        message_id: i64,
        description: &str,
    ) -> Result<Option<String>, StoreError> {
        let mut tx = self.pool.begin().await?;

        let Some(found) = find_by_message_id(&mut tx, message_id).await? else {
            return Ok(None);
        };
        sqlx::query("UPDATE files SET description = ? WHERE file_id = ?")
            .bind(description)
            .bind(&found)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(Some(found))
    }

    pub async fn update_description_by_file_id(
        &self,
        file_id: &str,
        description: &str,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query("UPDATE files SET description = ? WHERE file_id = ?")
            .bind(description)
            .bind(file_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

// Anchored comparison on the first len(prefix) characters; LIKE would treat
// '%' and '_' as wildcards.
async fn find_by_message_id(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    message_id: i64,
) -> Result<Option<String>, StoreError> {
    if message_id < 0 {
        return Ok(None);
    }
    let prefix = file_id::message_prefix(message_id);

    let row = sqlx::query("SELECT file_id FROM files WHERE substr(file_id, 1, ?) = ? ORDER BY id LIMIT 1")
        .bind(prefix.len() as i64)
        .bind(&prefix)
        .fetch_optional(&mut **tx)
        .await?;

    match row {
        Some(row) => {
            let found: String = row.try_get("file_id")?;
            debug_assert!(file_id::has_message_prefix(&found, message_id));
            Ok(Some(found))
        }
        None => Ok(None),
    }
}

// Rows written by other tools may carry a NULL or free-form upload_date;
// those are listed with the epoch rather than failing the whole query.
fn file_from_row(row: &SqliteRow) -> Result<FileRecord, StoreError> {
    let filesize: i64 = row.try_get("filesize")?;
    let upload_date = match row.try_get::<Option<NaiveDateTime>, _>("upload_date") {
        Ok(Some(date)) => date,
        Ok(None) => NaiveDateTime::default(),
        Err(e) => {
            log::warn!("unreadable upload_date, using epoch: {}", e);
            NaiveDateTime::default()
        }
    };

    Ok(FileRecord {
        filename: row.try_get("filename")?,
        file_id: row.try_get("file_id")?,
        filesize: u64::try_from(filesize)
            .map_err(|_| StoreError::InvalidRecord(format!("negative filesize {}", filesize)))?,
        description: row.try_get("description")?,
        upload_date,
    })
}
