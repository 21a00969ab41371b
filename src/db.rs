use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;

use crate::error::StoreError;

/// Opens the metadata database.
///
/// The pool holds a single long-lived connection: every store call queues on
/// it, which serializes reads and writes, and keeps `sqlite::memory:`
/// databases alive for the life of the pool.
pub async fn connect(url: &str) -> Result<SqlitePool, StoreError> {
    let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;

    Ok(pool)
}

pub async fn initialize_db(pool: &SqlitePool) -> Result<(), StoreError> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS files (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            filename TEXT NOT NULL,
            file_id TEXT NOT NULL UNIQUE,
            filesize INTEGER NOT NULL,
            description TEXT DEFAULT '',
            upload_date TIMESTAMP DEFAULT CURRENT_TIMESTAMP
        )"
    )
    .execute(pool)
    .await?;

    // databases created before descriptions were tracked
    let columns = sqlx::query("PRAGMA table_info(files)")
        .fetch_all(pool)
        .await?;
    let mut has_description = false;
    for column in &columns {
        let name: String = column.try_get("name")?;
        if name == "description" {
            has_description = true;
        }
    }
    if !has_description {
        log::info!("adding description column to files table");
        sqlx::query("ALTER TABLE files ADD COLUMN description TEXT DEFAULT ''")
            .execute(pool)
            .await?;
    }

    Ok(())
}
