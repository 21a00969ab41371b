#![allow(dead_code)]

use chanfs_sync::db::{connect, initialize_db};
use chanfs_sync::{FileRepo, NewFile};

pub async fn setup_repo() -> FileRepo {
    let pool = connect("sqlite::memory:").await.unwrap();
    initialize_db(&pool).await.unwrap();
    FileRepo::new(pool)
}

pub fn new_file(filename: &str, file_id: &str, filesize: u64) -> NewFile {
    NewFile {
        filename: filename.to_string(),
        file_id: file_id.to_string(),
        filesize,
        description: String::new(),
    }
}
