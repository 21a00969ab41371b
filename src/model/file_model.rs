use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A stored file. Only `description` changes after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub filename: String,
    pub file_id: String,
    pub filesize: u64, // in bytes
    pub description: String,
    pub upload_date: NaiveDateTime, // UTC
}

/// Insert payload, as handed over by the ingestion path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewFile {
    pub filename: String,
    pub file_id: String,
    pub filesize: u64,
    // optional
    #[serde(default)]
    pub description: String,
}
