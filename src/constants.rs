// Messages
pub const MESSAGE_CAN_NOT_FETCH_DATA: &str = "Can not fetch data";
pub const MESSAGE_CAN_NOT_INSERT_DATA: &str = "Can not insert data";
pub const MESSAGE_CAN_NOT_UPDATE_DATA: &str = "Can not update data";
pub const MESSAGE_CAN_NOT_DELETE_DATA: &str = "Can not delete data";
pub const MESSAGE_FILE_CREATED: &str = "File metadata stored";
pub const MESSAGE_FILE_EXISTS: &str = "File metadata already stored";

// Env keys
pub const ENV_DB_URL: &str = "SQLITE_DB_URL";
pub const ENV_BIND_ADDR: &str = "BIND_ADDR";
pub const ENV_NOTIFY_CAPACITY: &str = "NOTIFY_CAPACITY";
pub const ENV_EVENTS_PATH: &str = "EVENTS_PATH";

// Defaults
pub const DEFAULT_DB_URL: &str = "sqlite://file_metadata.db";
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";
pub const DEFAULT_NOTIFY_CAPACITY: usize = 1024;

// Content types
pub const MIME_EVENT_STREAM: &str = "text/event-stream";
