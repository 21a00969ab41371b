//! Keeps a local metadata store of files uploaded to a messaging channel in
//! step with the channel's message deletions and caption edits, and streams
//! the resulting changes to a frontend.

pub mod config;
pub mod constants;
pub mod db;
pub mod error;
pub mod file_id;
pub mod handler;
pub mod model;
pub mod notify;
pub mod repo;
pub mod sync;

pub use error::{InvalidIdentifierError, StoreError};
pub use model::{ChannelEvent, EditedMessage, FileEvent, FileRecord, NewFile};
pub use notify::{Notifier, Subscriber};
pub use repo::FileRepo;
pub use sync::{ChannelSource, EngineHandle, EventSource, JsonLinesSource, SyncEngine};
