mod event_model;
mod file_model;

pub use event_model::{ChannelEvent, EditedMessage, FileEvent};
pub use file_model::{FileRecord, NewFile};
