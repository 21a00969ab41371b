mod engine;
mod source;

pub use engine::{EngineHandle, SyncEngine};
pub use source::{ChannelSource, EventSource, JsonLinesSource};
