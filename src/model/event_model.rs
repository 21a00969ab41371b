use serde::{Deserialize, Serialize};

/// Lifecycle events delivered by the messaging channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ChannelEvent {
    #[serde(alias = "message_deleted_batch")]
    MessagesDeleted { deleted_ids: Vec<i64> },
    MessageEdited { message: EditedMessage },
}

/// The parts of an edited message the sync engine cares about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditedMessage {
    pub id: i64,
    /// Message text or media caption.
    #[serde(default, alias = "text_or_caption")]
    pub text: Option<String>,
    #[serde(default, alias = "has_attached_file")]
    pub has_document: bool,
}

/// Change notification pushed to the frontend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action")]
pub enum FileEvent {
    #[serde(rename = "delete")]
    Deleted { file_id: String },
    #[serde(rename = "update_description")]
    DescriptionUpdated { file_id: String, description: String },
}

impl FileEvent {
    pub fn file_id(&self) -> &str {
        match self {
            FileEvent::Deleted { file_id } => file_id,
            FileEvent::DescriptionUpdated { file_id, .. } => file_id,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
