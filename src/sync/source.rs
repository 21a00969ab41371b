use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};
use tokio::sync::mpsc;

use crate::model::ChannelEvent;

/// A stream of message lifecycle events from the messaging channel.
///
/// Connection and authentication are the source's own business; the sync
/// engine only pulls events and finally asks it to disconnect.
#[async_trait]
pub trait EventSource: Send {
    /// Waits for the next event. `None` means the source has finished.
    async fn next_event(&mut self) -> Option<ChannelEvent>;

    async fn disconnect(&mut self);
}

/// Source fed through an in-process channel.
pub struct ChannelSource {
    rx: mpsc::UnboundedReceiver<ChannelEvent>,
}

impl ChannelSource {
    pub fn new() -> (mpsc::UnboundedSender<ChannelEvent>, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (tx, Self { rx })
    }
}

#[async_trait]
impl EventSource for ChannelSource {
    async fn next_event(&mut self) -> Option<ChannelEvent> {
        self.rx.recv().await
    }

    async fn disconnect(&mut self) {
        self.rx.close();
    }
}

/// Source reading one JSON-encoded [`ChannelEvent`] per line.
pub struct JsonLinesSource<R> {
    lines: Option<Lines<R>>,
}

impl<R> JsonLinesSource<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    pub fn new(reader: R) -> Self {
        Self { lines: Some(reader.lines()) }
    }
}

#[async_trait]
impl<R> EventSource for JsonLinesSource<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    async fn next_event(&mut self) -> Option<ChannelEvent> {
        let lines = self.lines.as_mut()?;
        loop {
            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => return None,
                Err(e) => {
                    log::error!("event source read failed: {}", e);
                    return None;
                }
            };
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match serde_json::from_str(line) {
                Ok(event) => return Some(event),
                Err(e) => log::warn!("skipping malformed event {:?}: {}", line, e),
            }
        }
    }

    async fn disconnect(&mut self) {
        self.lines = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::EditedMessage;

    #[tokio::test]
    async fn json_lines_skip_blank_and_malformed_lines() {
        let input = concat!(
            "{\"event\":\"messages_deleted\",\"deleted_ids\":[5]}\n",
            "\n",
            "not json\n",
            "{\"event\":\"message_edited\",\"message\":{\"id\":6,\"text\":\"hi\",\"has_document\":true}}\n",
        );
        let mut source = JsonLinesSource::new(input.as_bytes());

        assert_eq!(
            source.next_event().await,
            Some(ChannelEvent::MessagesDeleted { deleted_ids: vec![5] })
        );
        assert_eq!(
            source.next_event().await,
            Some(ChannelEvent::MessageEdited {
                message: EditedMessage {
                    id: 6,
                    text: Some("hi".into()),
                    has_document: true,
                }
            })
        );
        assert_eq!(source.next_event().await, None);
    }

    #[tokio::test]
    async fn json_lines_accept_channel_field_names() {
        let input = concat!(
            "{\"event\":\"message_deleted_batch\",\"deleted_ids\":[3,4]}\n",
            "{\"event\":\"message_edited\",\"message\":{\"id\":42,\"text_or_caption\":\"new caption\",\"has_attached_file\":true}}\n",
        );
        let mut source = JsonLinesSource::new(input.as_bytes());

        assert_eq!(
            source.next_event().await,
            Some(ChannelEvent::MessagesDeleted { deleted_ids: vec![3, 4] })
        );
        assert_eq!(
            source.next_event().await,
            Some(ChannelEvent::MessageEdited {
                message: EditedMessage {
                    id: 42,
                    text: Some("new caption".into()),
                    has_document: true,
                }
            })
        );
        assert_eq!(source.next_event().await, None);
    }

    #[tokio::test]
    async fn disconnect_closes_the_channel() {
        let (tx, mut source) = ChannelSource::new();
        tx.send(ChannelEvent::MessagesDeleted { deleted_ids: vec![] }).unwrap();
        source.disconnect().await;

        assert!(tx.send(ChannelEvent::MessagesDeleted { deleted_ids: vec![] }).is_err());
    }
}
