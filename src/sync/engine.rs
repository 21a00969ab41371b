use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::model::{ChannelEvent, EditedMessage, FileEvent};
use crate::notify::Notifier;
use crate::repo::FileRepo;
use crate::sync::EventSource;

/// Applies message lifecycle events to the metadata store and reports each
/// resulting change on the notification channel.
///
/// Only identifiers already present in the store are ever notified. Store
/// operations tolerate absent rows, so replaying an event is harmless.
#[derive(Clone)]
pub struct SyncEngine {
    repo: FileRepo,
    notifier: Notifier,
}

/// A running engine task.
pub struct EngineHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SyncEngine {
    pub fn new(repo: FileRepo, notifier: Notifier) -> Self {
        Self { repo, notifier }
    }

    /// Handles one event and returns how many notifications it produced.
    pub async fn handle_event(&self, event: ChannelEvent) -> usize {
        match event {
            ChannelEvent::MessagesDeleted { deleted_ids } => self.on_messages_deleted(&deleted_ids).await,
            ChannelEvent::MessageEdited { message } => self.on_message_edited(&message).await,
        }
    }

    async fn on_messages_deleted(&self, deleted_ids: &[i64]) -> usize {
        let mut published = 0;
        for &message_id in deleted_ids {
            log::info!("message {} deleted", message_id);

            match self.repo.delete_by_message_id(message_id).await {
                Ok(Some(file_id)) => {
                    self.notifier.publish(FileEvent::Deleted { file_id });
                    published += 1;
                }
                Ok(None) => log::debug!("message {} has no tracked file", message_id),
                Err(e) => log::error!("failed to delete file of message {}: {}", message_id, e),
            }
        }
        published
    }

    async fn on_message_edited(&self, message: &EditedMessage) -> usize {
        if !message.has_document {
            return 0;
        }
        let caption = message.text.clone().unwrap_or_default();
        log::info!("message {} edited, new caption: {:?}", message.id, caption);

        match self.repo.update_description_by_message_id(message.id, &caption).await {
            Ok(Some(file_id)) => {
                log::info!("updated description of {}", file_id);
                self.notifier.publish(FileEvent::DescriptionUpdated {
                    file_id,
                    description: caption,
                });
                1
            }
            Ok(None) => {
                log::debug!("message {} has no tracked file", message.id);
                0
            }
            Err(e) => {
                log::error!("failed to update description of message {}: {}", message.id, e);
                0
            }
        }
    }

    /// Processes events until the source finishes or `shutdown` turns true.
    ///
    /// Shutdown is only checked while waiting for the next event, so an event
    /// being applied always completes. On exit the source is disconnected and
    /// the notification channel closed, letting consumers drain it.
    pub async fn run<S>(&self, source: &mut S, mut shutdown: watch::Receiver<bool>)
    where
        S: EventSource + ?Sized,
    {
        log::info!("sync engine listening");
        loop {
            let event = tokio::select! {
                biased;
                _ = shutdown_requested(&mut shutdown) => break,
                event = source.next_event() => event,
            };
            let Some(event) = event else {
                log::info!("event source finished");
                break;
            };
            self.handle_event(event).await;
        }

        source.disconnect().await;
        self.notifier.close();
        log::info!("sync engine stopped");
    }

    /// Runs the engine on its own task.
    pub fn spawn<S>(self, mut source: S) -> EngineHandle
    where
        S: EventSource + 'static,
    {
        let (shutdown, rx) = watch::channel(false);
        let task = tokio::spawn(async move {
            self.run(&mut source, rx).await;
        });
        EngineHandle { shutdown, task }
    }
}

// A dropped handle never signals; the engine then runs until its source ends.
async fn shutdown_requested(rx: &mut watch::Receiver<bool>) {
    loop {
        if *rx.borrow_and_update() {
            return;
        }
        if rx.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

impl EngineHandle {
    /// Signals shutdown and waits for the in-flight event, if any, to finish.
    pub async fn shutdown(self) -> Result<(), tokio::task::JoinError> {
        let _ = self.shutdown.send(true);
        self.task.await
    }
}
