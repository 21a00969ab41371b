//! Ordered hand-off of [`FileEvent`]s from the sync engine to the frontend.
//!
//! There is one shared queue. Every [`Subscriber`] pulls from the same
//! cursor, so an event is delivered to exactly one of them; a deployment runs
//! a single frontend stream. Events published before anyone subscribes stay
//! queued. The queue is bounded and drops its oldest entry when full, so the
//! publisher never waits on a slow or absent consumer.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use futures::Stream;
use tokio::sync::Notify;

use crate::model::FileEvent;

struct Queue {
    events: VecDeque<FileEvent>,
    capacity: usize,
    dropped: u64,
    closed: bool,
}

struct Shared {
    queue: Mutex<Queue>,
    ready: Notify,
    streams: AtomicUsize,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Queue> {
        // the queue stays consistent even if a holder panicked
        self.queue.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Publishing side of the channel.
#[derive(Clone)]
pub struct Notifier {
    shared: Arc<Shared>,
}

/// Consuming side; clones share the same cursor.
#[derive(Clone)]
pub struct Subscriber {
    shared: Arc<Shared>,
}

impl Notifier {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            shared: Arc::new(Shared {
                queue: Mutex::new(Queue {
                    events: VecDeque::with_capacity(capacity.min(1024)),
                    capacity,
                    dropped: 0,
                    closed: false,
                }),
                ready: Notify::new(),
                streams: AtomicUsize::new(0),
            }),
        }
    }

    /// Queues `event` behind everything published before it.
    pub fn publish(&self, event: FileEvent) {
        {
            let mut queue = self.shared.lock();
            if queue.closed {
                log::warn!("notification channel closed, dropping {:?}", event);
                return;
            }
            if queue.events.len() >= queue.capacity {
                if let Some(oldest) = queue.events.pop_front() {
                    queue.dropped += 1;
                    log::warn!(
                        "notification queue full ({}), dropped oldest event for {}",
                        queue.capacity,
                        oldest.file_id()
                    );
                }
            }
            queue.events.push_back(event);
        }
        self.shared.ready.notify_one();
    }

    pub fn subscribe(&self) -> Subscriber {
        Subscriber { shared: self.shared.clone() }
    }

    /// Stops accepting events. Subscribers still drain what is queued, then
    /// see the end of the stream.
    pub fn close(&self) {
        self.shared.lock().closed = true;
        self.shared.ready.notify_waiters();
        self.shared.ready.notify_one();
    }

    pub fn is_closed(&self) -> bool {
        self.shared.lock().closed
    }

    /// Number of events discarded by the overflow policy so far.
    pub fn dropped(&self) -> u64 {
        self.shared.lock().dropped
    }

    /// Streams currently pulling from the queue.
    pub fn attached_streams(&self) -> usize {
        self.shared.streams.load(Ordering::SeqCst)
    }
}

impl Subscriber {
    /// Next event in publish order; `None` once the channel is closed and
    /// drained.
    pub async fn recv(&self) -> Option<FileEvent> {
        loop {
            let notified = self.shared.ready.notified();
            {
                let mut queue = self.shared.lock();
                if let Some(event) = queue.events.pop_front() {
                    let more = !queue.events.is_empty();
                    drop(queue);
                    if more {
                        // pass the wakeup on to any other waiter
                        self.shared.ready.notify_one();
                    }
                    return Some(event);
                }
                if queue.closed {
                    return None;
                }
            }
            notified.await;
        }
    }

    pub fn try_recv(&self) -> Option<FileEvent> {
        self.shared.lock().events.pop_front()
    }

    /// Consumes events as a stream. Streams attached at the same time split
    /// the events between them; an event taken by a stream whose reader has
    /// gone away is lost.
    pub fn into_stream(self) -> impl Stream<Item = FileEvent> + Send + 'static {
        let attached = self.shared.streams.fetch_add(1, Ordering::SeqCst) + 1;
        if attached > 1 {
            log::warn!(
                "{} notification streams attached to one queue, events will be split between them",
                attached
            );
        }
        let guard = StreamGuard { shared: self.shared.clone() };

        futures::stream::unfold((self, guard), |(subscriber, guard)| async move {
            let event = subscriber.recv().await?;
            Some((event, (subscriber, guard)))
        })
    }
}

struct StreamGuard {
    shared: Arc<Shared>,
}

impl Drop for StreamGuard {
    fn drop(&mut self) {
        self.shared.streams.fetch_sub(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use std::time::Duration;

    fn deleted(id: &str) -> FileEvent {
        FileEvent::Deleted { file_id: id.to_string() }
    }

    #[tokio::test]
    async fn preserves_publish_order() {
        let notifier = Notifier::new(16);
        let subscriber = notifier.subscribe();

        notifier.publish(deleted("1:a"));
        notifier.publish(deleted("2:b"));
        notifier.publish(deleted("3:c"));

        assert_eq!(subscriber.recv().await, Some(deleted("1:a")));
        assert_eq!(subscriber.recv().await, Some(deleted("2:b")));
        assert_eq!(subscriber.recv().await, Some(deleted("3:c")));
        assert_eq!(subscriber.try_recv(), None);
    }

    #[tokio::test]
    async fn full_queue_drops_oldest() {
        let notifier = Notifier::new(2);
        notifier.publish(deleted("1:a"));
        notifier.publish(deleted("2:b"));
        notifier.publish(deleted("3:c"));

        assert_eq!(notifier.dropped(), 1);
        let subscriber = notifier.subscribe();
        assert_eq!(subscriber.try_recv(), Some(deleted("2:b")));
        assert_eq!(subscriber.try_recv(), Some(deleted("3:c")));
    }

    #[tokio::test]
    async fn waiting_subscriber_is_woken_by_publish() {
        let notifier = Notifier::new(4);
        let subscriber = notifier.subscribe();

        let waiter = tokio::spawn(async move { subscriber.recv().await });
        tokio::time::sleep(Duration::from_millis(20)).await;
        notifier.publish(deleted("9:z"));

        let got = tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(got, Some(deleted("9:z")));
    }

    #[tokio::test]
    async fn attached_streams_are_counted() {
        let notifier = Notifier::new(4);
        let first = notifier.subscribe().into_stream();
        assert_eq!(notifier.attached_streams(), 1);

        let second = notifier.subscribe().into_stream();
        assert_eq!(notifier.attached_streams(), 2);

        drop(first);
        assert_eq!(notifier.attached_streams(), 1);
        drop(second);
        assert_eq!(notifier.attached_streams(), 0);
    }

    #[tokio::test]
    async fn close_flushes_queued_events_then_ends() {
        let notifier = Notifier::new(4);
        let stream = notifier.subscribe().into_stream();

        notifier.publish(deleted("1:a"));
        notifier.close();
        notifier.publish(deleted("2:b"));

        let events: Vec<FileEvent> = stream.collect().await;
        assert_eq!(events, vec![deleted("1:a")]);
        assert!(notifier.is_closed());
    }
}
