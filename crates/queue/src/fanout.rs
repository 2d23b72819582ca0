//! In-process fan-out of stored notifications to live SSE listeners.
//!
//! One broadcast channel per recipient, created by the first subscriber and
//! removed when the last one goes away. Publishing for a recipient nobody is
//! listening to touches nothing but the map lookup.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use campus_services::jobs::NotificationPayload;
use dashmap::DashMap;
use futures::Stream;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tracing::{debug, warn};

pub type SharedPayload = Arc<NotificationPayload>;

pub struct NotificationBroker {
    channels: DashMap<String, broadcast::Sender<SharedPayload>>,
    buffer: usize,
}

impl NotificationBroker {
    pub fn new(buffer: usize) -> Self {
        Self {
            channels: DashMap::new(),
            buffer: buffer.max(1),
        }
    }

    /// Registers a listener for `recipient`. The listener is unregistered
    /// when the returned subscription is dropped.
    pub fn subscribe(self: &Arc<Self>, recipient: &str) -> Subscription {
        let receiver = self
            .channels
            .entry(recipient.to_string())
            .or_insert_with(|| broadcast::channel(self.buffer).0)
            .subscribe();

        debug!(%recipient, "Notification listener added");
        Subscription {
            recipient: recipient.to_string(),
            stream: Some(BroadcastStream::new(receiver)),
            broker: Arc::clone(self),
        }
    }

    /// Delivers `payload` to every listener of its recipient. Returns the
    /// number of listeners reached.
    pub fn publish(&self, payload: NotificationPayload) -> usize {
        let Some(sender) = self.channels.get(&payload.for_user_id) else {
            return 0;
        };
        sender.send(Arc::new(payload)).unwrap_or(0)
    }

    pub fn listener_count(&self, recipient: &str) -> usize {
        self.channels
            .get(recipient)
            .map(|sender| sender.receiver_count())
            .unwrap_or(0)
    }

    pub fn recipient_count(&self) -> usize {
        self.channels.len()
    }

    fn release(&self, recipient: &str) {
        let removed = self
            .channels
            .remove_if(recipient, |_, sender| sender.receiver_count() == 0);
        if removed.is_some() {
            debug!(%recipient, "Last notification listener left");
        }
    }
}

/// A live listener. Yields payloads for its recipient and skips whatever it
/// missed when it falls behind.
pub struct Subscription {
    recipient: String,
    stream: Option<BroadcastStream<SharedPayload>>,
    broker: Arc<NotificationBroker>,
}

impl Stream for Subscription {
    type Item = SharedPayload;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        let Some(stream) = this.stream.as_mut() else {
            return Poll::Ready(None);
        };

        loop {
            match Pin::new(&mut *stream).poll_next(cx) {
                Poll::Ready(Some(Ok(payload))) => return Poll::Ready(Some(payload)),
                Poll::Ready(Some(Err(BroadcastStreamRecvError::Lagged(skipped)))) => {
                    warn!(recipient = %this.recipient, skipped, "Notification listener lagged");
                }
                Poll::Ready(None) => return Poll::Ready(None),
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        // The receiver has to be gone before the count is checked.
        self.stream.take();
        self.broker.release(&self.recipient);
        debug!(recipient = %self.recipient, "Notification listener removed");
    }
}
