//! Notification transport contract and the in-process reference sink.

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::broadcast;

use super::errors::{NotifyError, NotifyResult};

/// One message handed to the transport.
#[derive(Debug, Clone)]
pub struct PublishedMessage {
    pub topic: String,
    pub payload: Value,
}

/// Publish-by-topic transport primitive.
///
/// Implementations deliver best-effort; the relay treats an `Err` as a
/// dropped message, not a reason to retry or abort.
#[async_trait]
pub trait NotificationSink: Send + Sync + 'static {
    async fn publish(&self, topic: &str, payload: Value) -> NotifyResult<()>;
}

/// Reference sink over a tokio broadcast channel.
///
/// The WebSocket/HTTP transport subscribes via [`BroadcastSink::subscribe`]
/// and filters by topic. Publishing with no subscribers is a successful
/// no-op, matching best-effort semantics.
#[derive(Debug)]
pub struct BroadcastSink {
    tx: broadcast::Sender<PublishedMessage>,
}

impl BroadcastSink {
    pub fn new(buffer: usize) -> Self {
        let (tx, _) = broadcast::channel(buffer.max(1));
        Self { tx }
    }

    /// Attach a transport-side consumer.
    pub fn subscribe(&self) -> broadcast::Receiver<PublishedMessage> {
        self.tx.subscribe()
    }
}

impl Default for BroadcastSink {
    fn default() -> Self {
        Self::new(1024)
    }
}

#[async_trait]
impl NotificationSink for BroadcastSink {
    async fn publish(&self, topic: &str, payload: Value) -> NotifyResult<()> {
        let message = PublishedMessage {
            topic: topic.to_string(),
            payload,
        };
        // A send error only means nobody is subscribed right now.
        let _ = self.tx.send(message);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn subscriber_receives_published_message() {
        let sink = BroadcastSink::new(8);
        let mut rx = sink.subscribe();

        sink.publish("admission/movie/1/admitted", json!({"status": "ADMITTED"}))
            .await
            .unwrap();

        let message = rx.recv().await.unwrap();
        assert_eq!(message.topic, "admission/movie/1/admitted");
        assert_eq!(message.payload["status"], "ADMITTED");
    }

    #[tokio::test]
    async fn publish_without_subscribers_is_ok() {
        let sink = BroadcastSink::new(8);
        assert!(sink.publish("t", json!({})).await.is_ok());
    }

    #[test]
    fn transport_error_formats_topic() {
        let err = NotifyError::Transport {
            topic: "admission/movie/1/timeout".into(),
            reason: "closed".into(),
        };
        assert!(err.to_string().contains("admission/movie/1/timeout"));
    }
}
