//! Ordered event delivery to the client-facing stream.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use sluice_types::OutputEvent;

/// Default channel capacity for one session's output stream.
pub const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 128;

/// Receiver half of a session's output stream.
pub type EventRx = mpsc::Receiver<OutputEvent>;

/// Sender for one session's ordered event stream.
///
/// If the receiving side goes away (client disconnected), the first failed
/// send cancels the session token so upstream work terminates promptly.
#[derive(Clone)]
pub struct EventSink {
    tx: mpsc::Sender<OutputEvent>,
    cancel: CancellationToken,
}

impl EventSink {
    pub fn new(tx: mpsc::Sender<OutputEvent>, cancel: CancellationToken) -> Self {
        Self { tx, cancel }
    }

    /// Delivers one event, preserving emission order.
    pub async fn send(&self, event: OutputEvent) {
        if self.tx.send(event).await.is_err() {
            debug!("output stream closed, cancelling session");
            self.cancel.cancel();
        }
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Creates a session output channel bound to `cancel`.
pub fn event_channel(cancel: &CancellationToken) -> (EventSink, EventRx) {
    let (tx, rx) = mpsc::channel(DEFAULT_EVENT_CHANNEL_CAPACITY);
    (EventSink::new(tx, cancel.clone()), rx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_send_preserves_order() {
        let cancel = CancellationToken::new();
        let (sink, mut rx) = event_channel(&cancel);

        sink.send(OutputEvent::Text {
            text: "a".to_string(),
        })
        .await;
        sink.send(OutputEvent::Done).await;

        assert_eq!(
            rx.recv().await,
            Some(OutputEvent::Text {
                text: "a".to_string()
            })
        );
        assert_eq!(rx.recv().await, Some(OutputEvent::Done));
    }

    #[tokio::test]
    async fn test_dropped_receiver_cancels_session() {
        let cancel = CancellationToken::new();
        let (sink, rx) = event_channel(&cancel);
        drop(rx);

        sink.send(OutputEvent::Done).await;
        assert!(cancel.is_cancelled());
    }
}
