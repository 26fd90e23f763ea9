//! Change notification for concurrently open operator views.
//!
//! Every mutating operation emits at most one payloadless hint naming the
//! collection that changed; subscribers re-read the collection themselves.
//! Sending is fire-and-forget: with no subscriber attached the hint is
//! dropped silently.

use tokio::sync::broadcast;

const CHANNEL_CAPACITY: usize = 64;

/// A hint that a store collection changed. Carries no data beyond the
/// store identifier; the receiver is expected to re-read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeEvent {
    OrdersChanged { store_id: String },
    ClientsChanged { store_id: String },
    ProductsChanged { store_id: String },
    SettingsChanged { store_id: String },
}

#[derive(Clone)]
pub struct ChangeNotifier {
    tx: broadcast::Sender<ChangeEvent>,
}

impl ChangeNotifier {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        ChangeNotifier { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.tx.subscribe()
    }

    /// Best-effort send; a missing subscriber is not an error.
    pub fn notify(&self, event: ChangeEvent) {
        let _ = self.tx.send(event);
    }
}

impl Default for ChangeNotifier {
    fn default() -> Self {
        Self::new()
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notify_without_subscribers_is_silent() {
        let notifier = ChangeNotifier::new();
        notifier.notify(ChangeEvent::OrdersChanged {
            store_id: "s1".into(),
        });
    }

    #[tokio::test]
    async fn subscriber_receives_hint() {
        let notifier = ChangeNotifier::new();
        let mut rx = notifier.subscribe();

        notifier.notify(ChangeEvent::OrdersChanged {
            store_id: "s1".into(),
        });

        let event = rx.recv().await.expect("receive event");
        assert_eq!(
            event,
            ChangeEvent::OrdersChanged {
                store_id: "s1".into()
            }
        );
    }
}
