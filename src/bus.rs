///! Notification bus - typed lifecycle notifications on a broadcast channel
///!
///! Decouples the orchestrator from observers (view bindings, tests). Every
///! publisher and subscriber holds a clone of the bus; delivery is FIFO per
///! publish order and subscribers can come and go while dispatch is active.

use tokio::sync::broadcast;

use crate::module::snapshot::Source;

const BUS_CAPACITY: usize = 64;

/// Lifecycle notifications published during an acquisition cycle.
///
/// These are fire-and-forget signals: no subscriber is required for a
/// publish to succeed, and no payload beyond the source name is carried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notification {
    /// A cycle has started and both sources are being requested.
    AccessingApi,
    /// The retry timer fired and incomplete sources are being re-requested.
    RetryingApi,
    /// One source finished fetching and its payload was captured.
    SourceReceived(Source),
    /// Generic advisory that some source data arrived.
    DataReceived,
    /// The completion path started writing to durable storage.
    SavingData,
    /// The snapshot was persisted and the cycle state was reset.
    SaveComplete,
    /// The retry timer was cancelled.
    TimerCancelled,
    /// Past records were hydrated from storage at startup.
    RecordsLoaded,
}

/// Cloneable handle to the process-wide notification channel.
#[derive(Clone)]
pub struct NotificationBus {
    tx: broadcast::Sender<Notification>,
}

impl NotificationBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(BUS_CAPACITY);
        Self { tx }
    }

    /// Publish a notification to all current subscribers.
    ///
    /// A send error only means nobody is listening right now, which is fine
    /// for advisory signals.
    pub fn publish(&self, notification: Notification) {
        let _ = self.tx.send(notification);
    }

    /// Subscribe to all notifications published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.tx.subscribe()
    }
}

impl Default for NotificationBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn delivers_in_publish_order() {
        let bus = NotificationBus::new();
        let mut rx = bus.subscribe();

        bus.publish(Notification::AccessingApi);
        bus.publish(Notification::SourceReceived(Source::Posts));
        bus.publish(Notification::SaveComplete);

        assert_eq!(rx.recv().await.unwrap(), Notification::AccessingApi);
        assert_eq!(
            rx.recv().await.unwrap(),
            Notification::SourceReceived(Source::Posts)
        );
        assert_eq!(rx.recv().await.unwrap(), Notification::SaveComplete);
    }

    #[tokio::test]
    async fn publish_without_subscribers_is_harmless() {
        let bus = NotificationBus::new();
        bus.publish(Notification::TimerCancelled);
    }

    #[tokio::test]
    async fn late_subscriber_only_sees_later_notifications() {
        let bus = NotificationBus::new();
        let mut early = bus.subscribe();

        bus.publish(Notification::AccessingApi);
        let mut late = bus.subscribe();
        bus.publish(Notification::SaveComplete);

        assert_eq!(early.recv().await.unwrap(), Notification::AccessingApi);
        assert_eq!(early.recv().await.unwrap(), Notification::SaveComplete);
        assert_eq!(late.recv().await.unwrap(), Notification::SaveComplete);
    }
}
