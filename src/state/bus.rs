use tokio::sync::broadcast;
use tracing::trace;

use crate::dto::events::ShowEvent;

/// Fan-out of show events to every connected viewer.
///
/// Backed by a bounded broadcast channel: publishing never blocks, and a
/// viewer that falls more than `capacity` events behind skips the oldest ones.
pub struct BroadcastBus {
    sender: broadcast::Sender<ShowEvent>,
}

impl BroadcastBus {
    /// Construct a bus holding at most `capacity` undelivered events per viewer.
    pub fn new(capacity: usize) -> Self {
        let (sender, _receiver) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Register a viewer that receives every event published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<ShowEvent> {
        self.sender.subscribe()
    }

    /// Publish `event` to all current viewers. Having no viewer is not an error.
    pub fn publish(&self, event: ShowEvent) {
        let kind = event.kind();
        match self.sender.send(event) {
            Ok(viewers) => trace!(event = kind, viewers, "event published"),
            Err(_) => trace!(event = kind, "event published without viewers"),
        }
    }

    /// Number of connected viewers.
    pub fn viewer_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::broadcast::error::{RecvError, TryRecvError};

    use super::*;

    #[tokio::test]
    async fn viewers_receive_events_in_publish_order() {
        let bus = BroadcastBus::new(8);
        let mut first = bus.subscribe();
        let mut second = bus.subscribe();

        bus.publish(ShowEvent::Start);
        bus.publish(ShowEvent::StopTimer);

        for rx in [&mut first, &mut second] {
            assert_eq!(rx.recv().await.unwrap(), ShowEvent::Start);
            assert_eq!(rx.recv().await.unwrap(), ShowEvent::StopTimer);
        }
    }

    #[test]
    fn publishing_without_viewers_is_fine() {
        let bus = BroadcastBus::new(4);
        bus.publish(ShowEvent::Reset);
        assert_eq!(bus.viewer_count(), 0);
    }

    #[tokio::test]
    async fn lagging_viewer_skips_oldest_events() {
        let bus = BroadcastBus::new(2);
        let mut rx = bus.subscribe();
        for _ in 0..3 {
            bus.publish(ShowEvent::StopTimer);
        }
        bus.publish(ShowEvent::Reset);

        assert!(matches!(rx.recv().await, Err(RecvError::Lagged(_))));
        assert_eq!(rx.recv().await.unwrap(), ShowEvent::StopTimer);
        assert_eq!(rx.recv().await.unwrap(), ShowEvent::Reset);
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
    }
}
