//! # Publish Bus
//!
//! Per-class multicast built on [`tokio::sync::broadcast`]. Each class has a single
//! emission task publishing into its bus, so every subscriber observes that
//! class's events in emission order. Subscribers only see events published after
//! they subscribed; nothing is replayed.

use futures::Stream;
use parking_lot::RwLock;
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::constants::TelemetryClass;

/// Multicast channel for one telemetry class
#[derive(Debug)]
pub struct PublishBus<T> {
    class: TelemetryClass,
    sender: RwLock<Option<broadcast::Sender<T>>>,
}

impl<T: Clone + Send + 'static> PublishBus<T> {
    pub fn new(class: TelemetryClass, capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            class,
            sender: RwLock::new(Some(sender)),
        }
    }

    /// Publish to every current subscriber, returning how many received it.
    ///
    /// Publishing with no subscribers is not an error.
    pub fn publish(&self, event: T) -> usize {
        match self.sender.read().as_ref() {
            Some(sender) => sender.send(event).unwrap_or(0),
            None => 0,
        }
    }

    pub fn subscribe(&self) -> Subscription<T> {
        let receiver = match self.sender.read().as_ref() {
            Some(sender) => sender.subscribe(),
            // Closed bus: hand out a receiver whose sender is already gone
            None => broadcast::channel(1).1,
        };
        let subscription = Subscription {
            id: Uuid::new_v4(),
            class: self.class,
            receiver,
            skipped: 0,
        };

        debug!(
            class = %self.class,
            subscription_id = %subscription.id,
            subscribers = self.subscriber_count(),
            "Subscriber attached"
        );
        subscription
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender
            .read()
            .as_ref()
            .map_or(0, |sender| sender.receiver_count())
    }

    /// Close the bus; pending and future `recv` calls resolve to `None`
    pub fn close(&self) {
        if self.sender.write().take().is_some() {
            debug!(class = %self.class, "Publish bus closed");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.sender.read().is_none()
    }
}

/// One subscriber's view of a class's optimized stream
#[derive(Debug)]
pub struct Subscription<T> {
    id: Uuid,
    class: TelemetryClass,
    receiver: broadcast::Receiver<T>,
    skipped: u64,
}

impl<T: Clone> Subscription<T> {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn class(&self) -> TelemetryClass {
        self.class
    }

    /// Events lost because this subscriber fell more than the bus capacity behind
    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    /// Wait for the next event; `None` once the bus is closed
    pub async fn recv(&mut self) -> Option<T> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(RecvError::Lagged(missed)) => self.record_lag(missed),
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Next event if one is already queued
    pub fn try_recv(&mut self) -> Option<T> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => return Some(event),
                Err(TryRecvError::Lagged(missed)) => self.record_lag(missed),
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return None,
            }
        }
    }

    /// Cancel this subscription without affecting other subscribers
    pub fn unsubscribe(self) {
        debug!(class = %self.class, subscription_id = %self.id, "Subscriber detached");
    }

    pub fn into_stream(self) -> impl Stream<Item = T>
    where
        T: Send + 'static,
    {
        futures::stream::unfold(self, |mut subscription| async move {
            subscription
                .recv()
                .await
                .map(|event| (event, subscription))
        })
    }

    fn record_lag(&mut self, missed: u64) {
        self.skipped += missed;
        warn!(
            class = %self.class,
            subscription_id = %self.id,
            missed = missed,
            total_skipped = self.skipped,
            "Subscriber lagging - skipped events (consider increasing bus.channel_capacity)"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    async fn test_publish_without_subscribers_is_ok() {
        let bus = PublishBus::<u32>::new(TelemetryClass::Metrics, 8);
        assert_eq!(bus.publish(1), 0);
    }

    #[tokio::test]
    async fn test_late_subscriber_gets_no_replay() {
        let bus = PublishBus::new(TelemetryClass::Health, 8);
        let mut early = bus.subscribe();
        bus.publish(1u32);
        let mut late = bus.subscribe();
        bus.publish(2u32);

        assert_eq!(early.recv().await, Some(1));
        assert_eq!(early.recv().await, Some(2));
        assert_eq!(late.recv().await, Some(2));
        assert_eq!(late.try_recv(), None);
    }

    #[tokio::test]
    async fn test_unsubscribe_leaves_others_untouched() {
        let bus = PublishBus::new(TelemetryClass::Alerts, 8);
        let first = bus.subscribe();
        let mut second = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);

        first.unsubscribe();
        assert_eq!(bus.subscriber_count(), 1);
        assert_eq!(bus.publish(7u32), 1);
        assert_eq!(second.recv().await, Some(7));
    }

    #[test]
    fn test_recv_pends_until_publish() {
        let bus = PublishBus::new(TelemetryClass::Health, 4);
        let mut subscription = bus.subscribe();
        let mut recv = tokio_test::task::spawn(subscription.recv());

        tokio_test::assert_pending!(recv.poll());
        bus.publish(3u32);
        assert!(recv.is_woken());
        assert_eq!(tokio_test::assert_ready!(recv.poll()), Some(3));
    }

    #[tokio::test]
    async fn test_lagging_subscriber_skips_and_continues() {
        let bus = PublishBus::new(TelemetryClass::Metrics, 2);
        let mut sub = bus.subscribe();
        for i in 0..5u32 {
            bus.publish(i);
        }
        assert_eq!(sub.recv().await, Some(3));
        assert_eq!(sub.recv().await, Some(4));
        assert_eq!(sub.skipped(), 3);
    }

    #[tokio::test]
    async fn test_close_ends_streams() {
        let bus = PublishBus::new(TelemetryClass::Health, 4);
        let sub = bus.subscribe();
        bus.publish(9u32);
        bus.close();

        let collected: Vec<u32> = sub.into_stream().collect().await;
        assert_eq!(collected, vec![9]);
        assert!(bus.is_closed());
        assert_eq!(bus.subscribe().recv().await, None);
        assert_eq!(bus.publish(10), 0);
    }
}
