use tokio::sync::broadcast;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};

use crate::models::ProcessStatus;

const BUS_CAPACITY: usize = 64;

/// Fan-out of process status snapshots. Publishing with no subscribers is
/// not an error.
#[derive(Debug, Clone)]
pub struct StatusBus {
    tx: broadcast::Sender<ProcessStatus>,
}

impl Default for StatusBus {
    fn default() -> Self {
        let (tx, _) = broadcast::channel(BUS_CAPACITY);
        Self { tx }
    }
}

impl StatusBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&self, status: ProcessStatus) {
        let _ = self.tx.send(status);
    }

    pub fn subscribe(&self) -> StatusSubscription {
        StatusSubscription {
            rx: self.tx.subscribe(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

/// One subscriber's view of the bus. Dropping it unsubscribes.
#[derive(Debug)]
pub struct StatusSubscription {
    rx: broadcast::Receiver<ProcessStatus>,
}

impl StatusSubscription {
    /// Next snapshot, or `None` once the bus is gone. Slow subscribers skip
    /// the snapshots they missed.
    pub async fn recv(&mut self) -> Option<ProcessStatus> {
        loop {
            match self.rx.recv().await {
                Ok(status) => return Some(status),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!("Status subscriber lagged by {} snapshots", skipped);
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    pub fn try_recv(&mut self) -> Option<ProcessStatus> {
        loop {
            match self.rx.try_recv() {
                Ok(status) => return Some(status),
                Err(TryRecvError::Lagged(_)) => continue,
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return None,
            }
        }
    }

    pub fn unsubscribe(self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publish_without_subscribers_is_silent() {
        let bus = StatusBus::new();
        bus.publish(ProcessStatus::from_instances(Vec::new()));
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn every_subscriber_sees_snapshot() {
        let bus = StatusBus::new();
        let mut a = bus.subscribe();
        let mut b = bus.subscribe();

        bus.publish(ProcessStatus::from_instances(Vec::new()));

        assert!(a.recv().await.is_some());
        assert!(b.recv().await.is_some());
        assert!(a.try_recv().is_none());
    }

    #[test]
    fn unsubscribe_drops_receiver() {
        let bus = StatusBus::new();
        let sub = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 1);
        sub.unsubscribe();
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn lagging_subscriber_resumes_with_latest() {
        let bus = StatusBus::new();
        let mut sub = bus.subscribe();
        for _ in 0..(BUS_CAPACITY + 5) {
            bus.publish(ProcessStatus::from_instances(Vec::new()));
        }
        assert!(sub.recv().await.is_some());
    }

    #[tokio::test]
    async fn recv_ends_when_bus_dropped() {
        let bus = StatusBus::new();
        let mut sub = bus.subscribe();
        drop(bus);
        assert!(sub.recv().await.is_none());
    }
}
