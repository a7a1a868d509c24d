//! New-node notifications.
//!
//! Fan-out over a `tokio::sync::broadcast` channel: only subscribers present
//! at publish time receive an event, and dropping a receiver unsubscribes it.
//! A subscriber that falls more than `capacity` events behind gets
//! `RecvError::Lagged` and should re-read a snapshot.

use tokio::sync::broadcast;

use crate::types::NewNodeVisible;

/// Broadcasts `NewNodeVisible` events to current subscribers
#[derive(Debug, Clone)]
pub struct NewNodePublisher {
    sender: broadcast::Sender<NewNodeVisible>,
}

impl NewNodePublisher {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<NewNodeVisible> {
        self.sender.subscribe()
    }

    /// Deliver `event` to every current subscriber, returning how many there were
    pub fn publish(&self, event: NewNodeVisible) -> usize {
        let node_id = event.new_node_id;
        match self.sender.send(event) {
            Ok(delivered) => delivered,
            Err(_) => {
                tracing::trace!(node_id = %node_id, "No new-node subscribers");
                0
            }
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for NewNodePublisher {
    fn default() -> Self {
        Self::new(crate::constants::DEFAULT_NOTIFICATION_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Availability, NodeId, NodeInfo};
    use std::sync::Arc;
    use tokio::sync::broadcast::error::TryRecvError;

    fn event(id: u64) -> NewNodeVisible {
        NewNodeVisible::new(NodeId(id), Arc::new(NodeInfo::new(Availability::default())))
    }

    #[test]
    fn test_publish_without_subscribers() {
        let publisher = NewNodePublisher::new(4);
        assert_eq!(publisher.publish(event(1)), 0);
    }

    #[test]
    fn test_late_subscriber_gets_no_history() {
        let publisher = NewNodePublisher::new(4);
        let mut early = publisher.subscribe();

        assert_eq!(publisher.publish(event(1)), 1);
        let mut late = publisher.subscribe();

        assert_eq!(early.try_recv().unwrap().new_node_id, NodeId(1));
        assert!(matches!(late.try_recv(), Err(TryRecvError::Empty)));
    }

    #[test]
    fn test_unsubscribe_leaves_others() {
        let publisher = NewNodePublisher::new(4);
        let first = publisher.subscribe();
        let mut second = publisher.subscribe();
        assert_eq!(publisher.subscriber_count(), 2);

        drop(first);
        assert_eq!(publisher.subscriber_count(), 1);
        assert_eq!(publisher.publish(event(9)), 1);
        assert_eq!(second.try_recv().unwrap().new_node_id, NodeId(9));
    }
}
