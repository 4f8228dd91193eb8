//! Bounded FIFO hand-off between the event generator and the persister.

use tokio::sync::mpsc;

use crate::bail;
use crate::error::{ErrorKind, PulseResult};
use crate::types::Event;

/// Producer side of the event queue.
#[derive(Debug, Clone)]
pub struct EventQueueTx(mpsc::Sender<Event>);

impl EventQueueTx {
    /// Appends an event, waiting while the queue is full.
    ///
    /// Fails with [`ErrorKind::InvalidState`] once the consumer side is gone.
    pub async fn push(&self, event: Event) -> PulseResult<()> {
        if self.0.send(event).await.is_err() {
            bail!(ErrorKind::InvalidState, "Event queue consumer was dropped");
        }

        Ok(())
    }

    /// Number of events currently buffered.
    pub fn len(&self) -> usize {
        self.0.max_capacity() - self.0.capacity()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Consumer side of the event queue.
#[derive(Debug)]
pub struct EventQueueRx(mpsc::Receiver<Event>);

impl EventQueueRx {
    /// Receives the oldest event, or `None` once every producer is gone and the queue is drained.
    pub async fn recv(&mut self) -> Option<Event> {
        self.0.recv().await
    }
}

/// Creates a queue holding at most `capacity` events.
///
/// # Panics
///
/// Panics if `capacity` is zero.
pub fn create_event_queue(capacity: usize) -> (EventQueueTx, EventQueueRx) {
    let (tx, rx) = mpsc::channel(capacity);
    (EventQueueTx(tx), EventQueueRx(rx))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::Utc;
    use tokio::time::timeout;

    use super::*;
    use crate::types::EventType;

    fn event(user: &str) -> Event {
        Event {
            event_type: EventType::Post,
            user: user.to_string(),
            payload: "content_0".to_string(),
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn events_are_delivered_in_order() {
        let (tx, mut rx) = create_event_queue(4);
        tx.push(event("user_1")).await.unwrap();
        tx.push(event("user_2")).await.unwrap();
        assert_eq!(tx.len(), 2);

        assert_eq!(rx.recv().await.unwrap().user, "user_1");
        assert_eq!(rx.recv().await.unwrap().user, "user_2");
        assert!(tx.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn push_waits_while_queue_is_full() {
        let (tx, mut rx) = create_event_queue(1);
        tx.push(event("user_1")).await.unwrap();

        let blocked = timeout(Duration::from_secs(5), tx.push(event("user_2"))).await;
        assert!(blocked.is_err());

        rx.recv().await.unwrap();
        timeout(Duration::from_secs(5), tx.push(event("user_3")))
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn push_fails_once_consumer_is_dropped() {
        let (tx, rx) = create_event_queue(1);
        drop(rx);

        let err = tx.push(event("user_1")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);
    }
}
