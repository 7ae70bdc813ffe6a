use async_trait::async_trait;
use tokio::sync::oneshot;

use crate::error::{PublishError, PublishResult};

/// Where a message landed once the queue acknowledged it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordMetadata {
    pub partition: u32,
    pub offset: u64,
}

/// A message as delivered to a consumer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueRecord {
    pub topic: String,
    pub partition: u32,
    pub offset: u64,
    pub key: String,
    pub payload: Vec<u8>,
}

/// Acknowledgment for a single send, resolved asynchronously by the queue.
///
/// Producers collect these while reading a file and await them all at the end.
#[must_use = "a pending delivery reports the publish outcome only when awaited"]
pub struct PendingDelivery {
    rx: oneshot::Receiver<PublishResult<RecordMetadata>>,
}

impl PendingDelivery {
    /// Create a pending delivery and the sender the queue resolves it with
    pub fn channel() -> (oneshot::Sender<PublishResult<RecordMetadata>>, Self) {
        let (tx, rx) = oneshot::channel();
        (tx, Self { rx })
    }

    /// A delivery whose outcome is already known
    pub fn ready(result: PublishResult<RecordMetadata>) -> Self {
        let (tx, pending) = Self::channel();
        let _ = tx.send(result);
        pending
    }

    /// Wait for the acknowledgment
    pub async fn wait(self) -> PublishResult<RecordMetadata> {
        self.rx.await.unwrap_or(Err(PublishError::AckLost))
    }
}

/// Producer side of a partitioned, keyed message queue
pub trait MessageQueue: Send + Sync {
    /// Enqueue a message without blocking.
    ///
    /// Messages with the same key land on the same partition, in send order.
    fn send(&self, topic: &str, key: &str, payload: Vec<u8>) -> PendingDelivery;

    /// Get the queue's name/identifier for debugging
    fn name(&self) -> &str {
        "MessageQueue"
    }
}

/// Consumer side: the ordered stream of one assigned partition
#[async_trait]
pub trait PartitionReceiver: Send {
    /// Partition this receiver is bound to
    fn partition(&self) -> u32;

    /// Wait for the next record. `None` once the partition is closed and drained.
    async fn recv(&mut self) -> Option<QueueRecord>;
}

#[cfg(test)]
mod tests {
    use super::*;

    // Ensure traits are object-safe
    fn _assert_queue_object_safe(_: &dyn MessageQueue) {}
    fn _assert_receiver_object_safe(_: &mut dyn PartitionReceiver) {}

    #[tokio::test]
    async fn test_ready_delivery() {
        let meta = RecordMetadata {
            partition: 1,
            offset: 7,
        };
        assert_eq!(PendingDelivery::ready(Ok(meta)).wait().await, Ok(meta));

        let err = PendingDelivery::ready(Err(PublishError::Closed("t".into())))
            .wait()
            .await;
        assert_eq!(err, Err(PublishError::Closed("t".into())));
    }

    #[tokio::test]
    async fn test_dropped_sender_is_ack_lost() {
        let (tx, pending) = PendingDelivery::channel();
        drop(tx);
        assert_eq!(pending.wait().await, Err(PublishError::AckLost));
    }
}
