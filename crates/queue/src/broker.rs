//! Tokio channel-based broker for single-process mode
//!
//! Each topic is split into partitions; each partition is an unbounded mpsc
//! channel acting as the partition log, so records sharing a key arrive in
//! the order they were sent. A slow or absent consumer makes the log grow,
//! it never makes a send fail. Offsets are assigned per partition at enqueue
//! time.

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::mpsc;
use tradeflow_ports::{
    MessageQueue, PartitionReceiver, PendingDelivery, PublishError, PublishResult, QueueRecord,
    RecordMetadata,
};

use crate::error::BrokerError;
use crate::partitioner::{KeyHashPartitioner, Partitioner};
use crate::topics::TopicConfig;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

struct PartitionSender {
    tx: Option<mpsc::UnboundedSender<QueueRecord>>,
    next_offset: u64,
}

struct Partition {
    sender: Mutex<PartitionSender>,
    // Handed to the consumer group on subscribe
    receiver: Mutex<Option<mpsc::UnboundedReceiver<QueueRecord>>>,
}

struct Topic {
    name: String,
    config: TopicConfig,
    partitions: Vec<Partition>,
    group: Mutex<Option<String>>,
}

impl Topic {
    fn new(name: &str, config: TopicConfig) -> Self {
        let partitions = (0..config.partitions)
            .map(|_| {
                let (tx, rx) = mpsc::unbounded_channel();
                Partition {
                    sender: Mutex::new(PartitionSender {
                        tx: Some(tx),
                        next_offset: 0,
                    }),
                    receiver: Mutex::new(Some(rx)),
                }
            })
            .collect();

        Self {
            name: name.to_string(),
            config,
            partitions,
            group: Mutex::new(None),
        }
    }

    fn append(&self, index: u32, key: &str, payload: Vec<u8>) -> PublishResult<RecordMetadata> {
        let partition = &self.partitions[index as usize];
        let mut sender = lock(&partition.sender);
        let offset = sender.next_offset;
        let Some(tx) = sender.tx.as_ref() else {
            return Err(PublishError::Closed(self.name.clone()));
        };

        let record = QueueRecord {
            topic: self.name.clone(),
            partition: index,
            offset,
            key: key.to_string(),
            payload,
        };

        // Fails only once the consumer group has dropped the partition
        match tx.send(record) {
            Ok(()) => {
                sender.next_offset += 1;
                Ok(RecordMetadata {
                    partition: index,
                    offset,
                })
            }
            Err(_) => Err(PublishError::Closed(self.name.clone())),
        }
    }

    fn close(&self) {
        for partition in &self.partitions {
            lock(&partition.sender).tx = None;
        }
    }

    fn message_count(&self) -> u64 {
        self.partitions
            .iter()
            .map(|p| lock(&p.sender).next_offset)
            .sum()
    }
}

/// In-process partitioned queue.
///
/// Cheap to share behind an `Arc`; producers call [`MessageQueue::send`],
/// a single consumer group per topic calls [`InMemoryBroker::subscribe`].
pub struct InMemoryBroker {
    topics: DashMap<String, Arc<Topic>>,
    partitioner: Box<dyn Partitioner>,
}

impl InMemoryBroker {
    pub fn new() -> Self {
        Self::with_partitioner(Box::new(KeyHashPartitioner))
    }

    pub fn with_partitioner(partitioner: Box<dyn Partitioner>) -> Self {
        Self {
            topics: DashMap::new(),
            partitioner,
        }
    }

    /// Create a topic
    pub fn create_topic(&self, name: &str, config: TopicConfig) -> Result<(), BrokerError> {
        if name.is_empty() {
            return Err(BrokerError::InvalidConfig("topic name is empty".to_string()));
        }
        if config.partitions == 0 {
            return Err(BrokerError::InvalidConfig(format!(
                "topic {} needs at least one partition",
                name
            )));
        }

        match self.topics.entry(name.to_string()) {
            Entry::Occupied(_) => Err(BrokerError::TopicExists(name.to_string())),
            Entry::Vacant(slot) => {
                log::info!(
                    "Created topic '{}' with {} partitions",
                    name, config.partitions
                );
                slot.insert(Arc::new(Topic::new(name, config)));
                Ok(())
            }
        }
    }

    /// Attach a consumer group to a topic, receiving one stream per partition.
    ///
    /// Only one group per topic is supported in-process.
    pub fn subscribe(
        &self,
        topic: &str,
        group_id: &str,
    ) -> Result<Vec<ChannelPartitionReceiver>, BrokerError> {
        let topic = self.topic(topic)?;

        let mut group = lock(&topic.group);
        if let Some(existing) = group.as_ref() {
            return Err(BrokerError::AlreadySubscribed {
                topic: topic.name.clone(),
                group: existing.clone(),
            });
        }
        *group = Some(group_id.to_string());

        let receivers = topic
            .partitions
            .iter()
            .enumerate()
            .filter_map(|(index, partition)| {
                lock(&partition.receiver)
                    .take()
                    .map(|rx| ChannelPartitionReceiver {
                        topic: topic.name.clone(),
                        partition: index as u32,
                        rx,
                    })
            })
            .collect::<Vec<_>>();

        log::info!(
            "Group '{}' subscribed to '{}' ({} partitions)",
            group_id,
            topic.name,
            receivers.len()
        );
        Ok(receivers)
    }

    /// Stop accepting sends on a topic. Subscribers drain what is buffered,
    /// then see the end of their partition.
    pub fn close(&self, topic: &str) -> Result<(), BrokerError> {
        self.topic(topic)?.close();
        Ok(())
    }

    /// Close every topic
    pub fn close_all(&self) {
        for topic in self.topics.iter() {
            topic.close();
        }
    }

    /// Number of records ever accepted by a topic
    pub fn message_count(&self, topic: &str) -> Option<u64> {
        self.topics.get(topic).map(|t| t.message_count())
    }

    fn topic(&self, name: &str) -> Result<Arc<Topic>, BrokerError> {
        self.topics
            .get(name)
            .map(|t| Arc::clone(t.value()))
            .ok_or_else(|| BrokerError::UnknownTopic(name.to_string()))
    }
}

impl Default for InMemoryBroker {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageQueue for InMemoryBroker {
    fn send(&self, topic: &str, key: &str, payload: Vec<u8>) -> PendingDelivery {
        let Ok(topic) = self.topic(topic) else {
            return PendingDelivery::ready(Err(PublishError::UnknownTopic(topic.to_string())));
        };

        let index = self
            .partitioner
            .partition(key, topic.partitions.len() as u32);
        let result = topic.append(index, key, payload);

        match topic.config.ack_delay {
            Some(delay) => deferred_ack(result, delay),
            None => PendingDelivery::ready(result),
        }
    }

    fn name(&self) -> &str {
        "InMemoryBroker"
    }
}

/// Resolve the acknowledgment after `delay` on the current runtime
fn deferred_ack(result: PublishResult<RecordMetadata>, delay: Duration) -> PendingDelivery {
    let Ok(handle) = tokio::runtime::Handle::try_current() else {
        return PendingDelivery::ready(result);
    };

    let (tx, pending) = PendingDelivery::channel();
    handle.spawn(async move {
        tokio::time::sleep(delay).await;
        let _ = tx.send(result);
    });
    pending
}

/// Ordered stream of one partition, owned by a consumer task
pub struct ChannelPartitionReceiver {
    topic: String,
    partition: u32,
    rx: mpsc::UnboundedReceiver<QueueRecord>,
}

impl ChannelPartitionReceiver {
    pub fn topic(&self) -> &str {
        &self.topic
    }
}

#[async_trait]
impl PartitionReceiver for ChannelPartitionReceiver {
    fn partition(&self) -> u32 {
        self.partition
    }

    async fn recv(&mut self) -> Option<QueueRecord> {
        self.rx.recv().await
    }
}
