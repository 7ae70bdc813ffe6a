//! Ingest consumer
//!
//! One task per assigned partition. Each record is decoded into a staged
//! row and handed to the [`StoreWriter`]. Failures are logged and counted,
//! never retried, and never stop the partition.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::task::JoinHandle;
use tradeflow_core::IngestMessage;
use tradeflow_ports::{PartitionReceiver, QueueRecord};

use crate::store_writer::{StoreWriter, WriteOutcome};

/// What happened to one consumed record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsumeOutcome {
    Stored,
    Duplicate,
    DecodeFailed,
    StoreFailed,
}

/// Running counters, shared by all partition tasks
#[derive(Debug, Default)]
pub struct ConsumerStats {
    received: AtomicU64,
    stored: AtomicU64,
    duplicates: AtomicU64,
    decode_failures: AtomicU64,
    store_failures: AtomicU64,
}

/// Point-in-time copy of [`ConsumerStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConsumerStatsSnapshot {
    pub received: u64,
    pub stored: u64,
    pub duplicates: u64,
    pub decode_failures: u64,
    pub store_failures: u64,
}

impl ConsumerStats {
    pub fn snapshot(&self) -> ConsumerStatsSnapshot {
        ConsumerStatsSnapshot {
            received: self.received.load(Ordering::Relaxed),
            stored: self.stored.load(Ordering::Relaxed),
            duplicates: self.duplicates.load(Ordering::Relaxed),
            decode_failures: self.decode_failures.load(Ordering::Relaxed),
            store_failures: self.store_failures.load(Ordering::Relaxed),
        }
    }

    fn record(&self, outcome: ConsumeOutcome) {
        let counter = match outcome {
            ConsumeOutcome::Stored => &self.stored,
            ConsumeOutcome::Duplicate => &self.duplicates,
            ConsumeOutcome::DecodeFailed => &self.decode_failures,
            ConsumeOutcome::StoreFailed => &self.store_failures,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

impl ConsumerStatsSnapshot {
    /// Records that did not end up staged by this delivery
    pub fn lost(&self) -> u64 {
        self.decode_failures + self.store_failures
    }
}

pub struct IngestConsumer {
    writer: StoreWriter,
    stats: ConsumerStats,
}

impl IngestConsumer {
    pub fn new(writer: StoreWriter) -> Self {
        Self {
            writer,
            stats: ConsumerStats::default(),
        }
    }

    pub fn stats(&self) -> ConsumerStatsSnapshot {
        self.stats.snapshot()
    }

    /// Decode and stage one record
    pub async fn handle(&self, record: &QueueRecord) -> ConsumeOutcome {
        self.stats.received.fetch_add(1, Ordering::Relaxed);
        log::debug!(
            "Consumed {}[{}] offset {} key {}",
            record.topic,
            record.partition,
            record.offset,
            record.key
        );

        let decoded =
            IngestMessage::from_bytes(&record.payload).and_then(IngestMessage::into_staged_row);
        let outcome = match decoded {
            Ok(row) => match self.writer.write(&row).await {
                WriteOutcome::Inserted => ConsumeOutcome::Stored,
                WriteOutcome::Duplicate => ConsumeOutcome::Duplicate,
                WriteOutcome::Failed => ConsumeOutcome::StoreFailed,
            },
            Err(e) => {
                log::warn!(
                    "Dropping undecodable message {}[{}] offset {}: {}",
                    record.topic,
                    record.partition,
                    record.offset,
                    e
                );
                ConsumeOutcome::DecodeFailed
            }
        };

        self.stats.record(outcome);
        outcome
    }

    /// Start one task per partition. Each task ends when its partition is
    /// closed and drained, returning the number of records it handled.
    pub fn spawn<R>(self: &Arc<Self>, receivers: Vec<R>) -> ConsumerGroup
    where
        R: PartitionReceiver + 'static,
    {
        let handles = receivers
            .into_iter()
            .map(|mut rx| {
                let consumer = Arc::clone(self);
                tokio::spawn(async move {
                    let partition = rx.partition();
                    log::info!("Consumer started on partition {}", partition);
                    let mut handled = 0u64;
                    while let Some(record) = rx.recv().await {
                        consumer.handle(&record).await;
                        handled += 1;
                    }
                    log::info!(
                        "Partition {} drained after {} records",
                        partition,
                        handled
                    );
                    handled
                })
            })
            .collect();

        ConsumerGroup {
            consumer: Arc::clone(self),
            handles,
        }
    }
}

/// Running partition tasks of one consumer
pub struct ConsumerGroup {
    consumer: Arc<IngestConsumer>,
    handles: Vec<JoinHandle<u64>>,
}

impl ConsumerGroup {
    pub fn partitions(&self) -> usize {
        self.handles.len()
    }

    pub fn stats(&self) -> ConsumerStatsSnapshot {
        self.consumer.stats()
    }

    /// Wait for every partition to drain. Close the topic first.
    pub async fn join(self) -> ConsumerStatsSnapshot {
        for handle in self.handles {
            if let Err(e) = handle.await {
                log::error!("Consumer task failed: {}", e);
            }
        }
        self.consumer.stats()
    }
}
