//! Tradeflow Queue
//!
//! In-process stand-in for the durable queue between the ingest producer
//! and the ingest consumer. Provides:
//! - Named topics split into ordered partitions
//! - Key-hash partitioning (same key, same partition, same order)
//! - Asynchronous send acknowledgments ([`PendingDelivery`](tradeflow_ports::PendingDelivery))
//! - One consumer group per topic, one receiver per partition
//!
//! ## Architecture
//!
//! ```text
//!   Ingest Producer(s)
//!         │ send(topic, key = trade_id, json)
//!    ┌────▼──────────────────────────┐
//!    │ InMemoryBroker                │
//!    │  transactions: [p0][p1][p2].. │
//!    └────┬──────────┬──────────┬────┘
//!         │          │          │   one ChannelPartitionReceiver each
//!    ┌────▼───┐ ┌────▼───┐ ┌────▼───┐
//!    │ task 0 │ │ task 1 │ │ task 2 │  Ingest Consumer
//!    └────────┘ └────────┘ └────────┘
//! ```
//!
//! The producer and consumer only see the [`MessageQueue`](tradeflow_ports::MessageQueue)
//! and [`PartitionReceiver`](tradeflow_ports::PartitionReceiver) ports, so a
//! networked broker can replace this crate without touching either side.

pub mod broker;
pub mod error;
pub mod partitioner;
pub mod topics;

// Re-export commonly used types
pub use broker::{ChannelPartitionReceiver, InMemoryBroker};
pub use error::BrokerError;
pub use partitioner::{KeyHashPartitioner, Partitioner};
pub use topics::{TopicConfig, Topics};
