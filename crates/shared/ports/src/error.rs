use thiserror::Error;

/// Errors surfaced by a queue when a message could not be accepted
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PublishError {
    #[error("Unknown topic: {0}")]
    UnknownTopic(String),

    #[error("Partition {partition} of topic {topic} is full")]
    QueueFull { topic: String, partition: u32 },

    #[error("Topic {0} is closed")]
    Closed(String),

    #[error("Delivery acknowledgment lost")]
    AckLost,

    #[error("Serialization failed: {0}")]
    Serialization(String),
}

/// Errors surfaced by the staging store
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Store connection failed: {0}")]
    Connection(String),

    #[error("Insert of trade {trade_id} failed: {message}")]
    Insert { trade_id: String, message: String },

    #[error("Store task failed: {0}")]
    Task(String),
}

pub type PublishResult<T> = std::result::Result<T, PublishError>;
pub type StoreResult<T> = std::result::Result<T, StoreError>;
