//! Error types for the queue crate

use thiserror::Error;

/// Broker administration errors (topic management and subscription)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BrokerError {
    #[error("Unknown topic: {0}")]
    UnknownTopic(String),

    #[error("Topic already exists: {0}")]
    TopicExists(String),

    #[error("Topic {topic} already has a consumer group ({group})")]
    AlreadySubscribed { topic: String, group: String },

    #[error("Invalid topic configuration: {0}")]
    InvalidConfig(String),
}
