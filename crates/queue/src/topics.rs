//! Topic names and topic settings

use std::time::Duration;

/// Well-known topic names
pub struct Topics;

impl Topics {
    /// Normalized trade messages (producer → consumer)
    pub const TRANSACTIONS: &'static str = "transactions";
}

/// Per-topic settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicConfig {
    /// Number of ordered partitions
    pub partitions: u32,
    /// Delay before a send is acknowledged; `None` acknowledges on enqueue
    pub ack_delay: Option<Duration>,
}

impl Default for TopicConfig {
    fn default() -> Self {
        Self {
            partitions: 4,
            ack_delay: None,
        }
    }
}

impl TopicConfig {
    pub fn with_partitions(mut self, partitions: u32) -> Self {
        self.partitions = partitions;
        self
    }

    pub fn with_ack_delay(mut self, delay: Duration) -> Self {
        self.ack_delay = Some(delay);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topic_config_builders() {
        let config = TopicConfig::default()
            .with_partitions(8)
            .with_ack_delay(Duration::from_millis(2));

        assert_eq!(config.partitions, 8);
        assert_eq!(config.ack_delay, Some(Duration::from_millis(2)));
        assert_eq!(Topics::TRANSACTIONS, "transactions");
    }
}
