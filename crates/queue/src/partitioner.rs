//! Key → partition assignment

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Strategy for distributing message keys across partitions
pub trait Partitioner: Send + Sync {
    /// Get the partition index for a key
    fn partition(&self, key: &str, partitions: u32) -> u32;
}

/// Default strategy: stable hash of the key modulo the partition count.
/// Equal keys always map to the same partition.
pub struct KeyHashPartitioner;

impl Partitioner for KeyHashPartitioner {
    fn partition(&self, key: &str, partitions: u32) -> u32 {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        (hasher.finish() % u64::from(partitions.max(1))) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_same_key_same_partition() {
        let p = KeyHashPartitioner;
        let first = p.partition("6f9619ff-8b86-d011-b42d-00c04fc964ff", 4);
        for _ in 0..10 {
            assert_eq!(p.partition("6f9619ff-8b86-d011-b42d-00c04fc964ff", 4), first);
        }
    }

    #[test]
    fn test_partition_in_range_and_spread() {
        let p = KeyHashPartitioner;
        let mut seen = HashSet::new();
        for i in 0..200 {
            let partition = p.partition(&format!("trade-{}", i), 4);
            assert!(partition < 4);
            seen.insert(partition);
        }
        assert_eq!(seen.len(), 4);
    }

    #[test]
    fn test_zero_partitions_does_not_divide_by_zero() {
        assert_eq!(KeyHashPartitioner.partition("k", 0), 0);
    }
}
