//! Tensor splitting: name classification and shard partitioning.

pub mod classify;
pub mod partition;

pub use classify::{classify, SplitAxis, SplitRule, SPLIT_RULES};
pub use partition::{partition, reassemble, split_ranges, ShardDescriptor};
