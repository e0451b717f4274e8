//! Round-robin partitioning of the dataset catalog across processes.

use crate::error::BenchError;

/// Shard `index` of `shards`: the items at positions `k` with
/// `k % shards == index`.
///
/// The shards for `index = 0..shards` partition any list: every item lands
/// in exactly one shard and each shard keeps the list's order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchSelector {
    shards: usize,
    index: usize,
}

impl Default for BatchSelector {
    /// A single shard covering everything.
    fn default() -> Self {
        Self { shards: 1, index: 0 }
    }
}

impl BatchSelector {
    /// Create a selector for shard `index` of `shards`.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`BenchError::InvalidShardCount`] | `shards` is zero |
    /// | [`BenchError::ShardIndexOutOfRange`] | `index >= shards` |
    pub fn new(shards: usize, index: usize) -> Result<Self, BenchError> {
        if shards == 0 {
            return Err(BenchError::InvalidShardCount { shards });
        }
        if index >= shards {
            return Err(BenchError::ShardIndexOutOfRange { index, shards });
        }
        Ok(Self { shards, index })
    }

    /// Number of shards.
    #[must_use]
    pub fn shards(&self) -> usize {
        self.shards
    }

    /// This selector's shard index.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Select this shard's items from `items`, preserving order.
    #[must_use]
    pub fn select<T: Clone>(&self, items: &[T]) -> Vec<T> {
        items
            .iter()
            .skip(self.index)
            .step_by(self.shards)
            .cloned()
            .collect()
    }
}
