//! Error types for the benchmark drivers.

use tsbench_io::IoError;
use tsbench_models::ModelError;

/// Errors that abort a benchmark run.
#[derive(Debug, thiserror::Error)]
pub enum BenchError {
    /// Returned when the shard count is zero.
    #[error("shard count must be at least 1, got {shards}")]
    InvalidShardCount {
        /// The invalid shard count.
        shards: usize,
    },

    /// Returned when the shard index is not below the shard count.
    #[error("shard index {index} out of range for {shards} shards")]
    ShardIndexOutOfRange {
        /// The requested index.
        index: usize,
        /// The shard count.
        shards: usize,
    },

    /// Returned when the inference time budget is zero.
    #[error("inference timeout must be positive")]
    InvalidTimeout,

    /// Returned when a probe shape has zero rows or too few columns.
    #[error("invalid probe shape {rows}x{cols}: need at least 1 row and {min_cols} columns")]
    InvalidProbeShape {
        /// Number of series.
        rows: usize,
        /// Series length.
        cols: usize,
        /// Smallest accepted series length.
        min_cols: usize,
    },

    /// Returned when the probe runs without the counting allocator installed.
    #[error("allocation probe requires CountingAllocator as the global allocator")]
    AllocatorNotInstalled,

    /// Returned when the inference worker thread cannot be spawned.
    #[error("failed to spawn inference worker")]
    SpawnWorker {
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when writing to the driver's output fails.
    #[error("failed to write benchmark output")]
    Output {
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Wraps a dataset loading error.
    #[error("dataset I/O error: {0}")]
    Io(#[from] IoError),

    /// Wraps a model error outside the guarded inference stage.
    #[error("model error: {0}")]
    Model(#[from] ModelError),
}
