//! Benchmark drivers for the tsbench models.
//!
//! A driver selects its shard of the dataset catalog with
//! [`BatchSelector`], then runs each dataset through a [`TimedPipeline`]:
//! load, construct, fit, guarded inference and evaluation, printing one
//! duration line per stage. Inference runs under a [`TimeoutGuard`] and a
//! blown budget is reported with a sentinel instead of aborting the batch.
//!
//! [`run_probe`] measures allocation counts of MiniRocket fit and transform
//! across a sweep of input shapes. It needs [`CountingAllocator`] installed
//! as the process's global allocator.

mod alloc;
mod benchmark;
mod error;
mod guard;
mod pipeline;
mod probe;
mod shard;
mod stage;

pub use alloc::{AllocDelta, AllocSnapshot, CountingAllocator};
pub use benchmark::Benchmark;
pub use error::BenchError;
pub use guard::{GuardOutcome, TimeoutGuard};
pub use pipeline::{PipelineConfig, TimedPipeline};
pub use probe::{DEFAULT_COLS, DEFAULT_ROWS, ProbeConfig, ProbeRow, run_probe};
pub use shard::BatchSelector;
pub use stage::{DatasetResult, Stage, StageRecord, Stopwatch};
