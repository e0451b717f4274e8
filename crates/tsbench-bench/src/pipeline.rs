//! The per-dataset timed pipeline and the batch loop around it.
//!
//! Output contract, per dataset (one line each, flushed immediately):
//!
//! ```text
//! GunPoint
//!   0.000001 seconds      <- filter
//!   0.0213 seconds        <- load
//!   0.0000021 seconds     <- construct
//!   0.0031 seconds        <- fit
//!   1.274 seconds         <- predict, or "-1" if the guard fired
//! 0.9133333333333333      <- accuracy, "0.0" for transformers and sentinels
//! ```
//!
//! The lap timer restarts after each line so printing is not charged to
//! the next stage.

use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, instrument, warn};
use tsbench_io::{CorpusProvider, DatasetName};
use tsbench_models::{Inference, LabeledSplit, Model, ModelError, accuracy_score};

use crate::benchmark::Benchmark;
use crate::error::BenchError;
use crate::guard::{GuardOutcome, TimeoutGuard};
use crate::stage::{DatasetResult, Stage, StageRecord, Stopwatch};

/// Line printed after the warm-up run.
const WARMUP_DONE: &str = "Precompilation done.";

/// Configuration for [`TimedPipeline`].
///
/// # Defaults
///
/// | Parameter | Default |
/// |-----------|---------|
/// | `timeout` | 180 s   |
/// | `warmup`  | `true`  |
/// | `seed`    | 42      |
#[derive(Debug, Clone, Copy)]
pub struct PipelineConfig {
    guard: TimeoutGuard,
    warmup: bool,
    seed: u64,
}

impl PipelineConfig {
    /// Create a config with the given inference budget.
    ///
    /// # Errors
    ///
    /// Returns [`BenchError::InvalidTimeout`] if `timeout` is zero.
    pub fn new(timeout: Duration) -> Result<Self, BenchError> {
        Ok(Self {
            guard: TimeoutGuard::new(timeout)?,
            warmup: true,
            seed: 42,
        })
    }

    /// Enable or disable the untimed warm-up run.
    #[must_use]
    pub fn with_warmup(mut self, warmup: bool) -> Self {
        self.warmup = warmup;
        self
    }

    /// Seed passed to models that sample.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// The inference budget.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.guard.budget()
    }
}

type ModelBuilder<'a> = dyn Fn(&LabeledSplit) -> Result<Box<dyn Model>, ModelError> + 'a;

/// Runs datasets through load, construct, fit, guarded predict and
/// evaluate, printing the stage log.
pub struct TimedPipeline<'a> {
    provider: &'a dyn CorpusProvider,
    build: Box<ModelBuilder<'a>>,
    config: PipelineConfig,
}

impl<'a> TimedPipeline<'a> {
    /// Pipeline for one of the benchmarked model families.
    #[must_use]
    pub fn new(
        provider: &'a dyn CorpusProvider,
        benchmark: Benchmark,
        config: PipelineConfig,
    ) -> Self {
        let seed = config.seed;
        Self::with_builder(provider, config, move |train| benchmark.build(train, seed))
    }

    /// Pipeline with a custom model constructor, called once per dataset
    /// with its training split.
    #[must_use]
    pub fn with_builder(
        provider: &'a dyn CorpusProvider,
        config: PipelineConfig,
        build: impl Fn(&LabeledSplit) -> Result<Box<dyn Model>, ModelError> + 'a,
    ) -> Self {
        Self {
            provider,
            build: Box::new(build),
            config,
        }
    }

    /// Run every dataset in order, preceded by a warm-up run on the first
    /// one unless disabled.
    ///
    /// # Errors
    ///
    /// The first [`BenchError`] from any dataset, warm-up included.
    #[instrument(skip_all, fields(n_datasets = names.len()))]
    pub fn run_batch(
        &self,
        names: &[DatasetName],
        out: &mut dyn Write,
    ) -> Result<Vec<DatasetResult>, BenchError> {
        if self.config.warmup
            && let Some(&first) = names.first()
        {
            info!(dataset = %first, "warm-up run");
            self.run_dataset(first, &mut io::sink())?;
            emit(out, format_args!("{WARMUP_DONE}"))?;
        }

        let mut results = Vec::with_capacity(names.len());
        for &name in names {
            results.push(self.run_dataset(name, out)?);
        }

        let n_sentinel = results.iter().filter(|r| r.sentinel).count();
        info!(n_done = results.len(), n_sentinel, "batch complete");
        Ok(results)
    }

    /// Run one dataset through all stages.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`BenchError::Io`] | loading either split failed |
    /// | [`BenchError::Model`] | construction, fit or scoring failed |
    /// | [`BenchError::SpawnWorker`] | the inference thread could not start |
    /// | [`BenchError::Output`] | writing to `out` failed |
    ///
    /// Inference failures, panics and timeouts are not errors: they print
    /// the sentinel and set [`DatasetResult::sentinel`].
    #[instrument(skip(self, out), fields(dataset = %name))]
    pub fn run_dataset(
        &self,
        name: DatasetName,
        out: &mut dyn Write,
    ) -> Result<DatasetResult, BenchError> {
        let mut stages = StageRecord::default();
        emit(out, format_args!("{name}"))?;
        let mut sw = Stopwatch::start();

        // Selection happened before the batch started.
        record(out, &mut sw, &mut stages, Stage::Filter)?;

        let (train, test) = self.provider.load_pair(name)?;
        record(out, &mut sw, &mut stages, Stage::Load)?;

        let mut model = (self.build)(&train)?;
        record(out, &mut sw, &mut stages, Stage::Construct)?;

        model.fit(&train)?;
        record(out, &mut sw, &mut stages, Stage::Fit)?;

        let model: Arc<dyn Model> = Arc::from(model);
        let train = Arc::new(train);
        let test = Arc::new(test);
        let outcome = {
            let (model, train, test) = (Arc::clone(&model), Arc::clone(&train), Arc::clone(&test));
            self.config
                .guard
                .run(move |cancel| model.infer(&train, &test, cancel))?
        };

        let (accuracy, sentinel) = match outcome {
            GuardOutcome::Completed(inference) => {
                record(out, &mut sw, &mut stages, Stage::Predict)?;
                let accuracy = match inference {
                    Inference::Labels(pred) => accuracy_score(test.labels(), &pred)?,
                    Inference::Features { .. } => 0.0,
                };
                (accuracy, false)
            }
            other => {
                warn!(reason = ?other, "inference did not complete, reporting sentinel");
                emit(out, format_args!("-1"))?;
                (0.0, true)
            }
        };
        emit(out, format_args!("{accuracy:?}"))?;

        info!(model = model.name(), accuracy, sentinel, "dataset done");
        Ok(DatasetResult {
            name,
            stages,
            accuracy,
            sentinel,
        })
    }
}

/// Record the lap for `stage`, print it, and restart the clock after printing.
fn record(
    out: &mut dyn Write,
    sw: &mut Stopwatch,
    stages: &mut StageRecord,
    stage: Stage,
) -> Result<(), BenchError> {
    let elapsed = sw.lap();
    debug!(%stage, secs = elapsed.as_secs_f64(), "stage done");
    stages.push(stage, elapsed);
    emit(out, format_args!("  {} seconds", elapsed.as_secs_f64()))?;
    sw.restart();
    Ok(())
}

pub(crate) fn emit(out: &mut dyn Write, line: std::fmt::Arguments<'_>) -> Result<(), BenchError> {
    writeln!(out, "{line}")
        .and_then(|()| out.flush())
        .map_err(|e| BenchError::Output { source: e })
}
