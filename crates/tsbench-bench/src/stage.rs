//! Pipeline stages and their recorded durations.

use std::fmt;
use std::time::{Duration, Instant};

use tsbench_io::DatasetName;

/// One phase of the per-dataset pipeline, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Dataset selection. Nothing to do per dataset; kept so logs have a
    /// fixed shape.
    Filter,
    /// Loading the train and test splits.
    Load,
    /// Constructing the model.
    Construct,
    /// Fitting on the training split.
    Fit,
    /// Guarded inference.
    Predict,
    /// Scoring predictions. Produces the accuracy line, not a duration.
    Evaluate,
}

impl Stage {
    /// Column name used in summaries.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Filter => "filter_datasets",
            Self::Load => "load_data",
            Self::Construct => "create_model",
            Self::Fit => "fit",
            Self::Predict => "predict",
            Self::Evaluate => "accuracy",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lap timer: each [`lap`][Self::lap] returns the time since the previous
/// lap (or construction) and restarts.
#[derive(Debug)]
pub struct Stopwatch {
    last: Instant,
}

impl Stopwatch {
    /// Start timing now.
    #[must_use]
    pub fn start() -> Self {
        Self {
            last: Instant::now(),
        }
    }

    /// Elapsed time since the previous lap, restarting the clock.
    pub fn lap(&mut self) -> Duration {
        let now = Instant::now();
        let elapsed = now - self.last;
        self.last = now;
        elapsed
    }

    /// Restart the clock without reporting.
    pub fn restart(&mut self) {
        self.last = Instant::now();
    }
}

/// Ordered stage durations of one dataset run.
#[derive(Debug, Clone, Default)]
pub struct StageRecord {
    entries: Vec<(Stage, Duration)>,
}

impl StageRecord {
    pub(crate) fn push(&mut self, stage: Stage, elapsed: Duration) {
        self.entries.push((stage, elapsed));
    }

    /// Duration of `stage`, if it was recorded.
    #[must_use]
    pub fn get(&self, stage: Stage) -> Option<Duration> {
        self.entries
            .iter()
            .find(|(s, _)| *s == stage)
            .map(|&(_, d)| d)
    }

    /// All recorded entries in execution order.
    #[must_use]
    pub fn entries(&self) -> &[(Stage, Duration)] {
        &self.entries
    }
}

/// Outcome of one dataset run.
#[derive(Debug, Clone)]
pub struct DatasetResult {
    /// The dataset.
    pub name: DatasetName,
    /// Stage durations. `Predict` is absent when the guard fired.
    pub stages: StageRecord,
    /// Test accuracy; `0.0` for transformers and sentinel runs.
    pub accuracy: f64,
    /// True if inference did not complete and the sentinel was printed.
    pub sentinel: bool,
}
