//! The benchmarked model families and their fixed hyperparameters.

use tsbench_models::{
    KNeighborsClassifier, KnnConfig, LabeledSplit, MiniRocket, MiniRocketConfig, Model,
    ModelError, Window,
};

/// Warping window radius, in time steps, used by the k-NN benchmark.
const KNN_WINDOW_STEPS: f64 = 10.0;

/// Which model a driver benchmarks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Benchmark {
    /// 1-NN with DTW distance, uniform weights, brute-force search and a
    /// window fraction of `10 / series_length`.
    KnnDtw,
    /// MiniRocket transform with default parameters.
    MiniRocket,
}

impl Benchmark {
    /// Short name used in logs.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::KnnDtw => "knn",
            Self::MiniRocket => "minirocket",
        }
    }

    /// Construct the model for a dataset. Hyperparameters that depend on the
    /// data are derived from `train`.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::EmptyTrainingSet`] for the k-NN benchmark if
    /// `train` is empty, or any configuration error.
    pub fn build(self, train: &LabeledSplit, seed: u64) -> Result<Box<dyn Model>, ModelError> {
        match self {
            Self::KnnDtw => {
                let len = train.series_length().ok_or(ModelError::EmptyTrainingSet)?;
                let config = KnnConfig::new(1)?.with_window(Window::Fraction(KNN_WINDOW_STEPS / len as f64));
                Ok(Box::new(KNeighborsClassifier::new(config)))
            }
            Self::MiniRocket => {
                let config = MiniRocketConfig::default().with_seed(seed);
                Ok(Box::new(MiniRocket::new(config)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use tsbench_dtw::TimeSeries;
    use tsbench_models::ClassLabel;

    use super::*;

    #[test]
    fn builds_named_models() {
        let train = LabeledSplit::new(
            vec![TimeSeries::new(vec![0.0; 40]).unwrap()],
            vec![ClassLabel::new("a")],
        )
        .unwrap();
        assert_eq!(Benchmark::KnnDtw.build(&train, 42).unwrap().name(), "knn-dtw");
        assert_eq!(Benchmark::MiniRocket.build(&train, 42).unwrap().name(), "minirocket");
    }

    #[test]
    fn knn_needs_training_data() {
        let empty = LabeledSplit::new(vec![], vec![]).unwrap();
        assert!(matches!(
            Benchmark::KnnDtw.build(&empty, 42),
            Err(ModelError::EmptyTrainingSet)
        ));
    }
}
