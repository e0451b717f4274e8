//! Error types for model construction, fitting and inference.

use tsbench_dtw::DtwError;

/// Errors from the benchmarked models and their evaluation.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// Returned when n_neighbors is zero.
    #[error("n_neighbors must be at least 1, got {n_neighbors}")]
    InvalidNeighborCount {
        /// The invalid n_neighbors value provided.
        n_neighbors: usize,
    },

    /// Returned when a MiniRocket kernel budget cannot hold one feature per base kernel.
    #[error("num_kernels must be at least {min}, got {num_kernels}")]
    InvalidKernelCount {
        /// The requested number of kernels.
        num_kernels: usize,
        /// Smallest accepted value.
        min: usize,
    },

    /// Returned when max_dilations_per_kernel is zero.
    #[error("max_dilations_per_kernel must be at least 1")]
    InvalidMaxDilations,

    /// Returned when fitting on zero series.
    #[error("training split has zero series")]
    EmptyTrainingSet,

    /// Returned when the training split has fewer series than requested neighbours.
    #[error("n_neighbors ({n_neighbors}) exceeds the number of training series ({n_train})")]
    TooFewTrainingSeries {
        /// Requested number of neighbours.
        n_neighbors: usize,
        /// Number of training series available.
        n_train: usize,
    },

    /// Returned when series and labels are not parallel.
    #[error("{n_series} series but {n_labels} labels")]
    LabelCountMismatch {
        /// Number of series.
        n_series: usize,
        /// Number of labels.
        n_labels: usize,
    },

    /// Returned when a series is shorter than the model can process.
    #[error("series {index} has length {len}, need at least {min}")]
    SeriesTooShort {
        /// Zero-based position of the series.
        index: usize,
        /// Its length.
        len: usize,
        /// Minimum accepted length.
        min: usize,
    },

    /// Returned when predict or transform is called before fit.
    #[error("model has not been fitted")]
    NotFitted,

    /// Returned when inference observes a raised [`CancelFlag`](crate::CancelFlag).
    #[error("inference cancelled")]
    Cancelled,

    /// Returned when accuracy is requested over zero predictions.
    #[error("cannot score an empty prediction set")]
    EmptyPredictions,

    /// Wraps a DTW configuration error.
    #[error("DTW error: {0}")]
    Dtw(#[from] DtwError),
}
