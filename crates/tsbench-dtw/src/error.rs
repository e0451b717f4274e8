//! Error types for time series validation and band configuration.

/// Errors from time series validation and DTW configuration.
#[derive(Debug, thiserror::Error)]
pub enum DtwError {
    /// Returned when an empty slice is provided as a time series.
    #[error("time series must be non-empty")]
    EmptySeries,

    /// Returned when a time series contains NaN, infinity, or negative infinity.
    #[error("time series contains non-finite value at index {index}")]
    NonFiniteValue {
        /// Position of the first non-finite value found.
        index: usize,
    },

    /// Returned when a warping window fraction is negative or not finite.
    #[error("window fraction must be finite and non-negative, got {fraction}")]
    InvalidWindowFraction {
        /// The rejected fraction.
        fraction: f64,
    },
}
