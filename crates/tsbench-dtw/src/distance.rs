//! DTW distance newtype.

/// A non-negative DTW distance. [`DtwDistance::INFINITY`] marks an abandoned
/// or unreachable alignment.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct DtwDistance(f64);

impl DtwDistance {
    /// Sentinel for abandoned computations.
    pub const INFINITY: Self = Self(f64::INFINITY);

    pub(crate) fn new(value: f64) -> Self {
        Self(value)
    }

    /// Return the raw distance value.
    #[must_use]
    pub fn value(self) -> f64 {
        self.0
    }

    /// Return true unless the computation was abandoned or the band could
    /// not connect the two series.
    #[must_use]
    pub fn is_finite(self) -> bool {
        self.0.is_finite()
    }
}
