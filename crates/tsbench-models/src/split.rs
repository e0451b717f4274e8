//! Labelled train/test split.

use tsbench_dtw::TimeSeries;

use crate::error::ModelError;
use crate::label::ClassLabel;

/// One split of a classification dataset: series and their labels, stored
/// as parallel vectors (`labels[i]` belongs to `series[i]`).
#[derive(Debug, Clone)]
pub struct LabeledSplit {
    series: Vec<TimeSeries>,
    labels: Vec<ClassLabel>,
}

impl LabeledSplit {
    /// Pair series with labels.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::LabelCountMismatch`] if the vectors differ in length.
    pub fn new(series: Vec<TimeSeries>, labels: Vec<ClassLabel>) -> Result<Self, ModelError> {
        if series.len() != labels.len() {
            return Err(ModelError::LabelCountMismatch {
                n_series: series.len(),
                n_labels: labels.len(),
            });
        }
        Ok(Self { series, labels })
    }

    /// The series, in archive order.
    #[must_use]
    pub fn series(&self) -> &[TimeSeries] {
        &self.series
    }

    /// The labels, parallel to [`series`][Self::series].
    #[must_use]
    pub fn labels(&self) -> &[ClassLabel] {
        &self.labels
    }

    /// Number of series.
    #[must_use]
    pub fn len(&self) -> usize {
        self.series.len()
    }

    /// True if the split holds no series.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Length of the first series, the value classifier hyperparameters are
    /// derived from. `None` for an empty split.
    #[must_use]
    pub fn series_length(&self) -> Option<usize> {
        self.series.first().map(TimeSeries::len)
    }
}
