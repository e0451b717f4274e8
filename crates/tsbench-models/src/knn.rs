//! k-nearest-neighbours classification over DTW distance.
//!
//! Brute-force search with uniform voting. Candidates are pruned with
//! LB_Keogh against precomputed training envelopes, then DTW with early
//! abandoning at the current k-th best distance, so results are identical
//! to an exhaustive scan.

use std::collections::HashMap;

use rayon::prelude::*;
use tracing::{debug, info, instrument};

use tsbench_dtw::{BandConstraint, Dtw, SeriesEnvelope, TimeSeries, TimeSeriesView};

use crate::cancel::CancelFlag;
use crate::error::ModelError;
use crate::label::ClassLabel;
use crate::model::{Inference, Model};
use crate::split::LabeledSplit;

/// Warping window size, resolved against the training series length at fit time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Window {
    /// No band.
    Unconstrained,
    /// Fixed Sakoe-Chiba radius in time steps.
    Radius(usize),
    /// Fraction of the training series length.
    Fraction(f64),
}

/// Configuration for [`KNeighborsClassifier`].
///
/// # Defaults
///
/// | Parameter     | Default         |
/// |---------------|-----------------|
/// | `window`      | `Unconstrained` |
#[derive(Debug, Clone)]
pub struct KnnConfig {
    n_neighbors: usize,
    window: Window,
}

impl KnnConfig {
    /// Create a config voting over `n_neighbors` neighbours.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidNeighborCount`] if `n_neighbors` is zero.
    pub fn new(n_neighbors: usize) -> Result<Self, ModelError> {
        if n_neighbors == 0 {
            return Err(ModelError::InvalidNeighborCount { n_neighbors });
        }
        Ok(Self {
            n_neighbors,
            window: Window::Unconstrained,
        })
    }

    /// Set the warping window.
    #[must_use]
    pub fn with_window(mut self, window: Window) -> Self {
        self.window = window;
        self
    }

    /// Number of neighbours that vote.
    #[must_use]
    pub fn n_neighbors(&self) -> usize {
        self.n_neighbors
    }

    fn resolve(&self, series_len: usize) -> Result<BandConstraint, ModelError> {
        Ok(match self.window {
            Window::Unconstrained => BandConstraint::Unconstrained,
            Window::Radius(r) => BandConstraint::SakoeChibaRadius(r),
            Window::Fraction(f) => BandConstraint::from_window_fraction(f, series_len)?,
        })
    }
}

/// State captured by [`KNeighborsClassifier::fit`].
#[derive(Debug)]
struct Fitted {
    dtw: Dtw,
    series: Vec<TimeSeries>,
    labels: Vec<ClassLabel>,
    envelopes: Vec<SeriesEnvelope>,
}

/// Brute-force k-NN classifier with DTW distance and uniform weights.
#[derive(Debug)]
pub struct KNeighborsClassifier {
    config: KnnConfig,
    fitted: Option<Fitted>,
}

impl KNeighborsClassifier {
    /// Create an unfitted classifier.
    #[must_use]
    pub fn new(config: KnnConfig) -> Self {
        Self { config, fitted: None }
    }

    /// Return the band constraint resolved at fit time, if fitted.
    #[must_use]
    pub fn constraint(&self) -> Option<BandConstraint> {
        self.fitted.as_ref().map(|f| f.dtw.constraint())
    }

    /// Store the training split and precompute candidate envelopes.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`ModelError::EmptyTrainingSet`] | `train` is empty |
    /// | [`ModelError::TooFewTrainingSeries`] | fewer series than `n_neighbors` |
    /// | [`ModelError::Dtw`] | invalid window fraction |
    #[instrument(skip_all, fields(n_train = train.len(), k = self.config.n_neighbors))]
    pub fn fit(&mut self, train: &LabeledSplit) -> Result<(), ModelError> {
        let series_len = train.series_length().ok_or(ModelError::EmptyTrainingSet)?;
        if train.len() < self.config.n_neighbors {
            return Err(ModelError::TooFewTrainingSeries {
                n_neighbors: self.config.n_neighbors,
                n_train: train.len(),
            });
        }

        let constraint = self.config.resolve(series_len)?;
        let envelopes: Vec<SeriesEnvelope> = train
            .series()
            .par_iter()
            .map(|s| SeriesEnvelope::compute(s.as_view(), constraint))
            .collect();

        info!(?constraint, series_len, "k-NN fitted");
        self.fitted = Some(Fitted {
            dtw: Dtw::from_constraint(constraint),
            series: train.series().to_vec(),
            labels: train.labels().to_vec(),
            envelopes,
        });
        Ok(())
    }

    /// Predict a label for each test series in parallel.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`ModelError::NotFitted`] | called before [`fit`][Self::fit] |
    /// | [`ModelError::Cancelled`] | `cancel` raised before all series were classified |
    #[instrument(skip_all, fields(n_test = series.len()))]
    pub fn predict(
        &self,
        series: &[TimeSeries],
        cancel: &CancelFlag,
    ) -> Result<Vec<ClassLabel>, ModelError> {
        let fitted = self.fitted.as_ref().ok_or(ModelError::NotFitted)?;
        let k = self.config.n_neighbors;

        let predictions = series
            .par_iter()
            .map(|query| {
                cancel.check()?;
                let neighbours = nearest(fitted, query.as_view(), k);
                Ok(vote(&neighbours, &fitted.labels))
            })
            .collect::<Result<Vec<_>, ModelError>>()?;

        debug!(n = predictions.len(), "prediction complete");
        Ok(predictions)
    }
}

/// The `k` nearest training indices with their distances, ascending.
fn nearest(fitted: &Fitted, query: TimeSeriesView<'_>, k: usize) -> Vec<(f64, usize)> {
    let mut best: Vec<(f64, usize)> = Vec::with_capacity(k + 1);

    for (idx, (candidate, env)) in fitted.series.iter().zip(&fitted.envelopes).enumerate() {
        let cutoff = if best.len() == k { best[k - 1].0 } else { f64::INFINITY };
        let d = fitted
            .dtw
            .distance_bounded(query, candidate.as_view(), env, cutoff)
            .value();
        if d < cutoff {
            let pos = best.partition_point(|&(bd, _)| bd <= d);
            best.insert(pos, (d, idx));
            best.truncate(k);
        }
    }

    best
}

/// Majority vote with uniform weights. Ties go to the tied label whose
/// closest member is nearest.
fn vote(neighbours: &[(f64, usize)], labels: &[ClassLabel]) -> ClassLabel {
    // label -> (votes, rank of first occurrence)
    let mut tally: HashMap<&ClassLabel, (usize, usize)> = HashMap::new();
    for (rank, &(_, idx)) in neighbours.iter().enumerate() {
        let entry = tally.entry(&labels[idx]).or_insert((0, rank));
        entry.0 += 1;
    }

    tally
        .into_iter()
        .max_by(|(_, (votes_a, rank_a)), (_, (votes_b, rank_b))| {
            votes_a.cmp(votes_b).then(rank_b.cmp(rank_a))
        })
        .map_or_else(|| labels[0].clone(), |(label, _)| label.clone())
}

impl Model for KNeighborsClassifier {
    fn name(&self) -> &'static str {
        "knn-dtw"
    }

    fn fit(&mut self, train: &LabeledSplit) -> Result<(), ModelError> {
        KNeighborsClassifier::fit(self, train)
    }

    fn infer(
        &self,
        _train: &LabeledSplit,
        test: &LabeledSplit,
        cancel: &CancelFlag,
    ) -> Result<Inference, ModelError> {
        self.predict(test.series(), cancel).map(Inference::Labels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn split(rows: &[(&str, Vec<f64>)]) -> LabeledSplit {
        let series = rows.iter().map(|(_, v)| TimeSeries::new(v.clone()).unwrap()).collect();
        let labels = rows.iter().map(|(l, _)| ClassLabel::new(*l)).collect();
        LabeledSplit::new(series, labels).unwrap()
    }

    fn two_class_train() -> LabeledSplit {
        split(&[
            ("low", vec![0.0, 0.1, 0.0, 0.1, 0.0, 0.1]),
            ("low", vec![0.1, 0.0, 0.1, 0.0, 0.1, 0.0]),
            ("high", vec![5.0, 5.1, 5.0, 5.1, 5.0, 5.1]),
            ("high", vec![5.1, 5.0, 5.1, 5.0, 5.1, 5.0]),
        ])
    }

    #[test]
    fn rejects_zero_neighbours() {
        assert!(matches!(KnnConfig::new(0), Err(ModelError::InvalidNeighborCount { .. })));
    }

    #[test]
    fn predict_before_fit_errors() {
        let knn = KNeighborsClassifier::new(KnnConfig::new(1).unwrap());
        let q = vec![TimeSeries::new(vec![1.0]).unwrap()];
        assert!(matches!(knn.predict(&q, &CancelFlag::new()), Err(ModelError::NotFitted)));
    }

    #[test]
    fn one_nn_separates_levels() {
        let mut knn = KNeighborsClassifier::new(KnnConfig::new(1).unwrap().with_window(Window::Radius(1)));
        knn.fit(&two_class_train()).unwrap();
        let test = split(&[
            ("low", vec![0.05; 6]),
            ("high", vec![4.9, 5.0, 5.2, 5.0, 4.9, 5.0]),
        ]);
        let pred = knn.predict(test.series(), &CancelFlag::new()).unwrap();
        assert_eq!(pred, test.labels());
    }

    #[test]
    fn window_fraction_resolves_to_radius() {
        let mut knn = KNeighborsClassifier::new(
            KnnConfig::new(1).unwrap().with_window(Window::Fraction(2.0 / 6.0)),
        );
        knn.fit(&two_class_train()).unwrap();
        assert_eq!(knn.constraint(), Some(BandConstraint::SakoeChibaRadius(2)));
    }

    #[test]
    fn too_few_training_series() {
        let mut knn = KNeighborsClassifier::new(KnnConfig::new(5).unwrap());
        assert!(matches!(
            knn.fit(&two_class_train()),
            Err(ModelError::TooFewTrainingSeries { n_neighbors: 5, n_train: 4 })
        ));
    }

    #[test]
    fn three_nn_majority_vote() {
        let train = split(&[
            ("a", vec![0.0, 0.0, 0.0]),
            ("b", vec![0.5, 0.5, 0.5]),
            ("b", vec![0.6, 0.6, 0.6]),
            ("a", vec![9.0, 9.0, 9.0]),
        ]);
        let mut knn = KNeighborsClassifier::new(KnnConfig::new(3).unwrap());
        knn.fit(&train).unwrap();
        // Nearest three: a(0.0), b(0.5), b(0.6) -> b wins 2 to 1.
        let q = vec![TimeSeries::new(vec![0.1, 0.1, 0.1]).unwrap()];
        let pred = knn.predict(&q, &CancelFlag::new()).unwrap();
        assert_eq!(pred, vec![ClassLabel::new("b")]);
    }

    #[test]
    fn tie_goes_to_nearest_label() {
        let train = split(&[("x", vec![1.0, 1.0]), ("y", vec![3.0, 3.0])]);
        let mut knn = KNeighborsClassifier::new(KnnConfig::new(2).unwrap());
        knn.fit(&train).unwrap();
        let q = vec![TimeSeries::new(vec![2.9, 2.9]).unwrap()];
        assert_eq!(knn.predict(&q, &CancelFlag::new()).unwrap(), vec![ClassLabel::new("y")]);
    }

    #[test]
    fn raised_flag_cancels_prediction() {
        let mut knn = KNeighborsClassifier::new(KnnConfig::new(1).unwrap());
        let train = two_class_train();
        knn.fit(&train).unwrap();
        let cancel = CancelFlag::new();
        cancel.cancel();
        assert!(matches!(knn.predict(train.series(), &cancel), Err(ModelError::Cancelled)));
    }
}
