//! DTW distance computation.

use tracing::instrument;

use crate::constraint::BandConstraint;
use crate::distance::DtwDistance;
use crate::envelope::{SeriesEnvelope, lb_keogh};
use crate::series::TimeSeriesView;

/// Immutable DTW configuration. Thread-safe and copyable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dtw {
    constraint: BandConstraint,
}

impl Dtw {
    /// Create an unconstrained DTW calculator.
    #[must_use]
    pub fn unconstrained() -> Self {
        Self::from_constraint(BandConstraint::Unconstrained)
    }

    /// Create a DTW calculator with a Sakoe-Chiba band of the given radius.
    #[must_use]
    pub fn with_sakoe_chiba(radius: usize) -> Self {
        Self::from_constraint(BandConstraint::SakoeChibaRadius(radius))
    }

    /// Create a DTW calculator from an existing [`BandConstraint`].
    #[must_use]
    pub fn from_constraint(constraint: BandConstraint) -> Self {
        Self { constraint }
    }

    /// Return the band constraint configuration.
    #[must_use]
    pub fn constraint(&self) -> BandConstraint {
        self.constraint
    }

    /// Compute the DTW distance between two time series.
    ///
    /// Local cost is the squared difference; the returned distance is the
    /// square root of the accumulated cost along the optimal path. Returns
    /// [`DtwDistance::INFINITY`] when the band cannot connect the two corners
    /// (series lengths differ by more than the radius).
    #[must_use]
    pub fn distance(&self, a: TimeSeriesView<'_>, b: TimeSeriesView<'_>) -> DtwDistance {
        DtwDistance::new(self.rolling(a.as_slice(), b.as_slice(), None))
    }

    /// Compute DTW distance with early abandoning.
    ///
    /// If the distance would exceed `cutoff`, returns [`DtwDistance::INFINITY`]
    /// without completing the computation. Any finite result equals
    /// `self.distance(a, b)`.
    #[must_use]
    #[instrument(level = "trace", skip(self, a, b))]
    pub fn distance_with_cutoff(
        &self,
        a: TimeSeriesView<'_>,
        b: TimeSeriesView<'_>,
        cutoff: f64,
    ) -> DtwDistance {
        let cutoff_sq = cutoff * cutoff;
        DtwDistance::new(self.rolling(a.as_slice(), b.as_slice(), Some(cutoff_sq)))
    }

    /// Compute DTW distance against a candidate whose envelope is precomputed.
    ///
    /// LB_Keogh of `query` against `candidate_envelope` is checked first and
    /// the candidate is rejected with [`DtwDistance::INFINITY`] if the bound
    /// reaches `cutoff`. The bound is only applied to equal-length pairs, where
    /// it is valid. Survivors go through [`distance_with_cutoff`][Self::distance_with_cutoff].
    ///
    /// With `cutoff = f64::INFINITY` this is equivalent to [`distance`][Self::distance].
    #[must_use]
    pub fn distance_bounded(
        &self,
        query: TimeSeriesView<'_>,
        candidate: TimeSeriesView<'_>,
        candidate_envelope: &SeriesEnvelope,
        cutoff: f64,
    ) -> DtwDistance {
        if query.len() == candidate_envelope.len()
            && lb_keogh(query.as_slice(), candidate_envelope) >= cutoff
        {
            return DtwDistance::INFINITY;
        }
        if cutoff.is_finite() {
            self.distance_with_cutoff(query, candidate, cutoff)
        } else {
            self.distance(query, candidate)
        }
    }

    /// Two-row rolling DTW over the band, returning the distance (not squared).
    ///
    /// Rows are full-width buffers indexed by column; only cells inside the
    /// current and previous row's band are ever read, so stale values left by
    /// the buffer swap are never observed.
    ///
    /// With `cutoff_sq = Some(c)`, abandons as soon as the minimum of a
    /// non-final row exceeds `c`: every path crosses every row once, so the
    /// row minimum is a lower bound on the final cost. The last row is checked
    /// at the end cell only.
    fn rolling(&self, a: &[f64], b: &[f64], cutoff_sq: Option<f64>) -> f64 {
        let n = a.len();
        let m = b.len();
        if !self.constraint.admits(n, m) {
            return f64::INFINITY;
        }

        let mut prev = vec![f64::INFINITY; m];
        let mut curr = vec![f64::INFINITY; m];
        let mut prev_range = 0..0;

        for (i, &ai) in a.iter().enumerate() {
            let range = self.constraint.column_range(i, m);
            let mut row_min = f64::INFINITY;

            for j in range.clone() {
                let cost = (ai - b[j]).powi(2);
                let best = if i == 0 && j == 0 {
                    0.0
                } else {
                    let left = if j > range.start { curr[j - 1] } else { f64::INFINITY };
                    let above = if prev_range.contains(&j) { prev[j] } else { f64::INFINITY };
                    let diag = if j > 0 && prev_range.contains(&(j - 1)) {
                        prev[j - 1]
                    } else {
                        f64::INFINITY
                    };
                    left.min(above).min(diag)
                };
                let acc = cost + best;
                curr[j] = acc;
                row_min = row_min.min(acc);
            }

            if let Some(c) = cutoff_sq
                && i + 1 < n
                && row_min > c
            {
                return f64::INFINITY;
            }

            std::mem::swap(&mut prev, &mut curr);
            prev_range = range;
        }

        let final_sq = prev[m - 1];
        if let Some(c) = cutoff_sq
            && final_sq > c
        {
            return f64::INFINITY;
        }
        final_sq.sqrt()
    }
}
