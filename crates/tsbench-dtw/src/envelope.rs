//! Sakoe-Chiba envelopes and the LB_Keogh lower bound.

use std::collections::VecDeque;

use crate::constraint::BandConstraint;
use crate::series::TimeSeriesView;

/// Precomputed upper and lower envelope of a series.
///
/// `upper[i]` is the maximum of `series[j]` over `|i - j| <= radius` and
/// `lower[i]` the minimum. Unconstrained envelopes are the global extremes.
#[derive(Debug, Clone)]
pub struct SeriesEnvelope {
    upper: Vec<f64>,
    lower: Vec<f64>,
}

impl SeriesEnvelope {
    /// Compute both envelopes in O(n) with monotonic deques.
    #[must_use]
    pub fn compute(series: TimeSeriesView<'_>, constraint: BandConstraint) -> Self {
        let data = series.as_slice();
        let n = data.len();
        let radius = match constraint {
            BandConstraint::Unconstrained => n,
            BandConstraint::SakoeChibaRadius(r) => r,
        };

        let mut upper = Vec::with_capacity(n);
        let mut lower = Vec::with_capacity(n);

        // Front of `maxq` holds the window maximum, front of `minq` the minimum.
        let mut maxq: VecDeque<usize> = VecDeque::new();
        let mut minq: VecDeque<usize> = VecDeque::new();
        let mut next = 0usize;

        for i in 0..n {
            let hi = (i + radius).min(n - 1);
            while next <= hi {
                while maxq.back().is_some_and(|&k| data[k] <= data[next]) {
                    maxq.pop_back();
                }
                maxq.push_back(next);
                while minq.back().is_some_and(|&k| data[k] >= data[next]) {
                    minq.pop_back();
                }
                minq.push_back(next);
                next += 1;
            }

            let lo = i.saturating_sub(radius);
            while maxq.front().is_some_and(|&k| k < lo) {
                maxq.pop_front();
            }
            while minq.front().is_some_and(|&k| k < lo) {
                minq.pop_front();
            }

            // Index `i` is always inside its own window, so both fronts exist.
            upper.push(maxq.front().map_or(data[i], |&k| data[k]));
            lower.push(minq.front().map_or(data[i], |&k| data[k]));
        }

        Self { upper, lower }
    }

    /// Upper envelope values.
    #[must_use]
    pub fn upper(&self) -> &[f64] {
        &self.upper
    }

    /// Lower envelope values.
    #[must_use]
    pub fn lower(&self) -> &[f64] {
        &self.lower
    }

    /// Length of the enveloped series.
    #[must_use]
    pub fn len(&self) -> usize {
        self.upper.len()
    }

    /// True if the envelope is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.upper.is_empty()
    }
}

/// LB_Keogh lower bound of DTW(`query`, candidate) given the candidate's envelope.
///
/// Accumulates the squared distance from each query point to the nearest
/// envelope boundary when it falls outside, and returns the square root.
/// Valid (`<= dtw`) for equal-length series under the same band.
#[must_use]
pub fn lb_keogh(query: &[f64], envelope: &SeriesEnvelope) -> f64 {
    let n = query.len().min(envelope.len());
    query[..n]
        .iter()
        .zip(envelope.upper[..n].iter().zip(&envelope.lower[..n]))
        .map(|(&q, (&u, &l))| {
            if q > u {
                (q - u).powi(2)
            } else if q < l {
                (l - q).powi(2)
            } else {
                0.0
            }
        })
        .sum::<f64>()
        .sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::dtw::Dtw;
    use crate::series::TimeSeries;

    #[test]
    fn lb_keogh_never_exceeds_dtw() {
        let constraint = BandConstraint::SakoeChibaRadius(2);
        let dtw = Dtw::from_constraint(constraint);
        let pairs = [
            (vec![1.0, 2.0, 3.0, 4.0, 5.0], vec![5.0, 4.0, 3.0, 2.0, 1.0]),
            (vec![0.0, 0.0, 0.0, 0.0], vec![1.0, 2.0, 3.0, 4.0]),
            (vec![1.0, 3.0, 2.0, 5.0, 4.0], vec![2.0, 1.0, 4.0, 3.0, 6.0]),
        ];
        for (q, c) in pairs {
            let q_ts = TimeSeries::new(q.clone()).unwrap();
            let c_ts = TimeSeries::new(c.clone()).unwrap();
            let env = SeriesEnvelope::compute(c_ts.as_view(), constraint);
            let lb = lb_keogh(&q, &env);
            let d = dtw.distance(q_ts.as_view(), c_ts.as_view()).value();
            assert!(lb <= d + 1e-9, "lb {lb} > dtw {d} for {q:?} vs {c:?}");
        }
    }

    #[test]
    fn envelope_window_extremes() {
        let data = vec![3.0, 1.0, 4.0, 1.0, 5.0, 9.0, 2.0, 6.0];
        let ts = TimeSeries::new(data).unwrap();
        let env = SeriesEnvelope::compute(ts.as_view(), BandConstraint::SakoeChibaRadius(1));
        assert_eq!(env.upper(), &[3.0, 4.0, 4.0, 5.0, 9.0, 9.0, 9.0, 6.0]);
        assert_eq!(env.lower(), &[1.0, 1.0, 1.0, 1.0, 1.0, 2.0, 2.0, 2.0]);
    }

    #[test]
    fn unconstrained_envelope_is_global() {
        let ts = TimeSeries::new(vec![3.0, -1.0, 4.0, 7.0]).unwrap();
        let env = SeriesEnvelope::compute(ts.as_view(), BandConstraint::Unconstrained);
        assert!(env.upper().iter().all(|&u| u == 7.0));
        assert!(env.lower().iter().all(|&l| l == -1.0));
    }

    #[test]
    fn identical_series_bound_is_zero() {
        let data = vec![1.0, 2.0, 3.0, 2.0, 1.0];
        let ts = TimeSeries::new(data.clone()).unwrap();
        let env = SeriesEnvelope::compute(ts.as_view(), BandConstraint::SakoeChibaRadius(0));
        assert_eq!(lb_keogh(&data, &env), 0.0);
    }
}
