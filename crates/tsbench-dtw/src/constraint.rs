//! Warping window constraints.

use std::ops::Range;

use crate::error::DtwError;

/// Constraint on the DTW warping window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BandConstraint {
    /// Full cost matrix.
    #[default]
    Unconstrained,

    /// Sakoe-Chiba band: cell (i,j) is valid only if |i - j| <= radius.
    SakoeChibaRadius(usize),
}

impl BandConstraint {
    /// Build a Sakoe-Chiba band from a window expressed as a fraction of the
    /// series length. The radius is `round(fraction * series_len)`.
    ///
    /// A fraction of `10.0 / len` therefore yields a radius of 10 steps.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`DtwError::InvalidWindowFraction`] | `fraction` is negative, NaN or infinite |
    pub fn from_window_fraction(fraction: f64, series_len: usize) -> Result<Self, DtwError> {
        if !fraction.is_finite() || fraction < 0.0 {
            return Err(DtwError::InvalidWindowFraction { fraction });
        }
        let radius = (fraction * series_len as f64).round() as usize;
        Ok(Self::SakoeChibaRadius(radius))
    }

    /// Return the valid column range for a given row in the cost matrix.
    #[must_use]
    pub fn column_range(&self, row: usize, n_cols: usize) -> Range<usize> {
        match self {
            Self::Unconstrained => 0..n_cols,
            Self::SakoeChibaRadius(r) => {
                let start = row.saturating_sub(*r);
                let end = (row + r + 1).min(n_cols);
                start..end
            }
        }
    }

    /// Return true if a warping path from `(0, 0)` to `(n-1, m-1)` exists
    /// under this constraint.
    #[must_use]
    pub fn admits(&self, n: usize, m: usize) -> bool {
        match self {
            Self::Unconstrained => true,
            Self::SakoeChibaRadius(r) => n.abs_diff(m) <= *r,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sakoe_chiba_clips_at_edges() {
        let c = BandConstraint::SakoeChibaRadius(2);
        assert_eq!(c.column_range(0, 10), 0..3);
        assert_eq!(c.column_range(5, 10), 3..8);
        assert_eq!(c.column_range(9, 10), 7..10);
    }

    #[test]
    fn unconstrained_full_range() {
        assert_eq!(BandConstraint::Unconstrained.column_range(4, 10), 0..10);
    }

    #[test]
    fn window_fraction_of_ten_steps() {
        for len in [24usize, 96, 140, 1639] {
            let c = BandConstraint::from_window_fraction(10.0 / len as f64, len).unwrap();
            assert_eq!(c, BandConstraint::SakoeChibaRadius(10), "len {len}");
        }
    }

    #[test]
    fn window_fraction_rejects_negative_and_nan() {
        assert!(matches!(
            BandConstraint::from_window_fraction(-0.1, 100),
            Err(DtwError::InvalidWindowFraction { .. })
        ));
        assert!(BandConstraint::from_window_fraction(f64::NAN, 100).is_err());
    }

    #[test]
    fn band_admits_only_reachable_corner() {
        let c = BandConstraint::SakoeChibaRadius(1);
        assert!(c.admits(5, 6));
        assert!(!c.admits(5, 7));
        assert!(BandConstraint::Unconstrained.admits(1, 100));
    }
}
