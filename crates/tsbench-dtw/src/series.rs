//! Univariate series as they come out of a UCR split row.
//!
//! Validity is checked once, when a [`TimeSeries`] is built. Views can only
//! be borrowed from an owned series, so every [`TimeSeriesView`] handed to
//! the distance code is non-empty and finite without re-checking.

use crate::error::DtwError;

/// Owned series of finite values, at least one step long.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries(Vec<f64>);

impl TimeSeries {
    /// Wrap `values` after checking them.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`DtwError::EmptySeries`] | `values` is empty |
    /// | [`DtwError::NonFiniteValue`] | a value is NaN or infinite; `index` is the first one |
    pub fn new(values: Vec<f64>) -> Result<Self, DtwError> {
        if values.is_empty() {
            return Err(DtwError::EmptySeries);
        }
        match values.iter().position(|v| !v.is_finite()) {
            Some(index) => Err(DtwError::NonFiniteValue { index }),
            None => Ok(Self(values)),
        }
    }

    /// Borrow without copying.
    #[must_use]
    pub fn as_view(&self) -> TimeSeriesView<'_> {
        TimeSeriesView(&self.0)
    }

    /// Number of time steps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Never true for a constructed series.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }
}

impl AsRef<[f64]> for TimeSeries {
    fn as_ref(&self) -> &[f64] {
        &self.0
    }
}

/// Borrowed [`TimeSeries`], `Copy` so it can be passed by value.
#[derive(Debug, Clone, Copy)]
pub struct TimeSeriesView<'a>(&'a [f64]);

impl<'a> TimeSeriesView<'a> {
    /// The values, with the owner's lifetime.
    #[must_use]
    pub fn as_slice(&self) -> &'a [f64] {
        self.0
    }

    /// Number of time steps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Never true; views come from validated series.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_only_row_has_no_series() {
        assert!(matches!(TimeSeries::new(Vec::new()), Err(DtwError::EmptySeries)));
    }

    #[test]
    fn missing_values_are_reported_at_first_gap() {
        // Variable-length UCR sets pad short rows with NaN.
        let padded = vec![0.4, -1.2, 0.9, f64::NAN, f64::NAN];
        assert!(matches!(
            TimeSeries::new(padded),
            Err(DtwError::NonFiniteValue { index: 3 })
        ));
        assert!(matches!(
            TimeSeries::new(vec![f64::NEG_INFINITY]),
            Err(DtwError::NonFiniteValue { index: 0 })
        ));
    }

    #[test]
    fn single_step_series_is_valid() {
        let ts = TimeSeries::new(vec![-0.25]).unwrap();
        assert_eq!(ts.len(), 1);
        assert!(!ts.is_empty());
    }

    #[test]
    fn view_shares_the_owner_values() {
        let ts = TimeSeries::new(vec![1.5, 2.5, 3.5, 4.5]).unwrap();
        let view = ts.as_view();
        assert_eq!(view.len(), ts.len());
        assert!(std::ptr::eq(view.as_slice(), ts.as_ref()));
    }
}
