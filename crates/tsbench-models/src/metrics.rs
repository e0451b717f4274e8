//! Classification scoring.

use crate::error::ModelError;
use crate::label::ClassLabel;

/// Fraction of predictions equal to the true label.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`ModelError::LabelCountMismatch`] | `y_true` and `y_pred` differ in length |
/// | [`ModelError::EmptyPredictions`] | Both are empty |
pub fn accuracy_score(y_true: &[ClassLabel], y_pred: &[ClassLabel]) -> Result<f64, ModelError> {
    if y_true.len() != y_pred.len() {
        return Err(ModelError::LabelCountMismatch {
            n_series: y_true.len(),
            n_labels: y_pred.len(),
        });
    }
    if y_true.is_empty() {
        return Err(ModelError::EmptyPredictions);
    }
    let correct = y_true.iter().zip(y_pred).filter(|(t, p)| t == p).count();
    Ok(correct as f64 / y_true.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(raw: &[&str]) -> Vec<ClassLabel> {
        raw.iter().map(|s| ClassLabel::new(*s)).collect()
    }

    #[test]
    fn three_of_four_correct() {
        let acc = accuracy_score(&labels(&["a", "b", "a", "c"]), &labels(&["a", "b", "b", "c"])).unwrap();
        assert!((acc - 0.75).abs() < 1e-12);
    }

    #[test]
    fn perfect_and_zero() {
        let t = labels(&["1", "2"]);
        assert_eq!(accuracy_score(&t, &t).unwrap(), 1.0);
        assert_eq!(accuracy_score(&t, &labels(&["2", "1"])).unwrap(), 0.0);
    }

    #[test]
    fn length_mismatch_and_empty_rejected() {
        assert!(matches!(
            accuracy_score(&labels(&["a"]), &labels(&[])),
            Err(ModelError::LabelCountMismatch { .. })
        ));
        assert!(matches!(accuracy_score(&[], &[]), Err(ModelError::EmptyPredictions)));
    }
}
