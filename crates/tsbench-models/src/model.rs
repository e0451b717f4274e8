//! The call contract between the timed pipeline and a benchmarked model.

use crate::cancel::CancelFlag;
use crate::error::ModelError;
use crate::label::ClassLabel;
use crate::split::LabeledSplit;

/// Output of the inference stage.
#[derive(Debug)]
pub enum Inference {
    /// Predicted labels for the test split, scored by accuracy.
    Labels(Vec<ClassLabel>),
    /// Transformed feature matrices for both splits. Nothing to score.
    Features {
        /// Rows for the training split.
        train: Vec<Vec<f64>>,
        /// Rows for the test split.
        test: Vec<Vec<f64>>,
    },
}

/// A model driven by the benchmark pipeline.
///
/// Implementations are `Send + Sync` so inference can run on a guarded
/// worker thread while the driver waits with a deadline.
pub trait Model: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    /// Train on the training split.
    ///
    /// # Errors
    ///
    /// Model-specific validation failures.
    fn fit(&mut self, train: &LabeledSplit) -> Result<(), ModelError>;

    /// Run inference. Classifiers predict `test`; transformers transform
    /// both splits. Implementations poll `cancel` and return
    /// [`ModelError::Cancelled`] once it is raised.
    ///
    /// # Errors
    ///
    /// [`ModelError::NotFitted`], [`ModelError::Cancelled`], or
    /// model-specific input validation failures.
    fn infer(
        &self,
        train: &LabeledSplit,
        test: &LabeledSplit,
        cancel: &CancelFlag,
    ) -> Result<Inference, ModelError>;
}
