//! Models exercised by the benchmark drivers.
//!
//! Provides a k-nearest-neighbours classifier over DTW distance, the
//! MiniRocket convolutional-kernel transform, and the accuracy score used to
//! evaluate predictions. Both models implement [`Model`], the call contract
//! the timed pipeline drives: construct, `fit` on the training split, then
//! `infer` under a [`CancelFlag`] that a timeout can raise.

mod cancel;
mod error;
mod knn;
mod label;
mod metrics;
mod minirocket;
mod model;
mod split;

pub use cancel::CancelFlag;
pub use error::ModelError;
pub use knn::{KNeighborsClassifier, KnnConfig, Window};
pub use label::ClassLabel;
pub use metrics::accuracy_score;
pub use minirocket::{MiniRocket, MiniRocketConfig};
pub use model::{Inference, Model};
pub use split::LabeledSplit;
