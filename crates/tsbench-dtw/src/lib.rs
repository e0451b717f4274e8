//! Dynamic Time Warping distance for nearest-neighbour search.
//!
//! Pure math library with no I/O. Provides validated time series, the
//! Sakoe-Chiba band constraint (including the window-fraction form used by
//! classifier hyperparameters), rolling-buffer DTW with early abandoning, and
//! LB_Keogh envelopes for pruning candidates before the full computation.

mod constraint;
mod distance;
mod dtw;
mod envelope;
mod error;
mod series;

pub use constraint::BandConstraint;
pub use distance::DtwDistance;
pub use dtw::Dtw;
pub use envelope::{SeriesEnvelope, lb_keogh};
pub use error::DtwError;
pub use series::{TimeSeries, TimeSeriesView};
