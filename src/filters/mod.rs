//! Trajectory cleaning filters
//!
//! Outlier rejection by distance and accuracy, and per-axis Kalman smoothing.

pub mod kalman;
pub mod outlier;
pub mod smoother;

pub use kalman::{KalmanState, ScalarKalman};
pub use outlier::filter as reject_outliers;
pub use smoother::TrajectorySmoother;
