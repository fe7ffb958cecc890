use serde::{Deserialize, Serialize};

use crate::config::KalmanParams;
use crate::error::ConfigError;

/// Initial covariance assigned on the first measurement
const INITIAL_COVARIANCE: f64 = 1.0;

/// Snapshot of a filter's recursive state
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct KalmanState {
    pub estimate: f64,
    pub covariance: f64,
}

/// 1-D stationary Kalman filter with identity transition and observation.
///
/// Each `update` predicts with `P = covariance + R`, weighs the innovation by
/// `K = P / (P + Q)` and shrinks the covariance to `P * (1 - K)`. The first measurement
/// seeds the estimate directly with covariance 1.
///
/// R and Q are fixed for the filter's lifetime. To change them build a new filter; the
/// old covariance is meaningless under a different noise model.
#[derive(Clone, Debug)]
pub struct ScalarKalman {
    params: KalmanParams,
    state: Option<KalmanState>,
    update_count: u64,
}

impl ScalarKalman {
    pub fn new(measurement_noise: f64, process_variance: f64) -> Result<Self, ConfigError> {
        let params = KalmanParams::new(measurement_noise, process_variance)?;
        Ok(Self::from_params(params))
    }

    pub fn from_params(params: KalmanParams) -> Self {
        Self {
            params,
            state: None,
            update_count: 0,
        }
    }

    /// Fold one measurement into the estimate and return the new estimate.
    pub fn update(&mut self, measurement: f64) -> f64 {
        self.update_count += 1;

        let Some(state) = self.state.as_mut() else {
            self.state = Some(KalmanState {
                estimate: measurement,
                covariance: INITIAL_COVARIANCE,
            });
            return measurement;
        };

        let predicted = state.estimate;
        let p = state.covariance + self.params.measurement_noise();
        let denom = p + self.params.process_variance();
        // R = Q = 0 drives P to zero; hold the estimate instead of producing 0/0
        let gain = if denom > 0.0 { p / denom } else { 0.0 };

        state.estimate = predicted + gain * (measurement - predicted);
        state.covariance = p * (1.0 - gain);
        state.estimate
    }

    /// Forget all state; the next `update` cold-starts again.
    pub fn reset(&mut self) {
        self.state = None;
        self.update_count = 0;
    }

    pub fn is_initialized(&self) -> bool {
        self.state.is_some()
    }

    pub fn estimate(&self) -> Option<f64> {
        self.state.map(|s| s.estimate)
    }

    pub fn covariance(&self) -> Option<f64> {
        self.state.map(|s| s.covariance)
    }

    pub fn state(&self) -> Option<KalmanState> {
        self.state
    }

    pub fn params(&self) -> KalmanParams {
        self.params
    }

    pub fn update_count(&self) -> u64 {
        self.update_count
    }
}
