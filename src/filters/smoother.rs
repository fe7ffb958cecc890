use crate::config::KalmanParams;
use crate::filters::kalman::ScalarKalman;
use crate::types::{Coordinate, TelemetrySample};

/// Smooths a trajectory with one independent [`ScalarKalman`] per axis.
///
/// Both filters share the same noise model. They are rebuilt whenever the parameters
/// change and at the start of every [`smooth`](Self::smooth) call, so no estimate leaks
/// between datasets.
#[derive(Clone, Debug)]
pub struct TrajectorySmoother {
    params: KalmanParams,
    latitude: ScalarKalman,
    longitude: ScalarKalman,
}

impl TrajectorySmoother {
    pub fn new(params: KalmanParams) -> Self {
        Self {
            params,
            latitude: ScalarKalman::from_params(params),
            longitude: ScalarKalman::from_params(params),
        }
    }

    pub fn params(&self) -> KalmanParams {
        self.params
    }

    /// Swap the noise model. Any in-progress estimate is discarded.
    pub fn set_params(&mut self, params: KalmanParams) {
        *self = Self::new(params);
    }

    pub fn reset(&mut self) {
        self.latitude = ScalarKalman::from_params(self.params);
        self.longitude = ScalarKalman::from_params(self.params);
    }

    /// Smooth a whole trajectory from a cold start. Output is 1:1 with the input.
    pub fn smooth(&mut self, samples: &[TelemetrySample]) -> Vec<Coordinate> {
        self.reset();
        samples.iter().map(|s| self.push(s)).collect()
    }

    /// Feed the next sample of the current trajectory.
    pub fn push(&mut self, sample: &TelemetrySample) -> Coordinate {
        Coordinate::new(
            self.latitude.update(sample.latitude),
            self.longitude.update(sample.longitude),
        )
    }

    pub fn samples_seen(&self) -> u64 {
        self.latitude.update_count()
    }
}
