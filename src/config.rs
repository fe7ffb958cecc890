//! Cleaning parameters and their defaults.
//!
//! Defaults match the debugger UI this crate serves:
//! distance 100 m (slider 0-300), accuracy 50 m (slider 0-100), R = 0.01, Q = 3.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ensure_non_negative, ConfigError};

pub const DEFAULT_DISTANCE_THRESHOLD_M: f64 = 100.0;
pub const DEFAULT_ACCURACY_THRESHOLD_M: f64 = 50.0;
pub const DEFAULT_MEASUREMENT_NOISE: f64 = 0.01;
pub const DEFAULT_PROCESS_VARIANCE: f64 = 3.0;

/// Upper ends of the UI sliders. Larger values are allowed but logged.
pub const DISTANCE_SLIDER_MAX_M: f64 = 300.0;
pub const ACCURACY_SLIDER_MAX_M: f64 = 100.0;

/// Which sample the outlier filter measures distance from
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReferencePolicy {
    /// Most recently kept sample. Collapses runs of short hops.
    #[default]
    LastRetained,
    /// Immediately preceding input sample, kept or not.
    PreviousRaw,
}

/// Outlier filter limits. Only constructible with non-negative, finite values.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ThresholdsFile")]
pub struct Thresholds {
    distance_meters: f64,
    accuracy_meters: f64,
    reference: ReferencePolicy,
}

#[derive(Deserialize)]
#[serde(default)]
struct ThresholdsFile {
    distance_meters: f64,
    accuracy_meters: f64,
    reference: ReferencePolicy,
}

impl Default for ThresholdsFile {
    fn default() -> Self {
        let d = Thresholds::default();
        Self {
            distance_meters: d.distance_meters,
            accuracy_meters: d.accuracy_meters,
            reference: d.reference,
        }
    }
}

impl TryFrom<ThresholdsFile> for Thresholds {
    type Error = ConfigError;

    fn try_from(file: ThresholdsFile) -> Result<Self, Self::Error> {
        Ok(Thresholds::new(file.distance_meters, file.accuracy_meters)?.with_reference(file.reference))
    }
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            distance_meters: DEFAULT_DISTANCE_THRESHOLD_M,
            accuracy_meters: DEFAULT_ACCURACY_THRESHOLD_M,
            reference: ReferencePolicy::LastRetained,
        }
    }
}

impl Thresholds {
    pub fn new(distance_meters: f64, accuracy_meters: f64) -> Result<Self, ConfigError> {
        let distance_meters = ensure_non_negative("distance threshold", distance_meters)?;
        let accuracy_meters = ensure_non_negative("accuracy threshold", accuracy_meters)?;
        if distance_meters > DISTANCE_SLIDER_MAX_M {
            log::warn!(
                "Distance threshold {} m exceeds the usual {} m range",
                distance_meters,
                DISTANCE_SLIDER_MAX_M
            );
        }
        if accuracy_meters > ACCURACY_SLIDER_MAX_M {
            log::warn!(
                "Accuracy threshold {} m exceeds the usual {} m range",
                accuracy_meters,
                ACCURACY_SLIDER_MAX_M
            );
        }
        Ok(Self {
            distance_meters,
            accuracy_meters,
            reference: ReferencePolicy::default(),
        })
    }

    pub fn with_reference(mut self, reference: ReferencePolicy) -> Self {
        self.reference = reference;
        self
    }

    pub fn distance_meters(&self) -> f64 {
        self.distance_meters
    }

    pub fn accuracy_meters(&self) -> f64 {
        self.accuracy_meters
    }

    pub fn reference(&self) -> ReferencePolicy {
        self.reference
    }
}

/// Noise model shared by both axes of the smoother.
/// Only constructible with non-negative, finite values.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "KalmanParamsFile")]
pub struct KalmanParams {
    measurement_noise: f64,
    process_variance: f64,
}

#[derive(Deserialize)]
#[serde(default)]
struct KalmanParamsFile {
    measurement_noise: f64,
    process_variance: f64,
}

impl Default for KalmanParamsFile {
    fn default() -> Self {
        Self {
            measurement_noise: DEFAULT_MEASUREMENT_NOISE,
            process_variance: DEFAULT_PROCESS_VARIANCE,
        }
    }
}

impl TryFrom<KalmanParamsFile> for KalmanParams {
    type Error = ConfigError;

    fn try_from(file: KalmanParamsFile) -> Result<Self, Self::Error> {
        KalmanParams::new(file.measurement_noise, file.process_variance)
    }
}

impl Default for KalmanParams {
    fn default() -> Self {
        Self {
            measurement_noise: DEFAULT_MEASUREMENT_NOISE,
            process_variance: DEFAULT_PROCESS_VARIANCE,
        }
    }
}

impl KalmanParams {
    pub fn new(measurement_noise: f64, process_variance: f64) -> Result<Self, ConfigError> {
        Ok(Self {
            measurement_noise: ensure_non_negative("measurement noise (R)", measurement_noise)?,
            process_variance: ensure_non_negative("process variance (Q)", process_variance)?,
        })
    }

    /// Measurement noise power (R)
    pub fn measurement_noise(&self) -> f64 {
        self.measurement_noise
    }

    /// Process variance (Q)
    pub fn process_variance(&self) -> f64 {
        self.process_variance
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    #[default]
    Outlier,
    Kalman,
    /// Sorted input, no cleaning
    Raw,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanerConfig {
    pub strategy: Strategy,
    pub thresholds: Thresholds,
    pub kalman: KalmanParams,
}

impl CleanerConfig {
    /// Parse a JSON config. Out-of-range parameters are rejected while deserializing.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::Load(e.to_string()))
    }

    /// Load a JSON config file. Missing keys fall back to defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .map_err(|e| ConfigError::Load(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&json)
    }
}
