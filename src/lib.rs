//! Telemetry trajectory cleaning.
//!
//! Raw `latitude,longitude,timestamp[,accuracy]` lines are parsed, sorted by time and then
//! either thinned by a distance/accuracy outlier filter or smoothed by a pair of scalar
//! Kalman filters. Rendering is left to the caller.

pub mod cleaner;
pub mod config;
pub mod distance;
pub mod error;
pub mod filters;
pub mod parser;
pub mod types;

pub use cleaner::{
    run_pipeline, CleanedTrajectory, CleaningSummary, DisplayFrame, PreparedInput,
    TrajectoryCleaner,
};
pub use config::{CleanerConfig, KalmanParams, ReferencePolicy, Strategy, Thresholds};
pub use distance::{distance_meters, haversine_distance};
pub use error::{ConfigError, RecordError};
pub use filters::{ScalarKalman, TrajectorySmoother};
pub use parser::{parse_records, sort_by_time, ParsedRecords, RejectedLine};
pub use types::{Coordinate, TelemetrySample, TrackPoint};
