//! Strategy selection and the text-to-trajectory pipeline.

use geo::{BoundingRect, MultiPoint, Point};
use serde::Serialize;

use crate::config::{CleanerConfig, KalmanParams, Strategy, Thresholds};
use crate::filters::{outlier, TrajectorySmoother};
use crate::parser::{self, RejectedLine};
use crate::types::{Coordinate, TelemetrySample, TrackPoint};

/// The two cleaning capabilities plus a no-op for showing raw data
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TrajectoryCleaner {
    OutlierReject(Thresholds),
    KalmanSmooth(KalmanParams),
    Passthrough,
}

impl TrajectoryCleaner {
    pub fn from_config(config: &CleanerConfig) -> Self {
        match config.strategy {
            Strategy::Outlier => TrajectoryCleaner::OutlierReject(config.thresholds),
            Strategy::Kalman => TrajectoryCleaner::KalmanSmooth(config.kalman),
            Strategy::Raw => TrajectoryCleaner::Passthrough,
        }
    }

    pub fn strategy(&self) -> Strategy {
        match self {
            TrajectoryCleaner::OutlierReject(_) => Strategy::Outlier,
            TrajectoryCleaner::KalmanSmooth(_) => Strategy::Kalman,
            TrajectoryCleaner::Passthrough => Strategy::Raw,
        }
    }

    /// Clean a time-sorted trajectory.
    ///
    /// Smoothing builds fresh per-axis filters on every call.
    pub fn clean(&self, samples: &[TelemetrySample]) -> Vec<TrackPoint> {
        match self {
            TrajectoryCleaner::OutlierReject(thresholds) => outlier::filter(samples, thresholds)
                .iter()
                .map(TrackPoint::from)
                .collect(),
            TrajectoryCleaner::KalmanSmooth(params) => {
                let mut smoother = TrajectorySmoother::new(*params);
                samples
                    .iter()
                    .zip(smoother.smooth(samples))
                    .map(|(sample, position)| TrackPoint::with_position(sample, position))
                    .collect()
            }
            TrajectoryCleaner::Passthrough => samples.iter().map(TrackPoint::from).collect(),
        }
    }
}

/// Counts shown next to the map: "removed N of M (p%)"
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CleaningSummary {
    pub input_count: usize,
    pub output_count: usize,
    pub removed_count: usize,
    pub removed_percentage: f64,
    pub rejected_lines: usize,
}

impl CleaningSummary {
    pub fn new(input_count: usize, output_count: usize, rejected_lines: usize) -> Self {
        let removed_count = input_count.saturating_sub(output_count);
        let removed_percentage = if removed_count > 0 {
            removed_count as f64 / input_count as f64 * 100.0
        } else {
            0.0
        };
        Self {
            input_count,
            output_count,
            removed_count,
            removed_percentage,
            rejected_lines,
        }
    }
}

/// Where a renderer should center and frame the track.
///
/// The bounds are a plain min/max over latitude and longitude. A track that crosses
/// the +-180 meridian gets a frame spanning nearly the whole globe; splitting it is
/// left to the renderer.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct DisplayFrame {
    /// First output point
    pub center: Coordinate,
    pub south_west: Coordinate,
    pub north_east: Coordinate,
}

impl DisplayFrame {
    pub fn from_points(points: &[TrackPoint]) -> Option<Self> {
        let center = points.first()?.coordinate();
        let cloud: MultiPoint<f64> = points
            .iter()
            .map(|p| Point::from(p.coordinate()))
            .collect();
        let rect = cloud.bounding_rect()?;
        Some(Self {
            center,
            south_west: rect.min().into(),
            north_east: rect.max().into(),
        })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CleanedTrajectory {
    pub strategy: Strategy,
    pub points: Vec<TrackPoint>,
    pub summary: CleaningSummary,
    pub frame: Option<DisplayFrame>,
    pub rejected: Vec<RejectedLine>,
}

/// Parsed and time-sorted input, ready to be cleaned with any strategy
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PreparedInput {
    pub samples: Vec<TelemetrySample>,
    pub rejected: Vec<RejectedLine>,
}

impl PreparedInput {
    pub fn from_text(text: &str) -> Self {
        let parser::ParsedRecords {
            mut samples,
            rejected,
        } = parser::parse_records(text);
        parser::sort_by_time(&mut samples);
        Self { samples, rejected }
    }

    pub fn clean_with(&self, cleaner: &TrajectoryCleaner) -> CleanedTrajectory {
        let points = cleaner.clean(&self.samples);
        let summary = CleaningSummary::new(self.samples.len(), points.len(), self.rejected.len());
        log::info!(
            "{:?}: {} -> {} points ({:.2}% removed, {} malformed lines)",
            cleaner.strategy(),
            summary.input_count,
            summary.output_count,
            summary.removed_percentage,
            summary.rejected_lines
        );
        CleanedTrajectory {
            strategy: cleaner.strategy(),
            frame: DisplayFrame::from_points(&points),
            points,
            summary,
            rejected: self.rejected.clone(),
        }
    }
}

/// Parse, sort and clean `text` according to `config`.
///
/// A `CleanerConfig` only holds validated parameters, so bad values are reported
/// where they are built (`Thresholds::new`, `KalmanParams::new`, config loading).
pub fn run_pipeline(text: &str, config: &CleanerConfig) -> CleanedTrajectory {
    let cleaner = TrajectoryCleaner::from_config(config);
    PreparedInput::from_text(text).clean_with(&cleaner)
}
