use serde::{Deserialize, Serialize};

/// One positional fix as parsed from a telemetry line.
///
/// `accuracy_meters` is the reported upper bound on positional error. `None` means the
/// source did not report one, which the outlier filter treats as unbounded-but-acceptable.
/// `Some(NaN)` means a value was reported but unusable; it fails every accuracy check.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySample {
    pub latitude: f64,
    pub longitude: f64,
    pub timestamp_millis: i64,
    pub accuracy_meters: Option<f64>,
}

impl TelemetrySample {
    pub fn new(
        latitude: f64,
        longitude: f64,
        timestamp_millis: i64,
        accuracy_meters: Option<f64>,
    ) -> Self {
        Self {
            latitude,
            longitude,
            timestamp_millis,
            accuracy_meters,
        }
    }

    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }
}

/// Latitude/longitude pair in degrees.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

impl From<&TelemetrySample> for Coordinate {
    fn from(sample: &TelemetrySample) -> Self {
        sample.coordinate()
    }
}

// geo uses x = longitude, y = latitude
impl From<Coordinate> for geo::Point<f64> {
    fn from(c: Coordinate) -> Self {
        geo::Point::new(c.longitude, c.latitude)
    }
}

impl From<geo::Coord<f64>> for Coordinate {
    fn from(c: geo::Coord<f64>) -> Self {
        Coordinate::new(c.y, c.x)
    }
}

/// A cleaned output point handed to the renderer.
///
/// For outlier rejection this is the retained sample itself; for Kalman smoothing the
/// position is the smoothed estimate while time and accuracy come from the input sample.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrackPoint {
    pub latitude: f64,
    pub longitude: f64,
    pub timestamp_millis: i64,
    pub accuracy_meters: Option<f64>,
}

impl TrackPoint {
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }

    /// Pair a (possibly smoothed) position with the time and accuracy of its source sample.
    pub fn with_position(sample: &TelemetrySample, position: Coordinate) -> Self {
        Self {
            latitude: position.latitude,
            longitude: position.longitude,
            timestamp_millis: sample.timestamp_millis,
            accuracy_meters: sample.accuracy_meters,
        }
    }
}

impl From<&TelemetrySample> for TrackPoint {
    fn from(sample: &TelemetrySample) -> Self {
        Self::with_position(sample, sample.coordinate())
    }
}
