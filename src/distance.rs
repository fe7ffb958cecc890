//! Great-circle distance on a spherical Earth.

use crate::types::Coordinate;

/// Mean Earth radius in meters
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Haversine distance in meters between two coordinates.
pub fn distance_meters(a: &Coordinate, b: &Coordinate) -> f64 {
    haversine_distance(a.latitude, a.longitude, b.latitude, b.longitude)
}

/// Haversine distance in meters between two lat/lon pairs given in degrees.
///
/// The haversine term is clamped to `[0, 1]` so rounding near antipodal or identical
/// points cannot push `sqrt` outside its domain.
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    let a = a.clamp(0.0, 1.0);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_M * c
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_identical_points_zero() {
        let p = Coordinate::new(-23.55052, -46.633308);
        assert_eq!(distance_meters(&p, &p), 0.0);
    }

    #[test]
    fn test_symmetry() {
        let pairs = [
            (Coordinate::new(0.0, 0.0), Coordinate::new(0.0, 0.01)),
            (Coordinate::new(51.5007, -0.1246), Coordinate::new(40.6892, -74.0445)),
            (Coordinate::new(-33.8568, 151.2153), Coordinate::new(35.6586, 139.7454)),
            (Coordinate::new(89.9, 0.0), Coordinate::new(-89.9, 180.0)),
        ];
        for (a, b) in pairs {
            assert_relative_eq!(distance_meters(&a, &b), distance_meters(&b, &a), epsilon = 1e-6);
        }
    }

    #[test]
    fn test_equator_small_offsets() {
        let origin = Coordinate::new(0.0, 0.0);
        // 0.0005 deg of longitude on the equator ~ 55.6 m
        let near = distance_meters(&origin, &Coordinate::new(0.0, 0.0005));
        assert!((near - 55.6).abs() < 0.1, "got {}", near);
        // 0.01 deg ~ 1112 m
        let far = distance_meters(&origin, &Coordinate::new(0.0, 0.01));
        assert!((far - 1111.95).abs() < 0.1, "got {}", far);
    }

    #[test]
    fn test_antipodal_is_half_circumference() {
        let d = haversine_distance(0.0, 0.0, 0.0, 180.0);
        assert_relative_eq!(d, std::f64::consts::PI * EARTH_RADIUS_M, max_relative = 1e-12);
        assert!(d.is_finite());

        let poles = haversine_distance(90.0, 0.0, -90.0, 0.0);
        assert_relative_eq!(poles, std::f64::consts::PI * EARTH_RADIUS_M, max_relative = 1e-12);
    }

    #[test]
    fn test_tiny_separation_not_nan() {
        let d = haversine_distance(45.0, 7.0, 45.0 + 1e-12, 7.0);
        assert!(d.is_finite());
        assert!(d >= 0.0 && d < 1e-3);
    }

    #[test]
    fn test_one_degree_latitude() {
        let d = haversine_distance(10.0, 20.0, 11.0, 20.0);
        assert_relative_eq!(d, EARTH_RADIUS_M * 1.0_f64.to_radians(), max_relative = 1e-9);
    }
}
