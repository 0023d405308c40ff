//! Geographic primitives and great-circle distance.
//!
//! Distances are computed with the haversine formula on a spherical Earth
//! and reported in statute miles, the unit shown to users ("2.3 mi away").
//! The function is pure and total: no I/O, no state, no failure path.

use serde::{Deserialize, Serialize};

/// Mean Earth radius in statute miles.
pub const EARTH_RADIUS_MILES: f64 = 3959.0;

/// A point on Earth in decimal degrees (WGS84).
///
/// Latitude is -90..=90, longitude -180..=180. Construction does not
/// validate ranges; the dataset loader is responsible for rejecting
/// records without usable coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
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

/// Great-circle distance between two points in statute miles.
///
/// Haversine formula: symmetric in its arguments, zero for identical
/// points, and monotone in angular separation. Always returns a finite,
/// non-negative value for in-range coordinates, including antipodal and
/// nearly-coincident pairs.
pub fn distance_miles(a: Coordinate, b: Coordinate) -> f64 {
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2)
        + a.latitude.to_radians().cos()
            * b.latitude.to_radians().cos()
            * (d_lon / 2.0).sin().powi(2);

    // Round-off can push h a hair outside [0, 1] for near-antipodal or
    // near-coincident points, which would make the square roots NaN.
    let h = h.clamp(0.0, 1.0);

    EARTH_RADIUS_MILES * 2.0 * h.sqrt().atan2((1.0 - h).sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOKYO: Coordinate = Coordinate {
        latitude: 35.6762,
        longitude: 139.6503,
    };
    const SAN_FRANCISCO: Coordinate = Coordinate {
        latitude: 37.7749,
        longitude: -122.4194,
    };

    #[test]
    fn distance_to_self_is_zero() {
        let here = Coordinate::new(30.2672, -97.7431);
        assert_eq!(distance_miles(here, here), 0.0);
    }

    #[test]
    fn distance_is_symmetric() {
        let a = Coordinate::new(44.96, -93.27);
        let b = Coordinate::new(29.7604, -95.3698);
        let ab = distance_miles(a, b);
        let ba = distance_miles(b, a);
        assert!((ab - ba).abs() < 1e-9, "expected symmetry, {ab} vs {ba}");
    }

    #[test]
    fn tokyo_to_san_francisco_matches_known_distance() {
        // R = 3959 puts this city pair at ~5142 statute miles.
        let d = distance_miles(TOKYO, SAN_FRANCISCO);
        assert!((d - 5142.0).abs() < 5.0, "expected ~5142 mi, got {d}");
    }

    #[test]
    fn one_degree_of_latitude_is_about_sixty_nine_miles() {
        let d = distance_miles(Coordinate::new(0.0, 0.0), Coordinate::new(1.0, 0.0));
        assert!((d - 69.1).abs() < 0.5, "expected ~69 mi, got {d}");
    }

    #[test]
    fn distance_grows_with_angular_separation() {
        let origin = Coordinate::new(40.0, -100.0);
        let mut last = 0.0;
        for step in 1..=8 {
            let d = distance_miles(origin, Coordinate::new(40.0, -100.0 + f64::from(step)));
            assert!(d > last, "expected monotone growth at step {step}");
            last = d;
        }
    }

    #[test]
    fn antipodal_points_stay_finite() {
        // Half the circumference, and no NaN from h drifting past 1.0.
        let d = distance_miles(Coordinate::new(0.0, 0.0), Coordinate::new(0.0, 180.0));
        assert!(d.is_finite());
        assert!(
            (d - std::f64::consts::PI * EARTH_RADIUS_MILES).abs() < 0.01,
            "expected half circumference, got {d}"
        );

        let poles = distance_miles(Coordinate::new(90.0, 0.0), Coordinate::new(-90.0, 0.0));
        assert!((poles - d).abs() < 0.01, "pole-to-pole should match, got {poles}");
    }

    #[test]
    fn nearly_coincident_points_across_the_dateline() {
        // 0.0002 degrees of longitude apart, straddling the antimeridian.
        let d = distance_miles(Coordinate::new(45.0, 179.9999), Coordinate::new(45.0, -179.9999));
        assert!(d.is_finite() && d >= 0.0);
        assert!(d < 0.02, "expected a tiny distance, got {d}");
    }
}
