//! Geographic primitives shared by dispatch and zone evaluation.
//!
//! All distances are great-circle distances in metres computed with the
//! haversine formula on a spherical Earth.

use serde::{Deserialize, Serialize};

use crate::error::DispatchError;

/// Mean Earth radius (IUGG) in metres.
pub const EARTH_RADIUS_METERS: f64 = 6_371_008.8;

/// A WGS84 latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    /// Build a coordinate, rejecting anything outside the valid ranges.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, DispatchError> {
        let coordinate = Self {
            latitude,
            longitude,
        };
        coordinate.validate()?;
        Ok(coordinate)
    }

    pub fn validate(&self) -> Result<(), DispatchError> {
        if !self.latitude.is_finite() || !(-90.0..=90.0).contains(&self.latitude) {
            return Err(DispatchError::Validation(format!(
                "latitude {} is outside [-90, 90]",
                self.latitude
            )));
        }
        if !self.longitude.is_finite() || !(-180.0..=180.0).contains(&self.longitude) {
            return Err(DispatchError::Validation(format!(
                "longitude {} is outside [-180, 180]",
                self.longitude
            )));
        }
        Ok(())
    }

    /// Great-circle distance to `other` in metres.
    pub fn distance_to(&self, other: &Coordinate) -> f64 {
        haversine_meters(self, other)
    }
}

pub fn haversine_meters(a: &Coordinate, b: &Coordinate) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
    // Rounding can push h a hair past 1.0 for antipodal points.
    let c = 2.0 * h.sqrt().min(1.0).asin();
    EARTH_RADIUS_METERS * c
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(lat: f64, lon: f64) -> Coordinate {
        Coordinate {
            latitude: lat,
            longitude: lon,
        }
    }

    #[test]
    fn zero_distance_for_same_point() {
        assert_eq!(haversine_meters(&c(39.9, 116.4), &c(39.9, 116.4)), 0.0);
    }

    #[test]
    fn equatorial_offsets_match_expected_arc_length() {
        let d = haversine_meters(&c(0.0, 0.0), &c(0.0, 0.005));
        assert!((d - 555.97).abs() < 1.0, "got {d}");

        let d = haversine_meters(&c(0.0, 0.0), &c(0.0, 0.02));
        assert!((d - 2223.9).abs() < 1.0, "got {d}");
    }

    #[test]
    fn distance_is_symmetric_across_the_date_line() {
        let east = c(10.0, 179.999);
        let west = c(10.0, -179.999);
        let d = haversine_meters(&east, &west);
        assert!(d < 300.0, "date line neighbours should be close, got {d}");
        assert_eq!(d, haversine_meters(&west, &east));
    }

    #[test]
    fn antipodes_are_half_the_circumference() {
        let d = haversine_meters(&c(0.0, 0.0), &c(0.0, 180.0));
        let half = std::f64::consts::PI * EARTH_RADIUS_METERS;
        assert!((d - half).abs() < 1e-6 * half);
    }

    #[test]
    fn rejects_out_of_range_coordinates() {
        assert!(Coordinate::new(90.0, 180.0).is_ok());
        assert!(Coordinate::new(-90.0, -180.0).is_ok());
        assert!(Coordinate::new(90.0001, 0.0).is_err());
        assert!(Coordinate::new(0.0, -180.5).is_err());
        assert!(Coordinate::new(f64::NAN, 0.0).is_err());
    }
}
