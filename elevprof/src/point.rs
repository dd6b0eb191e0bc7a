//! WGS84 coordinate value type.

use geo::Point;

use crate::error::{ElevationError, Result};

/// A WGS84 position in decimal degrees.
///
/// Field order follows GeoJSON: longitude first.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    /// Longitude in decimal degrees (-180 to 180).
    pub lon: f64,
    /// Latitude in decimal degrees (-90 to 90).
    pub lat: f64,
}

impl GeoPoint {
    /// Create a new point from longitude and latitude.
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// Check that the point is finite and within the WGS84 ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ElevationError::InvalidCoordinate`] otherwise.
    pub fn validate(&self) -> Result<()> {
        let valid = self.lon.is_finite()
            && self.lat.is_finite()
            && (-180.0..=180.0).contains(&self.lon)
            && (-90.0..=90.0).contains(&self.lat);

        if valid {
            Ok(())
        } else {
            Err(ElevationError::InvalidCoordinate {
                lon: self.lon,
                lat: self.lat,
            })
        }
    }
}

impl From<[f64; 2]> for GeoPoint {
    fn from([lon, lat]: [f64; 2]) -> Self {
        Self { lon, lat }
    }
}

impl From<GeoPoint> for Point<f64> {
    fn from(p: GeoPoint) -> Self {
        Point::new(p.lon, p.lat)
    }
}

impl From<Point<f64>> for GeoPoint {
    fn from(p: Point<f64>) -> Self {
        Self {
            lon: p.x(),
            lat: p.y(),
        }
    }
}
