//! Elevation profile output types.

use crate::point::GeoPoint;

/// One sample of a profile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElevationSample {
    /// Reported distance from the profile start in meters.
    pub distance_m: f64,
    /// Elevation in meters, `None` where no tile data is available.
    pub elevation_m: Option<f64>,
}

/// An elevation profile along a geodesic.
///
/// `distances_m`, `elev_m` and `points` are parallel arrays of equal length.
/// Distances start at 0.0 and never decrease; elevations are finite or `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    /// Geodesic length from start to end in meters.
    pub total_distance_m: f64,
    /// Reported distance of each sample from the start.
    pub distances_m: Vec<f64>,
    /// Elevation of each sample.
    pub elev_m: Vec<Option<f64>>,
    /// Position of each sample.
    pub points: Vec<GeoPoint>,
}

impl Profile {
    /// Number of samples.
    pub fn len(&self) -> usize {
        self.distances_m.len()
    }

    /// Returns true if the profile has no samples.
    pub fn is_empty(&self) -> bool {
        self.distances_m.is_empty()
    }

    /// Iterate over `(distance, elevation)` samples in order.
    pub fn samples(&self) -> impl Iterator<Item = ElevationSample> + '_ {
        self.distances_m
            .iter()
            .zip(&self.elev_m)
            .map(|(&distance_m, &elevation_m)| ElevationSample {
                distance_m,
                elevation_m,
            })
    }

    /// Longitudes of the sampled points.
    pub fn lngs(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.lon).collect()
    }

    /// Latitudes of the sampled points.
    pub fn lats(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.lat).collect()
    }

    /// Lowest and highest available elevation, if any sample has data.
    pub fn elevation_range(&self) -> Option<(f64, f64)> {
        self.elev_m.iter().flatten().fold(None, |acc, &e| match acc {
            None => Some((e, e)),
            Some((lo, hi)) => Some((lo.min(e), hi.max(e))),
        })
    }
}
