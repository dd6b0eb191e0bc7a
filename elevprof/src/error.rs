//! Error types for the elevprof library.

use std::path::PathBuf;
use thiserror::Error;

use crate::service::{MAX_SAMPLE_COUNT, MIN_SAMPLE_COUNT};

/// Errors that can occur when building elevation profiles.
///
/// Only [`ElevationError::InvalidSampleCount`] and
/// [`ElevationError::InvalidCoordinate`] ever escape a profile query. Tile
/// lookup failures are absorbed into `None` samples.
#[derive(Error, Debug)]
pub enum ElevationError {
    /// Sample count is outside the accepted range.
    #[error(
        "Invalid sample count: {count} (expected {} to {})",
        MIN_SAMPLE_COUNT,
        MAX_SAMPLE_COUNT
    )]
    InvalidSampleCount { count: usize },

    /// Coordinate is not a finite WGS84 position.
    #[error("Invalid coordinate: lon={lon}, lat={lat} (valid: lon ±180°, lat ±90°)")]
    InvalidCoordinate { lon: f64, lat: f64 },

    /// A GeoJSON geometry contains a malformed position.
    #[error("Invalid geometry: {reason}")]
    InvalidGeometry { reason: String },

    /// The tile file for a requested tile does not exist.
    #[error("Tile file not found: {path}")]
    TileNotFound { path: PathBuf },

    /// The tile file exists but could not be decoded as an image.
    #[error("Failed to decode tile {path}: {source}")]
    TileDecode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// The configured tile root is missing or is not a readable directory.
    #[error("Tile root unavailable: {path}")]
    TileRootUnavailable { path: PathBuf },
}

/// Result type alias using [`ElevationError`].
pub type Result<T> = std::result::Result<T, ElevationError>;
