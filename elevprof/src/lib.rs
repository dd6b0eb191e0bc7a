//! # elevprof - Terrain-RGB Elevation Profiles
//!
//! Library for building elevation profiles along WGS84 geodesics from a local
//! pyramid of Terrain-RGB raster tiles.
//!
//! ## Features
//!
//! - **Accurate**: Samples along the ellipsoidal geodesic, not a rhumb line
//! - **Cached**: Decoded tiles are kept in a bounded LRU cache shared by all queries
//! - **Tolerant**: Missing or broken tiles yield `None` samples, never a failed profile
//! - **Offline**: Works with local `{z}/{x}/{y}.png` tiles, no internet required
//!
//! ## Quick Start
//!
//! ```ignore
//! use elevprof::{GeoPoint, ProfileService};
//!
//! let service = ProfileService::new("/data/tiles", 14, 128);
//! let profile = service.build_profile(
//!     GeoPoint::new(138.7274, 35.3606),
//!     GeoPoint::new(138.8000, 35.4000),
//!     120,
//! )?;
//! println!("{:.0} m, {} samples", profile.total_distance_m, profile.len());
//! ```
//!
//! ## Terrain-RGB Format
//!
//! Each pixel encodes one elevation in its three color channels:
//!
//! ```text
//! elevation = -10000 + (R * 65536 + G * 256 + B) * 0.1
//! ```
//!
//! Tiles are addressed in the Web-Mercator (EPSG:3857) slippy-map scheme and
//! stored at `{root}/{zoom}/{x}/{y}.{ext}`.

pub mod cache;
pub mod error;
pub mod geodesic;
pub mod mercator;
pub mod point;
pub mod profile;
pub mod service;
pub mod store;
pub mod tile;

#[cfg(feature = "geojson")]
pub mod geojson;

// Re-export main types at crate root for convenience
pub use cache::{CacheStats, TileCache, DEFAULT_CACHE_SIZE};
pub use error::{ElevationError, Result};
pub use geodesic::{GeodesicPath, GeodesicSampler};
pub use mercator::{PixelAddress, TileAddressResolver, TileBounds, TileId, MAX_ZOOM};
pub use point::GeoPoint;
pub use profile::{ElevationSample, Profile};
pub use service::{
    BoundingBox, PreloadStats, ProfileService, ProfileServiceBuilder, DEFAULT_ZOOM,
    MAX_SAMPLE_COUNT, MIN_SAMPLE_COUNT,
};
pub use store::TileStore;
pub use tile::{decode_elevation, RasterTile};
