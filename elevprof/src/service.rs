//! Elevation profile service with LRU tile caching.
//!
//! This module provides [`ProfileService`], the context object that owns the
//! tile cache and answers profile queries by sampling points along a geodesic
//! and decoding the Terrain-RGB tiles beneath them.
//!
//! ```ignore
//! use elevprof::{GeoPoint, ProfileServiceBuilder};
//!
//! let service = ProfileServiceBuilder::new("/data/tiles")
//!     .zoom(14)
//!     .cache_size(128)
//!     .build();
//!
//! let profile = service.build_profile(
//!     GeoPoint::new(139.7454, 35.6586),
//!     GeoPoint::new(139.8107, 35.7101),
//!     120,
//! )?;
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::cache::{CacheStats, TileCache, DEFAULT_CACHE_SIZE};
use crate::error::{ElevationError, Result};
use crate::geodesic::GeodesicSampler;
use crate::mercator::{PixelAddress, TileAddressResolver, TileBounds, TileId, MAX_ZOOM};
use crate::point::GeoPoint;
use crate::profile::Profile;
use crate::store::{TileStore, DEFAULT_EXTENSION};
use crate::tile::RasterTile;

/// Smallest accepted sample count.
pub const MIN_SAMPLE_COUNT: usize = 2;

/// Largest accepted sample count.
pub const MAX_SAMPLE_COUNT: usize = 2000;

/// Default pyramid zoom level.
pub const DEFAULT_ZOOM: u8 = 14;

/// A geographic bounding box for filtering tiles during preload.
///
/// Coordinates are in decimal degrees (WGS84).
#[derive(Debug, Clone, Copy)]
pub struct BoundingBox {
    /// Minimum latitude (southern boundary).
    pub min_lat: f64,
    /// Minimum longitude (western boundary).
    pub min_lon: f64,
    /// Maximum latitude (northern boundary).
    pub max_lat: f64,
    /// Maximum longitude (eastern boundary).
    pub max_lon: f64,
}

impl BoundingBox {
    /// Create a new bounding box.
    ///
    /// # Arguments
    ///
    /// * `min_lat` - Southern boundary latitude
    /// * `min_lon` - Western boundary longitude
    /// * `max_lat` - Northern boundary latitude
    /// * `max_lon` - Eastern boundary longitude
    pub fn new(min_lat: f64, min_lon: f64, max_lat: f64, max_lon: f64) -> Self {
        Self {
            min_lat,
            min_lon,
            max_lat,
            max_lon,
        }
    }

    /// Check if this bounding box overlaps a tile's extent.
    ///
    /// Touching edges do not count as overlap.
    pub fn overlaps(&self, tile: &TileBounds) -> bool {
        self.min_lat < tile.north
            && self.max_lat > tile.south
            && self.min_lon < tile.east
            && self.max_lon > tile.west
    }
}

/// Statistics from a preload operation.
#[derive(Debug, Clone, Default)]
pub struct PreloadStats {
    /// Number of tiles successfully loaded into cache.
    pub tiles_loaded: u64,
    /// Number of tiles that were already in cache.
    pub tiles_already_cached: u64,
    /// Number of tiles that failed to load.
    pub tiles_failed: u64,
    /// Number of tiles that matched the bounding box filter.
    pub tiles_matched: u64,
    /// Total elapsed time in milliseconds.
    pub elapsed_ms: u64,
}

/// Elevation profile service over a Terrain-RGB tile pyramid.
///
/// Owns the tile cache shared by all queries; share the service itself
/// behind an `Arc` to serve concurrent requests. Queries may block on file
/// I/O and image decoding.
///
/// # Example
///
/// ```ignore
/// use elevprof::{GeoPoint, ProfileService};
///
/// let service = ProfileService::new("/data/tiles", 14, 128);
///
/// let profile = service.build_profile(
///     GeoPoint::new(138.7274, 35.3606),
///     GeoPoint::new(138.8000, 35.4000),
///     200,
/// )?;
/// for sample in profile.samples() {
///     println!("{:.0} m: {:?}", sample.distance_m, sample.elevation_m);
/// }
///
/// let stats = service.cache_stats();
/// println!("Cache hit rate: {:.1}%", stats.hit_rate() * 100.0);
/// ```
pub struct ProfileService {
    sampler: GeodesicSampler,
    resolver: TileAddressResolver,
    cache: TileCache,
}

impl ProfileService {
    /// Create a new profile service.
    ///
    /// # Arguments
    ///
    /// * `tile_root` - Directory containing the `{zoom}/{x}/{y}.png` pyramid
    /// * `zoom` - Zoom level of the pyramid to sample
    /// * `cache_size` - Maximum number of tiles to keep in memory
    pub fn new<P: AsRef<Path>>(tile_root: P, zoom: u8, cache_size: u64) -> Self {
        ProfileServiceBuilder::new(tile_root)
            .zoom(zoom)
            .cache_size(cache_size)
            .build()
    }

    /// Create a builder for more configuration options.
    pub fn builder<P: AsRef<Path>>(tile_root: P) -> ProfileServiceBuilder {
        ProfileServiceBuilder::new(tile_root)
    }

    /// Build the elevation profile between two points.
    ///
    /// Samples `sample_count` points along the WGS84 geodesic from `start` to
    /// `end` and looks up the elevation beneath each. Samples over missing or
    /// unreadable tiles get `None`; they never fail the whole profile.
    ///
    /// If `start` and `end` coincide the profile has a single sample with
    /// distance `0.0` and no elevation.
    ///
    /// # Errors
    ///
    /// - [`ElevationError::InvalidSampleCount`] if `sample_count` is outside
    ///   `[MIN_SAMPLE_COUNT, MAX_SAMPLE_COUNT]`
    /// - [`ElevationError::InvalidCoordinate`] if an endpoint is not a finite
    ///   WGS84 position
    pub fn build_profile(
        &self,
        start: GeoPoint,
        end: GeoPoint,
        sample_count: usize,
    ) -> Result<Profile> {
        if !(MIN_SAMPLE_COUNT..=MAX_SAMPLE_COUNT).contains(&sample_count) {
            return Err(ElevationError::InvalidSampleCount {
                count: sample_count,
            });
        }
        start.validate()?;
        end.validate()?;

        let now = Instant::now();
        let path = self.sampler.sample(start, end, sample_count);

        let elev_m = if path.is_degenerate() {
            vec![None]
        } else {
            self.elevations_at(&path.points)
        };

        tracing::debug!(
            samples = path.len(),
            total_distance_m = path.total_distance_m,
            no_data = elev_m.iter().filter(|e| e.is_none()).count(),
            elapsed_us = now.elapsed().as_micros() as u64,
            "Profile built"
        );

        Ok(Profile {
            total_distance_m: path.total_distance_m,
            distances_m: path.distances_m,
            elev_m,
            points: path.points,
        })
    }

    /// Elevation beneath a single point, or `None` if no tile covers it.
    pub fn elevation_at(&self, point: GeoPoint) -> Option<f64> {
        let address = self.resolver.resolve(point);
        let tile = self.cache.get_or_load(address.tile)?;
        sample_tile(&tile, &address)
    }

    /// Look up elevations for many points.
    ///
    /// Points are grouped by tile so that each unique tile is fetched from
    /// the cache once, and results are returned in input order.
    pub fn elevations_at(&self, points: &[GeoPoint]) -> Vec<Option<f64>> {
        let mut results = vec![None; points.len()];

        let mut groups: BTreeMap<TileId, Vec<(usize, PixelAddress)>> = BTreeMap::new();
        for (i, &point) in points.iter().enumerate() {
            let address = self.resolver.resolve(point);
            groups.entry(address.tile).or_default().push((i, address));
        }

        for (id, addresses) in &groups {
            let tile = match self.cache.get_or_load(*id) {
                Some(t) => t,
                None => continue, // missing tile → no data for its samples
            };

            for (i, address) in addresses {
                results[*i] = sample_tile(&tile, address);
            }
        }

        results
    }

    /// Verify that the tile root is a readable directory.
    ///
    /// # Errors
    ///
    /// Returns [`ElevationError::TileRootUnavailable`] otherwise.
    pub fn check_tile_root(&self) -> Result<()> {
        self.cache.store().check_root()
    }

    /// Get cache statistics.
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Get the tile root directory.
    pub fn tile_root(&self) -> &Path {
        self.cache.store().root()
    }

    /// Get the tile file extension.
    pub fn extension(&self) -> &str {
        self.cache.store().extension()
    }

    /// Get the pyramid zoom level.
    pub fn zoom(&self) -> u8 {
        self.resolver.zoom()
    }

    /// Get the maximum cache size.
    pub fn cache_capacity(&self) -> u64 {
        self.cache.capacity()
    }

    /// Invalidate (remove) a specific tile from the cache.
    ///
    /// Useful when a tile file has been replaced on disk.
    pub fn invalidate_tile(&self, id: TileId) {
        self.cache.invalidate(id);
    }

    /// Clear all tiles from the cache.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// List the tiles present on disk at the configured zoom, sorted.
    pub fn scan_tiles(&self) -> Vec<TileId> {
        self.cache.store().scan(self.zoom())
    }

    /// Preload tiles into the LRU cache.
    ///
    /// Scans the tile root at the configured zoom and loads the tiles found.
    /// Optionally filters tiles by one or more bounding boxes.
    ///
    /// Preloading more tiles than the cache capacity is allowed; the most
    /// recently loaded tiles stay resident.
    ///
    /// # Arguments
    ///
    /// * `bounds` - Optional slice of bounding boxes to filter tiles. If `None`,
    ///   all discovered tiles are loaded. If `Some`, only tiles that overlap with
    ///   at least one bounding box are loaded.
    pub fn preload(&self, bounds: Option<&[BoundingBox]>) -> PreloadStats {
        let start = Instant::now();
        let mut stats = PreloadStats::default();

        for id in self.scan_tiles() {
            if let Some(boxes) = bounds {
                let extent = id.bounds();
                if !boxes.iter().any(|b| b.overlaps(&extent)) {
                    continue;
                }
            }

            stats.tiles_matched += 1;

            if self.cache.contains(id) {
                stats.tiles_already_cached += 1;
                continue;
            }

            match self.cache.get_or_load(id) {
                Some(_) => stats.tiles_loaded += 1,
                None => stats.tiles_failed += 1,
            }
        }

        stats.elapsed_ms = start.elapsed().as_millis() as u64;
        stats
    }

    /// Release all cached tiles and consume the service.
    pub fn shutdown(self) {
        let stats = self.cache.stats();
        self.cache.clear();
        tracing::info!(
            tiles_released = stats.entry_count,
            cache_hits = stats.hit_count,
            cache_misses = stats.miss_count,
            "Profile service shut down"
        );
    }
}

fn sample_tile(tile: &RasterTile, address: &PixelAddress) -> Option<f64> {
    let (x, y) = address.pixel(tile.width(), tile.height());
    let elevation = tile.elevation_at(x, y);
    elevation.is_finite().then_some(elevation)
}

/// Builder for creating [`ProfileService`] with custom configuration.
///
/// # Example
///
/// ```ignore
/// use elevprof::ProfileServiceBuilder;
///
/// let service = ProfileServiceBuilder::new("/data/tiles")
///     .zoom(13)
///     .cache_size(256)
///     .extension("webp")
///     .build();
/// ```
pub struct ProfileServiceBuilder {
    tile_root: PathBuf,
    zoom: u8,
    cache_size: u64,
    extension: String,
}

impl ProfileServiceBuilder {
    /// Create a new builder with the specified tile root.
    pub fn new<P: AsRef<Path>>(tile_root: P) -> Self {
        Self {
            tile_root: tile_root.as_ref().to_path_buf(),
            zoom: DEFAULT_ZOOM,
            cache_size: DEFAULT_CACHE_SIZE,
            extension: DEFAULT_EXTENSION.to_string(),
        }
    }

    /// Create a builder configured from environment variables.
    ///
    /// # Environment Variables
    ///
    /// | Variable | Description | Default |
    /// |----------|-------------|---------|
    /// | `ELEVPROF_TILE_ROOT` | Root of the `{z}/{x}/{y}` tile pyramid | `tiles/` next to the executable |
    /// | `ELEVPROF_ZOOM` | Pyramid zoom level | 14 |
    /// | `ELEVPROF_CACHE_SIZE` | Maximum tiles in cache | 128 |
    /// | `ELEVPROF_TILE_EXT` | Tile file extension | png |
    ///
    /// Unparsable numbers fall back to their default.
    pub fn from_env() -> Self {
        let tile_root = std::env::var_os("ELEVPROF_TILE_ROOT")
            .map(PathBuf::from)
            .unwrap_or_else(default_tile_root);

        let zoom = env_or("ELEVPROF_ZOOM", DEFAULT_ZOOM);
        let cache_size = env_or("ELEVPROF_CACHE_SIZE", DEFAULT_CACHE_SIZE);
        let extension =
            std::env::var("ELEVPROF_TILE_EXT").unwrap_or_else(|_| DEFAULT_EXTENSION.to_string());

        Self::new(tile_root)
            .zoom(zoom)
            .cache_size(cache_size)
            .extension(&extension)
    }

    /// Set the tile root directory.
    ///
    /// Overrides the directory set in the constructor or from environment.
    pub fn tile_root<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.tile_root = path.as_ref().to_path_buf();
        self
    }

    /// Set the pyramid zoom level.
    ///
    /// Values above [`MAX_ZOOM`] are clamped. Default is 14.
    pub fn zoom(mut self, zoom: u8) -> Self {
        self.zoom = zoom.min(MAX_ZOOM);
        self
    }

    /// Set the maximum number of tiles to keep in cache.
    ///
    /// Default is 128 tiles; 0 is raised to 1.
    pub fn cache_size(mut self, size: u64) -> Self {
        self.cache_size = size.max(1);
        self
    }

    /// Set the tile file extension. Default is `png`.
    pub fn extension(mut self, ext: &str) -> Self {
        self.extension = ext.trim_start_matches('.').to_string();
        self
    }

    /// Build the [`ProfileService`].
    pub fn build(self) -> ProfileService {
        let store = TileStore::new(&self.tile_root, &self.extension);
        ProfileService {
            sampler: GeodesicSampler::new(),
            resolver: TileAddressResolver::new(self.zoom),
            cache: TileCache::new(store, self.cache_size),
        }
    }
}

/// `tiles/` next to the running executable, or `./tiles` if that is unknown.
fn default_tile_root() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join("tiles")))
        .unwrap_or_else(|| PathBuf::from("tiles"))
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(variable = key, value = %raw, "Unparsable value, using default");
            default
        }),
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tile::encode_elevation;
    use geo::{GeodesicDestination, Point};
    use image::{Rgb, RgbImage};
    use std::fs;
    use std::sync::Arc;
    use tempfile::TempDir;

    const ZOOM: u8 = 12;

    /// Write a constant-elevation tile at `id`.
    fn create_test_tile(root: &Path, id: TileId, elevation: f64) {
        let dir = root.join(id.zoom.to_string()).join(id.x.to_string());
        fs::create_dir_all(&dir).unwrap();
        RgbImage::from_pixel(256, 256, Rgb(encode_elevation(elevation)))
            .save(dir.join(format!("{}.png", id.y)))
            .unwrap();
    }

    /// Write a tile whose elevation grows by 1 m per column.
    fn create_gradient_tile(root: &Path, id: TileId) {
        let dir = root.join(id.zoom.to_string()).join(id.x.to_string());
        fs::create_dir_all(&dir).unwrap();
        let img = RgbImage::from_fn(256, 256, |x, _| Rgb(encode_elevation(x as f64)));
        img.save(dir.join(format!("{}.png", id.y))).unwrap();
    }

    fn tile_center(id: TileId) -> GeoPoint {
        let b = id.bounds();
        GeoPoint::new((b.west + b.east) / 2.0, (b.north + b.south) / 2.0)
    }

    fn east_of(p: GeoPoint, meters: f64) -> GeoPoint {
        GeoPoint::from(Point::from(p).geodesic_destination(90.0, meters))
    }

    #[test]
    fn test_profile_constant_tile() {
        let temp_dir = TempDir::new().unwrap();
        let id = TileId::containing(GeoPoint::new(139.70, 35.68), ZOOM);
        create_test_tile(temp_dir.path(), id, 100.0);

        let service = ProfileService::new(temp_dir.path(), ZOOM, 10);
        let start = tile_center(id);
        let end = east_of(start, 1000.0);

        let profile = service.build_profile(start, end, 3).unwrap();

        assert_eq!(profile.len(), 3);
        for (got, want) in profile.distances_m.iter().zip([0.0, 500.0, 1000.0]) {
            assert!((got - want).abs() < 1e-6, "{got} vs {want}");
        }
        assert_eq!(profile.elev_m, vec![Some(100.0); 3]);
        assert_eq!(profile.points[0], start);
        assert_eq!(profile.points[2], end);

        // All three samples share one tile: a single store read.
        let stats = service.cache_stats();
        assert_eq!(stats.miss_count, 1);
        assert_eq!(stats.entry_count, 1);
    }

    #[test]
    fn test_degenerate_profile() {
        let temp_dir = TempDir::new().unwrap();
        let service = ProfileService::new(temp_dir.path(), ZOOM, 10);
        let p = GeoPoint::new(139.70, 35.68);

        let profile = service.build_profile(p, p, 500).unwrap();

        assert_eq!(profile.distances_m, vec![0.0]);
        assert_eq!(profile.elev_m, vec![None]);
        assert_eq!(profile.points, vec![p]);
        assert_eq!(service.cache_stats().miss_count, 0);
    }

    #[test]
    fn test_missing_tiles_yield_none() {
        let temp_dir = TempDir::new().unwrap();
        let id = TileId::containing(GeoPoint::new(139.70, 35.68), ZOOM);
        create_test_tile(temp_dir.path(), id, 25.0);

        let service = ProfileService::new(temp_dir.path(), ZOOM, 10);
        let start = tile_center(id);
        // ~30 km east: far beyond the single tile on disk
        let end = east_of(start, 30_000.0);

        let profile = service.build_profile(start, end, 31).unwrap();

        assert_eq!(profile.len(), 31);
        assert_eq!(profile.elev_m[0], Some(25.0));
        assert_eq!(profile.elev_m[30], None);
        assert!(profile.elev_m.iter().any(|e| e.is_none()));
        assert!(profile
            .elev_m
            .iter()
            .flatten()
            .all(|e| e.is_finite() && *e == 25.0));
    }

    #[test]
    fn test_sample_count_validation() {
        let temp_dir = TempDir::new().unwrap();
        let service = ProfileService::new(temp_dir.path(), ZOOM, 10);
        let a = GeoPoint::new(0.0, 0.0);
        let b = GeoPoint::new(0.01, 0.01);

        assert!(matches!(
            service.build_profile(a, b, 1),
            Err(ElevationError::InvalidSampleCount { count: 1 })
        ));
        assert!(matches!(
            service.build_profile(a, b, 2001),
            Err(ElevationError::InvalidSampleCount { count: 2001 })
        ));
        assert_eq!(service.build_profile(a, b, 2).unwrap().len(), 2);
        assert_eq!(service.build_profile(a, b, 2000).unwrap().len(), 2000);
    }

    #[test]
    fn test_invalid_coordinates() {
        let temp_dir = TempDir::new().unwrap();
        let service = ProfileService::new(temp_dir.path(), ZOOM, 10);

        let result = service.build_profile(GeoPoint::new(200.0, 0.0), GeoPoint::new(0.0, 0.0), 10);
        assert!(matches!(
            result,
            Err(ElevationError::InvalidCoordinate { .. })
        ));

        let result =
            service.build_profile(GeoPoint::new(0.0, 0.0), GeoPoint::new(0.0, f64::NAN), 10);
        assert!(result.is_err());
    }

    #[test]
    fn test_distances_monotonic_and_lengths_match() {
        let temp_dir = TempDir::new().unwrap();
        let service = ProfileService::new(temp_dir.path(), ZOOM, 10);

        let profile = service
            .build_profile(GeoPoint::new(-122.42, 37.77), GeoPoint::new(-118.24, 34.05), 257)
            .unwrap();

        assert_eq!(profile.distances_m.len(), 257);
        assert_eq!(profile.elev_m.len(), 257);
        assert_eq!(profile.points.len(), 257);
        assert_eq!(profile.distances_m[0], 0.0);
        assert!(profile.distances_m.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_idempotent_warm_and_cold() {
        let temp_dir = TempDir::new().unwrap();
        let id = TileId::containing(GeoPoint::new(139.70, 35.68), ZOOM);
        create_gradient_tile(temp_dir.path(), id);

        let start = tile_center(id);
        let end = east_of(start, 2500.0);

        let cold = ProfileService::new(temp_dir.path(), ZOOM, 10);
        let first = cold.build_profile(start, end, 40).unwrap();
        let warm = cold.build_profile(start, end, 40).unwrap();
        let other = ProfileService::new(temp_dir.path(), ZOOM, 1)
            .build_profile(start, end, 40)
            .unwrap();

        assert_eq!(first, warm);
        assert_eq!(first, other);
        // Gradient tile: elevation never decreases heading east
        let elev: Vec<f64> = first.elev_m.iter().flatten().copied().collect();
        assert_eq!(elev.len(), 40);
        assert!(elev.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_tile_appearing_later_is_picked_up() {
        let temp_dir = TempDir::new().unwrap();
        let id = TileId::containing(GeoPoint::new(-3.70, 40.42), ZOOM);
        let service = ProfileService::new(temp_dir.path(), ZOOM, 10);
        let point = tile_center(id);

        assert_eq!(service.elevation_at(point), None);

        create_test_tile(temp_dir.path(), id, 667.0);
        assert_eq!(service.elevation_at(point), Some(667.0));
    }

    #[test]
    fn test_corrupt_tile_yields_none() {
        let temp_dir = TempDir::new().unwrap();
        let id = TileId::containing(GeoPoint::new(2.35, 48.85), ZOOM);
        let dir = temp_dir.path().join(ZOOM.to_string()).join(id.x.to_string());
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(format!("{}.png", id.y)), [0u8; 64]).unwrap();

        let service = ProfileService::new(temp_dir.path(), ZOOM, 10);
        let start = tile_center(id);
        let profile = service
            .build_profile(start, east_of(start, 100.0), 5)
            .unwrap();

        assert_eq!(profile.elev_m, vec![None; 5]);
    }

    #[test]
    fn test_concurrent_profiles() {
        let temp_dir = TempDir::new().unwrap();
        let base = TileId::containing(GeoPoint::new(139.70, 35.68), ZOOM);
        let ids: Vec<TileId> = (0..4).map(|dx| TileId::new(ZOOM, base.x + dx, base.y)).collect();
        for (i, id) in ids.iter().enumerate() {
            create_test_tile(temp_dir.path(), *id, 10.0 * i as f64);
        }

        // Capacity below the tile count forces evictions under contention
        let service = Arc::new(ProfileService::new(temp_dir.path(), ZOOM, 2));
        let start = tile_center(ids[0]);
        let end = tile_center(ids[3]);
        let expected = service.build_profile(start, end, 64).unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let service = Arc::clone(&service);
                std::thread::spawn(move || {
                    (0..10)
                        .map(|_| service.build_profile(start, end, 64).unwrap())
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        for h in handles {
            for profile in h.join().unwrap() {
                assert_eq!(profile, expected);
            }
        }
        assert!(service.cache_stats().entry_count <= 2);
    }

    #[test]
    fn test_elevations_at_preserves_order() {
        let temp_dir = TempDir::new().unwrap();
        let a = TileId::containing(GeoPoint::new(139.70, 35.68), ZOOM);
        let b = TileId::new(ZOOM, a.x + 1, a.y);
        create_test_tile(temp_dir.path(), a, 1.0);
        create_test_tile(temp_dir.path(), b, 2.0);

        let service = ProfileService::new(temp_dir.path(), ZOOM, 10);
        let points = [
            tile_center(b),
            tile_center(a),
            GeoPoint::new(0.0, 0.0),
            tile_center(b),
        ];

        assert_eq!(
            service.elevations_at(&points),
            vec![Some(2.0), Some(1.0), None, Some(2.0)]
        );
        assert_eq!(service.cache_stats().miss_count, 3);
    }

    #[test]
    fn test_clear_cache() {
        let temp_dir = TempDir::new().unwrap();
        let id = TileId::containing(GeoPoint::new(139.70, 35.68), ZOOM);
        create_test_tile(temp_dir.path(), id, 5.0);

        let service = ProfileService::new(temp_dir.path(), ZOOM, 10);
        service.elevation_at(tile_center(id)).unwrap();
        assert_eq!(service.cache_stats().miss_count, 1);

        service.clear_cache();
        service.elevation_at(tile_center(id)).unwrap();
        assert_eq!(service.cache_stats().miss_count, 2);

        service.invalidate_tile(id);
        service.elevation_at(tile_center(id)).unwrap();
        assert_eq!(service.cache_stats().miss_count, 3);
    }

    #[test]
    fn test_check_tile_root() {
        let temp_dir = TempDir::new().unwrap();
        assert!(ProfileService::new(temp_dir.path(), ZOOM, 10)
            .check_tile_root()
            .is_ok());

        let service = ProfileService::new(temp_dir.path().join("missing"), ZOOM, 10);
        assert!(matches!(
            service.check_tile_root(),
            Err(ElevationError::TileRootUnavailable { .. })
        ));
        // Per-request lookups still degrade to no data
        assert_eq!(service.elevation_at(GeoPoint::new(0.0, 0.0)), None);
    }

    #[test]
    fn test_builder_settings() {
        let service = ProfileServiceBuilder::new("/unused")
            .tile_root("/srv/tiles")
            .zoom(40)
            .cache_size(0)
            .extension(".webp")
            .build();

        assert_eq!(service.tile_root(), Path::new("/srv/tiles"));
        assert_eq!(service.zoom(), MAX_ZOOM);
        assert_eq!(service.cache_capacity(), 1);
        assert_eq!(service.extension(), "webp");

        let defaults = ProfileService::builder("/srv/tiles").build();
        assert_eq!(defaults.zoom(), DEFAULT_ZOOM);
        assert_eq!(defaults.cache_capacity(), DEFAULT_CACHE_SIZE);
        assert_eq!(defaults.extension(), "png");
    }

    #[test]
    fn test_from_env() {
        let temp_dir = TempDir::new().unwrap();
        let keys = [
            "ELEVPROF_TILE_ROOT",
            "ELEVPROF_ZOOM",
            "ELEVPROF_CACHE_SIZE",
            "ELEVPROF_TILE_EXT",
        ];
        let saved: Vec<_> = keys.iter().map(|k| std::env::var_os(k)).collect();

        std::env::set_var("ELEVPROF_TILE_ROOT", temp_dir.path());
        std::env::set_var("ELEVPROF_ZOOM", "11");
        std::env::set_var("ELEVPROF_CACHE_SIZE", "50");
        std::env::set_var("ELEVPROF_TILE_EXT", "webp");

        let builder = ProfileServiceBuilder::from_env();
        assert_eq!(builder.tile_root, temp_dir.path());
        assert_eq!(builder.zoom, 11);
        assert_eq!(builder.cache_size, 50);
        assert_eq!(builder.extension, "webp");

        // Unset and unparsable values fall back to defaults
        std::env::remove_var("ELEVPROF_TILE_ROOT");
        std::env::set_var("ELEVPROF_ZOOM", "fourteen");
        std::env::remove_var("ELEVPROF_CACHE_SIZE");
        std::env::remove_var("ELEVPROF_TILE_EXT");

        let builder = ProfileServiceBuilder::from_env();
        assert!(builder.tile_root.ends_with("tiles"));
        assert_eq!(builder.zoom, DEFAULT_ZOOM);
        assert_eq!(builder.cache_size, DEFAULT_CACHE_SIZE);
        assert_eq!(builder.extension, "png");

        for (key, value) in keys.iter().zip(saved) {
            match value {
                Some(v) => std::env::set_var(key, v),
                None => std::env::remove_var(key),
            }
        }
    }

    // --- Preload tests ---

    #[test]
    fn test_preload_all_tiles() {
        let temp_dir = TempDir::new().unwrap();
        create_test_tile(temp_dir.path(), TileId::new(ZOOM, 3637, 1612), 1.0);
        create_test_tile(temp_dir.path(), TileId::new(ZOOM, 2001, 1300), 2.0);

        let service = ProfileService::new(temp_dir.path(), ZOOM, 10);
        let stats = service.preload(None);

        assert_eq!(stats.tiles_matched, 2);
        assert_eq!(stats.tiles_loaded, 2);
        assert_eq!(stats.tiles_already_cached, 0);
        assert_eq!(stats.tiles_failed, 0);

        // Second preload finds everything resident
        let stats = service.preload(None);
        assert_eq!(stats.tiles_loaded, 0);
        assert_eq!(stats.tiles_already_cached, 2);
    }

    #[test]
    fn test_preload_with_bounding_box() {
        let temp_dir = TempDir::new().unwrap();
        let tokyo = TileId::containing(GeoPoint::new(139.70, 35.68), ZOOM);
        let madrid = TileId::containing(GeoPoint::new(-3.70, 40.42), ZOOM);
        create_test_tile(temp_dir.path(), tokyo, 40.0);
        create_test_tile(temp_dir.path(), madrid, 650.0);

        let service = ProfileService::new(temp_dir.path(), ZOOM, 10);
        let japan = BoundingBox::new(34.0, 137.0, 37.0, 141.0);
        let stats = service.preload(Some(&[japan]));

        assert_eq!(stats.tiles_matched, 1);
        assert_eq!(stats.tiles_loaded, 1);

        // Served from cache without another miss
        assert_eq!(service.elevation_at(tile_center(tokyo)), Some(40.0));
        let cache = service.cache_stats();
        assert_eq!(cache.miss_count, 1);
        assert_eq!(cache.hit_count, 1);
    }

    #[test]
    fn test_preload_counts_failures() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join(ZOOM.to_string()).join("100");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("200.png"), b"broken").unwrap();

        let service = ProfileService::new(temp_dir.path(), ZOOM, 10);
        let stats = service.preload(None);

        assert_eq!(stats.tiles_matched, 1);
        assert_eq!(stats.tiles_failed, 1);
        assert_eq!(stats.tiles_loaded, 0);
    }

    #[test]
    fn test_preload_empty_directory() {
        let temp_dir = TempDir::new().unwrap();
        let service = ProfileService::new(temp_dir.path(), ZOOM, 10);

        let stats = service.preload(None);
        assert_eq!(stats.tiles_matched, 0);
        assert_eq!(stats.tiles_loaded, 0);
    }

    #[test]
    fn test_bounding_box_overlaps() {
        let tile = TileBounds {
            west: 138.0,
            south: 35.0,
            east: 139.0,
            north: 36.0,
        };

        assert!(BoundingBox::new(35.5, 138.5, 36.5, 139.5).overlaps(&tile));
        assert!(!BoundingBox::new(40.0, 140.0, 41.0, 141.0).overlaps(&tile));
        // Touching edge (exclusive boundary)
        assert!(!BoundingBox::new(36.0, 139.0, 37.0, 140.0).overlaps(&tile));
        // Bbox fully contains tile
        assert!(BoundingBox::new(34.0, 137.0, 37.0, 140.0).overlaps(&tile));
        // Tile fully contains bbox
        assert!(BoundingBox::new(35.2, 138.2, 35.8, 138.8).overlaps(&tile));
    }

    #[test]
    fn test_shutdown_releases_tiles() {
        let temp_dir = TempDir::new().unwrap();
        let id = TileId::containing(GeoPoint::new(139.70, 35.68), ZOOM);
        create_test_tile(temp_dir.path(), id, 5.0);

        let service = ProfileService::new(temp_dir.path(), ZOOM, 10);
        service.preload(None);
        assert_eq!(service.cache_stats().entry_count, 1);
        service.shutdown();
    }
}
