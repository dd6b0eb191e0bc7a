//! Web-Mercator tile addressing.
//!
//! Maps WGS84 positions onto the standard "slippy map" tile pyramid and onto
//! pixel positions inside a tile.
//!
//! # Addressing
//!
//! At zoom `z` the world is split into `2^z × 2^z` tiles. Tile `x` grows
//! eastwards from the antimeridian; tile `y` grows southwards from the
//! northern Mercator limit (±85.0511°). Inside a tile, column 0 is the west
//! edge and row 0 is the north edge.

use std::f64::consts::PI;
use std::fmt;

use crate::point::GeoPoint;

/// WGS84 semi-major axis used by the spherical Web-Mercator projection.
pub const EARTH_RADIUS_M: f64 = 6_378_137.0;

/// Latitude limit of the Web-Mercator projection in degrees.
pub const MAX_LATITUDE: f64 = 85.051_128_779_806_59;

/// Deepest supported zoom level.
pub const MAX_ZOOM: u8 = 24;

/// Identifies one tile in the pyramid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileId {
    /// Zoom level.
    pub zoom: u8,
    /// Column, 0 at the antimeridian.
    pub x: u32,
    /// Row, 0 at the northern limit.
    pub y: u32,
}

impl fmt::Display for TileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.zoom, self.x, self.y)
    }
}

/// Geographic extent of a tile in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileBounds {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl TileId {
    /// Create a new tile identifier.
    pub fn new(zoom: u8, x: u32, y: u32) -> Self {
        Self { zoom, x, y }
    }

    /// Returns the tile covering `point` at `zoom`.
    ///
    /// Latitudes beyond the Mercator limit are clamped to it, and positions
    /// on the antimeridian or the southern limit land in the last column/row.
    pub fn containing(point: GeoPoint, zoom: u8) -> Self {
        let n = tiles_per_axis(zoom);
        let lon = point.lon.clamp(-180.0, 180.0);
        let lat = point.lat.clamp(-MAX_LATITUDE, MAX_LATITUDE);

        let fx = (lon + 180.0) / 360.0 * n;
        let lat_rad = lat.to_radians();
        let fy = (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0 * n;

        Self {
            zoom,
            x: clamp_index(fx, n),
            y: clamp_index(fy, n),
        }
    }

    /// Geographic bounds of this tile.
    pub fn bounds(&self) -> TileBounds {
        let n = tiles_per_axis(self.zoom);
        TileBounds {
            west: self.x as f64 / n * 360.0 - 180.0,
            east: (self.x as f64 + 1.0) / n * 360.0 - 180.0,
            north: row_to_lat(self.y as f64, n),
            south: row_to_lat(self.y as f64 + 1.0, n),
        }
    }
}

/// Position of a WGS84 point inside a specific tile.
///
/// The fractional offsets are kept independent of the raster size, which is
/// only known once the tile has been decoded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelAddress {
    /// Tile covering the point.
    pub tile: TileId,
    /// Horizontal offset from the west edge, as a fraction of tile width.
    pub frac_x: f64,
    /// Vertical offset from the north edge, as a fraction of tile height.
    pub frac_y: f64,
}

impl PixelAddress {
    /// Fractional pixel position for a raster of the given size.
    pub fn fractional_pixel(&self, width: u32, height: u32) -> (f64, f64) {
        (self.frac_x * width as f64, self.frac_y * height as f64)
    }

    /// Integer pixel `(column, row)` for a raster of the given size.
    ///
    /// Truncates the fractional position and clamps it into
    /// `[0, width-1] × [0, height-1]`.
    pub fn pixel(&self, width: u32, height: u32) -> (u32, u32) {
        let (fx, fy) = self.fractional_pixel(width, height);
        (clamp_pixel(fx, width), clamp_pixel(fy, height))
    }
}

/// Resolves WGS84 points to tile pixel addresses at a fixed zoom.
#[derive(Debug, Clone, Copy)]
pub struct TileAddressResolver {
    zoom: u8,
}

impl TileAddressResolver {
    /// Create a resolver for `zoom` (clamped to [`MAX_ZOOM`]).
    pub fn new(zoom: u8) -> Self {
        Self {
            zoom: zoom.min(MAX_ZOOM),
        }
    }

    /// The zoom level this resolver addresses.
    pub fn zoom(&self) -> u8 {
        self.zoom
    }

    /// Resolve `point` to its tile and position within that tile.
    pub fn resolve(&self, point: GeoPoint) -> PixelAddress {
        resolve(point, self.zoom)
    }
}

/// Resolve `point` to its tile at `zoom` and its fractional position inside it.
///
/// The tile's corners and the point are projected to Web-Mercator meters and
/// the point is interpolated linearly inside the projected box.
pub fn resolve(point: GeoPoint, zoom: u8) -> PixelAddress {
    let tile = TileId::containing(point, zoom);
    let b = tile.bounds();

    let lon = point.lon.clamp(-180.0, 180.0);
    let lat = point.lat.clamp(-MAX_LATITUDE, MAX_LATITUDE);
    let (px, py) = lon_lat_to_meters(lon, lat);
    let (min_x, min_y) = lon_lat_to_meters(b.west, b.south);
    let (max_x, max_y) = lon_lat_to_meters(b.east, b.north);

    PixelAddress {
        tile,
        frac_x: (px - min_x) / (max_x - min_x),
        frac_y: (max_y - py) / (max_y - min_y),
    }
}

/// Project a WGS84 position to Web-Mercator (EPSG:3857) meters.
pub fn lon_lat_to_meters(lon: f64, lat: f64) -> (f64, f64) {
    let x = EARTH_RADIUS_M * lon.to_radians();
    let y = EARTH_RADIUS_M * (PI / 4.0 + lat.to_radians() / 2.0).tan().ln();
    (x, y)
}

fn tiles_per_axis(zoom: u8) -> f64 {
    (1u64 << zoom.min(MAX_ZOOM)) as f64
}

fn row_to_lat(row: f64, n: f64) -> f64 {
    (PI * (1.0 - 2.0 * row / n)).sinh().atan().to_degrees()
}

fn clamp_index(f: f64, n: f64) -> u32 {
    (f.floor().max(0.0).min(n - 1.0)) as u32
}

fn clamp_pixel(f: f64, size: u32) -> u32 {
    // `as` saturates and maps NaN to 0
    let i = f as i64;
    i.clamp(0, i64::from(size.max(1)) - 1) as u32
}
