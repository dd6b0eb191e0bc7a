//! Terrain-RGB raster tiles and elevation decoding.
//!
//! Each pixel packs a 24-bit integer into its red, green and blue channels:
//!
//! ```text
//! elevation_m = -10000 + (R × 65536 + G × 256 + B) × 0.1
//! ```
//!
//! which covers -10000 m to +1667721.5 m at 0.1 m resolution.

use image::RgbImage;

/// Base offset of the Terrain-RGB encoding in meters.
pub const ELEVATION_OFFSET_M: f64 = -10_000.0;

/// Resolution of one encoded step in meters.
pub const ELEVATION_STEP_M: f64 = 0.1;

/// Decode one Terrain-RGB pixel into meters.
///
/// # Examples
///
/// ```
/// use elevprof::tile::decode_elevation;
///
/// assert_eq!(decode_elevation(0, 0, 0), -10000.0);
/// assert!((decode_elevation(1, 138, 136) - 100.0).abs() < 1e-9);
/// ```
#[inline]
pub fn decode_elevation(r: u8, g: u8, b: u8) -> f64 {
    let raw = (u32::from(r) << 16) | (u32::from(g) << 8) | u32::from(b);
    ELEVATION_OFFSET_M + f64::from(raw) * ELEVATION_STEP_M
}

/// Encode meters into the closest Terrain-RGB pixel.
///
/// Values outside the representable range saturate at its bounds.
pub fn encode_elevation(elevation_m: f64) -> [u8; 3] {
    let raw = ((elevation_m - ELEVATION_OFFSET_M) / ELEVATION_STEP_M)
        .round()
        .clamp(0.0, f64::from(0x00FF_FFFFu32)) as u32;
    [(raw >> 16) as u8, (raw >> 8) as u8, raw as u8]
}

/// A decoded tile: a `width × height` grid of RGB byte triples.
///
/// Immutable once constructed; the cache shares it behind an `Arc`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterTile {
    width: u32,
    height: u32,
    /// Row-major RGB bytes, row 0 is the north edge.
    data: Vec<u8>,
}

impl RasterTile {
    /// Build a tile from row-major RGB bytes.
    ///
    /// Returns `None` if `data` is not exactly `width × height × 3` bytes.
    pub fn from_rgb(width: u32, height: u32, data: Vec<u8>) -> Option<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)?
            .checked_mul(3)?;
        (data.len() == expected && expected > 0).then_some(Self {
            width,
            height,
            data,
        })
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// The `(R, G, B)` channels at `(x, y)`, clamped into the raster.
    pub fn rgb_at(&self, x: u32, y: u32) -> [u8; 3] {
        let x = x.min(self.width - 1) as usize;
        let y = y.min(self.height - 1) as usize;
        let offset = (y * self.width as usize + x) * 3;
        [
            self.data[offset],
            self.data[offset + 1],
            self.data[offset + 2],
        ]
    }

    /// Decoded elevation in meters at `(x, y)`.
    pub fn elevation_at(&self, x: u32, y: u32) -> f64 {
        let [r, g, b] = self.rgb_at(x, y);
        decode_elevation(r, g, b)
    }
}

impl From<RgbImage> for RasterTile {
    fn from(img: RgbImage) -> Self {
        Self {
            width: img.width(),
            height: img.height(),
            data: img.into_raw(),
        }
    }
}
