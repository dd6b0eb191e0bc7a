//! On-disk tile pyramid access.
//!
//! Tiles live at `{root}/{zoom}/{x}/{y}.{ext}`, one image per tile.
//! [`TileStore`] has no caching policy of its own; every call reads storage.

use std::path::{Path, PathBuf};

use image::{ImageError, ImageReader};

use crate::error::{ElevationError, Result};
use crate::mercator::TileId;
use crate::tile::RasterTile;

/// Default tile file extension.
pub const DEFAULT_EXTENSION: &str = "png";

/// Reads decoded tiles from a `{root}/{zoom}/{x}/{y}.{ext}` directory tree.
#[derive(Debug, Clone)]
pub struct TileStore {
    root: PathBuf,
    extension: String,
}

impl TileStore {
    /// Create a store rooted at `root` reading files with `extension`.
    ///
    /// A leading dot in `extension` is ignored.
    pub fn new<P: AsRef<Path>>(root: P, extension: &str) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            extension: extension.trim_start_matches('.').to_string(),
        }
    }

    /// The tile root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The tile file extension, without a leading dot.
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Path of the file holding `id`.
    ///
    /// # Examples
    ///
    /// ```
    /// use elevprof::{TileId, TileStore};
    /// use std::path::Path;
    ///
    /// let store = TileStore::new("/srv/tiles", "png");
    /// assert_eq!(
    ///     store.tile_path(TileId::new(14, 14552, 6451)),
    ///     Path::new("/srv/tiles/14/14552/6451.png")
    /// );
    /// ```
    pub fn tile_path(&self, id: TileId) -> PathBuf {
        self.root
            .join(id.zoom.to_string())
            .join(id.x.to_string())
            .join(format!("{}.{}", id.y, self.extension))
    }

    /// Read and decode the tile `id`.
    ///
    /// # Errors
    ///
    /// - [`ElevationError::TileNotFound`] if the file does not exist
    /// - [`ElevationError::TileDecode`] if the file cannot be read, or its
    ///   contents are not a supported image (PNG or WebP)
    pub fn read(&self, id: TileId) -> Result<RasterTile> {
        let path = self.tile_path(id);
        if !path.is_file() {
            return Err(ElevationError::TileNotFound { path });
        }

        // The file contents pick the decoder, so the configured extension
        // need not name the encoding.
        let img = ImageReader::open(&path)
            .and_then(|reader| reader.with_guessed_format())
            .map_err(ImageError::IoError)
            .and_then(|reader| reader.decode())
            .map_err(|source| ElevationError::TileDecode {
                path: path.clone(),
                source,
            })?;

        Ok(RasterTile::from(img.into_rgb8()))
    }

    /// Load the tile `id`, or `None` if it is missing or unreadable.
    ///
    /// Decode failures are logged and otherwise treated like absence.
    pub fn load(&self, id: TileId) -> Option<RasterTile> {
        match self.read(id) {
            Ok(tile) => {
                tracing::debug!(
                    tile = %id,
                    width = tile.width(),
                    height = tile.height(),
                    "Tile loaded"
                );
                Some(tile)
            }
            Err(ElevationError::TileNotFound { path }) => {
                tracing::debug!(tile = %id, path = %path.display(), "Tile not found");
                None
            }
            Err(e) => {
                tracing::warn!(tile = %id, error = %e, "Tile unreadable, treating as missing");
                None
            }
        }
    }

    /// List every tile present at `zoom`, sorted.
    ///
    /// Entries whose directory or file name is not a tile coordinate are
    /// skipped. An unreadable root yields an empty list.
    pub fn scan(&self, zoom: u8) -> Vec<TileId> {
        let zoom_dir = self.root.join(zoom.to_string());
        let columns = match std::fs::read_dir(&zoom_dir) {
            Ok(entries) => entries,
            Err(_) => return Vec::new(),
        };

        let mut tiles = Vec::new();
        for column in columns.flatten() {
            let x: u32 = match column.file_name().to_str().and_then(|s| s.parse().ok()) {
                Some(x) => x,
                None => continue,
            };
            let rows = match std::fs::read_dir(column.path()) {
                Ok(entries) => entries,
                Err(_) => continue,
            };

            for row in rows.flatten() {
                let path = row.path();
                if path.extension().and_then(|e| e.to_str()) != Some(self.extension.as_str()) {
                    continue;
                }
                if let Some(y) = path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .and_then(|s| s.parse().ok())
                {
                    tiles.push(TileId::new(zoom, x, y));
                }
            }
        }

        tiles.sort();
        tiles
    }

    /// Check that the root exists and is a readable directory.
    ///
    /// # Errors
    ///
    /// Returns [`ElevationError::TileRootUnavailable`] otherwise.
    pub fn check_root(&self) -> Result<()> {
        match std::fs::read_dir(&self.root) {
            Ok(_) => Ok(()),
            Err(_) => Err(ElevationError::TileRootUnavailable {
                path: self.root.clone(),
            }),
        }
    }
}
