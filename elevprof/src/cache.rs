//! Bounded LRU cache of decoded tiles.
//!
//! [`TileCache`] sits in front of a [`TileStore`] and is shared by every
//! in-flight profile query. Resident tiles are immutable and handed out as
//! `Arc<RasterTile>`, so readers never observe a tile while it is written or
//! evicted.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use moka::policy::EvictionPolicy;
use moka::sync::Cache;

use crate::error::ElevationError;
use crate::mercator::TileId;
use crate::store::TileStore;
use crate::tile::RasterTile;

/// Default number of resident tiles.
pub const DEFAULT_CACHE_SIZE: u64 = 128;

/// Statistics about cache usage.
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    /// Number of tiles currently in the cache.
    pub entry_count: u64,
    /// Number of cache hits (requests served from cache).
    pub hit_count: u64,
    /// Number of cache misses (requests that went to the store).
    pub miss_count: u64,
}

impl CacheStats {
    /// Calculate the cache hit rate (0.0 to 1.0).
    ///
    /// Returns 0.0 if no requests have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hit_count + self.miss_count;
        if total == 0 {
            0.0
        } else {
            self.hit_count as f64 / total as f64
        }
    }
}

/// LRU cache of decoded tiles, populated from a [`TileStore`] on miss.
///
/// Missing tiles are never cached, so a tile written to disk after a failed
/// lookup is picked up by the next request. Concurrent misses on the same
/// tile are coalesced into a single store read.
///
/// The capacity bound is enforced at each insert boundary: evictions are
/// applied when the inserting call finishes, so concurrent inserts may
/// briefly hold more than `capacity` tiles until those calls return.
pub struct TileCache {
    store: TileStore,
    /// Keyed by tile id; the moka cache serializes its own bookkeeping.
    tiles: Cache<TileId, Arc<RasterTile>>,
    capacity: u64,
    hit_count: AtomicU64,
    miss_count: AtomicU64,
}

impl TileCache {
    /// Create a cache holding at most `capacity` tiles (at least 1).
    pub fn new(store: TileStore, capacity: u64) -> Self {
        let capacity = capacity.max(1);
        Self {
            store,
            tiles: Cache::builder()
                .max_capacity(capacity)
                .eviction_policy(EvictionPolicy::lru())
                .build(),
            capacity,
            hit_count: AtomicU64::new(0),
            miss_count: AtomicU64::new(0),
        }
    }

    /// The backing tile store.
    pub fn store(&self) -> &TileStore {
        &self.store
    }

    /// Get the tile `id` from cache, loading it from the store on miss.
    ///
    /// Returns `None` if the tile is missing or fails to decode.
    pub fn get_or_load(&self, id: TileId) -> Option<Arc<RasterTile>> {
        if let Some(tile) = self.tiles.get(&id) {
            self.hit_count.fetch_add(1, Ordering::Relaxed);
            return Some(tile);
        }

        self.miss_count.fetch_add(1, Ordering::Relaxed);

        let loaded = self.tiles.try_get_with(id, || {
            self.store
                .load(id)
                .map(Arc::new)
                .ok_or(ElevationError::TileNotFound {
                    path: self.store.tile_path(id),
                })
        });

        match loaded {
            Ok(tile) => {
                // Apply the insert and any evictions now so the resident
                // count never stays above capacity.
                self.tiles.run_pending_tasks();
                Some(tile)
            }
            Err(_) => None,
        }
    }

    /// Returns true if `id` is resident. Does not affect recency.
    pub fn contains(&self, id: TileId) -> bool {
        self.tiles.contains_key(&id)
    }

    /// Remove a single tile from the cache.
    pub fn invalidate(&self, id: TileId) {
        self.tiles.invalidate(&id);
        self.tiles.run_pending_tasks();
    }

    /// Remove every tile from the cache.
    pub fn clear(&self) {
        self.tiles.invalidate_all();
        self.tiles.run_pending_tasks();
    }

    /// Maximum number of resident tiles.
    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    /// Number of resident tiles.
    pub fn entry_count(&self) -> u64 {
        self.tiles.run_pending_tasks();
        self.tiles.entry_count()
    }

    /// Get cache statistics.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entry_count: self.entry_count(),
            hit_count: self.hit_count.load(Ordering::Relaxed),
            miss_count: self.miss_count.load(Ordering::Relaxed),
        }
    }
}
