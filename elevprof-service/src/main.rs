//! elevprof Service - HTTP microservice for elevation profiles.
//!
//! A REST API that samples WGS84 geodesics over a local Terrain-RGB tile
//! pyramid.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `ELEVPROF_TILE_ROOT` | Root of the `{z}/{x}/{y}` tile pyramid | `tiles/` next to the executable |
//! | `ELEVPROF_ZOOM` | Pyramid zoom level | 14 |
//! | `ELEVPROF_CACHE_SIZE` | Maximum tiles in cache | 128 |
//! | `ELEVPROF_TILE_EXT` | Tile file extension | png |
//! | `ELEVPROF_PORT` | HTTP server port | 8080 |
//! | `ELEVPROF_PRELOAD` | `all`, or `min_lat,min_lon,max_lat,max_lon[;...]` | None |
//! | `RUST_LOG` | Log level (e.g., "info", "debug") | "info" |
//!
//! ## Endpoints
//!
//! - `POST /profile` - Elevation profile between two points
//! - `POST /profile/geojson` - Same, as a GeoJSON feature
//! - `POST /elevation` - Add elevations to a GeoJSON geometry
//! - `GET /health` - Health check
//! - `GET /stats` - Cache statistics
//! - `GET /docs` - OpenAPI documentation (Swagger UI)

use std::net::SocketAddr;
use std::sync::Arc;

use elevprof::{BoundingBox, ProfileServiceBuilder};
use elevprof_service::{router, AppState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "elevprof_service=info,elevprof=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load port from environment (service-specific config)
    let port: u16 = std::env::var("ELEVPROF_PORT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(8080);

    // The library handles ELEVPROF_TILE_ROOT, ELEVPROF_ZOOM,
    // ELEVPROF_CACHE_SIZE and ELEVPROF_TILE_EXT
    let profile_service = ProfileServiceBuilder::from_env().build();

    tracing::info!(
        tile_root = %profile_service.tile_root().display(),
        zoom = profile_service.zoom(),
        extension = profile_service.extension(),
        cache_capacity = profile_service.cache_capacity(),
        port = port,
        "Starting elevprof service"
    );

    if let Err(e) = profile_service.check_tile_root() {
        tracing::warn!(error = %e, "Every sample will report no data until tiles are available");
    }

    if let Ok(preload_val) = std::env::var("ELEVPROF_PRELOAD") {
        let bounds = parse_preload_bounds(&preload_val);
        let bounds_ref = bounds.as_deref();
        tracing::info!(
            bounds = ?bounds_ref.map(|b| b.len()),
            "Preloading tiles into cache"
        );
        let stats = profile_service.preload(bounds_ref);
        tracing::info!(
            tiles_loaded = stats.tiles_loaded,
            tiles_already_cached = stats.tiles_already_cached,
            tiles_failed = stats.tiles_failed,
            tiles_matched = stats.tiles_matched,
            elapsed_ms = stats.elapsed_ms,
            "Preload complete"
        );
    }

    let state = Arc::new(AppState { profile_service });
    let app = router(Arc::clone(&state));

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // The router (and its clone of the state) is gone once serve returns.
    match Arc::try_unwrap(state) {
        Ok(state) => state.profile_service.shutdown(),
        Err(_) => tracing::warn!("Profile service still shared at exit, skipping teardown"),
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    tracing::info!("Shutdown signal received");
}

/// Parse the `ELEVPROF_PRELOAD` environment variable value into bounding boxes.
///
/// Supported formats:
/// - `true`, `all`, `1` - preload all tiles (returns `None`)
/// - `min_lat,min_lon,max_lat,max_lon` - single bounding box
/// - `min_lat,min_lon,max_lat,max_lon;min_lat,min_lon,max_lat,max_lon` - multiple bounding boxes
fn parse_preload_bounds(value: &str) -> Option<Vec<BoundingBox>> {
    let trimmed = value.trim();

    if matches!(trimmed.to_lowercase().as_str(), "true" | "all" | "1") {
        return None;
    }

    let boxes: Vec<BoundingBox> = trimmed
        .split(';')
        .filter(|s| !s.trim().is_empty())
        .filter_map(|bbox_str| match parse_bbox(bbox_str) {
            Some(bbox) => Some(bbox),
            None => {
                tracing::warn!(
                    bbox = bbox_str,
                    "Invalid bounding box format, expected min_lat,min_lon,max_lat,max_lon"
                );
                None
            }
        })
        .collect();

    if boxes.is_empty() {
        tracing::warn!(
            value = trimmed,
            "Could not parse ELEVPROF_PRELOAD value, preloading all tiles"
        );
        None
    } else {
        Some(boxes)
    }
}

fn parse_bbox(value: &str) -> Option<BoundingBox> {
    let parts = value
        .split(',')
        .map(|s| s.trim().parse::<f64>())
        .collect::<Result<Vec<_>, _>>()
        .ok()?;
    match parts.as_slice() {
        [min_lat, min_lon, max_lat, max_lon] => {
            Some(BoundingBox::new(*min_lat, *min_lon, *max_lat, *max_lon))
        }
        _ => None,
    }
}
