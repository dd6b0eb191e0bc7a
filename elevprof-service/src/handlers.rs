//! HTTP request handlers for the profile service.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use elevprof::geojson::{add_elevations_to_geometry, profile_to_feature};
use elevprof::{ElevationError, GeoPoint, Profile};
use geojson::Geometry;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::AppState;

/// Sample count used when the request does not specify one.
pub const DEFAULT_SAMPLE_COUNT: usize = 120;

fn default_sample_count() -> usize {
    DEFAULT_SAMPLE_COUNT
}

/// Profile request body.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ProfileRequest {
    /// Start position as `[lon, lat]`.
    #[schema(example = json!([139.7454, 35.6586]))]
    pub start: Vec<f64>,
    /// End position as `[lon, lat]`.
    #[schema(example = json!([139.8107, 35.7101]))]
    pub end: Vec<f64>,
    /// Number of samples along the geodesic (2 to 2000).
    #[serde(default = "default_sample_count", alias = "sampleCount")]
    #[schema(default = 120, minimum = 2, maximum = 2000)]
    pub sample_count: usize,
}

/// Successful profile response.
///
/// All four arrays have the same length.
#[derive(Debug, Serialize, ToSchema)]
pub struct ProfileResponse {
    /// Distance of each sample from the start in meters.
    pub distances_m: Vec<f64>,
    /// Elevation of each sample in meters (null where no tile data exists).
    pub elev_m: Vec<Option<f64>>,
    /// Longitude of each sample.
    pub lngs: Vec<f64>,
    /// Latitude of each sample.
    pub lats: Vec<f64>,
}

impl From<Profile> for ProfileResponse {
    fn from(profile: Profile) -> Self {
        Self {
            lngs: profile.lngs(),
            lats: profile.lats(),
            distances_m: profile.distances_m,
            elev_m: profile.elev_m,
        }
    }
}

/// Error response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message.
    pub error: String,
}

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Service status: `healthy`, or `degraded` if the tile root is unreadable.
    pub status: String,
    /// Service version.
    pub version: String,
    /// Configured tile root directory.
    pub tile_root: String,
    /// Pyramid zoom level.
    pub zoom: u8,
    /// Whether the tile root is a readable directory.
    pub tile_root_available: bool,
}

/// Cache statistics response.
#[derive(Debug, Serialize, ToSchema)]
pub struct StatsResponse {
    /// Number of tiles in cache.
    pub cached_tiles: u64,
    /// Maximum number of tiles in cache.
    pub cache_capacity: u64,
    /// Cache hit count.
    pub cache_hits: u64,
    /// Cache miss count.
    pub cache_misses: u64,
    /// Cache hit rate (0.0 to 1.0).
    pub hit_rate: f64,
}

/// Build an elevation profile between two points.
///
/// # Returns
///
/// - `200 OK` with the sampled profile
/// - `400 Bad Request` if the body, coordinates or sample count are invalid
/// - `500 Internal Server Error` if the profile task fails
#[utoipa::path(
    post,
    path = "/profile",
    request_body = ProfileRequest,
    responses(
        (status = 200, description = "Profile computed", body = ProfileResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 500, description = "Internal error", body = ErrorResponse),
    ),
    tag = "profile"
)]
pub async fn post_profile(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ProfileRequest>, JsonRejection>,
) -> Response {
    match compute_profile(state, payload).await {
        Ok(profile) => (StatusCode::OK, Json(ProfileResponse::from(profile))).into_response(),
        Err(response) => response,
    }
}

/// Build an elevation profile and return it as a GeoJSON feature.
///
/// The feature geometry is a `LineString` of `[lon, lat, elev]` positions
/// (a `Point` for coincident endpoints); properties carry `distances_m`,
/// `elev_m` and `total_distance_m`.
#[utoipa::path(
    post,
    path = "/profile/geojson",
    request_body = ProfileRequest,
    responses(
        (status = 200, description = "GeoJSON Feature with the profile"),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 500, description = "Internal error", body = ErrorResponse),
    ),
    tag = "profile"
)]
pub async fn post_profile_geojson(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ProfileRequest>, JsonRejection>,
) -> Response {
    match compute_profile(state, payload).await {
        Ok(profile) => (StatusCode::OK, Json(profile_to_feature(&profile))).into_response(),
        Err(response) => response,
    }
}

/// Add elevations to every position of a GeoJSON geometry.
///
/// Accepts any geometry type. Positions become `[lon, lat, elevation]`, or
/// stay `[lon, lat]` where no tile covers them.
#[utoipa::path(
    post,
    path = "/elevation",
    request_body(content = String, description = "GeoJSON geometry", content_type = "application/json"),
    responses(
        (status = 200, description = "Geometry with elevations added"),
        (status = 400, description = "Invalid geometry", body = ErrorResponse),
        (status = 500, description = "Internal error", body = ErrorResponse),
    ),
    tag = "profile"
)]
pub async fn post_elevation(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Geometry>, JsonRejection>,
) -> Response {
    let geometry = match payload {
        Ok(Json(geometry)) => geometry,
        Err(rejection) => return error_response(StatusCode::BAD_REQUEST, rejection.body_text()),
    };

    let task = tokio::task::spawn_blocking(move || {
        add_elevations_to_geometry(&state.profile_service, geometry)
    });

    match task.await {
        Ok(Ok(geometry)) => (StatusCode::OK, Json(geometry)).into_response(),
        Ok(Err(e)) => library_error_response(e),
        Err(e) => {
            tracing::error!(error = %e, "Elevation task failed");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal error".to_string(),
            )
        }
    }
}

/// Health check endpoint.
///
/// Returns service status, version and tile root availability.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service status", body = HealthResponse)),
    tag = "system"
)]
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let service = &state.profile_service;
    let tile_root_available = service.check_tile_root().is_ok();

    Json(HealthResponse {
        status: if tile_root_available {
            "healthy"
        } else {
            "degraded"
        }
        .to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        tile_root: service.tile_root().display().to_string(),
        zoom: service.zoom(),
        tile_root_available,
    })
}

/// Get cache statistics.
///
/// Returns information about the tile cache.
#[utoipa::path(
    get,
    path = "/stats",
    responses((status = 200, description = "Cache statistics", body = StatsResponse)),
    tag = "system"
)]
pub async fn get_stats(State(state): State<Arc<AppState>>) -> Json<StatsResponse> {
    let stats = state.profile_service.cache_stats();

    Json(StatsResponse {
        cached_tiles: stats.entry_count,
        cache_capacity: state.profile_service.cache_capacity(),
        cache_hits: stats.hit_count,
        cache_misses: stats.miss_count,
        hit_rate: stats.hit_rate(),
    })
}

/// Validate the request and build the profile on the blocking pool.
async fn compute_profile(
    state: Arc<AppState>,
    payload: Result<Json<ProfileRequest>, JsonRejection>,
) -> Result<Profile, Response> {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            return Err(error_response(
                StatusCode::BAD_REQUEST,
                rejection.body_text(),
            ))
        }
    };

    let start = parse_position("start", &request.start)?;
    let end = parse_position("end", &request.end)?;
    let sample_count = request.sample_count;

    tracing::debug!(
        start = ?request.start,
        end = ?request.end,
        sample_count,
        "Profile query"
    );

    let task = tokio::task::spawn_blocking(move || {
        state
            .profile_service
            .build_profile(start, end, sample_count)
    });

    match task.await {
        Ok(Ok(profile)) => Ok(profile),
        Ok(Err(e)) => Err(library_error_response(e)),
        Err(e) => {
            tracing::error!(error = %e, "Profile task failed");
            Err(error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal error".to_string(),
            ))
        }
    }
}

fn parse_position(field: &str, values: &[f64]) -> Result<GeoPoint, Response> {
    match values {
        [lon, lat] => Ok(GeoPoint::new(*lon, *lat)),
        _ => Err(error_response(
            StatusCode::BAD_REQUEST,
            format!("{field} must be [lon, lat], got {} values", values.len()),
        )),
    }
}

/// Map a library error onto an HTTP response.
fn library_error_response(e: ElevationError) -> Response {
    let status = match &e {
        ElevationError::InvalidSampleCount { .. }
        | ElevationError::InvalidCoordinate { .. }
        | ElevationError::InvalidGeometry { .. } => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };

    tracing::warn!(error = %e, "Query failed");

    error_response(status, e.to_string())
}

fn error_response(status: StatusCode, error: String) -> Response {
    (status, Json(ErrorResponse { error })).into_response()
}
