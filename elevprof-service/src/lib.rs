//! elevprof Service Library
//!
//! HTTP handlers, router and OpenAPI document for the elevation profile
//! service. This library is used by both the elevprof-service binary and
//! integration tests.

pub mod handlers;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use elevprof::ProfileService;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Application state shared across handlers.
pub struct AppState {
    /// Profile service owning the tile cache.
    pub profile_service: ProfileService,
}

// Re-export commonly used types for convenience
pub use handlers::{
    ErrorResponse, HealthResponse, ProfileRequest, ProfileResponse, StatsResponse,
    DEFAULT_SAMPLE_COUNT,
};

/// OpenAPI documentation for the profile service.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "elevprof Profile Service",
        version = "0.1.0",
        description = "REST API for elevation profiles sampled along WGS84 geodesics from Terrain-RGB tiles.",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    paths(
        handlers::post_profile,
        handlers::post_profile_geojson,
        handlers::post_elevation,
        handlers::health_check,
        handlers::get_stats,
    ),
    components(
        schemas(
            handlers::ProfileRequest,
            handlers::ProfileResponse,
            handlers::ErrorResponse,
            handlers::HealthResponse,
            handlers::StatsResponse,
        )
    ),
    tags(
        (name = "profile", description = "Elevation profile endpoints"),
        (name = "system", description = "System and health endpoints")
    )
)]
pub struct ApiDoc;

/// Build the router with all endpoints, Swagger UI, tracing and CORS.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/profile", post(handlers::post_profile))
        .route("/profile/geojson", post(handlers::post_profile_geojson))
        .route("/elevation", post(handlers::post_elevation))
        .route("/health", get(handlers::health_check))
        .route("/stats", get(handlers::get_stats))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
