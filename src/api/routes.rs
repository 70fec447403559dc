//! API Routes
//!
//! Configures the Axum router for the host API.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    delete_handler, get_handler, health_handler, invalidate_entity_handler,
    invalidate_pattern_handler, reinitialize_handler, reset_stats_handler, set_handler,
    stats_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET|PUT|DELETE /cache/:type/:id` - single-key access (`?suffix=` on GET/DELETE)
/// - `POST /invalidate/pattern` - glob invalidation
/// - `POST /invalidate/entity/:id` - drop all keys derived from an entity
/// - `GET /stats`, `POST /stats/reset` - statistics
/// - `GET /health` - round-trip probe of both tiers
/// - `POST /admin/reinitialize` - reconnect the primary tier
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route(
            "/cache/:type/:id",
            get(get_handler).put(set_handler).delete(delete_handler),
        )
        .route("/invalidate/pattern", post(invalidate_pattern_handler))
        .route("/invalidate/entity/:id", post(invalidate_entity_handler))
        .route("/stats", get(stats_handler))
        .route("/stats/reset", post(reset_stats_handler))
        .route("/health", get(health_handler))
        .route("/admin/reinitialize", post(reinitialize_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
