//! API Handlers
//!
//! HTTP request handlers that expose the cache consumer API to the host
//! process. A cache failure never turns into an error status here: misses
//! are 404s and everything else degrades inside `TieredCache`.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::Value;

use crate::cache::{CacheStats, HealthReport, HealthStatus, TieredCache};
use crate::error::{CacheError, Result};
use crate::models::requests::{validate_segment, validate_suffix};
use crate::models::{
    DeleteResponse, GetResponse, InvalidateResponse, MessageResponse, PatternRequest,
    ReinitializeResponse, SetRequest, SetResponse, SuffixQuery,
};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// The process-wide cache service
    pub cache: Arc<TieredCache>,
}

impl AppState {
    pub fn new(cache: TieredCache) -> Self {
        Self {
            cache: Arc::new(cache),
        }
    }
}

fn validate_key_parts(ty: &str, id: &str, suffix: Option<&str>) -> Result<()> {
    let problem = validate_segment("Type", ty)
        .or_else(|| validate_segment("Id", id))
        .or_else(|| validate_suffix(suffix));
    match problem {
        Some(msg) => Err(CacheError::InvalidRequest(msg)),
        None => Ok(()),
    }
}

/// Handler for GET /cache/:type/:id
pub async fn get_handler(
    State(state): State<AppState>,
    Path((ty, id)): Path<(String, String)>,
    Query(query): Query<SuffixQuery>,
) -> Result<Json<GetResponse>> {
    let suffix = query.suffix.as_deref();
    validate_key_parts(&ty, &id, suffix)?;

    let key = state.cache.namespaces().build_key(&ty, &id, suffix);
    match state.cache.get::<Value>(&ty, &id, suffix).await {
        Some(value) => Ok(Json(GetResponse::new(key, value))),
        None => Err(CacheError::NotFound(key)),
    }
}

/// Handler for PUT /cache/:type/:id
pub async fn set_handler(
    State(state): State<AppState>,
    Path((ty, id)): Path<(String, String)>,
    Json(req): Json<SetRequest>,
) -> Result<Json<SetResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }
    let suffix = req.suffix.as_deref();
    validate_key_parts(&ty, &id, suffix)?;

    let key = state.cache.namespaces().build_key(&ty, &id, suffix);
    let stored = state
        .cache
        .set(&ty, &id, &req.value, req.ttl, suffix)
        .await;

    Ok(Json(SetResponse { key, stored }))
}

/// Handler for DELETE /cache/:type/:id
pub async fn delete_handler(
    State(state): State<AppState>,
    Path((ty, id)): Path<(String, String)>,
    Query(query): Query<SuffixQuery>,
) -> Result<Json<DeleteResponse>> {
    let suffix = query.suffix.as_deref();
    validate_key_parts(&ty, &id, suffix)?;

    let key = state.cache.namespaces().build_key(&ty, &id, suffix);
    let deleted = state.cache.delete(&ty, &id, suffix).await;

    Ok(Json(DeleteResponse { key, deleted }))
}

/// Handler for POST /invalidate/pattern
pub async fn invalidate_pattern_handler(
    State(state): State<AppState>,
    Json(req): Json<PatternRequest>,
) -> Result<Json<InvalidateResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }
    let removed = state.cache.delete_pattern(&req.pattern).await;
    Ok(Json(InvalidateResponse { removed }))
}

/// Handler for POST /invalidate/entity/:id
pub async fn invalidate_entity_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<InvalidateResponse>> {
    if let Some(error_msg) = validate_segment("Id", &id) {
        return Err(CacheError::InvalidRequest(error_msg));
    }
    let removed = state.cache.invalidate_entity(&id).await;
    Ok(Json(InvalidateResponse { removed }))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<CacheStats> {
    Json(state.cache.stats())
}

/// Handler for POST /stats/reset
pub async fn reset_stats_handler(State(state): State<AppState>) -> Json<MessageResponse> {
    state.cache.reset_stats();
    Json(MessageResponse::new("Statistics reset"))
}

/// Handler for GET /health
///
/// Degraded still answers 200 since the service keeps working from the
/// local tier; only an unhealthy cache reports 503.
pub async fn health_handler(State(state): State<AppState>) -> (StatusCode, Json<HealthReport>) {
    let report = state.cache.health_check().await;
    let status = match report.status {
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
        HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
    };
    (status, Json(report))
}

/// Handler for POST /admin/reinitialize
pub async fn reinitialize_handler(
    State(state): State<AppState>,
) -> Result<Json<ReinitializeResponse>> {
    let state = state.cache.reinitialize().await?;
    Ok(Json(ReinitializeResponse { state }))
}
