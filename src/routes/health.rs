// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use crate::app::AppState;
use crate::models::health::{DetailedHealthResponse, HealthResponse};
use axum::{extract::State, http::StatusCode, routing::get, Json, Router};

pub fn health_router() -> Router<AppState> {
    Router::new()
        .route("/search/health", get(health_handler))
        .route("/search/health/detailed", get(detailed_health_handler))
}

/// GET /search/health - Engine connectivity, collections and cache stats.
#[utoipa::path(
    get,
    path = "/search/health",
    responses(
        (status = 200, description = "Engine reachable with at least one collection", body = HealthResponse),
        (status = 503, description = "Engine unreachable or empty", body = HealthResponse)
    ),
    tag = "health"
)]
pub async fn health_handler(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let health = state.search.health().await;
    let status = if health.is_healthy() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(health))
}

/// GET /search/health/detailed - Per-collection stats and masked config.
#[utoipa::path(
    get,
    path = "/search/health/detailed",
    responses(
        (status = 200, description = "Extended health report", body = DetailedHealthResponse)
    ),
    tag = "health"
)]
pub async fn detailed_health_handler(
    State(state): State<AppState>,
) -> Json<DetailedHealthResponse> {
    Json(state.search.health_detailed().await)
}
