// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Application state and router construction.
//!
//! This module is `pub` so that integration tests can build a test router directly
//! without starting the full binary.

use crate::models::version::VersionResponse;
use crate::routes::{health_router, hooks_router, search_router, SearchApiDoc};
use crate::services::hooks::HookBus;
use crate::services::orchestrator::SearchService;
use axum::{routing::get, Json, Router};
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Application version extracted from `Cargo.toml` at compile time.
/// The patch segment can be overridden via `SEARCH_AGENT_PATCH_VERSION` (see `build.rs`).
pub const VERSION: &str = env!("SEARCH_AGENT_VERSION");

pub const AGENT_NAME: &str = "search-sync-agent";

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// Shared application state injected into every route handler via `State<AppState>`.
#[derive(Clone)]
pub struct AppState {
    pub search: Arc<SearchService>,
    /// Webhook ingress dispatches incoming documents here
    pub hooks: Arc<HookBus>,
    /// When set, webhooks must carry a matching `x-hook-secret` header
    pub hook_secret: Option<String>,
}

impl AppState {
    pub fn new(search: Arc<SearchService>, hooks: Arc<HookBus>) -> Self {
        Self {
            search,
            hooks,
            hook_secret: None,
        }
    }

    pub fn with_hook_secret(mut self, secret: Option<String>) -> Self {
        self.hook_secret = secret.filter(|s| !s.is_empty());
        self
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /version - Agent name and build version.
#[utoipa::path(
    get,
    path = "/version",
    responses((status = 200, description = "Build version", body = VersionResponse)),
    tag = "meta"
)]
pub async fn version_handler() -> Json<VersionResponse> {
    Json(VersionResponse {
        agent: AGENT_NAME.to_string(),
        version: VERSION.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Build the Axum application router.
///
/// Search, health and webhook routes live under `base_path` (for example `/api`);
/// an empty path or `/` mounts them at the root. `/version` and Swagger UI are
/// always served from the root.
pub fn create_router(state: AppState, base_path: &str) -> Router {
    let api = Router::new()
        .merge(search_router())
        .merge(health_router())
        .merge(hooks_router())
        .with_state(state);

    let base = base_path.trim_end_matches('/');
    let app = Router::new().route("/version", get(version_handler));
    let app = if base.is_empty() {
        app.merge(api)
    } else {
        app.nest(base, api)
    };

    app.merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", SearchApiDoc::openapi()))
}
