// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Webhook ingress for CMS lifecycle events.

use crate::app::AppState;
use crate::error::SearchError;
use crate::models::document::JsonDocument;
use crate::models::search::ErrorResponse;
use crate::services::hooks::HookEvent;
use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

pub const HOOK_SECRET_HEADER: &str = "x-hook-secret";

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DispatchResponse {
    /// Number of callbacks that received the document
    pub dispatched: usize,
}

pub fn hooks_router() -> Router<AppState> {
    Router::new()
        .route("/hooks/{collection}/change", post(change_hook_handler))
        .route("/hooks/{collection}/delete", post(delete_hook_handler))
}

fn check_secret(state: &AppState, headers: &HeaderMap) -> Result<(), SearchError> {
    let Some(expected) = state.hook_secret.as_deref() else {
        return Ok(());
    };
    let provided = headers
        .get(HOOK_SECRET_HEADER)
        .and_then(|v| v.to_str().ok());
    if provided == Some(expected) {
        Ok(())
    } else {
        Err(SearchError::Unauthorized)
    }
}

async fn dispatch(
    state: &AppState,
    headers: &HeaderMap,
    event: HookEvent,
    collection: &str,
    doc: Value,
) -> Result<(StatusCode, Json<DispatchResponse>), SearchError> {
    check_secret(state, headers)?;
    let dispatched = state
        .hooks
        .dispatch(event, collection, JsonDocument::from_value(doc))
        .await;
    tracing::debug!(collection, %event, dispatched, "Webhook dispatched");
    Ok((StatusCode::ACCEPTED, Json(DispatchResponse { dispatched })))
}

/// POST /hooks/{collection}/change - A document was created or updated.
#[utoipa::path(
    post,
    path = "/hooks/{collection}/change",
    params(("collection" = String, Path, description = "Collection slug")),
    responses(
        (status = 202, description = "Document handed to sync", body = DispatchResponse),
        (status = 401, description = "Hook secret mismatch", body = ErrorResponse)
    ),
    tag = "hooks"
)]
pub async fn change_hook_handler(
    State(state): State<AppState>,
    Path(collection): Path<String>,
    headers: HeaderMap,
    Json(doc): Json<Value>,
) -> Result<(StatusCode, Json<DispatchResponse>), SearchError> {
    dispatch(&state, &headers, HookEvent::AfterChange, &collection, doc).await
}

/// POST /hooks/{collection}/delete - A document was deleted.
#[utoipa::path(
    post,
    path = "/hooks/{collection}/delete",
    params(("collection" = String, Path, description = "Collection slug")),
    responses(
        (status = 202, description = "Document handed to sync", body = DispatchResponse),
        (status = 401, description = "Hook secret mismatch", body = ErrorResponse)
    ),
    tag = "hooks"
)]
pub async fn delete_hook_handler(
    State(state): State<AppState>,
    Path(collection): Path<String>,
    headers: HeaderMap,
    Json(doc): Json<Value>,
) -> Result<(StatusCode, Json<DispatchResponse>), SearchError> {
    dispatch(&state, &headers, HookEvent::AfterDelete, &collection, doc).await
}
