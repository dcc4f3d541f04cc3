// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Search route handlers.

use crate::app::AppState;
use crate::error::SearchError;
use crate::models::search::{
    AdvancedSearchRequest, CollectionsResponse, ErrorResponse, SearchParams, SearchQueryParams,
    SearchResponse, SuggestParams, SuggestQueryParams,
};
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    routing::get,
    Json, Router,
};

/// Create the search router. Mounted under the configured base path.
pub fn search_router() -> Router<AppState> {
    Router::new()
        .route("/search", get(search_all_handler))
        .route("/search/collections", get(list_collections_handler))
        .route(
            "/search/{collection_name}",
            get(search_collection_handler).post(advanced_search_handler),
        )
        .route("/search/{collection_name}/suggest", get(suggest_handler))
}

/// GET /search - Search every enabled collection.
#[utoipa::path(
    get,
    path = "/search",
    params(SearchQueryParams),
    responses(
        (status = 200, description = "Merged results across collections", body = SearchResponse),
        (status = 400, description = "Missing or invalid parameters", body = ErrorResponse),
        (status = 500, description = "Search failed", body = ErrorResponse)
    ),
    tag = "search"
)]
pub async fn search_all_handler(
    State(state): State<AppState>,
    Query(query): Query<SearchQueryParams>,
) -> Result<Json<SearchResponse>, SearchError> {
    let params = SearchParams::from_query(&query)?;
    Ok(Json(state.search.search_all(&params).await?))
}

/// GET /search/collections - Enabled collections and their metadata.
#[utoipa::path(
    get,
    path = "/search/collections",
    responses(
        (status = 200, description = "Enabled collections", body = CollectionsResponse)
    ),
    tag = "search"
)]
pub async fn list_collections_handler(State(state): State<AppState>) -> Json<CollectionsResponse> {
    Json(state.search.list_collections())
}

/// GET /search/{collection_name} - Search one collection.
#[utoipa::path(
    get,
    path = "/search/{collection_name}",
    params(
        ("collection_name" = String, Path, description = "Collection slug"),
        SearchQueryParams
    ),
    responses(
        (status = 200, description = "Search results", body = SearchResponse),
        (status = 400, description = "Missing parameters or collection not enabled", body = ErrorResponse),
        (status = 404, description = "Collection missing from the engine", body = ErrorResponse),
        (status = 500, description = "Search failed", body = ErrorResponse)
    ),
    tag = "search"
)]
pub async fn search_collection_handler(
    State(state): State<AppState>,
    Path(collection_name): Path<String>,
    Query(query): Query<SearchQueryParams>,
) -> Result<Json<SearchResponse>, SearchError> {
    let params = SearchParams::from_query(&query)?;
    Ok(Json(
        state
            .search
            .search_collection(&collection_name, &params)
            .await?,
    ))
}

/// POST /search/{collection_name} - Advanced search with a raw query body.
#[utoipa::path(
    post,
    path = "/search/{collection_name}",
    params(("collection_name" = String, Path, description = "Collection slug")),
    request_body = AdvancedSearchRequest,
    responses(
        (status = 200, description = "Search results", body = SearchResponse),
        (status = 400, description = "Collection not enabled or malformed body", body = ErrorResponse),
        (status = 500, description = "Advanced search failed", body = ErrorResponse)
    ),
    tag = "search"
)]
pub async fn advanced_search_handler(
    State(state): State<AppState>,
    Path(collection_name): Path<String>,
    body: Result<Json<AdvancedSearchRequest>, JsonRejection>,
) -> Result<Json<SearchResponse>, SearchError> {
    let Json(request) = body.map_err(|e| SearchError::InvalidParameter {
        name: "body",
        reason: e.body_text(),
    })?;
    Ok(Json(
        state
            .search
            .advanced_search(&collection_name, request)
            .await?,
    ))
}

/// GET /search/{collection_name}/suggest - Typeahead suggestions.
#[utoipa::path(
    get,
    path = "/search/{collection_name}/suggest",
    params(
        ("collection_name" = String, Path, description = "Collection slug"),
        SuggestQueryParams
    ),
    responses(
        (status = 200, description = "At most `limit` suggestions", body = SearchResponse),
        (status = 400, description = "Missing parameters or collection not enabled", body = ErrorResponse),
        (status = 404, description = "Collection missing from the engine", body = ErrorResponse)
    ),
    tag = "search"
)]
pub async fn suggest_handler(
    State(state): State<AppState>,
    Path(collection_name): Path<String>,
    Query(query): Query<SuggestQueryParams>,
) -> Result<Json<SearchResponse>, SearchError> {
    let params = SuggestParams::from_query(&query)?;
    Ok(Json(state.search.suggest(&collection_name, &params).await?))
}
