// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Route handlers for the HTTP API.

pub mod health;
pub mod hooks;
pub mod search;

pub use health::health_router;
pub use hooks::hooks_router;
pub use search::search_router;

use crate::models::health::{
    CacheStats, CollectionHealth, DetailedHealthResponse, EngineStatus, HealthResponse,
};
use crate::models::search::{
    AdvancedSearchRequest, CollectionBreakdown, CollectionInfo, CollectionsResponse,
    ErrorResponse, SearchHit, SearchResponse,
};
use crate::models::version::VersionResponse;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        search::search_all_handler,
        search::list_collections_handler,
        search::search_collection_handler,
        search::advanced_search_handler,
        search::suggest_handler,
        health::health_handler,
        health::detailed_health_handler,
        hooks::change_hook_handler,
        hooks::delete_hook_handler,
        crate::app::version_handler,
    ),
    components(schemas(
        AdvancedSearchRequest,
        CacheStats,
        CollectionBreakdown,
        CollectionHealth,
        CollectionInfo,
        CollectionsResponse,
        DetailedHealthResponse,
        EngineStatus,
        ErrorResponse,
        HealthResponse,
        SearchHit,
        SearchResponse,
        VersionResponse,
        hooks::DispatchResponse,
    )),
    tags(
        (name = "search", description = "Collection and universal search"),
        (name = "health", description = "Engine and cache health"),
        (name = "hooks", description = "CMS lifecycle webhooks")
    )
)]
pub struct SearchApiDoc;
