// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Error types shared by the search handlers and startup code.

use crate::models::search::ErrorResponse;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

/// Configuration problems found at startup; fatal to initialization
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid plugin configuration: {}", .0.join("; "))]
    Invalid(Vec<String>),
}

/// Failures surfaced by the HTTP search endpoints
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Query parameter \"q\" is required")]
    MissingQuery,

    #[error("Invalid parameter \"{name}\": {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("Collection not enabled for search")]
    CollectionNotEnabled(String),

    #[error("Collection not found in search engine")]
    CollectionNotFound(String),

    #[error("No collections enabled for search")]
    NoCollectionsEnabled,

    #[error("Advanced search failed")]
    AdvancedSearchFailed(String),

    #[error("Search failed")]
    Engine(String),

    #[error("Search handler failed")]
    Handler(String),

    #[error("Invalid hook secret")]
    Unauthorized,
}

impl SearchError {
    pub fn status(&self) -> StatusCode {
        match self {
            SearchError::MissingQuery
            | SearchError::InvalidParameter { .. }
            | SearchError::CollectionNotEnabled(_)
            | SearchError::NoCollectionsEnabled => StatusCode::BAD_REQUEST,
            SearchError::CollectionNotFound(_) => StatusCode::NOT_FOUND,
            SearchError::Unauthorized => StatusCode::UNAUTHORIZED,
            SearchError::AdvancedSearchFailed(_)
            | SearchError::Engine(_)
            | SearchError::Handler(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            SearchError::MissingQuery => "MISSING_QUERY",
            SearchError::InvalidParameter { .. } => "INVALID_PARAMETER",
            SearchError::CollectionNotEnabled(_) => "COLLECTION_NOT_ENABLED",
            SearchError::CollectionNotFound(_) => "COLLECTION_NOT_FOUND",
            SearchError::NoCollectionsEnabled => "NO_COLLECTIONS_ENABLED",
            SearchError::AdvancedSearchFailed(_) => "ADVANCED_SEARCH_FAILED",
            SearchError::Engine(_) => "SEARCH_FAILED",
            SearchError::Handler(_) => "HANDLER_FAILED",
            SearchError::Unauthorized => "UNAUTHORIZED",
        }
    }

    fn details(&self) -> Option<String> {
        match self {
            SearchError::InvalidParameter { reason, .. } => Some(reason.clone()),
            SearchError::CollectionNotEnabled(name) => Some(format!(
                "Collection \"{name}\" is not configured or not enabled for search"
            )),
            SearchError::CollectionNotFound(name) => Some(format!(
                "Collection \"{name}\" does not exist in the search engine; \
                 restart the server to initialize collections"
            )),
            SearchError::AdvancedSearchFailed(msg)
            | SearchError::Engine(msg)
            | SearchError::Handler(msg) => Some(msg.clone()),
            SearchError::MissingQuery
            | SearchError::NoCollectionsEnabled
            | SearchError::Unauthorized => None,
        }
    }

    pub fn to_body(&self) -> ErrorResponse {
        let error = match self {
            // The parameter name is part of the details for this one
            SearchError::InvalidParameter { name, .. } => format!("Invalid \"{name}\" parameter"),
            other => other.to_string(),
        };
        ErrorResponse {
            error,
            code: self.code().to_string(),
            details: self.details(),
        }
    }
}

impl IntoResponse for SearchError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.to_body())).into_response()
    }
}
