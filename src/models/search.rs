// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use crate::error::SearchError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use utoipa::{IntoParams, ToSchema};

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_PER_PAGE: u32 = 10;
pub const MAX_PER_PAGE: u32 = 250;
pub const DEFAULT_SUGGEST_LIMIT: u32 = 5;

/// Query string accepted by the search endpoints, before validation.
///
/// Everything is read as text so malformed numbers turn into a proper
/// `InvalidParameter` response instead of an extractor rejection.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchQueryParams {
    /// Query text (required)
    pub q: Option<String>,
    /// Page number, starting at 1
    pub page: Option<String>,
    /// Results per page, 1..=250
    pub per_page: Option<String>,
    /// Sort expression, e.g. `createdAt:desc`
    pub sort_by: Option<String>,
}

/// Validated search parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchParams {
    pub q: String,
    pub page: u32,
    pub per_page: u32,
    pub sort_by: Option<String>,
}

impl SearchParams {
    pub fn from_query(query: &SearchQueryParams) -> Result<Self, SearchError> {
        let q = query
            .q
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .ok_or(SearchError::MissingQuery)?
            .to_string();

        let page = parse_bounded("page", query.page.as_deref(), DEFAULT_PAGE, 1, u32::MAX)?;
        let per_page = parse_bounded(
            "per_page",
            query.per_page.as_deref(),
            DEFAULT_PER_PAGE,
            1,
            MAX_PER_PAGE,
        )?;

        let sort_by = query
            .sort_by
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        Ok(Self {
            q,
            page,
            per_page,
            sort_by,
        })
    }
}

/// Parse an optional integer parameter, enforcing `min..=max`
pub fn parse_bounded(
    name: &'static str,
    raw: Option<&str>,
    default: u32,
    min: u32,
    max: u32,
) -> Result<u32, SearchError> {
    let Some(raw) = raw.map(str::trim).filter(|r| !r.is_empty()) else {
        return Ok(default);
    };

    let value = raw.parse::<u32>().map_err(|_| SearchError::InvalidParameter {
        name,
        reason: format!("'{raw}' is not a positive integer"),
    })?;

    if value < min || value > max {
        let reason = if max == u32::MAX {
            format!("must be at least {min}")
        } else {
            format!("must be between {min} and {max}")
        };
        return Err(SearchError::InvalidParameter { name, reason });
    }

    Ok(value)
}

/// Query string for the suggest endpoint
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SuggestQueryParams {
    /// Query prefix (required)
    pub q: Option<String>,
    /// Maximum number of suggestions, default 5
    pub limit: Option<String>,
}

/// Validated suggest parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestParams {
    pub q: String,
    pub limit: u32,
}

impl SuggestParams {
    pub fn from_query(query: &SuggestQueryParams) -> Result<Self, SearchError> {
        let q = query
            .q
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .ok_or(SearchError::MissingQuery)?
            .to_string();
        let limit = parse_bounded(
            "limit",
            query.limit.as_deref(),
            DEFAULT_SUGGEST_LIMIT,
            1,
            MAX_PER_PAGE,
        )?;
        Ok(Self { q, limit })
    }
}

/// Raw query body for advanced search, forwarded to the engine near-verbatim
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct AdvancedSearchRequest {
    #[serde(default)]
    pub q: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub per_page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<String>,
    /// Exact-match filters, field -> value
    #[serde(default)]
    #[schema(value_type = Object)]
    pub filters: BTreeMap<String, Value>,
    /// Engine-native filter expression, combined with `filters`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter_by: Option<String>,
    /// Comma-separated field list overriding the collection's search fields
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub highlight_fields: Option<String>,
}

/// Typo-tolerance knobs sent with a query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypoSettings {
    pub num_typos: u32,
    pub typo_tokens_threshold: u32,
}

/// Engine-agnostic query handed to a `SearchEngine`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineQuery {
    pub q: String,
    pub query_by: Vec<String>,
    pub highlight_fields: Vec<String>,
    pub page: u32,
    pub per_page: u32,
    pub sort_by: Option<String>,
    pub filter_by: Option<String>,
    pub snippet_threshold: Option<u32>,
    pub typo: Option<TypoSettings>,
}

/// One search result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SearchHit {
    /// The indexed document
    #[schema(value_type = Object)]
    pub document: Map<String, Value>,
    /// Highlighted fragments, field -> marked-up snippet
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub highlight: Option<BTreeMap<String, String>>,
    /// Relevance score
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_match: Option<f64>,
    /// Source collection (universal search only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

impl SearchHit {
    pub fn new(document: Map<String, Value>) -> Self {
        Self {
            document,
            highlight: None,
            text_match: None,
            collection: None,
            display_name: None,
            icon: None,
        }
    }
}

/// Per-collection outcome of a universal search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CollectionBreakdown {
    pub collection: String,
    pub display_name: String,
    pub icon: String,
    pub found: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Uniform search response envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SearchResponse {
    /// Total number of matching documents
    pub found: u64,
    pub hits: Vec<SearchHit>,
    pub page: u32,
    pub search_time_ms: u64,
    /// Breakdown by collection (universal search only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collections: Option<Vec<CollectionBreakdown>>,
}

/// JSON error envelope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Metadata of one searchable collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CollectionInfo {
    pub slug: String,
    pub display_name: String,
    pub icon: String,
    pub search_fields: Vec<String>,
    pub facet_fields: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CollectionsResponse {
    pub categorized: bool,
    pub collections: Vec<CollectionInfo>,
}
