// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Search request orchestration: collection checks, caching, and the
//! multi-collection fan-out behind universal search.

use crate::error::SearchError;
use crate::models::config::{CollectionConfig, PluginConfig};
use crate::models::health::{
    CacheStats, CollectionHealth, DetailedHealthResponse, EngineStatus, HealthResponse,
};
use crate::models::search::{
    AdvancedSearchRequest, CollectionBreakdown, CollectionInfo, CollectionsResponse, EngineQuery,
    SearchParams, SearchResponse, SuggestParams, TypoSettings, DEFAULT_PAGE, DEFAULT_PER_PAGE,
    MAX_PER_PAGE,
};
use crate::services::cache::{CacheOptions, SearchCache};
use crate::services::logging::mask_secret;
use crate::services::search::{build_filter, EngineCollection, EngineError, SearchEngine};
use futures::future::join_all;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Cache scope for merged multi-collection responses
pub const UNIVERSAL_SCOPE: &str = "universal";

/// Values shorter than this are highlighted whole instead of snippeted
const SNIPPET_THRESHOLD: u32 = 30;

/// Exact-leaning typo settings for collection and universal search
const STRICT_TYPOS: TypoSettings = TypoSettings {
    num_typos: 0,
    typo_tokens_threshold: 1,
};

pub struct SearchService {
    engine: Arc<dyn SearchEngine>,
    config: Arc<PluginConfig>,
    cache: SearchCache,
}

fn search_field_keys(config: &CollectionConfig) -> Vec<String> {
    config.search_fields.iter().map(|f| f.key()).collect()
}

fn collection_query(
    config: &CollectionConfig,
    q: &str,
    page: u32,
    per_page: u32,
    sort_by: Option<String>,
) -> EngineQuery {
    let fields = search_field_keys(config);
    EngineQuery {
        q: q.to_string(),
        highlight_fields: fields.clone(),
        query_by: fields,
        page,
        per_page,
        sort_by,
        filter_by: None,
        snippet_threshold: Some(SNIPPET_THRESHOLD),
        typo: Some(STRICT_TYPOS),
    }
}

fn split_fields(raw: Option<&str>) -> Option<Vec<String>> {
    let fields: Vec<String> = raw?
        .split(',')
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .map(str::to_string)
        .collect();
    (!fields.is_empty()).then_some(fields)
}

impl SearchService {
    pub fn new(engine: Arc<dyn SearchEngine>, config: Arc<PluginConfig>) -> Self {
        let cache = SearchCache::new(
            config.settings.cache.max_size,
            Duration::from_secs(config.settings.cache.ttl_secs),
        );
        Self {
            engine,
            config,
            cache,
        }
    }

    pub fn config(&self) -> &PluginConfig {
        &self.config
    }

    pub fn engine(&self) -> Arc<dyn SearchEngine> {
        self.engine.clone()
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    fn enabled_collection(&self, name: &str) -> Result<&CollectionConfig, SearchError> {
        self.config
            .enabled_collection(name)
            .ok_or_else(|| SearchError::CollectionNotEnabled(name.to_string()))
    }

    /// Enabled-in-config and present-in-engine check shared by collection-scoped handlers
    async fn searchable_collection(&self, name: &str) -> Result<&CollectionConfig, SearchError> {
        let config = self.enabled_collection(name)?;

        match self.engine.collection_exists(name).await {
            Ok(_) => Ok(config),
            Err(EngineError::NotFound(_)) => Err(SearchError::CollectionNotFound(name.to_string())),
            Err(e) => {
                tracing::error!(collection = name, error = %e, "Failed to look up search collection");
                Err(SearchError::Engine(e.to_string()))
            }
        }
    }

    /// Search a single enabled collection
    pub async fn search_collection(
        &self,
        name: &str,
        params: &SearchParams,
    ) -> Result<SearchResponse, SearchError> {
        let config = self.searchable_collection(name).await?;

        let options = CacheOptions {
            page: params.page,
            per_page: params.per_page,
            sort_by: params.sort_by.clone(),
            ..Default::default()
        };
        if let Some(cached) = self.cache.get(&params.q, name, &options) {
            return Ok(cached);
        }

        let query = collection_query(
            config,
            &params.q,
            params.page,
            params.per_page,
            params.sort_by.clone(),
        );
        let response = self.engine.search(name, &query).await.map_err(|e| {
            tracing::error!(collection = name, error = %e, "Search request failed");
            SearchError::Engine(e.to_string())
        })?;

        self.cache.set(&params.q, response.clone(), name, &options);
        Ok(response)
    }

    /// Search every enabled collection in parallel and merge by relevance
    pub async fn search_all(&self, params: &SearchParams) -> Result<SearchResponse, SearchError> {
        let enabled: Vec<(&String, &CollectionConfig)> = self.config.enabled_collections().collect();
        if enabled.is_empty() {
            return Err(SearchError::NoCollectionsEnabled);
        }

        let options = CacheOptions {
            page: params.page,
            per_page: params.per_page,
            sort_by: params.sort_by.clone(),
            ..Default::default()
        };
        if let Some(cached) = self.cache.get(&params.q, UNIVERSAL_SCOPE, &options) {
            return Ok(cached);
        }

        let started = Instant::now();
        let per_collection = params.per_page.div_ceil(enabled.len() as u32);

        let searches = enabled.iter().map(|(slug, config)| {
            let query = collection_query(
                config,
                &params.q,
                params.page,
                per_collection,
                params.sort_by.clone(),
            );
            async move { self.engine.search(slug, &query).await }
        });
        let results = join_all(searches).await;

        let mut hits = Vec::new();
        let mut breakdown = Vec::with_capacity(enabled.len());
        let mut found = 0;

        for ((slug, config), result) in enabled.iter().zip(results) {
            let display_name = config.display_name_or(slug);
            let icon = config.icon_or_default();

            match result {
                Ok(response) => {
                    found += response.found;
                    hits.extend(response.hits.into_iter().map(|mut hit| {
                        hit.collection = Some(slug.to_string());
                        hit.display_name = Some(display_name.clone());
                        hit.icon = Some(icon.clone());
                        hit
                    }));
                    breakdown.push(CollectionBreakdown {
                        collection: slug.to_string(),
                        display_name,
                        icon,
                        found: response.found,
                        error: None,
                    });
                }
                Err(e) => {
                    tracing::warn!(collection = %slug, error = %e, "Collection search failed during universal search");
                    breakdown.push(CollectionBreakdown {
                        collection: slug.to_string(),
                        display_name,
                        icon,
                        found: 0,
                        error: Some(e.to_string()),
                    });
                }
            }
        }

        // Stable sort keeps collection order for equal scores
        hits.sort_by(|a, b| {
            b.text_match
                .unwrap_or(0.0)
                .total_cmp(&a.text_match.unwrap_or(0.0))
        });
        hits.truncate(params.per_page as usize);

        // Responses with a failed collection are not cached
        let degraded = breakdown.iter().any(|b| b.error.is_some());
        let response = SearchResponse {
            found,
            hits,
            page: params.page,
            search_time_ms: started.elapsed().as_millis() as u64,
            collections: Some(breakdown),
        };

        if !degraded {
            self.cache
                .set(&params.q, response.clone(), UNIVERSAL_SCOPE, &options);
        }
        Ok(response)
    }

    /// Forward a caller-supplied query to one enabled collection
    pub async fn advanced_search(
        &self,
        name: &str,
        request: AdvancedSearchRequest,
    ) -> Result<SearchResponse, SearchError> {
        let config = self.enabled_collection(name)?;

        let query_by = split_fields(request.query_by.as_deref()).unwrap_or_else(|| search_field_keys(config));
        let highlight_fields =
            split_fields(request.highlight_fields.as_deref()).unwrap_or_else(|| query_by.clone());

        let query = EngineQuery {
            q: request.q,
            query_by,
            highlight_fields,
            page: request.page.unwrap_or(DEFAULT_PAGE).max(1),
            per_page: request
                .per_page
                .unwrap_or(DEFAULT_PER_PAGE)
                .clamp(1, MAX_PER_PAGE),
            sort_by: request.sort_by,
            filter_by: build_filter(&request.filters, request.filter_by.as_deref()),
            snippet_threshold: Some(SNIPPET_THRESHOLD),
            typo: None,
        };

        self.engine.search(name, &query).await.map_err(|e| {
            tracing::error!(collection = name, error = %e, "Advanced search failed");
            SearchError::AdvancedSearchFailed(e.to_string())
        })
    }

    /// Typeahead suggestions from one enabled collection
    pub async fn suggest(
        &self,
        name: &str,
        params: &SuggestParams,
    ) -> Result<SearchResponse, SearchError> {
        let config = self.searchable_collection(name).await?;

        let mut query = collection_query(config, &params.q, DEFAULT_PAGE, params.limit, None);
        query.typo = None;

        let mut response = self.engine.search(name, &query).await.map_err(|e| {
            tracing::error!(collection = name, error = %e, "Suggest request failed");
            SearchError::Engine(e.to_string())
        })?;
        response.hits.truncate(params.limit as usize);
        Ok(response)
    }

    /// Metadata for every enabled collection; no engine call
    pub fn list_collections(&self) -> CollectionsResponse {
        let collections = self
            .config
            .enabled_collections()
            .map(|(slug, config)| CollectionInfo {
                slug: slug.clone(),
                display_name: config.display_name_or(slug),
                icon: config.icon_or_default(),
                search_fields: search_field_keys(config),
                facet_fields: config.facet_fields.clone(),
            })
            .collect();

        CollectionsResponse {
            categorized: self.config.settings.categorized,
            collections,
        }
    }

    async fn probe(&self) -> (EngineStatus, Vec<EngineCollection>) {
        if let Err(e) = self.engine.health().await {
            return (
                EngineStatus {
                    connected: false,
                    error: Some(e.to_string()),
                },
                Vec::new(),
            );
        }

        match self.engine.list_collections().await {
            Ok(collections) => (
                EngineStatus {
                    connected: true,
                    error: None,
                },
                collections,
            ),
            Err(e) => (
                EngineStatus {
                    connected: true,
                    error: Some(e.to_string()),
                },
                Vec::new(),
            ),
        }
    }

    fn status_label(engine: &EngineStatus, collections: &[EngineCollection]) -> String {
        if engine.connected && !collections.is_empty() {
            "healthy".to_string()
        } else {
            "unhealthy".to_string()
        }
    }

    pub async fn health(&self) -> HealthResponse {
        let (engine, collections) = self.probe().await;

        HealthResponse {
            status: Self::status_label(&engine, &collections),
            engine,
            collections: collections.into_iter().map(|c| c.name).collect(),
            cache: self.cache.stats(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub async fn health_detailed(&self) -> DetailedHealthResponse {
        let (engine, collections) = self.probe().await;
        let status = Self::status_label(&engine, &collections);

        let mut config = (*self.config).clone();
        config.engine.api_key = config.engine.api_key.as_deref().map(mask_secret);

        DetailedHealthResponse {
            status,
            engine,
            collections: collections
                .into_iter()
                .map(|c| CollectionHealth {
                    enabled: self.config.enabled_collection(&c.name).is_some(),
                    num_fields: c.fields.len(),
                    num_documents: c.num_documents,
                    name: c.name,
                })
                .collect(),
            cache: self.cache.stats(),
            config: serde_json::to_value(&config).unwrap_or_default(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}
