// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use crate::models::config::EngineConfig;
use crate::models::schema::{CollectionSchema, NormalizedDocument};
use crate::models::search::{EngineQuery, SearchHit, SearchResponse};
use async_trait::async_trait;
use meilisearch_sdk::client::Client;
use meilisearch_sdk::errors::{Error as MeiliError, ErrorCode};
use meilisearch_sdk::search::{MatchingStrategies, Selectors};
use meilisearch_sdk::task_info::TaskInfo;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Failures talking to the search engine
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("Collection '{0}' not found")]
    NotFound(String),
    #[error("Search engine did not respond in time")]
    Timeout,
    #[error("Search engine unavailable: {0}")]
    Unavailable(String),
    #[error("Search engine task failed: {0}")]
    TaskFailed(String),
    #[error("Search engine request failed: {0}")]
    Request(String),
}

impl EngineError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, EngineError::NotFound(_))
    }
}

/// Engine-side view of a collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineCollection {
    pub name: String,
    pub num_documents: u64,
    pub fields: Vec<String>,
}

/// Outcome of a batch import
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub imported: usize,
    pub failed: usize,
}

/// Operations the plugin needs from the external search engine
#[async_trait]
pub trait SearchEngine: Send + Sync {
    /// Connectivity probe
    async fn health(&self) -> Result<(), EngineError>;
    async fn list_collections(&self) -> Result<Vec<EngineCollection>, EngineError>;
    /// Returns `EngineError::NotFound` when the collection does not exist
    async fn retrieve_collection(&self, name: &str) -> Result<EngineCollection, EngineError>;
    /// Existence check without statistics; `EngineError::NotFound` when missing
    async fn collection_exists(&self, name: &str) -> Result<(), EngineError> {
        self.retrieve_collection(name).await.map(|_| ())
    }
    async fn create_collection(&self, schema: &CollectionSchema) -> Result<(), EngineError>;
    async fn delete_collection(&self, name: &str) -> Result<(), EngineError>;
    async fn upsert_document(
        &self,
        collection: &str,
        document: &NormalizedDocument,
    ) -> Result<(), EngineError>;
    async fn delete_document(&self, collection: &str, id: &str) -> Result<(), EngineError>;
    async fn import_documents(
        &self,
        collection: &str,
        documents: &[NormalizedDocument],
    ) -> Result<ImportSummary, EngineError>;
    async fn search(&self, collection: &str, query: &EngineQuery)
        -> Result<SearchResponse, EngineError>;
}

/// Build the engine handle described by `config`
pub fn create_engine(config: &EngineConfig) -> anyhow::Result<Arc<dyn SearchEngine>> {
    Ok(Arc::new(MeilisearchEngine::new(config)?))
}

/// Probe connectivity, logging the outcome
pub async fn test_connection(engine: &dyn SearchEngine) -> bool {
    match engine.health().await {
        Ok(()) => {
            tracing::info!("Search engine connection OK");
            true
        }
        Err(e) => {
            tracing::error!(error = %e, "Search engine connection failed");
            false
        }
    }
}

/// Build an engine filter expression from exact-match filters plus an
/// optional raw expression
pub fn build_filter(filters: &BTreeMap<String, Value>, raw: Option<&str>) -> Option<String> {
    let mut clauses: Vec<String> = filters
        .iter()
        .filter(|(_, v)| !v.is_null())
        .map(|(field, value)| match value {
            Value::String(s) => format!("{field} = \"{}\"", s.replace('"', "\\\"")),
            Value::Array(items) => {
                let values: Vec<String> = items
                    .iter()
                    .map(|v| match v {
                        Value::String(s) => format!("\"{}\"", s.replace('"', "\\\"")),
                        other => other.to_string(),
                    })
                    .collect();
                format!("{field} IN [{}]", values.join(", "))
            }
            other => format!("{field} = {other}"),
        })
        .collect();

    if let Some(raw) = raw.map(str::trim).filter(|r| !r.is_empty()) {
        clauses.push(format!("({raw})"));
    }

    if clauses.is_empty() {
        None
    } else {
        Some(clauses.join(" AND "))
    }
}

/// Meilisearch-backed engine; one index per collection
pub struct MeilisearchEngine {
    client: Client,
    timeout: Duration,
    task_timeout: Duration,
}

impl MeilisearchEngine {
    pub fn new(config: &EngineConfig) -> anyhow::Result<Self> {
        let url = config.url();
        let client = Client::new(&url, config.api_key.clone())?;

        tracing::info!(%url, "Configured Meilisearch client");

        Ok(Self {
            client,
            timeout: Duration::from_secs(config.connection_timeout_secs),
            task_timeout: Duration::from_secs(config.task_timeout_secs),
        })
    }

    /// Run an engine call under the connection timeout
    async fn timed<T, F>(&self, fut: F) -> Result<T, EngineError>
    where
        F: Future<Output = Result<T, MeiliError>>,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result.map_err(map_error),
            Err(_) => Err(EngineError::Timeout),
        }
    }

    async fn wait_for_task(&self, task: TaskInfo) -> Result<(), EngineError> {
        let task = task
            .wait_for_completion(&self.client, None, Some(self.task_timeout))
            .await
            .map_err(map_error)?;

        if task.is_failure() {
            return Err(EngineError::TaskFailed(format!("{task:?}")));
        }
        Ok(())
    }

    async fn stats(&self, name: &str) -> Result<EngineCollection, EngineError> {
        let index = self.timed(self.client.get_index(name)).await?;
        let stats = self.timed(index.get_stats()).await?;

        let mut fields: Vec<String> = stats.field_distribution.into_keys().collect();
        fields.sort();

        Ok(EngineCollection {
            name: name.to_string(),
            num_documents: stats.number_of_documents as u64,
            fields,
        })
    }
}

fn map_error(err: MeiliError) -> EngineError {
    match err {
        MeiliError::Meilisearch(e) if matches!(e.error_code, ErrorCode::IndexNotFound) => {
            EngineError::NotFound(e.error_message)
        }
        MeiliError::Timeout => EngineError::Timeout,
        other => EngineError::Request(other.to_string()),
    }
}

#[async_trait]
impl SearchEngine for MeilisearchEngine {
    async fn health(&self) -> Result<(), EngineError> {
        self.timed(self.client.health())
            .await
            .map(|_| ())
            .map_err(|e| EngineError::Unavailable(e.to_string()))
    }

    async fn list_collections(&self) -> Result<Vec<EngineCollection>, EngineError> {
        let indexes = self.timed(self.client.list_all_indexes()).await?;

        let mut collections = Vec::with_capacity(indexes.results.len());
        for index in indexes.results {
            collections.push(self.stats(&index.uid).await?);
        }
        Ok(collections)
    }

    async fn retrieve_collection(&self, name: &str) -> Result<EngineCollection, EngineError> {
        self.stats(name).await
    }

    async fn collection_exists(&self, name: &str) -> Result<(), EngineError> {
        self.timed(self.client.get_index(name)).await.map(|_| ())
    }

    async fn create_collection(&self, schema: &CollectionSchema) -> Result<(), EngineError> {
        let task = self
            .timed(self.client.create_index(&schema.name, Some("id")))
            .await?;
        self.wait_for_task(task).await?;

        let index = self.client.index(&schema.name);

        let task = self
            .timed(index.set_searchable_attributes(schema.searchable_fields()))
            .await?;
        self.wait_for_task(task).await?;

        let task = self
            .timed(index.set_filterable_attributes(schema.facet_fields()))
            .await?;
        self.wait_for_task(task).await?;

        let task = self
            .timed(index.set_sortable_attributes(schema.sortable_fields()))
            .await?;
        self.wait_for_task(task).await?;

        tracing::info!(collection = %schema.name, fields = schema.fields.len(), "Created search collection");

        Ok(())
    }

    async fn delete_collection(&self, name: &str) -> Result<(), EngineError> {
        let task = self.timed(self.client.delete_index(name)).await?;
        self.wait_for_task(task).await
    }

    async fn upsert_document(
        &self,
        collection: &str,
        document: &NormalizedDocument,
    ) -> Result<(), EngineError> {
        let index = self.client.index(collection);
        let task = self
            .timed(index.add_or_replace(std::slice::from_ref(document), Some("id")))
            .await?;
        self.wait_for_task(task).await
    }

    async fn delete_document(&self, collection: &str, id: &str) -> Result<(), EngineError> {
        let index = self.client.index(collection);
        let task = self.timed(index.delete_document(id)).await?;
        self.wait_for_task(task).await
    }

    async fn import_documents(
        &self,
        collection: &str,
        documents: &[NormalizedDocument],
    ) -> Result<ImportSummary, EngineError> {
        if documents.is_empty() {
            return Ok(ImportSummary::default());
        }

        let index = self.client.index(collection);
        let task = self
            .timed(index.add_or_replace(documents, Some("id")))
            .await?;

        // Meilisearch applies a batch as one task, so a failure covers every document
        match self.wait_for_task(task).await {
            Ok(()) => Ok(ImportSummary {
                imported: documents.len(),
                failed: 0,
            }),
            Err(EngineError::TaskFailed(reason)) => {
                tracing::warn!(collection, %reason, "Batch import task failed");
                Ok(ImportSummary {
                    imported: 0,
                    failed: documents.len(),
                })
            }
            Err(e) => Err(e),
        }
    }

    async fn search(
        &self,
        collection: &str,
        query: &EngineQuery,
    ) -> Result<SearchResponse, EngineError> {
        let query_by: Vec<&str> = query.query_by.iter().map(String::as_str).collect();
        let highlight: Vec<&str> = query.highlight_fields.iter().map(String::as_str).collect();
        let crop: Vec<(&str, Option<usize>)> = highlight.iter().map(|f| (*f, None)).collect();
        let sort: Vec<&str> = query.sort_by.as_deref().into_iter().collect();

        let index = self.client.index(collection);
        let mut search = index.search();
        search
            .with_query(&query.q)
            .with_page(query.page as usize)
            .with_hits_per_page(query.per_page as usize)
            .with_show_ranking_score(true);

        if !query_by.is_empty() {
            search.with_attributes_to_search_on(&query_by);
        }
        if !highlight.is_empty() {
            search.with_attributes_to_highlight(Selectors::Some(highlight.as_slice()));
            if let Some(threshold) = query.snippet_threshold {
                search
                    .with_attributes_to_crop(Selectors::Some(crop.as_slice()))
                    .with_crop_length(threshold as usize);
            }
        }
        if !sort.is_empty() {
            search.with_sort(&sort);
        }
        if let Some(filter) = query.filter_by.as_deref() {
            search.with_filter(filter);
        }
        if query.typo.is_some_and(|t| t.num_typos == 0) {
            search.with_matching_strategy(MatchingStrategies::ALL);
        }

        let results = self
            .timed(search.execute::<Map<String, Value>>())
            .await?;

        let found = results
            .total_hits
            .or(results.estimated_total_hits)
            .unwrap_or(0) as u64;

        let hits = results
            .hits
            .into_iter()
            .map(|hit| {
                let highlight = hit.formatted_result.map(|formatted| {
                    formatted
                        .into_iter()
                        .filter(|(field, _)| query.highlight_fields.contains(field))
                        .filter_map(|(field, value)| value.as_str().map(|s| (field, s.to_string())))
                        .collect::<BTreeMap<_, _>>()
                });
                SearchHit {
                    highlight: highlight.filter(|h| !h.is_empty()),
                    text_match: hit.ranking_score,
                    ..SearchHit::new(hit.result)
                }
            })
            .collect();

        Ok(SearchResponse {
            found,
            hits,
            page: results.page.map(|p| p as u32).unwrap_or(query.page),
            search_time_ms: results.processing_time_ms as u64,
            collections: None,
        })
    }
}
