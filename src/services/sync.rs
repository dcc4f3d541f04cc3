// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Pushes CMS document changes into the search engine.
//!
//! Lifecycle syncs are best-effort: failures are logged and never reach the
//! CMS write path. Startup initialization creates missing collections and
//! backfills existing documents page by page.

use crate::error::ConfigError;
use crate::models::config::PluginConfig;
use crate::models::document::{JsonDocument, SourceDocument};
use crate::models::schema::NormalizedDocument;
use crate::services::documents::DocumentStore;
use crate::services::hooks::{HookEvent, HookRegistry};
use crate::services::mapper::{map_collection_to_schema, map_document_to_normalized};
use crate::services::search::{test_connection, EngineError, SearchEngine};
use futures::FutureExt;
use std::sync::Arc;

/// Result of initializing one collection
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectionInitResult {
    pub collection: String,
    /// The engine-side collection was created during this run
    pub created: bool,
    pub synced: usize,
    pub failed: usize,
    pub error: Option<String>,
}

/// Outcome of `initialize_collections`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InitReport {
    pub engine_reachable: bool,
    pub collections: Vec<CollectionInitResult>,
}

#[derive(Debug, Default, Clone, Copy)]
struct BackfillCounts {
    synced: usize,
    failed: usize,
}

pub struct CollectionSync {
    engine: Arc<dyn SearchEngine>,
    config: Arc<PluginConfig>,
}

impl CollectionSync {
    pub fn new(engine: Arc<dyn SearchEngine>, config: Arc<PluginConfig>) -> Self {
        Self { engine, config }
    }

    /// Map and upsert a created or updated document
    pub async fn on_document_written(&self, collection: &str, doc: &JsonDocument) {
        let Some(config) = self.config.enabled_collection(collection) else {
            return;
        };

        let normalized = match map_document_to_normalized(doc, collection, Some(config)) {
            Ok(normalized) => normalized,
            Err(e) => {
                tracing::error!(collection, error = %e, "Failed to map document for search sync");
                return;
            }
        };

        match self.engine.upsert_document(collection, &normalized).await {
            Ok(()) => {
                tracing::debug!(collection, document_id = %normalized.id, "Synced document to search engine");
            }
            Err(e) => {
                tracing::error!(
                    collection,
                    document_id = %normalized.id,
                    error = %e,
                    "Failed to sync document to search engine"
                );
            }
        }
    }

    /// Remove a deleted document from the engine
    pub async fn on_document_deleted(&self, collection: &str, doc: &JsonDocument) {
        if self.config.enabled_collection(collection).is_none() {
            return;
        }

        let Some(id) = doc.id() else {
            tracing::error!(collection, "Deleted document has no id, cannot remove from search engine");
            return;
        };

        match self.engine.delete_document(collection, &id).await {
            Ok(()) => {
                tracing::debug!(collection, document_id = %id, "Removed document from search engine");
            }
            Err(e) => {
                tracing::error!(
                    collection,
                    document_id = %id,
                    error = %e,
                    "Failed to remove document from search engine"
                );
            }
        }
    }

    /// Subscribe change and delete handlers for every enabled collection
    pub fn register_hooks(self: &Arc<Self>, registry: &dyn HookRegistry) {
        for (slug, _) in self.config.enabled_collections() {
            let sync = self.clone();
            let collection = slug.clone();
            registry.add_hook(
                HookEvent::AfterChange,
                slug,
                Arc::new(move |doc: JsonDocument| {
                    let sync = sync.clone();
                    let collection = collection.clone();
                    async move { sync.on_document_written(&collection, &doc).await }.boxed()
                }),
            );

            let sync = self.clone();
            let collection = slug.clone();
            registry.add_hook(
                HookEvent::AfterDelete,
                slug,
                Arc::new(move |doc: JsonDocument| {
                    let sync = sync.clone();
                    let collection = collection.clone();
                    async move { sync.on_document_deleted(&collection, &doc).await }.boxed()
                }),
            );

            tracing::info!(collection = %slug, "Registered search sync hooks");
        }
    }

    /// Ensure every enabled collection exists in the engine and backfill it.
    ///
    /// Configuration errors abort with `Err`. An unreachable engine is logged
    /// and reported with `engine_reachable: false`.
    pub async fn initialize_collections(
        &self,
        store: Option<&dyn DocumentStore>,
    ) -> Result<InitReport, ConfigError> {
        if let Err(e) = self.config.validate() {
            tracing::error!(error = %e, "Search plugin configuration is invalid");
            return Err(e);
        }

        if !test_connection(self.engine.as_ref()).await {
            tracing::error!("Search engine unreachable, skipping collection initialization");
            return Ok(InitReport::default());
        }

        let mut report = InitReport {
            engine_reachable: true,
            collections: Vec::new(),
        };

        for (slug, _) in self.config.enabled_collections() {
            let result = self.initialize_collection(slug, store).await;
            if let Some(error) = &result.error {
                tracing::error!(collection = %slug, %error, "Failed to initialize search collection");
            } else {
                tracing::info!(
                    collection = %slug,
                    created = result.created,
                    synced = result.synced,
                    failed = result.failed,
                    "Initialized search collection"
                );
            }
            report.collections.push(result);
        }

        Ok(report)
    }

    async fn initialize_collection(
        &self,
        slug: &str,
        store: Option<&dyn DocumentStore>,
    ) -> CollectionInitResult {
        let mut result = CollectionInitResult {
            collection: slug.to_string(),
            ..Default::default()
        };

        match self.ensure_schema(slug).await {
            Ok(created) => result.created = created,
            Err(e) => {
                result.error = Some(e.to_string());
                return result;
            }
        }

        let Some(store) = store else {
            return result;
        };

        match self.backfill(slug, store).await {
            Ok(counts) => {
                result.synced = counts.synced;
                result.failed = counts.failed;
            }
            Err(e) => result.error = Some(format!("{e:#}")),
        }
        result
    }

    /// Create the engine-side collection if the engine reports it missing.
    /// Returns whether it was created.
    async fn ensure_schema(&self, slug: &str) -> Result<bool, EngineError> {
        match self.engine.retrieve_collection(slug).await {
            Ok(_) => Ok(false),
            Err(e) if e.is_not_found() => {
                let schema = map_collection_to_schema(slug, self.config.collections.get(slug));
                self.engine.create_collection(&schema).await?;
                Ok(true)
            }
            Err(e) => Err(e),
        }
    }

    async fn backfill(&self, slug: &str, store: &dyn DocumentStore) -> anyhow::Result<BackfillCounts> {
        let limit = self.config.sync_limit_for(slug);
        let collection_config = self.config.collections.get(slug);
        let mut counts = BackfillCounts::default();
        let mut page = 1;

        loop {
            let batch = store.find(slug, page, limit).await?;
            if batch.docs.is_empty() {
                break;
            }

            let mut mapped = Vec::with_capacity(batch.docs.len());
            for doc in &batch.docs {
                match map_document_to_normalized(doc, slug, collection_config) {
                    Ok(normalized) => mapped.push(normalized),
                    Err(e) => {
                        tracing::warn!(collection = slug, error = %e, "Skipping document during backfill");
                        counts.failed += 1;
                    }
                }
            }

            for chunk in mapped.chunks(self.config.settings.sync.batch_size.max(1)) {
                let chunk_counts = self.import_chunk(slug, chunk).await?;
                counts.synced += chunk_counts.synced;
                counts.failed += chunk_counts.failed;
            }

            tracing::debug!(collection = slug, page, total_pages = batch.total_pages, "Backfilled page");

            // A store that reports no page count is paged until it returns a short page
            let last_page = if batch.total_pages == 0 {
                batch.docs.len() < limit as usize
            } else {
                page >= batch.total_pages
            };
            if last_page {
                break;
            }
            page += 1;
        }

        Ok(counts)
    }

    /// Import one batch; if any document fails, retry each one individually
    async fn import_chunk(
        &self,
        slug: &str,
        chunk: &[NormalizedDocument],
    ) -> Result<BackfillCounts, EngineError> {
        let summary = self.engine.import_documents(slug, chunk).await?;
        if summary.failed == 0 {
            return Ok(BackfillCounts {
                synced: summary.imported,
                failed: 0,
            });
        }

        tracing::warn!(
            collection = slug,
            failed = summary.failed,
            batch = chunk.len(),
            "Batch import partially failed, retrying documents individually"
        );

        let mut counts = BackfillCounts::default();
        for doc in chunk {
            match self.engine.upsert_document(slug, doc).await {
                Ok(()) => counts.synced += 1,
                Err(e) => {
                    tracing::error!(collection = slug, document_id = %doc.id, error = %e, "Failed to import document");
                    counts.failed += 1;
                }
            }
        }
        Ok(counts)
    }
}
