// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! In-memory stand-ins for the search engine and the CMS document store.

#![allow(dead_code)]

use anyhow::Result;
use async_trait::async_trait;
use parking_lot::Mutex;
use search_sync_agent::app::{create_router, AppState};
use search_sync_agent::models::config::PluginConfig;
use search_sync_agent::models::document::JsonDocument;
use search_sync_agent::models::schema::{CollectionSchema, NormalizedDocument};
use search_sync_agent::models::search::{EngineQuery, SearchHit, SearchResponse};
use search_sync_agent::services::documents::{DocumentPage, DocumentStore};
use search_sync_agent::services::hooks::HookBus;
use search_sync_agent::services::orchestrator::SearchService;
use search_sync_agent::services::search::{
    EngineCollection, EngineError, ImportSummary, SearchEngine,
};
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Default)]
pub struct FakeEngine {
    pub unreachable: AtomicBool,
    /// Make every batch import report all documents as failed
    pub fail_imports: AtomicBool,
    pub collections: Mutex<BTreeMap<String, Vec<NormalizedDocument>>>,
    pub created: Mutex<Vec<CollectionSchema>>,
    pub hits: Mutex<HashMap<String, Vec<SearchHit>>>,
    pub failing: Mutex<HashSet<String>>,
    /// Collections whose lookup fails with something other than not-found
    pub failing_lookups: Mutex<HashSet<String>>,
    pub retrieve_calls: AtomicUsize,
    pub queries: Mutex<Vec<(String, EngineQuery)>>,
    pub deleted: Mutex<Vec<(String, String)>>,
    pub import_calls: AtomicUsize,
}

impl FakeEngine {
    pub fn with_collections(names: &[&str]) -> Arc<Self> {
        let engine = Self::default();
        {
            let mut collections = engine.collections.lock();
            for name in names {
                collections.insert(name.to_string(), Vec::new());
            }
        }
        Arc::new(engine)
    }

    pub fn set_hits(&self, collection: &str, hits: Vec<SearchHit>) {
        self.hits.lock().insert(collection.to_string(), hits);
    }

    pub fn fail_searches_in(&self, collection: &str) {
        self.failing.lock().insert(collection.to_string());
    }

    pub fn recover_searches_in(&self, collection: &str) {
        self.failing.lock().remove(collection);
    }

    pub fn fail_lookups_in(&self, collection: &str) {
        self.failing_lookups.lock().insert(collection.to_string());
    }

    pub fn documents(&self, collection: &str) -> Vec<NormalizedDocument> {
        self.collections
            .lock()
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }

    pub fn search_count(&self) -> usize {
        self.queries.lock().len()
    }

    fn check_reachable(&self) -> Result<(), EngineError> {
        if self.unreachable.load(Ordering::SeqCst) {
            Err(EngineError::Unavailable("connection refused".into()))
        } else {
            Ok(())
        }
    }

    fn lookup(&self, name: &str) -> Result<u64, EngineError> {
        self.check_reachable()?;
        if self.failing_lookups.lock().contains(name) {
            return Err(EngineError::Request(format!("{name} lookup failed")));
        }
        self.collections
            .lock()
            .get(name)
            .map(|docs| docs.len() as u64)
            .ok_or_else(|| EngineError::NotFound(name.to_string()))
    }

    fn store(&self, collection: &str, document: &NormalizedDocument) -> Result<(), EngineError> {
        let mut collections = self.collections.lock();
        let docs = collections
            .get_mut(collection)
            .ok_or_else(|| EngineError::NotFound(collection.to_string()))?;
        docs.retain(|d| d.id != document.id);
        docs.push(document.clone());
        Ok(())
    }
}

#[async_trait]
impl SearchEngine for FakeEngine {
    async fn health(&self) -> Result<(), EngineError> {
        self.check_reachable()
    }

    async fn list_collections(&self) -> Result<Vec<EngineCollection>, EngineError> {
        self.check_reachable()?;
        Ok(self
            .collections
            .lock()
            .iter()
            .map(|(name, docs)| EngineCollection {
                name: name.clone(),
                num_documents: docs.len() as u64,
                fields: vec!["title".into(), "content".into()],
            })
            .collect())
    }

    async fn retrieve_collection(&self, name: &str) -> Result<EngineCollection, EngineError> {
        self.retrieve_calls.fetch_add(1, Ordering::SeqCst);
        let num_documents = self.lookup(name)?;
        Ok(EngineCollection {
            name: name.to_string(),
            num_documents,
            fields: Vec::new(),
        })
    }

    async fn collection_exists(&self, name: &str) -> Result<(), EngineError> {
        self.lookup(name).map(|_| ())
    }

    async fn create_collection(&self, schema: &CollectionSchema) -> Result<(), EngineError> {
        self.check_reachable()?;
        self.collections
            .lock()
            .entry(schema.name.clone())
            .or_default();
        self.created.lock().push(schema.clone());
        Ok(())
    }

    async fn delete_collection(&self, name: &str) -> Result<(), EngineError> {
        self.collections
            .lock()
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| EngineError::NotFound(name.to_string()))
    }

    async fn upsert_document(
        &self,
        collection: &str,
        document: &NormalizedDocument,
    ) -> Result<(), EngineError> {
        self.check_reachable()?;
        self.store(collection, document)
    }

    async fn delete_document(&self, collection: &str, id: &str) -> Result<(), EngineError> {
        self.check_reachable()?;
        self.deleted
            .lock()
            .push((collection.to_string(), id.to_string()));
        if let Some(docs) = self.collections.lock().get_mut(collection) {
            docs.retain(|d| d.id != id);
        }
        Ok(())
    }

    async fn import_documents(
        &self,
        collection: &str,
        documents: &[NormalizedDocument],
    ) -> Result<ImportSummary, EngineError> {
        self.check_reachable()?;
        self.import_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_imports.load(Ordering::SeqCst) {
            return Ok(ImportSummary {
                imported: 0,
                failed: documents.len(),
            });
        }
        for doc in documents {
            self.store(collection, doc)?;
        }
        Ok(ImportSummary {
            imported: documents.len(),
            failed: 0,
        })
    }

    async fn search(
        &self,
        collection: &str,
        query: &EngineQuery,
    ) -> Result<SearchResponse, EngineError> {
        self.check_reachable()?;
        self.queries
            .lock()
            .push((collection.to_string(), query.clone()));
        if self.failing.lock().contains(collection) {
            return Err(EngineError::Request(format!("{collection} exploded")));
        }
        if !self.collections.lock().contains_key(collection) {
            return Err(EngineError::NotFound(collection.to_string()));
        }

        let all = self.hits.lock().get(collection).cloned().unwrap_or_default();
        let found = all.len() as u64;
        let hits = all.into_iter().take(query.per_page as usize).collect();
        Ok(SearchResponse {
            found,
            hits,
            page: query.page,
            search_time_ms: 1,
            collections: None,
        })
    }
}

/// Serves fixed pages of documents per collection
#[derive(Default)]
pub struct FakeStore {
    pub docs: BTreeMap<String, Vec<JsonDocument>>,
    pub requested_limits: Mutex<Vec<u32>>,
    /// Report `total_pages: 0`, as a CMS response without `totalPages` parses
    pub omit_total_pages: bool,
}

impl FakeStore {
    pub fn with_docs(collection: &str, docs: Vec<Value>) -> Self {
        let mut store = Self::default();
        store.docs.insert(
            collection.to_string(),
            docs.into_iter().map(JsonDocument::from_value).collect(),
        );
        store
    }
}

#[async_trait]
impl DocumentStore for FakeStore {
    async fn find(&self, collection: &str, page: u32, limit: u32) -> Result<DocumentPage> {
        self.requested_limits.lock().push(limit);
        let all = self.docs.get(collection).cloned().unwrap_or_default();
        let limit = limit.max(1) as usize;
        let total_pages = all.len().div_ceil(limit) as u32;
        let docs = all
            .into_iter()
            .skip((page.saturating_sub(1) as usize) * limit)
            .take(limit)
            .collect();
        let total_pages = if self.omit_total_pages { 0 } else { total_pages };
        Ok(DocumentPage { docs, total_pages })
    }
}

pub fn hit(id: &str, score: Option<f64>) -> SearchHit {
    let mut document = serde_json::Map::new();
    document.insert("id".into(), json!(id));
    document.insert("title".into(), json!(format!("Title {id}")));
    let mut hit = SearchHit::new(document);
    hit.text_match = score;
    hit
}

/// Config with `posts` and `pages` enabled and `drafts` disabled
pub fn test_config() -> PluginConfig {
    serde_json::from_value(json!({
        "engine": { "host": "localhost:7700", "apiKey": "masterKey123456" },
        "collections": {
            "posts": {
                "enabled": true,
                "searchFields": ["title", "content"],
                "facetFields": ["category"]
            },
            "pages": {
                "enabled": true,
                "displayName": "Site Pages",
                "icon": "📘",
                "searchFields": ["title"]
            },
            "drafts": {
                "enabled": false,
                "searchFields": ["title"]
            }
        },
        "settings": {
            "basePath": "/api",
            "sync": { "batchSize": 2 }
        }
    }))
    .expect("test config parses")
}

pub fn test_app(engine: Arc<FakeEngine>, config: PluginConfig) -> (axum::Router, Arc<HookBus>) {
    let config = Arc::new(config);
    let search = Arc::new(SearchService::new(engine, config.clone()));
    let hooks = Arc::new(HookBus::new());
    let state = AppState::new(search, hooks.clone());
    (create_router(state, &config.settings.base_path), hooks)
}
