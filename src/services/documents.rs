// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Read access to the CMS document store, used for backfill.

use crate::models::document::JsonDocument;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

/// One page of documents from a collection
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentPage {
    pub docs: Vec<JsonDocument>,
    #[serde(default)]
    pub total_pages: u32,
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch page `page` (1-based) of `collection` with `limit` documents per page
    async fn find(&self, collection: &str, page: u32, limit: u32) -> Result<DocumentPage>;
}

/// Document store backed by the CMS REST API (`GET /api/{collection}`)
pub struct RestDocumentStore {
    http: reqwest::Client,
    base_url: url::Url,
    auth_header: Option<String>,
}

impl RestDocumentStore {
    /// Create a store for the CMS at `base_url`.
    ///
    /// `auth_header` is sent verbatim as the `Authorization` header.
    pub fn new(base_url: &str, auth_header: Option<String>) -> Result<Self> {
        let base_url = url::Url::parse(base_url)
            .with_context(|| format!("Invalid CMS API URL: {base_url}"))?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            base_url,
            auth_header,
        })
    }

    /// Load settings from `CMS_API_URL` and `CMS_API_TOKEN`.
    /// Returns `Ok(None)` when no CMS URL is configured.
    pub fn from_env() -> Result<Option<Self>> {
        let Ok(base_url) = std::env::var("CMS_API_URL") else {
            return Ok(None);
        };
        let token = std::env::var("CMS_API_TOKEN").ok();
        Self::new(&base_url, token).map(Some)
    }

    fn collection_url(&self, collection: &str, page: u32, limit: u32) -> Result<url::Url> {
        let mut url = self
            .base_url
            .join(&format!("api/{collection}"))
            .map_err(|e| anyhow!("Failed to build URL for collection {collection}: {e}"))?;
        url.query_pairs_mut()
            .append_pair("page", &page.to_string())
            .append_pair("limit", &limit.to_string())
            .append_pair("depth", "0");
        Ok(url)
    }
}

#[async_trait]
impl DocumentStore for RestDocumentStore {
    async fn find(&self, collection: &str, page: u32, limit: u32) -> Result<DocumentPage> {
        let url = self.collection_url(collection, page, limit)?;

        let mut request = self.http.get(url.clone());
        if let Some(auth) = &self.auth_header {
            request = request.header(reqwest::header::AUTHORIZATION, auth);
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("Failed to fetch {url}"))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .with_context(|| format!("Failed to read response from {url}"))?;

        if !status.is_success() {
            return Err(anyhow!("CMS returned {status} for {url}: {body}"));
        }

        serde_json::from_str(&body)
            .with_context(|| format!("Failed to parse document page from {url}"))
    }
}
