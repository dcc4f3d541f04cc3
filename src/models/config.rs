// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Plugin configuration: engine connection, per-collection search settings,
//! and global cache/sync knobs.

use crate::error::ConfigError;
use crate::models::schema::FieldPath;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::path::Path;

const DEFAULT_CONFIG_PATH: &str = "search-config.json";
const DEFAULT_ICON: &str = "📄";

/// Page size used for backfill when neither the collection nor the global
/// settings specify one
pub const DEFAULT_SYNC_LIMIT: u32 = 1000;

/// Base fields every normalized document carries
const RESERVED_FIELDS: [&str; 3] = ["id", "createdAt", "updatedAt"];

/// Top-level plugin configuration, immutable for the process lifetime
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginConfig {
    pub engine: EngineConfig,
    #[serde(default)]
    pub collections: BTreeMap<String, CollectionConfig>,
    #[serde(default)]
    pub settings: SearchSettings,
}

/// Connection settings for the search engine
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    pub host: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default = "default_connection_timeout")]
    pub connection_timeout_secs: u64,
    /// Upper bound on waiting for an indexing task to finish
    #[serde(default = "default_task_timeout")]
    pub task_timeout_secs: u64,
}

impl EngineConfig {
    /// Host as a full URL; `http://` is assumed when no scheme is given.
    pub fn url(&self) -> String {
        if self.host.starts_with("http://") || self.host.starts_with("https://") {
            self.host.clone()
        } else {
            format!("http://{}", self.host)
        }
    }
}

/// Search settings for one CMS collection
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default)]
    pub search_fields: Vec<FieldPath>,
    #[serde(default)]
    pub facet_fields: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sync_limit: Option<u32>,
}

impl CollectionConfig {
    /// Display name, defaulting to the slug with its first letter upper-cased.
    pub fn display_name_or(&self, slug: &str) -> String {
        if let Some(name) = &self.display_name {
            return name.clone();
        }
        let mut chars = slug.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }

    pub fn icon_or_default(&self) -> String {
        self.icon.clone().unwrap_or_else(|| DEFAULT_ICON.to_string())
    }
}

/// Global plugin settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchSettings {
    #[serde(default)]
    pub categorized: bool,
    /// Register lifecycle hooks that push document changes to the engine
    #[serde(default = "default_true")]
    pub auto_sync: bool,
    #[serde(default = "default_base_path")]
    pub base_path: String,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub sync: SyncSettings,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            categorized: false,
            auto_sync: true,
            base_path: default_base_path(),
            cache: CacheSettings::default(),
            sync: SyncSettings::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheSettings {
    #[serde(default = "default_cache_size")]
    pub max_size: usize,
    #[serde(default = "default_cache_ttl")]
    pub ttl_secs: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            max_size: default_cache_size(),
            ttl_secs: default_cache_ttl(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncSettings {
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sync_limit: Option<u32>,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            sync_limit: None,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_base_path() -> String {
    "/api".to_string()
}

fn default_connection_timeout() -> u64 {
    2
}

fn default_task_timeout() -> u64 {
    30
}

fn default_cache_size() -> usize {
    1000
}

fn default_cache_ttl() -> u64 {
    300
}

fn default_batch_size() -> usize {
    100
}

impl PluginConfig {
    /// Load configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Load configuration from `SEARCH_CONFIG_PATH` and apply environment overrides
    pub fn from_env() -> Result<Self> {
        let path = env::var("SEARCH_CONFIG_PATH").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        let mut config = Self::from_file(&path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Override engine connection settings from environment variables
    pub fn apply_env_overrides(&mut self) {
        if let Ok(host) = env::var("MEILISEARCH_HOST") {
            self.engine.host = host;
        }
        if let Ok(key) = env::var("MEILISEARCH_API_KEY") {
            self.engine.api_key = Some(key);
        }
        if let Some(timeout) = env::var("SEARCH_CONNECTION_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            self.engine.connection_timeout_secs = timeout;
        }
    }

    /// Enabled collections in slug order
    pub fn enabled_collections(&self) -> impl Iterator<Item = (&String, &CollectionConfig)> {
        self.collections.iter().filter(|(_, c)| c.enabled)
    }

    /// Config for `slug` if present and enabled
    pub fn enabled_collection(&self, slug: &str) -> Option<&CollectionConfig> {
        self.collections.get(slug).filter(|c| c.enabled)
    }

    /// Backfill page size: collection, then global, then the built-in default.
    pub fn sync_limit_for(&self, slug: &str) -> u32 {
        self.collections
            .get(slug)
            .and_then(|c| c.sync_limit)
            .or(self.settings.sync.sync_limit)
            .unwrap_or(DEFAULT_SYNC_LIMIT)
    }

    /// Check the whole configuration, reporting every problem at once
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut problems = Vec::new();

        if self.engine.host.trim().is_empty() {
            problems.push("engine.host must not be empty".to_string());
        } else if let Err(e) = url::Url::parse(&self.engine.url()) {
            problems.push(format!("engine.host '{}' is not a valid URL: {e}", self.engine.host));
        }
        if self.engine.connection_timeout_secs == 0 {
            problems.push("engine.connectionTimeoutSecs must be at least 1".to_string());
        }
        if self.settings.cache.max_size == 0 {
            problems.push("settings.cache.maxSize must be at least 1".to_string());
        }
        if self.settings.cache.ttl_secs == 0 {
            problems.push("settings.cache.ttlSecs must be at least 1".to_string());
        }
        if self.settings.sync.batch_size == 0 {
            problems.push("settings.sync.batchSize must be at least 1".to_string());
        }
        if self.settings.sync.sync_limit == Some(0) {
            problems.push("settings.sync.syncLimit must be at least 1".to_string());
        }
        if !self.settings.base_path.starts_with('/') {
            problems.push(format!(
                "settings.basePath '{}' must start with '/'",
                self.settings.base_path
            ));
        }

        for (slug, collection) in &self.collections {
            validate_collection(slug, collection, &mut problems);
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Invalid(problems))
        }
    }
}

fn validate_collection(slug: &str, collection: &CollectionConfig, problems: &mut Vec<String>) {
    let valid_slug = !slug.is_empty()
        && slug
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if !valid_slug {
        problems.push(format!(
            "collection '{slug}' must use only letters, digits, '-' and '_'"
        ));
    }
    if collection.enabled && collection.search_fields.is_empty() {
        problems.push(format!(
            "collection '{slug}' is enabled but has no searchFields"
        ));
    }
    if collection.facet_fields.iter().any(|f| f.trim().is_empty()) {
        problems.push(format!("collection '{slug}' has an empty facetFields entry"));
    }
    let configured = collection
        .search_fields
        .iter()
        .map(FieldPath::key)
        .chain(collection.facet_fields.iter().cloned());
    for field in configured.filter(|f| RESERVED_FIELDS.contains(&f.as_str())) {
        problems.push(format!(
            "collection '{slug}' cannot use reserved field '{field}' in searchFields or facetFields"
        ));
    }
    if collection.sync_limit == Some(0) {
        problems.push(format!("collection '{slug}' syncLimit must be at least 1"));
    }
}
