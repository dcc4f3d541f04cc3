// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

/// Search cache counters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CacheStats {
    pub size: usize,
    pub max_size: usize,
    /// Hits divided by lookups, 0.0 before the first lookup
    pub hit_rate: f64,
}

/// Engine connectivity as seen by the last probe
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct EngineStatus {
    pub connected: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Summary health report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// `healthy` or `unhealthy`
    pub status: String,
    pub engine: EngineStatus,
    /// Engine-side collections
    pub collections: Vec<String>,
    pub cache: CacheStats,
    pub timestamp: String,
}

impl HealthResponse {
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

/// Engine-side statistics for one collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CollectionHealth {
    pub name: String,
    pub num_documents: u64,
    pub num_fields: usize,
    pub enabled: bool,
}

/// Extended health report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DetailedHealthResponse {
    pub status: String,
    pub engine: EngineStatus,
    pub collections: Vec<CollectionHealth>,
    pub cache: CacheStats,
    /// Active configuration with secrets masked
    #[schema(value_type = Object)]
    pub config: Value,
    pub timestamp: String,
}
