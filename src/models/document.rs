// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Narrow view of a CMS document as seen by the sync layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Read-only access to a source document, implemented per host framework.
pub trait SourceDocument {
    /// Document identifier, stringified. `None` when the host did not supply one.
    fn id(&self) -> Option<String>;
    fn created_at(&self) -> Option<DateTime<Utc>>;
    fn updated_at(&self) -> Option<DateTime<Utc>>;
    /// Raw top-level field value; `None` for missing fields.
    fn get(&self, field: &str) -> Option<&Value>;
}

/// A document received as a JSON object (REST API page or webhook body)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JsonDocument(pub Map<String, Value>);

impl JsonDocument {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Wrap an arbitrary JSON value; non-objects become an empty document.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(map) => Self(map),
            _ => Self::default(),
        }
    }

    fn timestamp(&self, field: &str) -> Option<DateTime<Utc>> {
        match self.0.get(field)? {
            Value::String(s) => DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|dt| dt.with_timezone(&Utc)),
            Value::Number(n) => n.as_i64().and_then(DateTime::from_timestamp_millis),
            _ => None,
        }
    }
}

impl SourceDocument for JsonDocument {
    fn id(&self) -> Option<String> {
        match self.0.get("id")? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    fn created_at(&self) -> Option<DateTime<Utc>> {
        self.timestamp("createdAt")
    }

    fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.timestamp("updatedAt")
    }

    fn get(&self, field: &str) -> Option<&Value> {
        match self.0.get(field) {
            Some(Value::Null) | None => None,
            Some(value) => Some(value),
        }
    }
}
