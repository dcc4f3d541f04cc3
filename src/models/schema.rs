// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Search-engine schema types and the flattened documents sent for indexing.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Where a search field's text comes from in a source document.
///
/// Config strings without a dot name a scalar field. `"technologies.name"`
/// names the `name` sub-field of every item in the `technologies` array.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum FieldPath {
    Scalar { name: String },
    ArrayJoin { array_field: String, sub_field: String },
}

impl FieldPath {
    /// Parse a config field name. At most one `.` is allowed and no segment may be empty.
    pub fn parse(raw: &str) -> Result<Self, String> {
        let segments: Vec<&str> = raw.split('.').collect();
        if segments.iter().any(|s| s.trim().is_empty()) {
            return Err(format!("field path '{raw}' has an empty segment"));
        }

        match segments.as_slice() {
            [name] => Ok(FieldPath::Scalar {
                name: name.to_string(),
            }),
            [array_field, sub_field] => Ok(FieldPath::ArrayJoin {
                array_field: array_field.to_string(),
                sub_field: sub_field.to_string(),
            }),
            _ => Err(format!(
                "field path '{raw}' nests deeper than one array level"
            )),
        }
    }

    /// Key used for this field in the engine schema and normalized documents.
    pub fn key(&self) -> String {
        match self {
            FieldPath::Scalar { name } => name.clone(),
            FieldPath::ArrayJoin {
                array_field,
                sub_field,
            } => format!("{array_field}.{sub_field}"),
        }
    }

    pub fn scalar(name: &str) -> Self {
        FieldPath::Scalar {
            name: name.to_string(),
        }
    }
}

impl TryFrom<String> for FieldPath {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        FieldPath::parse(&value)
    }
}

impl From<FieldPath> for String {
    fn from(path: FieldPath) -> Self {
        path.key()
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// Value type of a schema field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Int64,
}

/// One field of an engine-side collection schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSchema {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub facet: bool,
}

impl FieldSchema {
    pub fn new(name: impl Into<String>, field_type: FieldType, facet: bool) -> Self {
        Self {
            name: name.into(),
            field_type,
            facet,
        }
    }
}

/// Engine-side collection definition derived from a collection's config
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionSchema {
    pub name: String,
    pub fields: Vec<FieldSchema>,
}

impl CollectionSchema {
    /// Fields indexed for full-text matching, in schema order.
    pub fn searchable_fields(&self) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|f| f.field_type == FieldType::String && f.name != "id")
            .map(|f| f.name.as_str())
            .collect()
    }

    pub fn facet_fields(&self) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|f| f.facet)
            .map(|f| f.name.as_str())
            .collect()
    }

    pub fn sortable_fields(&self) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|f| f.field_type == FieldType::Int64)
            .map(|f| f.name.as_str())
            .collect()
    }
}

/// Search-engine-ready record built fresh for every sync operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedDocument {
    pub id: String,
    /// Creation time, epoch milliseconds
    #[serde(rename = "createdAt")]
    pub created_at: i64,
    /// Last update time, epoch milliseconds
    #[serde(rename = "updatedAt")]
    pub updated_at: i64,
    /// One string value per configured search and facet field
    #[serde(flatten)]
    pub fields: BTreeMap<String, String>,
}

impl NormalizedDocument {
    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }
}
