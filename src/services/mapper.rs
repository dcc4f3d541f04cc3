// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Pure mapping from CMS documents and collection config to engine schemas
//! and normalized documents.

use crate::models::config::CollectionConfig;
use crate::models::document::SourceDocument;
use crate::models::schema::{
    CollectionSchema, FieldPath, FieldSchema, FieldType, NormalizedDocument,
};
use chrono::Utc;
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

/// Search fields used when a collection has no config
const DEFAULT_SEARCH_FIELDS: [&str; 3] = ["title", "content", "description"];

/// Placeholder stored for facet fields the document does not set
const UNKNOWN_FACET: &str = "unknown";

/// Fields whose rich-text values are flattened to plain text
const RICH_TEXT_FIELDS: [&str; 2] = ["content", "description"];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MappingError {
    #[error("Document in collection '{collection}' is missing required 'id' field")]
    MissingIdentifier { collection: String },
}

fn search_fields(config: Option<&CollectionConfig>) -> Vec<FieldPath> {
    match config {
        Some(c) if !c.search_fields.is_empty() => c.search_fields.clone(),
        _ => DEFAULT_SEARCH_FIELDS
            .iter()
            .map(|f| FieldPath::scalar(f))
            .collect(),
    }
}

fn facet_fields(config: Option<&CollectionConfig>) -> &[String] {
    config.map(|c| c.facet_fields.as_slice()).unwrap_or(&[])
}

/// Build the engine schema for a collection.
///
/// Base fields come first, then search fields in configured order, then facet
/// fields not already covered.
pub fn map_collection_to_schema(slug: &str, config: Option<&CollectionConfig>) -> CollectionSchema {
    let facets = facet_fields(config);

    let mut fields = vec![
        FieldSchema::new("id", FieldType::String, false),
        FieldSchema::new("createdAt", FieldType::Int64, false),
        FieldSchema::new("updatedAt", FieldType::Int64, false),
    ];

    for path in search_fields(config) {
        let key = path.key();
        let facet = facets.contains(&key);
        fields.push(FieldSchema::new(key, FieldType::String, facet));
    }

    for facet in facets {
        if !fields.iter().any(|f| &f.name == facet) {
            fields.push(FieldSchema::new(facet.clone(), FieldType::String, true));
        }
    }

    CollectionSchema {
        name: slug.to_string(),
        fields,
    }
}

/// Flatten a source document into the shape the engine indexes
pub fn map_document_to_normalized<D: SourceDocument + ?Sized>(
    doc: &D,
    slug: &str,
    config: Option<&CollectionConfig>,
) -> Result<NormalizedDocument, MappingError> {
    let id = doc.id().ok_or_else(|| MappingError::MissingIdentifier {
        collection: slug.to_string(),
    })?;

    let now = Utc::now();
    let created_at = doc.created_at().unwrap_or_else(|| {
        tracing::warn!(collection = slug, document_id = %id, "Document has no createdAt, using current time");
        now
    });
    let updated_at = doc.updated_at().unwrap_or_else(|| {
        tracing::warn!(collection = slug, document_id = %id, "Document has no updatedAt, using current time");
        now
    });

    let mut fields = BTreeMap::new();
    let mut has_text = false;

    for path in search_fields(config) {
        let value = resolve_search_field(doc, &path);
        has_text |= !value.trim().is_empty();
        fields.insert(path.key(), value);
    }

    for facet in facet_fields(config) {
        let value = doc
            .get(facet)
            .map(stringify)
            .unwrap_or_else(|| UNKNOWN_FACET.to_string());
        fields.insert(facet.clone(), value);
    }

    if !has_text {
        fields.insert("title".to_string(), format!("Document {id}"));
    }

    Ok(NormalizedDocument {
        id,
        created_at: created_at.timestamp_millis(),
        updated_at: updated_at.timestamp_millis(),
        fields,
    })
}

fn resolve_search_field<D: SourceDocument + ?Sized>(doc: &D, path: &FieldPath) -> String {
    match path {
        FieldPath::ArrayJoin {
            array_field,
            sub_field,
        } => match doc.get(array_field) {
            Some(Value::Array(items)) if !items.is_empty() => items
                .iter()
                .map(|item| {
                    item.get(sub_field.as_str())
                        .filter(|v| !v.is_null())
                        .map(stringify)
                        .unwrap_or_default()
                })
                .collect::<Vec<_>>()
                .join(" "),
            _ => String::new(),
        },
        FieldPath::Scalar { name } => match doc.get(name) {
            Some(value) if RICH_TEXT_FIELDS.contains(&name.as_str()) && is_rich_text(value) => {
                let mut text = String::new();
                collect_text(value, &mut text);
                text
            }
            Some(value) => stringify(value),
            None => String::new(),
        },
    }
}

fn is_rich_text(value: &Value) -> bool {
    value.as_object().is_some_and(|o| o.contains_key("root"))
}

/// Depth-first walk appending every `text` leaf in document order
fn collect_text(node: &Value, out: &mut String) {
    match node {
        Value::Object(map) => {
            if let Some(Value::String(text)) = map.get("text") {
                out.push_str(text);
            }
            if let Some(root) = map.get("root") {
                collect_text(root, out);
            }
            if let Some(Value::Array(children)) = map.get("children") {
                for child in children {
                    collect_text(child, out);
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_text(item, out);
            }
        }
        _ => {}
    }
}

fn stringify(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => items.iter().map(stringify).collect::<Vec<_>>().join(","),
        Value::Object(_) => value.to_string(),
    }
}
