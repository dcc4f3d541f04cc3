// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Document lifecycle subscriptions.
//!
//! The host exposes `add_hook`; the plugin only ever appends callbacks and
//! never reads back the host's hook lists.

use crate::models::document::JsonDocument;
use futures::future::BoxFuture;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Lifecycle events the sync layer subscribes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookEvent {
    /// Document created or updated
    AfterChange,
    AfterDelete,
}

impl fmt::Display for HookEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HookEvent::AfterChange => write!(f, "afterChange"),
            HookEvent::AfterDelete => write!(f, "afterDelete"),
        }
    }
}

/// Callback run for a lifecycle event. Callbacks own their error handling.
pub type HookCallback = Arc<dyn Fn(JsonDocument) -> BoxFuture<'static, ()> + Send + Sync>;

/// Host-provided subscription interface
pub trait HookRegistry: Send + Sync {
    fn add_hook(&self, event: HookEvent, collection: &str, callback: HookCallback);
}

/// In-process hook registry that dispatches events to registered callbacks
#[derive(Default)]
pub struct HookBus {
    hooks: RwLock<HashMap<(String, HookEvent), Vec<HookCallback>>>,
}

impl HookBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of callbacks registered for `(event, collection)`
    pub fn hook_count(&self, event: HookEvent, collection: &str) -> usize {
        self.hooks
            .read()
            .get(&(collection.to_string(), event))
            .map_or(0, Vec::len)
    }

    /// Run every callback registered for `(event, collection)` in registration
    /// order and return how many ran
    pub async fn dispatch(&self, event: HookEvent, collection: &str, doc: JsonDocument) -> usize {
        let callbacks: Vec<HookCallback> = self
            .hooks
            .read()
            .get(&(collection.to_string(), event))
            .cloned()
            .unwrap_or_default();

        if callbacks.is_empty() {
            tracing::debug!(%event, collection, "No hooks registered");
            return 0;
        }

        for callback in &callbacks {
            callback(doc.clone()).await;
        }
        callbacks.len()
    }
}

impl HookRegistry for HookBus {
    fn add_hook(&self, event: HookEvent, collection: &str, callback: HookCallback) {
        self.hooks
            .write()
            .entry((collection.to_string(), event))
            .or_default()
            .push(callback);
    }
}
