// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Bounded, time-expiring cache of search responses.
//!
//! Entries are keyed by a digest of the canonical JSON form of
//! (query, scope, options). Eviction is least-recently-used; expired entries
//! are dropped when read. Document syncs do not invalidate entries, so a
//! response may be stale for up to one TTL.

use crate::models::health::CacheStats;
use crate::models::search::SearchResponse;
use lru::LruCache;
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Request options that distinguish otherwise identical queries
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheOptions {
    pub page: u32,
    pub per_page: u32,
    pub sort_by: Option<String>,
    pub filters: BTreeMap<String, String>,
}

#[derive(Serialize)]
struct KeyParts<'a> {
    query: &'a str,
    scope: &'a str,
    options: &'a CacheOptions,
}

#[derive(Debug, Clone)]
struct CacheEntry {
    response: SearchResponse,
    created_at: Instant,
    ttl: Duration,
}

impl CacheEntry {
    fn is_expired(&self) -> bool {
        self.created_at.elapsed() >= self.ttl
    }
}

pub struct SearchCache {
    entries: Mutex<LruCache<String, CacheEntry>>,
    max_size: usize,
    ttl: Duration,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl SearchCache {
    /// Create a cache holding at most `max_size` responses for `ttl` each
    pub fn new(max_size: usize, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(max_size).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            max_size: capacity.get(),
            ttl,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    fn key(query: &str, scope: &str, options: &CacheOptions) -> String {
        let parts = KeyParts {
            query,
            scope,
            options,
        };
        // Field order is fixed by the struct and filters are sorted, so the
        // serialization is canonical
        let canonical = serde_json::to_string(&parts).unwrap_or_default();
        format!("{:x}", md5::compute(canonical.as_bytes()))
    }

    /// Cached response for this request, if present and not expired
    pub fn get(&self, query: &str, scope: &str, options: &CacheOptions) -> Option<SearchResponse> {
        let key = Self::key(query, scope, options);
        let mut entries = self.entries.lock();

        match entries.peek(&key).map(CacheEntry::is_expired) {
            None => {
                drop(entries);
                self.misses.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(scope, query, "Search cache miss");
                return None;
            }
            Some(true) => {
                entries.pop(&key);
                drop(entries);
                self.misses.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(scope, query, "Search cache entry expired");
                return None;
            }
            Some(false) => {}
        }

        let response = entries.get(&key).map(|entry| entry.response.clone());
        drop(entries);
        self.hits.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(scope, query, "Search cache hit");
        response
    }

    /// Store a response, evicting the least recently used entry when full
    pub fn set(&self, query: &str, response: SearchResponse, scope: &str, options: &CacheOptions) {
        let key = Self::key(query, scope, options);
        let entry = CacheEntry {
            response,
            created_at: Instant::now(),
            ttl: self.ttl,
        };
        self.entries.lock().put(key, entry);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    pub fn stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let lookups = hits + misses;

        CacheStats {
            size: self.len(),
            max_size: self.max_size,
            hit_rate: if lookups == 0 {
                0.0
            } else {
                hits as f64 / lookups as f64
            },
        }
    }
}
