// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use common::{hit, test_app, test_config, FakeEngine};
use serde_json::{json, Value};
use std::sync::atomic::Ordering;
use tower::ServiceExt;

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
    send(app, Request::builder().uri(uri).body(Body::empty()).unwrap()).await
}

async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

#[tokio::test]
async fn test_disabled_collection_is_rejected() {
    let engine = FakeEngine::with_collections(&["posts", "pages", "drafts"]);
    let (app, _) = test_app(engine.clone(), test_config());

    let (status, body) = get(app, "/api/search/drafts?q=test").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Collection not enabled for search");
    assert_eq!(body["code"], "COLLECTION_NOT_ENABLED");
    assert_eq!(engine.search_count(), 0);
}

#[tokio::test]
async fn test_missing_query_is_rejected() {
    let engine = FakeEngine::with_collections(&["posts", "pages"]);
    let (app, _) = test_app(engine, test_config());

    let (status, body) = get(app.clone(), "/api/search/posts").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Query parameter \"q\" is required");
    assert_eq!(body["code"], "MISSING_QUERY");

    let (status, _) = get(app, "/api/search?q=%20%20").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_invalid_paging_parameters_are_rejected() {
    let engine = FakeEngine::with_collections(&["posts", "pages"]);
    let (app, _) = test_app(engine, test_config());

    for uri in [
        "/api/search/posts?q=a&per_page=abc",
        "/api/search/posts?q=a&per_page=0",
        "/api/search/posts?q=a&per_page=251",
        "/api/search?q=a&page=0",
    ] {
        let (status, body) = get(app.clone(), uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(body["code"], "INVALID_PARAMETER", "{uri}");
    }
}

#[tokio::test]
async fn test_collection_search_returns_engine_results() {
    let engine = FakeEngine::with_collections(&["posts", "pages"]);
    engine.set_hits("posts", vec![hit("1", Some(0.9)), hit("2", Some(0.5))]);
    let (app, _) = test_app(engine.clone(), test_config());

    let (status, body) = get(app, "/api/search/posts?q=rust&per_page=5&sort_by=createdAt:desc").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["found"], 2);
    assert_eq!(body["hits"].as_array().unwrap().len(), 2);
    assert!(body.get("collections").is_none());

    let queries = engine.queries.lock();
    let (collection, query) = &queries[0];
    assert_eq!(collection, "posts");
    assert_eq!(query.query_by, vec!["title", "content"]);
    assert_eq!(query.per_page, 5);
    assert_eq!(query.sort_by.as_deref(), Some("createdAt:desc"));
    assert_eq!(query.snippet_threshold, Some(30));
    assert_eq!(query.typo.map(|t| t.num_typos), Some(0));
}

#[tokio::test]
async fn test_missing_engine_collection_is_not_found() {
    let engine = FakeEngine::with_collections(&["pages"]);
    let (app, _) = test_app(engine, test_config());

    let (status, body) = get(app, "/api/search/posts?q=test").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "COLLECTION_NOT_FOUND");
}

#[tokio::test]
async fn test_repeated_search_is_served_from_cache() {
    let engine = FakeEngine::with_collections(&["posts", "pages"]);
    engine.set_hits("posts", vec![hit("1", Some(0.9))]);
    let (app, _) = test_app(engine.clone(), test_config());

    let (_, first) = get(app.clone(), "/api/search/posts?q=rust").await;
    let (_, second) = get(app.clone(), "/api/search/posts?q=rust").await;
    assert_eq!(first, second);
    assert_eq!(engine.search_count(), 1);

    // Different paging is a different entry
    get(app, "/api/search/posts?q=rust&page=2").await;
    assert_eq!(engine.search_count(), 2);
}

#[tokio::test]
async fn test_suggest_respects_limit() {
    let engine = FakeEngine::with_collections(&["posts", "pages"]);
    engine.set_hits(
        "posts",
        (1..=6).map(|i| hit(&i.to_string(), None)).collect(),
    );
    let (app, _) = test_app(engine.clone(), test_config());

    let (status, body) = get(app, "/api/search/posts/suggest?q=test&limit=3").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["hits"].as_array().unwrap().len() <= 3);
    assert_eq!(engine.queries.lock()[0].1.per_page, 3);
}

#[tokio::test]
async fn test_suggest_default_limit() {
    let engine = FakeEngine::with_collections(&["posts", "pages"]);
    engine.set_hits(
        "posts",
        (1..=8).map(|i| hit(&i.to_string(), None)).collect(),
    );
    let (app, _) = test_app(engine, test_config());

    let (status, body) = get(app, "/api/search/posts/suggest?q=te").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["hits"].as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn test_advanced_search_forwards_body() {
    let engine = FakeEngine::with_collections(&["posts", "pages"]);
    engine.set_hits("posts", vec![hit("1", Some(0.7))]);
    let (app, _) = test_app(engine.clone(), test_config());

    let (status, body) = post_json(
        app,
        "/api/search/posts",
        json!({"q": "test", "per_page": 5, "filters": {"category": "news"}}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.get("hits").is_some());
    assert!(body.get("found").is_some());

    let queries = engine.queries.lock();
    let query = &queries[0].1;
    assert_eq!(query.per_page, 5);
    assert_eq!(query.page, 1);
    assert_eq!(query.filter_by.as_deref(), Some("category = \"news\""));
}

#[tokio::test]
async fn test_advanced_search_errors() {
    let engine = FakeEngine::with_collections(&["posts", "pages"]);
    engine.fail_searches_in("posts");
    let (app, _) = test_app(engine, test_config());

    let (status, body) = post_json(app.clone(), "/api/search/drafts", json!({"q": "x"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "COLLECTION_NOT_ENABLED");

    let (status, body) = post_json(app, "/api/search/posts", json!({"q": "x"})).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["code"], "ADVANCED_SEARCH_FAILED");
    assert_eq!(body["error"], "Advanced search failed");
}

#[tokio::test]
async fn test_universal_search_survives_collection_failure() {
    let engine = FakeEngine::with_collections(&["posts", "pages"]);
    engine.set_hits("posts", vec![hit("1", Some(0.4)), hit("2", Some(0.8))]);
    engine.fail_searches_in("pages");
    let (app, _) = test_app(engine, test_config());

    let (status, body) = get(app, "/api/search?q=test").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["found"], 2);

    let hits = body["hits"].as_array().unwrap();
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0]["document"]["id"], "2");
    assert_eq!(hits[0]["collection"], "posts");
    assert_eq!(hits[0]["display_name"], "Posts");
    assert_eq!(hits[0]["icon"], "📄");

    let breakdown = body["collections"].as_array().unwrap();
    assert_eq!(breakdown.len(), 2);
    let pages = breakdown.iter().find(|b| b["collection"] == "pages").unwrap();
    assert_eq!(pages["found"], 0);
    assert!(pages["error"].is_string());
    let posts = breakdown.iter().find(|b| b["collection"] == "posts").unwrap();
    assert_eq!(posts["found"], 2);
    assert!(posts.get("error").is_none());
}

#[tokio::test]
async fn test_universal_search_merges_by_score() {
    let engine = FakeEngine::with_collections(&["posts", "pages"]);
    engine.set_hits("pages", vec![hit("p1", Some(0.5)), hit("p2", None)]);
    engine.set_hits("posts", vec![hit("a1", Some(0.9)), hit("a2", Some(0.5))]);
    let (app, _) = test_app(engine.clone(), test_config());

    let (status, body) = get(app, "/api/search?q=test&per_page=3").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["found"], 4);
    let ids: Vec<&str> = body["hits"]
        .as_array()
        .unwrap()
        .iter()
        .map(|h| h["document"]["id"].as_str().unwrap())
        .collect();
    // Ties keep collection order: pages before posts
    assert_eq!(ids, vec!["a1", "p1", "a2"]);

    // per_page is split across the two enabled collections, rounding up
    assert!(engine.queries.lock().iter().all(|(_, q)| q.per_page == 2));
}

#[tokio::test]
async fn test_universal_search_without_enabled_collections() {
    let engine = FakeEngine::with_collections(&["posts"]);
    let mut config = test_config();
    for collection in config.collections.values_mut() {
        collection.enabled = false;
    }
    let (app, _) = test_app(engine, config);

    let (status, body) = get(app, "/api/search?q=test").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "NO_COLLECTIONS_ENABLED");
}

#[tokio::test]
async fn test_list_collections() {
    let engine = FakeEngine::with_collections(&[]);
    let (app, _) = test_app(engine, test_config());

    let (status, body) = get(app, "/api/search/collections").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["categorized"], false);
    let collections = body["collections"].as_array().unwrap();
    assert_eq!(collections.len(), 2);
    assert_eq!(collections[0]["slug"], "pages");
    assert_eq!(collections[0]["display_name"], "Site Pages");
    assert_eq!(collections[0]["icon"], "📘");
    assert_eq!(collections[1]["slug"], "posts");
    assert_eq!(collections[1]["display_name"], "Posts");
    assert_eq!(collections[1]["search_fields"], json!(["title", "content"]));
    assert_eq!(collections[1]["facet_fields"], json!(["category"]));
}

#[tokio::test]
async fn test_health_reports_engine_state() {
    let engine = FakeEngine::with_collections(&["posts"]);
    let (app, _) = test_app(engine.clone(), test_config());

    let (status, body) = get(app.clone(), "/api/search/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["engine"]["connected"], true);
    assert_eq!(body["collections"], json!(["posts"]));
    assert_eq!(body["cache"]["max_size"], 1000);

    engine.unreachable.store(true, Ordering::SeqCst);
    let (status, body) = get(app, "/api/search/health").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "unhealthy");
    assert_eq!(body["engine"]["connected"], false);
}

#[tokio::test]
async fn test_health_without_collections_is_unhealthy() {
    let engine = FakeEngine::with_collections(&[]);
    let (app, _) = test_app(engine, test_config());

    let (status, _) = get(app, "/api/search/health").await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_detailed_health_masks_api_key() {
    let engine = FakeEngine::with_collections(&["posts", "orphan"]);
    let (app, _) = test_app(engine, test_config());

    let (status, body) = get(app, "/api/search/health/detailed").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["config"]["engine"]["apiKey"], "mast****");
    let collections = body["collections"].as_array().unwrap();
    let orphan = collections.iter().find(|c| c["name"] == "orphan").unwrap();
    assert_eq!(orphan["enabled"], false);
    let posts = collections.iter().find(|c| c["name"] == "posts").unwrap();
    assert_eq!(posts["enabled"], true);
    assert_eq!(posts["num_fields"], 2);
}

#[tokio::test]
async fn test_version_endpoint() {
    let engine = FakeEngine::with_collections(&[]);
    let (app, _) = test_app(engine, test_config());

    let (status, body) = get(app, "/version").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["agent"], "search-sync-agent");
    assert!(body["version"].as_str().unwrap().starts_with("0.1."));
}

#[tokio::test]
async fn test_routes_mount_at_root_when_base_path_is_slash() {
    let engine = FakeEngine::with_collections(&["posts", "pages"]);
    let mut config = test_config();
    config.settings.base_path = "/".to_string();
    let (app, _) = test_app(engine, config);

    let (status, _) = get(app, "/search/collections").await;

    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let engine = FakeEngine::with_collections(&[]);
    let (app, _) = test_app(engine, test_config());

    let (status, body) = get(app, "/api-docs/openapi.json").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/search/{collection_name}"].is_object());
}

#[tokio::test]
async fn test_collection_search_engine_failure() {
    let engine = FakeEngine::with_collections(&["posts", "pages"]);
    engine.fail_searches_in("posts");
    let (app, _) = test_app(engine, test_config());

    let (status, body) = get(app, "/api/search/posts?q=x").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Search failed");
    assert_eq!(body["code"], "SEARCH_FAILED");
    assert!(body["details"].as_str().unwrap().contains("posts exploded"));
}

#[tokio::test]
async fn test_universal_search_is_served_from_cache() {
    let engine = FakeEngine::with_collections(&["posts", "pages"]);
    engine.set_hits("posts", vec![hit("1", Some(0.9))]);
    let (app, _) = test_app(engine.clone(), test_config());

    let (_, first) = get(app.clone(), "/api/search?q=x").await;
    let (_, second) = get(app, "/api/search?q=x").await;

    assert_eq!(first, second);
    // one engine query per enabled collection, for the first request only
    assert_eq!(engine.search_count(), 2);
}

#[tokio::test]
async fn test_universal_search_with_failure_is_not_cached() {
    let engine = FakeEngine::with_collections(&["posts", "pages"]);
    engine.set_hits("pages", vec![hit("p1", Some(0.5))]);
    engine.fail_searches_in("pages");
    let (app, _) = test_app(engine.clone(), test_config());

    let (_, first) = get(app.clone(), "/api/search?q=x").await;
    let pages = &first["collections"].as_array().unwrap()[0];
    assert_eq!(pages["collection"], "pages");
    assert!(pages["error"].is_string());

    engine.recover_searches_in("pages");
    let (status, second) = get(app, "/api/search?q=x").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(engine.search_count(), 4);
    let pages = &second["collections"].as_array().unwrap()[0];
    assert!(pages.get("error").is_none());
    assert_eq!(pages["found"], 1);
    assert_eq!(second["found"], 1);
}

#[tokio::test]
async fn test_collection_search_skips_statistics_lookup() {
    let engine = FakeEngine::with_collections(&["posts", "pages"]);
    let (app, _) = test_app(engine.clone(), test_config());

    get(app.clone(), "/api/search/posts?q=x").await;
    get(app.clone(), "/api/search/posts?q=x").await;
    get(app, "/api/search/posts/suggest?q=x").await;

    assert_eq!(engine.retrieve_calls.load(Ordering::SeqCst), 0);
}
