//! Handler tests for the API description endpoints
//!
//! These tests drive the router with `oneshot()` against an in-memory
//! registry and check:
//! - Status codes and content types
//! - Public/private filtering
//! - Basic auth on the private document
//! - Cache behavior across registry changes

use api_forge::handlers::{PRIVATE_DOCUMENT_PATH, PUBLIC_DOCUMENT_PATH};
use api_forge::*;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use axum_extra::headers::{Authorization, HeaderMapExt};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt; // For oneshot()

const LOGIN: &str = "your-login";
const PASSWORD: &str = "your-password";

// Helper to parse JSON response body
async fn json_body(body: Body) -> Value {
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn base() -> Value {
    json!({
        "openapi": "3.0.3",
        "info": { "title": "test API", "version": "0.0.0" },
        "paths": {},
        "components": { "schemas": {} },
        "security": [],
        "tags": []
    })
}

fn catalog() -> Vec<ServiceDescriptor> {
    vec![
        ServiceDescriptor::new("products")
            .with_schema(json!({
                "components": { "schemas": { "Product": { "type": "object" } } }
            }))
            .with_action(ActionDescriptor::new("list").with_openapi(json!({
                "$path": "GET /products",
                "summary": "List products"
            })))
            .with_action(ActionDescriptor::new("create").with_openapi(json!({
                "$path": "POST /products",
                "security": [{ "bearerAuth": [] }]
            })))
            .with_action(ActionDescriptor::new("purge").with_openapi(json!({
                "$path": "DELETE /products",
                "security": [{ "basicAuth": [] }]
            }))),
        ServiceDescriptor::new("items").with_action(ActionDescriptor::new("crud").with_openapi(
            json!([
                { "$path": "GET /items/{id}", "summary": "Get item" },
                { "$path": "PUT /items/{id}", "summary": "Update item" }
            ]),
        )),
    ]
}

fn state_with(registry: Arc<InMemoryRegistry>) -> DocsState {
    let cache = Arc::new(SchemaCache::new(registry, base()));
    DocsState::new(cache, BasicCredentials::new(LOGIN, PASSWORD))
}

fn app_with(registry: Arc<InMemoryRegistry>) -> Router {
    docs_router(state_with(registry))
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn get_with_basic(uri: &str, login: &str, password: &str) -> Request<Body> {
    let mut request = get(uri);
    request
        .headers_mut()
        .typed_insert(Authorization::basic(login, password));
    request
}

#[tokio::test]
async fn test_public_document_returns_json() {
    let app = app_with(Arc::new(InMemoryRegistry::with_services(catalog())));

    let response = app.oneshot(get(PUBLIC_DOCUMENT_PATH)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/json"
    );
    let doc = json_body(response.into_body()).await;
    assert_eq!(doc["openapi"], "3.0.3");
    assert_eq!(doc["components"]["schemas"]["Product"]["type"], "object");
}

#[tokio::test]
async fn test_public_document_filters_non_bearer_operations() {
    let app = app_with(Arc::new(InMemoryRegistry::with_services(catalog())));

    let response = app.oneshot(get(PUBLIC_DOCUMENT_PATH)).await.unwrap();
    let doc = json_body(response.into_body()).await;

    // No security declared: public
    assert_eq!(doc["paths"]["/products"]["get"]["summary"], "List products");
    // Bearer requirement: public
    assert!(doc["paths"]["/products"].get("post").is_some());
    // Basic only: private
    assert!(doc["paths"]["/products"].get("delete").is_none());
}

#[tokio::test]
async fn test_private_document_with_valid_credentials() {
    let app = app_with(Arc::new(InMemoryRegistry::with_services(catalog())));

    let response = app
        .oneshot(get_with_basic(PRIVATE_DOCUMENT_PATH, LOGIN, PASSWORD))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let doc = json_body(response.into_body()).await;
    assert!(doc["paths"]["/products"].get("get").is_some());
    assert!(doc["paths"]["/products"].get("delete").is_some());
    assert_eq!(doc["components"]["schemas"]["Product"]["type"], "object");
}

#[tokio::test]
async fn test_private_document_rejects_missing_credentials() {
    let state = state_with(Arc::new(InMemoryRegistry::with_services(catalog())));
    let app = docs_router(state.clone());
    let cache = state.cache();

    let response = app.oneshot(get(PRIVATE_DOCUMENT_PATH)).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.headers().get(header::WWW_AUTHENTICATE).unwrap(),
        r#"Basic realm="401""#
    );
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert!(serde_json::from_slice::<Value>(&bytes).is_err());
    // Rejected before any regeneration
    assert_eq!(cache.generation(), 0);
}

#[tokio::test]
async fn test_private_document_rejects_wrong_credentials() {
    let app = app_with(Arc::new(InMemoryRegistry::with_services(catalog())));

    let response = app
        .oneshot(get_with_basic(PRIVATE_DOCUMENT_PATH, LOGIN, "guess"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().contains_key(header::WWW_AUTHENTICATE));
}

#[tokio::test]
async fn test_action_sequence_yields_one_entry_per_element() {
    let app = app_with(Arc::new(InMemoryRegistry::with_services(catalog())));

    let response = app.oneshot(get(PUBLIC_DOCUMENT_PATH)).await.unwrap();
    let doc = json_body(response.into_body()).await;

    let item = doc["paths"]["/items/{id}"].as_object().unwrap();
    assert_eq!(item.len(), 2);
    assert_eq!(item["get"]["summary"], "Get item");
    assert_eq!(item["put"]["summary"], "Update item");
}

#[tokio::test]
async fn test_later_service_wins_on_duplicate_route() {
    let registry = Arc::new(InMemoryRegistry::with_services(vec![
        ServiceDescriptor::new("first").with_action(ActionDescriptor::new("find").with_openapi(
            json!({ "$path": "GET /search", "summary": "first" }),
        )),
        ServiceDescriptor::new("second").with_action(ActionDescriptor::new("find").with_openapi(
            json!({ "$path": "GET /search", "summary": "second" }),
        )),
    ]));
    let app = app_with(registry);

    let response = app.oneshot(get(PUBLIC_DOCUMENT_PATH)).await.unwrap();
    let doc = json_body(response.into_body()).await;

    assert_eq!(doc["paths"]["/search"].as_object().unwrap().len(), 1);
    assert_eq!(doc["paths"]["/search"]["get"], json!({ "summary": "second" }));
}

#[tokio::test]
async fn test_documents_follow_registry_notifications() {
    let registry = Arc::new(InMemoryRegistry::with_services(catalog()));
    let state = state_with(registry.clone());
    let app = docs_router(state.clone());
    let cache = state.cache();

    let first = json_body(
        app.clone()
            .oneshot(get(PUBLIC_DOCUMENT_PATH))
            .await
            .unwrap()
            .into_body(),
    )
    .await;

    // Not invalidated: cached document is served unchanged
    registry.unregister("items").await;
    let cached = json_body(
        app.clone()
            .oneshot(get(PUBLIC_DOCUMENT_PATH))
            .await
            .unwrap()
            .into_body(),
    )
    .await;
    assert_eq!(first, cached);
    assert_eq!(cache.generation(), 1);

    cache.invalidate();
    let fresh = json_body(
        app.oneshot(get(PUBLIC_DOCUMENT_PATH))
            .await
            .unwrap()
            .into_body(),
    )
    .await;
    assert_ne!(first, fresh);
    assert!(fresh["paths"].get("/items/{id}").is_none());
    assert_eq!(cache.generation(), 2);
}

#[tokio::test]
async fn test_aggregation_failure_renders_error_response() {
    let registry = Arc::new(InMemoryRegistry::with_services(vec![
        ServiceDescriptor::new("orders").with_action(
            ActionDescriptor::new("create").with_openapi(json!({ "summary": "no route" })),
        ),
    ]));
    let app = app_with(registry);

    let response = app.oneshot(get(PUBLIC_DOCUMENT_PATH)).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(response.into_body()).await;
    assert_eq!(body["error"], "SCHEMA_AGGREGATION_FAILED");
    assert_eq!(body["details"]["step"], "parse_path");
    assert!(body["details"]["context"].as_str().unwrap().contains("orders"));
}
