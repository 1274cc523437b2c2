//! Endpoints serving the aggregated API description

use super::auth::{BasicCredentials, unauthorized_response};
use crate::cache::SchemaCache;
use crate::error::Result;
use axum::{
    Json, Router,
    extract::State,
    http::HeaderMap,
    response::{IntoResponse, Response},
    routing::get,
};
use std::sync::Arc;

/// Route of the bearer-only document
pub const PUBLIC_DOCUMENT_PATH: &str = "/openapi.json";

/// Route of the unfiltered document, behind basic auth
pub const PRIVATE_DOCUMENT_PATH: &str = "/openapi-private.json";

/// Shared state of the document endpoints
#[derive(Clone)]
pub struct DocsState {
    cache: Arc<SchemaCache>,
    credentials: BasicCredentials,
}

impl DocsState {
    pub fn new(cache: Arc<SchemaCache>, credentials: BasicCredentials) -> Self {
        Self { cache, credentials }
    }

    pub fn cache(&self) -> &Arc<SchemaCache> {
        &self.cache
    }
}

/// Router with the public and private document endpoints
pub fn docs_router(state: DocsState) -> Router {
    Router::new()
        .route(PUBLIC_DOCUMENT_PATH, get(public_document))
        .route(PRIVATE_DOCUMENT_PATH, get(private_document))
        .with_state(state)
}

async fn public_document(State(state): State<DocsState>) -> Result<Response> {
    let documents = state.cache.ensure_fresh().await?;
    Ok(Json(&documents.public).into_response())
}

async fn private_document(
    State(state): State<DocsState>,
    headers: HeaderMap,
) -> Result<Response> {
    if !state.credentials.authorize(&headers) {
        tracing::info!(
            path = PRIVATE_DOCUMENT_PATH,
            "Rejected private API description request"
        );
        return Ok(unauthorized_response());
    }

    let documents = state.cache.ensure_fresh().await?;
    Ok(Json(&documents.private).into_response())
}
