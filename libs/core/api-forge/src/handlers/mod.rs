//! HTTP Handlers for API Forge
//!
//! Serves the public and private API descriptions.

pub mod auth;
pub mod docs;

pub use auth::{BasicCredentials, unauthorized_response};
pub use docs::{DocsState, PRIVATE_DOCUMENT_PATH, PUBLIC_DOCUMENT_PATH, docs_router};
