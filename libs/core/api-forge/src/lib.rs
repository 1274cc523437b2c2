//! API Forge - aggregated API description from a live service registry
//!
//! This library provides:
//! - A base document template with operator overrides
//! - A merge engine folding service and action fragments into one document
//! - A public (bearer-only) and a private variant of that document
//! - A cache regenerated on registry change notifications
//! - Axum handlers serving both variants, the private one behind basic auth

pub mod cache;
pub mod error;
pub mod handlers;
pub mod merge;
pub mod registry;
pub mod security;
pub mod template;

pub use cache::{GeneratedDocuments, SchemaCache};
pub use error::{AggregationStep, ApiForgeError, Result};
pub use handlers::{BasicCredentials, DocsState, docs_router};
pub use merge::{HttpMethod, PathEntry, build_document, deep_merge};
pub use registry::{
    ActionDescriptor, InMemoryRegistry, RegistryEvent, ServiceDescriptor, ServiceRegistry,
};
pub use template::{TemplateInfo, base_document, default_document, load_overrides};
