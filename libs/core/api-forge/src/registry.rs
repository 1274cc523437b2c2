//! Service registry
//!
//! The aggregator only reads from the registry: [`ServiceRegistry`] is polled
//! for a snapshot whenever a document is regenerated, and changes are
//! announced on a broadcast channel of [`RegistryEvent`]s.
//!
//! [`InMemoryRegistry`] is the registry used by the docs binary and the
//! tests. It can be filled from a YAML or JSON manifest.

use crate::error::{ApiForgeError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;
use tokio::sync::{RwLock, broadcast};

/// Key of the service-level fragment inside `settings`
pub const SERVICE_FRAGMENT_KEY: &str = "openapi";

const EVENT_CAPACITY: usize = 16;

/// A registered unit of business logic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceDescriptor {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default)]
    pub settings: Map<String, Value>,
    #[serde(default)]
    pub actions: Vec<ActionDescriptor>,
}

impl ServiceDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: None,
            settings: Map::new(),
            actions: Vec::new(),
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Sets `settings.openapi`
    pub fn with_schema(mut self, fragment: Value) -> Self {
        self.settings
            .insert(SERVICE_FRAGMENT_KEY.to_string(), fragment);
        self
    }

    pub fn with_action(mut self, action: ActionDescriptor) -> Self {
        self.actions.push(action);
        self
    }

    /// The service-level fragment, if any
    pub fn schema_fragment(&self) -> Option<&Value> {
        self.settings.get(SERVICE_FRAGMENT_KEY)
    }

    fn without_actions(&self) -> Self {
        Self {
            actions: Vec::new(),
            ..self.clone()
        }
    }
}

/// One callable operation of a service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionDescriptor {
    pub name: String,
    /// A single path entry or an ordered list of them
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openapi: Option<Value>,
}

impl ActionDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            openapi: None,
        }
    }

    pub fn with_openapi(mut self, fragment: Value) -> Self {
        self.openapi = Some(fragment);
        self
    }

    pub fn fragment(&self) -> Option<&Value> {
        self.openapi.as_ref()
    }
}

/// Change notification published by a registry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryEvent {
    /// A service was added, removed or replaced
    ServicesChanged,
}

/// Read-only view of the set of registered services
#[async_trait]
pub trait ServiceRegistry: Send + Sync {
    /// Snapshot of all services in registration order.
    ///
    /// With `with_actions == false` every descriptor has an empty action list.
    async fn list_services(&self, with_actions: bool) -> Result<Vec<ServiceDescriptor>>;
}

/// Parses a YAML or JSON service manifest.
///
/// The layout is either a bare list of services or `{ services: [...] }`.
/// The document is read into a [`Value`] first so that YAML integer keys
/// (`200:` under `responses`) become JSON string keys.
pub fn parse_manifest(source_name: &str, raw: &str) -> Result<Vec<ServiceDescriptor>> {
    let manifest_error = |details: String| ApiForgeError::Manifest {
        source_name: source_name.to_string(),
        details,
    };

    let document: Value =
        serde_yaml_ng::from_str(raw).map_err(|e| manifest_error(e.to_string()))?;
    let services = match document {
        Value::Array(items) => Value::Array(items),
        Value::Object(mut object) => object.remove("services").ok_or_else(|| {
            manifest_error("expected a list of services or a `services` field".to_string())
        })?,
        _ => {
            return Err(manifest_error(
                "expected a list of services or a `services` field".to_string(),
            ));
        }
    };

    serde_json::from_value(services).map_err(|e| manifest_error(e.to_string()))
}

/// Reads and parses a service manifest file.
pub async fn read_manifest(path: &Path) -> Result<Vec<ServiceDescriptor>> {
    let raw = tokio::fs::read_to_string(path).await?;
    parse_manifest(&path.display().to_string(), &raw)
}

/// Registry backed by a vector kept in registration order
#[derive(Debug)]
pub struct InMemoryRegistry {
    services: RwLock<Vec<ServiceDescriptor>>,
    events: broadcast::Sender<RegistryEvent>,
}

impl Default for InMemoryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::with_services(Vec::new())
    }

    pub fn with_services(services: Vec<ServiceDescriptor>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            services: RwLock::new(services),
            events,
        }
    }

    pub fn from_manifest_str(raw: &str) -> Result<Self> {
        Ok(Self::with_services(parse_manifest("manifest", raw)?))
    }

    pub async fn load_manifest(path: &Path) -> Result<Self> {
        Ok(Self::with_services(read_manifest(path).await?))
    }

    /// Receiver for change notifications
    pub fn subscribe(&self) -> broadcast::Receiver<RegistryEvent> {
        self.events.subscribe()
    }

    /// Adds `service`, replacing in place any service with the same name.
    pub async fn register(&self, service: ServiceDescriptor) {
        let mut services = self.services.write().await;
        match services.iter_mut().find(|s| s.name == service.name) {
            Some(existing) => *existing = service,
            None => services.push(service),
        }
        drop(services);
        self.notify();
    }

    /// Removes the service named `name`; `false` when there was none.
    pub async fn unregister(&self, name: &str) -> bool {
        let mut services = self.services.write().await;
        let before = services.len();
        services.retain(|s| s.name != name);
        let removed = services.len() != before;
        drop(services);

        if removed {
            self.notify();
        }
        removed
    }

    pub async fn replace_all(&self, services: Vec<ServiceDescriptor>) {
        *self.services.write().await = services;
        self.notify();
    }

    /// Re-reads `path` and swaps the registry content. On error the current
    /// content is kept.
    pub async fn reload_manifest(&self, path: &Path) -> Result<usize> {
        let services = read_manifest(path).await?;
        let count = services.len();
        self.replace_all(services).await;
        Ok(count)
    }

    pub async fn len(&self) -> usize {
        self.services.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.services.read().await.is_empty()
    }

    fn notify(&self) {
        // No subscribers is not an error
        let _ = self.events.send(RegistryEvent::ServicesChanged);
    }
}

#[async_trait]
impl ServiceRegistry for InMemoryRegistry {
    async fn list_services(&self, with_actions: bool) -> Result<Vec<ServiceDescriptor>> {
        let services = self.services.read().await;
        Ok(if with_actions {
            services.clone()
        } else {
            services.iter().map(ServiceDescriptor::without_actions).collect()
        })
    }
}
