//! Cache and invalidation controller
//!
//! [`SchemaCache`] owns the last published pair of documents and a stale
//! flag. Requests call [`SchemaCache::ensure_fresh`]; registry change
//! notifications call [`SchemaCache::invalidate`]. Documents are rebuilt as a
//! whole and swapped in only when both variants were built successfully.

use crate::error::{AggregationStep, ApiForgeError, Result};
use crate::merge::build_document;
use crate::registry::{RegistryEvent, ServiceRegistry};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::{RwLock, broadcast};
use tokio::task::JoinHandle;

/// File name of the public snapshot
pub const PUBLIC_SNAPSHOT: &str = "openapi.json";

/// File name of the private snapshot
pub const PRIVATE_SNAPSHOT: &str = "openapi-private.json";

/// One consistent public/private pair
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedDocuments {
    /// Bearer-only variant
    pub public: Value,
    /// Unfiltered variant
    pub private: Value,
}

#[derive(Debug)]
struct Published {
    epoch: u64,
    documents: Arc<GeneratedDocuments>,
}

pub struct SchemaCache {
    registry: Arc<dyn ServiceRegistry>,
    base: Value,
    snapshot_dir: Option<PathBuf>,
    stale: AtomicBool,
    epoch: AtomicU64,
    generation: AtomicU64,
    published: RwLock<Option<Published>>,
}

impl SchemaCache {
    /// `base` is the template with operator overrides already merged.
    pub fn new(registry: Arc<dyn ServiceRegistry>, base: Value) -> Self {
        Self {
            registry,
            base,
            snapshot_dir: None,
            stale: AtomicBool::new(true),
            epoch: AtomicU64::new(0),
            generation: AtomicU64::new(0),
            published: RwLock::new(None),
        }
    }

    /// Writes both documents into `dir` after every successful regeneration.
    pub fn with_snapshot_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.snapshot_dir = Some(dir.into());
        self
    }

    /// Marks the published documents as outdated. Idempotent.
    pub fn invalidate(&self) {
        self.epoch.fetch_add(1, Ordering::AcqRel);
        self.stale.store(true, Ordering::Release);
        tracing::debug!("API description invalidated");
    }

    pub fn is_stale(&self) -> bool {
        self.stale.load(Ordering::Acquire)
    }

    /// Number of successful regenerations so far
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Returns up-to-date documents, regenerating them when stale.
    ///
    /// On failure the previously published documents stay in place and the
    /// cache stays stale, so the next call retries.
    pub async fn ensure_fresh(&self) -> Result<Arc<GeneratedDocuments>> {
        if !self.stale.swap(false, Ordering::AcqRel) {
            if let Some(published) = self.published.read().await.as_ref() {
                return Ok(Arc::clone(&published.documents));
            }
        }

        match self.regenerate().await {
            Ok(documents) => Ok(documents),
            Err(err) => {
                self.stale.store(true, Ordering::Release);
                Err(err)
            }
        }
    }

    async fn regenerate(&self) -> Result<Arc<GeneratedDocuments>> {
        let epoch = self.epoch.load(Ordering::Acquire);

        let services = self
            .registry
            .list_services(true)
            .await
            .map_err(|e| {
                ApiForgeError::aggregation(AggregationStep::ListServices, "service registry", e)
            })?;

        let documents = Arc::new(GeneratedDocuments {
            public: build_document(&self.base, &services, true)?,
            private: build_document(&self.base, &services, false)?,
        });

        {
            let mut published = self.published.write().await;
            // A slower regeneration must not replace a newer one
            if let Some(current) = published.as_ref() {
                if current.epoch > epoch {
                    return Ok(Arc::clone(&current.documents));
                }
            }
            *published = Some(Published {
                epoch,
                documents: Arc::clone(&documents),
            });
        }

        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        tracing::info!(
            generation,
            services = services.len(),
            public_paths = path_count(&documents.public),
            private_paths = path_count(&documents.private),
            "API description regenerated"
        );

        if let Some(dir) = &self.snapshot_dir {
            if let Err(e) = write_snapshots(dir, &documents).await {
                tracing::warn!(
                    dir = %dir.display(),
                    "Failed to write API description snapshots: {}",
                    e
                );
            }
        }

        Ok(documents)
    }

    /// Invalidates the cache on every registry event until the channel closes.
    pub fn spawn_invalidation_listener(
        self: &Arc<Self>,
        mut events: broadcast::Receiver<RegistryEvent>,
    ) -> JoinHandle<()> {
        let cache = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(RegistryEvent::ServicesChanged) => cache.invalidate(),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::debug!(skipped, "Registry events lagged");
                        cache.invalidate();
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        tracing::debug!("Registry event channel closed");
                        break;
                    }
                }
            }
        })
    }
}

/// Writes `openapi.json` and `openapi-private.json` into `dir`, pretty-printed.
pub async fn write_snapshots(dir: &Path, documents: &GeneratedDocuments) -> Result<()> {
    tokio::fs::create_dir_all(dir).await?;
    tokio::fs::write(
        dir.join(PUBLIC_SNAPSHOT),
        serde_json::to_vec_pretty(&documents.public)?,
    )
    .await?;
    tokio::fs::write(
        dir.join(PRIVATE_SNAPSHOT),
        serde_json::to_vec_pretty(&documents.private)?,
    )
    .await?;
    Ok(())
}

fn path_count(document: &Value) -> usize {
    document
        .get("paths")
        .and_then(Value::as_object)
        .map(|paths| {
            paths
                .values()
                .filter_map(Value::as_object)
                .map(|item| item.len())
                .sum()
        })
        .unwrap_or(0)
}
