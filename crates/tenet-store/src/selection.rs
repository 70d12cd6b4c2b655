//! Picks the vector store backend at startup.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::in_memory_store::InMemoryVectorStore;
use crate::qdrant_ops::QdrantOps;
use crate::resilient::ResilientStore;
use crate::vector_store::{VectorStore, VectorStoreError};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    #[default]
    Qdrant,
    Memory,
}

impl std::str::FromStr for StoreKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "qdrant" => Ok(Self::Qdrant),
            "memory" => Ok(Self::Memory),
            other => Err(format!("unknown vector store backend: {other}")),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreKind,
    pub url: String,
    pub collection: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreKind::Qdrant,
            url: "http://localhost:6334".into(),
            collection: "policy_helper".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackReason {
    /// The in-memory backend was requested explicitly.
    Configured,
    PrimaryUnavailable(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    Qdrant,
    InMemory { reason: FallbackReason },
}

impl StoreBackend {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Qdrant => "qdrant",
            Self::InMemory { .. } => "memory",
        }
    }

    /// `true` when the in-memory store replaced an unavailable primary.
    #[must_use]
    pub fn is_fallback(&self) -> bool {
        matches!(
            self,
            Self::InMemory {
                reason: FallbackReason::PrimaryUnavailable(_)
            }
        )
    }
}

impl fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub struct StoreSelection {
    pub store: Arc<dyn VectorStore>,
    pub backend: StoreBackend,
}

impl fmt::Debug for StoreSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreSelection")
            .field("backend", &self.backend)
            .finish_non_exhaustive()
    }
}

impl StoreSelection {
    fn in_memory(reason: FallbackReason) -> Self {
        Self {
            store: Arc::new(InMemoryVectorStore::new()),
            backend: StoreBackend::InMemory { reason },
        }
    }
}

async fn probe_qdrant(
    config: &StoreConfig,
    dimension: u64,
    timeout: Duration,
) -> Result<QdrantOps, VectorStoreError> {
    let ops = QdrantOps::new(&config.url, timeout)
        .map_err(|e| VectorStoreError::Connection(e.to_string()))?;
    tokio::time::timeout(timeout, ops.ensure_collection(&config.collection, dimension))
        .await
        .map_err(|_| VectorStoreError::Timeout)?
        .map_err(|e| VectorStoreError::Connection(e.to_string()))?;
    Ok(ops)
}

/// Open the configured store, falling back to memory when Qdrant cannot be reached.
///
/// Never fails: every primary error selects the in-memory backend and is reported
/// through [`StoreBackend::InMemory`].
pub async fn open_vector_store(
    config: &StoreConfig,
    dimension: u64,
    timeout: Duration,
) -> StoreSelection {
    if config.backend == StoreKind::Memory {
        tracing::info!("using in-memory vector store");
        return StoreSelection::in_memory(FallbackReason::Configured);
    }

    match probe_qdrant(config, dimension, timeout).await {
        Ok(ops) => {
            tracing::info!(url = %config.url, collection = %config.collection, "connected to Qdrant");
            StoreSelection {
                store: Arc::new(ResilientStore::new(Box::new(ops), timeout)),
                backend: StoreBackend::Qdrant,
            }
        }
        Err(e) => {
            tracing::warn!(
                url = %config.url,
                error = %e,
                "Qdrant unavailable, falling back to in-memory vector store"
            );
            StoreSelection::in_memory(FallbackReason::PrimaryUnavailable(e.to_string()))
        }
    }
}
