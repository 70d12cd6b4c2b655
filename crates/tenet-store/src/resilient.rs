use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::in_memory_store::InMemoryVectorStore;
use crate::vector_store::{
    BoxFuture, ScoredVectorPoint, VectorPoint, VectorStore, VectorStoreError,
};

/// Runs every call against a primary store until the first failure, then switches
/// permanently to an in-memory store.
///
/// Points written to the primary before the switch are not copied over; the next
/// ingest repopulates the fallback.
pub struct ResilientStore {
    primary: Box<dyn VectorStore>,
    fallback: InMemoryVectorStore,
    degraded: AtomicBool,
    switching: tokio::sync::Mutex<()>,
    known_collections: Mutex<HashMap<String, u64>>,
    timeout: Duration,
}

impl std::fmt::Debug for ResilientStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResilientStore")
            .field("degraded", &self.degraded.load(Ordering::Relaxed))
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl ResilientStore {
    #[must_use]
    pub fn new(primary: Box<dyn VectorStore>, timeout: Duration) -> Self {
        Self {
            primary,
            fallback: InMemoryVectorStore::new(),
            degraded: AtomicBool::new(false),
            switching: tokio::sync::Mutex::new(()),
            known_collections: Mutex::new(HashMap::new()),
            timeout,
        }
    }

    fn remember(&self, collection: &str, vector_size: u64) {
        if let Ok(mut known) = self.known_collections.lock() {
            known.insert(collection.to_owned(), vector_size);
        }
    }

    async fn primary_call<T, F>(&self, fut: F) -> Result<T, VectorStoreError>
    where
        F: Future<Output = Result<T, VectorStoreError>>,
    {
        tokio::time::timeout(self.timeout, fut)
            .await
            .map_err(|_| VectorStoreError::Timeout)?
    }

    /// The flag is only raised once the fallback holds every known collection.
    async fn degrade(&self, op: &str, error: &VectorStoreError) -> Result<(), VectorStoreError> {
        let _switching = self.switching.lock().await;
        if self.is_degraded() {
            return Ok(());
        }
        tracing::warn!(op, %error, "vector store primary failed, switching to in-memory fallback");
        let known: Vec<(String, u64)> = self
            .known_collections
            .lock()
            .map(|k| k.iter().map(|(c, s)| (c.clone(), *s)).collect())
            .unwrap_or_default();
        for (collection, size) in known {
            self.fallback.ensure_collection(&collection, size).await?;
        }
        self.degraded.store(true, Ordering::SeqCst);
        Ok(())
    }
}

impl VectorStore for ResilientStore {
    fn ensure_collection(
        &self,
        collection: &str,
        vector_size: u64,
    ) -> BoxFuture<'_, Result<(), VectorStoreError>> {
        let collection = collection.to_owned();
        Box::pin(async move {
            self.remember(&collection, vector_size);
            if !self.is_degraded() {
                match self
                    .primary_call(self.primary.ensure_collection(&collection, vector_size))
                    .await
                {
                    Ok(()) => return Ok(()),
                    Err(e) => self.degrade("ensure_collection", &e).await?,
                }
            }
            self.fallback
                .ensure_collection(&collection, vector_size)
                .await
        })
    }

    fn collection_exists(&self, collection: &str) -> BoxFuture<'_, Result<bool, VectorStoreError>> {
        let collection = collection.to_owned();
        Box::pin(async move {
            if !self.is_degraded() {
                match self
                    .primary_call(self.primary.collection_exists(&collection))
                    .await
                {
                    Ok(exists) => return Ok(exists),
                    Err(e) => self.degrade("collection_exists", &e).await?,
                }
            }
            self.fallback.collection_exists(&collection).await
        })
    }

    fn delete_collection(&self, collection: &str) -> BoxFuture<'_, Result<(), VectorStoreError>> {
        let collection = collection.to_owned();
        Box::pin(async move {
            if !self.is_degraded() {
                match self
                    .primary_call(self.primary.delete_collection(&collection))
                    .await
                {
                    Ok(()) => return Ok(()),
                    Err(e) => self.degrade("delete_collection", &e).await?,
                }
            }
            self.fallback.delete_collection(&collection).await
        })
    }

    fn upsert(
        &self,
        collection: &str,
        points: Vec<VectorPoint>,
    ) -> BoxFuture<'_, Result<(), VectorStoreError>> {
        let collection = collection.to_owned();
        Box::pin(async move {
            if !self.is_degraded() {
                match self
                    .primary_call(self.primary.upsert(&collection, points.clone()))
                    .await
                {
                    Ok(()) => return Ok(()),
                    Err(e) => self.degrade("upsert", &e).await?,
                }
            }
            self.fallback.upsert(&collection, points).await
        })
    }

    fn search(
        &self,
        collection: &str,
        vector: Vec<f32>,
        limit: u64,
    ) -> BoxFuture<'_, Result<Vec<ScoredVectorPoint>, VectorStoreError>> {
        let collection = collection.to_owned();
        Box::pin(async move {
            if !self.is_degraded() {
                match self
                    .primary_call(self.primary.search(&collection, vector.clone(), limit))
                    .await
                {
                    Ok(results) => return Ok(results),
                    Err(e) => self.degrade("search", &e).await?,
                }
            }
            self.fallback.search(&collection, vector, limit).await
        })
    }

    fn count(&self, collection: &str) -> BoxFuture<'_, Result<u64, VectorStoreError>> {
        let collection = collection.to_owned();
        Box::pin(async move {
            if !self.is_degraded() {
                match self.primary_call(self.primary.count(&collection)).await {
                    Ok(n) => return Ok(n),
                    Err(e) => self.degrade("count", &e).await?,
                }
            }
            self.fallback.count(&collection).await
        })
    }

    fn is_degraded(&self) -> bool {
        self.degraded.load(Ordering::SeqCst)
    }
}
