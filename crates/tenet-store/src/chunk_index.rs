use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{Value, json};
use tenet_ingest::{Chunk, SectionPriority};

use crate::vector_store::{VectorPoint, VectorStore, VectorStoreError};

/// A chunk paired with its embedding, ready to be written.
#[derive(Debug, Clone)]
pub struct IndexedChunk {
    pub chunk: Chunk,
    pub vector: Vec<f32>,
}

/// A chunk read back from the store with its similarity to the query.
#[derive(Debug, Clone)]
pub struct StoredChunk {
    pub chunk: Chunk,
    pub score: f32,
    pub vector: Vec<f32>,
}

/// Chunk-level view of a [`VectorStore`] bound to one collection.
pub struct ChunkIndex {
    store: Arc<dyn VectorStore>,
    collection: String,
    dimension: u64,
}

impl std::fmt::Debug for ChunkIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChunkIndex")
            .field("collection", &self.collection)
            .field("dimension", &self.dimension)
            .finish_non_exhaustive()
    }
}

impl ChunkIndex {
    #[must_use]
    pub fn new(store: Arc<dyn VectorStore>, collection: impl Into<String>, dimension: u64) -> Self {
        Self {
            store,
            collection: collection.into(),
            dimension,
        }
    }

    #[must_use]
    pub fn collection(&self) -> &str {
        &self.collection
    }

    #[must_use]
    pub fn is_degraded(&self) -> bool {
        self.store.is_degraded()
    }

    /// # Errors
    ///
    /// Returns an error if the collection cannot be created.
    pub async fn ensure(&self) -> Result<(), VectorStoreError> {
        self.store
            .ensure_collection(&self.collection, self.dimension)
            .await
    }

    /// Write chunks keyed by chunk id; existing ids are overwritten.
    ///
    /// # Errors
    ///
    /// Returns an error if the upsert fails.
    pub async fn upsert(&self, chunks: &[IndexedChunk]) -> Result<(), VectorStoreError> {
        if chunks.is_empty() {
            return Ok(());
        }
        let points = chunks
            .iter()
            .map(|c| VectorPoint {
                id: c.chunk.id.clone(),
                vector: c.vector.clone(),
                payload: chunk_payload(&c.chunk),
            })
            .collect();
        self.store.upsert(&self.collection, points).await
    }

    /// Up to `limit` chunks ranked by cosine similarity.
    ///
    /// # Errors
    ///
    /// Returns an error if the search fails.
    pub async fn search(
        &self,
        vector: &[f32],
        limit: usize,
    ) -> Result<Vec<StoredChunk>, VectorStoreError> {
        let limit = u64::try_from(limit).unwrap_or(u64::MAX);
        let points = self
            .store
            .search(&self.collection, vector.to_vec(), limit)
            .await?;
        Ok(points
            .into_iter()
            .filter_map(|p| {
                let Some(chunk) = chunk_from_payload(&p.id, &p.payload) else {
                    tracing::warn!(id = %p.id, "skipping stored point with incomplete payload");
                    return None;
                };
                Some(StoredChunk {
                    chunk,
                    score: p.score,
                    vector: p.vector,
                })
            })
            .collect())
    }

    /// # Errors
    ///
    /// Returns an error if the count fails.
    pub async fn count(&self) -> Result<u64, VectorStoreError> {
        self.store.count(&self.collection).await
    }

    /// Drop every stored chunk and recreate the empty collection.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection cannot be deleted or recreated.
    pub async fn clear(&self) -> Result<(), VectorStoreError> {
        self.store.delete_collection(&self.collection).await?;
        self.ensure().await
    }
}

fn chunk_payload(chunk: &Chunk) -> HashMap<String, Value> {
    HashMap::from([
        ("title".to_owned(), json!(chunk.title)),
        ("section".to_owned(), json!(chunk.section)),
        ("text".to_owned(), json!(chunk.text)),
        ("heading_level".to_owned(), json!(chunk.heading_level)),
        (
            "section_priority".to_owned(),
            json!(chunk.section_priority.map(SectionPriority::as_str)),
        ),
        ("content_hash".to_owned(), json!(chunk.content_hash)),
    ])
}

fn chunk_from_payload(id: &str, payload: &HashMap<String, Value>) -> Option<Chunk> {
    let str_field = |key: &str| payload.get(key).and_then(Value::as_str).map(str::to_owned);
    Some(Chunk {
        id: id.to_owned(),
        title: str_field("title")?,
        text: str_field("text")?,
        section: str_field("section").unwrap_or_default(),
        heading_level: payload
            .get("heading_level")
            .and_then(Value::as_u64)
            .and_then(|l| u8::try_from(l).ok()),
        section_priority: payload
            .get("section_priority")
            .and_then(Value::as_str)
            .and_then(SectionPriority::parse),
        content_hash: str_field("content_hash").unwrap_or_default(),
    })
}
