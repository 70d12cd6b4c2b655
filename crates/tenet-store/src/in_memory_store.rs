use std::collections::HashMap;
use std::sync::RwLock;

use crate::vector_store::{
    BoxFuture, ScoredVectorPoint, VectorPoint, VectorStore, VectorStoreError,
};

struct StoredPoint {
    id: String,
    vector: Vec<f32>,
    payload: HashMap<String, serde_json::Value>,
}

/// Points kept in insertion order so equal scores rank deterministically.
#[derive(Default)]
struct InMemoryCollection {
    index: HashMap<String, usize>,
    points: Vec<StoredPoint>,
}

impl InMemoryCollection {
    fn insert(&mut self, point: VectorPoint) {
        let stored = StoredPoint {
            id: point.id,
            vector: point.vector,
            payload: point.payload,
        };
        if let Some(&pos) = self.index.get(&stored.id) {
            self.points[pos] = stored;
        } else {
            self.index.insert(stored.id.clone(), self.points.len());
            self.points.push(stored);
        }
    }
}

/// Non-persistent linear-scan store used when Qdrant is unavailable.
pub struct InMemoryVectorStore {
    collections: RwLock<HashMap<String, InMemoryCollection>>,
}

impl InMemoryVectorStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryVectorStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for InMemoryVectorStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryVectorStore").finish_non_exhaustive()
    }
}

/// Cosine similarity; 0 when either vector has zero norm.
#[must_use]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

impl VectorStore for InMemoryVectorStore {
    fn ensure_collection(
        &self,
        collection: &str,
        _vector_size: u64,
    ) -> BoxFuture<'_, Result<(), VectorStoreError>> {
        let collection = collection.to_owned();
        Box::pin(async move {
            let mut cols = self
                .collections
                .write()
                .map_err(|e| VectorStoreError::Collection(e.to_string()))?;
            cols.entry(collection).or_default();
            Ok(())
        })
    }

    fn collection_exists(&self, collection: &str) -> BoxFuture<'_, Result<bool, VectorStoreError>> {
        let collection = collection.to_owned();
        Box::pin(async move {
            let cols = self
                .collections
                .read()
                .map_err(|e| VectorStoreError::Collection(e.to_string()))?;
            Ok(cols.contains_key(&collection))
        })
    }

    fn delete_collection(&self, collection: &str) -> BoxFuture<'_, Result<(), VectorStoreError>> {
        let collection = collection.to_owned();
        Box::pin(async move {
            let mut cols = self
                .collections
                .write()
                .map_err(|e| VectorStoreError::Collection(e.to_string()))?;
            cols.remove(&collection);
            Ok(())
        })
    }

    fn upsert(
        &self,
        collection: &str,
        points: Vec<VectorPoint>,
    ) -> BoxFuture<'_, Result<(), VectorStoreError>> {
        let collection = collection.to_owned();
        Box::pin(async move {
            let mut cols = self
                .collections
                .write()
                .map_err(|e| VectorStoreError::Upsert(e.to_string()))?;
            let col = cols.get_mut(&collection).ok_or_else(|| {
                VectorStoreError::Upsert(format!("collection {collection} not found"))
            })?;
            for p in points {
                col.insert(p);
            }
            Ok(())
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
            let cols = self
                .collections
                .read()
                .map_err(|e| VectorStoreError::Search(e.to_string()))?;
            let col = cols.get(&collection).ok_or_else(|| {
                VectorStoreError::Search(format!("collection {collection} not found"))
            })?;

            let mut scored: Vec<ScoredVectorPoint> = col
                .points
                .iter()
                .map(|sp| ScoredVectorPoint {
                    id: sp.id.clone(),
                    score: cosine_similarity(&vector, &sp.vector),
                    vector: sp.vector.clone(),
                    payload: sp.payload.clone(),
                })
                .collect();

            // stable: equal scores keep insertion order
            scored.sort_by(|a, b| {
                b.score
                    .partial_cmp(&a.score)
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
            scored.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
            Ok(scored)
        })
    }

    fn count(&self, collection: &str) -> BoxFuture<'_, Result<u64, VectorStoreError>> {
        let collection = collection.to_owned();
        Box::pin(async move {
            let cols = self
                .collections
                .read()
                .map_err(|e| VectorStoreError::Count(e.to_string()))?;
            let col = cols.get(&collection).ok_or_else(|| {
                VectorStoreError::Count(format!("collection {collection} not found"))
            })?;
            Ok(col.points.len() as u64)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(id: &str, vector: Vec<f32>, title: &str) -> VectorPoint {
        VectorPoint {
            id: id.into(),
            vector,
            payload: HashMap::from([("title".to_owned(), serde_json::json!(title))]),
        }
    }

    #[tokio::test]
    async fn ensure_collection_is_idempotent() {
        let store = InMemoryVectorStore::new();
        store.ensure_collection("c", 3).await.unwrap();
        store.upsert("c", vec![point("a", vec![1.0, 0.0, 0.0], "A")]).await.unwrap();
        store.ensure_collection("c", 3).await.unwrap();
        assert_eq!(store.count("c").await.unwrap(), 1);
        assert!(store.collection_exists("c").await.unwrap());
        assert!(!store.collection_exists("other").await.unwrap());
    }

    #[tokio::test]
    async fn search_ranks_by_cosine_and_returns_vectors() {
        let store = InMemoryVectorStore::new();
        store.ensure_collection("c", 2).await.unwrap();
        store
            .upsert(
                "c",
                vec![
                    point("far", vec![0.0, 1.0], "Far"),
                    point("near", vec![1.0, 0.1], "Near"),
                ],
            )
            .await
            .unwrap();

        let results = store.search("c", vec![1.0, 0.0], 10).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].id, "near");
        assert_eq!(results[0].vector, vec![1.0, 0.1]);
        assert_eq!(results[0].payload["title"], "Near");
        assert!(results[0].score > results[1].score);
    }

    #[tokio::test]
    async fn ties_keep_insertion_order() {
        let store = InMemoryVectorStore::new();
        store.ensure_collection("c", 2).await.unwrap();
        let pts = ["p1", "p2", "p3"]
            .iter()
            .map(|id| point(id, vec![1.0, 1.0], id))
            .collect();
        store.upsert("c", pts).await.unwrap();

        let ids: Vec<_> = store
            .search("c", vec![1.0, 1.0], 10)
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, vec!["p1", "p2", "p3"]);
    }

    #[tokio::test]
    async fn upsert_replaces_by_id() {
        let store = InMemoryVectorStore::new();
        store.ensure_collection("c", 2).await.unwrap();
        store.upsert("c", vec![point("a", vec![1.0, 0.0], "old")]).await.unwrap();
        store.upsert("c", vec![point("a", vec![0.0, 1.0], "new")]).await.unwrap();

        assert_eq!(store.count("c").await.unwrap(), 1);
        let results = store.search("c", vec![0.0, 1.0], 1).await.unwrap();
        assert_eq!(results[0].payload["title"], "new");
    }

    #[tokio::test]
    async fn search_respects_limit() {
        let store = InMemoryVectorStore::new();
        store.ensure_collection("c", 2).await.unwrap();
        let pts = (0..5)
            .map(|i| point(&i.to_string(), vec![1.0, 0.0], "t"))
            .collect();
        store.upsert("c", pts).await.unwrap();
        assert_eq!(store.search("c", vec![1.0, 0.0], 3).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn missing_collection_errors() {
        let store = InMemoryVectorStore::new();
        assert!(store.search("none", vec![1.0], 1).await.is_err());
        assert!(store.upsert("none", vec![]).await.is_err());
        assert!(store.count("none").await.is_err());
    }

    #[tokio::test]
    async fn delete_collection_removes_points() {
        let store = InMemoryVectorStore::new();
        store.ensure_collection("c", 2).await.unwrap();
        store.upsert("c", vec![point("a", vec![1.0, 0.0], "A")]).await.unwrap();
        store.delete_collection("c").await.unwrap();
        assert!(!store.collection_exists("c").await.unwrap());
    }

    #[test]
    fn cosine_of_zero_vector_is_zero() {
        assert!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]).abs() < f32::EPSILON);
        assert!((cosine_similarity(&[2.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
    }
}
