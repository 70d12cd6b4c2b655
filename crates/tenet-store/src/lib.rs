//! Chunk vector storage: Qdrant when reachable, an in-memory index otherwise.

pub mod chunk_index;
pub mod in_memory_store;
pub mod qdrant_ops;
pub mod resilient;
pub mod selection;
pub mod vector_store;

pub use chunk_index::{ChunkIndex, IndexedChunk, StoredChunk};
pub use in_memory_store::{InMemoryVectorStore, cosine_similarity};
pub use qdrant_ops::QdrantOps;
pub use resilient::ResilientStore;
pub use selection::{
    FallbackReason, StoreBackend, StoreConfig, StoreKind, StoreSelection, open_vector_store,
};
pub use vector_store::{BoxFuture, ScoredVectorPoint, VectorPoint, VectorStore, VectorStoreError};
