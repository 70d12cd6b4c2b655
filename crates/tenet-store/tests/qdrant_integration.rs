//! Requires Docker. Run with `cargo test -p tenet-store -- --ignored`.

use std::sync::Arc;
use std::time::Duration;

use tenet_ingest::{Chunk, SectionPriority, chunk_id, content_hash};
use tenet_store::{
    ChunkIndex, IndexedChunk, QdrantOps, StoreBackend, StoreConfig, StoreKind, VectorStore,
    open_vector_store,
};
use testcontainers::ContainerAsync;
use testcontainers::GenericImage;
use testcontainers::core::{ContainerPort, WaitFor};
use testcontainers::runners::AsyncRunner;

const QDRANT_GRPC_PORT: ContainerPort = ContainerPort::Tcp(6334);

fn qdrant_image() -> GenericImage {
    GenericImage::new("qdrant/qdrant", "v1.16.0")
        .with_wait_for(WaitFor::message_on_stdout("gRPC listening"))
        .with_exposed_port(QDRANT_GRPC_PORT)
}

async fn start_qdrant() -> (String, ContainerAsync<GenericImage>) {
    let container = qdrant_image().start().await.unwrap();
    let grpc_port = container.get_host_port_ipv4(6334).await.unwrap();
    (format!("http://127.0.0.1:{grpc_port}"), container)
}

fn chunk(title: &str, section: &str, text: &str) -> Chunk {
    Chunk {
        id: chunk_id(title, section, text).to_string(),
        title: title.into(),
        section: section.into(),
        text: text.into(),
        heading_level: Some(2),
        section_priority: SectionPriority::detect(section),
        content_hash: content_hash(title, section, text),
    }
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn ensure_collection_is_idempotent() {
    let (url, _container) = start_qdrant().await;
    let ops = QdrantOps::new(&url, Duration::from_secs(10)).unwrap();

    ops.ensure_collection("tenet_test", 4).await.unwrap();
    ops.ensure_collection("tenet_test", 4).await.unwrap();
    assert!(ops.collection_exists("tenet_test").await.unwrap());
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn factory_selects_qdrant_when_reachable() {
    let (url, _container) = start_qdrant().await;
    let config = StoreConfig {
        backend: StoreKind::Qdrant,
        url,
        collection: "tenet_factory".into(),
    };
    let selection = open_vector_store(&config, 4, Duration::from_secs(10)).await;
    assert_eq!(selection.backend, StoreBackend::Qdrant);
    assert!(!selection.store.is_degraded());
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn chunks_round_trip_with_vectors_and_metadata() {
    let (url, _container) = start_qdrant().await;
    let ops: Arc<dyn VectorStore> = Arc::new(QdrantOps::new(&url, Duration::from_secs(10)).unwrap());
    let index = ChunkIndex::new(ops, "tenet_chunks", 4);
    index.ensure().await.unwrap();

    let refund = chunk("Returns_and_Refunds.md", "Refund Window", "Refunds within 30 days.");
    let shipping = chunk("Delivery_and_Shipping.md", "Shipping SLA", "Bulky items ship in 7 days.");
    index
        .upsert(&[
            IndexedChunk {
                chunk: refund.clone(),
                vector: vec![1.0, 0.0, 0.0, 0.0],
            },
            IndexedChunk {
                chunk: shipping.clone(),
                vector: vec![0.0, 1.0, 0.0, 0.0],
            },
        ])
        .await
        .unwrap();
    assert_eq!(index.count().await.unwrap(), 2);

    let hits = index.search(&[1.0, 0.1, 0.0, 0.0], 2).await.unwrap();
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].chunk, refund);
    assert_eq!(hits[0].vector.len(), 4);
    assert!(hits[0].score > hits[1].score);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn reupsert_keeps_count_and_clear_empties() {
    let (url, _container) = start_qdrant().await;
    let ops: Arc<dyn VectorStore> = Arc::new(QdrantOps::new(&url, Duration::from_secs(10)).unwrap());
    let index = ChunkIndex::new(ops, "tenet_idem", 4);
    index.ensure().await.unwrap();

    let entry = IndexedChunk {
        chunk: chunk("Warranty_Policy.md", "Coverage", "Blenders are covered for 12 months."),
        vector: vec![0.5, 0.5, 0.5, 0.5],
    };
    index.upsert(std::slice::from_ref(&entry)).await.unwrap();
    index.upsert(&[entry]).await.unwrap();
    assert_eq!(index.count().await.unwrap(), 1);

    index.clear().await.unwrap();
    assert_eq!(index.count().await.unwrap(), 0);
}
