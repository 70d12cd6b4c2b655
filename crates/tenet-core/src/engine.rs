//! Ingest and ask pipelines over one chunk collection.

use std::collections::HashSet;
use std::path::Path;
use std::time::Instant;

use serde::Serialize;
use tenet_ingest::{Chunk, ChunkerConfig, DocumentLoader, chunk_document};
use tenet_llm::{AnyEmbedder, Embedder};
use tenet_store::{ChunkIndex, IndexedChunk, StoreSelection, open_vector_store};
use tokio::sync::Mutex;

use crate::bootstrap::{create_embedder, create_generator};
use crate::config::Config;
use crate::error::CoreError;
use crate::generator::{GenerationRequest, Generator};
use crate::metrics::{AskSample, MetricsSnapshot, MetricsTracker};
use crate::prompt::{load_agent_guide, system_prompt, user_prompt};
use crate::retriever::{MmrConfig, Retriever};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub indexed_docs: u64,
    pub indexed_chunks: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Citation {
    pub title: String,
    pub section: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnswerChunk {
    pub title: String,
    pub section: String,
    pub text: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AskResult {
    pub query: String,
    pub answer: String,
    pub citations: Vec<Citation>,
    pub chunks: Vec<AnswerChunk>,
    pub metrics: MetricsSnapshot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Health {
    pub status: &'static str,
}

/// Content hashes and titles already written to the current store.
#[derive(Debug, Default)]
struct IngestLedger {
    hashes: HashSet<String>,
    titles: HashSet<String>,
    /// Whether the ledger describes the in-memory fallback rather than the primary.
    on_fallback: bool,
}

pub struct RagEngine {
    embedder: AnyEmbedder,
    index: ChunkIndex,
    retriever: Retriever,
    generator: Generator,
    system_prompt: String,
    chunking: ChunkerConfig,
    agent_guide_file: String,
    default_k: usize,
    max_k: usize,
    metrics: MetricsTracker,
    ledger: Mutex<IngestLedger>,
}

impl std::fmt::Debug for RagEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RagEngine")
            .field("index", &self.index)
            .field("generator", &self.generator.model_label())
            .field("default_k", &self.default_k)
            .field("max_k", &self.max_k)
            .finish_non_exhaustive()
    }
}

impl RagEngine {
    /// Build every component from configuration.
    ///
    /// Qdrant being unreachable is not an error: the engine starts on the in-memory store.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Configuration`] if a provider cannot be constructed, or a store
    /// error if even the selected store cannot create the collection.
    pub async fn from_config(config: &Config) -> Result<Self, CoreError> {
        let embedder = create_embedder(config)?;
        let generator = create_generator(config)?;
        let dimension = u64::try_from(config.embedding.dimension)
            .map_err(|e| CoreError::Configuration(e.to_string()))?;
        let selection =
            open_vector_store(&config.store, dimension, config.timeouts.store()).await;
        let guide = load_agent_guide(&config.data.agent_guide_path()).await;
        Self::new(config, embedder, generator, selection, &guide).await
    }

    /// Assemble an engine from already-built parts.
    ///
    /// # Errors
    ///
    /// Returns a store error if the collection cannot be created.
    pub async fn new(
        config: &Config,
        embedder: AnyEmbedder,
        generator: Generator,
        selection: StoreSelection,
        agent_guide: &str,
    ) -> Result<Self, CoreError> {
        let dimension = u64::try_from(embedder.dimension())
            .map_err(|e| CoreError::Configuration(e.to_string()))?;
        let index = ChunkIndex::new(selection.store, config.store.collection.clone(), dimension);
        index.ensure().await?;

        let metrics = MetricsTracker::new(
            embedder.model_name(),
            &generator.model_label(),
            selection.backend.name(),
        );
        if selection.backend.is_fallback() {
            metrics.mark_fallback();
        }

        tracing::info!(
            embedding = embedder.model_name(),
            llm = %generator.model_label(),
            store = %selection.backend,
            collection = index.collection(),
            "rag engine ready"
        );

        Ok(Self {
            embedder,
            index,
            retriever: Retriever::new(MmrConfig::from(&config.retrieval))
                .with_excluded_title(config.data.agent_guide_file.clone()),
            generator,
            system_prompt: system_prompt(agent_guide),
            chunking: ChunkerConfig {
                chunk_size: config.chunking.size,
                overlap: config.chunking.overlap,
            },
            agent_guide_file: config.data.agent_guide_file.clone(),
            default_k: config.retrieval.default_k,
            max_k: config.retrieval.max_k,
            metrics,
            ledger: Mutex::new(IngestLedger::default()),
        })
    }

    #[must_use]
    pub fn default_k(&self) -> usize {
        self.default_k
    }

    #[must_use]
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    #[must_use]
    pub fn metrics_tracker(&self) -> &MetricsTracker {
        &self.metrics
    }

    #[must_use]
    pub fn health(&self) -> Health {
        Health { status: "ok" }
    }

    /// Chunk, embed and upsert every document in `dir` not already indexed.
    ///
    /// Re-ingesting unchanged documents reports zero new docs and chunks.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::DataDirectoryNotFound`] if `dir` does not exist, an embedding
    /// error if a vector cannot be computed, or a store error if the fallback store fails.
    pub async fn ingest(&self, dir: &Path) -> Result<IngestReport, CoreError> {
        let loaded = DocumentLoader::new()
            .exclude(self.agent_guide_file.clone())
            .load_dir(dir)
            .await?;

        let candidates: Vec<Chunk> = {
            let mut ledger = self.ledger.lock().await;
            if self.index.is_degraded() && !ledger.on_fallback {
                // Points written before the switch live only in the old primary.
                ledger.hashes.clear();
                ledger.titles.clear();
                ledger.on_fallback = true;
            }
            let mut batch = HashSet::new();
            loaded
                .documents
                .iter()
                .flat_map(|doc| chunk_document(doc, &self.chunking))
                .filter(|c| {
                    !ledger.hashes.contains(&c.content_hash) && batch.insert(c.content_hash.clone())
                })
                .collect()
        };

        if !candidates.is_empty() {
            let texts: Vec<String> = candidates.iter().map(|c| c.text.clone()).collect();
            let vectors = self.embedder.embed_batch(&texts).await?;
            let indexed: Vec<IndexedChunk> = candidates
                .iter()
                .cloned()
                .zip(vectors)
                .map(|(chunk, vector)| IndexedChunk { chunk, vector })
                .collect();
            self.index.upsert(&indexed).await?;
        }

        let report = {
            let mut ledger = self.ledger.lock().await;
            let mut report = IngestReport {
                indexed_docs: 0,
                indexed_chunks: 0,
            };
            for chunk in &candidates {
                if ledger.hashes.insert(chunk.content_hash.clone()) {
                    report.indexed_chunks += 1;
                    if ledger.titles.insert(chunk.title.clone()) {
                        report.indexed_docs += 1;
                    }
                }
            }
            report
        };

        self.metrics.record_ingest(
            report.indexed_docs,
            report.indexed_chunks,
            self.index.is_degraded(),
        );
        tracing::info!(
            dir = %dir.display(),
            loaded = loaded.documents.len(),
            skipped = loaded.skipped.len(),
            new_docs = report.indexed_docs,
            new_chunks = report.indexed_chunks,
            "ingest complete"
        );
        Ok(report)
    }

    /// Answer `query` from the `k` best chunks; `k` is capped at the configured maximum.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidRequest`] for an empty query or `k == 0`, an embedding
    /// error if the query cannot be embedded, or a store error if the fallback store fails.
    /// Generation failures never surface.
    pub async fn ask(&self, query: &str, k: usize) -> Result<AskResult, CoreError> {
        if query.trim().is_empty() {
            return Err(CoreError::InvalidRequest("query must not be empty".into()));
        }
        if k == 0 {
            return Err(CoreError::InvalidRequest("k must be at least 1".into()));
        }
        let k = k.min(self.max_k);

        let started = Instant::now();
        let query_vector = self.embedder.embed(query).await?;
        let ranked = self
            .retriever
            .retrieve(&self.index, &query_vector, k)
            .await?;
        let retrieval = started.elapsed();

        let chunks: Vec<Chunk> = ranked.into_iter().map(|c| c.chunk).collect();
        let user = user_prompt(query, &chunks);
        let started = Instant::now();
        let generation = self
            .generator
            .generate(&GenerationRequest {
                system_prompt: &self.system_prompt,
                user_prompt: &user,
                chunks: &chunks,
            })
            .await;
        let generation_time = started.elapsed();

        tracing::debug!(
            retrieval_ms = retrieval.as_millis(),
            generation_ms = generation_time.as_millis(),
            chunks = chunks.len(),
            degraded = generation.degraded,
            "ask complete"
        );

        self.metrics.record_ask(AskSample {
            retrieval,
            generation: generation_time,
            generation_degraded: generation.degraded,
            store_degraded: self.index.is_degraded(),
        });

        Ok(AskResult {
            query: query.to_owned(),
            answer: generation.text,
            citations: chunks
                .iter()
                .map(|c| Citation {
                    title: c.title.clone(),
                    section: c.section.clone(),
                })
                .collect(),
            chunks: chunks
                .into_iter()
                .map(|c| AnswerChunk {
                    title: c.title,
                    section: c.section,
                    text: c.text,
                })
                .collect(),
            metrics: self.metrics.snapshot(),
        })
    }

    /// Drop every indexed chunk so the next ingest starts from scratch.
    ///
    /// Metric totals are kept.
    ///
    /// # Errors
    ///
    /// Returns a store error if the collection cannot be recreated.
    pub async fn clear(&self) -> Result<(), CoreError> {
        let mut ledger = self.ledger.lock().await;
        self.index.clear().await?;
        ledger.hashes.clear();
        ledger.titles.clear();
        tracing::info!(collection = self.index.collection(), "collection cleared");
        Ok(())
    }

    /// Number of points in the collection.
    ///
    /// # Errors
    ///
    /// Returns a store error if the count fails.
    pub async fn indexed_count(&self) -> Result<u64, CoreError> {
        Ok(self.index.count().await?)
    }
}
