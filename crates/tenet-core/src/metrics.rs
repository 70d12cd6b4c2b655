//! Process-wide counters for ingest and ask requests.
//!
//! State lives in a `watch` channel; every request commits its changes in one
//! `send_modify` call at the very end, so a request dropped half-way leaves no trace.

use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricsState {
    pub total_docs: u64,
    pub total_chunks: u64,
    pub ask_count: u64,
    /// Sticky once the in-memory store replaced Qdrant.
    pub fallback_used: bool,
    pub generation_fallbacks: u64,
    pub retrieval_ms_total: f64,
    pub generation_ms_total: f64,
    pub embedding_model: String,
    pub llm_model: String,
    pub vector_store: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub total_docs: u64,
    pub total_chunks: u64,
    pub ask_count: u64,
    pub avg_retrieval_latency_ms: f64,
    pub avg_generation_latency_ms: f64,
    pub fallback_used: bool,
    pub generation_fallbacks: u64,
    pub embedding_model: String,
    pub llm_model: String,
    pub vector_store: String,
}

/// Measurements of one completed ask.
#[derive(Debug, Clone, Copy)]
pub struct AskSample {
    pub retrieval: Duration,
    pub generation: Duration,
    pub generation_degraded: bool,
    pub store_degraded: bool,
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

#[allow(clippy::cast_precision_loss)]
fn average_ms(total: f64, count: u64) -> f64 {
    if count == 0 {
        return 0.0;
    }
    round2(total / count as f64)
}

impl MetricsState {
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            total_docs: self.total_docs,
            total_chunks: self.total_chunks,
            ask_count: self.ask_count,
            avg_retrieval_latency_ms: average_ms(self.retrieval_ms_total, self.ask_count),
            avg_generation_latency_ms: average_ms(self.generation_ms_total, self.ask_count),
            fallback_used: self.fallback_used,
            generation_fallbacks: self.generation_fallbacks,
            embedding_model: self.embedding_model.clone(),
            llm_model: self.llm_model.clone(),
            vector_store: self.vector_store.clone(),
        }
    }
}

#[derive(Debug)]
pub struct MetricsTracker {
    tx: watch::Sender<MetricsState>,
}

impl MetricsTracker {
    #[must_use]
    pub fn new(embedding_model: &str, llm_model: &str, vector_store: &str) -> Self {
        let state = MetricsState {
            embedding_model: embedding_model.to_owned(),
            llm_model: llm_model.to_owned(),
            vector_store: vector_store.to_owned(),
            ..MetricsState::default()
        };
        let (tx, _rx) = watch::channel(state);
        Self { tx }
    }

    pub fn update(&self, f: impl FnOnce(&mut MetricsState)) {
        self.tx.send_modify(f);
    }

    pub fn record_ingest(&self, new_docs: u64, new_chunks: u64, store_degraded: bool) {
        self.update(|m| {
            m.total_docs += new_docs;
            m.total_chunks += new_chunks;
            if store_degraded {
                mark_fallback(m);
            }
        });
    }

    pub fn record_ask(&self, sample: AskSample) {
        self.update(|m| {
            m.ask_count += 1;
            m.retrieval_ms_total += sample.retrieval.as_secs_f64() * 1000.0;
            m.generation_ms_total += sample.generation.as_secs_f64() * 1000.0;
            if sample.generation_degraded {
                m.generation_fallbacks += 1;
            }
            if sample.store_degraded {
                mark_fallback(m);
            }
        });
    }

    pub fn mark_fallback(&self) {
        self.update(mark_fallback);
    }

    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        self.tx.borrow().snapshot()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<MetricsState> {
        self.tx.subscribe()
    }
}

fn mark_fallback(m: &mut MetricsState) {
    m.fallback_used = true;
    m.vector_store = "memory".into();
}
