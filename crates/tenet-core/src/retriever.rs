//! Similarity search followed by Maximal Marginal Relevance reranking.
//!
//! Each step picks the candidate maximizing
//! `lambda * boosted(c) - (1 - lambda) * max_sim(c, selected)`, where `boosted` scales the
//! raw cosine score by heading-level and section-priority boosts. A candidate whose
//! `(title, section)` was already selected counts as a full duplicate and only becomes
//! eligible once every unseen pair is used up.

use std::collections::HashSet;

use tenet_ingest::{Chunk, SectionPriority};
use tenet_store::{ChunkIndex, StoredChunk, VectorStoreError, cosine_similarity};

use crate::config::RetrievalConfig;

#[derive(Debug, Clone, Copy)]
pub struct MmrConfig {
    pub lambda: f32,
    pub fetch_multiplier: usize,
    pub heading_boosts: [f32; 3],
    pub priority_high: f32,
    pub priority_medium: f32,
}

impl Default for MmrConfig {
    fn default() -> Self {
        Self::from(&RetrievalConfig::default())
    }
}

impl From<&RetrievalConfig> for MmrConfig {
    fn from(c: &RetrievalConfig) -> Self {
        Self {
            lambda: c.lambda,
            fetch_multiplier: c.fetch_multiplier,
            heading_boosts: c.heading_boosts,
            priority_high: c.priority_high,
            priority_medium: c.priority_medium,
        }
    }
}

impl MmrConfig {
    /// Metadata multiplier for a chunk; 1.0 when it has no heading level or priority.
    #[must_use]
    pub fn boost(&self, chunk: &Chunk) -> f32 {
        let heading = chunk
            .heading_level
            .and_then(|l| self.heading_boosts.get(usize::from(l).checked_sub(1)?))
            .copied()
            .unwrap_or(1.0);
        let priority = match chunk.section_priority {
            Some(SectionPriority::High) => self.priority_high,
            Some(SectionPriority::Medium) => self.priority_medium,
            None => 1.0,
        };
        heading * priority
    }

    #[must_use]
    pub fn boosted_score(&self, candidate: &StoredChunk) -> f32 {
        candidate.score * self.boost(&candidate.chunk)
    }

    #[must_use]
    pub fn candidate_count(&self, k: usize) -> usize {
        k.saturating_mul(self.fetch_multiplier)
    }
}

fn pair(chunk: &Chunk) -> (&str, &str) {
    (chunk.title.as_str(), chunk.section.as_str())
}

/// Greedily select up to `k` candidates. `candidates` must be in fetch-rank order;
/// ties keep the earlier rank.
#[must_use]
pub fn rerank(candidates: Vec<StoredChunk>, k: usize, config: &MmrConfig) -> Vec<StoredChunk> {
    if k == 0 || candidates.is_empty() {
        return Vec::new();
    }

    let relevance: Vec<f32> = candidates.iter().map(|c| config.boosted_score(c)).collect();
    let mut remaining: Vec<usize> = (0..candidates.len()).collect();
    let mut selected: Vec<usize> = Vec::with_capacity(k.min(candidates.len()));

    while selected.len() < k && !remaining.is_empty() {
        let seen: HashSet<(&str, &str)> = selected
            .iter()
            .map(|&i| pair(&candidates[i].chunk))
            .collect();
        let any_unseen = remaining
            .iter()
            .any(|&i| !seen.contains(&pair(&candidates[i].chunk)));

        let mut best: Option<(usize, f32)> = None;
        for (pos, &i) in remaining.iter().enumerate() {
            let duplicate = seen.contains(&pair(&candidates[i].chunk));
            if duplicate && any_unseen {
                continue;
            }
            let max_sim = if duplicate {
                1.0
            } else {
                selected
                    .iter()
                    .map(|&s| cosine_similarity(&candidates[i].vector, &candidates[s].vector))
                    .fold(0.0_f32, f32::max)
            };
            let score = config.lambda * relevance[i] - (1.0 - config.lambda) * max_sim;
            if best.is_none_or(|(_, b)| score > b) {
                best = Some((pos, score));
            }
        }

        let Some((pos, _)) = best else { break };
        selected.push(remaining.remove(pos));
    }

    let mut slots: Vec<Option<StoredChunk>> = candidates.into_iter().map(Some).collect();
    selected
        .into_iter()
        .filter_map(|i| slots[i].take())
        .collect()
}

#[derive(Debug, Clone, Default)]
pub struct Retriever {
    config: MmrConfig,
    excluded_titles: Vec<String>,
}

impl Retriever {
    #[must_use]
    pub fn new(config: MmrConfig) -> Self {
        Self {
            config,
            excluded_titles: Vec::new(),
        }
    }

    /// Drop candidates from the document named `title` (case-insensitive) before reranking.
    #[must_use]
    pub fn with_excluded_title(mut self, title: impl Into<String>) -> Self {
        self.excluded_titles.push(title.into());
        self
    }

    fn is_excluded(&self, chunk: &Chunk) -> bool {
        self.excluded_titles
            .iter()
            .any(|t| t.eq_ignore_ascii_case(&chunk.title))
    }

    #[must_use]
    pub fn config(&self) -> &MmrConfig {
        &self.config
    }

    /// Fetch `fetch_multiplier * k` nearest chunks and rerank them down to `k`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store search fails.
    pub async fn retrieve(
        &self,
        index: &ChunkIndex,
        query: &[f32],
        k: usize,
    ) -> Result<Vec<StoredChunk>, VectorStoreError> {
        if k == 0 {
            return Ok(Vec::new());
        }
        let mut candidates = index.search(query, self.config.candidate_count(k)).await?;
        let fetched = candidates.len();
        candidates.retain(|c| !self.is_excluded(&c.chunk));
        let ranked = rerank(candidates, k, &self.config);
        tracing::debug!(k, fetched, selected = ranked.len(), "mmr rerank complete");
        Ok(ranked)
    }
}
