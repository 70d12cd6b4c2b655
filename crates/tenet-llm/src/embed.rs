//! Text embedders with a fixed output dimension.
//!
//! [`HashEmbedder`] is the offline default: a signed feature-hashing projection of the
//! token bag, keyed by BLAKE3. Identical text always yields bit-identical vectors and
//! texts sharing vocabulary land close together under cosine similarity, which is all
//! the retriever needs from it. Networked embedders go through [`AnyProvider`] and are
//! checked against the configured dimension on every call.

use std::future::Future;
use std::time::Duration;

use crate::any::AnyProvider;
use crate::error::LlmError;
use crate::provider::LlmProvider;

/// Words too common in questions and policy prose to carry signal.
const STOP_WORDS: &[&str] = &[
    "a", "about", "after", "all", "an", "and", "any", "are", "as", "at", "be", "by", "can", "do",
    "does", "for", "from", "has", "have", "how", "i", "if", "in", "into", "is", "it", "its", "may",
    "me", "my", "no", "not", "of", "on", "or", "our", "s", "should", "so", "than", "that", "the",
    "their", "them", "then", "there", "these", "they", "this", "to", "us", "was", "we", "were",
    "what", "when", "where", "which", "who", "will", "with", "would", "you", "your",
];

pub trait Embedder: Send + Sync {
    /// Length of every vector this embedder returns.
    fn dimension(&self) -> usize;

    /// Name reported in metrics.
    fn model_name(&self) -> &str;

    /// Embed a single text.
    ///
    /// # Errors
    ///
    /// Returns an error if a networked backend fails or returns a vector of the wrong size.
    fn embed(&self, text: &str) -> impl Future<Output = Result<Vec<f32>, LlmError>> + Send;

    /// Embed several texts; identical to calling [`Embedder::embed`] on each in order.
    ///
    /// # Errors
    ///
    /// Returns the first error encountered.
    fn embed_batch(
        &self,
        texts: &[String],
    ) -> impl Future<Output = Result<Vec<Vec<f32>>, LlmError>> + Send {
        async move {
            let mut out = Vec::with_capacity(texts.len());
            for text in texts {
                out.push(self.embed(text).await?);
            }
            Ok(out)
        }
    }
}

#[derive(Debug, Clone)]
pub struct HashEmbedder {
    dimension: usize,
    model_name: String,
}

impl HashEmbedder {
    #[must_use]
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            model_name: format!("local-{dimension}"),
        }
    }

    #[must_use]
    pub fn with_model_name(mut self, name: impl Into<String>) -> Self {
        self.model_name = name.into();
        self
    }

    /// Synchronous embedding; never fails.
    #[must_use]
    pub fn vectorize(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0.0_f32; self.dimension];
        if self.dimension == 0 {
            return v;
        }
        let dim = self.dimension as u64;

        for token in tokenize(text) {
            let digest = blake3::hash(token.as_bytes());
            let bytes = digest.as_bytes();
            let mut head = [0_u8; 8];
            head.copy_from_slice(&bytes[..8]);
            #[expect(clippy::cast_possible_truncation)]
            let bucket = (u64::from_le_bytes(head) % dim) as usize;
            let sign = if bytes[8] & 1 == 0 { 1.0 } else { -1.0 };
            v[bucket] += sign;
        }

        for w in &mut v {
            *w = w.signum() * w.abs().ln_1p();
        }
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for w in &mut v {
                *w /= norm;
            }
        }
        v
    }
}

impl Embedder for HashEmbedder {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, LlmError> {
        Ok(self.vectorize(text))
    }
}

fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .filter(|t| !STOP_WORDS.contains(&t.as_str()))
}

/// Embedding backend selected from configuration.
#[derive(Debug, Clone)]
pub enum AnyEmbedder {
    Hash(HashEmbedder),
    Remote {
        provider: AnyProvider,
        model: String,
        dimension: usize,
        timeout: Duration,
    },
}

impl Embedder for AnyEmbedder {
    fn dimension(&self) -> usize {
        match self {
            Self::Hash(h) => h.dimension(),
            Self::Remote { dimension, .. } => *dimension,
        }
    }

    fn model_name(&self) -> &str {
        match self {
            Self::Hash(h) => h.model_name(),
            Self::Remote { model, .. } => model,
        }
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, LlmError> {
        match self {
            Self::Hash(h) => Ok(h.vectorize(text)),
            Self::Remote {
                provider,
                dimension,
                timeout,
                ..
            } => {
                let vector = tokio::time::timeout(*timeout, provider.embed(text))
                    .await
                    .map_err(|_| LlmError::Timeout)??;
                if vector.len() != *dimension {
                    return Err(LlmError::DimensionMismatch {
                        expected: *dimension,
                        actual: vector.len(),
                    });
                }
                Ok(vector)
            }
        }
    }
}
