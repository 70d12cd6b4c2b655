use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
pub use tenet_store::{StoreConfig, StoreKind};

use crate::secret::Secret;

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub data: DataConfig,
    pub chunking: ChunkingConfig,
    pub embedding: EmbeddingConfig,
    pub store: StoreConfig,
    pub llm: LlmConfig,
    pub retrieval: RetrievalConfig,
    pub timeouts: TimeoutConfig,
    pub gateway: GatewayConfig,
    pub logging: LoggingConfig,
    #[serde(skip)]
    pub secrets: ResolvedSecrets,
}

#[derive(Debug, Default)]
pub struct ResolvedSecrets {
    pub openai_api_key: Option<Secret>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DataConfig {
    pub dir: PathBuf,
    /// Agent-only guide: fed to the system prompt, never indexed.
    pub agent_guide_file: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("./data"),
            agent_guide_file: "Internal_SOP_Agent_Guide.md".into(),
        }
    }
}

impl DataConfig {
    #[must_use]
    pub fn agent_guide_path(&self) -> PathBuf {
        self.dir.join(&self.agent_guide_file)
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Words per chunk.
    pub size: usize,
    pub overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            size: 700,
            overlap: 80,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProviderKind {
    #[default]
    Hash,
    Ollama,
    OpenAi,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub provider: EmbeddingProviderKind,
    pub model: String,
    pub dimension: usize,
    /// Overrides the provider endpoint; defaults to the matching `[llm]` URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingProviderKind::Hash,
            model: "local-384".into(),
            dimension: 384,
            base_url: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProviderKind {
    #[default]
    Stub,
    OpenAi,
    Ollama,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LlmConfig {
    pub provider: LlmProviderKind,
    pub model: String,
    pub base_url: String,
    pub ollama_url: String,
    pub ollama_model: String,
    pub max_tokens: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProviderKind::Stub,
            model: "gpt-4o-mini".into(),
            base_url: "https://api.openai.com/v1".into(),
            ollama_url: "http://localhost:11434".into(),
            ollama_model: "qwen2.5:0.5b".into(),
            max_tokens: 1024,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetrievalConfig {
    pub default_k: usize,
    pub max_k: usize,
    /// Relevance weight in the MMR objective; `1 - lambda` weighs diversity.
    pub lambda: f32,
    /// Candidates fetched per requested result before reranking.
    pub fetch_multiplier: usize,
    /// Boosts for heading levels 1, 2 and 3.
    pub heading_boosts: [f32; 3],
    pub priority_high: f32,
    pub priority_medium: f32,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            default_k: 4,
            max_k: 20,
            lambda: 0.7,
            fetch_multiplier: 2,
            heading_boosts: [1.20, 1.15, 1.10],
            priority_high: 1.15,
            priority_medium: 1.05,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    pub store_secs: u64,
    pub embed_secs: u64,
    pub llm_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            store_secs: 10,
            embed_secs: 30,
            llm_secs: 60,
        }
    }
}

impl TimeoutConfig {
    #[must_use]
    pub fn store(&self) -> Duration {
        Duration::from_secs(self.store_secs)
    }

    #[must_use]
    pub fn embed(&self) -> Duration {
        Duration::from_secs(self.embed_secs)
    }

    #[must_use]
    pub fn llm(&self) -> Duration {
        Duration::from_secs(self.llm_secs)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub bind: String,
    pub port: u16,
    pub max_body_size: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".into(),
            port: 8000,
            max_body_size: 65536,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            file: None,
        }
    }
}
