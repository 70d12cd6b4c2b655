use std::path::PathBuf;

use serde::de::DeserializeOwned;

use super::Config;
use crate::secret::Secret;

fn parse_kind<T: DeserializeOwned>(key: &str, value: &str) -> Option<T> {
    let parsed = serde_json::from_value(serde_json::Value::String(value.trim().to_lowercase()));
    if parsed.is_err() {
        tracing::warn!("ignoring invalid {key} value: {value}");
    }
    parsed.ok()
}

impl Config {
    pub(crate) fn apply_env_overrides(&mut self) {
        self.apply_env_overrides_core();
        self.apply_env_overrides_providers();
        self.resolve_secrets();
    }

    fn apply_env_overrides_core(&mut self) {
        if let Ok(v) = std::env::var("TENET_DATA_DIR") {
            self.data.dir = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("TENET_CHUNK_SIZE")
            && let Ok(size) = v.parse::<usize>()
        {
            self.chunking.size = size;
        }
        if let Ok(v) = std::env::var("TENET_CHUNK_OVERLAP")
            && let Ok(overlap) = v.parse::<usize>()
        {
            self.chunking.overlap = overlap;
        }
        if let Ok(v) = std::env::var("TENET_VECTOR_STORE")
            && let Some(kind) = parse_kind("TENET_VECTOR_STORE", &v)
        {
            self.store.backend = kind;
        }
        if let Ok(v) = std::env::var("TENET_QDRANT_URL") {
            self.store.url = v;
        }
        if let Ok(v) = std::env::var("TENET_COLLECTION") {
            self.store.collection = v;
        }
        if let Ok(v) = std::env::var("TENET_LOG_LEVEL") {
            self.logging.level = v;
        }
        if let Ok(v) = std::env::var("TENET_LOG_FILE") {
            self.logging.file = Some(PathBuf::from(v));
        }
        if let Ok(v) = std::env::var("TENET_GATEWAY_PORT")
            && let Ok(port) = v.parse::<u16>()
        {
            self.gateway.port = port;
        }
    }

    fn apply_env_overrides_providers(&mut self) {
        if let Ok(v) = std::env::var("TENET_EMBEDDING_PROVIDER")
            && let Some(kind) = parse_kind("TENET_EMBEDDING_PROVIDER", &v)
        {
            self.embedding.provider = kind;
        }
        if let Ok(v) = std::env::var("TENET_EMBEDDING_MODEL") {
            self.embedding.model = v;
        }
        if let Ok(v) = std::env::var("TENET_LLM_PROVIDER")
            && let Some(kind) = parse_kind("TENET_LLM_PROVIDER", &v)
        {
            self.llm.provider = kind;
        }
        if let Ok(v) = std::env::var("TENET_LLM_MODEL") {
            self.llm.model = v;
        }
        if let Ok(v) = std::env::var("TENET_LLM_BASE_URL") {
            self.llm.base_url = v;
        }
        if let Ok(v) = std::env::var("TENET_OLLAMA_URL") {
            self.llm.ollama_url = v;
        }
        if let Ok(v) = std::env::var("TENET_OLLAMA_MODEL") {
            self.llm.ollama_model = v;
        }
    }

    fn resolve_secrets(&mut self) {
        let key = std::env::var("TENET_OPENAI_API_KEY")
            .or_else(|_| std::env::var("OPENAI_API_KEY"))
            .ok()
            .filter(|k| !k.trim().is_empty());
        if let Some(key) = key {
            self.secrets.openai_api_key = Some(Secret::new(key));
        }
    }
}
