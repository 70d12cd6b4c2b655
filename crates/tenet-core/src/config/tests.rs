use std::io::Write;
use std::path::{Path, PathBuf};

use serial_test::serial;

use super::*;
use crate::error::CoreError;
use crate::secret::Secret;

const ENV_KEYS: [&str; 18] = [
    "TENET_DATA_DIR",
    "TENET_CHUNK_SIZE",
    "TENET_CHUNK_OVERLAP",
    "TENET_EMBEDDING_PROVIDER",
    "TENET_EMBEDDING_MODEL",
    "TENET_VECTOR_STORE",
    "TENET_QDRANT_URL",
    "TENET_COLLECTION",
    "TENET_LLM_PROVIDER",
    "TENET_LLM_MODEL",
    "TENET_LLM_BASE_URL",
    "TENET_OLLAMA_URL",
    "TENET_OLLAMA_MODEL",
    "TENET_LOG_LEVEL",
    "TENET_LOG_FILE",
    "TENET_GATEWAY_PORT",
    "TENET_OPENAI_API_KEY",
    "OPENAI_API_KEY",
];

fn clear_env() {
    for key in ENV_KEYS {
        unsafe { std::env::remove_var(key) };
    }
}

fn set_env(key: &str, value: &str) {
    unsafe { std::env::set_var(key, value) };
}

#[test]
#[serial]
fn defaults_when_file_missing() {
    clear_env();
    let config = Config::load(Path::new("/nonexistent/tenet.toml")).unwrap();
    assert_eq!(config.data.dir, PathBuf::from("./data"));
    assert_eq!(config.data.agent_guide_file, "Internal_SOP_Agent_Guide.md");
    assert_eq!(config.chunking.size, 700);
    assert_eq!(config.chunking.overlap, 80);
    assert_eq!(config.embedding.provider, EmbeddingProviderKind::Hash);
    assert_eq!(config.embedding.dimension, 384);
    assert_eq!(config.store.backend, StoreKind::Qdrant);
    assert_eq!(config.store.collection, "policy_helper");
    assert_eq!(config.llm.provider, LlmProviderKind::Stub);
    assert_eq!(config.retrieval.default_k, 4);
    assert!((config.retrieval.lambda - 0.7).abs() < f32::EPSILON);
    assert_eq!(config.timeouts.store_secs, 10);
    assert_eq!(config.gateway.port, 8000);
    assert_eq!(config.logging.level, "info");
}

#[test]
#[serial]
fn parses_partial_toml() {
    clear_env();
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[chunking]
size = 300
overlap = 30

[store]
backend = "memory"

[retrieval]
lambda = 0.5
heading_boosts = [1.3, 1.2, 1.1]
"#
    )
    .unwrap();

    let config = Config::load(file.path()).unwrap();
    assert_eq!(config.chunking.size, 300);
    assert_eq!(config.store.backend, StoreKind::Memory);
    assert_eq!(config.store.url, "http://localhost:6334");
    assert!((config.retrieval.lambda - 0.5).abs() < f32::EPSILON);
    assert!((config.retrieval.heading_boosts[0] - 1.3).abs() < f32::EPSILON);
    assert_eq!(config.retrieval.max_k, 20);
}

#[test]
#[serial]
fn malformed_toml_is_configuration_error() {
    clear_env();
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "[chunking\nsize = ").unwrap();
    let err = Config::load(file.path()).unwrap_err();
    assert!(matches!(err, CoreError::Configuration(_)));
}

#[test]
#[serial]
fn env_overrides_apply() {
    clear_env();
    set_env("TENET_DATA_DIR", "/srv/policies");
    set_env("TENET_CHUNK_SIZE", "200");
    set_env("TENET_CHUNK_OVERLAP", "20");
    set_env("TENET_VECTOR_STORE", "memory");
    set_env("TENET_COLLECTION", "docs");
    set_env("TENET_LLM_PROVIDER", "ollama");
    set_env("TENET_OLLAMA_MODEL", "llama3.2");
    set_env("TENET_GATEWAY_PORT", "9000");

    let config = Config::load(Path::new("/nonexistent")).unwrap();
    clear_env();

    assert_eq!(config.data.dir, PathBuf::from("/srv/policies"));
    assert_eq!(config.chunking.size, 200);
    assert_eq!(config.chunking.overlap, 20);
    assert_eq!(config.store.backend, StoreKind::Memory);
    assert_eq!(config.store.collection, "docs");
    assert_eq!(config.llm.provider, LlmProviderKind::Ollama);
    assert_eq!(config.llm.ollama_model, "llama3.2");
    assert_eq!(config.gateway.port, 9000);
}

#[test]
#[serial]
fn invalid_enum_override_is_ignored() {
    clear_env();
    set_env("TENET_LLM_PROVIDER", "claude");
    set_env("TENET_VECTOR_STORE", "redis");
    let config = Config::load(Path::new("/nonexistent")).unwrap();
    clear_env();
    assert_eq!(config.llm.provider, LlmProviderKind::Stub);
    assert_eq!(config.store.backend, StoreKind::Qdrant);
}

#[test]
#[serial]
fn openai_llm_without_key_loads() {
    clear_env();
    set_env("TENET_LLM_PROVIDER", "openai");
    let config = Config::load(Path::new("/nonexistent")).unwrap();
    clear_env();
    assert_eq!(config.llm.provider, LlmProviderKind::OpenAi);
    assert!(config.secrets.openai_api_key.is_none());
}

#[test]
#[serial]
fn openai_embeddings_without_key_are_rejected() {
    clear_env();
    set_env("TENET_EMBEDDING_PROVIDER", "openai");
    let err = Config::load(Path::new("/nonexistent")).unwrap_err();
    clear_env();
    assert!(err.to_string().contains("OPENAI_API_KEY"));
}

#[test]
#[serial]
fn openai_key_is_resolved_and_redacted() {
    clear_env();
    set_env("TENET_LLM_PROVIDER", "OpenAI");
    set_env("OPENAI_API_KEY", "sk-from-env");
    let config = Config::load(Path::new("/nonexistent")).unwrap();
    clear_env();

    assert_eq!(config.llm.provider, LlmProviderKind::OpenAi);
    let key = config.secrets.openai_api_key.as_ref().unwrap();
    assert_eq!(key.expose(), "sk-from-env");
    assert!(!format!("{config:?}").contains("sk-from-env"));
}

#[test]
fn overlap_must_be_smaller_than_size() {
    let mut config = Config::default();
    config.chunking.overlap = config.chunking.size;
    assert!(config.validate().is_err());
}

#[test]
fn lambda_out_of_range_is_rejected() {
    let mut config = Config::default();
    config.retrieval.lambda = 1.5;
    assert!(config.validate().is_err());
}

#[test]
fn non_positive_boost_is_rejected() {
    let mut config = Config::default();
    config.retrieval.heading_boosts[2] = 0.0;
    assert!(config.validate().is_err());
}

#[test]
fn default_k_must_not_exceed_max_k() {
    let mut config = Config::default();
    config.retrieval.default_k = 25;
    assert!(config.validate().is_err());
    config.retrieval.default_k = 0;
    assert!(config.validate().is_err());
}

#[test]
fn zero_dimension_is_rejected() {
    let mut config = Config::default();
    config.embedding.dimension = 0;
    assert!(config.validate().is_err());
}

#[test]
fn openai_embedding_with_key_is_valid() {
    let mut config = Config::default();
    config.embedding.provider = EmbeddingProviderKind::OpenAi;
    config.secrets.openai_api_key = Some(Secret::new("k"));
    assert!(config.validate().is_ok());
}

#[test]
fn serialized_config_omits_secrets() {
    let mut config = Config::default();
    config.secrets.openai_api_key = Some(Secret::new("sk-hidden"));
    let toml = toml::to_string(&config).unwrap();
    assert!(!toml.contains("sk-hidden"));
    assert!(toml.contains("[retrieval]"));
}
