//! Embedder and generator construction from configuration.

use tenet_llm::ollama::OllamaProvider;
use tenet_llm::openai::OpenAiProvider;
use tenet_llm::{AnyEmbedder, AnyProvider, HashEmbedder};

use crate::config::{Config, EmbeddingProviderKind, LlmProviderKind};
use crate::error::CoreError;
use crate::generator::Generator;

fn openai_key(config: &Config) -> Result<String, CoreError> {
    config
        .secrets
        .openai_api_key
        .as_ref()
        .map(|k| k.expose().to_owned())
        .ok_or_else(|| CoreError::Configuration("OPENAI_API_KEY is not set".into()))
}

/// # Errors
///
/// Returns [`CoreError::Configuration`] if the OpenAI key is missing or the HTTP client
/// cannot be built.
pub fn create_embedder(config: &Config) -> Result<AnyEmbedder, CoreError> {
    let e = &config.embedding;
    let timeout = config.timeouts.embed();
    match e.provider {
        EmbeddingProviderKind::Hash => Ok(AnyEmbedder::Hash(
            HashEmbedder::new(e.dimension).with_model_name(&e.model),
        )),
        EmbeddingProviderKind::Ollama => {
            let url = e.base_url.as_deref().unwrap_or(&config.llm.ollama_url);
            let provider = OllamaProvider::new(url, config.llm.ollama_model.clone(), e.model.clone());
            Ok(AnyEmbedder::Remote {
                provider: AnyProvider::Ollama(provider),
                model: e.model.clone(),
                dimension: e.dimension,
                timeout,
            })
        }
        EmbeddingProviderKind::OpenAi => {
            let base_url = e.base_url.clone().unwrap_or_else(|| config.llm.base_url.clone());
            let provider = OpenAiProvider::new(
                openai_key(config)?,
                base_url,
                config.llm.model.clone(),
                config.llm.max_tokens,
                timeout,
            )
            .map_err(|err| CoreError::Configuration(err.to_string()))?
            .with_embedding_model(e.model.clone(), e.dimension);
            Ok(AnyEmbedder::Remote {
                provider: AnyProvider::OpenAi(provider),
                model: e.model.clone(),
                dimension: e.dimension,
                timeout,
            })
        }
    }
}

/// An OpenAI provider without a key degrades to [`Generator::Stub`].
///
/// # Errors
///
/// Returns [`CoreError::Configuration`] if the HTTP client cannot be built.
pub fn create_generator(config: &Config) -> Result<Generator, CoreError> {
    let llm = &config.llm;
    let timeout = config.timeouts.llm();
    let provider = match llm.provider {
        LlmProviderKind::Stub => return Ok(Generator::Stub),
        LlmProviderKind::OpenAi => {
            let Some(key) = config.secrets.openai_api_key.as_ref() else {
                tracing::warn!("llm.provider is openai but OPENAI_API_KEY is not set, using stub");
                return Ok(Generator::Stub);
            };
            AnyProvider::OpenAi(
                OpenAiProvider::new(
                    key.expose().to_owned(),
                    llm.base_url.clone(),
                    llm.model.clone(),
                    llm.max_tokens,
                    timeout,
                )
                .map_err(|err| CoreError::Configuration(err.to_string()))?,
            )
        }
        LlmProviderKind::Ollama => AnyProvider::Ollama(OllamaProvider::new(
            &llm.ollama_url,
            llm.ollama_model.clone(),
            config.embedding.model.clone(),
        )),
    };
    Ok(Generator::Remote { provider, timeout })
}
