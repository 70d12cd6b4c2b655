mod env;
mod types;

#[cfg(test)]
mod tests;

pub use types::*;

use std::path::Path;

use crate::error::CoreError;

impl Config {
    /// Load configuration from a TOML file with env var overrides, then validate it.
    ///
    /// Falls back to defaults when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Configuration`] if the file exists but cannot be read or
    /// parsed, or if the resulting configuration is invalid.
    pub fn load(path: &Path) -> Result<Self, CoreError> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path).map_err(|e| {
                CoreError::Configuration(format!("failed to read {}: {e}", path.display()))
            })?;
            toml::from_str::<Self>(&content).map_err(|e| {
                CoreError::Configuration(format!("failed to parse {}: {e}", path.display()))
            })?
        } else {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
            Self::default()
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    ///
    /// Returns [`CoreError::Configuration`] describing the first invalid setting.
    pub fn validate(&self) -> Result<(), CoreError> {
        let fail = |msg: &str| Err(CoreError::Configuration(msg.to_owned()));

        if self.chunking.size == 0 {
            return fail("chunking.size must be greater than 0");
        }
        if self.chunking.overlap >= self.chunking.size {
            return fail("chunking.overlap must be smaller than chunking.size");
        }
        if self.embedding.dimension == 0 {
            return fail("embedding.dimension must be greater than 0");
        }
        if self.store.collection.trim().is_empty() {
            return fail("store.collection must not be empty");
        }

        let r = &self.retrieval;
        if !(0.0..=1.0).contains(&r.lambda) {
            return fail("retrieval.lambda must be within [0, 1]");
        }
        if r.heading_boosts
            .iter()
            .chain([&r.priority_high, &r.priority_medium])
            .any(|b| *b <= 0.0)
        {
            return fail("retrieval boosts must be positive");
        }
        if r.fetch_multiplier == 0 {
            return fail("retrieval.fetch_multiplier must be greater than 0");
        }
        if r.default_k == 0 || r.default_k > r.max_k {
            return fail("retrieval.default_k must be within 1..=max_k");
        }

        if self.embedding.provider == EmbeddingProviderKind::OpenAi
            && self.secrets.openai_api_key.is_none()
        {
            return fail("OpenAI embeddings selected but OPENAI_API_KEY is not set");
        }
        Ok(())
    }
}
