//! Embedding and chat-completion providers.
//!
//! Providers are closed enums ([`any::AnyProvider`], [`embed::AnyEmbedder`]) chosen once
//! from configuration. The default embedder is [`embed::HashEmbedder`], which needs no
//! network and produces bit-identical vectors for identical text.

pub mod any;
pub mod embed;
pub mod error;
pub(crate) mod http;
#[cfg(feature = "mock")]
pub mod mock;
pub mod ollama;
pub mod openai;
pub mod provider;

pub use any::AnyProvider;
pub use embed::{AnyEmbedder, Embedder, HashEmbedder};
pub use error::LlmError;
pub use provider::{LlmProvider, Message, Role};
