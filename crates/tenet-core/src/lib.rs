//! Retrieval pipeline, answer generation, configuration and metrics.

pub mod bootstrap;
pub mod config;
pub mod engine;
pub mod error;
pub mod format;
pub mod generator;
pub mod metrics;
pub mod prompt;
pub mod retriever;
pub mod secret;

pub use config::Config;
pub use engine::{AnswerChunk, AskResult, Citation, Health, IngestReport, RagEngine};
pub use error::CoreError;
pub use generator::{Generation, GenerationRequest, Generator};
pub use metrics::{MetricsSnapshot, MetricsTracker};
