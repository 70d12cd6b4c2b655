use std::path::PathBuf;

use tenet_ingest::IngestError;
use tenet_llm::LlmError;
use tenet_store::VectorStoreError;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("data directory not found: {}", .0.display())]
    DataDirectoryNotFound(PathBuf),

    #[error("vector store unavailable: {0}")]
    VectorStoreUnavailable(#[from] VectorStoreError),

    #[error("embedding failed: {0}")]
    Embedding(#[from] LlmError),

    #[error("generation failed: {0}")]
    Generation(String),

    #[error("ingest failed: {0}")]
    Ingest(IngestError),

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl From<IngestError> for CoreError {
    fn from(e: IngestError) -> Self {
        match e {
            IngestError::DataDirectoryNotFound(path) => Self::DataDirectoryNotFound(path),
            other => Self::Ingest(other),
        }
    }
}
