use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("data directory not found: {}", .0.display())]
    DataDirectoryNotFound(PathBuf),
}
