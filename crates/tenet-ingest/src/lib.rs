//! Turns a directory of policy documents into identified, heading-aware chunks.

pub mod chunker;
pub mod document;
pub mod error;
pub mod identity;

pub use chunker::{Chunk, ChunkerConfig, Section, SectionPriority, chunk_document, split_sections};
pub use document::{Document, DocumentLoader, LoadReport, SkippedDocument};
pub use error::IngestError;
pub use identity::{chunk_id, content_hash, normalize};
