use std::path::{Path, PathBuf};

use crate::error::IngestError;

/// Default maximum file size: 10 MiB.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

const SUPPORTED_EXTENSIONS: &[&str] = &["md", "txt"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// File name, e.g. `Warranty_Policy.md`.
    pub title: String,
    pub path: PathBuf,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedDocument {
    pub path: PathBuf,
    pub reason: String,
}

#[derive(Debug, Default)]
pub struct LoadReport {
    pub documents: Vec<Document>,
    pub skipped: Vec<SkippedDocument>,
}

/// Loads `.md` and `.txt` files from a flat data directory in file name order.
#[derive(Debug, Clone)]
pub struct DocumentLoader {
    excluded: Vec<String>,
    max_file_size: u64,
}

impl Default for DocumentLoader {
    fn default() -> Self {
        Self {
            excluded: Vec::new(),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }
}

impl DocumentLoader {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Never load the file with this name.
    #[must_use]
    pub fn exclude(mut self, file_name: impl Into<String>) -> Self {
        self.excluded.push(file_name.into());
        self
    }

    #[must_use]
    pub fn with_max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size = bytes;
        self
    }

    fn is_excluded(&self, name: &str) -> bool {
        self.excluded.iter().any(|e| e.eq_ignore_ascii_case(name))
    }

    /// Load every supported document in `dir`.
    ///
    /// Unreadable files are skipped with a warning and listed in the report.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::DataDirectoryNotFound`] if `dir` is not a directory, or an
    /// IO error if it cannot be listed.
    pub async fn load_dir(&self, dir: &Path) -> Result<LoadReport, IngestError> {
        match tokio::fs::metadata(dir).await {
            Ok(meta) if meta.is_dir() => {}
            _ => return Err(IngestError::DataDirectoryNotFound(dir.to_path_buf())),
        }

        let mut entries = Vec::new();
        let mut read_dir = tokio::fs::read_dir(dir).await?;
        while let Some(entry) = read_dir.next_entry().await? {
            entries.push(entry.path());
        }
        entries.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

        let mut report = LoadReport::default();
        for path in entries {
            let Some(name) = path.file_name().and_then(|n| n.to_str()).map(str::to_owned)
            else {
                continue;
            };
            if !has_supported_extension(&path) {
                tracing::debug!(file = %name, "skipping unsupported file");
                continue;
            }
            if self.is_excluded(&name) {
                tracing::debug!(file = %name, "skipping excluded document");
                continue;
            }

            match self.read(&path).await {
                Ok(text) => report.documents.push(Document {
                    title: name,
                    path,
                    text,
                }),
                Err(reason) => {
                    tracing::warn!(file = %name, %reason, "skipping unreadable document");
                    report.skipped.push(SkippedDocument { path, reason });
                }
            }
        }

        tracing::debug!(
            loaded = report.documents.len(),
            skipped = report.skipped.len(),
            dir = %dir.display(),
            "documents loaded"
        );
        Ok(report)
    }

    async fn read(&self, path: &Path) -> Result<String, String> {
        let meta = tokio::fs::metadata(path).await.map_err(|e| e.to_string())?;
        if !meta.is_file() {
            return Err("not a regular file".into());
        }
        if meta.len() > self.max_file_size {
            return Err(format!("file too large: {} bytes", meta.len()));
        }
        let bytes = tokio::fs::read(path).await.map_err(|e| e.to_string())?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

fn has_supported_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| SUPPORTED_EXTENSIONS.iter().any(|s| s.eq_ignore_ascii_case(e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn loads_supported_files_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.md"), "# B").unwrap();
        std::fs::write(dir.path().join("a.TXT"), "plain").unwrap();
        std::fs::write(dir.path().join("c.pdf"), "binary").unwrap();

        let report = DocumentLoader::new().load_dir(dir.path()).await.unwrap();
        let titles: Vec<_> = report.documents.iter().map(|d| d.title.as_str()).collect();
        assert_eq!(titles, vec!["a.TXT", "b.md"]);
        assert!(report.skipped.is_empty());
    }

    #[tokio::test]
    async fn excluded_file_is_not_loaded() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Internal_SOP_Agent_Guide.md"), "secret").unwrap();
        std::fs::write(dir.path().join("Policy.md"), "public").unwrap();

        let report = DocumentLoader::new()
            .exclude("Internal_SOP_Agent_Guide.md")
            .load_dir(dir.path())
            .await
            .unwrap();
        assert_eq!(report.documents.len(), 1);
        assert_eq!(report.documents[0].title, "Policy.md");
    }

    #[tokio::test]
    async fn invalid_utf8_is_read_lossily() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bad.txt"), [b'o', b'k', 0xff, b'!']).unwrap();

        let report = DocumentLoader::new().load_dir(dir.path()).await.unwrap();
        assert_eq!(report.documents[0].text, "ok\u{fffd}!");
    }

    #[tokio::test]
    async fn oversized_file_is_skipped_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("big.md"), "x".repeat(64)).unwrap();
        std::fs::write(dir.path().join("small.md"), "ok").unwrap();

        let report = DocumentLoader::new()
            .with_max_file_size(16)
            .load_dir(dir.path())
            .await
            .unwrap();
        assert_eq!(report.documents.len(), 1);
        assert_eq!(report.skipped.len(), 1);
        assert!(report.skipped[0].reason.contains("too large"));
    }

    #[tokio::test]
    async fn directory_named_like_document_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("nested.md")).unwrap();

        let report = DocumentLoader::new().load_dir(dir.path()).await.unwrap();
        assert!(report.documents.is_empty());
        assert_eq!(report.skipped.len(), 1);
    }

    #[tokio::test]
    async fn missing_directory_is_typed_error() {
        let err = DocumentLoader::new()
            .load_dir(Path::new("/nonexistent/tenet-data"))
            .await
            .unwrap_err();
        assert!(matches!(err, IngestError::DataDirectoryNotFound(_)));
    }
}
