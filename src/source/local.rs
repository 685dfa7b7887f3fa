use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::{ContentSource, FetchError};

/// Reads files relative to a local root directory
#[derive(Debug, Clone)]
pub struct LocalContentSource {
    root: PathBuf,
}

impl LocalContentSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path.trim_start_matches('/'))
    }
}

#[async_trait]
impl ContentSource for LocalContentSource {
    async fn fetch_text(&self, path: &str) -> Result<String, FetchError> {
        let full_path = self.resolve(path);
        tracing::debug!(path = %full_path.display(), "Reading local file");

        tokio::fs::read_to_string(&full_path)
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => FetchError::NotFound(full_path.display().to_string()),
                ErrorKind::PermissionDenied => {
                    FetchError::AccessDenied(full_path.display().to_string())
                }
                _ => FetchError::Io(e),
            })
    }

    fn describe(&self) -> String {
        format!("local:{}", self.root.display())
    }
}
