//! Template content sources.
//!
//! Manifests and template bodies are read through a [`ContentSource`], either
//! from the local filesystem or from a branch of a remote repository.

mod factory;
mod local;
mod remote;

pub use factory::create_content_source;
pub use local::LocalContentSource;
pub use remote::RemoteContentSource;

use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur while fetching content
#[derive(Debug, Error)]
pub enum FetchError {
    /// Nothing exists at the requested path
    #[error("Not found: {0}")]
    NotFound(String),

    /// Credentials missing or rejected
    #[error("Access denied: {0}")]
    AccessDenied(String),

    /// Remote answered with an unexpected status
    #[error("Unexpected status {status} fetching {path}")]
    Status { status: u16, path: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Capability to read a text file by path
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Fetch the text stored at `path`
    async fn fetch_text(&self, path: &str) -> Result<String, FetchError>;

    /// Human-readable description for logs
    fn describe(&self) -> String;
}

/// Where the manifest and templates are read from
#[derive(Debug, Clone)]
pub enum SourceLocation {
    /// Local filesystem, paths relative to `root`
    Local { root: PathBuf },
    /// Branch of a remote repository
    Remote {
        repository: String,
        branch: String,
        access_token: Option<String>,
        api_base: String,
        /// Templates live next to the manifest rather than at the
        /// repository root
        same_repository: bool,
    },
}

impl SourceLocation {
    pub fn is_remote(&self) -> bool {
        matches!(self, SourceLocation::Remote { .. })
    }

    /// Root under which template folders are resolved.
    ///
    /// Local paths are relative to the local root, remote paths are
    /// repository-absolute, and co-located templates are resolved from the
    /// manifest's directory.
    pub fn template_root(&self, folder: &str, manifest_path: &str) -> String {
        match self {
            SourceLocation::Local { .. } => folder.to_string(),
            SourceLocation::Remote {
                same_repository: false,
                ..
            } => format!("/{}", folder),
            SourceLocation::Remote {
                same_repository: true,
                ..
            } => match manifest_path.trim_start_matches('/').rsplit_once('/') {
                Some((dir, _)) => format!("{}/{}", dir, folder),
                None => folder.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn remote(same_repository: bool) -> SourceLocation {
        SourceLocation::Remote {
            repository: "octo/templates".to_string(),
            branch: "main".to_string(),
            access_token: None,
            api_base: "https://api.github.com".to_string(),
            same_repository,
        }
    }

    #[test]
    fn test_template_root_local() {
        let location = SourceLocation::Local {
            root: PathBuf::from("."),
        };
        assert!(!location.is_remote());
        assert_eq!(location.template_root("CardTemplate", "TransformerConfig.json"), "CardTemplate");
    }

    #[test]
    fn test_template_root_remote() {
        assert_eq!(
            remote(false).template_root("CardTemplate", "TransformerConfig.json"),
            "/CardTemplate"
        );
    }

    #[test]
    fn test_template_root_same_repository() {
        let location = remote(true);
        assert_eq!(
            location.template_root("EventTemplate", ".github/transformer/TransformerConfig.json"),
            ".github/transformer/EventTemplate"
        );
        assert_eq!(
            location.template_root("EventTemplate", "TransformerConfig.json"),
            "EventTemplate"
        );
    }
}
