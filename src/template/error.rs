use thiserror::Error;

use super::types::{Capability, TemplateType};
use crate::source::FetchError;

/// Errors raised while registering or applying templates.
///
/// Intermediate layers may rewrite the message of a variant to add the
/// (template type, source type, client type) context, but never change the
/// variant itself. Callers branch on [`TemplateError::kind`].
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("{0}")]
    TemplateNotFound(String),

    #[error("No template engine configured for template type: {0}")]
    TemplateEngineNotFound(TemplateType),

    #[error("{0}")]
    TemplateRenderError(String),

    #[error("Failed to compile template '{id}': {message}")]
    Compile { id: String, message: String },

    #[error("Template engine '{engine}' does not support {capability}")]
    Unsupported {
        engine: TemplateType,
        capability: Capability,
    },

    #[error("Failed to fetch template '{path}': {source}")]
    Fetch {
        path: String,
        #[source]
        source: FetchError,
    },

    #[error("Invalid template manifest: {0}")]
    InvalidManifest(String),

    #[error("Duplicate template key in manifest: {0}")]
    DuplicateTemplateKey(String),
}

/// Kind tag of a [`TemplateError`], stable across message rewrites
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateErrorKind {
    TemplateNotFound,
    TemplateEngineNotFound,
    TemplateRenderError,
    Compile,
    Unsupported,
    Fetch,
    InvalidManifest,
    DuplicateTemplateKey,
}

impl TemplateError {
    pub fn kind(&self) -> TemplateErrorKind {
        match self {
            TemplateError::TemplateNotFound(_) => TemplateErrorKind::TemplateNotFound,
            TemplateError::TemplateEngineNotFound(_) => TemplateErrorKind::TemplateEngineNotFound,
            TemplateError::TemplateRenderError(_) => TemplateErrorKind::TemplateRenderError,
            TemplateError::Compile { .. } => TemplateErrorKind::Compile,
            TemplateError::Unsupported { .. } => TemplateErrorKind::Unsupported,
            TemplateError::Fetch { .. } => TemplateErrorKind::Fetch,
            TemplateError::InvalidManifest(_) => TemplateErrorKind::InvalidManifest,
            TemplateError::DuplicateTemplateKey(_) => TemplateErrorKind::DuplicateTemplateKey,
        }
    }

    /// A missing template can be skipped or default-rendered by the caller.
    /// Everything else is a configuration or content defect.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, TemplateError::TemplateNotFound(_))
    }

    pub(crate) fn not_found(id: &str) -> Self {
        TemplateError::TemplateNotFound(format!("Template not found: {}", id))
    }
}

/// Result type for template operations
pub type TemplateResult<T> = Result<T, TemplateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_is_stable_across_message_rewrite() {
        let original = TemplateError::not_found("card:liquid:PR_Opened:slack");
        let rewritten = TemplateError::TemplateNotFound("No template found for ...".to_string());
        assert_eq!(original.kind(), rewritten.kind());
        assert!(rewritten.is_recoverable());
    }

    #[test]
    fn test_engine_not_found_is_not_recoverable() {
        let err = TemplateError::TemplateEngineNotFound(TemplateType::Liquid);
        assert!(!err.is_recoverable());
        assert_eq!(
            err.to_string(),
            "No template engine configured for template type: liquid"
        );
    }

    #[test]
    fn test_unsupported_message() {
        let err = TemplateError::Unsupported {
            engine: TemplateType::Handlebars,
            capability: Capability::Tags,
        };
        assert_eq!(err.kind(), TemplateErrorKind::Unsupported);
        assert_eq!(
            err.to_string(),
            "Template engine 'handlebars' does not support custom tags"
        );
    }
}
