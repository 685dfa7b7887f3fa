use thiserror::Error;

use crate::source::FetchError;
use crate::template::{TemplateError, TemplateErrorKind};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid event data: {0}")]
    InvalidData(#[from] serde_json::Error),

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error("Content source error: {0}")]
    Source(#[from] FetchError),
}

impl AppError {
    /// Process exit code for the action, distinguishing configuration
    /// defects from a missing template
    pub fn exit_code(&self) -> i32 {
        match self {
            AppError::Config(_) | AppError::Validation(_) => 2,
            AppError::InvalidData(_) => 3,
            AppError::Template(e) => match e.kind() {
                TemplateErrorKind::TemplateNotFound => 4,
                TemplateErrorKind::TemplateEngineNotFound => 2,
                _ => 1,
            },
            AppError::Source(_) => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::TemplateType;

    #[test]
    fn test_exit_codes_by_kind() {
        let not_found: AppError = TemplateError::TemplateNotFound("x".to_string()).into();
        assert_eq!(not_found.exit_code(), 4);

        let engine: AppError = TemplateError::TemplateEngineNotFound(TemplateType::Liquid).into();
        assert_eq!(engine.exit_code(), 2);

        let render: AppError = TemplateError::TemplateRenderError("boom".to_string()).into();
        assert_eq!(render.exit_code(), 1);
    }

    #[test]
    fn test_template_error_is_transparent() {
        let err: AppError = TemplateError::TemplateNotFound("No template found".to_string()).into();
        assert_eq!(err.to_string(), "No template found");
    }
}
