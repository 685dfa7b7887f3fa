//! Template engines and their registry.
//!
//! This module provides:
//! - A polymorphic [`TemplateEngine`] capability with two backends:
//!   Liquid (helpers and custom tags) and Handlebars (helpers only)
//! - [`EngineRegistry`], routing a [`TemplateType`] to its engine instance
//! - [`build_key`], producing deterministic lookup keys
//! - The [`TemplateError`] taxonomy shared by every layer above
//!
//! # Example
//!
//! ```ignore
//! let registry = EngineRegistry::new()
//!     .with_engine(Arc::new(HandlebarsTemplateEngine::default()));
//!
//! let engine = registry.engine(TemplateType::Handlebars)?;
//! engine.register_template("greeting", "Hello {{name}}", None)?;
//!
//! let rendered = engine.apply_template("greeting", &json!({"name": "Ada"}))?;
//! assert_eq!(rendered, "Hello Ada");
//! ```

mod engine;
mod error;
mod handlebars_engine;
mod helpers;
mod key;
mod liquid_engine;
mod registry;
mod types;

pub use engine::{RegisterOptions, TemplateEngine, TemplateHelper, TemplateTag};
pub use error::{TemplateError, TemplateErrorKind, TemplateResult};
pub use handlebars_engine::HandlebarsTemplateEngine;
pub use helpers::{builtin_helpers, register_builtin_helpers};
pub use key::build_key;
pub use liquid_engine::LiquidTemplateEngine;
pub use registry::EngineRegistry;
pub use types::{Capability, ClientType, SourceType, TemplateType, UnknownVariant};
