//! Engine capability abstraction.
//!
//! Every backend implements [`TemplateEngine`]. Helpers and tags are passed in
//! an engine-neutral form ([`TemplateHelper`], [`TemplateTag`]) and adapted by
//! each backend to its own extension mechanism.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};

use super::error::TemplateResult;
use super::types::{Capability, TemplateType};

type HelperFn = dyn Fn(&Value, &HashMap<String, Value>) -> Result<Value, String> + Send + Sync;
type TagFn = dyn Fn(&HashMap<String, Value>) -> Result<Map<String, Value>, String> + Send + Sync;

/// Custom helper callable from template bodies.
///
/// Receives the first positional argument (or `null`) and the named
/// arguments. In Handlebars this is `{{name value key=arg}}`, in Liquid
/// `{{ value | name: key: arg }}`.
#[derive(Clone)]
pub struct TemplateHelper(Arc<HelperFn>);

impl TemplateHelper {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Value, &HashMap<String, Value>) -> Result<Value, String> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn call(&self, value: &Value, args: &HashMap<String, Value>) -> Result<Value, String> {
        (self.0)(value, args)
    }
}

impl fmt::Debug for TemplateHelper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TemplateHelper(..)")
    }
}

/// Custom tag: receives its named arguments and returns variables to merge
/// into the render context for the rest of the template. In Liquid this is
/// `{% name key = arg %}`.
#[derive(Clone)]
pub struct TemplateTag(Arc<TagFn>);

impl TemplateTag {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&HashMap<String, Value>) -> Result<Map<String, Value>, String>
            + Send
            + Sync
            + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn call(&self, args: &HashMap<String, Value>) -> Result<Map<String, Value>, String> {
        (self.0)(args)
    }
}

impl fmt::Debug for TemplateTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TemplateTag(..)")
    }
}

/// Per-registration options
#[derive(Debug, Clone, Default)]
pub struct RegisterOptions {
    /// Trim a single trailing newline left by editors at end of file
    pub trim_trailing_newline: bool,
}

impl RegisterOptions {
    pub(crate) fn prepare<'a>(options: Option<&RegisterOptions>, text: &'a str) -> &'a str {
        match options {
            Some(opts) if opts.trim_trailing_newline => text
                .strip_suffix("\r\n")
                .or_else(|| text.strip_suffix('\n'))
                .unwrap_or(text),
            _ => text,
        }
    }
}

/// A template backend owning its own table of compiled templates.
///
/// Registration replaces whole entries; applying a template never mutates
/// the table, so renders may run concurrently once setup has finished.
pub trait TemplateEngine: Send + Sync {
    /// Backend this engine implements
    fn template_type(&self) -> TemplateType;

    /// Whether the optional capability is available on this engine
    fn supports(&self, capability: Capability) -> bool;

    /// Compile `text` and store it under `id`, replacing any previous entry.
    /// On a compile error the table is left unchanged.
    fn register_template(
        &self,
        id: &str,
        text: &str,
        options: Option<&RegisterOptions>,
    ) -> TemplateResult<()>;

    /// Render the template stored under `id` with `data`
    fn apply_template(&self, id: &str, data: &Value) -> TemplateResult<String>;

    /// Register a custom helper function
    fn register_helper(&self, name: &str, helper: TemplateHelper) -> TemplateResult<()>;

    /// Register a custom tag. Fails with `Unsupported` when the backend has
    /// no tag mechanism.
    fn register_tag(&self, name: &str, tag: TemplateTag) -> TemplateResult<()>;

    /// Whether a template is registered under `id`
    fn has_template(&self, id: &str) -> bool;

    /// Ids of all registered templates, sorted
    fn template_ids(&self) -> Vec<String>;
}
