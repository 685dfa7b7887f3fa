//! Handlebars backend: helpers only; custom tags are not supported.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use handlebars::{
    Context, Handlebars, Helper, HelperDef, RenderContext, RenderError, RenderErrorReason,
    ScopedJson,
};
use serde_json::Value;

use super::engine::{RegisterOptions, TemplateEngine, TemplateHelper, TemplateTag};
use super::error::{TemplateError, TemplateResult};
use super::types::{Capability, TemplateType};

/// Handlebars engine with its own template registry.
///
/// Runs in strict mode so a missing field is a render error, and with
/// escaping disabled since the output is JSON, not HTML.
pub struct HandlebarsTemplateEngine {
    registry: RwLock<Handlebars<'static>>,
}

impl Default for HandlebarsTemplateEngine {
    fn default() -> Self {
        Self::new(true)
    }
}

impl HandlebarsTemplateEngine {
    pub fn new(strict_mode: bool) -> Self {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(strict_mode);
        registry.register_escape_fn(handlebars::no_escape);

        Self {
            registry: RwLock::new(registry),
        }
    }
}

impl TemplateEngine for HandlebarsTemplateEngine {
    fn template_type(&self) -> TemplateType {
        TemplateType::Handlebars
    }

    fn supports(&self, capability: Capability) -> bool {
        matches!(capability, Capability::Helpers)
    }

    fn register_template(
        &self,
        id: &str,
        text: &str,
        options: Option<&RegisterOptions>,
    ) -> TemplateResult<()> {
        let text = RegisterOptions::prepare(options, text);
        let mut registry = self.registry.write().unwrap_or_else(PoisonError::into_inner);

        registry
            .register_template_string(id, text)
            .map_err(|e| TemplateError::Compile {
                id: id.to_string(),
                message: e.to_string(),
            })?;

        tracing::debug!(engine = "handlebars", template_id = %id, "Template registered");
        Ok(())
    }

    fn apply_template(&self, id: &str, data: &Value) -> TemplateResult<String> {
        let registry = self.registry.read().unwrap_or_else(PoisonError::into_inner);

        if !registry.has_template(id) {
            return Err(TemplateError::not_found(id));
        }

        registry
            .render(id, data)
            .map_err(|e| TemplateError::TemplateRenderError(e.to_string()))
    }

    fn register_helper(&self, name: &str, helper: TemplateHelper) -> TemplateResult<()> {
        let mut registry = self.registry.write().unwrap_or_else(PoisonError::into_inner);
        registry.register_helper(name, Box::new(HelperAdapter(helper)));
        Ok(())
    }

    fn register_tag(&self, name: &str, _tag: TemplateTag) -> TemplateResult<()> {
        tracing::warn!(engine = "handlebars", tag = %name, "Custom tags are not supported");
        Err(TemplateError::Unsupported {
            engine: TemplateType::Handlebars,
            capability: Capability::Tags,
        })
    }

    fn has_template(&self, id: &str) -> bool {
        self.registry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .has_template(id)
    }

    fn template_ids(&self) -> Vec<String> {
        let registry = self.registry.read().unwrap_or_else(PoisonError::into_inner);
        let mut ids: Vec<String> = registry.get_templates().keys().cloned().collect();
        ids.sort();
        ids
    }
}

/// Exposes a [`TemplateHelper`] as a Handlebars helper. Implementing
/// `call_inner` lets the helper also be used as a subexpression.
struct HelperAdapter(TemplateHelper);

impl HelperDef for HelperAdapter {
    fn call_inner<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        _: &'reg Handlebars<'reg>,
        _: &'rc Context,
        _: &mut RenderContext<'reg, 'rc>,
    ) -> Result<ScopedJson<'rc>, RenderError> {
        let value = h.param(0).map(|p| p.value().clone()).unwrap_or(Value::Null);
        let args: HashMap<String, Value> = h
            .hash()
            .iter()
            .map(|(k, v)| (k.to_string(), v.value().clone()))
            .collect();

        let result = self
            .0
            .call(&value, &args)
            .map_err(|msg| RenderErrorReason::Other(format!("helper '{}': {}", h.name(), msg)))?;
        Ok(ScopedJson::Derived(result))
    }
}
