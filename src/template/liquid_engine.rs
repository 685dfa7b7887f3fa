//! Liquid backend: helpers are registered as filters and custom tags as
//! Liquid tags (`{% name key = value %}`).

use std::collections::HashMap;
use std::fmt;
use std::io::Write;
use std::sync::{PoisonError, RwLock};

use liquid::{Parser, ParserBuilder, Template};
use liquid_core::model::{KString, Value as LiquidValue, ValueView};
use liquid_core::parser::{
    Filter, FilterArguments, FilterReflection, Language, ParameterReflection, ParseFilter,
    ParseTag, TagReflection, TagTokenIter,
};
use liquid_core::runtime::{Expression, Renderable, Runtime};
use liquid_core::Error as LiquidError;
use serde_json::Value;

use super::engine::{RegisterOptions, TemplateEngine, TemplateHelper, TemplateTag};
use super::error::{TemplateError, TemplateResult};
use super::types::{Capability, TemplateType};

/// Liquid engine with its own template table.
///
/// Filters and tags are baked into the parser, so registering one rebuilds
/// the parser. Templates compiled earlier keep the extensions they were
/// parsed with.
pub struct LiquidTemplateEngine {
    state: RwLock<LiquidState>,
}

struct LiquidState {
    parser: Parser,
    helpers: HashMap<String, TemplateHelper>,
    tags: HashMap<String, TemplateTag>,
    templates: HashMap<String, Template>,
}

impl Default for LiquidTemplateEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl LiquidTemplateEngine {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(LiquidState {
                parser: ParserBuilder::with_stdlib().build().unwrap_or_default(),
                helpers: HashMap::new(),
                tags: HashMap::new(),
                templates: HashMap::new(),
            }),
        }
    }
}

impl LiquidState {
    fn rebuild_parser(&mut self) -> TemplateResult<()> {
        let mut builder = ParserBuilder::with_stdlib();
        for (name, helper) in &self.helpers {
            let filter: Box<dyn ParseFilter> = Box::new(HelperFilterParser {
                name: name.clone(),
                helper: helper.clone(),
            });
            builder = builder.filter(filter);
        }
        for (name, tag) in &self.tags {
            let parser: Box<dyn ParseTag> = Box::new(TagParser {
                name: name.clone(),
                tag: tag.clone(),
            });
            builder = builder.tag(parser);
        }

        self.parser = builder.build().map_err(|e| {
            TemplateError::TemplateRenderError(format!("failed to build liquid parser: {}", e))
        })?;
        Ok(())
    }
}

impl TemplateEngine for LiquidTemplateEngine {
    fn template_type(&self) -> TemplateType {
        TemplateType::Liquid
    }

    fn supports(&self, capability: Capability) -> bool {
        matches!(capability, Capability::Helpers | Capability::Tags)
    }

    fn register_template(
        &self,
        id: &str,
        text: &str,
        options: Option<&RegisterOptions>,
    ) -> TemplateResult<()> {
        let text = RegisterOptions::prepare(options, text);
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);

        let template = state.parser.parse(text).map_err(|e| TemplateError::Compile {
            id: id.to_string(),
            message: e.to_string(),
        })?;
        state.templates.insert(id.to_string(), template);

        tracing::debug!(engine = "liquid", template_id = %id, "Template registered");
        Ok(())
    }

    fn apply_template(&self, id: &str, data: &Value) -> TemplateResult<String> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);

        let template = state
            .templates
            .get(id)
            .ok_or_else(|| TemplateError::not_found(id))?;

        let globals = liquid_core::model::to_object(data)
            .map_err(|e| TemplateError::TemplateRenderError(e.to_string()))?;

        template
            .render(&globals)
            .map_err(|e| TemplateError::TemplateRenderError(e.to_string()))
    }

    fn register_helper(&self, name: &str, helper: TemplateHelper) -> TemplateResult<()> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.helpers.insert(name.to_string(), helper);
        state.rebuild_parser()
    }

    fn register_tag(&self, name: &str, tag: TemplateTag) -> TemplateResult<()> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.tags.insert(name.to_string(), tag);
        state.rebuild_parser()
    }

    fn has_template(&self, id: &str) -> bool {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .templates
            .contains_key(id)
    }

    fn template_ids(&self) -> Vec<String> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        let mut ids: Vec<String> = state.templates.keys().cloned().collect();
        ids.sort();
        ids
    }
}

fn to_json(value: &dyn ValueView) -> liquid_core::Result<Value> {
    serde_json::to_value(value.to_value()).map_err(|e| LiquidError::with_msg(e.to_string()))
}

fn to_liquid(value: &Value) -> liquid_core::Result<LiquidValue> {
    liquid_core::model::to_value(value)
}

fn evaluate_keywords(
    keywords: &[(String, Expression)],
    runtime: &dyn Runtime,
) -> liquid_core::Result<HashMap<String, Value>> {
    keywords
        .iter()
        .map(|(key, expr)| {
            let value = expr.evaluate(runtime)?;
            Ok((key.clone(), to_json(&value)?))
        })
        .collect()
}

// ============================================================================
// Helpers as filters: {{ value | name: key: arg }}
// ============================================================================

#[derive(Debug, Clone)]
struct HelperFilterParser {
    name: String,
    helper: TemplateHelper,
}

impl FilterReflection for HelperFilterParser {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "custom helper"
    }

    fn positional_parameters(&self) -> &'static [ParameterReflection] {
        &[]
    }

    fn keyword_parameters(&self) -> &'static [ParameterReflection] {
        &[]
    }
}

impl ParseFilter for HelperFilterParser {
    fn parse(&self, arguments: FilterArguments<'_>) -> liquid_core::Result<Box<dyn Filter>> {
        if arguments.positional.count() > 0 {
            return Err(LiquidError::with_msg(format!(
                "filter '{}' takes keyword arguments only",
                self.name
            )));
        }
        let keywords = arguments
            .keyword
            .map(|(key, expr)| (key.to_string(), expr))
            .collect();

        Ok(Box::new(HelperFilter {
            name: self.name.clone(),
            helper: self.helper.clone(),
            keywords,
        }))
    }

    fn reflection(&self) -> &dyn FilterReflection {
        self
    }
}

#[derive(Debug)]
struct HelperFilter {
    name: String,
    helper: TemplateHelper,
    keywords: Vec<(String, Expression)>,
}

impl fmt::Display for HelperFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl Filter for HelperFilter {
    fn evaluate(
        &self,
        input: &dyn ValueView,
        runtime: &dyn Runtime,
    ) -> liquid_core::Result<LiquidValue> {
        let args = evaluate_keywords(&self.keywords, runtime)?;
        let result = self
            .helper
            .call(&to_json(input)?, &args)
            .map_err(|msg| LiquidError::with_msg(format!("filter '{}': {}", self.name, msg)))?;
        to_liquid(&result)
    }
}

// ============================================================================
// Custom tags: {% name key = value ... %}
// ============================================================================

#[derive(Debug, Clone)]
struct TagParser {
    name: String,
    tag: TemplateTag,
}

impl TagReflection for TagParser {
    fn tag(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "custom tag"
    }
}

impl ParseTag for TagParser {
    fn parse(
        &self,
        mut arguments: TagTokenIter<'_>,
        _options: &Language,
    ) -> liquid_core::Result<Box<dyn Renderable>> {
        let mut keywords = Vec::new();
        while let Some(token) = arguments.next() {
            let key = token.expect_identifier().into_result()?.to_string();
            arguments
                .expect_next("\"=\" expected.")?
                .expect_str("=")
                .into_result()?;
            let value = arguments
                .expect_next("Value expected.")?
                .expect_value()
                .into_result()?;
            keywords.push((key, value));
        }

        Ok(Box::new(CustomTag {
            name: self.name.clone(),
            tag: self.tag.clone(),
            keywords,
        }))
    }

    fn reflection(&self) -> &dyn TagReflection {
        self
    }
}

/// Evaluates its arguments, calls the tag and sets the returned variables
/// as globals for the rest of the template.
#[derive(Debug)]
struct CustomTag {
    name: String,
    tag: TemplateTag,
    keywords: Vec<(String, Expression)>,
}

impl Renderable for CustomTag {
    fn render_to(&self, _writer: &mut dyn Write, runtime: &dyn Runtime) -> liquid_core::Result<()> {
        let args = evaluate_keywords(&self.keywords, runtime)?;
        let vars = self
            .tag
            .call(&args)
            .map_err(|msg| LiquidError::with_msg(format!("tag '{}': {}", self.name, msg)))?;

        for (key, value) in vars {
            runtime.set_global(KString::from(key), to_liquid(&value)?);
        }
        Ok(())
    }
}
