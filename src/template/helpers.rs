//! Built-in helpers registered on every engine.

use heck::{ToKebabCase, ToSnakeCase};
use serde_json::Value;

use super::engine::{TemplateEngine, TemplateHelper};
use super::error::TemplateResult;

/// Register the built-in helper set on `engine`
pub fn register_builtin_helpers(engine: &dyn TemplateEngine) -> TemplateResult<()> {
    for (name, helper) in builtin_helpers() {
        engine.register_helper(name, helper)?;
    }
    Ok(())
}

pub fn builtin_helpers() -> Vec<(&'static str, TemplateHelper)> {
    vec![
        ("uppercase", TemplateHelper::new(|v, _| string_op(v, "uppercase", str::to_uppercase))),
        ("lowercase", TemplateHelper::new(|v, _| string_op(v, "lowercase", str::to_lowercase))),
        ("snake_case", TemplateHelper::new(|v, _| string_op(v, "snake_case", |s| s.to_snake_case()))),
        ("kebab_case", TemplateHelper::new(|v, _| string_op(v, "kebab_case", |s| s.to_kebab_case()))),
        ("json", TemplateHelper::new(|v, _| json_string(v))),
        // Liquid's stdlib already owns `default`
        (
            "or_default",
            TemplateHelper::new(|v, args| match v {
                Value::Null => Ok(args.get("value").cloned().unwrap_or(Value::String(String::new()))),
                Value::String(s) if s.is_empty() => {
                    Ok(args.get("value").cloned().unwrap_or_else(|| v.clone()))
                }
                _ => Ok(v.clone()),
            }),
        ),
    ]
}

fn string_op(value: &Value, name: &str, op: impl Fn(&str) -> String) -> Result<Value, String> {
    value
        .as_str()
        .map(|s| Value::String(op(s)))
        .ok_or_else(|| format!("{} expects a string", name))
}

/// Serialize to a JSON literal, so strings come out quoted and escaped and
/// can be embedded directly in a JSON payload template.
fn json_string(value: &Value) -> Result<Value, String> {
    serde_json::to_string(value)
        .map(Value::String)
        .map_err(|e| e.to_string())
}
