//! Routes a template type to its engine instance.

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;

use super::engine::TemplateEngine;
use super::error::{TemplateError, TemplateResult};
use super::handlebars_engine::HandlebarsTemplateEngine;
use super::helpers::register_builtin_helpers;
use super::liquid_engine::LiquidTemplateEngine;
use super::types::TemplateType;
use crate::config::EngineConfig;

/// One engine instance per configured template type, plus the cache of keys
/// registered through it.
///
/// The engine set is fixed at construction; a template type missing from it
/// yields `TemplateEngineNotFound`, never `TemplateNotFound`.
pub struct EngineRegistry {
    engines: HashMap<TemplateType, Arc<dyn TemplateEngine>>,
    registered: DashMap<String, TemplateType>,
}

impl Default for EngineRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineRegistry {
    /// Create a registry with no engines
    pub fn new() -> Self {
        Self {
            engines: HashMap::new(),
            registered: DashMap::new(),
        }
    }

    /// Add (or replace) the engine for its own template type
    pub fn with_engine(mut self, engine: Arc<dyn TemplateEngine>) -> Self {
        self.engines.insert(engine.template_type(), engine);
        self
    }

    /// Build the engines listed in `config`, each with the built-in helpers
    pub fn from_config(config: &EngineConfig) -> TemplateResult<Self> {
        let mut registry = Self::new();

        for template_type in &config.enabled {
            let engine: Arc<dyn TemplateEngine> = match template_type {
                TemplateType::Handlebars => Arc::new(HandlebarsTemplateEngine::new(config.strict_mode)),
                TemplateType::Liquid => Arc::new(LiquidTemplateEngine::new()),
            };
            register_builtin_helpers(engine.as_ref())?;
            registry = registry.with_engine(engine);
        }

        tracing::info!(
            engines = ?config.enabled,
            strict_mode = config.strict_mode,
            "Template engines initialized"
        );

        Ok(registry)
    }

    /// Resolve the engine for `template_type`
    pub fn engine(&self, template_type: TemplateType) -> TemplateResult<Arc<dyn TemplateEngine>> {
        self.engines
            .get(&template_type)
            .cloned()
            .ok_or(TemplateError::TemplateEngineNotFound(template_type))
    }

    /// Template types with a configured engine
    pub fn template_types(&self) -> Vec<TemplateType> {
        let mut types: Vec<TemplateType> = self.engines.keys().copied().collect();
        types.sort_by_key(|t| t.as_str());
        types
    }

    /// Record `key` as registered through `template_type`.
    /// Returns true if the key was already present (an overwrite).
    pub(crate) fn mark_registered(&self, key: &str, template_type: TemplateType) -> bool {
        self.registered
            .insert(key.to_string(), template_type)
            .is_some()
    }

    /// Whether `key` has been registered through `template_type`
    pub fn is_registered(&self, template_type: TemplateType, key: &str) -> bool {
        self.registered
            .get(key)
            .map(|t| *t == template_type)
            .unwrap_or(false)
    }

    /// Number of distinct keys registered
    pub fn registered_count(&self) -> usize {
        self.registered.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::error::TemplateErrorKind;

    #[test]
    fn test_empty_registry_has_no_engines() {
        let registry = EngineRegistry::new();
        let err = registry.engine(TemplateType::Handlebars).err().unwrap();
        assert_eq!(err.kind(), TemplateErrorKind::TemplateEngineNotFound);
    }

    #[test]
    fn test_from_config_builds_enabled_only() {
        let config = EngineConfig {
            enabled: vec![TemplateType::Liquid],
            strict_mode: true,
        };
        let registry = EngineRegistry::from_config(&config).unwrap();

        assert_eq!(registry.template_types(), vec![TemplateType::Liquid]);
        assert!(registry.engine(TemplateType::Liquid).is_ok());
        assert!(registry.engine(TemplateType::Handlebars).is_err());
    }

    #[test]
    fn test_engine_instance_is_shared() {
        let registry = EngineRegistry::new().with_engine(Arc::new(LiquidTemplateEngine::new()));
        let a = registry.engine(TemplateType::Liquid).unwrap();
        let b = registry.engine(TemplateType::Liquid).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_mark_registered_reports_overwrite() {
        let registry = EngineRegistry::new();
        assert!(!registry.mark_registered("event:liquid:Push:", TemplateType::Liquid));
        assert!(registry.mark_registered("event:liquid:Push:", TemplateType::Liquid));
        assert!(registry.is_registered(TemplateType::Liquid, "event:liquid:Push:"));
        assert!(!registry.is_registered(TemplateType::Handlebars, "event:liquid:Push:"));
        assert_eq!(registry.registered_count(), 1);
    }
}
