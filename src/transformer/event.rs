use std::sync::Arc;
use std::time::Instant;

use serde_json::Value;

use super::entry::EventConfigEntry;
use super::{TransformConfigEntry, Transformer};
use crate::metrics::RenderMetrics;
use crate::source::{ContentSource, SourceLocation};
use crate::template::{build_key, EngineRegistry, TemplateError, TemplateResult, TemplateType};

impl TransformConfigEntry for EventConfigEntry {
    const KEY_PREFIX: &'static str = "event";
    const TEMPLATE_FOLDER: &'static str = "EventTemplate";

    fn template_type(&self) -> TemplateType {
        self.template_type
    }

    fn source_type(&self) -> &str {
        &self.source_type
    }

    fn template_name(&self) -> &str {
        &self.template_name
    }

    fn key(&self) -> String {
        EventTransformer::key(self.template_type, &self.source_type)
    }

    fn template_path(&self, root: &str) -> String {
        format!("{}/{}/{}", root, self.template_type, self.template_name)
    }
}

/// Renders generic event payloads from event data
#[derive(Clone)]
pub struct EventTransformer {
    base: Transformer<EventConfigEntry>,
}

impl EventTransformer {
    pub fn new(registry: Arc<EngineRegistry>) -> Self {
        Self {
            base: Transformer::new(registry),
        }
    }

    /// Lookup key for an event template
    pub fn key(template_type: TemplateType, source_type: &str) -> String {
        build_key(
            EventConfigEntry::KEY_PREFIX,
            &[Some(template_type.as_str()), Some(source_type)],
        )
    }

    /// Render the event payload registered for (template type, source type)
    pub fn construct_event_json(
        &self,
        template_type: TemplateType,
        source_type: &str,
        event: &Value,
    ) -> TemplateResult<String> {
        let key = Self::key(template_type, source_type);
        let start = Instant::now();

        let result = self
            .base
            .apply_template(template_type, &key, event)
            .map_err(|error| match error {
                TemplateError::TemplateNotFound(_) => TemplateError::TemplateNotFound(format!(
                    "No template found for Template Type: {} and Source Type: {}",
                    template_type, source_type
                )),
                TemplateError::TemplateEngineNotFound(_) => error,
                other => TemplateError::TemplateRenderError(format!(
                    "Error applying template for Template Type: {} and Source Type: {} with error message {}",
                    template_type, source_type, other
                )),
            });

        RenderMetrics::record("event", &result, start.elapsed());
        if let Err(e) = &result {
            tracing::warn!(key = %key, error = %e, "Event render failed");
        }
        result
    }

    /// Fetch and register the event template described by `entry`.
    /// Path layout: `{root}/{template type}/{template name}`.
    pub async fn register_template(
        &self,
        source: &dyn ContentSource,
        location: &SourceLocation,
        manifest_path: &str,
        entry: &EventConfigEntry,
    ) -> TemplateResult<bool> {
        self.base
            .register_entry(source, location, manifest_path, entry)
            .await
    }

    pub(crate) fn base(&self) -> &Transformer<EventConfigEntry> {
        &self.base
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::LocalContentSource;
    use crate::template::{TemplateErrorKind, LiquidTemplateEngine};
    use serde_json::json;
    use std::path::PathBuf;

    fn transformer() -> EventTransformer {
        let registry = EngineRegistry::new().with_engine(Arc::new(LiquidTemplateEngine::new()));
        EventTransformer::new(Arc::new(registry))
    }

    #[test]
    fn test_key_layout() {
        assert_eq!(EventTransformer::key(TemplateType::Liquid, "Push"), "event:liquid:Push");
    }

    #[test]
    fn test_render_event() {
        let t = transformer();
        t.base()
            .register_text(TemplateType::Liquid, &EventTransformer::key(TemplateType::Liquid, "Push"), "{\"ref\": \"{{ ref }}\"}")
            .unwrap();

        let rendered = t
            .construct_event_json(TemplateType::Liquid, "Push", &json!({"ref": "main"}))
            .unwrap();
        assert_eq!(rendered, r#"{"ref": "main"}"#);
    }

    #[test]
    fn test_missing_event_template() {
        let t = transformer();
        let err = t
            .construct_event_json(TemplateType::Liquid, "Issue_Opened", &json!({}))
            .unwrap_err();
        assert_eq!(err.kind(), TemplateErrorKind::TemplateNotFound);
        assert_eq!(
            err.to_string(),
            "No template found for Template Type: liquid and Source Type: Issue_Opened"
        );
    }

    #[test]
    fn test_unconfigured_engine() {
        let t = transformer();
        let err = t
            .construct_event_json(TemplateType::Handlebars, "Push", &json!({}))
            .unwrap_err();
        assert_eq!(err.kind(), TemplateErrorKind::TemplateEngineNotFound);
    }

    #[tokio::test]
    async fn test_register_template_from_local_source() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("EventTemplate/liquid")).unwrap();
        std::fs::write(dir.path().join("EventTemplate/liquid/push.liquid"), "pushed {{ ref }}\n").unwrap();

        let location = SourceLocation::Local {
            root: PathBuf::from(dir.path()),
        };
        let source = LocalContentSource::new(dir.path());
        let entry = EventConfigEntry {
            template_type: TemplateType::Liquid,
            source_type: "Push".to_string(),
            template_name: "push.liquid".to_string(),
        };

        let t = transformer();
        t.register_template(&source, &location, "TransformerConfig.json", &entry)
            .await
            .unwrap();

        let rendered = t
            .construct_event_json(TemplateType::Liquid, "Push", &json!({"ref": "main"}))
            .unwrap();
        assert_eq!(rendered, "pushed main");
    }
}
