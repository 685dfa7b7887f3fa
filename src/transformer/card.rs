use std::sync::Arc;
use std::time::Instant;

use serde_json::Value;

use super::entry::CardConfigEntry;
use super::{TransformConfigEntry, Transformer};
use crate::metrics::RenderMetrics;
use crate::source::{ContentSource, SourceLocation};
use crate::template::{build_key, ClientType, EngineRegistry, TemplateError, TemplateResult, TemplateType};

impl TransformConfigEntry for CardConfigEntry {
    const KEY_PREFIX: &'static str = "card";
    const TEMPLATE_FOLDER: &'static str = "CardTemplate";

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
        CardRenderer::key(self.template_type, &self.source_type, self.client_type)
    }

    fn template_path(&self, root: &str) -> String {
        format!(
            "{}/{}/{}/{}",
            root, self.client_type, self.template_type, self.template_name
        )
    }
}

/// Renders cards for messaging clients (Slack, Teams) from event data
#[derive(Clone)]
pub struct CardRenderer {
    base: Transformer<CardConfigEntry>,
}

impl CardRenderer {
    pub fn new(registry: Arc<EngineRegistry>) -> Self {
        Self {
            base: Transformer::new(registry),
        }
    }

    /// Lookup key for a card template
    pub fn key(template_type: TemplateType, source_type: &str, client_type: ClientType) -> String {
        build_key(
            CardConfigEntry::KEY_PREFIX,
            &[
                Some(template_type.as_str()),
                Some(source_type),
                Some(client_type.as_str()),
            ],
        )
    }

    /// Render the card registered for (template type, source type, client type).
    ///
    /// A missing template or a render failure is reported with all three
    /// values; a missing engine is passed through unchanged.
    pub fn construct_card_json(
        &self,
        template_type: TemplateType,
        source_type: &str,
        client_type: ClientType,
        event: &Value,
    ) -> TemplateResult<String> {
        let key = Self::key(template_type, source_type, client_type);
        let start = Instant::now();

        let result = self
            .base
            .apply_template(template_type, &key, event)
            .map_err(|error| match error {
                TemplateError::TemplateNotFound(_) => TemplateError::TemplateNotFound(format!(
                    "No template found for Template Type: {}, Source Type: {} and Client Type: {}",
                    template_type, source_type, client_type
                )),
                TemplateError::TemplateEngineNotFound(_) => error,
                other => TemplateError::TemplateRenderError(format!(
                    "Error applying template for Template Type: {}, Source Type: {} and Client Type: {} with error message {}",
                    template_type, source_type, client_type, other
                )),
            });

        RenderMetrics::record("card", &result, start.elapsed());
        if let Err(e) = &result {
            tracing::warn!(key = %key, error = %e, "Card render failed");
        }
        result
    }

    /// Fetch and register the card template described by `entry`.
    /// Path layout: `{root}/{client}/{template type}/{template name}`.
    pub async fn register_template(
        &self,
        source: &dyn ContentSource,
        location: &SourceLocation,
        manifest_path: &str,
        entry: &CardConfigEntry,
    ) -> TemplateResult<bool> {
        self.base
            .register_entry(source, location, manifest_path, entry)
            .await
    }

    pub(crate) fn base(&self) -> &Transformer<CardConfigEntry> {
        &self.base
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{FetchError, LocalContentSource};
    use crate::template::{HandlebarsTemplateEngine, TemplateErrorKind};
    use async_trait::async_trait;
    use serde_json::json;
    use std::path::PathBuf;
    use std::sync::Mutex;

    /// Serves a fixed body for every path and remembers what was asked for
    #[derive(Default)]
    struct RecordingSource {
        requested: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ContentSource for RecordingSource {
        async fn fetch_text(&self, path: &str) -> Result<String, FetchError> {
            self.requested.lock().unwrap().push(path.to_string());
            Ok("{{title}}".to_string())
        }

        fn describe(&self) -> String {
            "recording".to_string()
        }
    }

    fn pr_entry(client_type: ClientType) -> CardConfigEntry {
        CardConfigEntry {
            template_type: TemplateType::Handlebars,
            source_type: "PR_Opened".to_string(),
            template_name: "pr.hbs".to_string(),
            client_type,
        }
    }

    fn renderer() -> CardRenderer {
        let registry =
            EngineRegistry::new().with_engine(Arc::new(HandlebarsTemplateEngine::default()));
        CardRenderer::new(Arc::new(registry))
    }

    #[test]
    fn test_key_layout() {
        assert_eq!(
            CardRenderer::key(TemplateType::Handlebars, "PR_Opened", ClientType::Slack),
            "card:handlebars:PR_Opened:slack"
        );
    }

    #[test]
    fn test_entry_path() {
        let entry = CardConfigEntry {
            template_type: TemplateType::Handlebars,
            source_type: "PR_Opened".to_string(),
            template_name: "pr.hbs".to_string(),
            client_type: ClientType::Teams,
        };
        assert_eq!(entry.template_path("/CardTemplate"), "/CardTemplate/teams/handlebars/pr.hbs");
        assert_eq!(entry.key(), "card:handlebars:PR_Opened:teams");
    }

    #[test]
    fn test_render_registered_card() {
        let r = renderer();
        let key = CardRenderer::key(TemplateType::Handlebars, "PR_Opened", ClientType::Slack);
        r.base().register_text(TemplateType::Handlebars, &key, "Hello {{name}}").unwrap();

        let rendered = r
            .construct_card_json(TemplateType::Handlebars, "PR_Opened", ClientType::Slack, &json!({"name": "Ada"}))
            .unwrap();
        assert_eq!(rendered, "Hello Ada");
    }

    #[test]
    fn test_missing_card_names_all_three() {
        let r = renderer();
        let err = r
            .construct_card_json(TemplateType::Handlebars, "PR_Closed", ClientType::Slack, &json!({}))
            .unwrap_err();

        assert_eq!(err.kind(), TemplateErrorKind::TemplateNotFound);
        let message = err.to_string();
        assert!(message.contains("handlebars"));
        assert!(message.contains("PR_Closed"));
        assert!(message.contains("slack"));
    }

    #[test]
    fn test_other_client_is_independent() {
        let r = renderer();
        let key = CardRenderer::key(TemplateType::Handlebars, "PR_Opened", ClientType::Slack);
        r.base().register_text(TemplateType::Handlebars, &key, "slack card").unwrap();

        let err = r
            .construct_card_json(TemplateType::Handlebars, "PR_Opened", ClientType::Teams, &json!({}))
            .unwrap_err();
        assert_eq!(err.kind(), TemplateErrorKind::TemplateNotFound);
    }

    #[test]
    fn test_engine_not_found_passes_through() {
        let r = renderer();
        let err = r
            .construct_card_json(TemplateType::Liquid, "PR_Opened", ClientType::Slack, &json!({}))
            .unwrap_err();
        assert!(matches!(err, TemplateError::TemplateEngineNotFound(TemplateType::Liquid)));
    }

    #[test]
    fn test_render_failure_wrapped_with_context() {
        let r = renderer();
        let key = CardRenderer::key(TemplateType::Handlebars, "Push", ClientType::Slack);
        r.base().register_text(TemplateType::Handlebars, &key, "{{commit.sha}}").unwrap();

        let err = r
            .construct_card_json(TemplateType::Handlebars, "Push", ClientType::Slack, &json!({}))
            .unwrap_err();
        assert_eq!(err.kind(), TemplateErrorKind::TemplateRenderError);
        let message = err.to_string();
        assert!(message.starts_with("Error applying template for Template Type: handlebars, Source Type: Push and Client Type: slack"));
    }

    #[tokio::test]
    async fn test_register_template_from_local_source() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("CardTemplate/slack/handlebars")).unwrap();
        std::fs::write(
            dir.path().join("CardTemplate/slack/handlebars/pr.hbs"),
            "Opened by {{user}}\n",
        )
        .unwrap();

        let location = SourceLocation::Local {
            root: PathBuf::from(dir.path()),
        };
        let source = LocalContentSource::new(dir.path());

        let r = renderer();
        let overwritten = r
            .register_template(&source, &location, "TransformerConfig.json", &pr_entry(ClientType::Slack))
            .await
            .unwrap();
        assert!(!overwritten);

        let rendered = r
            .construct_card_json(TemplateType::Handlebars, "PR_Opened", ClientType::Slack, &json!({"user": "ada"}))
            .unwrap();
        assert_eq!(rendered, "Opened by ada");
    }

    #[tokio::test]
    async fn test_register_template_resolves_remote_roots() {
        let remote = |same_repository| SourceLocation::Remote {
            repository: "octo/templates".to_string(),
            branch: "main".to_string(),
            access_token: None,
            api_base: "https://api.github.com".to_string(),
            same_repository,
        };
        let source = RecordingSource::default();
        let r = renderer();

        r.register_template(&source, &remote(false), "config/TransformerConfig.json", &pr_entry(ClientType::Slack))
            .await
            .unwrap();
        r.register_template(&source, &remote(true), "config/TransformerConfig.json", &pr_entry(ClientType::Teams))
            .await
            .unwrap();

        assert_eq!(
            *source.requested.lock().unwrap(),
            vec![
                "/CardTemplate/slack/handlebars/pr.hbs".to_string(),
                "config/CardTemplate/teams/handlebars/pr.hbs".to_string(),
            ]
        );
        assert!(r.base().registry().is_registered(
            TemplateType::Handlebars,
            "card:handlebars:PR_Opened:teams"
        ));
    }

    #[tokio::test]
    async fn test_register_template_missing_engine_skips_fetch() {
        let source = RecordingSource::default();
        let mut entry = pr_entry(ClientType::Slack);
        entry.template_type = TemplateType::Liquid;

        let location = SourceLocation::Local {
            root: PathBuf::from("."),
        };
        let err = renderer()
            .register_template(&source, &location, "TransformerConfig.json", &entry)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), TemplateErrorKind::TemplateEngineNotFound);
        assert!(source.requested.lock().unwrap().is_empty());
    }
}
