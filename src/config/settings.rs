use std::env;
use std::path::PathBuf;

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Deserializer};

use crate::error::AppError;
use crate::manager::DuplicateKeyPolicy;
use crate::source::SourceLocation;
use crate::template::{ClientType, TemplateType};

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub source: SourceConfig,
    pub render: RenderConfig,
    #[serde(default)]
    pub engines: EngineConfig,
    #[serde(default)]
    pub setup: SetupConfig,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceMode {
    #[default]
    Local,
    Remote,
}

/// Where the manifest and templates come from
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    #[serde(default)]
    pub mode: SourceMode,
    /// Local root directory (local mode)
    #[serde(default = "default_root")]
    pub root: String,
    /// `owner/name` of the template repository (remote mode)
    #[serde(default, deserialize_with = "empty_as_none")]
    pub repository: Option<String>,
    #[serde(default = "default_branch")]
    pub branch: String,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub access_token: Option<String>,
    #[serde(default = "default_manifest_path")]
    pub manifest_path: String,
    /// Templates live next to the manifest (remote mode)
    #[serde(default)]
    pub same_repository: bool,
    #[serde(default = "default_api_base")]
    pub api_base: String,
}

/// The single render request of this invocation
#[derive(Debug, Clone, Deserialize)]
pub struct RenderConfig {
    pub template_type: TemplateType,
    pub source_type: String,
    /// Present for card rendering, absent for event rendering
    #[serde(default, deserialize_with = "empty_as_none")]
    pub client_type: Option<ClientType>,
    /// Event data as a JSON string
    #[serde(default = "default_data")]
    pub data: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Engines to instantiate
    #[serde(default = "default_enabled_engines")]
    pub enabled: Vec<TemplateType>,
    /// Treat missing fields as render errors (Handlebars)
    #[serde(default = "default_strict_mode")]
    pub strict_mode: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SetupConfig {
    #[serde(default)]
    pub duplicate_keys: DuplicateKeyPolicy,
    /// Register only the manifest entries matching the render request
    #[serde(default = "default_only_requested")]
    pub only_requested: bool,
}

fn default_root() -> String {
    ".".to_string()
}

fn default_branch() -> String {
    "main".to_string()
}

fn default_manifest_path() -> String {
    "TransformerConfig.json".to_string()
}

fn default_api_base() -> String {
    "https://api.github.com".to_string()
}

fn default_data() -> String {
    "{}".to_string()
}

fn default_enabled_engines() -> Vec<TemplateType> {
    TemplateType::all().to_vec()
}

fn default_strict_mode() -> bool {
    true
}

fn default_only_requested() -> bool {
    true
}

/// Action inputs arrive as empty strings when unset
fn empty_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => s.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        // Load .env file if exists
        let _ = dotenvy::dotenv();

        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let builder = Config::builder()
            // Start with default values
            .set_default("source.mode", "local")?
            .set_default("source.branch", "main")?
            .set_default("source.manifest_path", "TransformerConfig.json")?
            .set_default("engines.strict_mode", true)?
            .set_default("setup.duplicate_keys", "overwrite")?
            // Load config file if exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Load from environment variables
            // TRANSFORMER__SOURCE__REPOSITORY, TRANSFORMER__RENDER__TEMPLATE_TYPE, etc.
            .add_source(
                Environment::with_prefix("TRANSFORMER")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("engines.enabled"),
            );

        builder.build()?.try_deserialize()
    }
}

impl SourceConfig {
    /// Resolve the configured location; remote mode requires a repository
    pub fn location(&self) -> Result<SourceLocation, AppError> {
        match self.mode {
            SourceMode::Local => Ok(SourceLocation::Local {
                root: PathBuf::from(&self.root),
            }),
            SourceMode::Remote => {
                let repository = self.repository.clone().ok_or_else(|| {
                    AppError::Validation("source.repository is required in remote mode".to_string())
                })?;
                Ok(SourceLocation::Remote {
                    repository,
                    branch: self.branch.clone(),
                    access_token: self.access_token.clone(),
                    api_base: self.api_base.clone(),
                    same_repository: self.same_repository,
                })
            }
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            mode: SourceMode::default(),
            root: default_root(),
            repository: None,
            branch: default_branch(),
            access_token: None,
            manifest_path: default_manifest_path(),
            same_repository: false,
            api_base: default_api_base(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled_engines(),
            strict_mode: default_strict_mode(),
        }
    }
}

impl Default for SetupConfig {
    fn default() -> Self {
        Self {
            duplicate_keys: DuplicateKeyPolicy::default(),
            only_requested: default_only_requested(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let source = SourceConfig::default();
        assert_eq!(source.mode, SourceMode::Local);
        assert_eq!(source.manifest_path, "TransformerConfig.json");
        assert_eq!(source.api_base, "https://api.github.com");

        let engines = EngineConfig::default();
        assert_eq!(engines.enabled, vec![TemplateType::Handlebars, TemplateType::Liquid]);
        assert!(engines.strict_mode);

        assert!(SetupConfig::default().only_requested);
    }

    #[test]
    fn test_remote_requires_repository() {
        let source = SourceConfig {
            mode: SourceMode::Remote,
            ..SourceConfig::default()
        };
        assert!(matches!(source.location(), Err(AppError::Validation(_))));

        let source = SourceConfig {
            mode: SourceMode::Remote,
            repository: Some("octo/templates".to_string()),
            ..SourceConfig::default()
        };
        assert!(source.location().unwrap().is_remote());
    }

    #[test]
    fn test_render_config_empty_client_is_none() {
        let json = r#"{"template_type": "liquid", "source_type": "Push", "client_type": ""}"#;
        let render: RenderConfig = serde_json::from_str(json).unwrap();
        assert_eq!(render.client_type, None);
        assert_eq!(render.data, "{}");

        let json = r#"{"template_type": "handlebars", "source_type": "PR", "client_type": "slack"}"#;
        let render: RenderConfig = serde_json::from_str(json).unwrap();
        assert_eq!(render.client_type, Some(ClientType::Slack));
    }
}
