//! Rendering pipelines.
//!
//! [`Transformer`] is the shared base: it resolves a template type to its
//! engine, applies templates by key, and fetches + registers template text.
//! It is generic over the config entry shape so each pipeline supplies its
//! own key and path layout:
//! - [`CardRenderer`]: chat-client cards, keyed by (type, source, client)
//! - [`EventTransformer`]: generic event payloads, keyed by (type, source)

mod card;
mod entry;
mod event;

pub use card::CardRenderer;
pub use entry::{CardConfigEntry, ConfigEntry, EventConfigEntry, ManifestEntry};
pub use event::EventTransformer;

use std::marker::PhantomData;
use std::sync::Arc;

use serde_json::Value;

use crate::metrics::{FetchMetrics, RegistrationMetrics};
use crate::source::{ContentSource, SourceLocation};
use crate::template::{
    EngineRegistry, RegisterOptions, TemplateError, TemplateResult, TemplateType,
};

/// A config entry shape handled by a [`Transformer`]
pub trait TransformConfigEntry {
    /// Domain prefix of keys built for this entry shape
    const KEY_PREFIX: &'static str;
    /// Folder holding templates of this shape under a template root
    const TEMPLATE_FOLDER: &'static str;

    fn template_type(&self) -> TemplateType;
    fn source_type(&self) -> &str;
    fn template_name(&self) -> &str;

    /// Lookup key of the compiled template
    fn key(&self) -> String;

    /// Path of the template file under `root`
    fn template_path(&self, root: &str) -> String;
}

/// Shared apply/register mechanics over one [`EngineRegistry`]
pub struct Transformer<E> {
    registry: Arc<EngineRegistry>,
    register_options: RegisterOptions,
    _entry: PhantomData<fn(&E)>,
}

impl<E> Clone for Transformer<E> {
    fn clone(&self) -> Self {
        Self {
            registry: self.registry.clone(),
            register_options: self.register_options.clone(),
            _entry: PhantomData,
        }
    }
}

impl<E: TransformConfigEntry> Transformer<E> {
    pub fn new(registry: Arc<EngineRegistry>) -> Self {
        Self {
            registry,
            // Template files end with an editor newline that is not part of
            // the rendered payload; only that one newline is dropped
            register_options: RegisterOptions {
                trim_trailing_newline: true,
            },
            _entry: PhantomData,
        }
    }

    pub fn registry(&self) -> &Arc<EngineRegistry> {
        &self.registry
    }

    /// Apply the template stored under `key` in the engine for `template_type`
    pub fn apply_template(
        &self,
        template_type: TemplateType,
        key: &str,
        data: &Value,
    ) -> TemplateResult<String> {
        let engine = self.registry.engine(template_type)?;
        engine.apply_template(key, data)
    }

    /// Compile `text` into the engine for `template_type` under `key`.
    /// Returns true if an earlier template under the same key was replaced.
    pub fn register_text(
        &self,
        template_type: TemplateType,
        key: &str,
        text: &str,
    ) -> TemplateResult<bool> {
        let engine = self.registry.engine(template_type)?;
        engine.register_template(key, text, Some(&self.register_options))?;

        let overwritten = self.registry.mark_registered(key, template_type);
        RegistrationMetrics::record_registered(template_type, overwritten);
        if overwritten {
            tracing::warn!(key = %key, engine = %template_type, "Template key overwritten");
        } else {
            tracing::debug!(key = %key, engine = %template_type, "Template key registered");
        }
        Ok(overwritten)
    }

    /// Fetch the template at `path` and register it under `key`
    pub async fn read_and_register_template(
        &self,
        source: &dyn ContentSource,
        path: &str,
        key: &str,
        template_type: TemplateType,
    ) -> TemplateResult<bool> {
        // Fail on a missing engine before spending a fetch
        self.registry.engine(template_type)?;

        let text = fetch_template(source, path).await?;
        self.register_text(template_type, key, &text)
    }

    /// Path of `entry`'s template for the given location
    pub fn entry_path(&self, location: &SourceLocation, manifest_path: &str, entry: &E) -> String {
        let root = location.template_root(E::TEMPLATE_FOLDER, manifest_path);
        entry.template_path(&root)
    }

    /// Fetch and register the template described by `entry`
    pub async fn register_entry(
        &self,
        source: &dyn ContentSource,
        location: &SourceLocation,
        manifest_path: &str,
        entry: &E,
    ) -> TemplateResult<bool> {
        let path = self.entry_path(location, manifest_path, entry);
        self.read_and_register_template(source, &path, &entry.key(), entry.template_type())
            .await
    }
}

/// Fetch text through `source`, recording failures
pub(crate) async fn fetch_template(
    source: &dyn ContentSource,
    path: &str,
) -> TemplateResult<String> {
    source.fetch_text(path).await.map_err(|e| {
        FetchMetrics::record_failure(&e);
        tracing::error!(source = %source.describe(), path = %path, error = %e, "Template fetch failed");
        TemplateError::Fetch {
            path: path.to_string(),
            source: e,
        }
    })
}
