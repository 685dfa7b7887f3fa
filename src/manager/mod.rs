//! Manifest-driven template setup.
//!
//! Reads the ordered list of [`ConfigEntry`] records from a manifest, fetches
//! every referenced template and registers it through the card or event
//! pipeline. Fetches run concurrently; registration runs in manifest order,
//! so a later entry with the same key deterministically replaces an earlier
//! one.
//!
//! # Example
//!
//! ```ignore
//! let registry = Arc::new(EngineRegistry::from_config(&settings.engines)?);
//! let manager = TemplateManager::new(registry);
//!
//! let location = settings.source.location();
//! let source = create_content_source(&location)?;
//! manager
//!     .setup(source.as_ref(), &location, "TransformerConfig.json", &SetupOptions::default())
//!     .await?;
//!
//! let card = manager.card_renderer().construct_card_json(
//!     TemplateType::Handlebars,
//!     "PullRequest_Opened",
//!     ClientType::Slack,
//!     &event,
//! )?;
//! ```

use std::collections::HashSet;
use std::sync::Arc;

use futures::future::try_join_all;
use serde::Deserialize;

use crate::source::{ContentSource, SourceLocation};
use crate::template::{
    ClientType, EngineRegistry, TemplateError, TemplateHelper, TemplateResult, TemplateTag,
    TemplateType,
};
use crate::transformer::{
    fetch_template, CardRenderer, ConfigEntry, EventTransformer, ManifestEntry,
    TransformConfigEntry,
};

/// What to do when two manifest entries produce the same template key
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicateKeyPolicy {
    /// Later entries replace earlier ones
    #[default]
    Overwrite,
    /// Fail setup before registering anything
    Reject,
}

/// Restricts setup to the entries serving one render request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryFilter {
    pub template_type: TemplateType,
    pub source_type: String,
    pub client_type: Option<ClientType>,
}

impl EntryFilter {
    pub fn matches(&self, entry: &ConfigEntry) -> bool {
        entry.template_type == self.template_type
            && entry.source_type == self.source_type
            && entry.client_type == self.client_type
    }
}

#[derive(Debug, Clone, Default)]
pub struct SetupOptions {
    pub duplicate_keys: DuplicateKeyPolicy,
    pub filter: Option<EntryFilter>,
}

/// Outcome of a setup run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SetupReport {
    pub registered_cards: usize,
    pub registered_events: usize,
    /// Registrations that replaced an earlier key
    pub overwritten: usize,
    /// Entries excluded by the filter
    pub skipped: usize,
}

/// Custom helpers and tags for one engine
#[derive(Debug, Clone)]
pub struct EngineOptions {
    pub template_type: TemplateType,
    pub helpers: Vec<(String, TemplateHelper)>,
    pub tags: Vec<(String, TemplateTag)>,
}

impl EngineOptions {
    pub fn new(template_type: TemplateType) -> Self {
        Self {
            template_type,
            helpers: Vec::new(),
            tags: Vec::new(),
        }
    }

    pub fn helper(mut self, name: impl Into<String>, helper: TemplateHelper) -> Self {
        self.helpers.push((name.into(), helper));
        self
    }

    pub fn tag(mut self, name: impl Into<String>, tag: TemplateTag) -> Self {
        self.tags.push((name.into(), tag));
        self
    }
}

/// Engine customizations applied before templates are registered
#[derive(Debug, Clone, Default)]
pub struct TemplatingOptions {
    pub engine_options: Vec<EngineOptions>,
}

/// Owns the pipelines sharing one engine registry
pub struct TemplateManager {
    registry: Arc<EngineRegistry>,
    cards: CardRenderer,
    events: EventTransformer,
}

impl TemplateManager {
    pub fn new(registry: Arc<EngineRegistry>) -> Self {
        Self {
            cards: CardRenderer::new(registry.clone()),
            events: EventTransformer::new(registry.clone()),
            registry,
        }
    }

    pub fn registry(&self) -> &Arc<EngineRegistry> {
        &self.registry
    }

    pub fn card_renderer(&self) -> &CardRenderer {
        &self.cards
    }

    pub fn event_transformer(&self) -> &EventTransformer {
        &self.events
    }

    /// Register custom helpers and tags on their engines.
    /// Tags on an engine without tag support fail with `Unsupported`.
    pub fn apply_options(&self, options: &TemplatingOptions) -> TemplateResult<()> {
        for engine_options in &options.engine_options {
            let engine = self.registry.engine(engine_options.template_type)?;

            for (name, helper) in &engine_options.helpers {
                engine.register_helper(name, helper.clone())?;
            }
            for (name, tag) in &engine_options.tags {
                engine.register_tag(name, tag.clone())?;
            }

            tracing::debug!(
                engine = %engine_options.template_type,
                helpers = engine_options.helpers.len(),
                tags = engine_options.tags.len(),
                "Custom templating options applied"
            );
        }
        Ok(())
    }

    /// Read the manifest at `manifest_path` and register every template it
    /// lists.
    pub async fn setup(
        &self,
        source: &dyn ContentSource,
        location: &SourceLocation,
        manifest_path: &str,
        options: &SetupOptions,
    ) -> TemplateResult<SetupReport> {
        tracing::info!(source = %source.describe(), manifest = %manifest_path, "Loading template manifest");

        let manifest_text = fetch_template(source, manifest_path).await?;
        let manifest = parse_manifest(&manifest_text)?;

        let total = manifest.len();
        let entries: Vec<ManifestEntry> = manifest
            .iter()
            .filter(|entry| options.filter.as_ref().map_or(true, |f| f.matches(entry)))
            .map(ConfigEntry::classify)
            .collect();

        let mut report = SetupReport {
            skipped: total - entries.len(),
            ..SetupReport::default()
        };

        // Check everything that can fail without I/O before fetching
        for entry in &entries {
            self.registry.engine(entry_template_type(entry))?;
        }
        if options.duplicate_keys == DuplicateKeyPolicy::Reject {
            reject_duplicates(&entries)?;
        }

        let fetches = entries.iter().map(|entry| {
            let path = self.entry_path(location, manifest_path, entry);
            async move { fetch_template(source, &path).await }
        });
        let texts = try_join_all(fetches).await?;

        for (entry, text) in entries.iter().zip(texts) {
            let overwritten = match entry {
                ManifestEntry::Card(card) => {
                    report.registered_cards += 1;
                    self.cards
                        .base()
                        .register_text(card.template_type, &card.key(), &text)?
                }
                ManifestEntry::Event(event) => {
                    report.registered_events += 1;
                    self.events
                        .base()
                        .register_text(event.template_type, &event.key(), &text)?
                }
            };
            if overwritten {
                report.overwritten += 1;
            }
        }

        tracing::info!(
            cards = report.registered_cards,
            events = report.registered_events,
            overwritten = report.overwritten,
            skipped = report.skipped,
            "Template setup complete"
        );

        Ok(report)
    }

    fn entry_path(&self, location: &SourceLocation, manifest_path: &str, entry: &ManifestEntry) -> String {
        match entry {
            ManifestEntry::Card(card) => self.cards.base().entry_path(location, manifest_path, card),
            ManifestEntry::Event(event) => {
                self.events.base().entry_path(location, manifest_path, event)
            }
        }
    }
}

/// Parse a manifest: a JSON array of config entries
pub fn parse_manifest(text: &str) -> TemplateResult<Vec<ConfigEntry>> {
    serde_json::from_str(text).map_err(|e| TemplateError::InvalidManifest(e.to_string()))
}

fn entry_template_type(entry: &ManifestEntry) -> TemplateType {
    match entry {
        ManifestEntry::Card(card) => card.template_type,
        ManifestEntry::Event(event) => event.template_type,
    }
}

fn reject_duplicates(entries: &[ManifestEntry]) -> TemplateResult<()> {
    let mut seen = HashSet::new();
    for entry in entries {
        let key = match entry {
            ManifestEntry::Card(card) => card.key(),
            ManifestEntry::Event(event) => event.key(),
        };
        if !seen.insert(key.clone()) {
            return Err(TemplateError::DuplicateTemplateKey(key));
        }
    }
    Ok(())
}
