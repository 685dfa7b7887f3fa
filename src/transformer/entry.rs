use serde::{Deserialize, Serialize};

use crate::template::{ClientType, SourceType, TemplateType};

/// A manifest record. Entries with a client type register card templates,
/// entries without one register event templates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ConfigEntry {
    pub template_type: TemplateType,
    pub source_type: SourceType,
    pub template_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_type: Option<ClientType>,
}

/// A manifest record routed to its pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestEntry {
    Card(CardConfigEntry),
    Event(EventConfigEntry),
}

impl ConfigEntry {
    pub fn classify(&self) -> ManifestEntry {
        match self.client_type {
            Some(client_type) => ManifestEntry::Card(CardConfigEntry {
                template_type: self.template_type,
                source_type: self.source_type.clone(),
                template_name: self.template_name.clone(),
                client_type,
            }),
            None => ManifestEntry::Event(EventConfigEntry {
                template_type: self.template_type,
                source_type: self.source_type.clone(),
                template_name: self.template_name.clone(),
            }),
        }
    }
}

/// Card template registration details
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardConfigEntry {
    pub template_type: TemplateType,
    pub source_type: SourceType,
    pub template_name: String,
    pub client_type: ClientType,
}

/// Event template registration details
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventConfigEntry {
    pub template_type: TemplateType,
    pub source_type: SourceType,
    pub template_name: String,
}
