use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Originating event kind, e.g. `PullRequest_Opened`. Not validated.
pub type SourceType = String;

/// Template engine backend a template is written for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateType {
    /// Handlebars templates (helpers only)
    #[serde(alias = "HandleBars", alias = "Handlebars")]
    Handlebars,
    /// Liquid templates (filters and custom tags)
    #[serde(alias = "Liquid")]
    Liquid,
}

impl TemplateType {
    pub fn all() -> &'static [TemplateType] {
        &[TemplateType::Handlebars, TemplateType::Liquid]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateType::Handlebars => "handlebars",
            TemplateType::Liquid => "liquid",
        }
    }
}

impl fmt::Display for TemplateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TemplateType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "handlebars" | "hbs" => Ok(TemplateType::Handlebars),
            "liquid" => Ok(TemplateType::Liquid),
            _ => Err(UnknownVariant {
                kind: "template type",
                value: s.to_string(),
            }),
        }
    }
}

/// Messaging surface a card is rendered for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClientType {
    Slack,
    Teams,
}

impl ClientType {
    pub fn all() -> &'static [ClientType] {
        &[ClientType::Slack, ClientType::Teams]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ClientType::Slack => "slack",
            ClientType::Teams => "teams",
        }
    }
}

impl fmt::Display for ClientType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClientType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "slack" => Ok(ClientType::Slack),
            "teams" | "msteams" => Ok(ClientType::Teams),
            _ => Err(UnknownVariant {
                kind: "client type",
                value: s.to_string(),
            }),
        }
    }
}

/// Optional extension points an engine may or may not offer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Custom helper functions / filters
    Helpers,
    /// Custom block tags / extensions
    Tags,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capability::Helpers => f.write_str("custom helpers"),
            Capability::Tags => f.write_str("custom tags"),
        }
    }
}

/// Returned when a string does not name a known enumerant
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind}: '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_type_from_str() {
        assert_eq!("handlebars".parse::<TemplateType>().unwrap(), TemplateType::Handlebars);
        assert_eq!("HandleBars".parse::<TemplateType>().unwrap(), TemplateType::Handlebars);
        assert_eq!(" Liquid ".parse::<TemplateType>().unwrap(), TemplateType::Liquid);
        assert!("tera".parse::<TemplateType>().is_err());
    }

    #[test]
    fn test_client_type_from_str() {
        assert_eq!("slack".parse::<ClientType>().unwrap(), ClientType::Slack);
        assert_eq!("Teams".parse::<ClientType>().unwrap(), ClientType::Teams);

        let err = "discord".parse::<ClientType>().unwrap_err();
        assert_eq!(err.to_string(), "unknown client type: 'discord'");
    }

    #[test]
    fn test_serde_lowercase() {
        let json = serde_json::to_string(&TemplateType::Handlebars).unwrap();
        assert_eq!(json, "\"handlebars\"");

        let liquid: TemplateType = serde_json::from_str("\"liquid\"").unwrap();
        assert_eq!(liquid, TemplateType::Liquid);

        let client: ClientType = serde_json::from_str("\"teams\"").unwrap();
        assert_eq!(client, ClientType::Teams);
    }

    #[test]
    fn test_serde_accepts_manifest_spelling() {
        let handlebars: TemplateType = serde_json::from_str("\"HandleBars\"").unwrap();
        assert_eq!(handlebars, TemplateType::Handlebars);

        let liquid: TemplateType = serde_json::from_str("\"Liquid\"").unwrap();
        assert_eq!(liquid, TemplateType::Liquid);
    }

    #[test]
    fn test_display_matches_as_str() {
        for t in TemplateType::all() {
            assert_eq!(t.to_string(), t.as_str());
        }
        for c in ClientType::all() {
            assert_eq!(c.to_string(), c.as_str());
        }
    }
}
