//! Gating configuration.
//!
//! [`GatingSettings`] is what operators write. [`ConfigSnapshot`] is what the
//! engine evaluates against: one immutable value per adapter invocation, so
//! "is it enabled" and "which tag" can never come from different versions.

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ConfigError;

fn default_tag_name() -> String {
    "nsfw".to_string()
}

fn default_true() -> bool {
    true
}

/// Operator-facing settings, as stored in the host configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatingSettings {
    #[serde(default)]
    pub enabled: bool,

    /// Tag whose presence gates a content item.
    #[serde(default = "default_tag_name")]
    pub tag_name: String,

    /// Attribute a viewer must carry. Accepts `7` or `"7"`.
    #[serde(default, deserialize_with = "deserialize_attribute_id")]
    pub required_attribute_id: Option<String>,

    /// Value the attribute must hold (compared against `"true"`/`"false"`).
    #[serde(default = "default_true")]
    pub required_attribute_value: bool,
}

impl Default for GatingSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            tag_name: default_tag_name(),
            required_attribute_id: None,
            required_attribute_value: true,
        }
    }
}

impl GatingSettings {
    /// Settings with gating switched on.
    pub fn enforced(
        tag_name: impl Into<String>,
        attribute_id: impl Into<String>,
        required_value: bool,
    ) -> Self {
        Self {
            enabled: true,
            tag_name: tag_name.into(),
            required_attribute_id: Some(attribute_id.into()),
            required_attribute_value: required_value,
        }
    }

    /// Validate the settings into an enforceable rule.
    ///
    /// Only meaningful when `enabled`; disabled settings are never validated.
    pub fn validate(&self) -> Result<GatingRule, ConfigError> {
        let tag_name = self.tag_name.trim();
        if tag_name.is_empty() {
            return Err(ConfigError::MissingTagName);
        }

        let attribute_id = self
            .required_attribute_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or(ConfigError::MissingAttributeId)?;

        if attribute_id.chars().any(char::is_whitespace) {
            return Err(ConfigError::Malformed(format!(
                "attribute id {attribute_id:?} contains whitespace"
            )));
        }

        Ok(GatingRule {
            tag_name: tag_name.to_string(),
            attribute_id: attribute_id.to_string(),
            required_value: self.required_attribute_value,
        })
    }

    /// Resolve into a snapshot, reporting why enforcement was dropped.
    ///
    /// Invalid settings resolve to `Disabled` together with the error, so
    /// every surface falls back the same way.
    pub fn resolve(&self) -> (ConfigSnapshot, Option<ConfigError>) {
        if !self.enabled {
            return (ConfigSnapshot::Disabled, None);
        }
        match self.validate() {
            Ok(rule) => (ConfigSnapshot::Enforced(rule), None),
            Err(e) => (ConfigSnapshot::Disabled, Some(e)),
        }
    }
}

/// A validated gating rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GatingRule {
    pub tag_name: String,
    pub attribute_id: String,
    pub required_value: bool,
}

impl GatingRule {
    /// The attribute string that grants entitlement.
    pub fn required_value_str(&self) -> &'static str {
        if self.required_value {
            "true"
        } else {
            "false"
        }
    }
}

/// Immutable view of the configuration for one evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "rule", rename_all = "snake_case")]
pub enum ConfigSnapshot {
    Disabled,
    Enforced(GatingRule),
}

impl ConfigSnapshot {
    pub fn rule(&self) -> Option<&GatingRule> {
        match self {
            ConfigSnapshot::Disabled => None,
            ConfigSnapshot::Enforced(rule) => Some(rule),
        }
    }

    pub fn is_enforced(&self) -> bool {
        matches!(self, ConfigSnapshot::Enforced(_))
    }
}

fn deserialize_attribute_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(i64),
    }

    Ok(Option::<Raw>::deserialize(deserializer)?.map(|raw| match raw {
        Raw::Text(s) => s,
        Raw::Number(n) => n.to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_disabled() {
        let settings = GatingSettings::default();
        assert!(!settings.enabled);
        assert_eq!(settings.tag_name, "nsfw");
        assert_eq!(settings.resolve(), (ConfigSnapshot::Disabled, None));
    }

    #[test]
    fn enforced_settings_resolve_to_rule() {
        let settings = GatingSettings::enforced("restricted", "7", true);
        let (snapshot, err) = settings.resolve();
        assert!(err.is_none());
        let rule = snapshot.rule().unwrap();
        assert_eq!(rule.tag_name, "restricted");
        assert_eq!(rule.attribute_id, "7");
        assert_eq!(rule.required_value_str(), "true");
    }

    #[test]
    fn missing_attribute_id_fails_closed_to_disabled() {
        let settings = GatingSettings {
            enabled: true,
            ..GatingSettings::default()
        };
        let (snapshot, err) = settings.resolve();
        assert_eq!(snapshot, ConfigSnapshot::Disabled);
        assert!(matches!(err, Some(ConfigError::MissingAttributeId)));
    }

    #[test]
    fn blank_tag_name_fails_closed_to_disabled() {
        let mut settings = GatingSettings::enforced("  ", "7", true);
        let (snapshot, err) = settings.resolve();
        assert_eq!(snapshot, ConfigSnapshot::Disabled);
        assert!(matches!(err, Some(ConfigError::MissingTagName)));

        settings.tag_name = " restricted ".into();
        assert_eq!(settings.validate().unwrap().tag_name, "restricted");
    }

    #[test]
    fn disabled_settings_are_not_validated() {
        let settings = GatingSettings {
            enabled: false,
            tag_name: String::new(),
            required_attribute_id: None,
            required_attribute_value: true,
        };
        assert_eq!(settings.resolve(), (ConfigSnapshot::Disabled, None));
    }

    #[test]
    fn attribute_id_accepts_integer_or_string() {
        let from_int: GatingSettings =
            toml::from_str("enabled = true\nrequired_attribute_id = 7\n").unwrap();
        let from_str: GatingSettings =
            toml::from_str("enabled = true\nrequired_attribute_id = \"7\"\n").unwrap();
        assert_eq!(from_int.required_attribute_id.as_deref(), Some("7"));
        assert_eq!(from_int, from_str);
        assert!(from_int.required_attribute_value);
    }

    #[test]
    fn false_truth_value() {
        let rule = GatingSettings::enforced("restricted", "7", false)
            .validate()
            .unwrap();
        assert_eq!(rule.required_value_str(), "false");
    }
}
