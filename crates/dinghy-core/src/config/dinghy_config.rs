//! Configuration types

use crate::error::{DinghyError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Rule severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleSeverity {
    /// Disable the rule
    Off,
    Info,
    Warn,
    Error,
}

/// Top-level configuration file contents
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DinghyConfig {
    /// Per-rule severity overrides keyed by rule id
    pub rules: HashMap<String, RuleSeverity>,

    /// When set, only these rule ids run
    #[serde(skip_serializing_if = "Option::is_none")]
    pub only: Option<Vec<String>>,
}

impl DinghyConfig {
    /// Parse a configuration file, choosing the format by extension
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| DinghyError::io_error(path, e))?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml(&content),
            _ => Self::from_json(&content),
        }
    }

    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content)
            .map_err(|e| DinghyError::config_error(format!("Invalid JSON config: {e}")))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| DinghyError::config_error(format!("Invalid TOML config: {e}")))
    }

    /// Configured override for a rule, if any
    pub fn severity_for(&self, rule_id: &str) -> Option<RuleSeverity> {
        self.rules.get(rule_id).copied()
    }

    /// Whether a rule survives the `only` allow-list and is not switched off
    pub fn is_enabled(&self, rule_id: &str) -> bool {
        let allowed = self
            .only
            .as_ref()
            .is_none_or(|only| only.iter().any(|id| id == rule_id));
        allowed && self.severity_for(rule_id) != Some(RuleSeverity::Off)
    }

    /// Every rule id the file mentions
    pub fn referenced_rules(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.rules.keys().map(String::as_str).collect();
        if let Some(only) = &self.only {
            ids.extend(only.iter().map(String::as_str));
        }
        ids.sort_unstable();
        ids.dedup();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_severity_serialization() {
        assert_eq!(serde_json::to_string(&RuleSeverity::Warn).unwrap(), r#""warn""#);
        assert_eq!(serde_json::to_string(&RuleSeverity::Off).unwrap(), r#""off""#);
    }

    #[test]
    fn test_json_config() {
        let config = DinghyConfig::from_json(
            r#"{"rules": {"curlUseFlagF": "off", "aptGetInstallUseY": "error"}}"#,
        )
        .unwrap();
        assert!(!config.is_enabled("curlUseFlagF"));
        assert!(config.is_enabled("aptGetInstallUseY"));
        assert!(config.is_enabled("gpgUseBatchFlag"));
        assert_eq!(config.severity_for("aptGetInstallUseY"), Some(RuleSeverity::Error));
    }

    #[test]
    fn test_toml_only_list() {
        let config = DinghyConfig::from_toml(
            r#"
only = ["pipUseNoCacheDir"]

[rules]
pipUseNoCacheDir = "info"
"#,
        )
        .unwrap();
        assert!(config.is_enabled("pipUseNoCacheDir"));
        assert!(!config.is_enabled("curlUseFlagF"));
        assert_eq!(config.referenced_rules(), vec!["pipUseNoCacheDir"]);
    }

    #[test]
    fn test_invalid_severity_is_config_error() {
        let err = DinghyConfig::from_json(r#"{"rules": {"x": "loud"}}"#).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Config);
    }
}
