use crate::core::Severity;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_parallel_execution")]
    pub parallel_execution: bool,

    #[serde(default = "default_deduplication_enabled")]
    pub deduplication_enabled: bool,

    #[serde(default)]
    pub disabled_rules: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_severity: Option<Severity>,

    /// Community strings treated as default or well known.
    #[serde(default = "default_weak_snmp_communities")]
    pub weak_snmp_communities: Vec<String>,
}

fn default_parallel_execution() -> bool {
    true
}
fn default_deduplication_enabled() -> bool {
    true
}
fn default_weak_snmp_communities() -> Vec<String> {
    [
        "public", "private", "cisco", "community", "snmp", "admin", "default", "secret",
        "manager", "monitor", "read", "write", "test",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            parallel_execution: default_parallel_execution(),
            deduplication_enabled: default_deduplication_enabled(),
            disabled_rules: Vec::new(),
            min_severity: None,
            weak_snmp_communities: default_weak_snmp_communities(),
        }
    }
}

impl EngineConfig {
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read engine config: {}", path.display()))?;
        let config: Self = serde_yaml::from_str(&content)
            .with_context(|| format!("Invalid YAML engine config: {}", path.display()))?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read engine config: {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Invalid JSON engine config: {}", path.display()))?;
        Ok(config)
    }

    /// Loads YAML or JSON depending on the file extension.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_file(path),
            _ => Self::from_yaml_file(path),
        }
    }

    pub fn with_env_overrides(mut self) -> Result<Self> {
        if let Ok(parallel) = std::env::var("NETAUDIT_PARALLEL") {
            self.parallel_execution = parse_bool(&parallel)
                .with_context(|| format!("NETAUDIT_PARALLEL has invalid value '{}'", parallel))?;
        }

        if let Ok(rules) = std::env::var("NETAUDIT_DISABLED_RULES") {
            self.disabled_rules = rules
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        if let Ok(severity) = std::env::var("NETAUDIT_MIN_SEVERITY") {
            let parsed = severity
                .parse::<Severity>()
                .map_err(anyhow::Error::msg)
                .context("NETAUDIT_MIN_SEVERITY")?;
            self.min_severity = Some(parsed);
        }

        Ok(self)
    }

    pub fn save_yaml(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn is_rule_enabled(&self, rule_id: &str) -> bool {
        !self.disabled_rules.iter().any(|r| r == rule_id)
    }

    pub fn meets_min_severity(&self, severity: Severity) -> bool {
        self.min_severity.map_or(true, |min| severity >= min)
    }

    pub fn is_weak_community(&self, community: &str) -> bool {
        self.weak_snmp_communities
            .iter()
            .any(|weak| weak.eq_ignore_ascii_case(community))
    }
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => anyhow::bail!("expected a boolean, got '{}'", other),
    }
}

pub const EXAMPLE_CONFIG: &str = r#"
# netaudit engine configuration

parallel_execution: true
deduplication_enabled: true

# Rules listed here are skipped entirely
disabled_rules:
  - cdp-enabled

# Findings below this severity are dropped from reports
min_severity: low

weak_snmp_communities:
  - public
  - private
  - cisco
"#;
