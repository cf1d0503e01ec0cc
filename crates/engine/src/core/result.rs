use crate::core::{FindingType, RuleCategory, Severity};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single detected issue, produced fresh for each analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Finding {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub id: Option<String>,

    pub rule_id: String,

    pub category: RuleCategory,

    #[serde(rename = "type")]
    pub finding_type: FindingType,

    pub severity: Severity,

    pub description: String,

    pub devices_involved: Vec<String>,

    #[serde(default)]
    pub details: Map<String, Value>,

    pub recommendation: String,
}

impl Finding {
    pub fn new(
        rule_id: &str,
        category: RuleCategory,
        finding_type: FindingType,
        severity: Severity,
        description: String,
    ) -> Self {
        Self {
            id: None,
            rule_id: rule_id.to_string(),
            category,
            finding_type,
            severity,
            description,
            devices_involved: Vec::new(),
            details: Map::new(),
            recommendation: String::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_device(mut self, device: &str) -> Self {
        if !self.devices_involved.iter().any(|d| d == device) {
            self.devices_involved.push(device.to_string());
        }
        self
    }

    pub fn with_detail(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.details.insert(key.to_string(), value.into());
        self
    }

    pub fn with_recommendation(mut self, recommendation: impl Into<String>) -> Self {
        self.recommendation = recommendation.into();
        self
    }

    pub fn detail_str(&self, key: &str) -> Option<&str> {
        self.details.get(key).and_then(Value::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_collects_devices_once() {
        let finding = Finding::new(
            "test-rule",
            RuleCategory::Security,
            FindingType::SecurityRisk,
            Severity::High,
            "something is off".to_string(),
        )
        .with_device("SW1")
        .with_device("SW1")
        .with_detail("interface", "Gi0/1")
        .with_recommendation("fix it");

        assert_eq!(finding.devices_involved, vec!["SW1".to_string()]);
        assert_eq!(finding.detail_str("interface"), Some("Gi0/1"));
        assert!(finding.id.is_none());
    }

    #[test]
    fn test_serializes_type_field() {
        let finding = Finding::new(
            "x",
            RuleCategory::Conflict,
            FindingType::Conflict,
            Severity::Medium,
            "d".to_string(),
        );
        let json = serde_json::to_value(&finding).unwrap();
        assert_eq!(json["type"], "Conflict");
        assert_eq!(json["severity"], "medium");
        assert!(json.get("id").is_none());
    }
}
