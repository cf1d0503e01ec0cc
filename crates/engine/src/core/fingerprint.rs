//! Finding fingerprints for deduplication.
//!
//! Two findings are duplicates when their type, description and set of involved devices are
//! identical. The rule that produced them and their details do not participate.

use crate::core::{Finding, FindingType};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FindingFingerprint {
    finding_type: FindingType,
    description: String,
    devices: Vec<String>,
}

impl FindingFingerprint {
    pub fn from_finding(finding: &Finding) -> Self {
        Self {
            finding_type: finding.finding_type,
            description: finding.description.clone(),
            devices: finding.devices_involved.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeduplicationStats {
    pub original_count: usize,
    pub deduped_count: usize,
    pub removed_count: usize,
}

impl DeduplicationStats {
    pub fn reduction_percentage(&self) -> f64 {
        if self.original_count == 0 {
            0.0
        } else {
            (self.removed_count as f64 / self.original_count as f64) * 100.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{RuleCategory, Severity};

    fn finding(rule: &str, description: &str, device: &str) -> Finding {
        Finding::new(
            rule,
            RuleCategory::Security,
            FindingType::SecurityRisk,
            Severity::High,
            description.to_string(),
        )
        .with_device(device)
    }

    #[test]
    fn test_same_tuple_same_fingerprint() {
        let a = finding("rule-a", "Telnet is enabled", "SW1");
        let b = finding("rule-b", "Telnet is enabled", "SW1").with_detail("extra", 1);
        assert_eq!(
            FindingFingerprint::from_finding(&a),
            FindingFingerprint::from_finding(&b)
        );
    }

    #[test]
    fn test_device_changes_fingerprint() {
        let a = finding("rule-a", "Telnet is enabled", "SW1");
        let b = finding("rule-a", "Telnet is enabled", "SW2");
        assert_ne!(
            FindingFingerprint::from_finding(&a),
            FindingFingerprint::from_finding(&b)
        );
    }

    #[test]
    fn test_reduction_percentage() {
        let stats = DeduplicationStats {
            original_count: 4,
            deduped_count: 3,
            removed_count: 1,
        };
        assert_eq!(stats.reduction_percentage(), 25.0);
        assert_eq!(DeduplicationStats::default().reduction_percentage(), 0.0);
    }
}
