//! Best-practice and naming suggestions.

use crate::core::{AnalysisContext, Finding, FindingType, Rule, RuleCategory, Severity};
use crate::impl_rule;
use serde_json::json;

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |v| v.trim().is_empty())
}

pub struct InterfaceDescriptionRule;

impl InterfaceDescriptionRule {
    pub fn new() -> Self {
        Self
    }

    fn evaluate_impl(&self, context: &AnalysisContext<'_>) -> Vec<Finding> {
        context
            .config()
            .interfaces
            .iter()
            .filter(|interface| is_blank(&interface.description))
            .map(|interface| {
                self.finding(context, format!("Interface {} has no description", interface.name))
                    .with_detail("interface", interface.name.as_str())
                    .with_recommendation("Describe what each interface connects to")
            })
            .collect()
    }
}

impl_rule!(
    InterfaceDescriptionRule,
    id: "interface-missing-description",
    name: "Interface Description",
    category: RuleCategory::BestPractice,
    finding_type: FindingType::BestPractice,
    severity: Severity::Low
);

pub struct VlanNameRule;

impl VlanNameRule {
    pub fn new() -> Self {
        Self
    }

    fn evaluate_impl(&self, context: &AnalysisContext<'_>) -> Vec<Finding> {
        context
            .config()
            .vlans_svis
            .iter()
            .filter(|vlan| is_blank(&vlan.name))
            .map(|vlan| {
                self.finding(context, format!("VLAN {} has no name", vlan.vlan_id))
                    .with_detail("vlanId", vlan.vlan_id)
                    .with_recommendation("Name every VLAN after its purpose")
            })
            .collect()
    }
}

impl_rule!(
    VlanNameRule,
    id: "vlan-missing-name",
    name: "VLAN Name",
    category: RuleCategory::BestPractice,
    finding_type: FindingType::BestPractice,
    severity: Severity::Low
);

/// Names that differ only in case or separators, e.g. `DATA`, `Data` and `da-ta`.
pub struct VlanNameConsistencyRule;

impl VlanNameConsistencyRule {
    pub fn new() -> Self {
        Self
    }

    fn fold(name: &str) -> String {
        name.chars()
            .filter(|c| !matches!(c, '-' | '_' | ' ' | '.'))
            .flat_map(char::to_lowercase)
            .collect()
    }

    fn evaluate_impl(&self, context: &AnalysisContext<'_>) -> Vec<Finding> {
        // folded name -> (spellings, vlan ids), in first-seen order
        let mut groups: Vec<(String, Vec<&str>, Vec<u16>)> = Vec::new();

        for vlan in &context.config().vlans_svis {
            let Some(name) = vlan.name.as_deref().filter(|n| !n.trim().is_empty()) else {
                continue;
            };
            let folded = Self::fold(name);
            match groups.iter_mut().find(|(key, _, _)| *key == folded) {
                Some((_, spellings, ids)) => {
                    if !spellings.contains(&name) {
                        spellings.push(name);
                    }
                    ids.push(vlan.vlan_id);
                }
                None => groups.push((folded, vec![name], vec![vlan.vlan_id])),
            }
        }

        groups
            .into_iter()
            .filter(|(_, spellings, _)| spellings.len() > 1)
            .map(|(_, spellings, ids)| {
                self.finding(
                    context,
                    format!("VLAN names {} differ only in case or separators", spellings.join(", ")),
                )
                .with_detail("names", json!(spellings))
                .with_detail("vlanIds", json!(ids))
                .with_recommendation("Pick one naming convention and apply it to every VLAN")
            })
            .collect()
    }
}

impl_rule!(
    VlanNameConsistencyRule,
    id: "vlan-name-inconsistent",
    name: "VLAN Naming Consistency",
    category: RuleCategory::BestPractice,
    finding_type: FindingType::Suggestion,
    severity: Severity::Info
);

pub struct VtpModeRule;

impl VtpModeRule {
    pub fn new() -> Self {
        Self
    }

    fn evaluate_impl(&self, context: &AnalysisContext<'_>) -> Vec<Finding> {
        let Some(mode) = context.config().other_services.vtp_mode.as_deref() else {
            return Vec::new();
        };
        if matches!(mode.to_ascii_lowercase().as_str(), "transparent" | "off") {
            return Vec::new();
        }
        vec![self
            .finding(context, format!("VTP mode is '{}'", mode))
            .with_detail("vtpMode", mode)
            .with_recommendation("Use VTP transparent or off so a stray switch cannot rewrite the VLAN database")]
    }
}

impl_rule!(
    VtpModeRule,
    id: "vtp-mode-not-transparent",
    name: "VTP Mode",
    category: RuleCategory::BestPractice,
    finding_type: FindingType::Suggestion,
    severity: Severity::Low
);

pub struct NtpRule;

impl Rule for NtpRule {
    fn id(&self) -> &'static str {
        "ntp-not-configured"
    }

    fn name(&self) -> &'static str {
        "NTP"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::BestPractice
    }

    fn finding_type(&self) -> FindingType {
        FindingType::BestPractice
    }

    fn severity(&self) -> Severity {
        Severity::Low
    }

    fn evaluate(&self, context: &AnalysisContext<'_>) -> Vec<Finding> {
        if !context.config().other_services.ntp_servers.is_empty() {
            return Vec::new();
        }
        vec![self
            .finding(context, "No NTP server is configured".to_string())
            .with_recommendation("Configure at least two NTP servers so logs carry accurate timestamps")]
    }
}

pub struct LoginBannerRule;

impl LoginBannerRule {
    pub fn new() -> Self {
        Self
    }

    fn evaluate_impl(&self, context: &AnalysisContext<'_>) -> Vec<Finding> {
        if context.config().security_features.login_banner == Some(true) {
            return Vec::new();
        }
        vec![self
            .finding(context, "No login banner is configured".to_string())
            .with_recommendation("Add a login banner warning against unauthorized access")]
    }
}

impl_rule!(
    LoginBannerRule,
    id: "login-banner-missing",
    name: "Login Banner",
    category: RuleCategory::BestPractice,
    finding_type: FindingType::BestPractice,
    severity: Severity::Low
);

pub struct CdpRule;

impl CdpRule {
    pub fn new() -> Self {
        Self
    }

    fn evaluate_impl(&self, context: &AnalysisContext<'_>) -> Vec<Finding> {
        if context.config().other_services.cdp_enabled != Some(true) {
            return Vec::new();
        }
        vec![self
            .finding(context, "CDP is enabled globally".to_string())
            .with_recommendation("Disable CDP globally or on interfaces facing untrusted networks")]
    }
}

impl_rule!(
    CdpRule,
    id: "cdp-enabled",
    name: "CDP",
    category: RuleCategory::BestPractice,
    finding_type: FindingType::Suggestion,
    severity: Severity::Low
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::EngineConfig;
    use crate::model::{CanonicalConfig, Interface, Vlan};

    fn run(rule: &dyn Rule, config: &CanonicalConfig) -> Vec<Finding> {
        let settings = EngineConfig::default();
        rule.evaluate(&AnalysisContext::new(config, &settings))
    }

    fn named_vlan(id: u16, name: &str) -> Vlan {
        let mut vlan = Vlan::new(id);
        vlan.name = Some(name.to_string());
        vlan
    }

    #[test]
    fn test_missing_descriptions_and_names() {
        let mut config = CanonicalConfig::default();
        let mut described = Interface::new("Gi0/1");
        described.description = Some("uplink".to_string());
        let mut blank = Interface::new("Gi0/2");
        blank.description = Some("  ".to_string());
        config.interfaces = vec![described, blank];
        config.vlans_svis = vec![named_vlan(10, "DATA"), Vlan::new(20)];

        let interfaces = run(&InterfaceDescriptionRule::new(), &config);
        assert_eq!(interfaces.len(), 1);
        assert_eq!(interfaces[0].detail_str("interface"), Some("Gi0/2"));

        let vlans = run(&VlanNameRule::new(), &config);
        assert_eq!(vlans.len(), 1);
        assert_eq!(vlans[0].details["vlanId"], json!(20));
    }

    #[test]
    fn test_near_duplicate_vlan_names_are_a_suggestion() {
        let mut config = CanonicalConfig::default();
        config.vlans_svis = vec![
            named_vlan(10, "DATA"),
            named_vlan(11, "Data"),
            named_vlan(12, "VOICE"),
            named_vlan(13, "voice_"),
        ];

        let findings = run(&VlanNameConsistencyRule::new(), &config);
        assert_eq!(findings.len(), 2);
        assert!(findings.iter().all(|f| f.finding_type == FindingType::Suggestion));
        assert_eq!(findings[0].details["names"], json!(["DATA", "Data"]));
        assert_eq!(findings[0].details["vlanIds"], json!([10, 11]));
    }

    #[test]
    fn test_vtp_mode() {
        let mut config = CanonicalConfig::default();
        assert!(run(&VtpModeRule::new(), &config).is_empty());

        config.other_services.vtp_mode = Some("transparent".to_string());
        assert!(run(&VtpModeRule::new(), &config).is_empty());

        config.other_services.vtp_mode = Some("server".to_string());
        let findings = run(&VtpModeRule::new(), &config);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].finding_type, FindingType::Suggestion);
    }

    #[test]
    fn test_services() {
        let mut config = CanonicalConfig::default();
        assert_eq!(run(&NtpRule, &config).len(), 1);
        assert_eq!(run(&LoginBannerRule::new(), &config).len(), 1);
        assert!(run(&CdpRule::new(), &config).is_empty());

        config.other_services.ntp_servers.insert("10.0.0.1".to_string());
        config.security_features.login_banner = Some(true);
        config.other_services.cdp_enabled = Some(true);
        assert!(run(&NtpRule, &config).is_empty());
        assert!(run(&LoginBannerRule::new(), &config).is_empty());
        assert_eq!(run(&CdpRule::new(), &config).len(), 1);
    }
}
