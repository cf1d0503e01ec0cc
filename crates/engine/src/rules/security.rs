//! Security hardening checks.

use crate::core::{AnalysisContext, Finding, FindingType, Rule, RuleCategory, Severity};
use crate::impl_rule;
use crate::model::{AclAction, EnableCredential, SnmpAccess};
use serde_json::{json, Value};

fn flag_value(flag: Option<bool>) -> Value {
    flag.map_or(Value::Null, Value::Bool)
}

pub struct PasswordEncryptionRule;

impl PasswordEncryptionRule {
    pub fn new() -> Self {
        Self
    }

    fn evaluate_impl(&self, context: &AnalysisContext<'_>) -> Vec<Finding> {
        let enabled = context.config().security_features.password_encryption_enabled;
        let description = match enabled {
            Some(true) => return Vec::new(),
            Some(false) => "Password encryption is explicitly disabled",
            None => "Password encryption is not enabled",
        };

        vec![self
            .finding(context, description.to_string())
            .with_detail("passwordEncryptionEnabled", flag_value(enabled))
            .with_recommendation(
                "Enable `service password-encryption` (or the vendor equivalent) so passwords are not stored in clear text",
            )]
    }
}

impl_rule!(
    PasswordEncryptionRule,
    id: "password-encryption-disabled",
    name: "Password Encryption",
    category: RuleCategory::Security,
    finding_type: FindingType::SecurityRisk,
    severity: Severity::High,
    description: "Flags configurations that store passwords without encryption"
);

pub struct SnmpDefaultCommunityRule;

impl SnmpDefaultCommunityRule {
    pub fn new() -> Self {
        Self
    }

    fn evaluate_impl(&self, context: &AnalysisContext<'_>) -> Vec<Finding> {
        context
            .config()
            .security_features
            .snmp_configs
            .iter()
            .filter_map(|snmp| {
                let community = snmp.community.as_deref()?;
                if !context.settings().is_weak_community(community) {
                    return None;
                }
                Some(
                    self.finding(
                        context,
                        format!("SNMP community '{}' is a well-known default", community),
                    )
                    .with_detail("community", community)
                    .with_recommendation(
                        "Replace the community with a long random string or migrate to SNMPv3",
                    ),
                )
            })
            .collect()
    }
}

impl_rule!(
    SnmpDefaultCommunityRule,
    id: "snmp-default-community",
    name: "SNMP Default Community",
    category: RuleCategory::Security,
    finding_type: FindingType::SecurityRisk,
    severity: Severity::Critical,
    description: "Detects SNMP communities that attackers guess first"
);

pub struct SnmpWriteCommunityRule;

impl SnmpWriteCommunityRule {
    pub fn new() -> Self {
        Self
    }

    fn evaluate_impl(&self, context: &AnalysisContext<'_>) -> Vec<Finding> {
        context
            .config()
            .security_features
            .snmp_configs
            .iter()
            .filter(|snmp| snmp.access == Some(SnmpAccess::ReadWrite))
            .filter_map(|snmp| {
                let community = snmp.community.as_deref()?;
                Some(
                    self.finding(
                        context,
                        format!("SNMP community '{}' grants write access", community),
                    )
                    .with_detail("community", community)
                    .with_detail("access", "read-write")
                    .with_recommendation("Use read-only communities; manage writes through SSH or SNMPv3 with authPriv"),
                )
            })
            .collect()
    }
}

impl_rule!(
    SnmpWriteCommunityRule,
    id: "snmp-write-community",
    name: "SNMP Write Community",
    category: RuleCategory::Security,
    finding_type: FindingType::SecurityRisk,
    severity: Severity::High
);

pub struct SnmpCommunityWithoutAclRule;

impl SnmpCommunityWithoutAclRule {
    pub fn new() -> Self {
        Self
    }

    fn evaluate_impl(&self, context: &AnalysisContext<'_>) -> Vec<Finding> {
        context
            .config()
            .security_features
            .snmp_configs
            .iter()
            .filter(|snmp| snmp.acl.is_none())
            .filter_map(|snmp| {
                let community = snmp.community.as_deref()?;
                Some(
                    self.finding(
                        context,
                        format!("SNMP community '{}' is not restricted by an access list", community),
                    )
                    .with_detail("community", community)
                    .with_recommendation("Bind the community to an ACL that only admits the management stations"),
                )
            })
            .collect()
    }
}

impl_rule!(
    SnmpCommunityWithoutAclRule,
    id: "snmp-community-without-acl",
    name: "SNMP Community Without ACL",
    category: RuleCategory::Security,
    finding_type: FindingType::SecurityRisk,
    severity: Severity::Low
);

/// The HTTP server counts as disabled only when a line says so.
pub struct HttpServerRule;

impl HttpServerRule {
    pub fn new() -> Self {
        Self
    }

    fn evaluate_impl(&self, context: &AnalysisContext<'_>) -> Vec<Finding> {
        let security = &context.config().security_features;
        let description = match security.http_server_disabled {
            Some(true) => return Vec::new(),
            Some(false) => "HTTP management server is enabled",
            None => "HTTP management server is not explicitly disabled",
        };

        vec![self
            .finding(context, description.to_string())
            .with_detail("httpServerDisabled", flag_value(security.http_server_disabled))
            .with_detail("httpsServerEnabled", flag_value(security.https_server_enabled))
            .with_recommendation("Disable the plain HTTP server (`no ip http server`); use HTTPS or SSH for management")]
    }
}

impl_rule!(
    HttpServerRule,
    id: "http-server-not-disabled",
    name: "HTTP Server",
    category: RuleCategory::Security,
    finding_type: FindingType::SecurityRisk,
    severity: Severity::Medium,
    description: "Flags devices whose clear-text HTTP management server is enabled or unknown"
);

/// Access ports need port-security and BPDU protection. BPDU protection comes either from
/// the port itself or from the global portfast default on a portfast port.
pub struct AccessPortProtectionRule;

impl AccessPortProtectionRule {
    pub fn new() -> Self {
        Self
    }

    fn evaluate_impl(&self, context: &AnalysisContext<'_>) -> Vec<Finding> {
        let config = context.config();
        let guard_default = config.security_features.bpdu_guard_default == Some(true);

        config
            .interfaces
            .iter()
            .filter(|interface| interface.is_access_port())
            .filter_map(|interface| {
                let mut missing = Vec::new();
                if interface.port_security != Some(true) {
                    missing.push("port-security");
                }
                let bpdu_protected = match interface.bpdu_guard {
                    Some(explicit) => explicit,
                    None => guard_default && interface.portfast == Some(true),
                };
                if !bpdu_protected {
                    missing.push("bpdu-guard");
                }
                if missing.is_empty() {
                    return None;
                }

                Some(
                    self.finding(
                        context,
                        format!(
                            "Access port {} lacks {}",
                            interface.name,
                            missing.join(" and ")
                        ),
                    )
                    .with_detail("interface", interface.name.as_str())
                    .with_detail("missing", json!(missing))
                    .with_recommendation(
                        "Enable port-security and BPDU guard on every access port facing end hosts",
                    ),
                )
            })
            .collect()
    }
}

impl_rule!(
    AccessPortProtectionRule,
    id: "access-port-unprotected",
    name: "Access Port Protection",
    category: RuleCategory::Security,
    finding_type: FindingType::SecurityRisk,
    severity: Severity::Medium
);

pub struct TelnetRule;

impl Rule for TelnetRule {
    fn id(&self) -> &'static str {
        "telnet-enabled"
    }

    fn name(&self) -> &'static str {
        "Telnet Access"
    }

    fn description(&self) -> &'static str {
        "Detects management lines that accept clear-text Telnet"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Security
    }

    fn finding_type(&self) -> FindingType {
        FindingType::SecurityRisk
    }

    fn severity(&self) -> Severity {
        Severity::High
    }

    fn evaluate(&self, context: &AnalysisContext<'_>) -> Vec<Finding> {
        if context.config().security_features.telnet_enabled != Some(true) {
            return Vec::new();
        }
        vec![self
            .finding(context, "Telnet is accepted for remote management".to_string())
            .with_recommendation("Restrict remote access to SSH (`transport input ssh`)")]
    }
}

pub struct SshRule;

impl Rule for SshRule {
    fn id(&self) -> &'static str {
        "ssh-not-configured"
    }

    fn name(&self) -> &'static str {
        "SSH Configuration"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Security
    }

    fn finding_type(&self) -> FindingType {
        FindingType::SecurityRisk
    }

    fn severity(&self) -> Severity {
        Severity::Medium
    }

    fn evaluate(&self, context: &AnalysisContext<'_>) -> Vec<Finding> {
        if context.config().security_features.ssh_configured == Some(true) {
            return Vec::new();
        }
        vec![self
            .finding(context, "SSH is not configured for remote management".to_string())
            .with_recommendation("Generate host keys and enable SSH version 2")]
    }
}

pub struct AaaRule;

impl AaaRule {
    pub fn new() -> Self {
        Self
    }

    fn evaluate_impl(&self, context: &AnalysisContext<'_>) -> Vec<Finding> {
        if context.config().security_features.aaa_configured == Some(true) {
            return Vec::new();
        }
        vec![self
            .finding(context, "AAA is not configured".to_string())
            .with_recommendation("Enable AAA with a central RADIUS or TACACS+ server and a local fallback")]
    }
}

impl_rule!(
    AaaRule,
    id: "aaa-not-configured",
    name: "AAA",
    category: RuleCategory::Security,
    finding_type: FindingType::SecurityRisk,
    severity: Severity::Medium
);

pub struct EnablePasswordRule;

impl EnablePasswordRule {
    pub fn new() -> Self {
        Self
    }

    fn evaluate_impl(&self, context: &AnalysisContext<'_>) -> Vec<Finding> {
        if context.config().security_features.enable_credential != Some(EnableCredential::Password) {
            return Vec::new();
        }
        vec![self
            .finding(context, "Privileged access uses `enable password` instead of `enable secret`".to_string())
            .with_recommendation("Replace `enable password` with `enable secret`, which is stored as a hash")]
    }
}

impl_rule!(
    EnablePasswordRule,
    id: "enable-password-weak",
    name: "Enable Password",
    category: RuleCategory::Security,
    finding_type: FindingType::SecurityRisk,
    severity: Severity::High
);

pub struct AclPermitAnyRule;

impl AclPermitAnyRule {
    pub fn new() -> Self {
        Self
    }

    /// `permit any` or `permit <protocol> any any` with no further qualifiers.
    fn is_permit_any(text: &str) -> bool {
        let tokens: Vec<&str> = text.split_whitespace().collect();
        match tokens.as_slice() {
            ["permit", "any"] => true,
            ["permit", _, "any", "any"] => true,
            _ => false,
        }
    }

    fn evaluate_impl(&self, context: &AnalysisContext<'_>) -> Vec<Finding> {
        let mut findings = Vec::new();

        for acl in &context.config().security_features.acls {
            let offending: Vec<&str> = acl
                .entries
                .iter()
                .filter(|entry| entry.action == AclAction::Permit && Self::is_permit_any(&entry.text))
                .map(|entry| entry.text.as_str())
                .collect();
            if offending.is_empty() {
                continue;
            }

            findings.push(
                self.finding(context, format!("ACL {} permits any traffic", acl.name))
                    .with_detail("acl", acl.name.as_str())
                    .with_detail("entries", json!(offending))
                    .with_recommendation("Replace catch-all permits with explicit source and destination matches"),
            );
        }

        findings
    }
}

impl_rule!(
    AclPermitAnyRule,
    id: "acl-permit-any",
    name: "ACL Permit Any",
    category: RuleCategory::Security,
    finding_type: FindingType::SecurityRisk,
    severity: Severity::Medium
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::EngineConfig;
    use crate::model::{Acl, AclEntry, CanonicalConfig, Interface, SnmpConfig, SwitchportMode};

    fn run(rule: &dyn Rule, config: &CanonicalConfig) -> Vec<Finding> {
        let settings = EngineConfig::default();
        rule.evaluate(&AnalysisContext::new(config, &settings))
    }

    #[test]
    fn test_password_encryption_toggle() {
        let mut config = CanonicalConfig::default();
        let findings = run(&PasswordEncryptionRule::new(), &config);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::High);
        assert_eq!(findings[0].finding_type, FindingType::SecurityRisk);

        config.security_features.password_encryption_enabled = Some(true);
        assert!(run(&PasswordEncryptionRule::new(), &config).is_empty());
    }

    #[test]
    fn test_snmp_rules() {
        let mut config = CanonicalConfig::default();
        config.security_features.snmp_configs.push(SnmpConfig {
            community: Some("public".to_string()),
            access: Some(SnmpAccess::ReadWrite),
            ..Default::default()
        });
        config.security_features.snmp_configs.push(SnmpConfig {
            community: Some("x9Q-long-random".to_string()),
            acl: Some("10".to_string()),
            ..Default::default()
        });

        assert_eq!(run(&SnmpDefaultCommunityRule::new(), &config).len(), 1);
        assert_eq!(run(&SnmpWriteCommunityRule::new(), &config).len(), 1);
        let without_acl = run(&SnmpCommunityWithoutAclRule::new(), &config);
        assert_eq!(without_acl.len(), 1);
        assert_eq!(without_acl[0].detail_str("community"), Some("public"));
    }

    #[test]
    fn test_http_unknown_is_flagged() {
        let mut config = CanonicalConfig::default();
        let findings = run(&HttpServerRule::new(), &config);
        assert_eq!(findings.len(), 1);
        assert!(findings[0].description.contains("not explicitly disabled"));

        config.security_features.http_server_disabled = Some(true);
        assert!(run(&HttpServerRule::new(), &config).is_empty());
    }

    #[test]
    fn test_access_port_protection() {
        let mut config = CanonicalConfig::default();
        let mut bare = Interface::new("Gi0/1");
        bare.mode = Some(SwitchportMode::Access);
        let mut hardened = Interface::new("Gi0/2");
        hardened.mode = Some(SwitchportMode::Access);
        hardened.port_security = Some(true);
        hardened.portfast = Some(true);
        let mut trunk = Interface::new("Gi0/24");
        trunk.mode = Some(SwitchportMode::Trunk);
        config.interfaces = vec![bare, hardened, trunk];
        config.security_features.bpdu_guard_default = Some(true);

        let findings = run(&AccessPortProtectionRule::new(), &config);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].detail_str("interface"), Some("Gi0/1"));
        assert_eq!(findings[0].details["missing"], json!(["port-security", "bpdu-guard"]));
    }

    #[test]
    fn test_telnet_and_ssh() {
        let mut config = CanonicalConfig::default();
        assert!(run(&TelnetRule, &config).is_empty());
        assert_eq!(run(&SshRule, &config).len(), 1);

        config.security_features.telnet_enabled = Some(true);
        config.security_features.ssh_configured = Some(true);
        assert_eq!(run(&TelnetRule, &config).len(), 1);
        assert!(run(&SshRule, &config).is_empty());
    }

    #[test]
    fn test_enable_password() {
        let mut config = CanonicalConfig::default();
        config.security_features.enable_credential = Some(EnableCredential::Password);
        assert_eq!(run(&EnablePasswordRule::new(), &config).len(), 1);
        config.security_features.enable_credential = Some(EnableCredential::Secret);
        assert!(run(&EnablePasswordRule::new(), &config).is_empty());
    }

    #[test]
    fn test_acl_permit_any() {
        let mut config = CanonicalConfig::default();
        let entry = |text: &str| AclEntry {
            action: AclAction::classify(text),
            text: text.to_string(),
        };
        config.security_features.acls.push(Acl {
            name: "OPEN".to_string(),
            kind: Some("extended".to_string()),
            entries: vec![entry("permit tcp host 10.0.0.1 any eq 22"), entry("permit ip any any")],
        });
        config.security_features.acls.push(Acl {
            name: "MGMT".to_string(),
            kind: Some("standard".to_string()),
            entries: vec![entry("permit 10.0.0.0 0.0.0.255")],
        });

        let findings = run(&AclPermitAnyRule::new(), &config);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].detail_str("acl"), Some("OPEN"));
    }
}
