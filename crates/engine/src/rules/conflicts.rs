//! Internal consistency checks: references that point nowhere and declarations that collide.

use crate::core::{AnalysisContext, Finding, FindingType, Rule, RuleCategory, Severity};
use crate::impl_rule;
use serde_json::{json, Value};
use std::collections::BTreeMap;

/// Every VLAN an interface uses (access, native, voice, trunk or as an SVI) must be declared.
pub struct InterfaceVlanUndeclaredRule;

impl InterfaceVlanUndeclaredRule {
    pub fn new() -> Self {
        Self
    }

    fn evaluate_impl(&self, context: &AnalysisContext<'_>) -> Vec<Finding> {
        let config = context.config();
        let mut findings = Vec::new();

        for interface in &config.interfaces {
            for (role, reference) in interface.vlan_references() {
                let declared = reference
                    .vlan_id
                    .map_or(false, |id| config.vlan(id).is_some());
                if declared {
                    continue;
                }

                findings.push(
                    self.finding(
                        context,
                        format!(
                            "Interface {} uses {} VLAN {} which is not declared",
                            interface.name, role, reference
                        ),
                    )
                    .with_detail("interface", interface.name.as_str())
                    .with_detail("vlan", reference.member.as_str())
                    .with_detail("vlanId", reference.vlan_id.map_or(Value::Null, Value::from))
                    .with_detail("role", role)
                    .with_recommendation(format!(
                        "Declare VLAN {} or correct the {} VLAN on {}",
                        reference.member, role, interface.name
                    )),
                );
            }
        }

        findings
    }
}

impl_rule!(
    InterfaceVlanUndeclaredRule,
    id: "interface-vlan-undeclared",
    name: "Undeclared VLAN Reference",
    category: RuleCategory::Conflict,
    finding_type: FindingType::Conflict,
    severity: Severity::High,
    description: "Detects interfaces that reference VLANs missing from the VLAN database"
);

pub struct PortChannelMissingRule;

impl PortChannelMissingRule {
    pub fn new() -> Self {
        Self
    }

    fn evaluate_impl(&self, context: &AnalysisContext<'_>) -> Vec<Finding> {
        context
            .config()
            .interfaces
            .iter()
            .filter(|interface| interface.parent_port_channel.is_none())
            .filter_map(|interface| {
                let id = interface.port_channel_id?;
                Some(
                    self.finding(
                        context,
                        format!(
                            "Interface {} joins port-channel {} which is not declared",
                            interface.name, id
                        ),
                    )
                    .with_detail("interface", interface.name.as_str())
                    .with_detail("portChannelId", id)
                    .with_recommendation(format!(
                        "Declare the aggregate interface for port-channel {}",
                        id
                    )),
                )
            })
            .collect()
    }
}

impl_rule!(
    PortChannelMissingRule,
    id: "port-channel-missing",
    name: "Missing Port-Channel",
    category: RuleCategory::Conflict,
    finding_type: FindingType::Conflict,
    severity: Severity::High
);

pub struct DuplicateInterfaceRule;

impl DuplicateInterfaceRule {
    pub fn new() -> Self {
        Self
    }

    fn evaluate_impl(&self, context: &AnalysisContext<'_>) -> Vec<Finding> {
        let mut order: Vec<&str> = Vec::new();
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for interface in &context.config().interfaces {
            let count = counts.entry(interface.name.as_str()).or_insert(0);
            if *count == 0 {
                order.push(&interface.name);
            }
            *count += 1;
        }

        order
            .into_iter()
            .filter_map(|name| {
                let count = counts.get(name).copied().unwrap_or(0);
                if count < 2 {
                    return None;
                }
                Some(
                    self.finding(
                        context,
                        format!("Interface {} is declared {} times", name, count),
                    )
                    .with_detail("interface", name)
                    .with_detail("occurrences", count)
                    .with_recommendation("Merge the duplicate interface stanzas into one"),
                )
            })
            .collect()
    }
}

impl_rule!(
    DuplicateInterfaceRule,
    id: "duplicate-interface",
    name: "Duplicate Interface",
    category: RuleCategory::Conflict,
    finding_type: FindingType::Conflict,
    severity: Severity::Medium
);

pub struct DuplicateIpAddressRule;

impl DuplicateIpAddressRule {
    pub fn new() -> Self {
        Self
    }

    fn evaluate_impl(&self, context: &AnalysisContext<'_>) -> Vec<Finding> {
        let mut owners: Vec<(&str, Vec<&str>)> = Vec::new();
        for interface in &context.config().interfaces {
            let Some(address) = interface.ip_address.as_deref() else {
                continue;
            };
            match owners.iter_mut().find(|(a, _)| *a == address) {
                Some((_, names)) => {
                    if !names.contains(&interface.name.as_str()) {
                        names.push(&interface.name);
                    }
                }
                None => owners.push((address, vec![interface.name.as_str()])),
            }
        }

        owners
            .into_iter()
            .filter(|(_, names)| names.len() > 1)
            .map(|(address, names)| {
                self.finding(
                    context,
                    format!("IP address {} is assigned to {}", address, names.join(", ")),
                )
                .with_detail("ipAddress", address)
                .with_detail("interfaces", json!(names))
                .with_recommendation("Give each interface a unique address")
            })
            .collect()
    }
}

impl_rule!(
    DuplicateIpAddressRule,
    id: "duplicate-ip-address",
    name: "Duplicate IP Address",
    category: RuleCategory::Conflict,
    finding_type: FindingType::Conflict,
    severity: Severity::High
);
