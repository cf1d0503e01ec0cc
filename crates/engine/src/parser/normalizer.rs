//! Extracted fields to canonical configuration.
//!
//! Normalization runs in three passes so the result never depends on declaration order:
//!
//! 1. **Collect** every extraction into per-block drafts.
//! 2. **Coerce** numeric fields and validate VLAN ranges.
//! 3. **Link** cross references: VLAN names to ids, SVIs to their VLANs, aggregate members to
//!    their port-channel, and fields addressed to interfaces by name from other blocks.
//!
//! Only a non-numeric VLAN id aborts normalization. Every other anomaly is a warning.

use crate::core::{ParseWarning, SchemaViolation, WarningKind};
use crate::model::{
    Acl, AclAction, AclEntry, CanonicalConfig, EnableCredential, Interface, InterfaceStatus,
    ProtocolType, RoutingProtocol, SecurityFeatures, SnmpAccess, SnmpConfig, SnmpVersion,
    StaticRoute, SwitchportMode, Vendor, Vlan, VlanRef, MAX_VLAN_ID, MIN_VLAN_ID,
};
use crate::parser::addr;
use crate::parser::fields::{
    expand_vlan_list, AclField, DeviceField, ExtractedFields, Extraction, FieldPath, InterfaceField, RoutingField,
    SecurityField, ServiceField, SnmpField, VlanField,
};
use crate::parser::grammar::VendorGrammar;
use std::collections::HashMap;
use std::hash::Hash;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedConfig {
    pub config: CanonicalConfig,
    pub warnings: Vec<ParseWarning>,
}

pub fn normalize(
    fields: &ExtractedFields,
    vendor: Vendor,
) -> Result<NormalizedConfig, SchemaViolation> {
    let mut normalizer = Normalizer::new(vendor.grammar());
    for extraction in fields.iter() {
        normalizer.collect(extraction);
    }
    normalizer.finish()
}

/// Insertion-ordered map used for every per-key draft.
struct Ordered<K, V> {
    index: HashMap<K, usize>,
    items: Vec<V>,
}

impl<K: Hash + Eq, V> Ordered<K, V> {
    fn new() -> Self {
        Self {
            index: HashMap::new(),
            items: Vec::new(),
        }
    }

    fn entry(&mut self, key: K, make: impl FnOnce() -> V) -> &mut V {
        let items = &mut self.items;
        let slot = *self.index.entry(key).or_insert_with(|| {
            items.push(make());
            items.len() - 1
        });
        &mut self.items[slot]
    }
}

struct InterfaceDraft {
    interface: Interface,
    speed: Option<String>,
    duplex: Option<String>,
    access: Option<(String, usize)>,
    native: Option<(String, usize)>,
    voice: Option<(String, usize)>,
    members: Vec<(String, usize)>,
    trunk: Vec<(String, usize)>,
}

impl InterfaceDraft {
    fn new(interface: Interface) -> Self {
        Self {
            interface,
            speed: None,
            duplex: None,
            access: None,
            native: None,
            voice: None,
            members: Vec::new(),
            trunk: Vec::new(),
        }
    }
}

struct VlanDraft {
    key: String,
    ids: Vec<(String, usize)>,
    name: Option<String>,
    l3_interface: Option<(String, usize)>,
}

struct RoutingDraft {
    key: String,
    protocol: Option<String>,
    process_id: Option<String>,
    networks: Vec<String>,
    neighbors: Vec<String>,
    static_routes: Vec<StaticRoute>,
    default_gateway: Option<String>,
}

struct Normalizer {
    grammar: &'static dyn VendorGrammar,
    config: CanonicalConfig,
    warnings: Vec<ParseWarning>,
    interfaces: Ordered<usize, InterfaceDraft>,
    interface_refs: Vec<(String, InterfaceField, String, usize)>,
    vlans: Ordered<String, VlanDraft>,
    routing: Ordered<String, RoutingDraft>,
    snmp: Ordered<String, SnmpConfig>,
    acls: Ordered<String, Acl>,
}

impl Normalizer {
    fn new(grammar: &'static dyn VendorGrammar) -> Self {
        Self {
            grammar,
            config: CanonicalConfig::default(),
            warnings: Vec::new(),
            interfaces: Ordered::new(),
            interface_refs: Vec::new(),
            vlans: Ordered::new(),
            routing: Ordered::new(),
            snmp: Ordered::new(),
            acls: Ordered::new(),
        }
    }

    fn warn(&mut self, kind: WarningKind, line: usize, message: impl Into<String>) {
        self.warnings.push(ParseWarning::at(kind, line, message));
    }

    // Pass 1

    fn collect(&mut self, extraction: &Extraction) {
        let value = extraction.value.as_str();
        let line = extraction.line;

        match &extraction.path {
            FieldPath::Device(field) => {
                let info = &mut self.config.device_info;
                let slot = match field {
                    DeviceField::Hostname => &mut info.hostname,
                    DeviceField::OsVersion => &mut info.os_version,
                    DeviceField::Model => &mut info.model,
                    DeviceField::SerialNumber => &mut info.serial_number,
                    DeviceField::Uptime => &mut info.uptime,
                };
                slot.get_or_insert_with(|| value.to_string());
            }
            FieldPath::Interface { block, name, field } => {
                let draft = self
                    .interfaces
                    .entry(*block, || InterfaceDraft::new(Interface::new(name.clone())));
                if let Some(problem) = apply_interface_field(draft, *field, value, line) {
                    self.warn(WarningKind::CoercionFallback, line, problem);
                }
            }
            FieldPath::InterfaceRef { name, field } => {
                self.interface_refs
                    .push((name.clone(), *field, value.to_string(), line));
            }
            FieldPath::Vlan { key, field } => {
                let draft = self.vlans.entry(key.clone(), || VlanDraft {
                    key: key.clone(),
                    ids: Vec::new(),
                    name: None,
                    l3_interface: None,
                });
                match field {
                    VlanField::Id => draft.ids.push((value.to_string(), line)),
                    VlanField::Name => {
                        draft.name.get_or_insert_with(|| value.to_string());
                    }
                    VlanField::L3Interface => {
                        draft.l3_interface.get_or_insert_with(|| (value.to_string(), line));
                    }
                }
            }
            FieldPath::Routing { key, field } => {
                let draft = self.routing.entry(key.clone(), || RoutingDraft {
                    key: key.clone(),
                    protocol: None,
                    process_id: None,
                    networks: Vec::new(),
                    neighbors: Vec::new(),
                    static_routes: Vec::new(),
                    default_gateway: None,
                });
                match field {
                    RoutingField::Protocol => {
                        draft.protocol.get_or_insert_with(|| value.to_string());
                    }
                    RoutingField::ProcessId => {
                        draft.process_id.get_or_insert_with(|| value.to_string());
                    }
                    RoutingField::Network => push_unique(&mut draft.networks, value),
                    RoutingField::Neighbor => push_unique(&mut draft.neighbors, value),
                    RoutingField::StaticRoute => match value.split_once(' ') {
                        Some((destination, next_hop)) => draft.static_routes.push(StaticRoute {
                            destination: destination.to_string(),
                            next_hop: next_hop.to_string(),
                        }),
                        None => self.warnings.push(ParseWarning::at(
                            WarningKind::MissingField,
                            line,
                            format!("static route '{}' has no next hop", value),
                        )),
                    },
                    RoutingField::DefaultGateway => {
                        draft.default_gateway.get_or_insert_with(|| value.to_string());
                    }
                }
            }
            FieldPath::Snmp { key, field } => {
                let snmp = self.snmp.entry(key.clone(), SnmpConfig::default);
                match field {
                    SnmpField::Community => snmp.community = Some(value.to_string()),
                    SnmpField::User => snmp.user = Some(value.to_string()),
                    SnmpField::Acl => snmp.acl = Some(value.to_string()),
                    SnmpField::Version => match parse_snmp_version(value) {
                        Some(version) => snmp.version = Some(version),
                        None => self.warn(
                            WarningKind::CoercionFallback,
                            line,
                            format!("unknown SNMP version '{}'", value),
                        ),
                    },
                    SnmpField::Access => match value.parse::<SnmpAccess>() {
                        Ok(access) => snmp.access = Some(access),
                        Err(e) => self.warn(WarningKind::CoercionFallback, line, e),
                    },
                }
            }
            FieldPath::Acl { name, field } => {
                let acl = self.acls.entry(name.clone(), || Acl {
                    name: name.clone(),
                    kind: None,
                    entries: Vec::new(),
                });
                match field {
                    AclField::Declared => {
                        acl.kind.get_or_insert_with(|| value.to_string());
                    }
                    AclField::Entry => acl.entries.push(AclEntry {
                        action: AclAction::classify(value),
                        text: value.to_string(),
                    }),
                }
            }
            FieldPath::Security(field) => {
                if let Some(problem) =
                    apply_security_field(&mut self.config.security_features, *field, value)
                {
                    self.warn(WarningKind::CoercionFallback, line, problem);
                }
            }
            FieldPath::Service(field) => {
                let services = &mut self.config.other_services;
                let parsed = match field {
                    ServiceField::NtpServer => {
                        services.ntp_servers.insert(value.to_string());
                        Ok(())
                    }
                    ServiceField::DnsServer => {
                        services.dns_servers.insert(value.to_string());
                        Ok(())
                    }
                    ServiceField::DomainName => {
                        services.domain_name.get_or_insert_with(|| value.to_string());
                        Ok(())
                    }
                    ServiceField::VtpMode => {
                        services.vtp_mode.get_or_insert_with(|| value.to_string());
                        Ok(())
                    }
                    ServiceField::Cdp => set_flag(&mut services.cdp_enabled, value),
                    ServiceField::Lldp => set_flag(&mut services.lldp_enabled, value),
                };
                if let Err(problem) = parsed {
                    self.warn(WarningKind::CoercionFallback, line, problem);
                }
            }
        }
    }

    // Pass 2

    fn coerce_vlans(&mut self) -> Result<Vec<(Vlan, Option<(String, usize)>)>, SchemaViolation> {
        let mut vlans: Vec<(Vlan, Option<(String, usize)>)> = Vec::new();
        let drafts = std::mem::replace(&mut self.vlans, Ordered::new());

        for draft in drafts.items {
            if draft.ids.is_empty() {
                let line = draft.l3_interface.as_ref().map(|(_, l)| *l);
                self.warnings.push(ParseWarning::new(
                    WarningKind::MissingField,
                    line,
                    format!("VLAN '{}' has no VLAN id", draft.key),
                ));
                continue;
            }

            for (raw, line) in &draft.ids {
                let Some(id) = self.coerce_vlan_id(raw, *line, || SchemaViolation::NonNumericVlanId {
                    line: *line,
                    value: raw.clone(),
                })?
                else {
                    continue;
                };

                match vlans.iter_mut().find(|(vlan, _)| vlan.vlan_id == id) {
                    Some((existing, l3)) => {
                        if existing.name.is_none() {
                            existing.name = draft.name.clone();
                        }
                        if l3.is_none() {
                            *l3 = draft.l3_interface.clone();
                        }
                    }
                    None => {
                        let mut vlan = Vlan::new(id);
                        vlan.name = draft.name.clone();
                        vlans.push((vlan, draft.l3_interface.clone()));
                    }
                }
            }
        }

        Ok(vlans)
    }

    /// `Ok(None)` for numeric ids outside 1-4094, which are dropped with a warning.
    fn coerce_vlan_id(
        &mut self,
        raw: &str,
        line: usize,
        violation: impl FnOnce() -> SchemaViolation,
    ) -> Result<Option<u16>, SchemaViolation> {
        let raw = raw.trim();
        if !is_numeric(raw) {
            return Err(violation());
        }
        Ok(self.vlan_in_range(raw, line))
    }

    /// Range check for a numeric VLAN id; out-of-range ids are warned about and dropped.
    fn vlan_in_range(&mut self, raw: &str, line: usize) -> Option<u16> {
        match raw.parse::<u32>() {
            Ok(id) if (u32::from(MIN_VLAN_ID)..=u32::from(MAX_VLAN_ID)).contains(&id) => {
                Some(id as u16)
            }
            _ => {
                self.warn(
                    WarningKind::VlanOutOfRange,
                    line,
                    format!(
                        "VLAN id {} is outside {}-{}; ignored",
                        raw, MIN_VLAN_ID, MAX_VLAN_ID
                    ),
                );
                None
            }
        }
    }

    /// Resolves a member given by id or by name. `None` only for ids outside the valid range;
    /// an unknown name still yields a reference, without an id.
    fn resolve_member(
        &mut self,
        interface: &str,
        member: &str,
        line: usize,
        vlans: &[(Vlan, Option<(String, usize)>)],
    ) -> Option<VlanRef> {
        let vlan_id = if is_numeric(member) {
            Some(self.vlan_in_range(member, line)?)
        } else {
            let id = vlans
                .iter()
                .find(|(vlan, _)| vlan.name.as_deref() == Some(member))
                .map(|(vlan, _)| vlan.vlan_id);
            if id.is_none() {
                self.warn(
                    WarningKind::UnresolvedReference,
                    line,
                    format!("interface '{}' references unknown VLAN '{}'", interface, member),
                );
            }
            id
        };
        Some(VlanRef {
            member: member.to_string(),
            vlan_id,
        })
    }

    fn coerce_interface_vlan(
        &mut self,
        interface: &str,
        reference: Option<(String, usize)>,
    ) -> Result<Option<VlanRef>, SchemaViolation> {
        let Some((raw, line)) = reference else {
            return Ok(None);
        };
        let vlan_id = self.coerce_vlan_id(&raw, line, || SchemaViolation::NonNumericVlanReference {
            line,
            interface: interface.to_string(),
            value: raw.clone(),
        })?;
        Ok(Some(VlanRef {
            member: raw,
            vlan_id,
        }))
    }

    // Pass 3

    fn finish(mut self) -> Result<NormalizedConfig, SchemaViolation> {
        let vlans = self.coerce_vlans()?;
        let drafts = std::mem::replace(&mut self.interfaces, Ordered::new()).items;

        let mut interfaces = Vec::with_capacity(drafts.len());
        for draft in drafts {
            let mut interface = draft.interface;
            interface.access_vlan = self.coerce_interface_vlan(&interface.name, draft.access)?;
            interface.native_vlan = self.coerce_interface_vlan(&interface.name, draft.native)?;
            interface.voice_vlan = self.coerce_interface_vlan(&interface.name, draft.voice)?;
            interface.speed_duplex = match (draft.speed, draft.duplex) {
                (None, None) => None,
                (speed, duplex) => Some(
                    speed
                        .map(|s| format!("speed {}", s))
                        .into_iter()
                        .chain(duplex.map(|d| format!("duplex {}", d)))
                        .collect::<Vec<_>>()
                        .join(", "),
                ),
            };
            let mut trunk = draft.trunk;
            self.link_members(&mut interface, &draft.members, &mut trunk, &vlans);
            self.link_trunk(&mut interface, &trunk, &vlans);
            interfaces.push(interface);
        }

        self.apply_interface_refs(&mut interfaces);
        let vlans = self.link_svis(&mut interfaces, vlans);
        self.link_port_channels(&mut interfaces);
        self.report_duplicate_interfaces(&interfaces);

        self.config.interfaces = interfaces;
        self.config.vlans_svis = vlans;
        self.config.routing_protocols = self
            .routing
            .items
            .drain(..)
            .map(build_routing)
            .collect();
        self.config.security_features.snmp_configs = self.snmp.items.drain(..).collect();
        self.config.security_features.acls = self.acls.items.drain(..).collect();

        debug!(
            interfaces = self.config.interfaces.len(),
            vlans = self.config.vlans_svis.len(),
            warnings = self.warnings.len(),
            "normalized configuration"
        );

        Ok(NormalizedConfig {
            config: self.config,
            warnings: self.warnings,
        })
    }

    /// Resolves `members` statements: one VLAN on access ports, the allowed list on trunks.
    fn link_members(
        &mut self,
        interface: &mut Interface,
        members: &[(String, usize)],
        trunk: &mut Vec<(String, usize)>,
        vlans: &[(Vlan, Option<(String, usize)>)],
    ) {
        let is_trunk = interface.mode == Some(SwitchportMode::Trunk);

        for (member, line) in members {
            if is_trunk {
                push_unique(&mut interface.trunk_allowed_vlans, member);
                trunk.push((member.clone(), *line));
                continue;
            }
            if interface.access_vlan.is_some() {
                self.warn(
                    WarningKind::CoercionFallback,
                    *line,
                    format!(
                        "interface '{}' is not a trunk; extra VLAN member '{}' ignored",
                        interface.name, member
                    ),
                );
                continue;
            }
            interface.access_vlan = self.resolve_member(&interface.name, member, *line, vlans);
        }
    }

    /// Expands the allowed list into one reference per VLAN.
    fn link_trunk(
        &mut self,
        interface: &mut Interface,
        entries: &[(String, usize)],
        vlans: &[(Vlan, Option<(String, usize)>)],
    ) {
        for (entry, line) in entries {
            for member in expand_vlan_list(entry) {
                if member.eq_ignore_ascii_case("all") || member.eq_ignore_ascii_case("none") {
                    continue;
                }
                let Some(reference) = self.resolve_member(&interface.name, &member, *line, vlans)
                else {
                    continue;
                };
                if !interface.trunk_vlans.contains(&reference) {
                    interface.trunk_vlans.push(reference);
                }
            }
        }
    }

    fn apply_interface_refs(&mut self, interfaces: &mut [Interface]) {
        for (name, field, value, line) in std::mem::take(&mut self.interface_refs) {
            let mut found = false;
            for interface in interfaces.iter_mut().filter(|i| i.name == name) {
                found = true;
                let mut draft = InterfaceDraft::new(std::mem::take(interface));
                let problem = apply_interface_field(&mut draft, field, &value, line);
                *interface = draft.interface;
                if let Some(problem) = problem {
                    self.warn(WarningKind::CoercionFallback, line, problem);
                }
            }
            if !found {
                self.warn(
                    WarningKind::UnresolvedReference,
                    line,
                    format!("reference to undeclared interface '{}'", name),
                );
            }
        }
    }

    fn link_svis(
        &mut self,
        interfaces: &mut [Interface],
        vlans: Vec<(Vlan, Option<(String, usize)>)>,
    ) -> Vec<Vlan> {
        let mut linked = Vec::with_capacity(vlans.len());

        for (mut vlan, l3_interface) in vlans {
            if let Some((name, line)) = &l3_interface {
                vlan.svi_interface = Some(name.clone());
                if !interfaces.iter().any(|i| i.name == *name) {
                    self.warn(
                        WarningKind::UnresolvedReference,
                        *line,
                        format!(
                            "VLAN {} names undeclared layer 3 interface '{}'",
                            vlan.vlan_id, name
                        ),
                    );
                }
            }
            linked.push(vlan);
        }

        let mut filled: Vec<(u16, String)> = Vec::new();
        for interface in interfaces.iter_mut() {
            let by_binding = linked
                .iter()
                .find(|v| v.svi_interface.as_deref() == Some(interface.name.as_str()))
                .map(|v| v.vlan_id);
            let Some(vlan_id) = by_binding.or_else(|| self.grammar.svi_vlan_id(&interface.name))
            else {
                continue;
            };
            interface.svi_vlan = Some(vlan_id);

            if let Some((_, first)) = filled.iter().find(|(id, _)| *id == vlan_id) {
                self.warnings.push(ParseWarning::new(
                    WarningKind::DuplicateDeclaration,
                    None,
                    format!(
                        "VLAN {} already takes its layer 3 settings from '{}'; '{}' ignored",
                        vlan_id, first, interface.name
                    ),
                ));
                continue;
            }

            if let Some(vlan) = linked.iter_mut().find(|v| v.vlan_id == vlan_id) {
                filled.push((vlan_id, interface.name.clone()));
                vlan.svi_interface
                    .get_or_insert_with(|| interface.name.clone());
                vlan.svi_ip_address = interface.ip_address.clone();
                vlan.helper_addresses = interface.helper_addresses.clone();
                vlan.network_range = match (&interface.ip_address, &interface.subnet_mask) {
                    (Some(address), Some(mask)) => addr::network_range(address, mask),
                    _ => None,
                };
            }
        }

        linked
    }

    fn link_port_channels(&mut self, interfaces: &mut [Interface]) {
        let aggregates: Vec<(u32, String)> = interfaces
            .iter()
            .filter_map(|i| Some((self.grammar.aggregate_id(&i.name)?, i.name.clone())))
            .collect();

        for interface in interfaces.iter_mut() {
            let Some(id) = interface.port_channel_id else {
                continue;
            };
            match aggregates.iter().find(|(aggregate, _)| *aggregate == id) {
                Some((_, parent)) => interface.parent_port_channel = Some(parent.clone()),
                None => self.warnings.push(ParseWarning::new(
                    WarningKind::UnresolvedReference,
                    None,
                    format!(
                        "interface '{}' is a member of undeclared port-channel {}",
                        interface.name, id
                    ),
                )),
            }
        }
    }

    fn report_duplicate_interfaces(&mut self, interfaces: &[Interface]) {
        let mut counts: Vec<(&str, usize)> = Vec::new();
        for interface in interfaces {
            match counts.iter_mut().find(|(name, _)| *name == interface.name) {
                Some((_, count)) => *count += 1,
                None => counts.push((interface.name.as_str(), 1)),
            }
        }
        for (name, count) in counts.into_iter().filter(|(_, count)| *count > 1) {
            self.warnings.push(ParseWarning::new(
                WarningKind::DuplicateDeclaration,
                None,
                format!("interface '{}' is declared {} times", name, count),
            ));
        }
    }
}

fn is_numeric(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit())
}

fn push_unique(values: &mut Vec<String>, value: &str) {
    if !values.iter().any(|v| v == value) {
        values.push(value.to_string());
    }
}

fn parse_flag(value: &str) -> Result<bool, String> {
    value
        .parse::<bool>()
        .map_err(|_| format!("expected true or false, found '{}'", value))
}

fn set_flag(slot: &mut Option<bool>, value: &str) -> Result<(), String> {
    let flag = parse_flag(value)?;
    slot.get_or_insert(flag);
    Ok(())
}

/// Flags fed by several lines: any `true` wins.
fn merge_flag(slot: &mut Option<bool>, value: &str) -> Result<(), String> {
    let flag = parse_flag(value)?;
    *slot = Some(slot.unwrap_or(false) || flag);
    Ok(())
}

fn parse_snmp_version(value: &str) -> Option<SnmpVersion> {
    match value.to_ascii_lowercase().as_str() {
        "v1" | "1" => Some(SnmpVersion::V1),
        "v2c" | "2c" => Some(SnmpVersion::V2c),
        "v3" | "3" => Some(SnmpVersion::V3),
        _ => None,
    }
}

fn apply_interface_field(
    draft: &mut InterfaceDraft,
    field: InterfaceField,
    value: &str,
    line: usize,
) -> Option<String> {
    let interface = &mut draft.interface;
    let result: Result<(), String> = match field {
        InterfaceField::Declared => Ok(()),
        InterfaceField::IpAddress => {
            interface.ip_address.get_or_insert_with(|| value.to_string());
            Ok(())
        }
        InterfaceField::SubnetMask => {
            interface.subnet_mask.get_or_insert_with(|| value.to_string());
            Ok(())
        }
        InterfaceField::Description => {
            interface.description.get_or_insert_with(|| value.to_string());
            Ok(())
        }
        InterfaceField::Status => value
            .parse::<InterfaceStatus>()
            .map(|status| interface.status = status),
        InterfaceField::Speed => {
            draft.speed.get_or_insert_with(|| value.to_string());
            Ok(())
        }
        InterfaceField::Duplex => {
            draft.duplex.get_or_insert_with(|| value.to_string());
            Ok(())
        }
        InterfaceField::PortChannelId => value
            .parse::<u32>()
            .map(|id| interface.port_channel_id = Some(id))
            .map_err(|_| format!("port-channel id '{}' is not a number", value)),
        InterfaceField::Mode => value
            .parse::<SwitchportMode>()
            .map(|mode| interface.mode = Some(mode)),
        InterfaceField::AccessVlan => {
            draft.access.get_or_insert_with(|| (value.to_string(), line));
            Ok(())
        }
        InterfaceField::NativeVlan => {
            draft.native.get_or_insert_with(|| (value.to_string(), line));
            Ok(())
        }
        InterfaceField::VlanMember => {
            draft.members.push((value.to_string(), line));
            Ok(())
        }
        InterfaceField::VoiceVlan => {
            draft.voice.get_or_insert_with(|| (value.to_string(), line));
            Ok(())
        }
        InterfaceField::TrunkAllowed => {
            push_unique(&mut interface.trunk_allowed_vlans, value);
            draft.trunk.push((value.to_string(), line));
            Ok(())
        }
        InterfaceField::HelperAddress => {
            interface.helper_addresses.insert(value.to_string());
            Ok(())
        }
        InterfaceField::PortSecurity => set_flag(&mut interface.port_security, value),
        InterfaceField::BpduGuard => set_flag(&mut interface.bpdu_guard, value),
        InterfaceField::Portfast => set_flag(&mut interface.portfast, value),
    };

    result
        .err()
        .map(|problem| format!("interface '{}': {}", draft.interface.name, problem))
}

fn apply_security_field(
    security: &mut SecurityFeatures,
    field: SecurityField,
    value: &str,
) -> Option<String> {
    let result = match field {
        SecurityField::PasswordEncryption => {
            set_flag(&mut security.password_encryption_enabled, value)
        }
        SecurityField::Aaa => set_flag(&mut security.aaa_configured, value),
        SecurityField::Ssh => merge_flag(&mut security.ssh_configured, value),
        SecurityField::Telnet => merge_flag(&mut security.telnet_enabled, value),
        SecurityField::HttpServerDisabled => set_flag(&mut security.http_server_disabled, value),
        SecurityField::HttpsServer => set_flag(&mut security.https_server_enabled, value),
        SecurityField::LoginBanner => set_flag(&mut security.login_banner, value),
        SecurityField::BpduGuardDefault => set_flag(&mut security.bpdu_guard_default, value),
        SecurityField::EnableCredential => match value {
            "secret" => {
                security.enable_credential.get_or_insert(EnableCredential::Secret);
                Ok(())
            }
            "password" => {
                security.enable_credential.get_or_insert(EnableCredential::Password);
                Ok(())
            }
            other => Err(format!("unknown enable credential '{}'", other)),
        },
    };
    result.err()
}

fn build_routing(draft: RoutingDraft) -> RoutingProtocol {
    let keyword = draft
        .protocol
        .clone()
        .or_else(|| draft.key.split_whitespace().next().map(str::to_string))
        .unwrap_or_default();
    let mut routing = RoutingProtocol::new(ProtocolType::parse(&keyword));
    routing.process_id = draft.process_id;
    routing.networks = draft.networks;
    routing.neighbors = draft.neighbors;
    routing.static_routes = draft.static_routes;
    routing.default_gateway = draft.default_gateway;
    routing
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(entries: Vec<(FieldPath, &str)>) -> ExtractedFields {
        entries
            .into_iter()
            .enumerate()
            .map(|(i, (path, value))| Extraction::new(path, value, i + 1))
            .collect()
    }

    fn iface(block: usize, name: &str, field: InterfaceField) -> FieldPath {
        FieldPath::interface(block, name, field)
    }

    #[test]
    fn test_vlan_out_of_range_is_warned_and_excluded() {
        let extracted = fields(vec![
            (FieldPath::vlan("10", VlanField::Id), "10"),
            (FieldPath::vlan("5000", VlanField::Id), "5000"),
            (FieldPath::vlan("0", VlanField::Id), "0"),
        ]);
        let normalized = normalize(&extracted, Vendor::CiscoIos).unwrap();
        let ids: Vec<u16> = normalized.config.vlans_svis.iter().map(|v| v.vlan_id).collect();
        assert_eq!(ids, vec![10]);
        let out_of_range = normalized
            .warnings
            .iter()
            .filter(|w| w.kind == WarningKind::VlanOutOfRange)
            .count();
        assert_eq!(out_of_range, 2);
    }

    #[test]
    fn test_non_numeric_vlan_id_is_a_schema_violation() {
        let extracted = fields(vec![(FieldPath::vlan("DATA", VlanField::Id), "ten")]);
        let err = normalize(&extracted, Vendor::Juniper).unwrap_err();
        assert_eq!(
            err,
            SchemaViolation::NonNumericVlanId {
                line: 1,
                value: "ten".to_string()
            }
        );
    }

    #[test]
    fn test_non_numeric_access_vlan_is_a_schema_violation() {
        let extracted = fields(vec![
            (iface(0, "Gi0/1", InterfaceField::Declared), "Gi0/1"),
            (iface(0, "Gi0/1", InterfaceField::AccessVlan), "abc"),
        ]);
        let err = normalize(&extracted, Vendor::CiscoIos).unwrap_err();
        assert!(matches!(err, SchemaViolation::NonNumericVlanReference { line: 2, .. }));
    }

    #[test]
    fn test_port_channel_linked_regardless_of_order() {
        let extracted = fields(vec![
            (iface(0, "Gi0/1", InterfaceField::Declared), "Gi0/1"),
            (iface(0, "Gi0/1", InterfaceField::PortChannelId), "1"),
            (iface(1, "Port-channel1", InterfaceField::Declared), "Port-channel1"),
        ]);
        let normalized = normalize(&extracted, Vendor::CiscoIos).unwrap();
        assert_eq!(
            normalized.config.interfaces[0].parent_port_channel.as_deref(),
            Some("Port-channel1")
        );
        assert!(normalized.warnings.is_empty());
    }

    #[test]
    fn test_missing_port_channel_is_warned() {
        let extracted = fields(vec![(iface(0, "Gi0/1", InterfaceField::PortChannelId), "2")]);
        let normalized = normalize(&extracted, Vendor::CiscoIos).unwrap();
        assert_eq!(normalized.config.interfaces[0].port_channel_id, Some(2));
        assert_eq!(normalized.warnings[0].kind, WarningKind::UnresolvedReference);
    }

    #[test]
    fn test_svi_fills_vlan() {
        let extracted = fields(vec![
            (FieldPath::vlan("10", VlanField::Id), "10"),
            (iface(1, "Vlan10", InterfaceField::Declared), "Vlan10"),
            (iface(1, "Vlan10", InterfaceField::IpAddress), "10.0.10.1"),
            (iface(1, "Vlan10", InterfaceField::SubnetMask), "255.255.255.0"),
            (iface(1, "Vlan10", InterfaceField::HelperAddress), "10.0.0.5"),
        ]);
        let normalized = normalize(&extracted, Vendor::CiscoIos).unwrap();
        let vlan = normalized.config.vlan(10).unwrap();
        assert_eq!(vlan.svi_ip_address.as_deref(), Some("10.0.10.1"));
        assert_eq!(vlan.network_range.as_deref(), Some("10.0.10.0/24"));
        assert!(vlan.helper_addresses.contains("10.0.0.5"));
        assert_eq!(normalized.config.interfaces[0].svi_vlan, Some(10));
    }

    #[test]
    fn test_svi_without_vlan_does_not_create_one() {
        let extracted = fields(vec![(iface(0, "Vlan30", InterfaceField::Declared), "Vlan30")]);
        let normalized = normalize(&extracted, Vendor::CiscoIos).unwrap();
        assert!(normalized.config.vlans_svis.is_empty());
        assert_eq!(normalized.config.interfaces[0].svi_vlan, Some(30));
    }

    #[test]
    fn test_vlan_members_resolve_names() {
        let extracted = fields(vec![
            (iface(0, "ge-0/0/1", InterfaceField::VlanMember), "DATA"),
            (FieldPath::vlan("DATA", VlanField::Name), "DATA"),
            (FieldPath::vlan("DATA", VlanField::Id), "10"),
        ]);
        let normalized = normalize(&extracted, Vendor::Juniper).unwrap();
        let access = normalized.config.interfaces[0].access_vlan.clone().unwrap();
        assert_eq!(access.member, "DATA");
        assert_eq!(access.vlan_id, Some(10));
    }

    #[test]
    fn test_trunk_members_become_allowed_list() {
        let extracted = fields(vec![
            (iface(0, "ge-0/0/2", InterfaceField::Mode), "trunk"),
            (iface(0, "ge-0/0/2", InterfaceField::VlanMember), "DATA"),
            (iface(0, "ge-0/0/2", InterfaceField::VlanMember), "VOICE"),
        ]);
        let normalized = normalize(&extracted, Vendor::Juniper).unwrap();
        let interface = &normalized.config.interfaces[0];
        assert!(interface.access_vlan.is_none());
        assert_eq!(interface.trunk_allowed_vlans, vec!["DATA", "VOICE"]);
    }

    #[test]
    fn test_numeric_members_are_range_checked() {
        let extracted = fields(vec![
            (iface(0, "ge-0/0/1", InterfaceField::Mode), "access"),
            (iface(0, "ge-0/0/1", InterfaceField::VlanMember), "0"),
            (iface(0, "ge-0/0/1", InterfaceField::VlanMember), "20"),
        ]);
        let normalized = normalize(&extracted, Vendor::Juniper).unwrap();
        let access = normalized.config.interfaces[0].access_vlan.clone().unwrap();
        assert_eq!(access.vlan_id, Some(20));
        assert_eq!(normalized.warnings[0].kind, WarningKind::VlanOutOfRange);
    }

    #[test]
    fn test_trunk_allowed_resolves_each_vlan() {
        let extracted = fields(vec![
            (FieldPath::vlan("10", VlanField::Id), "10"),
            (iface(1, "Gi0/2", InterfaceField::TrunkAllowed), "10"),
            (iface(1, "Gi0/2", InterfaceField::TrunkAllowed), "4090-4095"),
        ]);
        let normalized = normalize(&extracted, Vendor::CiscoIos).unwrap();
        let ids: Vec<Option<u16>> = normalized.config.interfaces[0]
            .trunk_vlans
            .iter()
            .map(|v| v.vlan_id)
            .collect();
        assert_eq!(
            ids,
            vec![Some(10), Some(4090), Some(4091), Some(4092), Some(4093), Some(4094)]
        );
        assert_eq!(normalized.warnings.len(), 1);
        assert_eq!(normalized.warnings[0].kind, WarningKind::VlanOutOfRange);
    }

    #[test]
    fn test_first_svi_keeps_vlan_addressing() {
        let extracted = fields(vec![
            (FieldPath::vlan("10", VlanField::Id), "10"),
            (iface(1, "Vlan10", InterfaceField::IpAddress), "10.0.10.1"),
            (iface(1, "Vlan10", InterfaceField::SubnetMask), "255.255.255.0"),
            (iface(2, "Vlan10", InterfaceField::IpAddress), "10.0.99.1"),
            (iface(2, "Vlan10", InterfaceField::SubnetMask), "255.255.255.0"),
        ]);
        let normalized = normalize(&extracted, Vendor::CiscoIos).unwrap();
        let vlan = normalized.config.vlan(10).unwrap();
        assert_eq!(vlan.svi_ip_address.as_deref(), Some("10.0.10.1"));
        assert_eq!(vlan.network_range.as_deref(), Some("10.0.10.0/24"));
        assert!(normalized
            .warnings
            .iter()
            .any(|w| w.message.contains("already takes its layer 3 settings")));
    }

    #[test]
    fn test_duplicate_interfaces_are_preserved() {
        let extracted = fields(vec![
            (iface(0, "Gi0/1", InterfaceField::Declared), "Gi0/1"),
            (iface(3, "Gi0/1", InterfaceField::Declared), "Gi0/1"),
        ]);
        let normalized = normalize(&extracted, Vendor::CiscoIos).unwrap();
        assert_eq!(normalized.config.interfaces.len(), 2);
        assert_eq!(normalized.warnings[0].kind, WarningKind::DuplicateDeclaration);
    }

    #[test]
    fn test_http_absence_is_unknown() {
        let normalized = normalize(&ExtractedFields::new(), Vendor::CiscoIos).unwrap();
        assert_eq!(normalized.config.security_features.http_server_disabled, None);
        assert_eq!(normalized.config.security_features.password_encryption_enabled, None);
    }

    #[test]
    fn test_telnet_any_true_wins() {
        let extracted = fields(vec![
            (FieldPath::Security(SecurityField::Telnet), "false"),
            (FieldPath::Security(SecurityField::Telnet), "true"),
        ]);
        let normalized = normalize(&extracted, Vendor::CiscoIos).unwrap();
        assert_eq!(normalized.config.security_features.telnet_enabled, Some(true));
    }

    #[test]
    fn test_interface_ref_unresolved_is_warned() {
        let extracted = fields(vec![(
            FieldPath::InterfaceRef {
                name: "ge-0/0/9".to_string(),
                field: InterfaceField::Portfast,
            },
            "true",
        )]);
        let normalized = normalize(&extracted, Vendor::Juniper).unwrap();
        assert_eq!(normalized.warnings[0].kind, WarningKind::UnresolvedReference);
    }
}
