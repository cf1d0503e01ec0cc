//! Canonical field paths.
//!
//! A grammar never builds canonical structures directly. It emits `(FieldPath, value)` pairs,
//! and the normalizer folds them into a [`CanonicalConfig`]. [`FieldPath::resolve`] reads a path
//! back out of a finished config so the two sides can be checked against each other.

use crate::model::{
    CanonicalConfig, EnableCredential, Interface, RoutingProtocol, SnmpAccess, SnmpConfig,
    SnmpVersion, Vlan, MAX_VLAN_ID, MIN_VLAN_ID,
};
use std::collections::HashSet;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceField {
    Hostname,
    OsVersion,
    Model,
    SerialNumber,
    Uptime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InterfaceField {
    Declared,
    IpAddress,
    SubnetMask,
    Description,
    Status,
    Speed,
    Duplex,
    PortChannelId,
    Mode,
    AccessVlan,
    NativeVlan,
    VoiceVlan,
    /// VLAN membership by name or id; access or trunk depending on the mode.
    VlanMember,
    TrunkAllowed,
    HelperAddress,
    PortSecurity,
    BpduGuard,
    Portfast,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VlanField {
    Id,
    Name,
    L3Interface,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoutingField {
    Protocol,
    ProcessId,
    Network,
    Neighbor,
    /// `"<destination> <next-hop>"`
    StaticRoute,
    DefaultGateway,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SnmpField {
    Community,
    User,
    Version,
    Access,
    Acl,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AclField {
    Declared,
    Entry,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SecurityField {
    PasswordEncryption,
    Aaa,
    Ssh,
    Telnet,
    HttpServerDisabled,
    HttpsServer,
    EnableCredential,
    LoginBanner,
    BpduGuardDefault,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceField {
    NtpServer,
    DnsServer,
    DomainName,
    VtpMode,
    Cdp,
    Lldp,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldPath {
    Device(DeviceField),
    /// A field of the interface block with the given id.
    Interface {
        block: usize,
        name: String,
        field: InterfaceField,
    },
    /// A field of an interface addressed by name from another block.
    InterfaceRef { name: String, field: InterfaceField },
    Vlan { key: String, field: VlanField },
    Routing { key: String, field: RoutingField },
    Snmp { key: String, field: SnmpField },
    Acl { name: String, field: AclField },
    Security(SecurityField),
    Service(ServiceField),
}

impl FieldPath {
    pub fn interface(block: usize, name: impl Into<String>, field: InterfaceField) -> Self {
        Self::Interface {
            block,
            name: name.into(),
            field,
        }
    }

    pub fn vlan(key: impl Into<String>, field: VlanField) -> Self {
        Self::Vlan {
            key: key.into(),
            field,
        }
    }

    pub fn routing(key: impl Into<String>, field: RoutingField) -> Self {
        Self::Routing {
            key: key.into(),
            field,
        }
    }

    pub fn snmp(key: impl Into<String>, field: SnmpField) -> Self {
        Self::Snmp {
            key: key.into(),
            field,
        }
    }

    pub fn acl(name: impl Into<String>, field: AclField) -> Self {
        Self::Acl {
            name: name.into(),
            field,
        }
    }

    /// Multi-valued paths accept every extraction; the rest keep the first one.
    pub fn is_multi_valued(&self) -> bool {
        match self {
            Self::Interface { field, .. } | Self::InterfaceRef { field, .. } => matches!(
                field,
                InterfaceField::VlanMember
                    | InterfaceField::TrunkAllowed
                    | InterfaceField::HelperAddress
            ),
            Self::Vlan { field, .. } => *field == VlanField::Id,
            Self::Routing { field, .. } => matches!(
                field,
                RoutingField::Network | RoutingField::Neighbor | RoutingField::StaticRoute
            ),
            Self::Acl { .. } => true,
            Self::Security(field) => matches!(field, SecurityField::Ssh | SecurityField::Telnet),
            Self::Service(field) => {
                matches!(field, ServiceField::NtpServer | ServiceField::DnsServer)
            }
            Self::Device(_) | Self::Snmp { .. } => false,
        }
    }

    /// Values found at this path in a normalized configuration, in the textual form grammars
    /// extract them.
    pub fn resolve(&self, config: &CanonicalConfig) -> Vec<String> {
        match self {
            Self::Device(field) => {
                let info = &config.device_info;
                let value = match field {
                    DeviceField::Hostname => &info.hostname,
                    DeviceField::OsVersion => &info.os_version,
                    DeviceField::Model => &info.model,
                    DeviceField::SerialNumber => &info.serial_number,
                    DeviceField::Uptime => &info.uptime,
                };
                value.iter().cloned().collect()
            }
            Self::Interface { name, field, .. } | Self::InterfaceRef { name, field } => config
                .interfaces_named(name)
                .flat_map(|interface| resolve_interface(interface, *field))
                .collect(),
            Self::Vlan { key, field } => vlans_for_key(config, key)
                .into_iter()
                .filter_map(|vlan| match field {
                    VlanField::Id => Some(vlan.vlan_id.to_string()),
                    VlanField::Name => vlan.name.clone(),
                    VlanField::L3Interface => vlan.svi_interface.clone(),
                })
                .collect(),
            Self::Routing { key, field } => config
                .routing_protocols
                .iter()
                .filter(|r| routing_key(r) == *key)
                .flat_map(|r| resolve_routing(r, *field))
                .collect(),
            Self::Snmp { key, field } => config
                .security_features
                .snmp_configs
                .iter()
                .filter(|s| snmp_key(s).as_deref() == Some(key.as_str()))
                .filter_map(|s| resolve_snmp(s, *field))
                .collect(),
            Self::Acl { name, field } => config
                .security_features
                .acls
                .iter()
                .filter(|acl| acl.name == *name)
                .flat_map(|acl| match field {
                    AclField::Declared => acl.kind.iter().cloned().collect::<Vec<_>>(),
                    AclField::Entry => acl.entries.iter().map(|e| e.text.clone()).collect(),
                })
                .collect(),
            Self::Security(field) => {
                let security = &config.security_features;
                match field {
                    SecurityField::PasswordEncryption => {
                        flag(security.password_encryption_enabled)
                    }
                    SecurityField::Aaa => flag(security.aaa_configured),
                    SecurityField::Ssh => flag(security.ssh_configured),
                    SecurityField::Telnet => flag(security.telnet_enabled),
                    SecurityField::HttpServerDisabled => flag(security.http_server_disabled),
                    SecurityField::HttpsServer => flag(security.https_server_enabled),
                    SecurityField::EnableCredential => security
                        .enable_credential
                        .map(|c| enable_credential_str(c).to_string())
                        .into_iter()
                        .collect(),
                    SecurityField::LoginBanner => flag(security.login_banner),
                    SecurityField::BpduGuardDefault => flag(security.bpdu_guard_default),
                }
            }
            Self::Service(field) => {
                let services = &config.other_services;
                match field {
                    ServiceField::NtpServer => services.ntp_servers.iter().cloned().collect(),
                    ServiceField::DnsServer => services.dns_servers.iter().cloned().collect(),
                    ServiceField::DomainName => services.domain_name.iter().cloned().collect(),
                    ServiceField::VtpMode => services.vtp_mode.iter().cloned().collect(),
                    ServiceField::Cdp => flag(services.cdp_enabled),
                    ServiceField::Lldp => flag(services.lldp_enabled),
                }
            }
        }
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Device(field) => write!(f, "deviceInfo.{:?}", field),
            Self::Interface { name, field, .. } | Self::InterfaceRef { name, field } => {
                write!(f, "interfaces[{}].{:?}", name, field)
            }
            Self::Vlan { key, field } => write!(f, "vlansSvis[{}].{:?}", key, field),
            Self::Routing { key, field } => write!(f, "routingProtocols[{}].{:?}", key, field),
            Self::Snmp { key, field } => write!(f, "snmpConfigs[{}].{:?}", key, field),
            Self::Acl { name, field } => write!(f, "acls[{}].{:?}", name, field),
            Self::Security(field) => write!(f, "securityFeatures.{:?}", field),
            Self::Service(field) => write!(f, "otherServices.{:?}", field),
        }
    }
}

fn flag(value: Option<bool>) -> Vec<String> {
    value.map(|v| v.to_string()).into_iter().collect()
}

pub(crate) fn enable_credential_str(credential: EnableCredential) -> &'static str {
    match credential {
        EnableCredential::Secret => "secret",
        EnableCredential::Password => "password",
    }
}

pub(crate) fn snmp_access_str(access: SnmpAccess) -> &'static str {
    match access {
        SnmpAccess::ReadOnly => "read-only",
        SnmpAccess::ReadWrite => "read-write",
    }
}

pub(crate) fn snmp_version_str(version: SnmpVersion) -> &'static str {
    match version {
        SnmpVersion::V1 => "v1",
        SnmpVersion::V2c => "v2c",
        SnmpVersion::V3 => "v3",
    }
}

/// Grouping key of a routing entry: protocol plus process id when there is one.
pub fn routing_key(routing: &RoutingProtocol) -> String {
    match &routing.process_id {
        Some(id) => format!("{} {}", routing.protocol_type, id),
        None => routing.protocol_type.to_string(),
    }
}

/// Grouping key of an SNMP entry: `community <name>` or `user <name>`.
pub fn snmp_key(snmp: &SnmpConfig) -> Option<String> {
    snmp.community
        .as_ref()
        .map(|c| format!("community {}", c))
        .or_else(|| snmp.user.as_ref().map(|u| format!("user {}", u)))
}

/// Expands a VLAN list such as `10,20-22` into its members. Pieces that are not numeric are
/// returned verbatim so callers can report them.
///
/// Ranges are expanded only across valid VLAN ids. An end point outside 1-4094 is kept as a
/// single member so the normalizer warns about it once instead of once per id.
pub fn expand_vlan_list(list: &str) -> Vec<String> {
    let valid = u32::from(MIN_VLAN_ID)..=u32::from(MAX_VLAN_ID);

    let mut members = Vec::new();
    for piece in list.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let range = piece
            .split_once('-')
            .and_then(|(lo, hi)| Some((lo.trim().parse::<u32>().ok()?, hi.trim().parse::<u32>().ok()?)));
        match range {
            Some((lo, hi)) if lo <= hi => {
                if !valid.contains(&lo) {
                    members.push(lo.to_string());
                }
                let first = lo.max(*valid.start());
                let last = hi.min(*valid.end());
                if first <= last {
                    members.extend((first..=last).map(|id| id.to_string()));
                }
                if hi != lo && !valid.contains(&hi) {
                    members.push(hi.to_string());
                }
            }
            _ => members.push(piece.to_string()),
        }
    }
    members
}

fn vlans_for_key<'a>(config: &'a CanonicalConfig, key: &str) -> Vec<&'a Vlan> {
    let ids: Option<Vec<u32>> = expand_vlan_list(key)
        .iter()
        .map(|id| id.parse::<u32>().ok())
        .collect();
    match ids {
        Some(ids) if !ids.is_empty() => ids
            .into_iter()
            .filter_map(|id| u16::try_from(id).ok())
            .filter_map(|id| config.vlan(id))
            .collect(),
        _ => config.vlan_by_name(key).into_iter().collect(),
    }
}

fn resolve_interface(interface: &Interface, field: InterfaceField) -> Vec<String> {
    let speed_duplex_part = |prefix: &str| -> Vec<String> {
        interface
            .speed_duplex
            .iter()
            .flat_map(|sd| sd.split(", "))
            .filter_map(|part| part.strip_prefix(prefix))
            .map(str::to_string)
            .collect()
    };

    match field {
        InterfaceField::Declared => vec![interface.name.clone()],
        InterfaceField::IpAddress => interface.ip_address.iter().cloned().collect(),
        InterfaceField::SubnetMask => interface.subnet_mask.iter().cloned().collect(),
        InterfaceField::Description => interface.description.iter().cloned().collect(),
        InterfaceField::Status => vec![interface.status.as_str().to_string()],
        InterfaceField::Speed => speed_duplex_part("speed "),
        InterfaceField::Duplex => speed_duplex_part("duplex "),
        InterfaceField::PortChannelId => interface
            .port_channel_id
            .map(|id| id.to_string())
            .into_iter()
            .collect(),
        InterfaceField::Mode => interface
            .mode
            .map(|m| m.as_str().to_string())
            .into_iter()
            .collect(),
        InterfaceField::AccessVlan => interface
            .access_vlan
            .iter()
            .map(|v| v.member.clone())
            .collect(),
        InterfaceField::NativeVlan => interface
            .native_vlan
            .iter()
            .map(|v| v.member.clone())
            .collect(),
        InterfaceField::VoiceVlan => interface
            .voice_vlan
            .iter()
            .map(|v| v.member.clone())
            .collect(),
        InterfaceField::VlanMember => interface
            .access_vlan
            .iter()
            .map(|v| v.member.clone())
            .chain(interface.trunk_allowed_vlans.iter().cloned())
            .collect(),
        InterfaceField::TrunkAllowed => interface.trunk_allowed_vlans.clone(),
        InterfaceField::HelperAddress => interface.helper_addresses.iter().cloned().collect(),
        InterfaceField::PortSecurity => flag(interface.port_security),
        InterfaceField::BpduGuard => flag(interface.bpdu_guard),
        InterfaceField::Portfast => flag(interface.portfast),
    }
}

fn resolve_routing(routing: &RoutingProtocol, field: RoutingField) -> Vec<String> {
    match field {
        RoutingField::Protocol => vec![routing.protocol_type.to_string()],
        RoutingField::ProcessId => routing.process_id.iter().cloned().collect(),
        RoutingField::Network => routing.networks.clone(),
        RoutingField::Neighbor => routing.neighbors.clone(),
        RoutingField::StaticRoute => routing
            .static_routes
            .iter()
            .map(|r| format!("{} {}", r.destination, r.next_hop))
            .collect(),
        RoutingField::DefaultGateway => routing.default_gateway.iter().cloned().collect(),
    }
}

fn resolve_snmp(snmp: &SnmpConfig, field: SnmpField) -> Option<String> {
    match field {
        SnmpField::Community => snmp.community.clone(),
        SnmpField::User => snmp.user.clone(),
        SnmpField::Version => snmp.version.map(|v| snmp_version_str(v).to_string()),
        SnmpField::Access => snmp.access.map(|a| snmp_access_str(a).to_string()),
        SnmpField::Acl => snmp.acl.clone(),
    }
}

/// One `(path, value)` pair and the line it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub path: FieldPath,
    pub value: String,
    pub line: usize,
}

impl Extraction {
    pub fn new(path: FieldPath, value: impl Into<String>, line: usize) -> Self {
        Self {
            path,
            value: value.into(),
            line,
        }
    }
}

/// Everything a grammar extracted from one configuration, in source order.
#[derive(Debug, Clone, Default)]
pub struct ExtractedFields {
    entries: Vec<Extraction>,
    seen: HashSet<FieldPath>,
}

impl ExtractedFields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an extraction. Returns `false` when a single-valued path already holds a value;
    /// the earlier value is kept.
    pub fn insert(&mut self, extraction: Extraction) -> bool {
        if !extraction.path.is_multi_valued() && !self.seen.insert(extraction.path.clone()) {
            return false;
        }
        self.entries.push(extraction);
        true
    }

    pub fn iter(&self) -> impl Iterator<Item = &Extraction> {
        self.entries.iter()
    }

    pub fn values<'a>(&'a self, path: &'a FieldPath) -> impl Iterator<Item = &'a str> + 'a {
        self.entries
            .iter()
            .filter(move |e| e.path == *path)
            .map(|e| e.value.as_str())
    }

    pub fn first(&self, path: &FieldPath) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.path == *path)
            .map(|e| e.value.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<Extraction> for ExtractedFields {
    fn from_iter<I: IntoIterator<Item = Extraction>>(iter: I) -> Self {
        let mut fields = Self::new();
        for extraction in iter {
            fields.insert(extraction);
        }
        fields
    }
}
