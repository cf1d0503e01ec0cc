//! Vendor-neutral representation of one device configuration.
//!
//! Optional fields are `None` when the source never mentioned them. A device that explicitly
//! disables something is recorded as `Some(false)`, which keeps "not configured" apart from
//! "configured off".

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

pub const MIN_VLAN_ID: u16 = 1;
pub const MAX_VLAN_ID: u16 = 4094;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalConfig {
    pub device_info: DeviceInfo,
    pub interfaces: Vec<Interface>,
    pub vlans_svis: Vec<Vlan>,
    pub routing_protocols: Vec<RoutingProtocol>,
    pub security_features: SecurityFeatures,
    pub other_services: OtherServices,
}

impl CanonicalConfig {
    pub fn vlan(&self, id: u16) -> Option<&Vlan> {
        self.vlans_svis.iter().find(|v| v.vlan_id == id)
    }

    pub fn vlan_by_name(&self, name: &str) -> Option<&Vlan> {
        self.vlans_svis
            .iter()
            .find(|v| v.name.as_deref() == Some(name))
    }

    pub fn interfaces_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Interface> + 'a {
        self.interfaces.iter().filter(move |i| i.name == name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceInfo {
    pub hostname: Option<String>,
    pub os_version: Option<String>,
    pub model: Option<String>,
    pub serial_number: Option<String>,
    pub uptime: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InterfaceStatus {
    Up,
    AdminDown,
    #[default]
    Unknown,
}

impl InterfaceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::AdminDown => "admin-down",
            Self::Unknown => "unknown",
        }
    }
}

impl FromStr for InterfaceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "up" => Ok(Self::Up),
            "admin-down" => Ok(Self::AdminDown),
            "unknown" => Ok(Self::Unknown),
            other => Err(format!("unknown interface status '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwitchportMode {
    Access,
    Trunk,
    Dynamic,
    Routed,
}

impl SwitchportMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Access => "access",
            Self::Trunk => "trunk",
            Self::Dynamic => "dynamic",
            Self::Routed => "routed",
        }
    }
}

impl FromStr for SwitchportMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "access" => Ok(Self::Access),
            "trunk" | "tagged-access" => Ok(Self::Trunk),
            "dynamic" | "dynamic-auto" | "dynamic-desirable" => Ok(Self::Dynamic),
            "routed" => Ok(Self::Routed),
            other => Err(format!("unknown switchport mode '{}'", other)),
        }
    }
}

/// A VLAN as referenced from an interface: the member text exactly as configured, plus the
/// numeric id once it is known.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VlanRef {
    pub member: String,
    pub vlan_id: Option<u16>,
}

impl fmt::Display for VlanRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.vlan_id {
            Some(id) if id.to_string() != self.member => write!(f, "{} ({})", self.member, id),
            _ => f.write_str(&self.member),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Interface {
    pub name: String,
    pub ip_address: Option<String>,
    pub subnet_mask: Option<String>,
    pub description: Option<String>,
    pub status: InterfaceStatus,
    pub speed_duplex: Option<String>,
    pub port_channel_id: Option<u32>,
    /// Name of the aggregate interface this member resolved to.
    pub parent_port_channel: Option<String>,
    pub mode: Option<SwitchportMode>,
    pub access_vlan: Option<VlanRef>,
    pub native_vlan: Option<VlanRef>,
    pub voice_vlan: Option<VlanRef>,
    /// Allowed list exactly as configured: ids, ranges, names or `all`.
    pub trunk_allowed_vlans: Vec<String>,
    /// The allowed list resolved to individual VLANs.
    pub trunk_vlans: Vec<VlanRef>,
    /// VLAN this interface is the layer 3 interface (SVI) of.
    pub svi_vlan: Option<u16>,
    pub helper_addresses: BTreeSet<String>,
    pub port_security: Option<bool>,
    pub bpdu_guard: Option<bool>,
    pub portfast: Option<bool>,
}

impl Interface {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn is_access_port(&self) -> bool {
        self.mode == Some(SwitchportMode::Access)
    }

    /// Every VLAN reference this interface makes, with the role it plays.
    pub fn vlan_references(&self) -> Vec<(&'static str, VlanRef)> {
        let mut refs = Vec::new();
        if let Some(access) = &self.access_vlan {
            refs.push(("access", access.clone()));
        }
        if let Some(native) = &self.native_vlan {
            refs.push(("native", native.clone()));
        }
        if let Some(voice) = &self.voice_vlan {
            refs.push(("voice", voice.clone()));
        }
        refs.extend(self.trunk_vlans.iter().map(|vlan| ("trunk", vlan.clone())));
        if let Some(id) = self.svi_vlan {
            refs.push((
                "svi",
                VlanRef {
                    member: id.to_string(),
                    vlan_id: Some(id),
                },
            ));
        }
        refs
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vlan {
    pub vlan_id: u16,
    pub name: Option<String>,
    pub svi_ip_address: Option<String>,
    pub helper_addresses: BTreeSet<String>,
    pub network_range: Option<String>,
    pub svi_interface: Option<String>,
}

impl Vlan {
    pub fn new(vlan_id: u16) -> Self {
        Self {
            vlan_id,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProtocolType {
    Static,
    Ospf,
    Ospfv3,
    Bgp,
    Eigrp,
    Rip,
    Isis,
    Other(String),
}

impl ProtocolType {
    pub fn parse(keyword: &str) -> Self {
        match keyword.to_ascii_lowercase().as_str() {
            "static" => Self::Static,
            "ospf" => Self::Ospf,
            "ospf3" | "ospfv3" => Self::Ospfv3,
            "bgp" => Self::Bgp,
            "eigrp" => Self::Eigrp,
            "rip" | "ripng" => Self::Rip,
            "isis" => Self::Isis,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for ProtocolType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static => f.write_str("static"),
            Self::Ospf => f.write_str("ospf"),
            Self::Ospfv3 => f.write_str("ospfv3"),
            Self::Bgp => f.write_str("bgp"),
            Self::Eigrp => f.write_str("eigrp"),
            Self::Rip => f.write_str("rip"),
            Self::Isis => f.write_str("isis"),
            Self::Other(name) => f.write_str(name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaticRoute {
    pub destination: String,
    pub next_hop: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutingProtocol {
    pub protocol_type: ProtocolType,
    pub process_id: Option<String>,
    pub networks: Vec<String>,
    pub neighbors: Vec<String>,
    pub static_routes: Vec<StaticRoute>,
    pub default_gateway: Option<String>,
}

impl RoutingProtocol {
    pub fn new(protocol_type: ProtocolType) -> Self {
        Self {
            protocol_type,
            process_id: None,
            networks: Vec::new(),
            neighbors: Vec::new(),
            static_routes: Vec::new(),
            default_gateway: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnmpVersion {
    V1,
    V2c,
    V3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SnmpAccess {
    ReadOnly,
    ReadWrite,
}

impl FromStr for SnmpAccess {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ro" | "read-only" => Ok(Self::ReadOnly),
            "rw" | "read-write" => Ok(Self::ReadWrite),
            other => Err(format!("unknown SNMP access '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnmpConfig {
    pub version: Option<SnmpVersion>,
    pub community: Option<String>,
    pub user: Option<String>,
    pub access: Option<SnmpAccess>,
    pub acl: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AclAction {
    Permit,
    Deny,
    Remark,
    Other,
}

impl AclAction {
    pub fn classify(entry: &str) -> Self {
        let first = entry.split_whitespace().next().unwrap_or("");
        let action = if first == "term" || first == "then" {
            entry.split_whitespace().last().unwrap_or("")
        } else {
            first
        };
        match action {
            "permit" | "accept" => Self::Permit,
            "deny" | "discard" | "reject" => Self::Deny,
            "remark" => Self::Remark,
            _ => Self::Other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AclEntry {
    pub action: AclAction,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Acl {
    pub name: String,
    pub kind: Option<String>,
    pub entries: Vec<AclEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnableCredential {
    Secret,
    Password,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityFeatures {
    pub password_encryption_enabled: Option<bool>,
    pub aaa_configured: Option<bool>,
    pub ssh_configured: Option<bool>,
    pub telnet_enabled: Option<bool>,
    pub snmp_configs: Vec<SnmpConfig>,
    pub acls: Vec<Acl>,
    pub http_server_disabled: Option<bool>,
    pub https_server_enabled: Option<bool>,
    pub enable_credential: Option<EnableCredential>,
    pub login_banner: Option<bool>,
    pub bpdu_guard_default: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OtherServices {
    pub ntp_servers: BTreeSet<String>,
    pub dns_servers: BTreeSet<String>,
    pub domain_name: Option<String>,
    pub vtp_mode: Option<String>,
    pub cdp_enabled: Option<bool>,
    pub lldp_enabled: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_fields_serialize_as_null() {
        let config = CanonicalConfig::default();
        let json = serde_json::to_value(&config).unwrap();
        assert!(json["deviceInfo"]["hostname"].is_null());
        assert!(json["securityFeatures"]["httpServerDisabled"].is_null());
        assert_eq!(json["vlansSvis"], serde_json::json!([]));
    }

    #[test]
    fn test_acl_action_classification() {
        assert_eq!(AclAction::classify("permit ip any any"), AclAction::Permit);
        assert_eq!(AclAction::classify("deny 10.0.0.0 0.255.255.255"), AclAction::Deny);
        assert_eq!(AclAction::classify("term block then discard"), AclAction::Deny);
        assert_eq!(AclAction::classify("remark mgmt"), AclAction::Remark);
        assert_eq!(AclAction::classify("evaluate other"), AclAction::Other);
    }

    #[test]
    fn test_vlan_references_include_svi() {
        let mut iface = Interface::new("Vlan10");
        iface.svi_vlan = Some(10);
        iface.access_vlan = Some(VlanRef {
            member: "DATA".to_string(),
            vlan_id: None,
        });
        let refs = iface.vlan_references();
        assert_eq!(refs.len(), 2);
        assert_eq!(refs[1].0, "svi");
        assert_eq!(refs[1].1.vlan_id, Some(10));
    }

    #[test]
    fn test_vlan_references_include_voice_and_trunk() {
        let mut iface = Interface::new("Gi0/2");
        iface.voice_vlan = Some(VlanRef {
            member: "77".to_string(),
            vlan_id: Some(77),
        });
        iface.trunk_vlans = vec![
            VlanRef {
                member: "10".to_string(),
                vlan_id: Some(10),
            },
            VlanRef {
                member: "VOICE".to_string(),
                vlan_id: None,
            },
        ];
        let roles: Vec<&str> = iface.vlan_references().iter().map(|(role, _)| *role).collect();
        assert_eq!(roles, vec!["voice", "trunk", "trunk"]);
    }

    #[test]
    fn test_switchport_mode_parse() {
        assert_eq!("Access".parse::<SwitchportMode>().unwrap(), SwitchportMode::Access);
        assert_eq!(
            "dynamic-desirable".parse::<SwitchportMode>().unwrap(),
            SwitchportMode::Dynamic
        );
        assert!("private-vlan".parse::<SwitchportMode>().is_err());
    }
}
