//! Cisco IOS style grammar: indentation blocks closed by `!`.

use super::{
    bool_str, capture, on_acl, on_interface, on_routing, on_vlan, single, PatternRule, Scope,
    VendorGrammar,
};
use crate::model::{ProtocolType, SwitchportMode, Vendor};
use crate::parser::addr;
use crate::parser::fields::{
    expand_vlan_list, AclField, DeviceField, Extraction, FieldPath, InterfaceField, RoutingField,
    SecurityField, ServiceField, SnmpField, VlanField,
};
use crate::parser::tokenizer::{
    BlockContext, BlockFrame, BlockStart, BlockStyle, Dialect, LogicalLine,
};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static INTERFACE_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^interface (\S+)$").expect("INTERFACE_HEADER invalid"));
static VLAN_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^vlan (\S+)$").expect("VLAN_HEADER invalid"));
static ROUTER_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^router (\S+)(?: (\S+))?").expect("ROUTER_HEADER invalid"));
static ACL_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^ip access-list (?:standard|extended) (\S+)").expect("ACL_HEADER invalid")
});
static LINE_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^line (.+)$").expect("LINE_HEADER invalid"));
static SVI_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^vlan(\d+)$").expect("SVI_NAME invalid"));
static AGGREGATE_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:port-channel|po)(\d+)$").expect("AGGREGATE_NAME invalid")
});
static BANNER_START: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^banner (?:motd|login|exec|incoming) (\^C|\S)").expect("BANNER_START invalid")
});

pub struct CiscoIosGrammar {
    dialect: Dialect,
    rules: Vec<PatternRule>,
}

impl CiscoIosGrammar {
    pub fn new() -> Self {
        Self {
            dialect: Dialect {
                block_style: BlockStyle::Indentation,
                comment_prefixes: &["!"],
                continuation: Some('\\'),
                terminator: None,
            },
            rules: rules(),
        }
    }
}

impl Default for CiscoIosGrammar {
    fn default() -> Self {
        Self::new()
    }
}

impl VendorGrammar for CiscoIosGrammar {
    fn vendor(&self) -> Vendor {
        Vendor::CiscoIos
    }

    fn dialect(&self) -> &Dialect {
        &self.dialect
    }

    fn match_block_start(&self, header: &str, enclosing: &[BlockFrame]) -> Option<BlockStart> {
        if !enclosing.is_empty() {
            return None;
        }

        if let Some(c) = INTERFACE_HEADER.captures(header) {
            return Some(BlockStart::keyed(BlockContext::Interface, capture(&c, 1)));
        }
        if let Some(c) = VLAN_HEADER.captures(header) {
            return Some(BlockStart::keyed(BlockContext::Vlan, capture(&c, 1)));
        }
        if let Some(c) = ROUTER_HEADER.captures(header) {
            return Some(BlockStart::keyed(
                BlockContext::Routing,
                routing_key(capture(&c, 1), c.get(2).map(|m| m.as_str())),
            ));
        }
        if let Some(c) = ACL_HEADER.captures(header) {
            return Some(BlockStart::keyed(BlockContext::Acl, capture(&c, 1)));
        }
        if let Some(c) = LINE_HEADER.captures(header) {
            return Some(BlockStart::keyed(BlockContext::Line, capture(&c, 1)));
        }
        None
    }

    fn match_block_end(&self, line: &str) -> bool {
        matches!(line, "!" | "exit" | "end") || line.starts_with("exit-")
    }

    fn rules(&self) -> &[PatternRule] {
        &self.rules
    }

    fn svi_vlan_id(&self, interface: &str) -> Option<u16> {
        SVI_NAME.captures(interface)?.get(1)?.as_str().parse().ok()
    }

    fn aggregate_id(&self, interface: &str) -> Option<u32> {
        AGGREGATE_NAME.captures(interface)?.get(1)?.as_str().parse().ok()
    }

    fn multiline_delimiter(&self, line: &str) -> Option<String> {
        let captures = BANNER_START.captures(line)?;
        let opening = captures.get(1)?;
        let delimiter = opening.as_str();
        let rest = &line[opening.end()..];
        if rest.contains(delimiter) {
            None
        } else {
            Some(delimiter.to_string())
        }
    }
}

fn routing_key(protocol: &str, process_id: Option<&str>) -> String {
    let protocol = ProtocolType::parse(protocol);
    match process_id {
        Some(id) => format!("{} {}", protocol, id),
        None => protocol.to_string(),
    }
}

fn device(field: DeviceField) -> FieldPath {
    FieldPath::Device(field)
}

fn security(field: SecurityField) -> FieldPath {
    FieldPath::Security(field)
}

fn service(field: ServiceField) -> FieldPath {
    FieldPath::Service(field)
}

/// `no <command>` lines turn a feature off.
fn negatable(path: FieldPath, c: &Captures<'_>, l: &LogicalLine) -> Vec<Extraction> {
    let enabled = c.get(1).is_none();
    vec![Extraction::new(path, bool_str(enabled), l.number)]
}

fn canonical_mode(raw: &str) -> String {
    let joined = raw.trim().replace(' ', "-");
    joined
        .parse::<SwitchportMode>()
        .map(|mode| mode.as_str().to_string())
        .unwrap_or(joined)
}

/// Numbered ACL kind by IOS number range.
fn numbered_acl_kind(name: &str) -> &'static str {
    match name.parse::<u32>() {
        Ok(1..=99) | Ok(1300..=1999) => "standard",
        Ok(100..=199) | Ok(2000..=2699) => "extended",
        _ => "named",
    }
}

fn rules() -> Vec<PatternRule> {
    use BlockContext::*;

    vec![
        // Device identity, including pasted `show version` output.
        PatternRule::new("hostname", Scope::Global, r"^hostname (\S+)$", |c, l| {
            single(device(DeviceField::Hostname), c, l)
        }),
        PatternRule::new("version", Scope::Global, r"^version (\S+)$", |c, l| {
            single(device(DeviceField::OsVersion), c, l)
        }),
        PatternRule::new(
            "show-version-os",
            Scope::Global,
            r"^Cisco IOS.*Version ([^,\s]+)",
            |c, l| single(device(DeviceField::OsVersion), c, l),
        ),
        PatternRule::new(
            "show-version-model",
            Scope::Global,
            r"^(?:[Cc]isco (\S+) \(.*\) processor|Model [Nn]umber\s*:\s*(\S+))",
            |c, l| {
                let model = c.get(1).or_else(|| c.get(2)).map_or("", |m| m.as_str());
                vec![Extraction::new(device(DeviceField::Model), model, l.number)]
            },
        ),
        PatternRule::new(
            "show-version-serial",
            Scope::Global,
            r"^(?:Processor board ID|System [Ss]erial [Nn]umber\s*:)\s*(\S+)",
            |c, l| single(device(DeviceField::SerialNumber), c, l),
        ),
        PatternRule::new("show-version-uptime", Scope::Global, r"^\S+ uptime is (.+)$", |c, l| {
            single(device(DeviceField::Uptime), c, l)
        }),
        // Security
        PatternRule::new(
            "password-encryption",
            Scope::Global,
            r"^(no )?service password-encryption$",
            |c, l| negatable(security(SecurityField::PasswordEncryption), c, l),
        ),
        PatternRule::new("aaa-new-model", Scope::Global, r"^(no )?aaa new-model$", |c, l| {
            negatable(security(SecurityField::Aaa), c, l)
        }),
        PatternRule::ignore("aaa", Scope::Global, r"^aaa "),
        PatternRule::new("ip-ssh", Scope::Global, r"^ip ssh ", |_, l| {
            vec![Extraction::new(security(SecurityField::Ssh), "true", l.number)]
        }),
        PatternRule::new("http-server", Scope::Global, r"^(no )?ip http server$", |c, l| {
            // A `no` line is what disables the server.
            let disabled = c.get(1).is_some();
            vec![Extraction::new(
                security(SecurityField::HttpServerDisabled),
                bool_str(disabled),
                l.number,
            )]
        }),
        PatternRule::new(
            "https-server",
            Scope::Global,
            r"^(no )?ip http secure-server$",
            |c, l| negatable(security(SecurityField::HttpsServer), c, l),
        ),
        PatternRule::ignore("http-other", Scope::Global, r"^(?:no )?ip http "),
        PatternRule::new("enable", Scope::Global, r"^enable (secret|password) ", |c, l| {
            single(security(SecurityField::EnableCredential), c, l)
        }),
        PatternRule::new("banner", Scope::Global, r"^banner (?:motd|login) ", |_, l| {
            vec![Extraction::new(security(SecurityField::LoginBanner), "true", l.number)]
        }),
        PatternRule::ignore("banner-other", Scope::Global, r"^banner "),
        PatternRule::new(
            "bpduguard-default",
            Scope::Global,
            r"^spanning-tree portfast (?:edge )?bpduguard default$",
            |_, l| {
                vec![Extraction::new(
                    security(SecurityField::BpduGuardDefault),
                    "true",
                    l.number,
                )]
            },
        ),
        PatternRule::ignore("spanning-tree", Scope::Global, r"^spanning-tree "),
        PatternRule::new(
            "numbered-acl",
            Scope::Global,
            r"^access-list (\S+) (.+)$",
            |c, l| {
                let name = capture(c, 1);
                vec![
                    Extraction::new(
                        FieldPath::acl(name, AclField::Declared),
                        numbered_acl_kind(name),
                        l.number,
                    ),
                    Extraction::new(FieldPath::acl(name, AclField::Entry), capture(c, 2), l.number),
                ]
            },
        ),
        PatternRule::new(
            "snmp-community",
            Scope::Global,
            r"^snmp-server community (\S+)(?: view \S+)?(?: (?i:(ro|rw)))?(?: (?:ipv6 \S+ )?(\S+))?$",
            |c, l| {
                let key = format!("community {}", capture(c, 1));
                let mut out = vec![
                    Extraction::new(FieldPath::snmp(&key, SnmpField::Community), capture(c, 1), l.number),
                    Extraction::new(FieldPath::snmp(&key, SnmpField::Version), "v2c", l.number),
                ];
                if let Some(access) = c.get(2) {
                    let access = if access.as_str().eq_ignore_ascii_case("rw") {
                        "read-write"
                    } else {
                        "read-only"
                    };
                    out.push(Extraction::new(FieldPath::snmp(&key, SnmpField::Access), access, l.number));
                }
                if let Some(acl) = c.get(3) {
                    out.push(Extraction::new(FieldPath::snmp(&key, SnmpField::Acl), acl.as_str(), l.number));
                }
                out
            },
        ),
        PatternRule::new(
            "snmp-user",
            Scope::Global,
            r"^snmp-server user (\S+) \S+ (v1|v2c|v3)\b",
            |c, l| {
                let key = format!("user {}", capture(c, 1));
                vec![
                    Extraction::new(FieldPath::snmp(&key, SnmpField::User), capture(c, 1), l.number),
                    Extraction::new(FieldPath::snmp(&key, SnmpField::Version), capture(c, 2), l.number),
                ]
            },
        ),
        PatternRule::ignore("snmp-other", Scope::Global, r"^snmp-server "),
        // Services
        PatternRule::new(
            "ntp-server",
            Scope::Global,
            r"^ntp server (?:vrf \S+ )?(\S+)",
            |c, l| single(service(ServiceField::NtpServer), c, l),
        ),
        PatternRule::new(
            "name-server",
            Scope::Global,
            r"^ip name-server (?:vrf \S+ )?(.+)$",
            |c, l| {
                capture(c, 1)
                    .split_whitespace()
                    .map(|server| Extraction::new(service(ServiceField::DnsServer), server, l.number))
                    .collect()
            },
        ),
        PatternRule::new(
            "domain-name",
            Scope::Global,
            r"^ip domain[- ]name (\S+)$",
            |c, l| single(service(ServiceField::DomainName), c, l),
        ),
        PatternRule::new("vtp-mode", Scope::Global, r"^vtp mode (\S+)$", |c, l| {
            vec![Extraction::new(
                service(ServiceField::VtpMode),
                capture(c, 1).to_ascii_lowercase(),
                l.number,
            )]
        }),
        PatternRule::new("cdp", Scope::Global, r"^(no )?cdp run$", |c, l| {
            negatable(service(ServiceField::Cdp), c, l)
        }),
        PatternRule::new("lldp", Scope::Global, r"^(no )?lldp run$", |c, l| {
            negatable(service(ServiceField::Lldp), c, l)
        }),
        // Static routing
        PatternRule::new(
            "ip-route",
            Scope::Global,
            r"^ip route (?:vrf \S+ )?(\S+) (\S+) (\S+)",
            |c, l| {
                let (address, mask, next_hop) = (capture(c, 1), capture(c, 2), capture(c, 3));
                let destination =
                    addr::to_cidr(address, mask).unwrap_or_else(|| format!("{} {}", address, mask));
                vec![Extraction::new(
                    FieldPath::routing("static", RoutingField::StaticRoute),
                    format!("{} {}", destination, next_hop),
                    l.number,
                )]
            },
        ),
        PatternRule::new(
            "default-gateway",
            Scope::Global,
            r"^ip default-gateway (\S+)$",
            |c, l| single(FieldPath::routing("static", RoutingField::DefaultGateway), c, l),
        ),
        // Interface blocks
        PatternRule::new("interface", Scope::Header(Interface), r"^interface ", |_, l| {
            let name = l.block_key.clone().unwrap_or_default();
            vec![Extraction::new(on_interface(l, InterfaceField::Declared), name, l.number)]
        }),
        PatternRule::new("description", Scope::Body(Interface), r"^description (.+)$", |c, l| {
            single(on_interface(l, InterfaceField::Description), c, l)
        }),
        PatternRule::new(
            "ip-address",
            Scope::Body(Interface),
            r"^ip address (\d+\.\d+\.\d+\.\d+)(?:/(\d+)| (\d+\.\d+\.\d+\.\d+))",
            |c, l| {
                let mask = match c.get(2) {
                    Some(len) => len.as_str().parse().ok().and_then(addr::prefix_to_mask),
                    None => Some(capture(c, 3).to_string()),
                };
                let mut out = vec![Extraction::new(
                    on_interface(l, InterfaceField::IpAddress),
                    capture(c, 1),
                    l.number,
                )];
                if let Some(mask) = mask {
                    out.push(Extraction::new(on_interface(l, InterfaceField::SubnetMask), mask, l.number));
                }
                out
            },
        ),
        PatternRule::ignore("no-ip-address", Scope::Body(Interface), r"^no ip address$"),
        PatternRule::new("shutdown", Scope::Body(Interface), r"^(no )?shutdown$", |c, l| {
            let status = if c.get(1).is_some() { "up" } else { "admin-down" };
            vec![Extraction::new(on_interface(l, InterfaceField::Status), status, l.number)]
        }),
        PatternRule::new("speed", Scope::Body(Interface), r"^speed (\S+)$", |c, l| {
            single(on_interface(l, InterfaceField::Speed), c, l)
        }),
        PatternRule::new("duplex", Scope::Body(Interface), r"^duplex (\S+)$", |c, l| {
            single(on_interface(l, InterfaceField::Duplex), c, l)
        }),
        PatternRule::new("channel-group", Scope::Body(Interface), r"^channel-group (\d+)", |c, l| {
            single(on_interface(l, InterfaceField::PortChannelId), c, l)
        }),
        PatternRule::new("switchport-mode", Scope::Body(Interface), r"^switchport mode (.+)$", |c, l| {
            vec![Extraction::new(
                on_interface(l, InterfaceField::Mode),
                canonical_mode(capture(c, 1)),
                l.number,
            )]
        }),
        PatternRule::new("routed-port", Scope::Body(Interface), r"^no switchport$", |_, l| {
            vec![Extraction::new(on_interface(l, InterfaceField::Mode), "routed", l.number)]
        }),
        PatternRule::new(
            "access-vlan",
            Scope::Body(Interface),
            r"^switchport access vlan (\S+)$",
            |c, l| single(on_interface(l, InterfaceField::AccessVlan), c, l),
        ),
        PatternRule::new(
            "native-vlan",
            Scope::Body(Interface),
            r"^switchport trunk native vlan (\S+)$",
            |c, l| single(on_interface(l, InterfaceField::NativeVlan), c, l),
        ),
        PatternRule::new(
            "trunk-allowed",
            Scope::Body(Interface),
            r"^switchport trunk allowed vlan (?:add )?(\S+)$",
            |c, l| {
                capture(c, 1)
                    .split(',')
                    .filter(|member| !member.is_empty())
                    .map(|member| {
                        Extraction::new(on_interface(l, InterfaceField::TrunkAllowed), member, l.number)
                    })
                    .collect()
            },
        ),
        PatternRule::new(
            "port-security",
            Scope::Body(Interface),
            r"^switchport port-security$",
            |_, l| vec![Extraction::new(on_interface(l, InterfaceField::PortSecurity), "true", l.number)],
        ),
        PatternRule::new(
            "voice-vlan",
            Scope::Body(Interface),
            r"^switchport voice vlan (\d+)$",
            |c, l| single(on_interface(l, InterfaceField::VoiceVlan), c, l),
        ),
        PatternRule::ignore(
            "switchport-other",
            Scope::Body(Interface),
            r"^(?:switchport|switchport nonegotiate|switchport trunk encapsulation \S+|switchport voice vlan (?:dot1p|untagged|none)|switchport port-security (?:maximum \d+|violation \S+|aging .+|mac-address sticky))$",
        ),
        PatternRule::new(
            "bpduguard",
            Scope::Body(Interface),
            r"^spanning-tree bpduguard (enable|disable)$",
            |c, l| {
                let enabled = capture(c, 1) == "enable";
                vec![Extraction::new(on_interface(l, InterfaceField::BpduGuard), bool_str(enabled), l.number)]
            },
        ),
        PatternRule::new(
            "portfast",
            Scope::Body(Interface),
            r"^spanning-tree portfast(?: (edge|disable))?(?: trunk)?$",
            |c, l| {
                let enabled = c.get(1).map_or(true, |m| m.as_str() != "disable");
                vec![Extraction::new(on_interface(l, InterfaceField::Portfast), bool_str(enabled), l.number)]
            },
        ),
        PatternRule::new(
            "helper-address",
            Scope::Body(Interface),
            r"^ip helper-address (\S+)$",
            |c, l| single(on_interface(l, InterfaceField::HelperAddress), c, l),
        ),
        // VLAN blocks
        PatternRule::new("vlan", Scope::Header(Vlan), r"^vlan (\S+)$", |c, l| {
            expand_vlan_list(capture(c, 1))
                .into_iter()
                .map(|id| Extraction::new(on_vlan(l, VlanField::Id), id, l.number))
                .collect()
        }),
        PatternRule::new("vlan-name", Scope::Body(Vlan), r"^name (\S+)$", |c, l| {
            single(on_vlan(l, VlanField::Name), c, l)
        }),
        // Routing processes
        PatternRule::new("router", Scope::Header(Routing), r"^router (\S+)(?: (\S+))?", |c, l| {
            let mut out = vec![Extraction::new(
                on_routing(l, RoutingField::Protocol),
                ProtocolType::parse(capture(c, 1)).to_string(),
                l.number,
            )];
            if let Some(id) = c.get(2) {
                out.push(Extraction::new(on_routing(l, RoutingField::ProcessId), id.as_str(), l.number));
            }
            out
        }),
        PatternRule::new("network", Scope::Body(Routing), r"^network (.+)$", |c, l| {
            single(on_routing(l, RoutingField::Network), c, l)
        }),
        PatternRule::new("neighbor", Scope::Body(Routing), r"^neighbor (\S+) ", |c, l| {
            single(on_routing(l, RoutingField::Neighbor), c, l)
        }),
        PatternRule::ignore(
            "routing-other",
            Scope::Body(Routing),
            r"^(?:router-id|passive-interface|redistribute|address-family|log-adjacency-changes|bgp|(?:no )?auto-summary|area|default-information|maximum-paths|timers)\b",
        ),
        // Named ACL blocks
        PatternRule::new(
            "acl",
            Scope::Header(Acl),
            r"^ip access-list (standard|extended) ",
            |c, l| single(on_acl(l, AclField::Declared), c, l),
        ),
        PatternRule::new(
            "acl-entry",
            Scope::Body(Acl),
            r"^(?:\d+ )?((?:permit|deny|remark) .*)$",
            |c, l| single(on_acl(l, AclField::Entry), c, l),
        ),
        // Terminal lines
        PatternRule::ignore("line", Scope::Header(Line), r"^line "),
        PatternRule::new("transport-input", Scope::Body(Line), r"^transport input (.+)$", |c, l| {
            let protocols: Vec<&str> = capture(c, 1).split_whitespace().collect();
            let all = protocols.contains(&"all");
            let telnet = all || protocols.contains(&"telnet");
            let ssh = all || protocols.contains(&"ssh");
            let mut out = vec![Extraction::new(security(SecurityField::Telnet), bool_str(telnet), l.number)];
            if ssh {
                out.push(Extraction::new(security(SecurityField::Ssh), "true", l.number));
            }
            out
        }),
        PatternRule::ignore(
            "line-other",
            Scope::Body(Line),
            r"^(?:exec-timeout|logging synchronous|login|password|privilege|transport output|session-timeout|access-class|stopbits)\b",
        ),
    ]
}
