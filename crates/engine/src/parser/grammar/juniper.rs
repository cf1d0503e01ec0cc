//! Junos style grammar: curly-brace hierarchy with `;` terminated statements.
//!
//! Only the hierarchical form is understood. Flat `set` command listings are not.

use super::{
    capture, on_acl, on_interface, on_routing, on_snmp, on_vlan, single, PatternRule, Scope,
    VendorGrammar,
};
use crate::model::{ProtocolType, SwitchportMode, Vendor};
use crate::parser::addr;
use crate::parser::fields::{
    AclField, DeviceField, Extraction, FieldPath, InterfaceField, RoutingField, SecurityField,
    ServiceField, SnmpField, VlanField,
};
use crate::parser::tokenizer::{
    BlockContext, BlockFrame, BlockStart, BlockStyle, Dialect, LogicalLine,
};
use once_cell::sync::Lazy;
use regex::Regex;

static SVI_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^vlan\.(\d+)$").expect("SVI_NAME invalid"));
static AGGREGATE_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^ae(\d+)$").expect("AGGREGATE_NAME invalid"));

/// Settings under a RADIUS or TACACS+ server entry.
const AAA_SERVER_BODY: &str =
    r"^(?:secret .+|source-address \S+|port \d+|accounting-port \d+|timeout \d+|retry \d+|single-connection)$";

pub struct JuniperGrammar {
    dialect: Dialect,
    rules: Vec<PatternRule>,
}

impl JuniperGrammar {
    pub fn new() -> Self {
        Self {
            dialect: Dialect {
                block_style: BlockStyle::Braces,
                comment_prefixes: &["#", "/*"],
                continuation: None,
                terminator: Some(';'),
            },
            rules: rules(),
        }
    }
}

impl Default for JuniperGrammar {
    fn default() -> Self {
        Self::new()
    }
}

impl VendorGrammar for JuniperGrammar {
    fn vendor(&self) -> Vendor {
        Vendor::Juniper
    }

    fn dialect(&self) -> &Dialect {
        &self.dialect
    }

    fn match_block_start(&self, header: &str, enclosing: &[BlockFrame]) -> Option<BlockStart> {
        let Some(top) = enclosing.first() else {
            return match header {
                "system" => Some(BlockStart::new(BlockContext::System, None)),
                "snmp" => Some(BlockStart::new(BlockContext::Snmp, None)),
                _ => None,
            };
        };
        let nested = enclosing.len();
        let innermost = &enclosing[nested - 1];

        match top.header.as_str() {
            "interfaces" if nested == 1 => {
                Some(BlockStart::keyed(BlockContext::Interface, header))
            }
            "interfaces" => {
                let unit = header.strip_prefix("unit ")?;
                if innermost.context != BlockContext::Interface || unit == "0" {
                    return None;
                }
                let physical = innermost.key.as_deref()?.split('.').next()?;
                Some(BlockStart::keyed(
                    BlockContext::Interface,
                    format!("{}.{}", physical, unit),
                ))
            }
            "vlans" if nested == 1 => Some(BlockStart::keyed(BlockContext::Vlan, header)),
            "protocols" if nested == 1 => match header {
                "ospf" | "ospf3" | "bgp" | "rip" | "isis" => Some(BlockStart::keyed(
                    BlockContext::Routing,
                    ProtocolType::parse(header).to_string(),
                )),
                "lldp" => Some(BlockStart::keyed(BlockContext::Services, "lldp")),
                "rstp" | "stp" | "mstp" => Some(BlockStart::keyed(BlockContext::Services, "stp")),
                _ => None,
            },
            "routing-options" if nested == 1 && header == "static" => {
                Some(BlockStart::keyed(BlockContext::Routing, "static"))
            }
            "snmp" => {
                if header.starts_with("community ") || header.starts_with("user ") {
                    Some(BlockStart::keyed(BlockContext::Snmp, header))
                } else {
                    None
                }
            }
            "firewall" => header
                .strip_prefix("filter ")
                .map(|name| BlockStart::keyed(BlockContext::Acl, name)),
            "system" if nested == 1 => match header {
                "services" | "ntp" | "name-server" => {
                    Some(BlockStart::keyed(BlockContext::Services, header))
                }
                "login" => Some(BlockStart::keyed(BlockContext::System, "login")),
                _ => None,
            },
            _ => None,
        }
    }

    fn match_block_end(&self, line: &str) -> bool {
        line.starts_with('}')
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
}

fn device(field: DeviceField) -> FieldPath {
    FieldPath::Device(field)
}

fn security(field: SecurityField, value: &str, line: &LogicalLine) -> Extraction {
    Extraction::new(FieldPath::Security(field), value, line.number)
}

fn service(field: ServiceField) -> FieldPath {
    FieldPath::Service(field)
}

fn unquote(value: &str) -> &str {
    value.trim().trim_matches('"')
}

fn acl_entry(action: &str, line: &LogicalLine) -> Extraction {
    let entry = match line.parent.as_deref() {
        Some(parent) if parent.starts_with("term ") => format!("{} then {}", parent, action),
        _ => format!("then {}", action),
    };
    Extraction::new(on_acl(line, AclField::Entry), entry, line.number)
}

fn rules() -> Vec<PatternRule> {
    use BlockContext::*;

    vec![
        // Global statements and pasted `show version` output.
        PatternRule::new("version", Scope::Global, r"^version (\S+)$", |c, l| {
            single(device(DeviceField::OsVersion), c, l)
        }),
        PatternRule::new("show-version-hostname", Scope::Global, r"^Hostname: (\S+)$", |c, l| {
            single(device(DeviceField::Hostname), c, l)
        }),
        PatternRule::new("show-version-model", Scope::Global, r"^Model: (\S+)$", |c, l| {
            single(device(DeviceField::Model), c, l)
        }),
        PatternRule::new(
            "show-version-os",
            Scope::Global,
            r"^(?:Junos|JUNOS Software Release \[)[: ]*([^\]\s]+)",
            |c, l| single(device(DeviceField::OsVersion), c, l),
        ),
        // System
        PatternRule::new("host-name", Scope::Within(System), r"^host-name (\S+)$", |c, l| {
            single(device(DeviceField::Hostname), c, l)
        }),
        PatternRule::new("domain-name", Scope::Within(System), r"^domain-name (\S+)$", |c, l| {
            single(service(ServiceField::DomainName), c, l)
        }),
        PatternRule::new("name-server-inline", Scope::Within(System), r"^name-server (\S+)$", |c, l| {
            single(service(ServiceField::DnsServer), c, l)
        }),
        PatternRule::new(
            "root-authentication",
            Scope::Within(System),
            r"^root-authentication$",
            |_, l| {
                vec![
                    security(SecurityField::PasswordEncryption, "true", l),
                    security(SecurityField::EnableCredential, "secret", l),
                ]
            },
        ),
        PatternRule::new(
            "authentication-order",
            Scope::Within(System),
            r"^authentication-order ",
            |_, l| vec![security(SecurityField::Aaa, "true", l)],
        ),
        PatternRule::new("login-message", Scope::Within(System), r"^(?:message|announcement) ", |_, l| {
            vec![security(SecurityField::LoginBanner, "true", l)]
        }),
        PatternRule::ignore(
            "system-other",
            Scope::Within(System),
            r"^(?:encrypted-password|radius-server|tacplus-server|class|user|authentication|uid|full-name|time-zone|syslog|archive)\b",
        ),
        PatternRule::ignore(
            "system-aaa-server-body",
            Scope::Under(System, "radius-server"),
            AAA_SERVER_BODY,
        ),
        PatternRule::ignore(
            "system-tacplus-body",
            Scope::Under(System, "tacplus-server"),
            AAA_SERVER_BODY,
        ),
        PatternRule::new("ssh", Scope::Section(Services, "services"), r"^ssh\b", |_, l| {
            vec![security(SecurityField::Ssh, "true", l)]
        }),
        PatternRule::new("telnet", Scope::Section(Services, "services"), r"^telnet\b", |_, l| {
            vec![security(SecurityField::Telnet, "true", l)]
        }),
        PatternRule::new("http", Scope::Section(Services, "services"), r"^http$", |_, l| {
            vec![security(SecurityField::HttpServerDisabled, "false", l)]
        }),
        PatternRule::new("https", Scope::Section(Services, "services"), r"^https\b", |_, l| {
            vec![security(SecurityField::HttpsServer, "true", l)]
        }),
        PatternRule::ignore(
            "services-other",
            Scope::Section(Services, "services"),
            r"^(?:netconf|rest|outbound-ssh|root-login \S+|protocol-version \S+|connection-limit \d+|rate-limit \d+|session-timeout \d+|max-sessions-per-connection \d+|interface \S+)$",
        ),
        PatternRule::new("ntp-server", Scope::Section(Services, "ntp"), r"^server (\S+)", |c, l| {
            single(service(ServiceField::NtpServer), c, l)
        }),
        PatternRule::ignore(
            "ntp-other",
            Scope::Section(Services, "ntp"),
            r"^(?:boot-server \S+|source-address \S+|authentication-key .+|trusted-key .+)$",
        ),
        PatternRule::new("name-server", Scope::Section(Services, "name-server"), r"^(\S+)$", |c, l| {
            single(service(ServiceField::DnsServer), c, l)
        }),
        // Interfaces
        PatternRule::new("interface", Scope::Header(Interface), r".", |_, l| {
            let name = l.block_key.clone().unwrap_or_default();
            vec![Extraction::new(on_interface(l, InterfaceField::Declared), name, l.number)]
        }),
        PatternRule::new("description", Scope::Body(Interface), r"^description (.+)$", |c, l| {
            vec![Extraction::new(
                on_interface(l, InterfaceField::Description),
                unquote(capture(c, 1)),
                l.number,
            )]
        }),
        PatternRule::new("address", Scope::Body(Interface), r"^address (\S+)", |c, l| {
            let raw = capture(c, 1);
            match addr::split_cidr(raw) {
                Some((address, mask)) => vec![
                    Extraction::new(on_interface(l, InterfaceField::IpAddress), address, l.number),
                    Extraction::new(on_interface(l, InterfaceField::SubnetMask), mask, l.number),
                ],
                None => vec![Extraction::new(on_interface(l, InterfaceField::IpAddress), raw, l.number)],
            }
        }),
        PatternRule::new("disable", Scope::Body(Interface), r"^disable$", |_, l| {
            vec![Extraction::new(on_interface(l, InterfaceField::Status), "admin-down", l.number)]
        }),
        PatternRule::new("speed", Scope::Body(Interface), r"^speed (\S+)$", |c, l| {
            single(on_interface(l, InterfaceField::Speed), c, l)
        }),
        PatternRule::new("link-mode", Scope::Body(Interface), r"^link-mode (\S+?)(?:-duplex)?$", |c, l| {
            single(on_interface(l, InterfaceField::Duplex), c, l)
        }),
        PatternRule::new("lag-member", Scope::Body(Interface), r"^802\.3ad ae(\d+)$", |c, l| {
            single(on_interface(l, InterfaceField::PortChannelId), c, l)
        }),
        PatternRule::new(
            "interface-mode",
            Scope::Body(Interface),
            r"^(?:interface-mode|port-mode) (\S+)$",
            |c, l| {
                let raw = capture(c, 1);
                let mode = raw
                    .parse::<SwitchportMode>()
                    .map(|m| m.as_str().to_string())
                    .unwrap_or_else(|_| raw.to_string());
                vec![Extraction::new(on_interface(l, InterfaceField::Mode), mode, l.number)]
            },
        ),
        PatternRule::new(
            "vlan-members",
            Scope::Body(Interface),
            r"^members \[?\s*([^\]]+?)\s*\]?$",
            |c, l| {
                capture(c, 1)
                    .split_whitespace()
                    .map(|member| {
                        Extraction::new(on_interface(l, InterfaceField::VlanMember), member, l.number)
                    })
                    .collect()
            },
        ),
        PatternRule::new("native-vlan", Scope::Body(Interface), r"^native-vlan-id (\S+)$", |c, l| {
            single(on_interface(l, InterfaceField::NativeVlan), c, l)
        }),
        PatternRule::ignore(
            "interface-other",
            Scope::Body(Interface),
            r"^(?:family \S+|unit 0|vlan|vlan-tagging|flexible-vlan-tagging|mtu \d+|encapsulation .*|vlan-id \d+)$",
        ),
        // VLANs
        PatternRule::new("vlan", Scope::Header(Vlan), r"^(\S+)$", |c, l| {
            single(on_vlan(l, VlanField::Name), c, l)
        }),
        PatternRule::new("vlan-id", Scope::Body(Vlan), r"^vlan-id (\S+)$", |c, l| {
            single(on_vlan(l, VlanField::Id), c, l)
        }),
        PatternRule::new("l3-interface", Scope::Body(Vlan), r"^l3-interface (\S+)$", |c, l| {
            single(on_vlan(l, VlanField::L3Interface), c, l)
        }),
        PatternRule::ignore("vlan-other", Scope::Body(Vlan), r"^description "),
        // Routing
        PatternRule::new("protocol", Scope::Header(Routing), r"^(\S+)$", |c, l| {
            vec![Extraction::new(
                on_routing(l, RoutingField::Protocol),
                ProtocolType::parse(capture(c, 1)).to_string(),
                l.number,
            )]
        }),
        PatternRule::new(
            "static-route",
            Scope::Body(Routing),
            r"^route (\S+) next-hop (\S+)$",
            |c, l| {
                let (destination, next_hop) = (capture(c, 1), capture(c, 2));
                let mut out = vec![Extraction::new(
                    on_routing(l, RoutingField::StaticRoute),
                    format!("{} {}", destination, next_hop),
                    l.number,
                )];
                if destination == "0.0.0.0/0" {
                    out.push(Extraction::new(
                        on_routing(l, RoutingField::DefaultGateway),
                        next_hop,
                        l.number,
                    ));
                }
                out
            },
        ),
        PatternRule::new("ospf-interface", Scope::Body(Routing), r"^interface (\S+)", |c, l| {
            single(on_routing(l, RoutingField::Network), c, l)
        }),
        PatternRule::new("bgp-neighbor", Scope::Body(Routing), r"^neighbor (\S+)", |c, l| {
            single(on_routing(l, RoutingField::Neighbor), c, l)
        }),
        PatternRule::ignore(
            "routing-other",
            Scope::Body(Routing),
            r"^(?:area \S+|group \S+|type \S+|peer-as \d+|local-address \S+|export \S+|import \S+|passive|metric \d+)$",
        ),
        // Spanning tree and LLDP
        PatternRule::new(
            "bpdu-block-on-edge",
            Scope::Section(Services, "stp"),
            r"^bpdu-block-on-edge$",
            |_, l| vec![security(SecurityField::BpduGuardDefault, "true", l)],
        ),
        PatternRule::new("stp-edge", Scope::Under(Services, "interface "), r"^edge$", |_, l| {
            let name = l
                .parent
                .as_deref()
                .and_then(|p| p.strip_prefix("interface "))
                .unwrap_or_default();
            vec![Extraction::new(
                FieldPath::InterfaceRef {
                    name: name.to_string(),
                    field: InterfaceField::Portfast,
                },
                "true",
                l.number,
            )]
        }),
        PatternRule::new("lldp-disable", Scope::Section(Services, "lldp"), r"^disable$", |_, l| {
            vec![Extraction::new(service(ServiceField::Lldp), "false", l.number)]
        }),
        PatternRule::new("lldp-interface", Scope::Section(Services, "lldp"), r"^interface ", |_, l| {
            vec![Extraction::new(service(ServiceField::Lldp), "true", l.number)]
        }),
        PatternRule::ignore(
            "stp-other",
            Scope::Section(Services, "stp"),
            r"^(?:bridge-priority \S+|max-age \d+|hello-time \d+|forward-delay \d+|cost \d+|priority \d+|mode \S+|no-root-port|interface \S+)$",
        ),
        // SNMP
        PatternRule::new("snmp-community", Scope::Header(Snmp), r"^community (\S+)$", |c, l| {
            vec![
                Extraction::new(on_snmp(l, SnmpField::Community), capture(c, 1), l.number),
                Extraction::new(on_snmp(l, SnmpField::Version), "v2c", l.number),
            ]
        }),
        PatternRule::new("snmp-user", Scope::Header(Snmp), r"^user (\S+)$", |c, l| {
            vec![
                Extraction::new(on_snmp(l, SnmpField::User), capture(c, 1), l.number),
                Extraction::new(on_snmp(l, SnmpField::Version), "v3", l.number),
            ]
        }),
        PatternRule::new(
            "snmp-authorization",
            Scope::Body(Snmp),
            r"^authorization (read-only|read-write)$",
            |c, l| single(on_snmp(l, SnmpField::Access), c, l),
        ),
        PatternRule::new("snmp-client-list", Scope::Body(Snmp), r"^client-list-name (\S+)$", |c, l| {
            single(on_snmp(l, SnmpField::Acl), c, l)
        }),
        PatternRule::new("snmp-clients", Scope::Body(Snmp), r"^clients$", |_, l| {
            vec![Extraction::new(on_snmp(l, SnmpField::Acl), "clients", l.number)]
        }),
        PatternRule::ignore(
            "snmp-other",
            Scope::Within(Snmp),
            r#"^(?:location .+|contact .+|description .+|name .+|interface \S+|trap-group \S+|version \S+|targets|categories|engine-id .+|\d+\.\d+\.\d+\.\d+(?:/\d+)?(?: restrict)?)$"#,
        ),
        // Firewall filters
        PatternRule::new("filter", Scope::Header(Acl), r"^filter ", |_, l| {
            vec![Extraction::new(on_acl(l, AclField::Declared), "filter", l.number)]
        }),
        PatternRule::new(
            "term-action-inline",
            Scope::Body(Acl),
            r"^then (accept|discard|reject)$",
            |c, l| vec![acl_entry(capture(c, 1), l)],
        ),
        PatternRule::new(
            "term-action",
            Scope::Under(Acl, "then"),
            r"^(accept|discard|reject)$",
            |c, l| vec![acl_entry(capture(c, 1), l)],
        ),
        PatternRule::ignore(
            "filter-other",
            Scope::Within(Acl),
            r"^(?:(?:source|destination)-(?:address|port|prefix-list) .+|protocol .+|port .+|icmp-type .+|tcp-flags .+|tcp-established|count \S+|log|syslog|sample|policer \S+|next term|\d+\.\d+\.\d+\.\d+/\d+(?: except)?)$",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::grammar::{apply_grammar, juniper};
    use crate::parser::tokenizer::tokenize;

    const SAMPLE: &str = r#"
system {
    host-name EX1;
    root-authentication {
        encrypted-password "$6$abc";
    }
    services {
        ssh;
        web-management {
            http;
        }
    }
    ntp {
        server 10.0.0.1;
    }
}
interfaces {
    ge-0/0/1 {
        description "user port";
        unit 0 {
            family ethernet-switching {
                interface-mode access;
                vlan {
                    members DATA;
                }
            }
        }
    }
    irb {
        unit 10 {
            family inet {
                address 10.10.0.1/24;
            }
        }
    }
}
vlans {
    DATA {
        vlan-id 10;
        l3-interface irb.10;
    }
}
protocols {
    rstp {
        bpdu-block-on-edge;
        interface ge-0/0/1 {
            edge;
        }
    }
}
snmp {
    community public {
        authorization read-only;
    }
}
firewall {
    family inet {
        filter PROTECT {
            term ALLOW {
                then accept;
            }
        }
    }
}
"#;

    fn extract(text: &str) -> Vec<(String, String)> {
        apply_grammar(&tokenize(text, juniper()), juniper())
            .fields
            .iter()
            .map(|e| (e.path.to_string(), e.value.clone()))
            .collect()
    }

    fn has(fields: &[(String, String)], path: &str, value: &str) -> bool {
        fields.iter().any(|(p, v)| p == path && v == value)
    }

    #[test]
    fn test_sample_extraction() {
        let fields = extract(SAMPLE);
        assert!(has(&fields, "deviceInfo.Hostname", "EX1"));
        assert!(has(&fields, "securityFeatures.PasswordEncryption", "true"));
        assert!(has(&fields, "securityFeatures.Ssh", "true"));
        assert!(has(&fields, "securityFeatures.HttpServerDisabled", "false"));
        assert!(has(&fields, "otherServices.NtpServer", "10.0.0.1"));
        assert!(has(&fields, "interfaces[ge-0/0/1].Description", "user port"));
        assert!(has(&fields, "interfaces[ge-0/0/1].Mode", "access"));
        assert!(has(&fields, "interfaces[ge-0/0/1].VlanMember", "DATA"));
        assert!(has(&fields, "interfaces[irb.10].IpAddress", "10.10.0.1"));
        assert!(has(&fields, "interfaces[irb.10].SubnetMask", "255.255.255.0"));
        assert!(has(&fields, "vlansSvis[DATA].Id", "10"));
        assert!(has(&fields, "vlansSvis[DATA].L3Interface", "irb.10"));
        assert!(has(&fields, "securityFeatures.BpduGuardDefault", "true"));
        assert!(has(&fields, "interfaces[ge-0/0/1].Portfast", "true"));
        assert!(has(&fields, "snmpConfigs[community public].Access", "read-only"));
        assert!(has(&fields, "acls[PROTECT].Entry", "term ALLOW then accept"));
    }

    #[test]
    fn test_sample_has_no_unparsed_lines() {
        let output = apply_grammar(&tokenize(SAMPLE, juniper()), juniper());
        assert!(output.unparsed.is_empty(), "unparsed: {:?}", output.unparsed);
    }

    #[test]
    fn test_unknown_statements_in_known_sections_are_unparsed() {
        let text = r#"
system {
    services {
        ssh;
        frobnicate;
    }
    ntp {
        server 10.0.0.1;
        boot-server 10.0.0.1;
    }
}
snmp {
    location "rack 4";
    mystery-knob on;
}
"#;
        let output = apply_grammar(&tokenize(text, juniper()), juniper());
        let unparsed: Vec<&str> = output.unparsed.iter().map(|u| u.text.as_str()).collect();
        assert_eq!(unparsed, vec!["frobnicate", "mystery-knob on"]);
    }

    #[test]
    fn test_name_helpers() {
        let grammar = juniper();
        assert_eq!(grammar.svi_vlan_id("vlan.20"), Some(20));
        assert_eq!(grammar.svi_vlan_id("irb.20"), None);
        assert_eq!(grammar.aggregate_id("ae3"), Some(3));
    }
}
