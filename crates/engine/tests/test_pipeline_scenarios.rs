/// End to end behaviour of parse + analyze on small Cisco-style configurations

use anyhow::Result;
use netaudit_engine::{
    parse, EngineConfig, FindingType, Pipeline, PipelineError, RawConfig, SchemaViolation,
    Severity, Vendor, WarningKind,
};

fn cisco(text: &str) -> RawConfig {
    RawConfig::new("sw1.cfg", Vendor::CiscoIos, text)
}

const SCENARIO: &str = r#"
hostname SW1
!
interface Gi0/1
 switchport mode access
 switchport access vlan 10
!
vlan 10
 name DATA
!
end
"#;

#[test]
fn test_example_scenario() -> Result<()> {
    let analysis = Pipeline::default().analyze(&cisco(SCENARIO))?;
    let config = &analysis.parsed.config;

    assert_eq!(config.device_info.hostname.as_deref(), Some("SW1"));
    assert_eq!(config.interfaces.len(), 1);
    assert_eq!(config.interfaces[0].name, "Gi0/1");
    assert_eq!(config.vlans_svis.len(), 1);
    assert_eq!(config.vlans_svis[0].vlan_id, 10);
    assert_eq!(config.vlans_svis[0].name.as_deref(), Some("DATA"));

    let findings = analysis.report.findings();
    assert!(findings
        .iter()
        .any(|f| f.finding_type == FindingType::SecurityRisk
            && f.rule_id == "password-encryption-disabled"));
    assert!(findings.iter().all(|f| f.finding_type != FindingType::Conflict));
    assert!(findings.iter().all(|f| f.devices_involved == vec!["SW1".to_string()]));

    Ok(())
}

#[test]
fn test_example_scenario_with_vlan_20_reference() -> Result<()> {
    let text = SCENARIO.replace("switchport access vlan 10", "switchport access vlan 20");
    let analysis = Pipeline::default().analyze(&cisco(&text))?;

    let conflicts: Vec<_> = analysis.report.by_type(FindingType::Conflict).collect();
    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0].details["vlanId"], 20);

    Ok(())
}

#[test]
fn test_undeclared_vlan_50_is_one_conflict() -> Result<()> {
    let text = "hostname SW1\ninterface Gi0/1\n switchport access vlan 50\n";
    let analysis = Pipeline::default().analyze(&cisco(text))?;

    let conflicts: Vec<_> = analysis.report.by_type(FindingType::Conflict).collect();
    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0].detail_str("interface"), Some("Gi0/1"));
    assert_eq!(conflicts[0].details["vlanId"], 50);
    assert_eq!(conflicts[0].id.as_deref(), Some("conflict_1"));

    Ok(())
}

#[test]
fn test_password_encryption_line_removes_finding() -> Result<()> {
    let pipeline = Pipeline::default();
    let is_encryption = |rule_id: &str| rule_id == "password-encryption-disabled";

    let without = pipeline.analyze(&cisco("hostname SW1\n"))?;
    let finding = without
        .report
        .findings()
        .iter()
        .find(|f| is_encryption(&f.rule_id))
        .expect("password encryption finding");
    assert_eq!(finding.finding_type, FindingType::SecurityRisk);
    assert_eq!(finding.severity, Severity::High);

    let with = pipeline.analyze(&cisco("hostname SW1\nservice password-encryption\n"))?;
    assert!(!with.report.findings().iter().any(|f| is_encryption(&f.rule_id)));

    Ok(())
}

#[test]
fn test_repeated_runs_are_identical() -> Result<()> {
    let text = r#"
hostname SW1
snmp-server community public RO
snmp-server community private RW
ip http server
interface Gi0/1
 switchport mode access
 switchport access vlan 30
interface Gi0/2
 channel-group 5 mode active
vlan 10
 name DATA
vlan 11
 name Data
line vty 0 4
 transport input telnet
"#;
    let pipeline = Pipeline::default();
    let first = pipeline.analyze(&cisco(text))?;
    let second = pipeline.analyze(&cisco(text))?;

    assert_eq!(
        serde_json::to_string(&first.parsed.config)?,
        serde_json::to_string(&second.parsed.config)?
    );
    assert_eq!(first.report.findings(), second.report.findings());

    let ranks: Vec<u8> = first.report.findings().iter().map(|f| f.severity.rank()).collect();
    assert!(ranks.windows(2).all(|pair| pair[0] >= pair[1]));
    assert_eq!(first.report.findings()[0].severity, Severity::Critical);

    Ok(())
}

#[test]
fn test_vlan_range_boundaries() -> Result<()> {
    let text = "vlan 1\nvlan 4094\nvlan 0\nvlan 4095\nvlan 5000\n";
    let parsed = parse(&cisco(text))?;

    let ids: Vec<u16> = parsed.config.vlans_svis.iter().map(|v| v.vlan_id).collect();
    assert_eq!(ids, vec![1, 4094]);
    let out_of_range = parsed
        .warnings
        .iter()
        .filter(|w| w.kind == WarningKind::VlanOutOfRange)
        .count();
    assert_eq!(out_of_range, 3);

    Ok(())
}

#[test]
fn test_fatal_errors_carry_the_file() {
    let blank = parse(&RawConfig::new("blank.cfg", Vendor::Juniper, "   \n\t\n"));
    match blank {
        Err(err @ PipelineError::Input { .. }) => assert_eq!(err.file(), "blank.cfg"),
        other => panic!("expected input error, got {:?}", other.map(|p| p.config)),
    }

    let bad = parse(&cisco("interface Gi0/1\n switchport access vlan DATA\n"));
    match bad {
        Err(PipelineError::SchemaViolation { file, violation }) => {
            assert_eq!(file, "sw1.cfg");
            assert!(matches!(
                violation,
                SchemaViolation::NonNumericVlanReference { line: 2, .. }
            ));
        }
        other => panic!("expected schema violation, got {:?}", other.map(|p| p.config)),
    }
}

#[test]
fn test_engine_settings_are_honoured() -> Result<()> {
    let settings = EngineConfig {
        disabled_rules: vec!["password-encryption-disabled".to_string()],
        min_severity: Some(Severity::High),
        ..EngineConfig::default()
    };
    let analysis = Pipeline::new(settings).analyze(&cisco("hostname SW1\n"))?;

    assert!(analysis
        .report
        .findings()
        .iter()
        .all(|f| f.severity >= Severity::High && f.rule_id != "password-encryption-disabled"));

    Ok(())
}
