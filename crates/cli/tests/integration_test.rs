use std::fs;
use std::process::{Command, Output};
use tempfile::TempDir;

const SWITCH: &str = r#"
hostname SW1
snmp-server community public RO
interface Gi0/1
 switchport mode access
 switchport access vlan 50
!
vlan 10
 name DATA
!
end
"#;

const JUNOS: &str = r#"
system {
    host-name EX1;
    services {
        ssh;
    }
}
"#;

fn netaudit(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_netaudit"))
        .args(args)
        .env_remove("RUST_LOG")
        .env_remove("NETAUDIT_MIN_SEVERITY")
        .env_remove("NETAUDIT_DISABLED_RULES")
        .env_remove("NETAUDIT_PARALLEL")
        .output()
        .expect("Failed to execute netaudit")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

#[test]
fn test_scan_single_file_json() {
    let temp_dir = TempDir::new().unwrap();
    let input_path = temp_dir.path().join("sw1.cfg");
    fs::write(&input_path, SWITCH).unwrap();

    let output = netaudit(&["scan", "--input", input_path.to_str().unwrap(), "--format", "json"]);
    assert!(
        output.status.success(),
        "Command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let report: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    let file = &report["files"][0];
    assert!(file["status"].as_str().unwrap().starts_with("ok"));
    assert_eq!(file["device"], "SW1");

    let findings = file["findings"].as_array().unwrap();
    assert_eq!(findings[0]["severity"], "critical");
    assert_eq!(findings[0]["ruleId"], "snmp-default-community");
    assert!(findings
        .iter()
        .any(|f| f["type"] == "Conflict" && f["details"]["vlanId"] == 50));
}

#[test]
fn test_scan_directory_reports_failures_separately() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("a-sw1.cfg"), SWITCH).unwrap();
    fs::write(temp_dir.path().join("b-ex1.conf"), JUNOS).unwrap();
    fs::write(temp_dir.path().join("c-empty.cfg"), "").unwrap();
    fs::write(temp_dir.path().join("notes.md"), "not a config").unwrap();

    let output = netaudit(&[
        "scan",
        "--input",
        temp_dir.path().to_str().unwrap(),
        "--format",
        "json",
    ]);
    assert!(!output.status.success(), "an empty file must fail the scan");

    let report: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    let files = report["files"].as_array().unwrap();
    assert_eq!(files.len(), 3);
    assert!(files[0]["file"].as_str().unwrap().ends_with("a-sw1.cfg"));
    assert_eq!(files[1]["device"], "EX1");
    assert_eq!(files[2]["status"], "failed");
    assert!(files[2]["error"].as_str().unwrap().contains("empty"));
}

#[test]
fn test_scan_min_severity_and_markdown() {
    let temp_dir = TempDir::new().unwrap();
    let input_path = temp_dir.path().join("sw1.cfg");
    fs::write(&input_path, SWITCH).unwrap();

    let output = netaudit(&[
        "scan",
        "--input",
        input_path.to_str().unwrap(),
        "--format",
        "markdown",
        "--min-severity",
        "high",
    ]);
    assert!(output.status.success());

    let markdown = stdout(&output);
    assert!(markdown.contains("# Network Configuration Audit"));
    assert!(markdown.contains("snmp-default-community"));
    assert!(markdown.contains("- Low: 0"));
    assert!(!markdown.contains("ntp-not-configured"));
}

#[test]
fn test_parse_writes_canonical_json() {
    let temp_dir = TempDir::new().unwrap();
    let input_path = temp_dir.path().join("ex1.conf");
    let output_path = temp_dir.path().join("ex1.json");
    fs::write(&input_path, JUNOS).unwrap();

    let output = netaudit(&[
        "parse",
        "--input",
        input_path.to_str().unwrap(),
        "--vendor",
        "juniper",
        "--output",
        output_path.to_str().unwrap(),
    ]);
    assert!(
        output.status.success(),
        "Command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let parsed: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&output_path).unwrap()).unwrap();
    assert_eq!(parsed["config"]["deviceInfo"]["hostname"], "EX1");
    assert_eq!(parsed["config"]["securityFeatures"]["sshConfigured"], true);
    assert_eq!(parsed["unparsed"], serde_json::json!([]));
}

#[test]
fn test_rules_lists_catalog() {
    let output = netaudit(&["rules", "--json", "--category", "conflict"]);
    assert!(output.status.success());

    let rules: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    let ids: Vec<&str> = rules
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["id"].as_str().unwrap())
        .collect();
    assert!(ids.contains(&"interface-vlan-undeclared"));
    assert!(rules.as_array().unwrap().iter().all(|r| r["category"] == "conflict"));
}
