//! Command implementations for the netaudit CLI
//!
//! `scan` runs the full pipeline over a file or a directory tree and reports findings, `parse`
//! stops after normalization and prints the canonical model, and `rules` lists the catalog.
//! Argument types shared between commands live here.

pub mod parse;
pub mod rules;
pub mod scan;

use anyhow::{Context, Result};
use clap::ValueEnum;
use netaudit_engine::{EngineConfig, RawConfig, Severity, Vendor};
use std::fs;
use std::path::Path;

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
pub enum VendorArg {
    /// Guess from the file extension, then from the text
    Auto,
    Cisco,
    Juniper,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
pub enum OutputFormat {
    Console,
    Json,
    Markdown,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
pub enum SeverityArg {
    Info,
    Low,
    Medium,
    High,
    Critical,
}

impl From<SeverityArg> for Severity {
    fn from(arg: SeverityArg) -> Self {
        match arg {
            SeverityArg::Info => Severity::Info,
            SeverityArg::Low => Severity::Low,
            SeverityArg::Medium => Severity::Medium,
            SeverityArg::High => Severity::High,
            SeverityArg::Critical => Severity::Critical,
        }
    }
}

impl VendorArg {
    pub fn resolve(&self, path: &Path, text: &str) -> Vendor {
        match self {
            VendorArg::Cisco => Vendor::CiscoIos,
            VendorArg::Juniper => Vendor::Juniper,
            VendorArg::Auto => detect_vendor(path, text),
        }
    }
}

fn detect_vendor(path: &Path, text: &str) -> Vendor {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("junos") | Some("jnpr") => return Vendor::Juniper,
        Some("ios") => return Vendor::CiscoIos,
        _ => {}
    }

    let braced = text
        .lines()
        .map(str::trim_end)
        .any(|line| line.ends_with(" {") || line.ends_with("};") || line == "}");
    if braced {
        Vendor::Juniper
    } else {
        Vendor::CiscoIos
    }
}

/// Reads a configuration file. Content problems are left to the pipeline to report.
pub fn load_raw(path: &Path, vendor: VendorArg) -> Result<std::result::Result<RawConfig, String>> {
    let bytes = fs::read(path).with_context(|| format!("Failed to read file: {}", path.display()))?;
    let name = path.display().to_string();
    let sniff = String::from_utf8_lossy(&bytes);
    let vendor = vendor.resolve(path, &sniff);

    Ok(RawConfig::from_bytes(name.clone(), vendor, bytes)
        .map_err(|e| format!("input error in '{}': {}", name, e)))
}

/// Engine settings: config file if given, then `NETAUDIT_*` environment overrides.
pub fn load_engine_config(path: Option<&Path>) -> Result<EngineConfig> {
    let config = match path {
        Some(path) => EngineConfig::from_file(path)?,
        None => EngineConfig::default(),
    };
    config.with_env_overrides()
}
