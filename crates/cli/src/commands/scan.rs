//! Configuration scanning over a file or a directory tree.
//!
//! Every file is an independent pipeline run; files are analyzed in parallel and reported in
//! path order. Three outcomes are kept apart in every output format: the file failed to parse,
//! it parsed with warnings, or it parsed and produced N findings.

use super::{load_engine_config, load_raw, OutputFormat, SeverityArg, VendorArg};
use anyhow::Result;
use chrono::Utc;
use clap::Args;
use colored::*;
use netaudit_engine::runner::SeverityCount;
use netaudit_engine::{Analysis, Finding, Pipeline, PipelineError, RawConfig, Severity};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

const CONFIG_EXTENSIONS: &[&str] = &["cfg", "conf", "config", "txt", "ios", "junos", "jnpr"];

#[derive(Args, Clone, Debug)]
pub struct ScanArgs {
    /// Configuration file or directory
    #[arg(short, long)]
    pub input: PathBuf,

    #[arg(long, value_enum, default_value_t = VendorArg::Auto)]
    pub vendor: VendorArg,

    #[arg(long, value_enum, default_value_t = OutputFormat::Console)]
    pub format: OutputFormat,

    /// Drop findings below this severity
    #[arg(long, value_enum)]
    pub min_severity: Option<SeverityArg>,

    /// Engine settings file (YAML or JSON)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Skip rules by id (repeatable)
    #[arg(long = "disable")]
    pub disabled_rules: Vec<String>,

    #[arg(long)]
    pub no_dedup: bool,

    #[arg(short, long)]
    pub verbose: bool,
}

enum Outcome {
    Analyzed(Box<Analysis>),
    Failed { file: String, error: String },
}

impl Outcome {
    fn file(&self) -> &str {
        match self {
            Outcome::Analyzed(analysis) => &analysis.file_name,
            Outcome::Failed { file, .. } => file,
        }
    }
}

pub fn execute(args: ScanArgs) -> Result<()> {
    let mut settings = load_engine_config(args.config.as_deref())?;
    if let Some(min) = args.min_severity {
        settings.min_severity = Some(Severity::from(min));
    }
    settings.disabled_rules.extend(args.disabled_rules.iter().cloned());
    if args.no_dedup {
        settings.deduplication_enabled = false;
    }

    let files = collect_files(&args.input)?;
    if files.is_empty() {
        anyhow::bail!("No configuration files found in {}", args.input.display());
    }
    info!(files = files.len(), input = %args.input.display(), "scanning");

    let mut outcomes = Vec::with_capacity(files.len());
    let mut raws: Vec<RawConfig> = Vec::with_capacity(files.len());
    for path in &files {
        match load_raw(path, args.vendor)? {
            Ok(raw) => {
                debug!(file = raw.file_name(), vendor = %raw.vendor(), "loaded");
                raws.push(raw);
            }
            Err(error) => outcomes.push(Outcome::Failed {
                file: path.display().to_string(),
                error,
            }),
        }
    }

    let pipeline = Pipeline::new(settings);
    for result in pipeline.analyze_batch(&raws) {
        outcomes.push(match result {
            Ok(analysis) => Outcome::Analyzed(Box::new(analysis)),
            Err(err) => failed(err),
        });
    }
    outcomes.sort_by(|a, b| a.file().cmp(b.file()));

    match args.format {
        OutputFormat::Console => print_console(&outcomes, args.verbose),
        OutputFormat::Json => println!("{}", to_json(&outcomes)?),
        OutputFormat::Markdown => println!("{}", to_markdown(&outcomes)),
    }

    let failures = outcomes
        .iter()
        .filter(|o| matches!(o, Outcome::Failed { .. }))
        .count();
    if failures > 0 {
        anyhow::bail!("{} of {} file(s) failed to parse", failures, outcomes.len());
    }
    Ok(())
}

fn failed(err: PipelineError) -> Outcome {
    Outcome::Failed {
        file: err.file().to_string(),
        error: err.to_string(),
    }
}

fn collect_files(input: &Path) -> Result<Vec<PathBuf>> {
    if input.is_file() {
        return Ok(vec![input.to_path_buf()]);
    }
    if !input.is_dir() {
        anyhow::bail!("Input path does not exist: {}", input.display());
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(input).sort_by_file_name() {
        let entry = entry?;
        let path = entry.path();
        let known = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| CONFIG_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()));
        if path.is_file() && known {
            files.push(path.to_path_buf());
        }
    }
    Ok(files)
}

fn severity_label(severity: Severity) -> ColoredString {
    let label = severity.to_string();
    match severity {
        Severity::Critical => label.bright_red().bold(),
        Severity::High => label.red(),
        Severity::Medium => label.yellow(),
        Severity::Low => label.bright_yellow(),
        Severity::Info => label.blue(),
    }
}

fn print_console(outcomes: &[Outcome], verbose: bool) {
    for outcome in outcomes {
        match outcome {
            Outcome::Failed { file, error } => {
                println!("\n❌ {} {}", "PARSE FAILED".bright_red().bold(), file);
                println!("   {}", error);
            }
            Outcome::Analyzed(analysis) => print_analysis(analysis, verbose),
        }
    }

    let analyzed: Vec<&Analysis> = outcomes
        .iter()
        .filter_map(|o| match o {
            Outcome::Analyzed(analysis) => Some(analysis.as_ref()),
            Outcome::Failed { .. } => None,
        })
        .collect();
    let total: usize = analyzed.iter().map(|a| a.report.len()).sum();

    println!("\n{}", "=".repeat(50).bright_blue());
    println!(
        "📊 {} file(s) analyzed, {} failed, {} finding(s)",
        analyzed.len(),
        outcomes.len() - analyzed.len(),
        total
    );
}

fn print_analysis(analysis: &Analysis, verbose: bool) {
    let warnings = &analysis.parsed.warnings;
    let report = &analysis.report;

    println!("\n📄 {}", analysis.file_name.bold());
    if let Some(hostname) = &analysis.parsed.config.device_info.hostname {
        println!("   Device: {}", hostname);
    }
    if !warnings.is_empty() {
        println!("   {} parsed with {} warning(s)", "⚠️ ".yellow(), warnings.len());
        if verbose {
            for warning in warnings {
                println!("     - {}", warning);
            }
        }
    }

    if let Some(stats) = report.deduplication_stats() {
        if stats.removed_count > 0 {
            println!(
                "   🔄 Deduplication: removed {} duplicate finding(s) ({:.1}%)",
                stats.removed_count,
                stats.reduction_percentage()
            );
        }
    }

    if report.is_empty() {
        println!("   ✅ No findings");
        return;
    }

    println!("   Found {} finding(s):", report.len());
    for (i, finding) in report.findings().iter().enumerate() {
        println!(
            "\n   {}. {} {} [{}] {}",
            i + 1,
            finding.severity.emoji(),
            severity_label(finding.severity),
            finding.finding_type,
            finding.description
        );
        if verbose {
            println!("      Rule: {}", finding.rule_id);
            if !finding.recommendation.is_empty() {
                println!("      Recommendation: {}", finding.recommendation);
            }
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonReport<'a> {
    generated_at: String,
    version: &'static str,
    files: Vec<JsonFile<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonFile<'a> {
    file: &'a str,
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    device: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
    warnings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<SeverityCount>,
    findings: &'a [Finding],
}

fn to_json(outcomes: &[Outcome]) -> Result<String> {
    let files = outcomes
        .iter()
        .map(|outcome| match outcome {
            Outcome::Analyzed(analysis) => JsonFile {
                file: &analysis.file_name,
                status: if analysis.parsed.warnings.is_empty() {
                    "ok"
                } else {
                    "ok-with-warnings"
                },
                device: analysis.parsed.config.device_info.hostname.as_deref(),
                error: None,
                warnings: analysis.parsed.warning_messages(),
                summary: Some(analysis.report.count_by_severity()),
                findings: analysis.report.findings(),
            },
            Outcome::Failed { file, error } => JsonFile {
                file,
                status: "failed",
                device: None,
                error: Some(error.as_str()),
                warnings: Vec::new(),
                summary: None,
                findings: &[],
            },
        })
        .collect();

    let report = JsonReport {
        generated_at: Utc::now().to_rfc3339(),
        version: netaudit_engine::VERSION,
        files,
    };
    Ok(serde_json::to_string_pretty(&report)?)
}

fn to_markdown(outcomes: &[Outcome]) -> String {
    let mut md = String::from("# Network Configuration Audit\n\n");
    md.push_str(&format!(
        "Generated {} by netaudit {}\n\n",
        Utc::now().format("%Y-%m-%d %H:%M:%S UTC"),
        netaudit_engine::VERSION
    ));

    for outcome in outcomes {
        match outcome {
            Outcome::Failed { file, error } => {
                md.push_str(&format!("## ❌ `{}`\n\nParse failed: {}\n\n", file, error));
            }
            Outcome::Analyzed(analysis) => {
                md.push_str(&format!("## `{}`\n\n", analysis.file_name));
                let warnings = analysis.parsed.warning_messages();
                if !warnings.is_empty() {
                    md.push_str(&format!("Parsed with {} warning(s):\n\n", warnings.len()));
                    for warning in warnings {
                        md.push_str(&format!("- {}\n", warning));
                    }
                    md.push('\n');
                }
                // Nest the per-file report one heading level down.
                for line in analysis.report.to_markdown().lines() {
                    if line.starts_with('#') {
                        md.push('#');
                    }
                    md.push_str(line);
                    md.push('\n');
                }
            }
        }
    }
    md
}
