use super::{load_raw, VendorArg};
use anyhow::{Context, Result};
use clap::Args;
use colored::*;
use netaudit_engine::parse;
use std::fs;
use std::path::PathBuf;

#[derive(Args, Clone, Debug)]
pub struct ParseArgs {
    #[arg(short, long)]
    pub input: PathBuf,

    #[arg(long, value_enum, default_value_t = VendorArg::Auto)]
    pub vendor: VendorArg,

    /// Write the canonical JSON here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Emit only the canonical configuration, without warnings and unparsed lines
    #[arg(long)]
    pub config_only: bool,
}

pub fn execute(args: ParseArgs) -> Result<()> {
    let raw = load_raw(&args.input, args.vendor)?.map_err(anyhow::Error::msg)?;
    let parsed = parse(&raw)?;

    let json = if args.config_only {
        serde_json::to_string_pretty(&parsed.config)?
    } else {
        serde_json::to_string_pretty(&parsed)?
    };

    match &args.output {
        Some(path) => {
            fs::write(path, &json)
                .with_context(|| format!("Failed to write output: {}", path.display()))?;
            eprintln!(
                "{} {} ({}) -> {}",
                "✅".green(),
                raw.file_name(),
                raw.vendor(),
                path.display()
            );
        }
        None => println!("{}", json),
    }

    if !parsed.warnings.is_empty() {
        eprintln!(
            "{} {} warning(s), {} unparsed line(s)",
            "⚠️ ".yellow(),
            parsed.warnings.len(),
            parsed.unparsed.len()
        );
    }
    Ok(())
}
