use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
use commands::{parse::ParseArgs, rules::RulesArgs, scan::ScanArgs};

#[derive(Parser)]
#[command(name = "netaudit")]
#[command(about = "Normalize and audit network device configurations")]
#[command(version)]
#[command(author = "Netaudit Team")]
struct Cli {
    /// Log filter used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse and analyze configuration files
    Scan(ScanArgs),

    /// Print the canonical model of one configuration file
    Parse(ParseArgs),

    /// List the rule catalog
    Rules(RulesArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    match cli.command {
        Commands::Scan(args) => commands::scan::execute(args),
        Commands::Parse(args) => commands::parse::execute(args),
        Commands::Rules(args) => commands::rules::execute(args),
    }
}
