use super::load_engine_config;
use anyhow::Result;
use clap::{Args, ValueEnum};
use colored::*;
use netaudit_engine::{RuleCatalog, RuleCategory, RuleEngine};
use std::path::PathBuf;

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
pub enum CategoryArg {
    Security,
    Conflict,
    BestPractice,
}

impl From<CategoryArg> for RuleCategory {
    fn from(arg: CategoryArg) -> Self {
        match arg {
            CategoryArg::Security => RuleCategory::Security,
            CategoryArg::Conflict => RuleCategory::Conflict,
            CategoryArg::BestPractice => RuleCategory::BestPractice,
        }
    }
}

#[derive(Args, Clone, Debug)]
pub struct RulesArgs {
    #[arg(long, value_enum)]
    pub category: Option<CategoryArg>,

    /// Engine settings file; disabled rules are marked as such
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[arg(long)]
    pub json: bool,
}

pub fn execute(args: RulesArgs) -> Result<()> {
    let settings = load_engine_config(args.config.as_deref())?;
    let engine = RuleEngine::from_catalog(RuleCatalog::shared(), settings);

    let rules: Vec<_> = engine
        .list_rules()
        .into_iter()
        .filter(|rule| {
            args.category
                .map_or(true, |category| rule.category == RuleCategory::from(category))
        })
        .collect();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&rules)?);
        return Ok(());
    }

    println!("{}", "📋 Rule catalog".bright_cyan().bold());
    println!("{}", "=".repeat(50).bright_cyan());
    for rule in &rules {
        let id = if rule.enabled {
            rule.id.bold()
        } else {
            rule.id.dimmed()
        };
        println!(
            "{} {:<32} {:<14} {:<8} {}",
            rule.severity.emoji(),
            id,
            rule.category.as_str(),
            rule.severity.to_string(),
            rule.name
        );
        println!("   {}", rule.description);
    }
    println!("\n{} rule(s)", rules.len());
    Ok(())
}
