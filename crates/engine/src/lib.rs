//! Netaudit Engine - Network Configuration Normalization and Analysis
//!
//! Parses vendor configuration text (Cisco IOS-like and Junos-like dialects) into one canonical,
//! vendor-neutral model and runs a deterministic catalog of security, consistency and
//! best-practice rules over it. Everything is synchronous and free of shared mutable state, so
//! independent files can be analyzed in parallel.

pub mod core;
pub mod model;
pub mod parser;
pub mod pipeline;
pub mod rules;
pub mod runner;

pub use core::{
    AnalysisContext, EngineConfig, Finding, FindingType, InputError, ParseWarning, PipelineError,
    Rule, RuleCategory, SchemaViolation, Severity, WarningKind,
};
pub use model::{CanonicalConfig, RawConfig, Vendor};
pub use pipeline::{parse, Analysis, ParsedConfig, Pipeline};
pub use runner::{finalize, RuleCatalog, RuleEngine, ScanReport};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
