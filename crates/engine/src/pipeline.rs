//! End to end orchestration.
//!
//! `validate -> tokenize -> apply_grammar -> normalize -> evaluate -> finalize`, strictly in
//! sequence for one file. Files are independent, so [`Pipeline::analyze_batch`] runs one
//! pipeline per file in parallel; a failing file never affects the others.

use crate::core::{EngineConfig, ParseWarning, PipelineError, WarningKind};
use crate::model::{CanonicalConfig, RawConfig};
use crate::parser::{apply_grammar, normalize, tokenize, UnparsedLine};
use crate::runner::{RuleCatalog, RuleEngine, ScanReport};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};

/// Canonical model of one file, with everything the parser could not use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedConfig {
    pub config: CanonicalConfig,
    /// Unparsed lines first (in line order), then grammar and normalizer warnings.
    pub warnings: Vec<ParseWarning>,
    pub unparsed: Vec<UnparsedLine>,
}

impl ParsedConfig {
    pub fn warning_messages(&self) -> Vec<String> {
        self.warnings.iter().map(ToString::to_string).collect()
    }
}

#[derive(Debug, Clone)]
pub struct Analysis {
    pub file_name: String,
    pub parsed: ParsedConfig,
    pub report: ScanReport,
}

pub fn parse(raw: &RawConfig) -> Result<ParsedConfig, PipelineError> {
    raw.validate().map_err(|error| PipelineError::Input {
        file: raw.file_name().to_string(),
        error,
    })?;

    let grammar = raw.vendor().grammar();
    let lines = tokenize(raw.text(), grammar);
    let output = apply_grammar(&lines, grammar);

    let normalized = normalize(&output.fields, raw.vendor()).map_err(|violation| {
        PipelineError::SchemaViolation {
            file: raw.file_name().to_string(),
            violation,
        }
    })?;

    let mut warnings: Vec<ParseWarning> = output
        .unparsed
        .iter()
        .map(|line| {
            ParseWarning::at(
                WarningKind::UnparsedLine,
                line.number,
                format!("unparsed {} line: {}", line.context, line.text),
            )
        })
        .collect();
    warnings.extend(output.warnings);
    warnings.extend(normalized.warnings);

    debug!(
        file = raw.file_name(),
        vendor = %raw.vendor(),
        lines = lines.len(),
        fields = output.fields.len(),
        warnings = warnings.len(),
        "parsed configuration"
    );

    Ok(ParsedConfig {
        config: normalized.config,
        warnings,
        unparsed: output.unparsed,
    })
}

pub struct Pipeline {
    engine: RuleEngine,
}

impl Pipeline {
    /// Pipeline over the shared built-in rule catalog.
    pub fn new(config: EngineConfig) -> Self {
        Self::with_engine(RuleEngine::from_catalog(RuleCatalog::shared(), config))
    }

    pub fn with_engine(engine: RuleEngine) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &RuleEngine {
        &self.engine
    }

    pub fn parse(&self, raw: &RawConfig) -> Result<ParsedConfig, PipelineError> {
        parse(raw)
    }

    /// Parses and evaluates one file. Without a hostname the file name identifies the device.
    pub fn analyze(&self, raw: &RawConfig) -> Result<Analysis, PipelineError> {
        let parsed = parse(raw)?;
        let report = self.engine.run(&parsed.config, Some(raw.file_name()));

        info!(
            file = raw.file_name(),
            findings = report.len(),
            warnings = parsed.warnings.len(),
            "analysis complete"
        );

        Ok(Analysis {
            file_name: raw.file_name().to_string(),
            parsed,
            report,
        })
    }

    /// One result per input, in input order.
    pub fn analyze_batch(&self, raws: &[RawConfig]) -> Vec<Result<Analysis, PipelineError>> {
        raws.par_iter()
            .map(|raw| {
                let result = self.analyze(raw);
                if let Err(e) = &result {
                    warn!(file = e.file(), error = %e, "pipeline failed");
                }
                result
            })
            .collect()
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}
