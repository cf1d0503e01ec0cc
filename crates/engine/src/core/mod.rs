//! Core abstractions of the analysis engine
//!
//! The [`Rule`] trait is the interface every configuration check implements; findings,
//! severities and the per-run [`AnalysisContext`] are the vocabulary rules speak. Engine
//! settings and the error/warning taxonomy shared by the parser and the runner live here too.

pub mod config;
pub mod context;
pub mod error;
pub mod fingerprint;
pub mod result;
pub mod rule;
pub mod severity;

pub use config::EngineConfig;
pub use context::{AnalysisContext, UNNAMED_DEVICE};
pub use error::{InputError, ParseWarning, PipelineError, SchemaViolation, WarningKind};
pub use fingerprint::{DeduplicationStats, FindingFingerprint};
pub use result::Finding;
pub use rule::Rule;
pub use severity::{FindingType, RuleCategory, Severity};
