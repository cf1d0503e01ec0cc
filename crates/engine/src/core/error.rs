//! Error and warning taxonomy of the pipeline.
//!
//! Fatal problems are [`PipelineError`]s tagged with the offending file. Everything else is a
//! [`ParseWarning`] returned next to a successful result.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("configuration text is empty")]
    Empty,

    #[error("configuration text contains only whitespace")]
    Blank,

    #[error("input is not text: {0}")]
    NotText(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaViolation {
    #[error("line {line}: VLAN id '{value}' is not numeric")]
    NonNumericVlanId { line: usize, value: String },

    #[error("line {line}: interface '{interface}' references non-numeric VLAN id '{value}'")]
    NonNumericVlanReference {
        line: usize,
        interface: String,
        value: String,
    },
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("input error in '{file}': {error}")]
    Input {
        file: String,
        #[source]
        error: InputError,
    },

    #[error("schema violation in '{file}': {violation}")]
    SchemaViolation {
        file: String,
        #[source]
        violation: SchemaViolation,
    },
}

impl PipelineError {
    pub fn file(&self) -> &str {
        match self {
            Self::Input { file, .. } | Self::SchemaViolation { file, .. } => file,
        }
    }

    pub fn is_input_error(&self) -> bool {
        matches!(self, Self::Input { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WarningKind {
    UnparsedLine,
    IgnoredDuplicate,
    VlanOutOfRange,
    CoercionFallback,
    MissingField,
    UnresolvedReference,
    DuplicateDeclaration,
}

/// Non-fatal anomaly attached to a successful parse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseWarning {
    pub kind: WarningKind,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,

    pub message: String,
}

impl ParseWarning {
    pub fn new(kind: WarningKind, line: Option<usize>, message: impl Into<String>) -> Self {
        Self {
            kind,
            line,
            message: message.into(),
        }
    }

    pub fn at(kind: WarningKind, line: usize, message: impl Into<String>) -> Self {
        Self::new(kind, Some(line), message)
    }
}

impl fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "line {}: {}", line, self.message),
            None => f.write_str(&self.message),
        }
    }
}
