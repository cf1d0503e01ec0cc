//! Vendor grammars
//!
//! A grammar describes one configuration dialect: how blocks open and close, and an ordered
//! list of [`PatternRule`]s that turn classified lines into `(FieldPath, value)` pairs. The
//! tokenizer, runner and normalizer are shared; adding a vendor means adding a grammar.
//!
//! Grammar tables are built once and shared read-only between concurrent pipelines.

pub mod cisco_ios;
pub mod juniper;

pub use cisco_ios::CiscoIosGrammar;
pub use juniper::JuniperGrammar;

use crate::core::{ParseWarning, WarningKind};
use crate::model::Vendor;
use crate::parser::fields::{
    AclField, ExtractedFields, Extraction, FieldPath, InterfaceField, RoutingField, SnmpField,
    VlanField,
};
use crate::parser::tokenizer::{BlockContext, BlockFrame, BlockStart, Dialect, LogicalLine};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::Serialize;
use tracing::debug;

static CISCO_IOS: Lazy<CiscoIosGrammar> = Lazy::new(CiscoIosGrammar::new);
static JUNIPER: Lazy<JuniperGrammar> = Lazy::new(JuniperGrammar::new);

pub fn cisco_ios() -> &'static dyn VendorGrammar {
    &*CISCO_IOS
}

pub fn juniper() -> &'static dyn VendorGrammar {
    &*JUNIPER
}

pub trait VendorGrammar: Send + Sync {
    fn vendor(&self) -> Vendor;

    fn dialect(&self) -> &Dialect;

    /// Recognizes a block header. `enclosing` lists the open blocks, outermost first.
    fn match_block_start(&self, header: &str, enclosing: &[BlockFrame]) -> Option<BlockStart>;

    fn match_block_end(&self, line: &str) -> bool;

    fn rules(&self) -> &[PatternRule];

    /// Runs the pattern rules in declaration order; the first one that matches decides the
    /// line. `Some(vec![])` means the line was understood but carries no canonical field.
    fn extract_field(&self, line: &LogicalLine) -> Option<Vec<Extraction>> {
        self.rules().iter().find_map(|rule| rule.apply(line))
    }

    /// VLAN id served by an interface whose name marks it as an SVI.
    fn svi_vlan_id(&self, interface: &str) -> Option<u16>;

    /// Aggregate number of a port-channel style interface name.
    fn aggregate_id(&self, interface: &str) -> Option<u32>;

    /// Closing delimiter when `line` starts a statement spanning several physical lines.
    fn multiline_delimiter(&self, _line: &str) -> Option<String> {
        None
    }
}

/// Which lines a pattern rule may look at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Top-level statements outside any block.
    Global,
    /// The header line that opened a block of this context.
    Header(BlockContext),
    /// Lines inside a block of this context, excluding its header.
    Body(BlockContext),
    /// Header and body.
    Within(BlockContext),
    /// Body lines of a block whose key is the given section name.
    Section(BlockContext, &'static str),
    /// Body lines directly under a header starting with the given prefix.
    Under(BlockContext, &'static str),
    Any,
}

impl Scope {
    pub fn admits(&self, line: &LogicalLine) -> bool {
        match *self {
            Scope::Global => line.context == BlockContext::Global && line.depth == 0,
            Scope::Header(context) => line.opens_block && line.context == context,
            Scope::Body(context) => !line.opens_block && line.context == context,
            Scope::Within(context) => line.context == context,
            Scope::Section(context, key) => {
                !line.opens_block
                    && line.context == context
                    && line.block_key.as_deref() == Some(key)
            }
            Scope::Under(context, prefix) => {
                !line.opens_block
                    && line.context == context
                    && line
                        .parent
                        .as_deref()
                        .map_or(false, |parent| parent.starts_with(prefix))
            }
            Scope::Any => true,
        }
    }
}

pub type ExtractFn = fn(&Captures<'_>, &LogicalLine) -> Vec<Extraction>;

pub struct PatternRule {
    pub id: &'static str,
    pub scope: Scope,
    pub regex: Regex,
    extract: ExtractFn,
}

impl PatternRule {
    /// Builds a rule from a pattern literal.
    ///
    /// # Panics
    ///
    /// Panics if `pattern` is not a valid regular expression. Patterns are compile-time
    /// constants and every grammar table is built in the unit tests.
    pub fn new(id: &'static str, scope: Scope, pattern: &str, extract: ExtractFn) -> Self {
        Self {
            id,
            scope,
            regex: Regex::new(pattern)
                .unwrap_or_else(|e| panic!("grammar rule '{}' has invalid pattern: {}", id, e)),
            extract,
        }
    }

    /// A rule that recognizes lines without extracting anything.
    pub fn ignore(id: &'static str, scope: Scope, pattern: &str) -> Self {
        Self::new(id, scope, pattern, |_, _| Vec::new())
    }

    pub fn apply(&self, line: &LogicalLine) -> Option<Vec<Extraction>> {
        if !self.scope.admits(line) {
            return None;
        }
        let captures = self.regex.captures(&line.text)?;
        Some((self.extract)(&captures, line))
    }
}

impl std::fmt::Debug for PatternRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PatternRule")
            .field("id", &self.id)
            .field("scope", &self.scope)
            .field("regex", &self.regex.as_str())
            .finish()
    }
}

/// A line no rule recognized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnparsedLine {
    pub number: usize,
    pub context: BlockContext,
    pub text: String,
}

#[derive(Debug, Default)]
pub struct GrammarOutput {
    pub fields: ExtractedFields,
    pub unparsed: Vec<UnparsedLine>,
    pub warnings: Vec<ParseWarning>,
}

/// Runs a grammar over tokenized lines.
///
/// Block headers and purely structural lines are not reported as unparsed even when no rule
/// extracts from them; their contents are.
pub fn apply_grammar(lines: &[LogicalLine], grammar: &dyn VendorGrammar) -> GrammarOutput {
    let mut output = GrammarOutput::default();

    for line in lines {
        match grammar.extract_field(line) {
            Some(extractions) => {
                for extraction in extractions {
                    let path = extraction.path.clone();
                    let value = extraction.value.clone();
                    if !output.fields.insert(extraction) {
                        output.warnings.push(ParseWarning::at(
                            WarningKind::IgnoredDuplicate,
                            line.number,
                            format!("{} already set; ignoring '{}'", path, value),
                        ));
                    }
                }
            }
            None => {
                if line.structural || line.opens_block {
                    continue;
                }
                output.unparsed.push(UnparsedLine {
                    number: line.number,
                    context: line.context,
                    text: line.text.clone(),
                });
            }
        }
    }

    debug!(
        vendor = %grammar.vendor(),
        extracted = output.fields.len(),
        unparsed = output.unparsed.len(),
        "applied grammar"
    );

    output
}

// Helpers shared by the grammar tables.

pub(crate) fn capture<'t>(captures: &Captures<'t>, index: usize) -> &'t str {
    captures.get(index).map_or("", |m| m.as_str())
}

pub(crate) fn on_interface(line: &LogicalLine, field: InterfaceField) -> FieldPath {
    FieldPath::interface(
        line.block_id.unwrap_or_default(),
        line.block_key.clone().unwrap_or_default(),
        field,
    )
}

pub(crate) fn on_vlan(line: &LogicalLine, field: VlanField) -> FieldPath {
    FieldPath::vlan(line.block_key.clone().unwrap_or_default(), field)
}

pub(crate) fn on_routing(line: &LogicalLine, field: RoutingField) -> FieldPath {
    FieldPath::routing(line.block_key.clone().unwrap_or_default(), field)
}

pub(crate) fn on_snmp(line: &LogicalLine, field: SnmpField) -> FieldPath {
    FieldPath::snmp(line.block_key.clone().unwrap_or_default(), field)
}

pub(crate) fn on_acl(line: &LogicalLine, field: AclField) -> FieldPath {
    FieldPath::acl(line.block_key.clone().unwrap_or_default(), field)
}

/// Extracts a single field from capture group 1.
pub(crate) fn single(path: FieldPath, captures: &Captures<'_>, line: &LogicalLine) -> Vec<Extraction> {
    vec![Extraction::new(path, capture(captures, 1), line.number)]
}

pub(crate) fn bool_str(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::tokenizer::tokenize;

    #[test]
    fn test_grammar_tables_build() {
        assert!(!cisco_ios().rules().is_empty());
        assert!(!juniper().rules().is_empty());
        assert_eq!(cisco_ios().vendor(), Vendor::CiscoIos);
        assert_eq!(juniper().vendor(), Vendor::Juniper);
    }

    #[test]
    fn test_unmatched_lines_are_kept() {
        let text = "hostname R1\nfrobnicate the widgets\n";
        let lines = tokenize(text, cisco_ios());
        let output = apply_grammar(&lines, cisco_ios());
        assert_eq!(output.unparsed.len(), 1);
        assert_eq!(output.unparsed[0].text, "frobnicate the widgets");
        assert_eq!(output.unparsed[0].number, 2);
    }

    #[test]
    fn test_repeated_single_valued_field_warns() {
        let text = "hostname R1\nhostname R2\n";
        let lines = tokenize(text, cisco_ios());
        let output = apply_grammar(&lines, cisco_ios());
        assert_eq!(output.warnings.len(), 1);
        assert_eq!(output.warnings[0].kind, WarningKind::IgnoredDuplicate);
        assert_eq!(output.warnings[0].line, Some(2));
    }

    #[test]
    fn test_scope_admits() {
        let lines = tokenize("interface Gi0/1\n description x\n", cisco_ios());
        assert!(Scope::Header(BlockContext::Interface).admits(&lines[0]));
        assert!(!Scope::Body(BlockContext::Interface).admits(&lines[0]));
        assert!(Scope::Body(BlockContext::Interface).admits(&lines[1]));
        assert!(Scope::Within(BlockContext::Interface).admits(&lines[1]));
        assert!(Scope::Under(BlockContext::Interface, "interface ").admits(&lines[1]));
        assert!(!Scope::Global.admits(&lines[1]));
    }
}
