//! Line classifier.
//!
//! Splits raw configuration text into [`LogicalLine`]s. Each line knows which block it sits in
//! (interface, VLAN, routing process, ...) so grammar rules can be scoped to a context instead
//! of re-deriving structure from indentation or braces themselves.
//!
//! Two block styles are supported:
//!
//! - **Indentation**: a top-level statement opens a block, indented statements belong to it and
//!   marker lines such as `!` close it.
//! - **Braces**: `header {` opens a block, `}` closes it and statements end with `;`.
//!
//! Classification never fails. Lines the tokenizer cannot place are tagged
//! [`BlockContext::Unclassified`] and still handed on.

use crate::parser::grammar::VendorGrammar;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockContext {
    Global,
    Interface,
    Vlan,
    Routing,
    Acl,
    Snmp,
    System,
    Services,
    Line,
    Other,
    Unclassified,
}

impl fmt::Display for BlockContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Global => "global",
            Self::Interface => "interface",
            Self::Vlan => "vlan",
            Self::Routing => "routing",
            Self::Acl => "acl",
            Self::Snmp => "snmp",
            Self::System => "system",
            Self::Services => "services",
            Self::Line => "line",
            Self::Other => "other",
            Self::Unclassified => "unclassified",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockStyle {
    Indentation,
    Braces,
}

/// Lexical conventions of one vendor dialect.
#[derive(Debug, Clone)]
pub struct Dialect {
    pub block_style: BlockStyle,
    pub comment_prefixes: &'static [&'static str],
    pub continuation: Option<char>,
    pub terminator: Option<char>,
}

impl Dialect {
    pub fn is_comment(&self, line: &str) -> bool {
        self.comment_prefixes.iter().any(|p| line.starts_with(p))
    }
}

/// What a grammar reports when a header opens a recognized block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockStart {
    pub context: BlockContext,
    pub key: Option<String>,
}

impl BlockStart {
    pub fn new(context: BlockContext, key: Option<String>) -> Self {
        Self { context, key }
    }

    pub fn keyed(context: BlockContext, key: impl Into<String>) -> Self {
        Self::new(context, Some(key.into()))
    }
}

/// An open block while tokenizing.
#[derive(Debug, Clone)]
pub struct BlockFrame {
    pub context: BlockContext,
    pub key: Option<String>,
    pub block_id: usize,
    pub header: String,
    indent: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogicalLine {
    /// 1-based number of the first physical line.
    pub number: usize,
    pub text: String,
    pub depth: usize,
    pub context: BlockContext,
    pub block_key: Option<String>,
    /// Distinguishes repeated blocks that share a key.
    pub block_id: Option<usize>,
    pub opens_block: bool,
    /// Header of a nested section that carries no data of its own.
    pub structural: bool,
    /// Innermost enclosing header.
    pub parent: Option<String>,
}

impl LogicalLine {
    fn new(number: usize, text: &str, depth: usize, context: BlockContext) -> Self {
        Self {
            number,
            text: text.to_string(),
            depth,
            context,
            block_key: None,
            block_id: None,
            opens_block: false,
            structural: false,
            parent: None,
        }
    }

    fn in_frame(number: usize, text: &str, depth: usize, frame: &BlockFrame) -> Self {
        Self {
            block_key: frame.key.clone(),
            block_id: Some(frame.block_id),
            parent: Some(frame.header.clone()),
            ..Self::new(number, text, depth, frame.context)
        }
    }
}

pub fn tokenize(text: &str, grammar: &dyn VendorGrammar) -> Vec<LogicalLine> {
    let mut tokenizer = Tokenizer::new(grammar);
    for (number, content) in assemble_statements(text, grammar) {
        tokenizer.push(number, &content);
    }
    tokenizer.lines
}

/// Joins continuation lines and delimiter-bounded multi-line statements.
fn assemble_statements(text: &str, grammar: &dyn VendorGrammar) -> Vec<(usize, String)> {
    let continuation = grammar.dialect().continuation;
    let mut statements = Vec::new();
    let mut lines = text.lines().enumerate();

    while let Some((index, line)) = lines.next() {
        let number = index + 1;
        let mut current = line.trim_end().to_string();

        if let Some(delimiter) = grammar.multiline_delimiter(current.trim_start()) {
            for (_, next) in lines.by_ref() {
                let next = next.trim();
                if !next.is_empty() {
                    current.push(' ');
                    current.push_str(next);
                }
                if next.contains(delimiter.as_str()) {
                    break;
                }
            }
            statements.push((number, current));
            continue;
        }

        if let Some(marker) = continuation {
            while current.ends_with(marker) {
                current.pop();
                let trimmed_len = current.trim_end().len();
                current.truncate(trimmed_len);
                match lines.next() {
                    Some((_, next)) => {
                        current.push(' ');
                        current.push_str(next.trim());
                    }
                    None => break,
                }
            }
        }

        statements.push((number, current));
    }

    statements
}

struct Tokenizer<'g> {
    grammar: &'g dyn VendorGrammar,
    frames: Vec<BlockFrame>,
    lines: Vec<LogicalLine>,
    next_block_id: usize,
    in_block_comment: bool,
}

impl<'g> Tokenizer<'g> {
    fn new(grammar: &'g dyn VendorGrammar) -> Self {
        Self {
            grammar,
            frames: Vec::new(),
            lines: Vec::new(),
            next_block_id: 0,
            in_block_comment: false,
        }
    }

    fn allocate_block(&mut self) -> usize {
        let id = self.next_block_id;
        self.next_block_id += 1;
        id
    }

    fn push(&mut self, number: usize, raw: &str) {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return;
        }

        match self.grammar.dialect().block_style {
            BlockStyle::Indentation => {
                let indent = raw.len() - raw.trim_start().len();
                self.push_indented(number, trimmed, indent);
            }
            BlockStyle::Braces => self.push_braced(number, trimmed),
        }
    }

    fn push_indented(&mut self, number: usize, text: &str, indent: usize) {
        if self.grammar.match_block_end(text) {
            if indent == 0 {
                self.frames.clear();
            }
            return;
        }
        if self.grammar.dialect().is_comment(text) {
            return;
        }

        while self.frames.last().map_or(false, |f| f.indent >= indent) {
            self.frames.pop();
        }
        let depth = self.frames.len();

        if indent > 0 && self.frames.is_empty() {
            self.lines
                .push(LogicalLine::new(number, text, 1, BlockContext::Unclassified));
            return;
        }

        if let Some(start) = self.grammar.match_block_start(text, &self.frames) {
            self.open_block(number, text, depth, start, indent);
            return;
        }

        match self.frames.last().cloned() {
            Some(parent) => {
                self.lines
                    .push(LogicalLine::in_frame(number, text, depth, &parent));
                self.frames.push(BlockFrame {
                    header: text.to_string(),
                    indent,
                    ..parent
                });
            }
            None => {
                self.lines
                    .push(LogicalLine::new(number, text, 0, BlockContext::Global));
                // Children of an unrecognized statement are classified but not interpreted.
                let block_id = self.allocate_block();
                self.frames.push(BlockFrame {
                    context: BlockContext::Other,
                    key: Some(text.to_string()),
                    block_id,
                    header: text.to_string(),
                    indent,
                });
            }
        }
    }

    fn push_braced(&mut self, number: usize, text: &str) {
        if self.in_block_comment {
            if text.contains("*/") {
                self.in_block_comment = false;
            }
            return;
        }
        if text.starts_with("/*") && !text.contains("*/") {
            self.in_block_comment = true;
            return;
        }
        if self.grammar.dialect().is_comment(text) {
            return;
        }

        let text = text
            .strip_prefix("inactive: ")
            .or_else(|| text.strip_prefix("protect: "))
            .unwrap_or(text);
        let depth = self.frames.len();

        if self.grammar.match_block_end(text) {
            if self.frames.pop().is_none() {
                self.lines
                    .push(LogicalLine::new(number, text, 0, BlockContext::Unclassified));
            }
            return;
        }

        if let Some(header) = text.strip_suffix('{') {
            let header = header.trim();
            if let Some(start) = self.grammar.match_block_start(header, &self.frames) {
                self.open_block(number, header, depth, start, depth);
                return;
            }

            match self.frames.last().cloned() {
                Some(parent) => {
                    let mut line = LogicalLine::in_frame(number, header, depth, &parent);
                    line.structural = true;
                    self.lines.push(line);
                    self.frames.push(BlockFrame {
                        header: header.to_string(),
                        indent: depth,
                        ..parent
                    });
                }
                None => {
                    let start = BlockStart::keyed(BlockContext::Other, header);
                    self.open_block(number, header, depth, start, depth);
                }
            }
            return;
        }

        let statement = match self.grammar.dialect().terminator {
            Some(terminator) => text.trim_end_matches(terminator).trim_end(),
            None => text,
        };
        let line = match self.frames.last() {
            Some(parent) => LogicalLine::in_frame(number, statement, depth, parent),
            None => LogicalLine::new(number, statement, 0, BlockContext::Global),
        };
        self.lines.push(line);
    }

    fn open_block(
        &mut self,
        number: usize,
        header: &str,
        depth: usize,
        start: BlockStart,
        indent: usize,
    ) {
        let block_id = self.allocate_block();
        let mut line = LogicalLine::new(number, header, depth, start.context);
        line.block_key = start.key.clone();
        line.block_id = Some(block_id);
        line.opens_block = true;
        line.parent = self.frames.last().map(|f| f.header.clone());
        self.lines.push(line);

        self.frames.push(BlockFrame {
            context: start.context,
            key: start.key,
            block_id,
            header: header.to_string(),
            indent,
        });
    }
}
