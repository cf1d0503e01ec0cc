//! Configuration text to canonical model.
//!
//! `tokenize` classifies lines, a [`VendorGrammar`] extracts `(FieldPath, value)` pairs from
//! them, and `normalize` folds those pairs into a [`CanonicalConfig`](crate::model::CanonicalConfig).

pub mod addr;
pub mod fields;
pub mod grammar;
pub mod normalizer;
pub mod tokenizer;

pub use fields::{ExtractedFields, Extraction, FieldPath};
pub use grammar::{apply_grammar, GrammarOutput, PatternRule, Scope, UnparsedLine, VendorGrammar};
pub use normalizer::{normalize, NormalizedConfig};
pub use tokenizer::{tokenize, BlockContext, Dialect, LogicalLine};
