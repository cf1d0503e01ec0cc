//! Rule execution and finding post-processing
//!
//! The catalog holds every registered rule in a fixed order. The engine runs the enabled ones
//! against one immutable configuration snapshot, optionally in parallel, and the ranker turns
//! the concatenated output into the final list: duplicates removed, ids assigned, most severe
//! first. Catalog order is preserved through every step so equal-severity findings come out in
//! the order their rules were registered.

pub mod engine;
pub mod ranker;
pub mod registry;

pub use engine::{RuleEngine, RuleInfo, ScanReport, SeverityCount};
pub use ranker::{finalize, finalize_with_stats};
pub use registry::{RuleCatalog, RuleCatalogBuilder};
